pub mod app;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod cookies;
pub mod db;
pub mod error;
pub mod extractors;
pub mod flash;
pub mod forms;
pub mod images;
pub mod posts;
pub mod state;
pub mod storage;
pub mod view;
