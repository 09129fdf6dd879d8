use serde::{Deserialize, Serialize};

use crate::catalog::repo_types::ImageDetails;

/// Fields posted by the add form.
#[derive(Debug, Default, Deserialize)]
pub struct AddImageForm {
    #[serde(default)]
    pub image_name: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub image_desc: String,
}

/// Fields posted by the edit form.
#[derive(Debug, Default, Deserialize)]
pub struct EditImageForm {
    #[serde(default)]
    pub iname: String,
    #[serde(default)]
    pub idesc: String,
    #[serde(default)]
    pub iurl: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub iname: String,
}

#[derive(Debug, Serialize)]
pub struct ImageListPage {
    pub images: Vec<ImageDetails>,
}

#[derive(Debug, Serialize)]
pub struct ImagePage {
    pub image: ImageDetails,
}

#[derive(Debug, Serialize)]
pub struct NotFoundPage {
    pub query: String,
}
