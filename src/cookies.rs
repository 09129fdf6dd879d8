use anyhow::Context;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;

/// Value of the first cookie called `name` in the request headers.
pub fn read<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            (key == name).then_some(val)
        })
}

/// `Set-Cookie` value. Without `max_age` the cookie lives for the browser session.
pub fn build(name: &str, value: &str, max_age_secs: Option<i64>, secure: bool) -> String {
    let mut cookie = format!("{}={}; HttpOnly; SameSite=Lax; Path=/", name, value);
    if let Some(secs) = max_age_secs {
        cookie.push_str(&format!("; Max-Age={}", secs));
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn expire(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", name)
}

pub fn append(res: &mut Response, cookie: &str) -> anyhow::Result<()> {
    let value = HeaderValue::from_str(cookie).context("cookie is not a valid header value")?;
    res.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_named_cookie_among_many() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1; session=abc.def"));
        headers.append(header::COOKIE, HeaderValue::from_static("flash=xyz"));
        assert_eq!(read(&headers, "session"), Some("abc.def"));
        assert_eq!(read(&headers, "flash"), Some("xyz"));
        assert_eq!(read(&headers, "missing"), None);
    }

    #[test]
    fn build_and_expire_shapes() {
        assert_eq!(
            build("session", "t", None, false),
            "session=t; HttpOnly; SameSite=Lax; Path=/"
        );
        let remembered = build("session", "t", Some(60), true);
        assert!(remembered.contains("Max-Age=60"));
        assert!(remembered.ends_with("; Secure"));
        assert!(expire("flash").contains("Max-Age=0"));
    }
}
