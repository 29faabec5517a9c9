//! Redirect response helpers shared by handlers and error rendering.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::flash::Flash;

/// 303 redirect, optionally carrying a flash notice for the next page.
pub fn see_other(location: &str, flash: Option<Flash>) -> Response {
    let mut response = StatusCode::SEE_OTHER.into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(location) {
        headers.insert(header::LOCATION, value);
    } else {
        headers.insert(header::LOCATION, HeaderValue::from_static("/"));
    }
    if let Some(flash) = flash {
        if let Ok(value) = HeaderValue::from_str(&flash.cookie()) {
            headers.append(header::SET_COOKIE, value);
        }
    }
    response
}

/// Redirect with an extra Set-Cookie (session establishment or teardown).
pub fn see_other_with_cookie(location: &str, flash: Option<Flash>, cookie: &str) -> Response {
    let mut response = see_other(location, flash);
    if let Ok(value) = HeaderValue::from_str(cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

/// Percent-encode a path for inclusion in a query string (`?next=...`).
pub fn encode_query_value(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn see_other_sets_location_and_flash_cookie() {
        let response = see_other("/view_book/3", Some(Flash::success("ok")));
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/view_book/3");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("flash="));
    }

    #[test]
    fn both_cookies_survive_together() {
        let response =
            see_other_with_cookie("/", Some(Flash::success("bye")), "session=; Max-Age=0");
        let cookies: Vec<_> = response.headers().get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(cookies.len(), 2);
    }
}
