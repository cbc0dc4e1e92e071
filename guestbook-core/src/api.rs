//! Guestbook store HTTP routes.

/// `GET` → `{photos: [...]}`
pub const PHOTOS_PATH: &str = "/api/guestbook/photos";

/// `POST` `{image, name, visitor_id}` → `{success, error?, photo?}`
pub const UPLOAD_PATH: &str = "/api/guestbook/upload";

/// `DELETE {DELETE_PATH}/{id}` `{visitor_id}` → `{success, error?}`
pub const DELETE_PATH: &str = "/api/guestbook/delete";

/// `GET {IMAGES_PATH}/{id}` → stored image bytes
pub const IMAGES_PATH: &str = "/api/guestbook/images";

/// `GET` long-lived push stream (`text/event-stream`)
pub const STREAM_PATH: &str = "/api/guestbook/stream";

/// Build `base` + `path` (+ `/tail`), keeping any path prefix of `base` and
/// percent-encoding `tail` as a single segment.
#[cfg(feature = "network")]
pub fn endpoint(base: &url::Url, path: &str, tail: Option<&str>) -> Option<url::Url> {
    let mut url = base.clone();
    {
        let mut segments = url.path_segments_mut().ok()?;
        segments.pop_if_empty();
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        if let Some(tail) = tail {
            segments.push(tail);
        }
    }
    url.set_query(None);
    Some(url)
}

#[cfg(all(test, feature = "network"))]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_prefix() {
        let base = url::Url::parse("http://example.com/desktop/").unwrap();
        let url = endpoint(&base, PHOTOS_PATH, None).unwrap();
        assert_eq!(url.as_str(), "http://example.com/desktop/api/guestbook/photos");
    }

    #[test]
    fn test_endpoint_encodes_tail() {
        let base = url::Url::parse("http://127.0.0.1:3000").unwrap();
        let url = endpoint(&base, DELETE_PATH, Some("a b/c")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:3000/api/guestbook/delete/a%20b%2Fc"
        );
    }

    #[test]
    fn test_endpoint_rejects_cannot_be_a_base() {
        let base = url::Url::parse("mailto:someone@example.com").unwrap();
        assert!(endpoint(&base, PHOTOS_PATH, None).is_none());
    }
}
