//! Public links for exercise media stored in object storage.

use url::Url;

use crate::core::config::MediaConfig;

/// Turns a stored media reference into a URL Telegram can fetch.
///
/// References are either absolute URLs (used as is) or object keys in the
/// configured bucket, addressed path-style: `<endpoint>/<bucket>/<key>`.
#[derive(Debug, Clone)]
pub struct MediaLocator {
    endpoint: Url,
    bucket: Option<String>,
}

impl MediaLocator {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            bucket: config.bucket.clone(),
        }
    }

    /// Returns `None` for empty references, or for object keys when no bucket is configured.
    pub fn resolve(&self, reference: &str) -> Option<Url> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }
        if let Ok(url) = Url::parse(reference) {
            if matches!(url.scheme(), "http" | "https") {
                return Some(url);
            }
        }

        let bucket = self.bucket.as_deref()?;
        let mut url = self.endpoint.clone();
        {
            let mut segments = url.path_segments_mut().ok()?;
            segments.pop_if_empty().push(bucket);
            segments.extend(reference.trim_start_matches('/').split('/'));
        }
        Some(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator(bucket: Option<&str>) -> MediaLocator {
        MediaLocator::new(&MediaConfig {
            endpoint: Url::parse("https://storage.yandexcloud.net").unwrap(),
            bucket: bucket.map(str::to_string),
        })
    }

    #[test]
    fn test_object_key_is_path_style() {
        let url = locator(Some("gym-media")).resolve("videos/squats.mp4").unwrap();
        assert_eq!(url.as_str(), "https://storage.yandexcloud.net/gym-media/videos/squats.mp4");
    }

    #[test]
    fn test_absolute_url_passes_through() {
        let url = locator(None).resolve("https://cdn.example.com/v.mp4").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/v.mp4");
    }

    #[test]
    fn test_unresolvable_references() {
        assert!(locator(Some("b")).resolve("").is_none());
        assert!(locator(Some("b")).resolve("   ").is_none());
        assert!(locator(None).resolve("videos/squats.mp4").is_none());
    }
}
