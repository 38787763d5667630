use base64::Engine;

/// The source image as the remote model will see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteImageReference {
    /// Fetch URL returned by the remote file store.
    Url(String),
    /// Self-describing `data:` URI with the image bytes inlined.
    DataUri(String),
}

impl RemoteImageReference {
    pub fn inline(bytes: &[u8], mime_type: &str) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        RemoteImageReference::DataUri(format!("data:{mime_type};base64,{payload}"))
    }

    pub fn as_str(&self) -> &str {
        match self {
            RemoteImageReference::Url(url) => url,
            RemoteImageReference::DataUri(uri) => uri,
        }
    }

    /// Short form for logs; data URIs can be megabytes long.
    pub fn describe(&self) -> String {
        match self {
            RemoteImageReference::Url(url) => url.clone(),
            RemoteImageReference::DataUri(uri) => format!("data uri ({} bytes)", uri.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_data_uri() {
        let reference = RemoteImageReference::inline(b"hello", "image/png");
        assert_eq!(reference.as_str(), "data:image/png;base64,aGVsbG8=");
        assert!(reference.describe().starts_with("data uri"));
    }

    #[test]
    fn test_url_passthrough() {
        let reference = RemoteImageReference::Url("https://x/y.png".to_string());
        assert_eq!(reference.as_str(), "https://x/y.png");
        assert_eq!(reference.describe(), "https://x/y.png");
    }
}
