//! Post input validation

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::PostError;
use crate::Result;

pub const MAX_TITLE_CHARS: usize = 120;
pub const MAX_URL_CHARS: usize = 2048;

/// Raw submission as collected by the UI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

/// A draft that passed validation: trimmed, length-capped, URL parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPost {
    title: String,
    url: String,
}

impl ValidatedPost {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl PostDraft {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }

    /// Over-long values are cut to the limit rather than rejected.
    pub fn validate(&self) -> Result<ValidatedPost> {
        let title = truncate_chars(self.title.trim(), MAX_TITLE_CHARS);
        let url = truncate_chars(self.url.trim(), MAX_URL_CHARS);

        if title.is_empty() {
            return Err(PostError::Validation("Title is required.".to_string()));
        }
        if url.is_empty() || Url::parse(&url).is_err() {
            return Err(PostError::Validation("URL is invalid.".to_string()));
        }

        Ok(ValidatedPost { title, url })
    }
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_input() {
        let post = PostDraft::new("  Hi  ", " https://x.com ").validate().unwrap();
        assert_eq!(post.title(), "Hi");
        assert_eq!(post.url(), "https://x.com");
    }

    #[test]
    fn test_long_title_truncated_to_limit() {
        let post = PostDraft::new("t".repeat(300), "https://x.com").validate().unwrap();
        assert_eq!(post.title().chars().count(), MAX_TITLE_CHARS);

        // Counted in characters, not bytes
        let post = PostDraft::new("é".repeat(121), "https://x.com").validate().unwrap();
        assert_eq!(post.title(), "é".repeat(120));
    }

    #[test]
    fn test_long_url_truncated_to_limit() {
        let url = format!("https://x.com/{}", "a".repeat(3000));
        let post = PostDraft::new("Hi", url).validate().unwrap();
        assert_eq!(post.url().len(), MAX_URL_CHARS);
    }

    #[test]
    fn test_requires_title() {
        for title in ["", "    "] {
            let err = PostDraft::new(title, "https://x.com").validate().unwrap_err();
            assert_eq!(err.to_string(), "Title is required.");
        }
    }

    #[test]
    fn test_rejects_invalid_url() {
        for url in ["", "   ", "not a url", "/relative/path", "x.com"] {
            let err = PostDraft::new("Hi", url).validate().unwrap_err();
            assert!(matches!(err, PostError::Validation(_)), "{url} accepted");
        }
    }

    #[test]
    fn test_accepts_any_absolute_url() {
        for url in ["http://x.com", "ftp://files.example/a.txt", "at://did:plc:abc/app.bsky.feed.post/1"] {
            assert_eq!(PostDraft::new("Hi", url).validate().unwrap().url(), url);
        }
    }
}
