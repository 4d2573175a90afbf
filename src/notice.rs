use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeCode {
    InvalidUri,
    NotFound,
    FetchingError,
    CommentLoadingError,
}

impl NoticeCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeCode::InvalidUri => "invalid_uri",
            NoticeCode::NotFound => "not_found",
            NoticeCode::FetchingError => "fetching_error",
            NoticeCode::CommentLoadingError => "comment_loading_error",
        }
    }
}

impl fmt::Display for NoticeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the comment section has nothing to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct Notice {
    pub code: NoticeCode,
    pub message: String,
}

impl Notice {
    pub fn new(code: NoticeCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_uri() -> Self {
        Self::new(NoticeCode::InvalidUri, "Invalid Mastodon post URL")
    }

    pub fn no_results() -> Self {
        Self::new(NoticeCode::NotFound, "No matching post found")
    }

    pub fn author_mismatch() -> Self {
        Self::new(
            NoticeCode::NotFound,
            "No matching post found by the specified author",
        )
    }

    pub fn fetching_error() -> Self {
        Self::new(NoticeCode::FetchingError, "Error fetching post")
    }

    pub fn comment_loading_error() -> Self {
        Self::new(NoticeCode::CommentLoadingError, "Error loading comments")
    }
}
