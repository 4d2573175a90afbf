use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mastodon;

/// Author of a [`Comment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub acct: String,
    pub display_name: String,
    pub avatar: String,
    pub url: String,
}

/// A status as shown in the comment section: the root post or one reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub uri: String,
    pub created_at: DateTime<Utc>,
    pub account: Account,
    pub content: String,
    pub reblogs_count: i64,
    pub favourites_count: Option<i64>,
    pub replies_count: i64,
    pub url: Option<String>,
    pub in_reply_to_id: Option<String>,
    pub in_reply_to_account_id: Option<String>,
}

impl Comment {
    pub fn favourites(&self) -> i64 {
        self.favourites_count.unwrap_or(0)
    }

    /// Public link for the comment, falling back to its canonical URI.
    pub fn link(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.uri)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// Root first, direct parent last.
    pub ancestors: Vec<Comment>,
    pub descendants: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub status: Comment,
    pub context: Context,
}

impl From<mastodon::Account> for Account {
    fn from(raw: mastodon::Account) -> Self {
        let display_name = if raw.display_name.trim().is_empty() {
            raw.username.clone()
        } else {
            raw.display_name
        };
        Account {
            id: raw.id,
            username: raw.username,
            acct: raw.acct,
            display_name,
            avatar: raw.avatar,
            url: raw.url,
        }
    }
}

impl From<mastodon::Status> for Comment {
    fn from(raw: mastodon::Status) -> Self {
        Comment {
            id: raw.id,
            uri: raw.uri,
            created_at: raw.created_at,
            account: raw.account.into(),
            content: raw.content,
            reblogs_count: raw.reblogs_count,
            favourites_count: raw.favourites_count,
            replies_count: raw.replies_count,
            url: raw.url,
            in_reply_to_id: raw.in_reply_to_id,
            in_reply_to_account_id: raw.in_reply_to_account_id,
        }
    }
}

impl From<mastodon::Context> for Context {
    fn from(raw: mastodon::Context) -> Self {
        Context {
            ancestors: raw.ancestors.into_iter().map(Comment::from).collect(),
            descendants: raw.descendants.into_iter().map(Comment::from).collect(),
        }
    }
}
