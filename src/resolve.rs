use once_cell::sync::Lazy;
use regex::Regex;

use crate::data::StatusService;
use crate::mastodon::{SearchOptions, Status};
use crate::notice::Notice;

static STATUS_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/(@[A-Za-z0-9_.-]+)/(\d+)").expect("valid status path regex")
});

/// What the comment section was pointed at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub uri: Option<String>,
    pub author: Option<String>,
    /// URL of the page the comments belong to; used as the search query when
    /// only an author is known.
    pub page_url: Option<String>,
}

/// Pulls the status id out of a `https://instance/@user/123` style URL.
/// Anything else is assumed to already be a status id.
pub fn status_id_from_uri(uri: &str) -> String {
    match STATUS_PATH_RE.captures(uri) {
        Some(caps) => caps[2].to_string(),
        None => uri.to_string(),
    }
}

/// Determines the status id for `target`. `Ok(None)` means there was nothing
/// to resolve.
pub fn resolve(service: &dyn StatusService, target: &Target) -> Result<Option<String>, Notice> {
    if let Some(uri) = target.uri.as_deref().filter(|uri| !uri.is_empty()) {
        if uri.trim().is_empty() {
            return Err(Notice::invalid_uri());
        }
        let id = status_id_from_uri(uri);
        tracing::info!(%uri, %id, "resolved status from uri");
        return Ok(Some(id));
    }

    let Some(author) = target
        .author
        .as_deref()
        .map(|author| author.strip_prefix('@').unwrap_or(author))
        .filter(|author| !author.is_empty())
    else {
        return Ok(None);
    };
    let Some(page_url) = target.page_url.as_deref().filter(|url| !url.trim().is_empty()) else {
        tracing::debug!(%author, "no page url to search for");
        return Err(Notice::no_results());
    };
    let results = service
        .search_statuses(page_url, SearchOptions::default())
        .map_err(|err| {
            tracing::warn!(error = %format!("{err:#}"), "status search failed");
            Notice::fetching_error()
        })?;

    let post = results.into_iter().next().ok_or_else(Notice::no_results)?;
    if !written_by(&post, author) {
        tracing::debug!(acct = %post.account.acct, %author, "search result has another author");
        return Err(Notice::author_mismatch());
    }
    tracing::info!(%page_url, id = %post.id, "resolved status from search");
    Ok(Some(post.id))
}

fn written_by(post: &Status, author: &str) -> bool {
    post.account.acct.contains(author) || post.account.username == author
}
