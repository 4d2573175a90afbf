use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::filters::TextExtractor;
use crate::model::Comment;
use crate::notice::Notice;
use crate::section::FocusHook;

pub const DEFAULT_WIDTH: usize = 80;

static BLOCK_BREAK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</p>\s*<p[^>]*>").expect("valid block break regex")
});

/// Renders the comment section as plain text.
pub struct Renderer {
    width: usize,
    extractor: Arc<dyn TextExtractor>,
}

impl Renderer {
    pub fn new(width: usize, extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            width: width.max(20),
            extractor,
        }
    }

    /// Status text with paragraph and line breaks kept.
    pub fn body_text(&self, html: &str) -> String {
        let marked = BLOCK_BREAK_RE.replace_all(html, "\n");
        marked
            .split('\n')
            .map(|line| self.extractor.text(line).trim().to_string())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn summary(&self, root: &Comment) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{} (@{})  {}\n",
            root.account.display_name,
            root.account.acct,
            root.created_at.format("%Y-%m-%d %H:%M")
        ));
        out.push_str(&self.wrap(&self.body_text(&root.content), ""));
        out.push_str(&format!(
            "\n{} replies · {} boosts · {} favourites\n",
            root.replies_count,
            root.reblogs_count,
            root.favourites()
        ));
        out.push_str(&format!("Reply on Mastodon: {}\n", root.link()));
        out
    }

    pub fn divider(&self) -> String {
        format!("{}\n", "─".repeat(self.width))
    }

    /// One reply, numbered from 1.
    pub fn comment(&self, index: usize, comment: &Comment) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "[{}] {} (@{})  ♥ {}  {}\n",
            index + 1,
            comment.account.display_name,
            comment.account.acct,
            comment.favourites(),
            comment.created_at.format("%Y-%m-%d %H:%M")
        ));
        out.push_str(&self.wrap(&self.body_text(&comment.content), "    "));
        out.push_str(&format!("\n    {}\n", comment.link()));
        out
    }

    pub fn notice(&self, notice: &Notice) -> String {
        format!("{}\n", notice.message)
    }

    pub fn show_more_prompt(&self, remaining: usize) -> String {
        format!("-- Show more comments ({remaining} left): Enter, q to quit -- ")
    }

    fn wrap(&self, text: &str, indent: &str) -> String {
        let options = textwrap::Options::new(self.width)
            .initial_indent(indent)
            .subsequent_indent(indent);
        textwrap::fill(text, options)
    }
}

/// Remembers where the newly revealed replies start so the view can print
/// from there.
#[derive(Debug, Clone, Default)]
pub struct FocusCursor(Arc<AtomicUsize>);

impl FocusCursor {
    pub fn position(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl FocusHook for FocusCursor {
    fn focus(&self, index: usize, comment: &Comment) {
        tracing::debug!(index, id = %comment.id, "focus comment");
        self.0.store(index, Ordering::SeqCst);
    }
}
