use std::cmp::Reverse;

use crate::filters::{is_hidden, Filter};
use crate::model::Comment;

pub const PAGE_SIZE: usize = 5;

/// Orders replies by favourites, most liked first. Equal counts keep their
/// original order.
pub fn sort_by_favourites(replies: &mut [&Comment]) {
    replies.sort_by_key(|comment| Reverse(comment.favourites()));
}

/// Replies that survive every filter, most liked first.
pub fn ranked<'a>(descendants: &'a [Comment], filters: &[Filter]) -> Vec<&'a Comment> {
    let mut replies: Vec<&Comment> = descendants
        .iter()
        .filter(|comment| !is_hidden(filters, comment))
        .collect();
    sort_by_favourites(&mut replies);
    replies
}

/// The first `page_count` pages of the ranked replies.
pub fn present<'a>(
    descendants: &'a [Comment],
    filters: &[Filter],
    page_size: usize,
    page_count: usize,
) -> Vec<&'a Comment> {
    let mut replies = ranked(descendants, filters);
    replies.truncate(page_size.saturating_mul(page_count));
    replies
}

/// How many replies are on screen. Grows by one page per "show more".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    visible: usize,
    step: usize,
}

impl Default for Window {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl Window {
    pub fn new(step: usize) -> Self {
        let step = step.max(1);
        Self {
            visible: step,
            step,
        }
    }

    pub fn visible(&self) -> usize {
        self.visible
    }

    pub fn has_more(&self, total: usize) -> bool {
        self.visible < total
    }

    /// Reveals the next page. Returns the index of the first newly revealed
    /// item, or `None` when everything is already visible.
    pub fn show_more(&mut self, total: usize) -> Option<usize> {
        if !self.has_more(total) {
            return None;
        }
        let first_new = self.visible;
        self.visible += self.step;
        Some(first_new)
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[..items.len().min(self.visible)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{min_character_count, no_pins};
    use crate::model::Account;
    use chrono::Utc;

    fn reply(id: &str, favourites: Option<i64>, content: &str) -> Comment {
        Comment {
            id: id.into(),
            uri: format!("https://example.social/statuses/{id}"),
            created_at: Utc::now(),
            account: Account {
                id: "9".into(),
                username: "reader".into(),
                acct: "reader@example.social".into(),
                display_name: "Reader".into(),
                avatar: String::new(),
                url: String::new(),
            },
            content: content.into(),
            reblogs_count: 0,
            favourites_count: favourites,
            replies_count: 0,
            url: None,
            in_reply_to_id: Some("1".into()),
            in_reply_to_account_id: None,
        }
    }

    fn ids(replies: &[&Comment]) -> Vec<String> {
        replies.iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn sorts_by_favourites_stably() {
        let replies = vec![
            reply("a", Some(3), "<p>a</p>"),
            reply("b", Some(9), "<p>b</p>"),
            reply("c", Some(1), "<p>c</p>"),
            reply("d", Some(9), "<p>d</p>"),
        ];
        assert_eq!(ids(&ranked(&replies, &[])), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn missing_favourites_rank_as_zero() {
        let replies = vec![
            reply("a", None, "<p>a</p>"),
            reply("b", Some(0), "<p>b</p>"),
            reply("c", Some(1), "<p>c</p>"),
        ];
        assert_eq!(ids(&ranked(&replies, &[])), vec!["c", "a", "b"]);
    }

    #[test]
    fn filters_before_ranking() {
        let replies = vec![
            reply("pin", Some(50), "<p>📌</p>"),
            reply("short", Some(40), "<p>ok</p>"),
            reply("kept", Some(1), "<p>Thanks for writing this</p>"),
        ];
        let filters = vec![no_pins(), min_character_count(3)];
        assert_eq!(ids(&ranked(&replies, &filters)), vec!["kept"]);
    }

    #[test]
    fn present_returns_requested_pages() {
        let replies: Vec<Comment> = (0..12)
            .map(|i| reply(&i.to_string(), Some(12 - i), "<p>reply</p>"))
            .collect();
        assert_eq!(present(&replies, &[], PAGE_SIZE, 1).len(), 5);
        assert_eq!(present(&replies, &[], PAGE_SIZE, 2).len(), 10);
        assert_eq!(present(&replies, &[], PAGE_SIZE, 3).len(), 12);
        assert_eq!(present(&replies, &[], PAGE_SIZE, 9).len(), 12);
        assert!(present(&[], &[], PAGE_SIZE, 1).is_empty());
    }

    #[test]
    fn window_grows_one_page_at_a_time() {
        let items: Vec<usize> = (0..12).collect();
        let mut window = Window::default();
        assert_eq!(window.slice(&items).len(), 5);
        assert!(window.has_more(items.len()));

        assert_eq!(window.show_more(items.len()), Some(5));
        assert_eq!(window.slice(&items).len(), 10);

        assert_eq!(window.show_more(items.len()), Some(10));
        assert_eq!(window.slice(&items).len(), 12);
        assert!(!window.has_more(items.len()));

        assert_eq!(window.show_more(items.len()), None);
        assert_eq!(window.slice(&items).len(), 12);
        assert_eq!(window.visible(), 15);
    }

    #[test]
    fn short_list_offers_no_more() {
        let items = [1, 2, 3];
        let mut window = Window::default();
        assert_eq!(window.slice(&items), &[1, 2, 3]);
        assert!(!window.has_more(items.len()));
        assert_eq!(window.show_more(items.len()), None);
    }
}
