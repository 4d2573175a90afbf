use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::data::{MastodonStatusService, StatusService};
use crate::filters::Filter;
use crate::mastodon::{self, DEFAULT_INSTANCE};
use crate::model::{Comment, Thread};
use crate::notice::Notice;
use crate::present::{self, Window, PAGE_SIZE};
use crate::resolve::{self, Target};
use crate::thread;

pub type NoticeCallback = Box<dyn Fn(&Notice) + Send + Sync>;

/// Called after "show more" with the first reply that became visible, so the
/// view can move focus to it.
pub trait FocusHook: Send + Sync {
    fn focus(&self, index: usize, comment: &Comment);
}

#[derive(Clone)]
pub struct Options {
    pub target: Target,
    pub instance: String,
    pub filters: Vec<Filter>,
    pub page_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            target: Target::default(),
            instance: DEFAULT_INSTANCE.to_string(),
            filters: Vec::new(),
            page_size: PAGE_SIZE,
        }
    }
}

/// Filtered, ranked replies of a loaded thread plus how many are on screen.
#[derive(Debug, Clone)]
pub struct Presentation {
    pub thread: Thread,
    replies: Vec<Comment>,
    window: Window,
}

impl Presentation {
    fn new(thread: Thread, filters: &[Filter], page_size: usize) -> Self {
        let replies = present::ranked(&thread.context.descendants, filters)
            .into_iter()
            .cloned()
            .collect();
        Self {
            thread,
            replies,
            window: Window::new(page_size),
        }
    }

    pub fn root(&self) -> &Comment {
        &self.thread.status
    }

    /// Every reply that passed the filters, in display order.
    pub fn replies(&self) -> &[Comment] {
        &self.replies
    }

    pub fn total(&self) -> usize {
        self.replies.len()
    }

    pub fn visible(&self) -> &[Comment] {
        self.window.slice(&self.replies)
    }

    pub fn has_more(&self) -> bool {
        self.window.has_more(self.total())
    }

    fn show_more(&mut self) -> Option<usize> {
        self.window.show_more(self.total())
    }
}

#[derive(Debug, Clone)]
pub enum Phase {
    Idle,
    Resolving,
    Resolved(String),
    Loading(String),
    Loaded(Thread),
    Presenting(Presentation),
    Errored(Notice),
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Resolving => "resolving",
            Phase::Resolved(_) => "resolved",
            Phase::Loading(_) => "loading",
            Phase::Loaded(_) => "loaded",
            Phase::Presenting(_) => "presenting",
            Phase::Errored(_) => "errored",
        }
    }
}

/// Drives one comment section from its options to a presented thread.
pub struct CommentSection {
    service: Arc<dyn StatusService>,
    options: Options,
    phase: Phase,
    on_notice: Option<NoticeCallback>,
    focus: Option<Box<dyn FocusHook>>,
}

impl CommentSection {
    pub fn new(service: Arc<dyn StatusService>, options: Options) -> Self {
        Self {
            service,
            options,
            phase: Phase::Idle,
            on_notice: None,
            focus: None,
        }
    }

    /// Builds a section talking to `options.instance` over HTTP.
    pub fn connect(options: Options, user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let client = mastodon::Client::new(mastodon::ClientConfig {
            instance: Some(options.instance.clone()),
            user_agent: user_agent.to_string(),
            timeout,
            http_client: None,
        })?;
        let service = Arc::new(MastodonStatusService::new(Arc::new(client)));
        Ok(Self::new(service, options))
    }

    pub fn on_notice<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Notice) + Send + Sync + 'static,
    {
        self.on_notice = Some(Box::new(callback));
        self
    }

    pub fn with_focus_hook(mut self, hook: impl FocusHook + 'static) -> Self {
        self.focus = Some(Box::new(hook));
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Replaces the options and forgets everything loaded for the old ones.
    pub fn set_options(&mut self, options: Options) {
        self.options = options;
        self.transition(Phase::Idle);
    }

    /// Runs resolution and loading to completion. Does nothing once the
    /// section has presented or failed for the current options.
    pub fn load(&mut self) -> &Phase {
        if !matches!(self.phase, Phase::Idle) {
            return &self.phase;
        }

        self.transition(Phase::Resolving);
        let id = match resolve::resolve(self.service.as_ref(), &self.options.target) {
            Ok(Some(id)) => id,
            Ok(None) => {
                self.transition(Phase::Idle);
                return &self.phase;
            }
            Err(notice) => return self.fail(notice),
        };
        self.transition(Phase::Resolved(id.clone()));

        self.transition(Phase::Loading(id.clone()));
        let thread = match thread::fetch_thread(self.service.as_ref(), &id) {
            Ok(thread) => thread,
            Err(notice) => return self.fail(notice),
        };
        self.transition(Phase::Loaded(thread));
        self.present();
        &self.phase
    }

    /// Moves a loaded thread into its presentation.
    fn present(&mut self) {
        let Phase::Loaded(thread) = std::mem::replace(&mut self.phase, Phase::Idle) else {
            return;
        };
        let presentation = Presentation::new(thread, &self.options.filters, self.options.page_size);
        tracing::debug!(
            from = "loaded",
            to = "presenting",
            replies = presentation.total(),
            "comment section"
        );
        self.phase = Phase::Presenting(presentation);
    }

    pub fn presentation(&self) -> Option<&Presentation> {
        match &self.phase {
            Phase::Presenting(presentation) => Some(presentation),
            _ => None,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        match &self.phase {
            Phase::Errored(notice) => Some(notice),
            _ => None,
        }
    }

    /// Reveals the next page of replies and focuses the first new one.
    /// Returns false when there was nothing left to reveal.
    pub fn show_more(&mut self) -> bool {
        let Phase::Presenting(presentation) = &mut self.phase else {
            return false;
        };
        let Some(first_new) = presentation.show_more() else {
            return false;
        };
        tracing::debug!(visible = presentation.window.visible(), "showing more comments");
        if let Some(hook) = &self.focus {
            if let Some(comment) = presentation.visible().get(first_new) {
                hook.focus(first_new, comment);
            }
        }
        true
    }

    fn fail(&mut self, notice: Notice) -> &Phase {
        tracing::warn!(code = %notice.code, message = %notice.message, "comment section failed");
        if let Some(callback) = &self.on_notice {
            callback(&notice);
        }
        self.transition(Phase::Errored(notice));
        &self.phase
    }

    fn transition(&mut self, next: Phase) {
        tracing::debug!(from = self.phase.name(), to = next.name(), "comment section");
        self.phase = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MockStatusService;
    use crate::filters::{no_pins, Filter};
    use crate::mastodon::{Account, Status};
    use crate::notice::NoticeCode;
    use parking_lot::Mutex;

    fn status(id: &str, favourites: i64, content: &str) -> Status {
        Status {
            id: id.into(),
            account: Account {
                id: "1".into(),
                username: "band".into(),
                acct: "band@hachyderm.io".into(),
                ..Default::default()
            },
            content: content.into(),
            favourites_count: Some(favourites),
            ..Default::default()
        }
    }

    fn replies(count: usize) -> Vec<Status> {
        (0..count)
            .map(|i| status(&format!("r{i}"), i as i64, "<p>nice post</p>"))
            .collect()
    }

    fn options_for(uri: &str, filters: Vec<Filter>) -> Options {
        Options {
            target: Target {
                uri: Some(uri.into()),
                ..Default::default()
            },
            filters,
            ..Default::default()
        }
    }

    fn recording() -> (Arc<Mutex<Vec<Notice>>>, impl Fn(&Notice) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |notice: &Notice| sink.lock().push(notice.clone()))
    }

    #[derive(Clone, Default)]
    struct RecordFocus(Arc<Mutex<Vec<(usize, String)>>>);

    impl FocusHook for RecordFocus {
        fn focus(&self, index: usize, comment: &Comment) {
            self.0.lock().push((index, comment.id.clone()));
        }
    }

    #[test]
    fn paginates_twelve_replies() {
        let service = Arc::new(MockStatusService::new().with_thread(status("1", 0, "<p>post</p>"), replies(12)));
        let focus = RecordFocus::default();
        let mut section = CommentSection::new(service, options_for("https://hachyderm.io/@band/1", vec![]))
            .with_focus_hook(focus.clone());
        section.load();

        let presentation = section.presentation().expect("presenting");
        assert_eq!(presentation.visible().len(), 5);
        assert_eq!(presentation.visible()[0].id, "r11");
        assert!(presentation.has_more());

        assert!(section.show_more());
        assert_eq!(section.presentation().unwrap().visible().len(), 10);
        assert!(section.show_more());
        let presentation = section.presentation().unwrap();
        assert_eq!(presentation.visible().len(), 12);
        assert!(!presentation.has_more());
        assert!(!section.show_more());

        assert_eq!(
            *focus.0.lock(),
            vec![(5, "r6".to_string()), (10, "r1".to_string())]
        );
    }

    #[test]
    fn loaded_thread_moves_into_presentation() {
        let service = Arc::new(MockStatusService::new().with_thread(status("1", 4, "<p>post</p>"), replies(3)));
        let mut section = CommentSection::new(service, options_for("1", vec![]));
        assert!(matches!(section.load(), Phase::Presenting(_)));

        let presentation = section.presentation().unwrap();
        assert_eq!(presentation.thread.status.id, "1");
        assert_eq!(presentation.thread.context.descendants.len(), 3);
        assert_eq!(presentation.total(), 3);
    }

    #[test]
    fn zero_replies_presents_root_only() {
        let service = Arc::new(MockStatusService::new().with_thread(status("1", 3, "<p>post</p>"), vec![]));
        let (seen, sink) = recording();
        let mut section =
            CommentSection::new(service, options_for("1", vec![])).on_notice(sink);
        section.load();

        let presentation = section.presentation().expect("presenting");
        assert_eq!(presentation.root().id, "1");
        assert_eq!(presentation.total(), 0);
        assert!(presentation.visible().is_empty());
        assert!(!presentation.has_more());
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn filters_apply_before_paging() {
        let mut statuses = replies(5);
        statuses.push(status("pin", 100, "<p>📌</p>"));
        let service = Arc::new(MockStatusService::new().with_thread(status("1", 0, "<p>post</p>"), statuses));
        let mut section = CommentSection::new(service, options_for("1", vec![no_pins()]));
        section.load();

        let presentation = section.presentation().unwrap();
        assert_eq!(presentation.total(), 5);
        assert!(presentation.replies().iter().all(|c| c.id != "pin"));
        assert!(!presentation.has_more());
    }

    #[test]
    fn fetch_failure_notifies_once() {
        let service = Arc::new(
            MockStatusService::new()
                .with_thread(status("1", 0, "<p>post</p>"), replies(3))
                .failing_context(),
        );
        let (seen, sink) = recording();
        let mut section = CommentSection::new(service, options_for("1", vec![])).on_notice(sink);
        section.load();
        section.load();

        assert!(section.presentation().is_none());
        assert_eq!(section.notice().map(|n| n.code), Some(NoticeCode::CommentLoadingError));
        assert_eq!(*seen.lock(), vec![Notice::comment_loading_error()]);
        assert!(!section.show_more());
    }

    #[test]
    fn unresolvable_author_is_errored() {
        let service = Arc::new(MockStatusService::new());
        let (seen, sink) = recording();
        let options = Options {
            target: Target {
                uri: None,
                author: Some("band".into()),
                page_url: Some("https://blog.example/post".into()),
            },
            ..Default::default()
        };
        let mut section = CommentSection::new(service.clone(), options).on_notice(sink);
        assert!(matches!(section.load(), Phase::Errored(_)));
        assert_eq!(seen.lock()[0].code, NoticeCode::NotFound);
        assert_eq!(service.calls(), vec!["search:https://blog.example/post"]);
    }

    #[test]
    fn no_target_stays_idle() {
        let service = Arc::new(MockStatusService::new());
        let mut section = CommentSection::new(service.clone(), Options::default());
        assert!(matches!(section.load(), Phase::Idle));
        assert!(service.calls().is_empty());
    }

    #[test]
    fn new_options_reset_the_section() {
        let service = Arc::new(
            MockStatusService::new()
                .with_thread(status("1", 0, "<p>one</p>"), replies(1))
                .with_thread(status("2", 0, "<p>two</p>"), replies(2)),
        );
        let mut section = CommentSection::new(service, options_for("1", vec![]));
        section.load();
        assert_eq!(section.presentation().unwrap().total(), 1);

        section.set_options(options_for("https://hachyderm.io/@band/2", vec![]));
        assert!(matches!(section.phase(), Phase::Idle));
        section.load();
        let presentation = section.presentation().unwrap();
        assert_eq!(presentation.root().id, "2");
        assert_eq!(presentation.total(), 2);
    }
}
