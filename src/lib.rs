#![allow(clippy::uninlined_format_args)]

pub mod app;
pub mod config;
pub mod data;
pub mod filters;
pub mod mastodon;
pub mod model;
pub mod notice;
pub mod present;
pub mod render;
pub mod resolve;
pub mod section;
pub mod thread;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::run;
pub use filters::Filter;
pub use model::{Comment, Thread};
pub use notice::{Notice, NoticeCode};
pub use section::{CommentSection, Options};
