use anyhow::{Context as _, Result};

use crate::data::StatusService;
use crate::model::{Comment, Context, Thread};
use crate::notice::Notice;

/// Loads a status and its replies. Both reads must succeed.
pub fn fetch_thread(service: &dyn StatusService, id: &str) -> Result<Thread, Notice> {
    load(service, id).map_err(|err| {
        tracing::warn!(%id, error = %format!("{err:#}"), "thread fetch failed");
        Notice::comment_loading_error()
    })
}

fn load(service: &dyn StatusService, id: &str) -> Result<Thread> {
    let status = service.status(id).context("load status")?;
    let context = service.context(id).context("load context")?;
    let thread = Thread {
        status: Comment::from(status),
        context: Context::from(context),
    };
    tracing::debug!(
        %id,
        ancestors = thread.context.ancestors.len(),
        descendants = thread.context.descendants.len(),
        "thread loaded"
    );
    Ok(thread)
}
