use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;

use crate::config;
use crate::filters::{self, FilterSpec};
use crate::notice::NoticeCode;
use crate::render::{FocusCursor, Renderer, DEFAULT_WIDTH};
use crate::resolve::Target;
use crate::section::{CommentSection, Options, Phase};

/// How a run of the comment section ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Presented,
    Inert,
    Failed(NoticeCode),
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Presented | Outcome::Inert => ExitCode::SUCCESS,
            Outcome::Failed(_) => ExitCode::from(2),
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "mastodon-comments",
    version,
    about = "Mastodon comments - Show the replies to a Mastodon post in the terminal."
)]
pub struct Args {
    /// Post URL (https://instance/@user/123) or bare status id
    #[arg(long)]
    pub uri: Option<String>,
    /// Author handle to look for when no --uri is given
    #[arg(long)]
    pub author: Option<String>,
    /// URL of the article the comments belong to, searched for with --author
    #[arg(long)]
    pub page_url: Option<String>,
    /// Base URL of the Mastodon instance
    #[arg(long)]
    pub instance: Option<String>,
    /// Hide matching replies: min-likes=N, min-chars=N, contains=TEXT,
    /// exact=TEXT, no-likes, no-pins. Repeatable; replaces configured filters.
    #[arg(long = "filter", value_name = "SPEC")]
    pub filters: Vec<String>,
    /// Pages of five replies to show before prompting
    #[arg(long, default_value_t = 1)]
    pub pages: usize,
    /// Wrap width for comment text
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    pub width: usize,
    /// Config file (defaults to ~/.config/mastodon-comments/config.yaml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: Args) -> Result<ExitCode> {
    let cfg = config::load(config::LoadOptions {
        config_file: args.config.clone(),
        env_prefix: None,
    })
    .context("load config")?;

    let specs = if args.filters.is_empty() {
        cfg.comments.filters.clone()
    } else {
        args.filters
            .iter()
            .map(|spec| FilterSpec::parse(spec))
            .collect::<Result<Vec<_>>>()?
    };
    let extractor = filters::default_extractor();

    let target = Target {
        uri: args.uri.clone(),
        author: args.author.clone().or_else(|| cfg.comments.author.clone()),
        page_url: args.page_url.clone(),
    };
    if target.uri.is_none() {
        match (&target.author, &target.page_url) {
            (None, _) => bail!("nothing to show: pass --uri, or --author together with --page-url"),
            (Some(_), None) => bail!("--author needs --page-url to search for the post"),
            _ => {}
        }
    }

    let options = Options {
        target,
        instance: args
            .instance
            .clone()
            .unwrap_or_else(|| cfg.mastodon.instance.clone()),
        filters: filters::build_all(&specs, extractor.clone()),
        ..Options::default()
    };
    tracing::debug!(instance = %options.instance, filters = ?options.filters, "starting");

    let cursor = FocusCursor::default();
    let mut section = CommentSection::connect(
        options,
        &cfg.mastodon.user_agent,
        Some(cfg.mastodon.timeout),
    )?
    .on_notice(|notice| tracing::info!(code = %notice.code, "comments unavailable"))
    .with_focus_hook(cursor.clone());

    let renderer = Renderer::new(args.width, extractor);
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let stdout = io::stdout();
    let outcome = show(
        &mut section,
        &renderer,
        &cursor,
        args.pages,
        interactive,
        stdin.lock(),
        stdout.lock(),
    )?;
    Ok(outcome.into())
}

/// Loads the section and writes it to `out`, prompting for more pages on
/// `input` when `interactive`.
pub fn show<R: BufRead, W: Write>(
    section: &mut CommentSection,
    renderer: &Renderer,
    cursor: &FocusCursor,
    pages: usize,
    interactive: bool,
    mut input: R,
    mut out: W,
) -> Result<Outcome> {
    match section.load() {
        Phase::Errored(notice) => {
            out.write_all(renderer.notice(notice).as_bytes())?;
            return Ok(Outcome::Failed(notice.code));
        }
        Phase::Presenting(_) => {}
        _ => return Ok(Outcome::Inert),
    }

    for _ in 1..pages {
        if !section.show_more() {
            break;
        }
    }

    let Some(presentation) = section.presentation() else {
        return Ok(Outcome::Inert);
    };
    out.write_all(renderer.summary(presentation.root()).as_bytes())?;
    if presentation.total() == 0 {
        return Ok(Outcome::Presented);
    }
    out.write_all(renderer.divider().as_bytes())?;
    write_comments(&mut out, renderer, presentation.visible(), 0)?;

    loop {
        let Some(presentation) = section.presentation() else {
            break;
        };
        if !presentation.has_more() || !interactive {
            break;
        }
        let remaining = presentation.total() - presentation.visible().len();
        out.write_all(renderer.show_more_prompt(remaining).as_bytes())?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 || line.trim().eq_ignore_ascii_case("q") {
            break;
        }
        if section.show_more() {
            if let Some(presentation) = section.presentation() {
                let start = cursor.position();
                write_comments(&mut out, renderer, &presentation.visible()[start..], start)?;
            }
        }
    }
    out.flush()?;
    Ok(Outcome::Presented)
}

fn write_comments<W: Write>(
    out: &mut W,
    renderer: &Renderer,
    comments: &[crate::model::Comment],
    offset: usize,
) -> io::Result<()> {
    for (i, comment) in comments.iter().enumerate() {
        out.write_all(renderer.comment(offset + i, comment).as_bytes())?;
        out.write_all(b"\n")?;
    }
    Ok(())
}
