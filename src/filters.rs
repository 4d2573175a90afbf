//! Comment filters.
//!
//! A [`Filter`] wraps a predicate over a [`Comment`]. When the predicate
//! returns `true` the filter *matches* and the comment is hidden; a reply is
//! shown only when no filter in the chain matches it.

use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use once_cell::sync::Lazy;
use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::model::Comment;

pub const PIN: &str = "📌";

/// Turns a status' HTML body into the plain text the filters compare against.
pub trait TextExtractor: Send + Sync {
    fn text(&self, html: &str) -> String;
}

/// Concatenates the text nodes of the parsed fragment, markup dropped and
/// entities decoded.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlText;

impl TextExtractor for HtmlText {
    fn text(&self, html: &str) -> String {
        Html::parse_fragment(html).root_element().text().collect()
    }
}

static DEFAULT_EXTRACTOR: Lazy<Arc<dyn TextExtractor>> = Lazy::new(|| Arc::new(HtmlText));

pub fn default_extractor() -> Arc<dyn TextExtractor> {
    DEFAULT_EXTRACTOR.clone()
}

pub type Predicate = dyn Fn(&Comment) -> bool + Send + Sync;

#[derive(Clone)]
pub struct Filter {
    label: String,
    predicate: Arc<Predicate>,
}

impl Filter {
    pub fn new<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Comment) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn matches(&self, comment: &Comment) -> bool {
        (self.predicate)(comment)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter").field("label", &self.label).finish()
    }
}

/// True when any filter in the chain hides `comment`.
pub fn is_hidden(filters: &[Filter], comment: &Comment) -> bool {
    filters.iter().any(|filter| filter.matches(comment))
}

/// Hides comments with fewer than `min` favourites.
pub fn min_like_count(min: i64) -> Filter {
    Filter::new(format!("min-likes={min}"), move |comment: &Comment| {
        comment.favourites() < min
    })
}

/// Hides comments whose text is shorter than `min` characters.
pub fn min_character_count(min: usize) -> Filter {
    min_character_count_with(min, default_extractor())
}

pub fn min_character_count_with(min: usize, extractor: Arc<dyn TextExtractor>) -> Filter {
    Filter::new(format!("min-chars={min}"), move |comment: &Comment| {
        extractor.text(&comment.content).chars().count() < min
    })
}

/// Hides comments whose text contains `needle`, ignoring case.
pub fn text_contains(needle: &str) -> Filter {
    text_contains_with(needle, default_extractor())
}

pub fn text_contains_with(needle: &str, extractor: Arc<dyn TextExtractor>) -> Filter {
    let lowered = needle.to_lowercase();
    Filter::new(format!("contains={needle}"), move |comment: &Comment| {
        extractor
            .text(&comment.content)
            .to_lowercase()
            .contains(&lowered)
    })
}

/// Hides comments whose whole text is `text`, ignoring case.
pub fn exact_match(text: &str) -> Filter {
    exact_match_with(text, default_extractor())
}

pub fn exact_match_with(text: &str, extractor: Arc<dyn TextExtractor>) -> Filter {
    let lowered = text.to_lowercase();
    Filter::new(format!("exact={text}"), move |comment: &Comment| {
        extractor.text(&comment.content).to_lowercase() == lowered
    })
}

/// Only hides comments with a negative favourite count.
pub fn no_likes() -> Filter {
    min_like_count(0)
}

/// Hides replies that consist of nothing but a pin.
pub fn no_pins() -> Filter {
    exact_match(PIN)
}

/// Serializable description of a built-in filter, as written in the config
/// file or on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterSpec {
    MinLikes { min: i64 },
    MinCharacters { min: usize },
    Contains { text: String },
    ExactMatch { text: String },
    NoLikes,
    NoPins,
}

impl FilterSpec {
    /// Parses the short form: `min-likes=2`, `min-chars=10`, `contains=foo`,
    /// `exact=foo`, `no-likes` or `no-pins`.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let (name, value) = match input.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value)),
            None => (input, None),
        };
        let spec = match (name, value) {
            ("min-likes", Some(v)) => FilterSpec::MinLikes {
                min: v.trim().parse().map_err(|_| anyhow!("filter: invalid like count {v:?}"))?,
            },
            ("min-chars", Some(v)) => FilterSpec::MinCharacters {
                min: v
                    .trim()
                    .parse()
                    .map_err(|_| anyhow!("filter: invalid character count {v:?}"))?,
            },
            ("contains", Some(v)) => FilterSpec::Contains { text: v.to_string() },
            ("exact", Some(v)) => FilterSpec::ExactMatch { text: v.to_string() },
            ("no-likes", None) => FilterSpec::NoLikes,
            ("no-pins", None) => FilterSpec::NoPins,
            _ => bail!("filter: unknown filter {input:?}"),
        };
        Ok(spec)
    }

    pub fn build(&self, extractor: Arc<dyn TextExtractor>) -> Filter {
        match self {
            FilterSpec::MinLikes { min } => min_like_count(*min),
            FilterSpec::MinCharacters { min } => min_character_count_with(*min, extractor),
            FilterSpec::Contains { text } => text_contains_with(text, extractor),
            FilterSpec::ExactMatch { text } => exact_match_with(text, extractor),
            FilterSpec::NoLikes => no_likes(),
            FilterSpec::NoPins => exact_match_with(PIN, extractor),
        }
    }
}

pub fn build_all(specs: &[FilterSpec], extractor: Arc<dyn TextExtractor>) -> Vec<Filter> {
    specs
        .iter()
        .map(|spec| spec.build(extractor.clone()))
        .collect()
}
