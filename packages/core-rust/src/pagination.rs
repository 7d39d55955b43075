//! Page strip sequencing for pagination controls.
//!
//! [`sequence`] turns a 1-based current page and a page count into the
//! abbreviated strip a pager renders, e.g. `1 … 4 5 6 … 20`.
//!
//! `max_visible` counts numbered slots including the two boundary pages, so
//! the sliding window around the current page is `max_visible - 2` wide.
//! The first and last page are always present. A gap of exactly one page is
//! shown as that page number rather than as an ellipsis, so an ellipsis always
//! hides at least two pages and at most one appears on each side.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Strip width used by the pager when the caller does not choose one.
pub const DEFAULT_MAX_VISIBLE: usize = 5;

const ELLIPSIS_TAG: &str = "ellipsis";

/// One entry of a page strip. Serializes as a bare number or the string `"ellipsis"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageMarker {
    /// A 1-based page number.
    Page(usize),
    /// A run of two or more hidden pages.
    Ellipsis,
}

impl fmt::Display for PageMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(n) => write!(f, "{n}"),
            Self::Ellipsis => f.write_str("…"),
        }
    }
}

impl Serialize for PageMarker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Page(n) => n.serialize(serializer),
            Self::Ellipsis => serializer.serialize_str(ELLIPSIS_TAG),
        }
    }
}

impl<'de> Deserialize<'de> for PageMarker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Page(usize),
            Tag(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Page(n) => Ok(Self::Page(n)),
            Raw::Tag(tag) if tag == ELLIPSIS_TAG => Ok(Self::Ellipsis),
            Raw::Tag(tag) => Err(D::Error::custom(format!(
                "expected page number or \"{ELLIPSIS_TAG}\", got {tag:?}"
            ))),
        }
    }
}

/// Builds the page strip for `current_page` (1-based) out of `total_pages`.
///
/// `current_page` is clamped into `[1, total_pages]`, `max_visible` is
/// treated as at least 3 once the strip needs abbreviating, and zero pages
/// yield an empty strip.
///
/// ```
/// use schemaview_core::pagination::{sequence, PageMarker::{Ellipsis, Page}};
///
/// assert_eq!(
///     sequence(5, 20, 5),
///     vec![Page(1), Ellipsis, Page(4), Page(5), Page(6), Ellipsis, Page(20)]
/// );
/// assert_eq!(sequence(2, 4, 5), vec![Page(1), Page(2), Page(3), Page(4)]);
/// ```
#[must_use]
pub fn sequence(current_page: usize, total_pages: usize, max_visible: usize) -> Vec<PageMarker> {
    if total_pages == 0 {
        return Vec::new();
    }
    if total_pages <= max_visible {
        return (1..=total_pages).map(PageMarker::Page).collect();
    }

    let current = current_page.clamp(1, total_pages);
    let window = max_visible.saturating_sub(2).max(1);

    // Inner window lives strictly between the boundary pages.
    let last_inner = total_pages - 1;
    let mut start = current.saturating_sub(window / 2).max(2);
    let mut end = start + window - 1;
    if end > last_inner {
        end = last_inner;
        start = end.saturating_sub(window - 1).max(2);
    }

    let mut strip = Vec::with_capacity(window + 4);
    strip.push(PageMarker::Page(1));
    match start {
        2 => {}
        3 => strip.push(PageMarker::Page(2)),
        _ => strip.push(PageMarker::Ellipsis),
    }
    strip.extend((start..=end).map(PageMarker::Page));
    match total_pages - end {
        1 => {}
        2 => strip.push(PageMarker::Page(total_pages - 1)),
        _ => strip.push(PageMarker::Ellipsis),
    }
    strip.push(PageMarker::Page(total_pages));
    strip
}
