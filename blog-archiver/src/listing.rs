//! Parsing of one archive index page.
//!
//! A listing row looks like
//!
//! ```text
//! <li><span class="mod-arcv-tit"><a href="http://blog.goo.ne.jp/guldfisk/e/e25f...">お疲れ様パーティー</a></span><br>
//!   (2016-10-29&nbsp;|&nbsp;<a href="...arcv/?c=0b4b...">イベント</a>)<br>
//!   <a href="http://blog.goo.ne.jp/guldfisk/e/e25f...">10/29(土) サッカーのシーズンオフお疲...</a></li>
//! ```
//!
//! Every `li` whose direct child is a `span.mod-arcv-tit` counts as a row, so layout `li`s
//! wrapping the whole list are not rows themselves. The title anchor gives the URL
//! and title, and the first parenthesised `YYYY-MM-DD` token in the row gives the date.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::entry::DATE_FORMAT;

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li > span.mod-arcv-tit").expect("valid selector"));
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("valid selector"));
static DATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*(\d{4}-\d{2}-\d{2})").expect("valid regex"));

/// Fields extracted from a single listing row.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRow {
    pub url: String,
    pub date: String,
    pub title: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("no title anchor in row: {0}")]
    MissingAnchor(String),

    #[error("title anchor has no href: {0}")]
    MissingHref(String),

    #[error("no (YYYY-MM-DD) date token in row: {0}")]
    MissingDate(String),

    #[error("invalid date '{0}'")]
    InvalidDate(String),
}

/// All rows of an archive page, in document order.
#[derive(Debug, Default)]
pub struct ListingPage {
    pub rows: Vec<Result<ListingRow, RowError>>,
}

impl ListingPage {
    pub fn parse(html: &str) -> ListingPage {
        let document = Html::parse_document(html);

        let mut seen = HashSet::new();
        let rows = document
            .select(&TITLE_SELECTOR)
            .filter_map(|title_span| {
                let li = title_span.parent().and_then(ElementRef::wrap)?;
                // One row per li, even with several title spans
                seen.insert(li.id()).then(|| parse_row(li, title_span))
            })
            .collect();

        ListingPage { rows }
    }

    /// Number of `li` elements that looked like listing rows, parseable or not.
    pub fn candidate_count(&self) -> usize {
        self.rows.len()
    }

    pub fn parsed(&self) -> impl Iterator<Item = &ListingRow> {
        self.rows.iter().filter_map(|row| row.as_ref().ok())
    }

    pub fn parsed_count(&self) -> usize {
        self.parsed().count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &RowError> {
        self.rows.iter().filter_map(|row| row.as_ref().err())
    }
}

fn parse_row(li: ElementRef, title_span: ElementRef) -> Result<ListingRow, RowError> {
    let snippet = || title_span.html();

    let anchor = title_span
        .select(&ANCHOR_SELECTOR)
        .next()
        .ok_or_else(|| RowError::MissingAnchor(snippet()))?;
    let url = anchor
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .ok_or_else(|| RowError::MissingHref(snippet()))?
        .to_string();
    let title = anchor.text().collect::<String>().trim().to_string();

    let row_text = li.text().collect::<String>();
    let date = DATE_TOKEN
        .captures(&row_text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| RowError::MissingDate(snippet()))?;

    if NaiveDate::parse_from_str(&date, DATE_FORMAT).is_err() {
        return Err(RowError::InvalidDate(date));
    }

    Ok(ListingRow { url, date, title })
}
