//! Plain-text helpers for pulling values out of raw markup.
//!
//! Nothing in here builds a DOM. Every function works on byte offsets into the
//! page source, which is how the extractors read post pages and AJAX payloads.
use std::borrow::Cow;

use ahash::{HashMap, HashMapExt};
use chrono::{DateTime, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use url::{form_urlencoded, Url};

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Finds the text between `begin` and `end`, searching from `pos`.
///
/// Returns the enclosed slice together with the offset right after `end`.
#[must_use]
pub fn extract<'a>(txt: &'a str, begin: &str, end: &str, pos: usize) -> Option<(&'a str, usize)> {
    let rest = txt.get(pos..)?;
    let first = pos + rest.find(begin)? + begin.len();
    let last = first + txt[first..].find(end)?;
    Some((&txt[first..last], last + end.len()))
}

/// Returns the first text enclosed by `begin` and `end`, or an empty slice.
#[must_use]
pub fn extr<'a>(txt: &'a str, begin: &str, end: &str) -> &'a str {
    extract(txt, begin, end, 0).map_or("", |(value, _)| value)
}

/// Sequential reader over a page.
///
/// Every successful [`extr`](TextCursor::extr) moves the cursor past the match, so
/// later lookups only see the remainder of the page. A miss leaves the cursor
/// where it was.
#[derive(Debug, Clone)]
pub struct TextCursor<'a> {
    txt: &'a str,
    pos: usize,
}

impl<'a> TextCursor<'a> {
    #[must_use]
    pub const fn new(txt: &'a str) -> Self {
        Self { txt, pos: 0 }
    }

    pub fn extr(&mut self, begin: &str, end: &str) -> &'a str {
        match extract(self.txt, begin, end, self.pos) {
            Some((value, next)) => {
                self.pos = next;
                value
            }
            None => "",
        }
    }

    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// The whole underlying text, regardless of the cursor position.
    #[must_use]
    pub const fn source(&self) -> &'a str {
        self.txt
    }
}

/// Iterator over every non-overlapping `begin ... end` match. See [`extract_iter`].
#[derive(Debug, Clone)]
pub struct ExtractIter<'a, 'b> {
    txt: &'a str,
    begin: &'b str,
    end: &'b str,
    pos: usize,
}

impl<'a> Iterator for ExtractIter<'a, '_> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let (value, next) = extract(self.txt, self.begin, self.end, self.pos)?;
        self.pos = next;
        Some(value)
    }
}

#[must_use]
pub const fn extract_iter<'a, 'b>(txt: &'a str, begin: &'b str, end: &'b str) -> ExtractIter<'a, 'b> {
    ExtractIter {
        txt,
        begin,
        end,
        pos: 0,
    }
}

/// Decodes HTML entities (`&amp;`, `&#39;`, ...).
#[must_use]
pub fn unescape(txt: &str) -> String {
    html_escape::decode_html_entities(txt).into_owned()
}

/// Drops every tag and trims surrounding whitespace. Entities are left untouched.
#[must_use]
pub fn remove_html(txt: &str) -> String {
    HTML_TAG.replace_all(txt, "").trim().to_string()
}

/// Splits markup on its tags and returns the unescaped, trimmed text chunks.
///
/// Chunks that are empty or whitespace only are skipped.
#[must_use]
pub fn split_html(txt: &str) -> Vec<String> {
    HTML_TAG
        .split(txt)
        .filter(|chunk| !chunk.trim().is_empty())
        .map(|chunk| unescape(chunk).trim().to_string())
        .collect()
}

/// Parses an unsigned integer, falling back to `0`.
#[must_use]
pub fn parse_int(txt: &str) -> u64 {
    txt.trim().parse().unwrap_or(0)
}

/// Parses a float, falling back to `0.0`.
#[must_use]
pub fn parse_float(txt: &str) -> f64 {
    txt.trim().parse().unwrap_or(0.0)
}

/// Parses an ISO 8601 timestamp with offset into a naive UTC datetime.
#[must_use]
pub fn parse_datetime(txt: &str) -> Option<NaiveDateTime> {
    let txt = txt.trim();
    DateTime::parse_from_rfc3339(txt)
        .or_else(|_| DateTime::parse_from_str(txt, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|date| date.naive_utc())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(txt, "%Y-%m-%dT%H:%M:%S").ok())
}

/// Parses a Unix timestamp in seconds.
#[must_use]
pub fn parse_timestamp(txt: &str) -> Option<NaiveDateTime> {
    let secs = txt.trim().parse::<i64>().ok()?;
    DateTime::from_timestamp(secs, 0).map(|date| date.naive_utc())
}

/// Resolves `url` against `base`. Absolute URLs pass through unchanged.
#[must_use]
pub fn urljoin(base: &str, url: &str) -> String {
    if url.is_empty() || url.starts_with("https://") || url.starts_with("http://") {
        return url.to_string();
    }

    Url::parse(base)
        .and_then(|base| base.join(url))
        .map_or_else(|_| url.to_string(), String::from)
}

/// Prefixes `https://` to URLs lacking an http scheme (including `//host/...`).
#[must_use]
pub fn ensure_http_scheme(url: &str) -> Cow<'_, str> {
    if url.is_empty() || url.starts_with("https://") || url.starts_with("http://") {
        Cow::Borrowed(url)
    } else {
        Cow::Owned(format!(
            "https://{}",
            url.trim_start_matches(|c| c == '/' || c == ':')
        ))
    }
}

/// Splits the last path segment of `url` into its file name and lowercase extension.
///
/// A segment without a dot (or starting with one) has an empty extension.
#[must_use]
pub fn nameext_from_url(url: &str) -> (String, String) {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    let segment = without_query.rsplit('/').next().unwrap_or_default();
    let filename = urlencoding::decode(segment).map_or_else(|_| segment.to_string(), Cow::into_owned);

    match filename.rsplit_once('.') {
        Some((name, ext)) if !name.is_empty() => (name.to_string(), ext.to_lowercase()),
        _ => (filename, String::new()),
    }
}

/// Parses a query string into a map. The first occurrence of a key wins.
#[must_use]
pub fn parse_query(query: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        map.entry(key.into_owned()).or_insert_with(|| value.into_owned());
    }
    map
}
