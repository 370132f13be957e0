//! Lazy, page-by-page walkers over the site's AJAX listings.
//!
//! Every walker yields absolute post (or profile) URLs and only requests the next
//! page once the consumer has drained the current one. The page parsers are plain
//! functions so they can be checked against captured payloads.
use ahash::HashMap;
use async_stream::try_stream;
use futures::Stream;
use ngdl_common::headers;
use ngdl_common::log::debug;
use ngdl_common::serde_json::Value;
use ngdl_common::text;

use crate::error::ExtractorError;
use crate::extractor::session::Session;

/// A favorites page with fewer entries than this is the last one.
pub const FAVORITES_PER_PAGE: usize = 24;

/// A `load_more` snippet shorter than this carries no further page.
const LOAD_MORE_MIN_LEN: usize = 8;

const XHR: &str = "XMLHttpRequest";

/// URLs found on one listing page and whether another page follows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub urls: Vec<String>,
    pub more: bool,
}

/// Which links a favorites page is scanned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteEntries {
    Posts,
    Users,
}

/// Fails with [`ExtractorError::StopExtraction`] if the payload carries an `errors` list.
pub fn check_errors(data: &Value) -> Result<(), ExtractorError> {
    let Some(errors) = data.get("errors") else {
        return Ok(());
    };

    let message = match errors {
        Value::Array(list) => list
            .iter()
            .map(|error| match error {
                Value::String(msg) => text::unescape(msg),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Value::String(msg) => text::unescape(msg),
        other => other.to_string(),
    };

    Err(ExtractorError::StopExtraction { message })
}

fn load_more(data: &Value) -> Option<bool> {
    data.get("load_more")
        .map(|snippet| snippet.as_str().is_some_and(|s| s.len() >= LOAD_MORE_MIN_LEN))
}

/// Parses one page of a user gallery.
///
/// `items` maps year buckets to lists of markup snippets, each holding a link to a post.
pub fn parse_gallery_page(root: &str, data: &Value) -> Result<ListingPage, ExtractorError> {
    if data.as_object().map_or(true, |obj| obj.is_empty()) {
        return Ok(ListingPage::default());
    }
    check_errors(data)?;

    let snippets: Vec<&str> = match data.get("items") {
        Some(Value::Object(years)) if !years.is_empty() => years
            .values()
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(Value::as_str)
            .collect(),
        Some(Value::Array(items)) if !items.is_empty() => {
            items.iter().filter_map(Value::as_str).collect()
        }
        _ => return Ok(ListingPage::default()),
    };

    let urls = snippets
        .into_iter()
        .map(|item| text::extr(item, "href=\"", "\""))
        .filter(|href| !href.is_empty())
        .map(|href| text::urljoin(root, href))
        .collect();

    Ok(ListingPage {
        urls,
        more: load_more(data).unwrap_or(false),
    })
}

/// Parses the `component` markup of a favorites page.
pub fn parse_favorites_page(root: &str, component: &str, entries: FavoriteEntries) -> ListingPage {
    let urls: Vec<String> = match entries {
        FavoriteEntries::Posts => {
            let begin = format!("href=\"{root}");
            text::extract_iter(component, &begin, "\"")
                .map(|path| format!("{root}{path}"))
                .collect()
        }
        FavoriteEntries::Users => text::extract_iter(component, "class=\"item-user", "\"><img")
            .map(|chunk| chunk.rsplit('"').next().unwrap_or_default())
            .filter(|url| !url.is_empty())
            .map(|url| text::ensure_http_scheme(url).into_owned())
            .collect(),
    };

    let more = urls.len() >= FAVORITES_PER_PAGE;
    ListingPage { urls, more }
}

/// Parses one page of search results. Links back into the search UI are dropped.
pub fn parse_search_page(root: &str, data: &Value) -> ListingPage {
    let content = data.get("content").and_then(Value::as_str).unwrap_or_default();

    let mut found = false;
    let urls = text::extract_iter(content, "href=\"", "\"")
        .inspect(|_| found = true)
        .filter(|href| !href.starts_with("/search/"))
        .map(|href| text::urljoin(root, href))
        .collect();

    ListingPage {
        urls,
        more: found && load_more(data).unwrap_or(true),
    }
}

fn listing_headers(referer: &str) -> Vec<(&'static str, String)> {
    headers! {
        "Referer" => referer,
        "X-Requested-With" => XHR,
    }
}

/// Walks `{user_root}/{kind}` page by page.
pub fn gallery<'a>(
    session: &'a Session,
    root: &'a str,
    user_root: String,
    kind: &'a str,
) -> impl Stream<Item = Result<String, ExtractorError>> + 'a {
    try_stream! {
        let url = format!("{user_root}/{kind}");
        let headers = listing_headers(&url);
        let mut page = 1u32;

        loop {
            let query = [("page", page.to_string()), ("isAjaxRequest", "1".to_string())];
            let response = session.get_query(&url, &query, &headers).await?;

            let Ok(data) = response.json::<Value>() else {
                debug!("No JSON on page {page} of {url}, stopping");
                break;
            };
            let listing = parse_gallery_page(root, &data)?;
            debug!("Page {page} of {url}: {} posts", listing.urls.len());

            for post_url in listing.urls {
                yield post_url;
            }

            if !listing.more {
                break;
            }
            page += 1;
        }
    }
}

/// Walks `{user_root}/favorites/{kind}` page by page.
///
/// A redirect (usually to the login page) ends the walk quietly.
pub fn favorites<'a>(
    session: &'a Session,
    root: &'a str,
    user_root: String,
    kind: &'a str,
    entries: FavoriteEntries,
) -> impl Stream<Item = Result<String, ExtractorError>> + 'a {
    try_stream! {
        let url = format!("{user_root}/favorites/{kind}");
        let headers = listing_headers(&url);
        let mut page = 1u32;

        loop {
            let query = [("page", page.to_string()), ("isAjaxRequest", "1".to_string())];
            let response = session.get_query(&url, &query, &headers).await?;

            if response.redirected {
                debug!("Favorites of {url} redirected to {}, stopping", response.url);
                break;
            }
            let response = response.error_for_status()?;
            let Ok(data) = response.json::<Value>() else {
                debug!("No JSON on page {page} of {url}, stopping");
                break;
            };
            check_errors(&data)?;

            let component = data.get("component").and_then(Value::as_str).unwrap_or_default();
            let listing = parse_favorites_page(root, component, entries);
            debug!("Page {page} of {url}: {} entries", listing.urls.len());

            for entry in listing.urls {
                yield entry;
            }

            if !listing.more {
                break;
            }
            page += 1;
        }
    }
}

/// Walks `{root}/search/conduct/{kind}` with the user's query.
///
/// A `suitabilities` entry in the query is first applied to the session, since the
/// search endpoint only honors the rating filter stored server side.
pub fn search<'a>(
    session: &'a Session,
    root: &'a str,
    kind: &'a str,
    query: HashMap<String, String>,
) -> impl Stream<Item = Result<String, ExtractorError>> + 'a {
    try_stream! {
        if let Some(suitabilities) = query.get("suitabilities").filter(|s| !s.is_empty()) {
            let form: Vec<(String, &str)> = suitabilities
                .split(',')
                .map(|rating| (format!("view_suitability_{rating}"), "on"))
                .collect();
            let url = format!("{root}/suitabilities");
            let referer = format!("{root}/");
            let headers = headers! { "Referer" => referer };
            debug!("Setting rating filter to {suitabilities}");
            session.post_form(&url, &form, &headers).await?.error_for_status()?;
        }

        let url = format!("{root}/search/conduct/{kind}");
        let headers = headers! {
            "Accept" => "application/json, text/javascript, */*; q=0.01",
            "X-Requested-With" => XHR,
        };
        let mut params: Vec<(String, String)> = query.into_iter().collect();
        params.push(("inner".into(), "1".into()));
        let mut page = 1u32;

        loop {
            let mut page_params = params.clone();
            page_params.push(("page".into(), page.to_string()));
            let response = session.get_query(&url, &page_params, &headers).await?;

            let Ok(data) = response.error_for_status()?.json::<Value>() else {
                debug!("No JSON on page {page} of {url}, stopping");
                break;
            };
            check_errors(&data)?;

            let listing = parse_search_page(root, &data);
            debug!("Page {page} of {url}: {} results", listing.urls.len());

            for post_url in listing.urls {
                yield post_url;
            }

            if !listing.more {
                break;
            }
            page += 1;
        }
    }
}
