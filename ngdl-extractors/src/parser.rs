//! Post detail page parsing.
//!
//! A post page is read front to back with a single [`TextCursor`]: the type specific
//! fields come first, then the fields every post page shares. Each lookup only sees
//! what follows the previous hit, so the order of the calls below matters.
use ahash::HashMap;
use ngdl_common::chrono::NaiveDateTime;
use ngdl_common::post::rating::Rating;
use ngdl_common::post::{PostRecord, PostType};
use ngdl_common::serde::{self, Deserialize};
use ngdl_common::text::{self, TextCursor};

use crate::error::ExtractorError;
use crate::extractor_config::FormatPreference;

const DATE_PUBLISHED: &str = "itemprop=\"datePublished\" content=\"";
const RATED: &str = "class=\"rated-";

/// Rendition lists keyed by their label (`"360p"`, `"720p"`, ...).
pub type VideoSources = HashMap<String, Vec<VideoSource>>;

/// Payload of `/portal/video/{index}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(crate = "self::serde")]
pub struct VideoSourcesResponse {
    #[serde(default)]
    pub sources: VideoSources,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(crate = "self::serde")]
pub struct VideoSource {
    pub src: String,
    #[serde(rename = "type", default)]
    pub mime: Option<String>,
}

/// Outcome of choosing a video rendition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatSelection {
    /// Chosen URL; empty when nothing qualifies.
    pub primary: String,
    /// Remaining candidates, widest first.
    pub fallback: Vec<String>,
}

/// URL actually requested for a post. Flash movies are asked for in their flash variant.
pub fn request_url(post_url: &str, post_type: PostType, flash: bool) -> String {
    if flash && post_type == PostType::Media {
        format!("{post_url}/format/flash")
    } else {
        post_url.to_string()
    }
}

/// Notice shown by the age gate, if the page is behind one.
pub fn age_gate_message(page: &str) -> Option<&str> {
    let pos = page.find("id=\"adults_only\"")?;
    Some(text::extract(page, "class=\"highlight\">", "<", pos).map_or("", |(msg, _)| msg))
}

fn path_segment(url: &str, n: usize) -> &str {
    url.split('/').nth(n).unwrap_or_default()
}

/// Date carried in the query string of a rendition URL (`...mp4?1592000000`).
fn query_timestamp(src: &str) -> Option<NaiveDateTime> {
    let query = src.rsplit_once('?').map_or(src, |(_, query)| query);
    text::parse_timestamp(query)
}

/// Art post. The full size image markup is embedded as a JSON string.
pub fn parse_image(cursor: &mut TextCursor<'_>) -> Result<PostRecord, ExtractorError> {
    let full_json = cursor.extr("\"full_image_text\":", "});");
    let full_markup: String = serde_json::from_str(full_json.trim())?;
    let mut full = TextCursor::new(&full_markup);

    let title = text::unescape(cursor.extr("\"og:title\" content=\"", "\""));
    let description = text::unescape(cursor.extr(":description\" content=\"", "\""));
    let content_type = cursor.extr("og:type\" content=\"", "\"").to_string();
    let date = text::parse_datetime(cursor.extr(DATE_PUBLISHED, "\""));
    let rating = Rating::from_rating_str(cursor.extr(RATED, "\""));

    let url = full.extr("src=\"", "\"").to_string();
    if url.is_empty() {
        return Err(ExtractorError::MissingField {
            field: String::from("src"),
        });
    }
    let width = text::parse_int(full.extr("width=\"", "\""));
    let height = text::parse_int(full.extr("height=\"", "\""));

    let file_name = url.rsplit('/').next().unwrap_or_default();
    let index = text::parse_int(file_name.split('_').next().unwrap_or_default());

    Ok(PostRecord {
        title,
        description,
        content_type,
        post_type: PostType::Image,
        date,
        url,
        index,
        display_index: index.to_string(),
        rating,
        width: Some(width),
        height: Some(height),
        ..PostRecord::default()
    })
}

/// Audio post. The download URL sits in the embedded player config.
pub fn parse_audio(cursor: &mut TextCursor<'_>, post_url: &str) -> PostRecord {
    let index = text::parse_int(path_segment(post_url, 5));

    let title = text::unescape(cursor.extr("\"og:title\" content=\"", "\""));
    let description = text::unescape(cursor.extr(":description\" content=\"", "\""));
    let content_type = cursor.extr("og:type\" content=\"", "\"").to_string();
    let date = text::parse_datetime(cursor.extr(DATE_PUBLISHED, "\""));
    let url = cursor.extr("{\"url\":\"", "\"").replace("\\/", "/");

    PostRecord {
        title,
        description,
        content_type,
        post_type: PostType::Audio,
        date,
        url,
        index,
        display_index: index.to_string(),
        rating: Rating::Unrated,
        ..PostRecord::default()
    }
}

/// A parsed movie or game page.
#[derive(Debug, Clone)]
pub struct MediaPage {
    pub record: PostRecord,
    /// The page had no direct source; renditions must be fetched separately.
    pub needs_sources: bool,
}

/// Movie, game or flash post.
///
/// Pages with a player config carry the source URL directly; the rest only expose
/// their renditions through the video endpoint, see [`select_format`].
pub fn parse_media(cursor: &mut TextCursor<'_>, post_url: &str) -> MediaPage {
    let index = text::parse_int(path_segment(post_url, 5));

    let title = text::unescape(cursor.extr("\"og:title\" content=\"", "\""));
    let content_type = cursor.extr("og:type\" content=\"", "\"").to_string();
    let description = cursor.extr("\"og:description\" content=\"", "\"");

    let src = cursor.extr("{\"url\":\"", "\"").replace("\\/", "/");
    let needs_sources = src.is_empty();
    let date = if needs_sources {
        None
    } else {
        let published = cursor.extr(DATE_PUBLISHED, "\"");
        query_timestamp(&src).or_else(|| text::parse_datetime(published))
    };

    let description = if description.is_empty() {
        cursor.extr("itemprop=\"description\" content=\"", "\"")
    } else {
        description
    };
    let rating = Rating::from_rating_str(cursor.extr(RATED, "\""));

    MediaPage {
        record: PostRecord {
            title,
            description: text::unescape(description),
            content_type,
            post_type: PostType::Media,
            date,
            url: src,
            index,
            display_index: index.to_string(),
            rating,
            ..PostRecord::default()
        },
        needs_sources,
    }
}

/// Picks a rendition according to `preference`.
///
/// With [`FormatPreference::Original`] the primary URL is the 360p source with its
/// size marker removed, which points at the uploaded file, and every rendition
/// becomes a fallback. Without a 360p rendition there is no original to point at.
pub fn select_format(sources: &VideoSources, preference: FormatPreference) -> FormatSelection {
    let mut candidates: Vec<(u64, &str)> = sources
        .iter()
        .filter_map(|(label, list)| {
            let source = list.first()?;
            Some((text::parse_int(label.trim_end_matches('p')), source.src.as_str()))
        })
        .collect();
    candidates.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));

    match preference {
        FormatPreference::Original => {
            let Some(base) = sources.get("360p").and_then(|list| list.first()) else {
                return FormatSelection::default();
            };
            FormatSelection {
                primary: base.src.replace(".360p.", "."),
                fallback: candidates.into_iter().map(|(_, src)| src.to_string()).collect(),
            }
        }
        FormatPreference::MaxWidth(max) => {
            let mut qualifying = candidates
                .into_iter()
                .filter(|(width, _)| *width <= max)
                .map(|(_, src)| src.to_string());
            match qualifying.next() {
                Some(primary) => FormatSelection {
                    primary,
                    fallback: qualifying.collect(),
                },
                None => FormatSelection::default(),
            }
        }
    }
}

/// Stores the negotiated rendition in `record`, dating it from the URL or the page.
pub fn apply_selection(record: &mut PostRecord, selection: FormatSelection, page: &str) {
    record.date = query_timestamp(&selection.primary)
        .or_else(|| text::parse_datetime(text::extr(page, DATE_PUBLISHED, "\"")));
    record.url = selection.primary;
    record.fallback = selection.fallback;
}

/// Fields every post page shares. Continues from where the type specific parser stopped,
/// except for the credited artists, which are collected from the whole page.
pub fn parse_common(cursor: &mut TextCursor<'_>, record: &mut PostRecord) {
    record.images_markup = cursor.extr("<div class=\"art-images", "\n</div>").to_string();

    let comment = cursor.extr("id=\"author_comments\"", "</div>");
    record.comment_markup = comment
        .split_once('>')
        .map_or("", |(_, markup)| markup)
        .to_string();
    record.comment = text::unescape(&text::remove_html(&record.comment_markup));

    record.favorites = text::parse_int(&cursor.extr("id=\"faves_load\">", "<").replace(',', ""));
    record.score = text::parse_float(cursor.extr("id=\"score_number\">", "<"));
    record.tags = text::split_html(cursor.extr("<dd class=\"tags\">", "</dd>"));

    record.artist = text::extract_iter(cursor.source(), "<div class=\"item-user\">", ">")
        .map(|user| text::extr(user, "//", ".").to_string())
        .filter(|user| !user.is_empty())
        .collect();
}

#[cfg(test)]
mod test {
    use super::*;

    fn sources(labels: &[&str]) -> VideoSources {
        labels
            .iter()
            .map(|label| {
                (
                    (*label).to_string(),
                    vec![VideoSource {
                        src: format!("https://uploads.ungrounded.net/alternate/1/1_alternate_1.{label}.mp4?1592000000"),
                        mime: Some("video/mp4".into()),
                    }],
                )
            })
            .collect()
    }

    fn src(label: &str) -> String {
        format!("https://uploads.ungrounded.net/alternate/1/1_alternate_1.{label}.mp4?1592000000")
    }

    #[test]
    fn flash_variant_only_for_media() {
        let view = "https://www.newgrounds.com/portal/view/161181";
        assert_eq!(request_url(view, PostType::Media, true), format!("{view}/format/flash"));
        assert_eq!(request_url(view, PostType::Media, false), view);
        let art = "https://www.newgrounds.com/art/view/a/b";
        assert_eq!(request_url(art, PostType::Image, true), art);
    }

    #[test]
    fn age_gate() {
        let page = r#"<div id="adults_only"><p class="highlight">You must be 18 or older</p></div>"#;
        assert_eq!(age_gate_message(page), Some("You must be 18 or older"));
        assert_eq!(age_gate_message("<p class=\"highlight\">hi</p>"), None);
    }

    #[test]
    fn format_capped_by_width() {
        let sources = sources(&["360p", "480p", "720p"]);
        let selection = select_format(&sources, FormatPreference::MaxWidth(480));
        assert_eq!(selection.primary, src("480p"));
        assert_eq!(selection.fallback, vec![src("360p")]);

        let selection = select_format(&sources, FormatPreference::MaxWidth(1080));
        assert_eq!(selection.primary, src("720p"));
        assert_eq!(selection.fallback, vec![src("480p"), src("360p")]);

        assert_eq!(
            select_format(&sources, FormatPreference::MaxWidth(200)),
            FormatSelection::default()
        );
    }

    #[test]
    fn format_original() {
        let selection = select_format(&sources(&["360p", "720p"]), FormatPreference::Original);
        assert_eq!(
            selection.primary,
            "https://uploads.ungrounded.net/alternate/1/1_alternate_1.mp4?1592000000"
        );
        assert_eq!(selection.fallback, vec![src("720p"), src("360p")]);

        assert_eq!(
            select_format(&sources(&["720p"]), FormatPreference::Original),
            FormatSelection::default()
        );
    }

    #[test]
    fn selection_dates_from_query() {
        let mut record = PostRecord::default();
        apply_selection(
            &mut record,
            select_format(&sources(&["360p"]), FormatPreference::MaxWidth(360)),
            "",
        );
        assert_eq!(record.url, src("360p"));
        assert_eq!(
            record.date.map(|d| d.to_string()).as_deref(),
            Some("2020-06-12 22:13:20")
        );

        let mut record = PostRecord::default();
        let page = r#"<meta itemprop="datePublished" content="2011-06-02T16:00:00-04:00">"#;
        apply_selection(&mut record, FormatSelection::default(), page);
        assert!(!record.has_url());
        assert_eq!(
            record.date.map(|d| d.to_string()).as_deref(),
            Some("2011-06-02 20:00:00")
        );
    }

    #[test]
    fn common_fields() {
        let page = concat!(
            "<div class=\"item-user\">\n<a href=\"https://tomfulp.newgrounds.com\"><img></div>\n",
            "<div class=\"art-images\">\n<img data-smartload-src=\"https://art.ngfiles.com/medium_views/1/1_a.webp\">\n</div>\n",
            "<div id=\"author_comments\">\n<p>Hello &amp; <b>welcome</b></p></div>\n",
            "<span id=\"faves_load\">1,234</span>\n",
            "<span id=\"score_number\">4.51</span>\n",
            "<dd class=\"tags\"><a href=\"/search/zelda\">zelda</a><a>link</a></dd>\n",
            "<div class=\"item-user\">\n<a href=\"https://wavetro.newgrounds.com\"><img></div>\n",
        );
        let mut cursor = TextCursor::new(page);
        let mut record = PostRecord::default();
        parse_common(&mut cursor, &mut record);

        assert!(record.images_markup.contains("medium_views/1/1_a.webp"));
        assert_eq!(record.comment, "Hello & welcome");
        assert_eq!(record.favorites, 1234);
        assert!((record.score - 4.51).abs() < f64::EPSILON);
        assert_eq!(record.tags, vec!["zelda", "link"]);
        assert_eq!(record.artist, vec!["tomfulp", "wavetro"]);
    }

    #[test]
    fn audio_page() {
        let page = concat!(
            "<meta property=\"og:title\" content=\"Sugar &amp; Spice\">\n",
            "<meta property=\"og:description\" content=\"Chiptune\">\n",
            "<meta property=\"og:type\" content=\"music.song\">\n",
            "<meta itemprop=\"datePublished\" content=\"2015-02-23T13:06:57-05:00\">\n",
            "embedController([{\"url\":\"https:\\/\\/audio.ngfiles.com\\/609000\\/609768_ZJ.mp3?f1424720017\",\"is_published\":true}]);\n",
        );
        let mut cursor = TextCursor::new(page);
        let record = parse_audio(&mut cursor, "https://www.newgrounds.com/audio/listen/609768");

        assert_eq!(record.index, 609768);
        assert_eq!(record.title, "Sugar & Spice");
        assert_eq!(record.content_type, "music.song");
        assert_eq!(record.url, "https://audio.ngfiles.com/609000/609768_ZJ.mp3?f1424720017");
        assert_eq!(record.rating, Rating::Unrated);
        assert_eq!(
            record.date.map(|d| d.to_string()).as_deref(),
            Some("2015-02-23 18:06:57")
        );
    }

    #[test]
    fn image_page_needs_full_markup() {
        let mut cursor = TextCursor::new("<meta property=\"og:title\" content=\"No image\">");
        assert!(parse_image(&mut cursor).is_err());
    }

    #[test]
    fn media_with_direct_source() {
        let page = concat!(
            "<meta property=\"og:title\" content=\"Dad &amp; Me\">\n",
            "<meta property=\"og:type\" content=\"video.movie\">\n",
            "<meta property=\"og:description\" content=\"\">\n",
            "player({\"url\":\"https:\\/\\/uploads.ungrounded.net\\/161000\\/161181_ddf.swf?123\",\"w\":550})\n",
            "<meta itemprop=\"datePublished\" content=\"2004-07-23T21:11:33-04:00\">\n",
            "<meta itemprop=\"description\" content=\"A classic\">\n",
            "<div class=\"rated-t\"></div>\n",
        );
        let mut cursor = TextCursor::new(page);
        let media = parse_media(&mut cursor, "https://www.newgrounds.com/portal/view/161181");

        assert!(!media.needs_sources);
        let record = media.record;
        assert_eq!(record.index, 161181);
        assert_eq!(record.title, "Dad & Me");
        assert_eq!(record.content_type, "video.movie");
        assert_eq!(
            record.url,
            "https://uploads.ungrounded.net/161000/161181_ddf.swf?123"
        );
        // "123" is a valid Unix timestamp, so the query wins over the meta tag
        assert_eq!(
            record.date.map(|d| d.to_string()).as_deref(),
            Some("1970-01-01 00:02:03")
        );
        assert_eq!(record.description, "A classic");
        assert_eq!(record.rating, Rating::Teen);
    }
}
