//! Files embedded in a post besides its primary one.
//!
//! Multi-image art posts and author comments reference extra images through lazy
//! loading attributes. Each one becomes its own [`FileItem`], numbered from 1.
use ngdl_common::post::extension::Extension;
use ngdl_common::post::{FileItem, PostRecord};
use ngdl_common::text;

const SMARTLOAD_SRC: &str = "data-smartload-src=\"";

/// Items for every embedded image of `post`, in document order.
///
/// `primary_extension` is the extension of the post's primary file; it stands in for
/// the real extension of full size images only linked through a `.webp` preview.
pub fn embedded_files(post: &PostRecord, primary_extension: &str) -> Vec<FileItem> {
    let markup = post.embedded_markup();
    text::extract_iter(&markup, SMARTLOAD_SRC, "\"")
        .zip(1..)
        .map(|(src, num)| embedded_file(post, primary_extension, src, num))
        .collect()
}

fn embedded_file(post: &PostRecord, primary_extension: &str, src: &str, num: u32) -> FileItem {
    let mut url = text::ensure_http_scheme(src).into_owned();
    let mut file = post.clone();
    file.num = num;
    file.display_index = format!("{}_{:0>2}", post.index, num);
    file.fallback.clear();

    let (filename, extension) = text::nameext_from_url(&url);
    file.filename = filename;
    file.extension = extension;

    // Comment images are served as uploaded
    if !url.contains("/comments/") {
        url = url.replacen("/medium_views/", "/images/", 1);
        if Extension::guess_format(&file.extension).is_web_preview() {
            file.fallback = vec![url.clone()];
            file.extension = primary_extension.to_string();
            url = url.replace(".webp", &format!(".{primary_extension}"));
        }
    }

    FileItem { url, post: file }
}

#[cfg(test)]
mod test {
    use super::*;

    fn post(images: &str, comment: &str) -> PostRecord {
        PostRecord {
            index: 1915875,
            display_index: "1915875".into(),
            url: "https://art.ngfiles.com/images/1915000/1915875_zedrinbot_nazrin-tanlines.png".into(),
            images_markup: images.into(),
            comment_markup: comment.into(),
            ..PostRecord::default()
        }
    }

    #[test]
    fn webp_previews_point_at_full_images() {
        let post = post(
            concat!(
                r#"<img data-smartload-src="https://art.ngfiles.com/medium_views/1915000/1915875_4c3eabd8e1_zedrinbot_nazrin-tanlines.webp">"#,
                r#"<img data-smartload-src="//art.ngfiles.com/images/1915000/1915875_c1e1fe4d4b_zedrinbot_nazrin-tanlines.jpg">"#,
            ),
            "",
        );
        let files = embedded_files(&post, "png");
        assert_eq!(files.len(), 2);

        let first = &files[0];
        assert_eq!(
            first.url,
            "https://art.ngfiles.com/images/1915000/1915875_4c3eabd8e1_zedrinbot_nazrin-tanlines.png"
        );
        assert_eq!(
            first.post.fallback,
            vec!["https://art.ngfiles.com/images/1915000/1915875_4c3eabd8e1_zedrinbot_nazrin-tanlines.webp"]
        );
        assert_eq!(first.post.extension, "png");
        assert_eq!(first.post.num, 1);
        assert_eq!(first.post.display_index, "1915875_01");

        let second = &files[1];
        assert_eq!(
            second.url,
            "https://art.ngfiles.com/images/1915000/1915875_c1e1fe4d4b_zedrinbot_nazrin-tanlines.jpg"
        );
        assert_eq!(second.post.extension, "jpg");
        assert!(second.post.fallback.is_empty());
        assert_eq!(second.post.display_index, "1915875_02");
    }

    #[test]
    fn comment_images_are_untouched() {
        let post = post(
            "",
            r#"<p>wip:</p><img data-smartload-src="https://art.ngfiles.com/comments/57000/iu_57615_7115981.webp">"#,
        );
        let files = embedded_files(&post, "png");
        assert_eq!(files.len(), 1);
        assert_eq!(
            files[0].url,
            "https://art.ngfiles.com/comments/57000/iu_57615_7115981.webp"
        );
        assert_eq!(files[0].post.extension, "webp");
        assert_eq!(files[0].file_name(), "iu_57615_7115981.webp");
    }

    #[test]
    fn no_embedded_images() {
        assert!(embedded_files(&post("<p>nothing</p>", "plain text"), "png").is_empty());
    }
}
