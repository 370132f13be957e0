#![allow(dead_code)]
use futures::StreamExt;
use ngdl_extractors::prelude::*;
use wiremock::MockServer;

/// Site pointing every endpoint at the mock server, with user subdomains mapped to `/~{user}`.
pub fn site_for(server: &MockServer) -> SiteConfig {
    SiteConfig {
        root: server.uri(),
        user_root: format!("{}/~{{user}}", server.uri()),
        request_interval: 0.0,
        ..SiteConfig::default()
    }
}

pub fn extractor(server: &MockServer, target: Target, options: ExtractorOptions) -> NewgroundsExtractor {
    NewgroundsExtractor::new(target, site_for(server), options).expect("Failed to build extractor")
}

pub async fn collect_items(extractor: &NewgroundsExtractor) -> Vec<Result<Message, ExtractorError>> {
    extractor.items().collect().await
}

pub async fn collect_posts(extractor: &NewgroundsExtractor) -> Vec<Result<String, ExtractorError>> {
    extractor.posts().collect().await
}

/// Markup of a favorites/gallery entry linking to `href`.
pub fn entry(href: &str) -> String {
    format!("<div class=\"item\"><a href=\"{href}\" class=\"item-link\"><img src=\"thumb.png\"></a></div>")
}
