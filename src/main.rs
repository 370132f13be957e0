#![deny(clippy::all)]
use anyhow::Result;
use clap::Parser;
use futures::StreamExt;
use log::{debug, error, info, warn};
use ngdl_extractors::auth::{FileLoginCache, LoginCache};
use ngdl_extractors::extractor_config::serialize::{default_options_path, read_options_file};
use ngdl_extractors::extractor_config::SiteConfig;
use ngdl_extractors::{Extractor, Message, NewgroundsExtractor, Target};
use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;

use crate::cli::Cli;

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    env_logger::builder().format_timestamp(None).init();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => default_options_path()?,
    };
    let options = args.apply(read_options_file(&config_path)?);
    let site = SiteConfig::default();

    let login_cache: Option<Arc<dyn LoginCache>> = if args.no_cache {
        None
    } else {
        match FileLoginCache::in_cache_dir(&site.name) {
            Ok(cache) => Some(Arc::new(cache)),
            Err(err) => {
                warn!("Login cache unavailable: {err}");
                None
            }
        }
    };

    let mut queue = VecDeque::with_capacity(args.urls.len());
    for url in &args.urls {
        queue.push_back(Target::from_url(url)?);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut files = 0_u64;

    while let Some(target) = queue.pop_front() {
        let mut extractor = NewgroundsExtractor::new(target, site.clone(), options.clone())?;
        if let Some(cache) = &login_cache {
            extractor = extractor.with_login_cache(cache.clone());
        }

        let mut items = extractor.items();
        while let Some(item) = items.next().await {
            match item {
                Ok(Message::Directory(post)) => debug!("{post:?}"),
                Ok(Message::Url(file)) => {
                    writeln!(out, "{}", serde_json::to_string(&file)?)?;
                    files += 1;
                }
                Ok(Message::Queue { url, target }) => {
                    debug!("Queueing {url}");
                    queue.push_back(target);
                }
                Err(err) => {
                    error!("{} extraction stopped: {err}", extractor.subcategory());
                    break;
                }
            }
        }
    }

    out.flush()?;
    info!("Resolved {files} files");
    Ok(())
}
