use clap::Parser;
use ngdl_extractors::extractor_config::{ExtractorOptions, FormatPreference, UserKinds};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "Newgrounds Downloader", author, version, about, long_about = None)]
pub struct Cli {
    /// Post, gallery, favorites, following or search URLs to resolve
    #[clap(value_name = "URL", required = true)]
    pub urls: Vec<String>,

    /// Read options from this file instead of the default `config.toml`
    #[clap(short, long, value_name = "PATH", help_heading = "GENERAL")]
    pub config: Option<PathBuf>,

    /// Video format: `original`, or a maximum width such as `720p`
    #[clap(short, long, value_name = "FORMAT", help_heading = "EXTRACTION")]
    pub format: Option<String>,

    /// Request the regular page of movies instead of their flash variant
    #[clap(long, action, help_heading = "EXTRACTION")]
    pub no_flash: bool,

    /// Galleries a profile URL expands into: `all` or a list like `art,movies`
    #[clap(short, long, value_name = "KINDS", help_heading = "EXTRACTION")]
    pub include: Option<String>,

    /// Account to log in with
    #[clap(short, long, help_heading = "AUTH")]
    pub username: Option<String>,

    /// Password of the account
    #[clap(short, long, help_heading = "AUTH")]
    pub password: Option<String>,

    /// Do not read or write the login cache
    #[clap(long, action, help_heading = "AUTH")]
    pub no_cache: bool,
}

impl Cli {
    /// Applies command line overrides on top of the options read from the config file.
    pub fn apply(&self, mut options: ExtractorOptions) -> ExtractorOptions {
        if let Some(format) = &self.format {
            options.format = FormatPreference::from_name(format);
        }
        if self.no_flash {
            options.flash = false;
        }
        if let Some(include) = &self.include {
            options.include = UserKinds::from_names([include]);
        }
        if self.username.is_some() {
            options.username.clone_from(&self.username);
        }
        if self.username.is_some() || self.password.is_some() {
            options.password.clone_from(&self.password);
        }
        options
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn overrides_config_values() {
        let args = Cli::parse_from([
            "newgrounds_downloader",
            "--format",
            "720p",
            "--no-flash",
            "--include",
            "art,movies",
            "-u",
            "tomfulp",
            "-p",
            "hunter2",
            "https://tomfulp.newgrounds.com",
        ]);
        let options = args.apply(ExtractorOptions::default());

        assert_eq!(options.format, FormatPreference::MaxWidth(720));
        assert!(!options.flash);
        assert_eq!(options.include, UserKinds::ART | UserKinds::MOVIES);
        assert_eq!(options.username.as_deref(), Some("tomfulp"));
        assert_eq!(options.password.as_deref(), Some("hunter2"));
        assert_eq!(args.urls, vec!["https://tomfulp.newgrounds.com"]);
    }

    #[test]
    fn keeps_config_without_flags() {
        let args = Cli::parse_from(["newgrounds_downloader", "https://www.newgrounds.com/portal/view/1"]);
        let config = ExtractorOptions {
            format: FormatPreference::MaxWidth(480),
            username: Some("from_config".into()),
            ..ExtractorOptions::default()
        };
        assert_eq!(args.apply(config.clone()), config);
    }

    #[test]
    fn password_alone_keeps_config_username() {
        let args = Cli::parse_from([
            "newgrounds_downloader",
            "--password",
            "hunter2",
            "https://www.newgrounds.com/portal/view/1",
        ]);
        let config = ExtractorOptions {
            username: Some("from_config".into()),
            password: Some("stale".into()),
            ..ExtractorOptions::default()
        };
        let options = args.apply(config);
        assert_eq!(options.username.as_deref(), Some("from_config"));
        assert_eq!(options.password.as_deref(), Some("hunter2"));
    }
}
