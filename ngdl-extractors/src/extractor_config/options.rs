use bitflags::bitflags;
use ngdl_common::serde::{self, Deserialize, Deserializer};
use ngdl_common::text::parse_int;

/// Which video rendition to download for movies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(crate = "self::serde", from = "RawFormat")]
pub enum FormatPreference {
    /// The source file behind the always-present 360p rendition.
    #[default]
    Original,
    /// The widest rendition whose width does not exceed this value.
    MaxWidth(u64),
}

#[derive(Deserialize)]
#[serde(crate = "self::serde", untagged)]
enum RawFormat {
    Width(u64),
    Name(String),
}

impl From<RawFormat> for FormatPreference {
    fn from(raw: RawFormat) -> Self {
        match raw {
            RawFormat::Width(width) => Self::MaxWidth(width),
            RawFormat::Name(name) => Self::from_name(&name),
        }
    }
}

impl FormatPreference {
    /// `""` and `"original"` select the original; `"720p"` or `"720"` select a width.
    /// Anything else ends up as width `0`, which matches no rendition.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        if name.is_empty() || name == "original" {
            Self::Original
        } else {
            Self::MaxWidth(parse_int(name.trim_end_matches('p')))
        }
    }
}

bitflags! {
    /// Gallery kinds a user profile expands into.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UserKinds: u8 {
        const ART = 0b0000_0001;
        const AUDIO = 0b0000_0010;
        const GAMES = 0b0000_0100;
        const MOVIES = 0b0000_1000;
    }
}

impl Default for UserKinds {
    fn default() -> Self {
        Self::ART
    }
}

impl UserKinds {
    const ORDER: [(Self, &'static str); 4] = [
        (Self::ART, "art"),
        (Self::AUDIO, "audio"),
        (Self::GAMES, "games"),
        (Self::MOVIES, "movies"),
    ];

    /// Parses `"all"` or a comma separated list such as `"art,movies"`.
    ///
    /// Unknown names are ignored; an empty result falls back to the default.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut kinds = Self::empty();
        for name in names {
            for part in name.as_ref().split(',') {
                kinds |= match part.trim() {
                    "all" => Self::all(),
                    "art" => Self::ART,
                    "audio" => Self::AUDIO,
                    "games" => Self::GAMES,
                    "movies" => Self::MOVIES,
                    _ => Self::empty(),
                };
            }
        }
        if kinds.is_empty() {
            Self::default()
        } else {
            kinds
        }
    }

    /// Gallery path segments of the selected kinds, in dispatch order.
    pub fn paths(self) -> Vec<&'static str> {
        Self::ORDER
            .iter()
            .filter(|(kind, _)| self.contains(*kind))
            .map(|(_, path)| *path)
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(crate = "self::serde", untagged)]
enum RawInclude {
    One(String),
    Many(Vec<String>),
}

fn deserialize_include<'de, D>(deserializer: D) -> Result<UserKinds, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawInclude::deserialize(deserializer)? {
        RawInclude::One(name) => UserKinds::from_names([name]),
        RawInclude::Many(names) => UserKinds::from_names(names),
    })
}

/// User options consumed by the extractors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(crate = "self::serde", default)]
pub struct ExtractorOptions {
    /// Request the flash variant of movie pages (`/format/flash`).
    pub flash: bool,
    pub format: FormatPreference,
    /// Galleries a bare user profile URL expands into.
    #[serde(deserialize_with = "deserialize_include")]
    pub include: UserKinds,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            flash: true,
            format: FormatPreference::Original,
            include: UserKinds::default(),
            username: None,
            password: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn format_names() {
        assert_eq!(FormatPreference::from_name("original"), FormatPreference::Original);
        assert_eq!(FormatPreference::from_name(""), FormatPreference::Original);
        assert_eq!(FormatPreference::from_name("720p"), FormatPreference::MaxWidth(720));
        assert_eq!(FormatPreference::from_name("480"), FormatPreference::MaxWidth(480));
        assert_eq!(FormatPreference::from_name("best"), FormatPreference::MaxWidth(0));
    }

    #[test]
    fn include_names() {
        assert_eq!(UserKinds::from_names(["all"]), UserKinds::all());
        assert_eq!(UserKinds::from_names(["bogus"]), UserKinds::ART);
        assert_eq!(
            UserKinds::from_names(["movies,art"]).paths(),
            vec!["art", "movies"]
        );
        assert_eq!(
            UserKinds::all().paths(),
            vec!["art", "audio", "games", "movies"]
        );
    }
}
