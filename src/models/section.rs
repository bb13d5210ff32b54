//! Section data structures.

use serde::{Deserialize, Serialize};
use url::Url;

/// Well-known section categories.
///
/// The upstream site describes sections only by a freeform label; this makes
/// the recognizable ones computer-readable. Labels that match nothing map to
/// `Unknown` instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SectionKind {
    #[default]
    Unknown,
    Hot,
    Trending,
    Fresh,
    Funny,
    Nsfw,
    Wtf,
    Gif,
    Geeky,
    Meme,
    CuteAnimals,
    Comic,
    Cosplay,
    Food,
    Girl,
    Timely,
    Design,
}

impl SectionKind {
    /// Parse a freeform category label. Matching is case-insensitive with
    /// all whitespace stripped, so "Cute Animals" and "cuteanimals" are the
    /// same kind.
    pub fn parse_label(label: &str) -> Self {
        let normalized: String = label
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "hot" => Self::Hot,
            "trending" => Self::Trending,
            "fresh" => Self::Fresh,
            "funny" => Self::Funny,
            "nsfw" => Self::Nsfw,
            "wtf" => Self::Wtf,
            "gif" => Self::Gif,
            "geeky" => Self::Geeky,
            "meme" => Self::Meme,
            "cuteanimals" => Self::CuteAnimals,
            "comic" => Self::Comic,
            "cosplay" => Self::Cosplay,
            "food" => Self::Food,
            "girl" => Self::Girl,
            "timely" => Self::Timely,
            "design" => Self::Design,
            _ => Self::Unknown,
        }
    }
}

/// A content category on the upstream site.
///
/// Identity is the resolved absolute URL; repeated resolutions of the same
/// upstream category compare equal even when display data changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Display name, as the site labels it
    pub name: String,

    /// Short description (empty for layouts that do not expose one)
    #[serde(default)]
    pub description: String,

    /// Recognized category kind
    #[serde(default)]
    pub kind: SectionKind,

    /// Absolute URL of the section's listing page
    pub url: Url,

    /// Icon/cover image reference
    #[serde(default)]
    pub icon_url: Option<String>,

    /// Region code for geo-targeted sections (empty otherwise)
    #[serde(default)]
    pub region: String,

    /// Whether uploads into this section are allowed
    #[serde(default)]
    pub upload_enabled: bool,

    /// Whether the section is flagged as sensitive
    #[serde(default)]
    pub sensitive: bool,
}

impl PartialEq for Section {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for Section {}

/// Grouped result of a full section resolution.
#[derive(Debug, Default)]
pub struct SectionCatalog {
    /// The primary section list
    pub sections: Vec<Section>,

    /// Sections the site currently features
    pub featured: Vec<Section>,

    /// Region-specific sections
    pub local: Vec<Section>,

    /// The geo-targeted section for the caller's region, when reported
    pub current_local: Option<Section>,
}

impl SectionCatalog {
    /// Iterate every section in the catalog, primary list first.
    pub fn all(&self) -> impl Iterator<Item = &Section> {
        self.sections
            .iter()
            .chain(self.featured.iter())
            .chain(self.local.iter())
            .chain(self.current_local.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_label_case_and_whitespace() {
        assert_eq!(SectionKind::parse_label("Hot"), SectionKind::Hot);
        assert_eq!(SectionKind::parse_label("WTF"), SectionKind::Wtf);
        assert_eq!(
            SectionKind::parse_label("Cute Animals"),
            SectionKind::CuteAnimals
        );
        assert_eq!(SectionKind::parse_label(" fresh "), SectionKind::Fresh);
    }

    #[test]
    fn test_parse_label_unknown_fallback() {
        assert_eq!(SectionKind::parse_label("Savage"), SectionKind::Unknown);
        assert_eq!(SectionKind::parse_label(""), SectionKind::Unknown);
    }

    #[test]
    fn test_section_equality_is_by_url() {
        let a = Section {
            name: "Funny".into(),
            description: String::new(),
            kind: SectionKind::Funny,
            url: Url::parse("https://example.com/funny").unwrap(),
            icon_url: None,
            region: String::new(),
            upload_enabled: false,
            sensitive: false,
        };
        let mut b = a.clone();
        b.name = "Renamed".into();
        assert_eq!(a, b);

        b.url = Url::parse("https://example.com/other").unwrap();
        assert_ne!(a, b);
    }
}
