use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

/// Classification used when nothing in the table matches.
pub const FALLBACK_CLASSIFICATION: &str = "geometric sans-serif";

const CSS_ENDPOINT: &str = "https://fonts.googleapis.com/css2";
const SPECIMEN_ENDPOINT: &str = "https://fonts.google.com/specimen/";

/// A curated face in the classification table.
#[derive(Clone, Copy, Debug)]
struct Face {
    name: &'static str,
    /// `None` for single-weight families.
    weights: Option<&'static str>,
    hosted: bool,
}

const fn face(name: &'static str) -> Face {
    Face { name, weights: Some("400;700"), hosted: true }
}

const fn single(name: &'static str) -> Face {
    Face { name, weights: None, hosted: true }
}

const fn local(name: &'static str) -> Face {
    Face { name, weights: None, hosted: false }
}

static FONT_TABLE: &[(&str, &[Face])] = &[
    (
        "geometric sans-serif",
        &[
            face("Inter"),
            face("DM Sans"),
            face("Outfit"),
            face("Plus Jakarta Sans"),
            face("Figtree"),
            face("Poppins"),
            face("Nunito Sans"),
            face("Albert Sans"),
        ],
    ),
    (
        "grotesque sans-serif",
        &[
            face("Space Grotesk"),
            face("Manrope"),
            face("Sora"),
            face("General Sans"),
            face("Satoshi"),
            face("Geist"),
        ],
    ),
    (
        "humanist sans-serif",
        &[
            face("Open Sans"),
            face("Source Sans 3"),
            face("Lato"),
            face("Noto Sans"),
            face("Cabin"),
        ],
    ),
    (
        "neo-grotesque sans-serif",
        &[
            face("Roboto"),
            local("Helvetica Neue"),
            face("IBM Plex Sans"),
            face("Work Sans"),
        ],
    ),
    (
        "condensed sans-serif",
        &[
            face("Barlow Condensed"),
            face("Oswald"),
            single("Fjalla One"),
            single("Bebas Neue"),
        ],
    ),
    (
        "modern serif",
        &[
            face("Playfair Display"),
            single("DM Serif Display"),
            face("Cormorant Garamond"),
            face("Fraunces"),
        ],
    ),
    (
        "transitional serif",
        &[
            face("Libre Baskerville"),
            face("Lora"),
            face("Merriweather"),
            face("Source Serif 4"),
        ],
    ),
    (
        "slab serif",
        &[face("Roboto Slab"), face("Zilla Slab"), face("Bitter")],
    ),
    (
        "display",
        &[
            single("Righteous"),
            face("Fredoka"),
            face("Unbounded"),
            face("Space Mono"),
        ],
    ),
    (
        "monospace",
        &[
            face("JetBrains Mono"),
            face("Fira Code"),
            face("Source Code Pro"),
            face("IBM Plex Mono"),
        ],
    ),
    (
        "handwriting",
        &[face("Caveat"), face("Kalam"), single("Patrick Hand")],
    ),
];

/// A font offered for visual comparison against a classified text style.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontCandidate {
    pub name: String,
    /// Stylesheet URL; empty for fonts that are not hosted.
    pub url: String,
    #[serde(rename = "googleFontsUrl")]
    pub google_fonts_url: String,
}

impl From<&Face> for FontCandidate {
    fn from(face: &Face) -> Self {
        if !face.hosted {
            return FontCandidate {
                name: face.name.to_string(),
                url: String::new(),
                google_fonts_url: String::new(),
            };
        }
        let family = face.name.replace(' ', "+");
        let url = match face.weights {
            Some(w) => format!("{CSS_ENDPOINT}?family={family}:wght@{w}&display=swap"),
            None => format!("{CSS_ENDPOINT}?family={family}&display=swap"),
        };
        FontCandidate {
            name: face.name.to_string(),
            url,
            google_fonts_url: format!("{SPECIMEN_ENDPOINT}{family}"),
        }
    }
}

/// Every classification known to the table, in lookup order.
pub fn classifications() -> impl Iterator<Item = &'static str> {
    FONT_TABLE.iter().map(|(key, _)| *key)
}

/// Resolve a free-form classification to the table key it best matches.
///
/// Exact (case-insensitive) matches win. Otherwise each key scores one point
/// per word (split on whitespace and `-`) found inside the input; the first
/// highest scorer wins and a zero score falls back to
/// [`FALLBACK_CLASSIFICATION`].
pub fn match_classification(classification: &str) -> &'static str {
    let lower = classification.trim().to_lowercase();
    if let Some((key, _)) = FONT_TABLE.iter().find(|(key, _)| *key == lower) {
        return *key;
    }

    let mut best = FALLBACK_CLASSIFICATION;
    let mut best_score = 0usize;
    for (key, _) in FONT_TABLE {
        let score = key
            .split(|c: char| c.is_whitespace() || c == '-')
            .filter(|w| !w.is_empty() && lower.contains(w))
            .count();
        if score > best_score {
            best_score = score;
            best = *key;
        }
    }
    best
}

/// Candidate fonts for a classification reported by the vision model.
pub fn candidate_fonts(classification: &str) -> Vec<FontCandidate> {
    let key = match_classification(classification);
    FONT_TABLE
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, faces)| faces.iter().map(FontCandidate::from).collect())
        .unwrap_or_default()
}

/// Stylesheet URL for an arbitrary family, e.g. one named in a generated
/// font pairing. `weights` is a `;` separated list such as `400;700`.
pub fn stylesheet_url(family: &str, weights: &str) -> String {
    format!(
        "{CSS_ENDPOINT}?family={}:wght@{weights}&display=swap",
        utf8_percent_encode(family, COMPONENT)
    )
}

/// Everything outside the URI component unreserved set gets percent-encoded.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');
