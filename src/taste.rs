//! Aggregate a user's library of extracted designs into a taste profile.

use indexmap::IndexMap;
use palette::{Hsv, IntoColor};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::{parse_hex, round_div};
use crate::dna::DesignDna;
use crate::error::{DnaError, Result};

const TOP_STYLE_TAGS: usize = 10;
const TOP_TYPOGRAPHY: usize = 6;
/// Red/blue channel gap that makes a color read as warm or cool.
const TEMPERATURE_GAP: i16 = 20;
const SATURATED_ABOVE: f32 = 0.4;
/// Mean channel value above which a color counts as light.
const LIGHT_ABOVE: u16 = 160;

/// A completed design and when it was saved (`YYYY-MM-...`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DatedDesign {
    pub created_at: String,
    #[serde(alias = "extraction", alias = "extraction_data")]
    pub dna: DesignDna,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagShare {
    pub tag: String,
    pub count: u64,
    pub percentage: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeShare {
    #[serde(rename = "type")]
    pub design_type: String,
    pub count: u64,
    pub percentage: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypographyPreference {
    pub classification: String,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTendency {
    pub category: String,
    pub percentage: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyStyle {
    pub month: String,
    pub dominant_style: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TasteProfile {
    pub style_distribution: Vec<TagShare>,
    pub color_tendencies: Vec<ColorTendency>,
    pub typography_preferences: Vec<TypographyPreference>,
    pub design_type_mix: Vec<TypeShare>,
    pub taste_evolution: Vec<MonthlyStyle>,
    pub total_saves: usize,
}

fn percent(count: u64, total: u64) -> u32 {
    round_div(count * 100, total.max(1)) as u32
}

fn tally(counts: &mut IndexMap<String, u64>, key: &str) {
    *counts.entry(key.to_string()).or_insert(0) += 1;
}

/// Highest counts first; equal counts keep first-seen order.
fn ranked(counts: IndexMap<String, u64>) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}

pub fn build_profile(designs: &[DatedDesign]) -> Result<TasteProfile> {
    if designs.is_empty() {
        return Err(DnaError::InvalidParameter(
            "a taste profile needs at least one completed design".into(),
        ));
    }
    let total = designs.len() as u64;

    let mut tags = IndexMap::new();
    let mut types = IndexMap::new();
    let mut classes = IndexMap::new();
    let mut months: IndexMap<String, IndexMap<String, u64>> = IndexMap::new();
    let mut hexes: Vec<&str> = Vec::new();

    for DatedDesign { created_at, dna } in designs {
        for tag in dna.mood_tags.iter().chain(&dna.style_tags) {
            tally(&mut tags, tag);
        }
        if let Some(kind) = dna.design_type.as_deref().filter(|k| !k.is_empty()) {
            tally(&mut types, kind);
        }
        for font in &dna.fonts {
            let class = font
                .classification
                .as_deref()
                .or(font.category.as_deref())
                .unwrap_or("unknown");
            tally(&mut classes, class);
        }
        hexes.extend(dna.colors.iter().map(|c| c.hex.as_str()));

        let month: String = created_at.chars().take(7).collect();
        let moods = months.entry(month).or_default();
        for tag in &dna.mood_tags {
            tally(moods, tag);
        }
    }
    debug!(
        designs = total,
        tags = tags.len(),
        colors = hexes.len(),
        "aggregating taste profile"
    );

    let style_distribution = ranked(tags)
        .into_iter()
        .take(TOP_STYLE_TAGS)
        .map(|(tag, count)| TagShare {
            tag,
            count,
            percentage: percent(count, total),
        })
        .collect();

    let design_type_mix = ranked(types)
        .into_iter()
        .map(|(design_type, count)| TypeShare {
            design_type,
            count,
            percentage: percent(count, total),
        })
        .collect();

    let typography_preferences = ranked(classes)
        .into_iter()
        .take(TOP_TYPOGRAPHY)
        .map(|(classification, count)| TypographyPreference {
            classification,
            count,
        })
        .collect();

    let taste_evolution = months
        .into_iter()
        .map(|(month, moods)| MonthlyStyle {
            month,
            dominant_style: ranked(moods)
                .into_iter()
                .next()
                .map(|(tag, _)| tag)
                .unwrap_or_else(|| "varied".to_string()),
        })
        .collect();

    Ok(TasteProfile {
        style_distribution,
        color_tendencies: color_tendencies(hexes),
        typography_preferences,
        design_type_mix,
        taste_evolution,
        total_saves: designs.len(),
    })
}

/// Share of colors that are warm/cool/neutral, saturated/muted and
/// light/dark. Unparseable hex values are ignored.
pub fn color_tendencies<I, S>(hexes: I) -> Vec<ColorTendency>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let (mut warm, mut cool, mut neutral) = (0u64, 0u64, 0u64);
    let (mut saturated, mut muted) = (0u64, 0u64);
    let (mut light, mut dark) = (0u64, 0u64);
    let mut total = 0u64;

    for color in hexes.into_iter().filter_map(|h| parse_hex(h.as_ref())) {
        total += 1;
        let (r, b) = (color.red as i16, color.blue as i16);
        if r > b + TEMPERATURE_GAP {
            warm += 1;
        } else if b > r + TEMPERATURE_GAP {
            cool += 1;
        } else {
            neutral += 1;
        }

        let hsv: Hsv = color.into_format::<f32>().into_color();
        if hsv.saturation > SATURATED_ABOVE {
            saturated += 1;
        } else {
            muted += 1;
        }

        let sum = color.red as u16 + color.green as u16 + color.blue as u16;
        if sum > LIGHT_ABOVE * 3 {
            light += 1;
        } else {
            dark += 1;
        }
    }

    [
        ("Warm tones", warm),
        ("Cool tones", cool),
        ("Neutral", neutral),
        ("Saturated", saturated),
        ("Muted", muted),
        ("Light", light),
        ("Dark", dark),
    ]
    .into_iter()
    .map(|(category, count)| ColorTendency {
        category: category.to_string(),
        percentage: percent(count, total),
    })
    .collect()
}
