use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cluster::{ClusterColor, DEFAULT_TOP_K, cluster_colors};
use crate::dna::{DesignDna, strip_fences};
use crate::error::{DnaError, Result};
use crate::fonts::stylesheet_url;

pub const MIN_DESIGNS: usize = 3;
pub const MAX_DESIGNS: usize = 10;

const HEADING_WEIGHTS: &str = "400;500;600;700";
const BODY_WEIGHTS: &str = "300;400;500;600";

/// Deterministic evidence gathered from a selection of designs before a
/// style guide is written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleGuideInput {
    pub design_count: usize,
    /// Consensus palette across every selected design, most common first.
    pub color_clusters: Vec<ClusterColor>,
}

impl StyleGuideInput {
    pub fn from_designs(designs: &[DesignDna]) -> Result<Self> {
        if !(MIN_DESIGNS..=MAX_DESIGNS).contains(&designs.len()) {
            return Err(DnaError::InvalidParameter(format!(
                "style guides need {MIN_DESIGNS}-{MAX_DESIGNS} designs, got {}",
                designs.len()
            )));
        }

        let hexes = designs
            .iter()
            .flat_map(|d| d.colors.iter())
            .map(|c| Some(c.hex.as_str()));
        let color_clusters = cluster_colors(hexes, DEFAULT_TOP_K)?;
        debug!(
            designs = designs.len(),
            clusters = color_clusters.len(),
            "collected style guide evidence"
        );

        Ok(Self {
            design_count: designs.len(),
            color_clusters,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteEntry {
    pub hex: String,
    pub name: String,
    pub usage: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontPairing {
    pub heading: String,
    pub body: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_url: Option<String>,
}

impl FontPairing {
    pub fn new(heading: impl Into<String>, body: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut pairing = FontPairing {
            heading: heading.into(),
            body: body.into(),
            reason: reason.into(),
            ..Default::default()
        };
        pairing.link_stylesheets();
        pairing
    }

    pub fn link_stylesheets(&mut self) {
        self.heading_url = Some(stylesheet_url(&self.heading, HEADING_WEIGHTS));
        self.body_url = Some(stylesheet_url(&self.body, BODY_WEIGHTS));
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleComponent {
    pub name: String,
    pub description: String,
}

/// A synthesized style guide as returned by the text model.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleGuideData {
    pub color_palette: Vec<PaletteEntry>,
    pub font_pairings: Vec<FontPairing>,
    pub spacing_scale: Vec<u32>,
    pub design_principles: Vec<String>,
    pub dos: Vec<String>,
    pub donts: Vec<String>,
    pub sample_components: Vec<SampleComponent>,
}

/// Parse a generated guide and attach stylesheet URLs to every pairing.
pub fn parse_style_guide(text: &str) -> Result<StyleGuideData> {
    let mut guide: StyleGuideData = serde_json::from_str(&strip_fences(text))?;
    for pairing in &mut guide.font_pairings {
        pairing.link_stylesheets();
    }
    Ok(guide)
}
