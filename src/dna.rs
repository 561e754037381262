//! Design DNA records: the pixel palette combined with the vision model's
//! typography and mood classification.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::parse_hex;
use crate::error::Result;
use crate::extract::ExtractedColor;
use crate::fonts::{FALLBACK_CLASSIFICATION, FontCandidate, candidate_fonts};
use crate::roles::{ColorRole, DesignColor, assign_roles};

pub const EXTRACTION_VERSION: &str = "2.0";

const PIXEL_COLOR_CONFIDENCE: f32 = 0.95;
const MOOD_CONFIDENCE: f32 = 0.8;
const OVERALL_CONFIDENCE: f32 = 0.85;

/// A distinct text style seen in the design.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignFont {
    pub classification: Option<String>,
    /// Older records carry a coarse category instead of a classification.
    pub category: Option<String>,
    pub traits: Option<String>,
    pub weight: Option<String>,
    pub usage: Option<String>,
    pub sample_text: Option<String>,
    pub confidence: Option<f32>,
    pub candidates: Vec<FontCandidate>,
}

/// What the vision model reports for one image. Every field may be absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelClassification {
    pub design_type: Option<String>,
    pub description: Option<String>,
    pub fonts: Vec<DesignFont>,
    pub mood_tags: Vec<String>,
    pub style_tags: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    pub colors: f32,
    pub fonts: f32,
    pub mood: f32,
    pub overall: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignDna {
    pub extraction_version: String,
    pub design_type: Option<String>,
    pub description: Option<String>,
    pub colors: Vec<DesignColor>,
    pub fonts: Vec<DesignFont>,
    pub mood_tags: Vec<String>,
    pub style_tags: Vec<String>,
    pub confidence: Option<Confidence>,
}

/// Denormalized palette row, one per color.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorRow {
    pub hex: String,
    pub rgb_r: u8,
    pub rgb_g: u8,
    pub rgb_b: u8,
    pub role: ColorRole,
    pub prominence: f32,
    pub position: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Mood,
    Style,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRow {
    pub tag: String,
    pub tag_type: TagKind,
}

/// Drop Markdown code fences the model sometimes wraps JSON in.
pub(crate) fn strip_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse the model's reply, tolerating Markdown code fences around the JSON.
pub fn parse_model_response(text: &str) -> Result<ModelClassification> {
    let parsed: ModelClassification = serde_json::from_str(&strip_fences(text))?;
    debug!(
        fonts = parsed.fonts.len(),
        mood_tags = parsed.mood_tags.len(),
        style_tags = parsed.style_tags.len(),
        "parsed model classification"
    );
    Ok(parsed)
}

impl DesignDna {
    /// Combine the pixel palette with the model's classification. Colors are
    /// taken only from pixels; fonts gain candidate faces from the table.
    pub fn assemble(pixel_colors: &[ExtractedColor], classification: ModelClassification) -> Self {
        let fonts: Vec<DesignFont> = classification
            .fonts
            .into_iter()
            .map(|mut font| {
                let class = font.classification.as_deref().unwrap_or(FALLBACK_CLASSIFICATION);
                font.candidates = candidate_fonts(class);
                font
            })
            .collect();

        let font_confidence = fonts
            .iter()
            .filter_map(|f| f.confidence)
            .fold(0.0_f32, f32::max);

        DesignDna {
            extraction_version: EXTRACTION_VERSION.to_string(),
            design_type: classification.design_type,
            description: classification.description,
            colors: assign_roles(pixel_colors),
            fonts,
            mood_tags: classification.mood_tags,
            style_tags: classification.style_tags,
            confidence: Some(Confidence {
                colors: PIXEL_COLOR_CONFIDENCE,
                fonts: font_confidence,
                mood: MOOD_CONFIDENCE,
                overall: OVERALL_CONFIDENCE,
            }),
        }
    }

    pub fn color_rows(&self) -> Vec<ColorRow> {
        self.colors
            .iter()
            .enumerate()
            .filter_map(|(position, c)| {
                let rgb = parse_hex(&c.hex)?;
                Some(ColorRow {
                    hex: c.hex.clone(),
                    rgb_r: rgb.red,
                    rgb_g: rgb.green,
                    rgb_b: rgb.blue,
                    role: c.role,
                    prominence: c.prominence,
                    position,
                })
            })
            .collect()
    }

    /// Mood tags first, then style tags.
    pub fn tag_rows(&self) -> Vec<TagRow> {
        let mood = self.mood_tags.iter().map(|t| TagRow {
            tag: t.clone(),
            tag_type: TagKind::Mood,
        });
        let style = self.style_tags.iter().map(|t| TagRow {
            tag: t.clone(),
            tag_type: TagKind::Style,
        });
        mood.chain(style).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DnaError;
    use crate::extract::RgbValue;

    const REPLY: &str = r#"```json
{
  "design_type": "website",
  "description": "A calm landing page",
  "fonts": [
    { "classification": "Geometric Sans-Serif", "weight": "700", "usage": "headings", "confidence": 0.7 },
    { "weight": "400", "usage": "body", "sample_text": "Welcome" }
  ],
  "mood_tags": ["minimal", "warm"],
  "style_tags": ["flat"]
}
```"#;

    fn palette() -> Vec<ExtractedColor> {
        vec![
            ExtractedColor {
                hex: "#f8f8f8".into(),
                rgb: RgbValue { r: 248, g: 248, b: 248 },
                percentage: 60,
            },
            ExtractedColor {
                hex: "#1068f8".into(),
                rgb: RgbValue { r: 16, g: 104, b: 248 },
                percentage: 30,
            },
        ]
    }

    #[test]
    fn parses_fenced_reply() {
        let parsed = parse_model_response(REPLY).unwrap();
        assert_eq!(parsed.design_type.as_deref(), Some("website"));
        assert_eq!(parsed.fonts.len(), 2);
        assert_eq!(parsed.mood_tags, vec!["minimal", "warm"]);
    }

    #[test]
    fn missing_fields_default() {
        let parsed = parse_model_response("{}").unwrap();
        assert_eq!(parsed, ModelClassification::default());
    }

    #[test]
    fn garbage_reply_is_an_error() {
        assert!(matches!(
            parse_model_response("Sorry, I can't help with that."),
            Err(DnaError::ModelResponse(_))
        ));
    }

    #[test]
    fn assemble_fills_candidates_and_confidence() {
        let dna = DesignDna::assemble(&palette(), parse_model_response(REPLY).unwrap());
        assert_eq!(dna.extraction_version, "2.0");
        assert_eq!(dna.colors[0].role, ColorRole::Background);
        assert_eq!(dna.colors[1].role, ColorRole::Primary);
        assert_eq!(dna.fonts[0].candidates[0].name, "Inter");
        // No classification falls back to the geometric table.
        assert_eq!(dna.fonts[1].candidates.len(), 8);

        let confidence = dna.confidence.unwrap();
        assert!((confidence.fonts - 0.7).abs() < 1e-6);
        assert!((confidence.colors - 0.95).abs() < 1e-6);
    }

    #[test]
    fn font_confidence_defaults_to_zero() {
        let dna = DesignDna::assemble(&palette(), ModelClassification::default());
        assert_eq!(dna.confidence.unwrap().fonts, 0.0);
        assert!(dna.fonts.is_empty());
    }

    #[test]
    fn rows_are_denormalized_in_order() {
        let dna = DesignDna::assemble(&palette(), parse_model_response(REPLY).unwrap());
        let colors = dna.color_rows();
        assert_eq!(colors.len(), 2);
        assert_eq!((colors[1].rgb_r, colors[1].rgb_g, colors[1].rgb_b), (16, 104, 248));
        assert_eq!(colors[1].position, 1);

        let tags = dna.tag_rows();
        let kinds: Vec<TagKind> = tags.iter().map(|t| t.tag_type).collect();
        assert_eq!(kinds, vec![TagKind::Mood, TagKind::Mood, TagKind::Style]);
    }

    #[test]
    fn record_round_trips_through_json() {
        let dna = DesignDna::assemble(&palette(), parse_model_response(REPLY).unwrap());
        let json = serde_json::to_string(&dna).unwrap();
        assert!(json.contains("\"role\":\"background\""));
        assert!(json.contains("\"googleFontsUrl\""));
        let back: DesignDna = serde_json::from_str(&json).unwrap();
        assert_eq!(back.colors, dna.colors);
    }
}
