use serde::{Deserialize, Serialize};

use crate::extract::ExtractedColor;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorRole {
    Background,
    Primary,
    Secondary,
    Accent,
    Text,
}

impl ColorRole {
    /// Role implied by a color's position in a frequency-ordered palette.
    pub fn from_rank(rank: usize) -> Self {
        match rank {
            0 => ColorRole::Background,
            1 => ColorRole::Primary,
            2 => ColorRole::Secondary,
            _ => ColorRole::Accent,
        }
    }
}

/// A palette entry as stored on a design record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DesignColor {
    pub hex: String,
    pub name: String,
    pub role: ColorRole,
    /// Fraction of the canvas, `percentage / 100`.
    pub prominence: f32,
}

/// Label an extracted palette by rank. Colors carry their hex as their name.
pub fn assign_roles(colors: &[ExtractedColor]) -> Vec<DesignColor> {
    colors
        .iter()
        .enumerate()
        .map(|(rank, c)| DesignColor {
            hex: c.hex.clone(),
            name: c.hex.clone(),
            role: ColorRole::from_rank(rank),
            prominence: c.percentage as f32 / 100.0,
        })
        .collect()
}
