//! Design DNA: deterministic color palettes from design screenshots.
//!
//! Each image is decoded, crop-filled onto a small canvas and bucketed on a
//! fine color grid ([`extract`]). Palettes from many images are then grouped
//! on a coarser grid into a consensus palette ([`cluster`]). The remaining
//! modules turn those palettes into stored design records, style guide
//! evidence and taste profiles.

pub mod cluster;
pub mod color;
pub mod dna;
pub mod error;
pub mod extract;
pub mod fonts;
pub mod roles;
pub mod style_guide;
pub mod taste;
pub mod wasm;

pub use cluster::{CLUSTER_GRID, ClusterColor, DEFAULT_TOP_K, HexEntry, cluster_colors, cluster_entries};
pub use dna::{DesignDna, ModelClassification, parse_model_response};
pub use error::{DnaError, Result};
pub use extract::{
    CANVAS_SIZE, DEFAULT_MAX_COLORS, ExtractOptions, ExtractedColor, MAX_CANVAS_SIZE,
    MERGE_TOLERANCE, PIXEL_GRID, extract_colors, extract_colors_with, extract_from_image,
};
pub use fonts::{FontCandidate, candidate_fonts};
pub use roles::{ColorRole, DesignColor, assign_roles};
pub use style_guide::{StyleGuideInput, parse_style_guide};
pub use taste::{DatedDesign, TasteProfile, build_profile};
