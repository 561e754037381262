use image::error::{ImageError, ParameterError, ParameterErrorKind};
use image::{DynamicImage, GenericImageView, RgbImage, imageops::FilterType};
use indexmap::IndexMap;
use palette::Srgb;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::{quantize, round_div, to_hex, weighted_mean};
use crate::error::{DnaError, Result};

/// Per-channel grid step applied to every canvas pixel.
pub const PIXEL_GRID: u8 = 8;
/// Buckets closer than this on every channel are folded together.
pub const MERGE_TOLERANCE: u8 = 30;
/// Side length of the square canvas images are resized onto.
pub const CANVAS_SIZE: u32 = 150;
pub const DEFAULT_MAX_COLORS: usize = 8;
/// Largest accepted canvas side.
pub const MAX_CANVAS_SIZE: u32 = 4096;

/// Knobs for a single extraction call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtractOptions {
    /// Upper bound on the number of returned colors.
    pub max_colors: usize,
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Opaque color translucent pixels are composited over.
    pub background: Srgb<u8>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_colors: DEFAULT_MAX_COLORS,
            canvas_width: CANVAS_SIZE,
            canvas_height: CANVAS_SIZE,
            background: Srgb::new(255, 255, 255),
        }
    }
}

impl ExtractOptions {
    pub fn with_max_colors(max_colors: usize) -> Self {
        Self {
            max_colors,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_colors == 0 {
            return Err(DnaError::InvalidParameter(
                "max_colors must be at least 1".into(),
            ));
        }
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(DnaError::InvalidParameter(format!(
                "canvas must be non-empty, got {}x{}",
                self.canvas_width, self.canvas_height
            )));
        }
        if self.canvas_width > MAX_CANVAS_SIZE || self.canvas_height > MAX_CANVAS_SIZE {
            return Err(DnaError::InvalidParameter(format!(
                "canvas may be at most {MAX_CANVAS_SIZE}x{MAX_CANVAS_SIZE}, got {}x{}",
                self.canvas_width, self.canvas_height
            )));
        }
        Ok(())
    }
}

/// Running accumulator for pixels judged to be the same color.
///
/// `color` is always the count-weighted mean of everything folded in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorBucket {
    pub color: Srgb<u8>,
    pub count: u64,
}

impl ColorBucket {
    fn new(color: Srgb<u8>) -> Self {
        Self { color, count: 1 }
    }

    fn is_near(&self, other: &ColorBucket, tolerance: u8) -> bool {
        self.color.red.abs_diff(other.color.red) < tolerance
            && self.color.green.abs_diff(other.color.green) < tolerance
            && self.color.blue.abs_diff(other.color.blue) < tolerance
    }

    fn absorb(&mut self, other: &ColorBucket) {
        self.color = weighted_mean(self.color, self.count, other.color, other.count);
        self.count += other.count;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgbValue {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl From<Srgb<u8>> for RgbValue {
    fn from(c: Srgb<u8>) -> Self {
        Self {
            r: c.red,
            g: c.green,
            b: c.blue,
        }
    }
}

/// One entry of an image's dominant palette.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedColor {
    pub hex: String,
    pub rgb: RgbValue,
    /// Share of canvas pixels in this color, rounded to a whole percent.
    pub percentage: u8,
}

/// Decode `input` and return up to `max_colors` dominant colors, most
/// frequent first.
pub fn extract_colors(input: &[u8], max_colors: usize) -> Result<Vec<ExtractedColor>> {
    extract_colors_with(input, &ExtractOptions::with_max_colors(max_colors))
}

pub fn extract_colors_with(input: &[u8], options: &ExtractOptions) -> Result<Vec<ExtractedColor>> {
    options.validate()?;
    let img = image::load_from_memory(input)?;
    extract_from_image(img, options)
}

/// Run the extraction on an already decoded image. The image is consumed so
/// the full resolution buffer is released as soon as the canvas exists.
pub fn extract_from_image(img: DynamicImage, options: &ExtractOptions) -> Result<Vec<ExtractedColor>> {
    options.validate()?;
    if img.width() == 0 || img.height() == 0 {
        return Err(DnaError::Decode(ImageError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::DimensionMismatch,
        ))));
    }
    let canvas = fit_canvas(img, options);
    let total = canvas.width() as u64 * canvas.height() as u64;

    let buckets = quantize_pixels(&canvas);
    let bucket_count = buckets.len();
    let mut merged = merge_similar(buckets, MERGE_TOLERANCE);
    debug!(
        width = canvas.width(),
        height = canvas.height(),
        buckets = bucket_count,
        merged = merged.len(),
        "quantized canvas"
    );
    merged.truncate(options.max_colors);

    Ok(merged
        .into_iter()
        .map(|bucket| ExtractedColor {
            hex: to_hex(bucket.color),
            rgb: bucket.color.into(),
            percentage: round_div(bucket.count * 100, total).min(100) as u8,
        })
        .collect())
}

/// Crop-to-fill onto the canvas, then composite alpha over the background.
fn fit_canvas(img: DynamicImage, options: &ExtractOptions) -> RgbImage {
    let (w, h) = (options.canvas_width, options.canvas_height);
    let resized = if img.dimensions() == (w, h) {
        img
    } else {
        img.resize_to_fill(w, h, FilterType::Nearest)
    };
    let rgba = resized.into_rgba8();

    let bg = options.background;
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = a as u64;
        let over = |c: u8, back: u8| round_div(c as u64 * a + back as u64 * (255 - a), 255) as u8;
        image::Rgb([over(r, bg.red), over(g, bg.green), over(b, bg.blue)])
    })
}

/// Bucket every pixel by its grid-snapped value, sorted by count (ties keep
/// first-seen order).
fn quantize_pixels(canvas: &RgbImage) -> Vec<ColorBucket> {
    let mut map: IndexMap<[u8; 3], ColorBucket> = IndexMap::new();
    for px in canvas.pixels() {
        let key = px.0.map(|c| quantize(c, PIXEL_GRID));
        map.entry(key)
            .and_modify(|bucket| bucket.count += 1)
            .or_insert_with(|| ColorBucket::new(Srgb::new(key[0], key[1], key[2])));
    }

    let mut buckets: Vec<ColorBucket> = map.into_values().collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    buckets
}

/// Fold each bucket into the first earlier survivor within `tolerance` on
/// every channel. Input must be sorted by descending count; output is
/// re-sorted by the merged counts.
fn merge_similar(sorted: Vec<ColorBucket>, tolerance: u8) -> Vec<ColorBucket> {
    let mut merged: Vec<ColorBucket> = Vec::new();
    for bucket in sorted {
        match merged.iter_mut().find(|m| m.is_near(&bucket, tolerance)) {
            Some(absorber) => absorber.absorb(&bucket),
            None => merged.push(bucket),
        }
    }
    merged.sort_by(|a, b| b.count.cmp(&a.count));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(img: RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn bucket(r: u8, g: u8, b: u8, count: u64) -> ColorBucket {
        ColorBucket {
            color: Srgb::new(r, g, b),
            count,
        }
    }

    #[test]
    fn two_by_two_scenario() {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(0, 1, Rgba([0, 255, 0, 255]));
        img.put_pixel(1, 1, Rgba([0, 0, 255, 255]));

        let colors = extract_colors(&png(img), 8).unwrap();
        let summary: Vec<(&str, u8)> = colors.iter().map(|c| (c.hex.as_str(), c.percentage)).collect();
        assert_eq!(
            summary,
            vec![("#ff0000", 50), ("#00ff00", 25), ("#0000ff", 25)]
        );
    }

    #[test]
    fn flat_image_is_single_color() {
        let img = RgbaImage::from_pixel(37, 513, Rgba([13, 100, 250, 255]));
        let colors = extract_colors(&png(img), 8).unwrap();
        assert_eq!(colors.len(), 1);
        assert_eq!(colors[0].percentage, 100);
        // 13 -> 16, 100 -> 104, 250 -> 248
        assert_eq!(colors[0].hex, "#1068f8");
        assert_eq!(colors[0].rgb, RgbValue { r: 16, g: 104, b: 248 });
    }

    #[test]
    fn transparent_pixels_flatten_onto_background() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0]));
        let colors = extract_colors(&png(img), 8).unwrap();
        assert_eq!(colors[0].hex, "#ffffff");

        let options = ExtractOptions {
            background: Srgb::new(0, 0, 0),
            ..ExtractOptions::default()
        };
        let img = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 0]));
        let colors = extract_colors_with(&png(img), &options).unwrap();
        assert_eq!(colors[0].hex, "#000000");
    }

    #[test]
    fn output_is_bounded_and_sorted() {
        // 16 vertical stripes, all far apart on the red channel.
        let img = RgbaImage::from_fn(160, 10, |x, _| {
            let stripe = (x / 10) as u8;
            Rgba([stripe * 16, if stripe % 2 == 0 { 0 } else { 200 }, 90, 255])
        });
        let bytes = png(img);
        for k in [1usize, 3, 8] {
            let colors = extract_colors(&bytes, k).unwrap();
            assert!(!colors.is_empty() && colors.len() <= k);
            assert!(colors.windows(2).all(|w| w[0].percentage >= w[1].percentage));
            assert!(colors.iter().all(|c| c.percentage <= 100));
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let img = RgbaImage::from_fn(64, 48, |x, y| Rgba([(x * 4) as u8, (y * 5) as u8, ((x ^ y) * 3) as u8, 255]));
        let bytes = png(img);
        assert_eq!(
            extract_colors(&bytes, 8).unwrap(),
            extract_colors(&bytes, 8).unwrap()
        );
    }

    #[test]
    fn corrupt_bytes_fail_to_decode() {
        let err = extract_colors(b"definitely not an image", 8).unwrap_err();
        assert!(matches!(err, DnaError::Decode(_)));
    }

    #[test]
    fn zero_max_colors_is_rejected_before_decode() {
        let err = extract_colors(b"garbage", 0).unwrap_err();
        assert!(matches!(err, DnaError::InvalidParameter(_)));
    }

    #[test]
    fn zero_canvas_is_rejected() {
        let options = ExtractOptions {
            canvas_width: 0,
            ..ExtractOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn oversized_canvas_is_rejected() {
        let options = ExtractOptions {
            canvas_width: 100_000,
            canvas_height: 100_000,
            ..ExtractOptions::default()
        };
        let err = extract_colors_with(b"garbage", &options).unwrap_err();
        assert!(matches!(err, DnaError::InvalidParameter(_)));

        let largest = ExtractOptions {
            canvas_width: MAX_CANVAS_SIZE,
            canvas_height: 1,
            ..ExtractOptions::default()
        };
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn empty_image_is_a_decode_error() {
        let empty = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));
        let err = extract_from_image(empty, &ExtractOptions::default()).unwrap_err();
        assert!(matches!(err, DnaError::Decode(_)));

        let sliver = DynamicImage::ImageRgba8(RgbaImage::new(12, 0));
        assert!(extract_from_image(sliver, &ExtractOptions::default()).is_err());
    }

    #[test]
    fn near_buckets_merge_into_dominant() {
        let merged = merge_similar(
            vec![bucket(248, 248, 248, 30), bucket(0, 0, 0, 20), bucket(255, 255, 255, 10)],
            MERGE_TOLERANCE,
        );
        assert_eq!(merged.len(), 2);
        // (248*30 + 255*10) / 40 = 249.75
        assert_eq!(merged[0], bucket(250, 250, 250, 40));
        assert_eq!(merged[1], bucket(0, 0, 0, 20));
    }

    #[test]
    fn merge_uses_strict_tolerance() {
        let merged = merge_similar(vec![bucket(100, 0, 0, 5), bucket(130, 0, 0, 4)], 30);
        assert_eq!(merged.len(), 2);
        let merged = merge_similar(vec![bucket(100, 0, 0, 5), bucket(129, 0, 0, 4)], 30);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn merged_counts_are_resorted() {
        let merged = merge_similar(
            vec![
                bucket(0, 0, 0, 10),
                bucket(200, 0, 0, 9),
                bucket(0, 200, 0, 9),
                bucket(210, 10, 0, 8),
            ],
            MERGE_TOLERANCE,
        );
        assert_eq!(merged[0].count, 17);
        assert_eq!(merged[1].count, 10);
        assert_eq!(merged[2].count, 9);
    }

    #[test]
    fn quantize_pixels_groups_noise() {
        let canvas = RgbImage::from_fn(4, 1, |x, _| match x {
            0 | 1 => image::Rgb([10, 10, 10]),
            2 => image::Rgb([9, 7, 11]),
            _ => image::Rgb([200, 200, 200]),
        });
        let buckets = quantize_pixels(&canvas);
        assert_eq!(buckets, vec![bucket(8, 8, 8, 3), bucket(200, 200, 200, 1)]);
    }
}
