use palette::Srgb;

/// Format a color as `#rrggbb` (lowercase, zero padded).
pub fn to_hex(color: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

/// Parse a `#rrggbb` string. The leading `#` is optional; anything that is not
/// exactly six hex digits after it yields `None`.
pub fn parse_hex(s: &str) -> Option<Srgb<u8>> {
    let hex = s.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Srgb::new(r, g, b))
}

/// Integer division rounding half up. `den` must be non-zero.
#[inline(always)]
pub fn round_div(num: u64, den: u64) -> u64 {
    (2 * num + den) / (2 * den)
}

/// Snap a channel to the nearest multiple of `step`, clamped to 255 so that
/// 252..=255 on an 8-grid still renders as two hex digits.
#[inline(always)]
pub fn quantize(channel: u8, step: u8) -> u8 {
    let step = step.max(1) as u64;
    (round_div(channel as u64, step) * step).min(255) as u8
}

/// Fold `add` (weighted `add_count`) into `base` (weighted `base_count`).
pub fn weighted_mean(base: Srgb<u8>, base_count: u64, add: Srgb<u8>, add_count: u64) -> Srgb<u8> {
    let total = base_count + add_count;
    let mix = |a: u8, b: u8| round_div(a as u64 * base_count + b as u64 * add_count, total) as u8;
    Srgb::new(
        mix(base.red, add.red),
        mix(base.green, add.green),
        mix(base.blue, add.blue),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_lowercase_and_padded() {
        assert_eq!(to_hex(Srgb::new(255, 0, 10)), "#ff000a");
        assert_eq!(to_hex(Srgb::new(0, 0, 0)), "#000000");
    }

    #[test]
    fn parse_accepts_optional_hash() {
        assert_eq!(parse_hex("#FE0101"), Some(Srgb::new(254, 1, 1)));
        assert_eq!(parse_hex("00ff00"), Some(Srgb::new(0, 255, 0)));
    }

    #[test]
    fn parse_rejects_malformed() {
        assert_eq!(parse_hex(""), None);
        assert_eq!(parse_hex("#fff"), None);
        assert_eq!(parse_hex("#ff00zz"), None);
        assert_eq!(parse_hex("#+f0000"), None);
        assert_eq!(parse_hex("#ff00001"), None);
    }

    #[test]
    fn quantize_rounds_half_up_and_clamps() {
        assert_eq!(quantize(3, 8), 0);
        assert_eq!(quantize(4, 8), 8);
        assert_eq!(quantize(251, 8), 248);
        assert_eq!(quantize(252, 8), 255);
        assert_eq!(quantize(255, 32), 255);
        assert_eq!(quantize(15, 32), 0);
        assert_eq!(quantize(16, 32), 32);
    }

    #[test]
    fn weighted_mean_respects_counts() {
        let c = weighted_mean(Srgb::new(0, 0, 0), 3, Srgb::new(100, 40, 8), 1);
        assert_eq!(c, Srgb::new(25, 10, 2));
    }
}
