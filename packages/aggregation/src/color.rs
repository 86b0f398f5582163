//! Amount → fill colour step function.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Amount band, ordered from smallest to largest.
///
/// Bands are half-open: `[lower_bound, next lower_bound)`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ColorBucket {
    Ones,
    Hundreds,
    Thousands,
    TenThousands,
    HundredThousands,
    Millions,
    TenMillions,
    HundredMillions,
}

impl ColorBucket {
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Ones,
            Self::Hundreds,
            Self::Thousands,
            Self::TenThousands,
            Self::HundredThousands,
            Self::Millions,
            Self::TenMillions,
            Self::HundredMillions,
        ]
    }

    /// Smallest amount in the band.
    #[must_use]
    pub const fn lower_bound(self) -> f64 {
        match self {
            Self::Ones => 0.0,
            Self::Hundreds => 100.0,
            Self::Thousands => 1e3,
            Self::TenThousands => 1e4,
            Self::HundredThousands => 1e5,
            Self::Millions => 1e6,
            Self::TenMillions => 1e7,
            Self::HundredMillions => 1e8,
        }
    }

    /// The band holding `amount`; `None` for negative or NaN amounts.
    #[must_use]
    pub fn for_amount(amount: f64) -> Option<Self> {
        if amount.is_nan() || amount < 0.0 {
            return None;
        }
        Self::all()
            .iter()
            .rev()
            .find(|bucket| amount >= bucket.lower_bound())
            .copied()
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Fill colours for each band plus the unknown colour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Palette {
    /// One colour per [`ColorBucket`], in order.
    pub buckets: [String; 8],
    pub unknown: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            buckets: [
                "#e6f7ff", "#b3e0ff", "#ccffcc", "#8cd68c", "#fff2b2", "#ffcc99", "#ff9999",
                "#ff3333",
            ]
            .map(ToString::to_string),
            unknown: "#e2e8f0".to_string(),
        }
    }
}

impl Palette {
    #[must_use]
    pub fn bucket_color(&self, bucket: ColorBucket) -> &str {
        &self.buckets[bucket.index()]
    }

    /// Colour for `amount`. Total: invalid amounts get the unknown colour.
    #[must_use]
    pub fn color_for(&self, amount: f64) -> &str {
        ColorBucket::for_amount(amount).map_or(self.unknown.as_str(), |bucket| self.bucket_color(bucket))
    }
}

/// Dark text on light backgrounds, white text otherwise.
///
/// Lightness is HSP perceived brightness of a `#rrggbb` colour. Anything
/// that is not a six digit hex colour counts as light.
#[must_use]
pub fn text_color_for(background: &str) -> &'static str {
    const DARK_TEXT: &str = "#333333";
    const LIGHT_TEXT: &str = "#ffffff";

    let channel = |range: std::ops::Range<usize>| {
        background
            .get(range)
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            .map(f64::from)
    };
    let rgb = background
        .strip_prefix('#')
        .filter(|hex| hex.len() == 6)
        .and_then(|_| Some((channel(1..3)?, channel(3..5)?, channel(5..7)?)));

    let Some((r, g, b)) = rgb else {
        return DARK_TEXT;
    };
    let hsp = 0.114f64.mul_add(b * b, 0.299f64.mul_add(r * r, 0.587 * g * g)).sqrt();
    if hsp > 127.5 { DARK_TEXT } else { LIGHT_TEXT }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_amounts_share_one_bucket() {
        let palette = Palette::default();
        for amount in [0.0, 1.0, 50.5, 99.0, 99.999] {
            assert_eq!(palette.color_for(amount), "#e6f7ff", "{amount}");
        }
    }

    #[test]
    fn breakpoints_start_new_buckets() {
        let palette = Palette::default();
        assert_eq!(palette.color_for(100.0), "#b3e0ff");
        assert_eq!(palette.color_for(999.5), "#b3e0ff");
        assert_eq!(palette.color_for(1e3), "#ccffcc");
        assert_eq!(palette.color_for(1e4), "#8cd68c");
        assert_eq!(palette.color_for(1e5), "#fff2b2");
        assert_eq!(palette.color_for(1e6), "#ffcc99");
        assert_eq!(palette.color_for(1e7), "#ff9999");
        assert_eq!(palette.color_for(1e8), "#ff3333");
        assert_eq!(palette.color_for(f64::INFINITY), "#ff3333");
    }

    #[test]
    fn scale_is_total_and_non_decreasing() {
        let mut previous = ColorBucket::Ones;
        let mut amount = 0.0;
        while amount < 1e9 {
            let bucket = ColorBucket::for_amount(amount).unwrap();
            assert!(bucket >= previous, "{amount}");
            previous = bucket;
            amount = amount * 1.7 + 1.0;
        }
        assert_eq!(previous, ColorBucket::HundredMillions);
    }

    #[test]
    fn invalid_amounts_are_unknown() {
        let palette = Palette::default();
        assert_eq!(palette.color_for(-1.0), "#e2e8f0");
        assert_eq!(palette.color_for(f64::NAN), "#e2e8f0");
        assert_eq!(ColorBucket::for_amount(-0.5), None);
    }

    #[test]
    fn text_color_contrasts_with_background() {
        assert_eq!(text_color_for("#e6f7ff"), "#333333");
        assert_eq!(text_color_for("#ff3333"), "#333333");
        assert_eq!(text_color_for("#1a237e"), "#ffffff");
        assert_eq!(text_color_for("#000000"), "#ffffff");
        assert_eq!(text_color_for("red"), "#333333");
    }
}
