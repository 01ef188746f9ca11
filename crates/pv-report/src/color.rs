//! Diverging colour scale for effect sizes.
//!
//! Negative effects shade towards blue, positive towards red, zero is near
//! white. Intensity is `|v| / max|v|` over the values being displayed, so it
//! grows monotonically with the magnitude of the effect.

use serde::Serialize;

/// An sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    fn mix(self, other: Rgb, t: f64) -> Rgb {
        let lerp = |a: u8, b: u8| -> u8 {
            let v = a as f64 + (b as f64 - a as f64) * t;
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgb(
            lerp(self.0, other.0),
            lerp(self.1, other.1),
            lerp(self.2, other.2),
        )
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

/// RdBu endpoints.
pub const NEGATIVE: Rgb = Rgb(0x21, 0x66, 0xac);
pub const NEUTRAL: Rgb = Rgb(0xf7, 0xf7, 0xf7);
pub const POSITIVE: Rgb = Rgb(0xb2, 0x18, 0x2b);

/// Symmetric diverging scale centred on zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DivergingScale {
    /// Largest magnitude on the scale; values at ±`max_abs` get full colour.
    pub max_abs: f64,
    pub negative: Rgb,
    pub neutral: Rgb,
    pub positive: Rgb,
}

impl DivergingScale {
    pub fn new(max_abs: f64) -> Self {
        Self {
            max_abs: if max_abs.is_finite() { max_abs.abs() } else { 0.0 },
            negative: NEGATIVE,
            neutral: NEUTRAL,
            positive: POSITIVE,
        }
    }

    /// Scale spanning the largest magnitude among `values`. Non-finite values are ignored.
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let max_abs = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        Self::new(max_abs)
    }

    /// Colour strength in `[0, 1]`.
    pub fn intensity(&self, value: f64) -> f64 {
        if self.max_abs <= 0.0 || !value.is_finite() {
            return 0.0;
        }
        (value.abs() / self.max_abs).clamp(0.0, 1.0)
    }

    pub fn color(&self, value: f64) -> Rgb {
        let t = self.intensity(value);
        if value < 0.0 {
            self.neutral.mix(self.negative, t)
        } else {
            self.neutral.mix(self.positive, t)
        }
    }

    /// `[negative, neutral, positive]` hex stops for the chart legend.
    pub fn stops(&self) -> [String; 3] {
        [self.negative.hex(), self.neutral.hex(), self.positive.hex()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_endpoints() {
        let scale = DivergingScale::new(2.0);
        assert_eq!(scale.color(0.0), NEUTRAL);
        assert_eq!(scale.color(2.0), POSITIVE);
        assert_eq!(scale.color(-2.0), NEGATIVE);
        assert_eq!(scale.color(5.0), POSITIVE);
        assert_eq!(POSITIVE.hex(), "#b2182b");
    }

    #[test]
    fn test_all_zero_values_have_no_intensity() {
        let scale = DivergingScale::from_values([0.0, 0.0, f64::NAN]);
        assert_eq!(scale.max_abs, 0.0);
        assert_eq!(scale.intensity(0.0), 0.0);
        assert_eq!(scale.color(0.0), NEUTRAL);
    }

    #[test]
    fn test_from_values_uses_largest_magnitude() {
        let scale = DivergingScale::from_values([0.1, -0.8, 0.3]);
        assert_eq!(scale.max_abs, 0.8);
        assert_eq!(scale.intensity(-0.8), 1.0);
        assert!((scale.intensity(0.4) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_serializes_as_hex() {
        let json = serde_json::to_value(DivergingScale::new(1.0)).unwrap();
        assert_eq!(json["positive"], "#b2182b");
        assert_eq!(json["max_abs"], 1.0);
    }

    proptest! {
        #[test]
        fn prop_intensity_monotone_in_magnitude(
            a in -10.0f64..10.0,
            b in -10.0f64..10.0,
            max in 0.01f64..20.0,
        ) {
            let scale = DivergingScale::new(max);
            let (ia, ib) = (scale.intensity(a), scale.intensity(b));
            prop_assert!((0.0..=1.0).contains(&ia));
            if a.abs() <= b.abs() {
                prop_assert!(ia <= ib);
            }
        }

        #[test]
        fn prop_color_is_hex(v in -5.0f64..5.0) {
            let hex = DivergingScale::new(5.0).color(v).hex();
            prop_assert_eq!(hex.len(), 7);
            prop_assert!(hex.starts_with('#'));
        }
    }
}
