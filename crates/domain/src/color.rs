//! Color representations and the conversions that make them comparable.
//!
//! A light reports its color in one of three modes. Equality checks and
//! effect-color detection always go through [`Color::to_xy`] so that two
//! lights showing the same color compare equal regardless of mode.

use serde::{Deserialize, Serialize};

/// CIE 1931 chromaticity pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Xy {
    pub x: f64,
    pub y: f64,
}

/// D65 white point, used when a conversion degenerates.
const WHITE_POINT: Xy = Xy::new(0.3127, 0.3290);

impl Xy {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates differ by at most `tolerance`.
    #[must_use]
    pub fn approx_eq(self, other: Self, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

/// A light's color, in exactly one of the modes the bridge understands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Color {
    /// Chromaticity coordinates.
    Xy { x: f64, y: f64 },
    /// White color temperature in mirek (reciprocal megakelvin).
    Temperature { mirek: u16 },
    /// Hue in degrees `[0, 360)` and saturation in percent `[0, 100]`.
    HueSaturation { hue: f64, saturation: f64 },
}

impl Color {
    /// Fallback used when a light reports no usable color at all.
    pub const DEFAULT: Self = Self::HueSaturation {
        hue: 0.0,
        saturation: 100.0,
    };

    #[must_use]
    pub const fn xy(x: f64, y: f64) -> Self {
        Self::Xy { x, y }
    }

    /// Pick the color mode to keep from what a light reported.
    ///
    /// Chromaticity wins over color temperature, which wins over
    /// hue/saturation; with nothing reported the result is [`Color::DEFAULT`].
    #[must_use]
    pub fn select(xy: Option<Xy>, mirek: Option<u16>, hue_saturation: Option<(f64, f64)>) -> Self {
        if let Some(xy) = xy {
            return Self::Xy { x: xy.x, y: xy.y };
        }
        if let Some(mirek) = mirek {
            return Self::Temperature { mirek };
        }
        match hue_saturation {
            Some((hue, saturation)) => Self::HueSaturation { hue, saturation },
            None => Self::DEFAULT,
        }
    }

    /// Reduce any mode to chromaticity coordinates.
    #[must_use]
    pub fn to_xy(self) -> Xy {
        match self {
            Self::Xy { x, y } => Xy::new(x, y),
            Self::Temperature { mirek } => mirek_to_xy(mirek),
            Self::HueSaturation { hue, saturation } => hue_saturation_to_xy(hue, saturation),
        }
    }
}

/// Approximate the Planckian locus (Kim et al. cubic spline) for a color
/// temperature given in mirek.
fn mirek_to_xy(mirek: u16) -> Xy {
    let kelvin = (1_000_000.0 / f64::from(mirek.max(1))).clamp(1667.0, 25_000.0);
    let t = kelvin;
    let t2 = t * t;
    let t3 = t2 * t;

    let x = if t <= 4000.0 {
        -0.266_123_9e9 / t3 - 0.234_358_9e6 / t2 + 0.877_695_6e3 / t + 0.179_910
    } else {
        -3.025_846_9e9 / t3 + 2.107_037_9e6 / t2 + 0.222_634_7e3 / t + 0.240_390
    };

    let x2 = x * x;
    let x3 = x2 * x;
    let y = if t <= 2222.0 {
        -1.106_381_4 * x3 - 1.348_110_20 * x2 + 2.185_558_32 * x - 0.202_196_83
    } else if t <= 4000.0 {
        -0.954_947_6 * x3 - 1.374_185_93 * x2 + 2.091_370_15 * x - 0.167_488_67
    } else {
        3.081_758_0 * x3 - 5.873_386_70 * x2 + 3.751_129_97 * x - 0.370_014_83
    };

    Xy::new(x, y)
}

/// HSV (full value) → wide-gamut RGB → CIE XYZ → xy.
fn hue_saturation_to_xy(hue: f64, saturation: f64) -> Xy {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = (saturation / 100.0).clamp(0.0, 1.0);
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = 1.0 - c;

    let (r, g, b) = if h < 1.0 {
        (c, x, 0.0)
    } else if h < 2.0 {
        (x, c, 0.0)
    } else if h < 3.0 {
        (0.0, c, x)
    } else if h < 4.0 {
        (0.0, x, c)
    } else if h < 5.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    let (r, g, b) = (gamma(r + m), gamma(g + m), gamma(b + m));

    let big_x = r * 0.664_511 + g * 0.154_324 + b * 0.162_028;
    let big_y = r * 0.283_881 + g * 0.668_433 + b * 0.047_685;
    let big_z = r * 0.000_088 + g * 0.072_310 + b * 0.986_039;
    let sum = big_x + big_y + big_z;

    if sum <= f64::EPSILON {
        return WHITE_POINT;
    }
    Xy::new(big_x / sum, big_y / sum)
}

fn gamma(channel: f64) -> f64 {
    if channel > 0.040_45 {
        ((channel + 0.055) / 1.055).powf(2.4)
    } else {
        channel / 12.92
    }
}

/// The two colors the effect alternates between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectColor {
    Blue,
    Yellow,
}

/// How far a reported chromaticity may drift from an effect color and still
/// count as "showing" it. Bridges clamp requested colors to each lamp's gamut.
pub const EFFECT_COLOR_TOLERANCE: f64 = 0.01;

impl EffectColor {
    /// Color of every light's first flip and of the grouped kickoff.
    pub const FIRST: Self = Self::Blue;

    #[must_use]
    pub const fn xy(self) -> Xy {
        match self {
            Self::Blue => Xy::new(0.1691, 0.0441),
            Self::Yellow => Xy::new(0.5, 0.5),
        }
    }

    #[must_use]
    pub const fn color(self) -> Color {
        let xy = self.xy();
        Color::xy(xy.x, xy.y)
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Blue => Self::Yellow,
            Self::Yellow => Self::Blue,
        }
    }

    /// Which effect color, if any, `color` is showing.
    #[must_use]
    pub fn detect(color: Color) -> Option<Self> {
        let xy = color.to_xy();
        [Self::Blue, Self::Yellow]
            .into_iter()
            .find(|candidate| candidate.xy().approx_eq(xy, EFFECT_COLOR_TOLERANCE))
    }
}
