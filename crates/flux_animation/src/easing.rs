//! Easing functions for tweens
//!
//! Every curve maps normalized progress in `[0, 1]` to eased progress with
//! `apply(0.0) == 0.0` and `apply(1.0) == 1.0`. Back and elastic curves
//! overshoot in between.
//!
//! See <https://easings.net> for plots of each family.

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Easing curve used by a tween
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Easing {
    Linear,
    EaseInQuad,
    #[default]
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    EaseInQuint,
    EaseOutQuint,
    EaseInOutQuint,
    EaseInExpo,
    EaseOutExpo,
    EaseInOutExpo,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    EaseInCirc,
    EaseOutCirc,
    EaseInOutCirc,
    EaseInBack,
    EaseOutBack,
    EaseInOutBack,
    EaseInElastic,
    EaseOutElastic,
    EaseInOutElastic,
    CubicBezier(f32, f32, f32, f32),
}

/// Named curves, as `(family, mode, short name, easing)`.
const NAMED: [(&str, &str, &str, Easing); 27] = [
    ("quad", "in", "quadin", Easing::EaseInQuad),
    ("quad", "out", "quadout", Easing::EaseOutQuad),
    ("quad", "inout", "quadinout", Easing::EaseInOutQuad),
    ("cubic", "in", "cubicin", Easing::EaseInCubic),
    ("cubic", "out", "cubicout", Easing::EaseOutCubic),
    ("cubic", "inout", "cubicinout", Easing::EaseInOutCubic),
    ("quart", "in", "quartin", Easing::EaseInQuart),
    ("quart", "out", "quartout", Easing::EaseOutQuart),
    ("quart", "inout", "quartinout", Easing::EaseInOutQuart),
    ("quint", "in", "quintin", Easing::EaseInQuint),
    ("quint", "out", "quintout", Easing::EaseOutQuint),
    ("quint", "inout", "quintinout", Easing::EaseInOutQuint),
    ("expo", "in", "expoin", Easing::EaseInExpo),
    ("expo", "out", "expoout", Easing::EaseOutExpo),
    ("expo", "inout", "expoinout", Easing::EaseInOutExpo),
    ("sine", "in", "sinein", Easing::EaseInSine),
    ("sine", "out", "sineout", Easing::EaseOutSine),
    ("sine", "inout", "sineinout", Easing::EaseInOutSine),
    ("circ", "in", "circin", Easing::EaseInCirc),
    ("circ", "out", "circout", Easing::EaseOutCirc),
    ("circ", "inout", "circinout", Easing::EaseInOutCirc),
    ("back", "in", "backin", Easing::EaseInBack),
    ("back", "out", "backout", Easing::EaseOutBack),
    ("back", "inout", "backinout", Easing::EaseInOutBack),
    ("elastic", "in", "elasticin", Easing::EaseInElastic),
    ("elastic", "out", "elasticout", Easing::EaseOutElastic),
    ("elastic", "inout", "elasticinout", Easing::EaseInOutElastic),
];

const BACK_C1: f32 = 1.70158;
const BACK_C2: f32 = BACK_C1 * 1.525;
const BACK_C3: f32 = BACK_C1 + 1.0;
const ELASTIC_C4: f32 = (2.0 * PI) / 3.0;
const ELASTIC_C5: f32 = (2.0 * PI) / 4.5;

impl Easing {
    /// Apply the easing function to a progress value (0.0 to 1.0)
    ///
    /// Progress outside the unit range is clamped, and both endpoints are
    /// returned exactly.
    pub fn apply(&self, t: f32) -> f32 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }

        match self {
            Easing::Linear => t,
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::EaseInQuart => t * t * t * t,
            Easing::EaseOutQuart => 1.0 - (1.0 - t).powi(4),
            Easing::EaseInOutQuart => {
                if t < 0.5 {
                    8.0 * t * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
            Easing::EaseInQuint => t.powi(5),
            Easing::EaseOutQuint => 1.0 - (1.0 - t).powi(5),
            Easing::EaseInOutQuint => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
                }
            }
            Easing::EaseInExpo => 2f32.powf(10.0 * t - 10.0),
            Easing::EaseOutExpo => 1.0 - 2f32.powf(-10.0 * t),
            Easing::EaseInOutExpo => {
                if t < 0.5 {
                    2f32.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f32.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
            Easing::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
            Easing::EaseOutSine => (t * PI / 2.0).sin(),
            Easing::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Easing::EaseInCirc => 1.0 - (1.0 - t * t).sqrt(),
            Easing::EaseOutCirc => (1.0 - (t - 1.0).powi(2)).sqrt(),
            Easing::EaseInOutCirc => {
                if t < 0.5 {
                    (1.0 - (1.0 - (2.0 * t).powi(2)).sqrt()) / 2.0
                } else {
                    ((1.0 - (-2.0 * t + 2.0).powi(2)).sqrt() + 1.0) / 2.0
                }
            }
            Easing::EaseInBack => BACK_C3 * t * t * t - BACK_C1 * t * t,
            Easing::EaseOutBack => {
                1.0 + BACK_C3 * (t - 1.0).powi(3) + BACK_C1 * (t - 1.0).powi(2)
            }
            Easing::EaseInOutBack => {
                if t < 0.5 {
                    ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
                } else {
                    ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2)
                        + 2.0)
                        / 2.0
                }
            }
            Easing::EaseInElastic => {
                -(2f32.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * ELASTIC_C4).sin()
            }
            Easing::EaseOutElastic => {
                2f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0
            }
            Easing::EaseInOutElastic => {
                if t < 0.5 {
                    -(2f32.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin())
                        / 2.0
                } else {
                    (2f32.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin())
                        / 2.0
                        + 1.0
                }
            }
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier_ease(t, *x1, *y1, *x2, *y2),
        }
    }

    /// Every named curve, `Linear` first. `CubicBezier` is parameterized and
    /// therefore not listed.
    pub fn named() -> impl Iterator<Item = Easing> {
        std::iter::once(Easing::Linear).chain(NAMED.iter().map(|(_, _, _, easing)| *easing))
    }

    /// Short name in the `quadout` style, `None` for `CubicBezier`
    pub fn name(&self) -> Option<&'static str> {
        if matches!(self, Easing::Linear) {
            return Some("linear");
        }
        NAMED
            .iter()
            .find(|(_, _, _, easing)| easing == self)
            .map(|(_, _, name, _)| *name)
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.name()) {
            (_, Some(name)) => f.write_str(name),
            (Easing::CubicBezier(x1, y1, x2, y2), None) => {
                write!(f, "cubic-bezier({x1}, {y1}, {x2}, {y2})")
            }
            (other, None) => write!(f, "{other:?}"),
        }
    }
}

/// An easing name that does not match any supported curve
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown easing `{0}`")]
pub struct ParseEasingError(pub String);

impl FromStr for Easing {
    type Err = ParseEasingError;

    /// Accepts `quadout`, `EASE_QUADOUT`, `ease-out-quad`, `easeOutQuad`
    /// and the other spellings of the same family/mode pair.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let key = key.strip_prefix("ease").unwrap_or(&key);

        if key == "linear" {
            return Ok(Easing::Linear);
        }

        for (family, mode, _, easing) in NAMED.iter() {
            let family_first = key.strip_prefix(family).is_some_and(|rest| rest == *mode);
            let mode_first = key.strip_prefix(mode).is_some_and(|rest| rest == *family);
            if family_first || mode_first {
                return Ok(*easing);
            }
        }

        Err(ParseEasingError(s.to_string()))
    }
}

/// Cubic bezier easing calculation (matches CSS spec / browser implementations).
///
/// Uses Newton-Raphson with binary-search fallback. Computes in f64
/// internally so long tweens don't jitter near the endpoints.
fn cubic_bezier_ease(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let x = t as f64;
    let (x1, y1, x2, y2) = (x1 as f64, y1 as f64, x2 as f64, y2 as f64);

    let mut p = x;
    for _ in 0..8 {
        let err = bezier_sample(p, x1, x2) - x;
        if err.abs() < 1e-7 {
            return bezier_sample(p, y1, y2) as f32;
        }
        let slope = bezier_slope(p, x1, x2);
        if slope.abs() < 1e-7 {
            break;
        }
        p -= err / slope;
    }

    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    p = x;
    for _ in 0..20 {
        let val = bezier_sample(p, x1, x2);
        if (val - x).abs() < 1e-7 {
            break;
        }
        if val < x {
            lo = p;
        } else {
            hi = p;
        }
        p = (lo + hi) * 0.5;
    }

    bezier_sample(p, y1, y2) as f32
}

/// B(t) = 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³, in Horner form
#[inline]
fn bezier_sample(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    ((a * t + b) * t + c) * t
}

#[inline]
fn bezier_slope(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    (3.0 * a * t + 2.0 * b) * t + c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_are_exact() {
        for easing in Easing::named().chain([Easing::CubicBezier(0.25, 0.1, 0.25, 1.0)]) {
            assert_eq!(easing.apply(0.0), 0.0, "{easing} at 0");
            assert_eq!(easing.apply(1.0), 1.0, "{easing} at 1");
        }
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(Easing::EaseOutQuad.apply(-0.5), 0.0);
        assert_eq!(Easing::EaseInQuad.apply(1.5), 1.0);
    }

    #[test]
    fn test_quadratic_values() {
        assert_eq!(Easing::Linear.apply(0.25), 0.25);
        assert_eq!(Easing::EaseInQuad.apply(0.5), 0.25);
        assert_eq!(Easing::EaseOutQuad.apply(0.5), 0.75);
        assert_eq!(Easing::default(), Easing::EaseOutQuad);
    }

    #[test]
    fn test_required_curves_are_monotonic() {
        for easing in [Easing::Linear, Easing::EaseInQuad, Easing::EaseOutQuad] {
            let mut last = 0.0;
            for i in 0..=100 {
                let value = easing.apply(i as f32 / 100.0);
                assert!(value >= last, "{easing} decreased at step {i}");
                last = value;
            }
        }
    }

    #[test]
    fn test_back_overshoots() {
        assert!(Easing::EaseInBack.apply(0.2) < 0.0);
        assert!(Easing::EaseOutBack.apply(0.8) > 1.0);
    }

    #[test]
    fn test_linear_bezier_is_identity() {
        let linear = Easing::CubicBezier(0.0, 0.0, 1.0, 1.0);
        for t in [0.1, 0.3, 0.5, 0.9] {
            assert!((linear.apply(t) - t).abs() < 1e-4);
        }
    }

    #[test]
    fn test_parse_spellings() {
        assert_eq!("quadout".parse::<Easing>(), Ok(Easing::EaseOutQuad));
        assert_eq!("EASE_QUADOUT".parse::<Easing>(), Ok(Easing::EaseOutQuad));
        assert_eq!("ease-out-quad".parse::<Easing>(), Ok(Easing::EaseOutQuad));
        assert_eq!("easeInOutCubic".parse::<Easing>(), Ok(Easing::EaseInOutCubic));
        assert_eq!("elastic_in".parse::<Easing>(), Ok(Easing::EaseInElastic));
        assert_eq!("Linear".parse::<Easing>(), Ok(Easing::Linear));
    }

    #[test]
    fn test_parse_unknown() {
        let err = "wobble".parse::<Easing>().unwrap_err();
        assert_eq!(err, ParseEasingError("wobble".to_string()));
        assert_eq!(err.to_string(), "unknown easing `wobble`");
        assert!("quad".parse::<Easing>().is_err());
    }

    #[test]
    fn test_names_round_trip() {
        for easing in Easing::named() {
            let name = easing.name().unwrap();
            assert_eq!(name.parse::<Easing>(), Ok(easing));
        }
        assert_eq!(Easing::CubicBezier(0.1, 0.2, 0.3, 0.4).name(), None);
    }
}
