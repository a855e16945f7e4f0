//! Scenario files (`*.toml`)
//!
//! A scenario declares named values, the tweens that animate them, and the
//! fixed timestep used to replay them:
//!
//! ```toml
//! [settings]
//! dt = 0.25
//!
//! [values]
//! y = 0.0
//!
//! [[tween]]
//! name = "rise"
//! duration = 1.0
//! to = { y = 5.0 }
//!
//! [[tween]]
//! duration = 1.0
//! after = "rise"
//! to = { y = 0.0 }
//! ```

use anyhow::{Context, Result};
use flux_animation::{Easing, ParseEasingError};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// A scenario as written on disk
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub settings: Settings,
    /// Named targets and their starting values, in declaration order
    #[serde(default)]
    pub values: IndexMap<String, f32>,
    #[serde(default, rename = "tween")]
    pub tweens: Vec<TweenSpec>,
}

/// Replay settings
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Fixed timestep in seconds
    #[serde(default = "default_dt")]
    pub dt: f32,
    /// Stop after this much simulated time even if tweens remain
    #[serde(default)]
    pub max_time: Option<f32>,
    /// Record every n-th frame
    #[serde(default = "default_every")]
    pub every: usize,
}

fn default_dt() -> f32 {
    1.0 / 60.0
}

fn default_every() -> usize {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            max_time: None,
            every: default_every(),
        }
    }
}

/// One `[[tween]]` entry
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TweenSpec {
    /// Name other tweens use in `after`
    #[serde(default)]
    pub name: Option<String>,
    pub duration: f32,
    #[serde(default)]
    pub delay: f32,
    /// Easing name, e.g. `quadout` or `ease-in-out-cubic`
    #[serde(default)]
    pub ease: Option<String>,
    /// End values keyed by value name
    #[serde(default)]
    pub to: IndexMap<String, f32>,
    /// Chain after a previously declared tween
    #[serde(default)]
    pub after: Option<String>,
    /// Wait until every tween declared so far has finished
    #[serde(default)]
    pub after_all_else: bool,
    /// Running flag raised while this tween is active
    #[serde(default)]
    pub flag: Option<String>,
}

impl TweenSpec {
    /// Name used in diagnostics: the declared name, or `#index`
    pub fn label(&self, index: usize) -> String {
        self.name.clone().unwrap_or_else(|| format!("#{index}"))
    }

    /// The configured easing, quadratic ease-out if unset
    pub fn easing(&self) -> Result<Easing, ParseEasingError> {
        self.ease
            .as_deref()
            .map_or(Ok(Easing::default()), str::parse)
    }
}

/// A scenario that parses but cannot be replayed
#[derive(Debug, Error, PartialEq)]
pub enum ScenarioError {
    #[error("timestep must be a positive number of seconds, got {0}")]
    InvalidTimestep(f32),

    #[error("`every` must be at least 1")]
    InvalidSampling,

    #[error("tween {tween}: {field} must be a finite, non-negative number of seconds, got {value}")]
    InvalidTime {
        tween: String,
        field: &'static str,
        value: f32,
    },

    #[error("tween {tween}: unknown value `{value}`")]
    UnknownValue { tween: String, value: String },

    #[error("tween {tween}: `after` refers to `{after}`, which is not declared before it")]
    UnknownParent { tween: String, after: String },

    #[error("tween {tween}: `after` and `after_all_else` cannot be combined")]
    ConflictingChain { tween: String },

    #[error("tween name `{0}` is declared twice")]
    DuplicateName(String),

    #[error("tween {tween}: {source}")]
    Easing {
        tween: String,
        #[source]
        source: ParseEasingError,
    },
}

impl Scenario {
    /// Parse a scenario from TOML text
    pub fn from_toml(input: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(input).context("invalid scenario file")?;
        Ok(scenario)
    }

    /// Load a scenario from a file
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("failed to load {}", path.display()))
    }

    /// Check everything the replay relies on
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let dt = self.settings.dt;
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ScenarioError::InvalidTimestep(dt));
        }
        if self.settings.every == 0 {
            return Err(ScenarioError::InvalidSampling);
        }

        let mut declared = HashSet::new();
        for (index, spec) in self.tweens.iter().enumerate() {
            let tween = spec.label(index);

            for (field, value) in [("duration", spec.duration), ("delay", spec.delay)] {
                if !(value.is_finite() && value >= 0.0) {
                    return Err(ScenarioError::InvalidTime {
                        tween,
                        field,
                        value,
                    });
                }
            }

            if let Some(value) = spec.to.keys().find(|k| !self.values.contains_key(*k)) {
                return Err(ScenarioError::UnknownValue {
                    tween,
                    value: value.clone(),
                });
            }

            if let Some(after) = &spec.after {
                if spec.after_all_else {
                    return Err(ScenarioError::ConflictingChain { tween });
                }
                if !declared.contains(after.as_str()) {
                    return Err(ScenarioError::UnknownParent {
                        tween,
                        after: after.clone(),
                    });
                }
            }

            if let Err(source) = spec.easing() {
                return Err(ScenarioError::Easing { tween, source });
            }

            if let Some(name) = &spec.name {
                if !declared.insert(name.as_str()) {
                    return Err(ScenarioError::DuplicateName(name.clone()));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAIN: &str = r#"
[settings]
dt = 0.25

[values]
y = 0.0

[[tween]]
name = "rise"
duration = 1.0
to = { y = 5.0 }

[[tween]]
duration = 1.0
after = "rise"
to = { y = 0.0 }
"#;

    #[test]
    fn test_parse_chain() {
        let scenario = Scenario::from_toml(CHAIN).unwrap();
        assert_eq!(scenario.settings.dt, 0.25);
        assert_eq!(scenario.settings.every, 1);
        assert_eq!(scenario.values["y"], 0.0);
        assert_eq!(scenario.tweens.len(), 2);
        assert_eq!(scenario.tweens[1].after.as_deref(), Some("rise"));
        assert_eq!(scenario.tweens[1].label(1), "#1");
        assert_eq!(scenario.validate(), Ok(()));
    }

    #[test]
    fn test_defaults() {
        let scenario = Scenario::from_toml("").unwrap();
        assert_eq!(scenario.settings.dt, 1.0 / 60.0);
        assert!(scenario.settings.max_time.is_none());
        assert!(scenario.tweens.is_empty());
        assert_eq!(scenario.validate(), Ok(()));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Scenario::from_toml("[[tween]]\nduration = 1.0\nspeed = 2.0\n").unwrap_err();
        assert!(format!("{err:#}").contains("speed"));
    }

    #[test]
    fn test_easing_names() {
        let scenario = Scenario::from_toml(
            "[values]\nx = 0.0\n[[tween]]\nduration = 1.0\nease = \"linear\"\nto = { x = 1.0 }\n",
        )
        .unwrap();
        assert_eq!(scenario.tweens[0].easing(), Ok(Easing::Linear));

        let scenario =
            Scenario::from_toml("[[tween]]\nname = \"a\"\nduration = 1.0\nease = \"bounce\"\n")
                .unwrap();
        let err = scenario.validate().unwrap_err();
        assert_eq!(err.to_string(), "tween a: unknown easing `bounce`");
    }

    #[test]
    fn test_unknown_value() {
        let scenario = Scenario::from_toml("[[tween]]\nduration = 1.0\nto = { z = 1.0 }\n").unwrap();
        assert_eq!(
            scenario.validate(),
            Err(ScenarioError::UnknownValue {
                tween: "#0".into(),
                value: "z".into()
            })
        );
    }

    #[test]
    fn test_forward_reference_rejected() {
        let scenario = Scenario::from_toml(
            "[[tween]]\nduration = 1.0\nafter = \"later\"\n[[tween]]\nname = \"later\"\nduration = 1.0\n",
        )
        .unwrap();
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::UnknownParent { .. })
        ));
    }

    #[test]
    fn test_duplicate_and_invalid_times() {
        let scenario = Scenario::from_toml(
            "[[tween]]\nname = \"a\"\nduration = 1.0\n[[tween]]\nname = \"a\"\nduration = 1.0\n",
        )
        .unwrap();
        assert_eq!(
            scenario.validate(),
            Err(ScenarioError::DuplicateName("a".into()))
        );

        let scenario = Scenario::from_toml("[[tween]]\nduration = -1.0\n").unwrap();
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::InvalidTime {
                field: "duration",
                ..
            })
        ));

        let scenario = Scenario::from_toml("[settings]\ndt = 0.0\n").unwrap();
        assert_eq!(
            scenario.validate(),
            Err(ScenarioError::InvalidTimestep(0.0))
        );
    }

    #[test]
    fn test_bundled_scenarios_are_valid() {
        for input in [
            include_str!("../scenarios/chain.toml"),
            include_str!("../scenarios/hazard.toml"),
        ] {
            let scenario = Scenario::from_toml(input).unwrap();
            assert_eq!(scenario.validate(), Ok(()));
        }
    }

    #[test]
    fn test_conflicting_chain() {
        let scenario = Scenario::from_toml(
            "[[tween]]\nname = \"a\"\nduration = 1.0\n[[tween]]\nduration = 1.0\nafter = \"a\"\nafter_all_else = true\n",
        )
        .unwrap();
        assert_eq!(
            scenario.validate(),
            Err(ScenarioError::ConflictingChain { tween: "#1".into() })
        );
    }
}
