//! Keyboard tuning of the water and scene visibility.
//!
//! | Key | Effect |
//! |---|---|
//! | `1` / `2` | toggle `poolBig` / `poolSmall` |
//! | `R` | reflection on/off |
//! | `S` | specular on/off |
//! | `F` | solid foam on/off |
//! | `[` / `]` | distortion amplitude down/up |
//! | `-` / `=` | max depth down/up |

use tidewater_core::{MeshSlot, SceneVisibility, WaterTuning};
use winit::keyboard::KeyCode;

/// One change a key press makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuningAction {
    TogglePoolBig,
    TogglePoolSmall,
    ToggleReflection,
    ToggleSpecular,
    ToggleSolidFoam,
    DecreaseAmplitude,
    IncreaseAmplitude,
    DecreaseMaxDepth,
    IncreaseMaxDepth,
}

impl TuningAction {
    #[must_use]
    pub fn from_key(code: KeyCode) -> Option<Self> {
        let action = match code {
            KeyCode::Digit1 => Self::TogglePoolBig,
            KeyCode::Digit2 => Self::TogglePoolSmall,
            KeyCode::KeyR => Self::ToggleReflection,
            KeyCode::KeyS => Self::ToggleSpecular,
            KeyCode::KeyF => Self::ToggleSolidFoam,
            KeyCode::BracketLeft => Self::DecreaseAmplitude,
            KeyCode::BracketRight => Self::IncreaseAmplitude,
            KeyCode::Minus => Self::DecreaseMaxDepth,
            KeyCode::Equal => Self::IncreaseMaxDepth,
            _ => return None,
        };
        Some(action)
    }

    /// Whether holding the key should keep applying the action.
    #[must_use]
    pub fn repeats(self) -> bool {
        matches!(
            self,
            Self::DecreaseAmplitude
                | Self::IncreaseAmplitude
                | Self::DecreaseMaxDepth
                | Self::IncreaseMaxDepth
        )
    }

    /// Applies the action and returns a description of the new state.
    pub fn apply(self, tuning: &mut WaterTuning, visibility: &mut SceneVisibility) -> String {
        match self {
            Self::TogglePoolBig => {
                let shown = visibility.toggle(MeshSlot::PoolBig);
                format!("poolBig {}", on_off(shown))
            }
            Self::TogglePoolSmall => {
                let shown = visibility.toggle(MeshSlot::PoolSmall);
                format!("poolSmall {}", on_off(shown))
            }
            Self::ToggleReflection => {
                tuning.reflection_enabled = !tuning.reflection_enabled;
                format!("reflection {}", on_off(tuning.reflection_enabled))
            }
            Self::ToggleSpecular => {
                tuning.specular_enabled = !tuning.specular_enabled;
                format!("specular {}", on_off(tuning.specular_enabled))
            }
            Self::ToggleSolidFoam => {
                tuning.solid_foam = !tuning.solid_foam;
                format!("solid foam {}", on_off(tuning.solid_foam))
            }
            Self::DecreaseAmplitude | Self::IncreaseAmplitude => {
                let step = if self == Self::IncreaseAmplitude {
                    WaterTuning::AMPLITUDE_STEP
                } else {
                    -WaterTuning::AMPLITUDE_STEP
                };
                tuning.distortion_amplitude = snap(tuning.distortion_amplitude + step, WaterTuning::AMPLITUDE_STEP);
                format!("distortion amplitude {:.3}", tuning.distortion_amplitude)
            }
            Self::DecreaseMaxDepth | Self::IncreaseMaxDepth => {
                let step = if self == Self::IncreaseMaxDepth {
                    WaterTuning::MAX_DEPTH_STEP
                } else {
                    -WaterTuning::MAX_DEPTH_STEP
                };
                tuning.max_depth = snap(tuning.max_depth + step, WaterTuning::MAX_DEPTH_STEP);
                format!("max depth {:.2}", tuning.max_depth)
            }
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

/// Rounds to the step grid and keeps the value non-negative, so repeated
/// presses do not accumulate float drift.
fn snap(value: f32, step: f32) -> f32 {
    ((value / step).round() * step).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(TuningAction::from_key(KeyCode::Digit1), Some(TuningAction::TogglePoolBig));
        assert_eq!(TuningAction::from_key(KeyCode::KeyR), Some(TuningAction::ToggleReflection));
        assert_eq!(TuningAction::from_key(KeyCode::Equal), Some(TuningAction::IncreaseMaxDepth));
        assert_eq!(TuningAction::from_key(KeyCode::KeyW), None);
    }

    #[test]
    fn test_toggles() {
        let mut tuning = WaterTuning::default();
        let mut visibility = SceneVisibility::default();

        let msg = TuningAction::TogglePoolSmall.apply(&mut tuning, &mut visibility);
        assert!(visibility.pool_small);
        assert_eq!(msg, "poolSmall on");

        TuningAction::ToggleReflection.apply(&mut tuning, &mut visibility);
        assert!(!tuning.reflection_enabled);
        TuningAction::ToggleSolidFoam.apply(&mut tuning, &mut visibility);
        assert!(tuning.solid_foam);
    }

    #[test]
    fn test_amplitude_steps_and_floor() {
        let mut tuning = WaterTuning::default();
        let mut visibility = SceneVisibility::default();
        TuningAction::IncreaseAmplitude.apply(&mut tuning, &mut visibility);
        assert!((tuning.distortion_amplitude - 0.006).abs() < 1e-6);

        for _ in 0..20 {
            TuningAction::DecreaseAmplitude.apply(&mut tuning, &mut visibility);
        }
        assert_eq!(tuning.distortion_amplitude, 0.0);
    }

    #[test]
    fn test_max_depth_reaches_zero() {
        let mut tuning = WaterTuning::default();
        let mut visibility = SceneVisibility::default();
        for _ in 0..10 {
            TuningAction::DecreaseMaxDepth.apply(&mut tuning, &mut visibility);
        }
        assert_eq!(tuning.max_depth, 0.0);
        TuningAction::IncreaseMaxDepth.apply(&mut tuning, &mut visibility);
        assert_eq!(tuning.max_depth, 0.25);
    }

    #[test]
    fn test_only_adjustments_repeat() {
        assert!(TuningAction::IncreaseAmplitude.repeats());
        assert!(!TuningAction::TogglePoolBig.repeats());
    }

    proptest! {
        #[test]
        fn prop_adjustments_never_negative(presses in proptest::collection::vec(0u8..4, 0..64)) {
            let mut tuning = WaterTuning::default();
            let mut visibility = SceneVisibility::default();
            for press in presses {
                let action = match press {
                    0 => TuningAction::DecreaseAmplitude,
                    1 => TuningAction::IncreaseAmplitude,
                    2 => TuningAction::DecreaseMaxDepth,
                    _ => TuningAction::IncreaseMaxDepth,
                };
                action.apply(&mut tuning, &mut visibility);
            }
            prop_assert!(tuning.distortion_amplitude >= 0.0);
            prop_assert!(tuning.max_depth >= 0.0);
        }
    }
}
