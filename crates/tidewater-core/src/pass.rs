//! The per-frame pass table.
//!
//! | Pass | Target | Water | Submerged | Clip plane |
//! |---|---|---|---|---|
//! | below-water | below-water target | no | yes | off |
//! | reflection | reflection target | no | no | on |
//! | composite | screen | yes | yes | off |
//!
//! Which meshes a pass draws is a predicate over [`MeshSlot`] combined with the
//! user's [`SceneVisibility`]; nothing toggles mesh flags between passes.

use crate::assets::{MeshSlot, SceneVisibility};

/// One of the three passes, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    BelowWater,
    Reflection,
    Composite,
}

/// Where a pass renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassTarget {
    BelowWater,
    Reflection,
    Screen,
}

/// Which camera a pass renders through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassCamera {
    Main,
    Reflection,
}

/// Static description of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassConfig {
    pub target: PassTarget,
    pub camera: PassCamera,
    pub draw_water: bool,
    pub draw_submerged: bool,
    pub clip_plane: bool,
}

impl PassConfig {
    /// Whether this pass draws `slot`, ignoring user visibility.
    pub fn includes(&self, slot: MeshSlot) -> bool {
        match slot {
            MeshSlot::Water => self.draw_water,
            s if s.is_submerged() => self.draw_submerged,
            _ => true,
        }
    }

    /// Whether `slot` is drawn in this pass given the user's visibility.
    pub fn draws(&self, slot: MeshSlot, visibility: &SceneVisibility) -> bool {
        visibility.is_visible(slot) && self.includes(slot)
    }

    /// The slots drawn in this pass, in scene order.
    pub fn drawn_slots(&self, visibility: &SceneVisibility) -> Vec<MeshSlot> {
        MeshSlot::SCENE
            .into_iter()
            .filter(|slot| self.draws(*slot, visibility))
            .collect()
    }
}

impl PassKind {
    /// Execution order within a frame.
    pub const ORDER: [PassKind; 3] = [PassKind::BelowWater, PassKind::Reflection, PassKind::Composite];

    pub fn config(self) -> PassConfig {
        match self {
            PassKind::BelowWater => PassConfig {
                target: PassTarget::BelowWater,
                camera: PassCamera::Main,
                draw_water: false,
                draw_submerged: true,
                clip_plane: false,
            },
            PassKind::Reflection => PassConfig {
                target: PassTarget::Reflection,
                camera: PassCamera::Reflection,
                draw_water: false,
                draw_submerged: false,
                clip_plane: true,
            },
            PassKind::Composite => PassConfig {
                target: PassTarget::Screen,
                camera: PassCamera::Main,
                draw_water: true,
                draw_submerged: true,
                clip_plane: false,
            },
        }
    }

    /// Debug label for GPU passes and logs.
    pub fn label(self) -> &'static str {
        match self {
            PassKind::BelowWater => "below-water pass",
            PassKind::Reflection => "reflection pass",
            PassKind::Composite => "composite pass",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_table() {
        let below = PassKind::BelowWater.config();
        assert!(!below.draw_water && below.draw_submerged && !below.clip_plane);
        assert_eq!(below.target, PassTarget::BelowWater);

        let reflection = PassKind::Reflection.config();
        assert!(!reflection.draw_water && !reflection.draw_submerged && reflection.clip_plane);
        assert_eq!(reflection.camera, PassCamera::Reflection);

        let composite = PassKind::Composite.config();
        assert!(composite.draw_water && composite.draw_submerged && !composite.clip_plane);
        assert_eq!(composite.target, PassTarget::Screen);
    }

    #[test]
    fn test_drawn_slots_follow_visibility() {
        let vis = SceneVisibility::default();
        assert_eq!(
            PassKind::BelowWater.config().drawn_slots(&vis),
            vec![MeshSlot::PoolBig, MeshSlot::Decor]
        );
        assert_eq!(
            PassKind::Reflection.config().drawn_slots(&vis),
            vec![MeshSlot::Decor]
        );
        assert_eq!(
            PassKind::Composite.config().drawn_slots(&vis),
            vec![MeshSlot::PoolBig, MeshSlot::Decor, MeshSlot::Water]
        );
    }

    #[test]
    fn test_hidden_pool_never_drawn() {
        let vis = SceneVisibility {
            pool_big: false,
            pool_small: true,
            decor: false,
        };
        for kind in PassKind::ORDER {
            let slots = kind.config().drawn_slots(&vis);
            assert!(!slots.contains(&MeshSlot::PoolBig));
            assert!(!slots.contains(&MeshSlot::Decor));
        }
        assert!(PassKind::Composite
            .config()
            .drawn_slots(&vis)
            .contains(&MeshSlot::PoolSmall));
    }
}
