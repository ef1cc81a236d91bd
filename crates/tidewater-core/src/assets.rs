//! Typed asset manifest.
//!
//! Meshes are looked up once by name when an asset bundle arrives and stored in
//! named slots; nothing traverses a scene tree at render time.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::mesh::MeshData;
use crate::texture::TextureImage;

/// A named mesh slot of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshSlot {
    PoolBig,
    PoolSmall,
    /// Optional decorative mesh.
    Decor,
    /// The water plane itself.
    Water,
}

impl MeshSlot {
    /// Draw order of the scene's slots.
    pub const SCENE: [MeshSlot; 4] = [
        MeshSlot::PoolBig,
        MeshSlot::PoolSmall,
        MeshSlot::Decor,
        MeshSlot::Water,
    ];

    /// Name of the object in the source asset.
    pub fn name(self) -> &'static str {
        match self {
            MeshSlot::PoolBig => "poolBig",
            MeshSlot::PoolSmall => "poolSmall",
            MeshSlot::Decor => "suzanne",
            MeshSlot::Water => "water",
        }
    }

    /// Resolves an object name to a slot.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::SCENE.into_iter().find(|slot| slot.name() == name)
    }

    /// Whether the slot belongs to the submerged geometry group.
    pub fn is_submerged(self) -> bool {
        matches!(self, MeshSlot::PoolBig | MeshSlot::PoolSmall)
    }
}

/// User-controlled mesh visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneVisibility {
    pub pool_big: bool,
    pub pool_small: bool,
    pub decor: bool,
}

impl SceneVisibility {
    /// Whether the user wants `slot` drawn. The water plane is always visible.
    pub fn is_visible(&self, slot: MeshSlot) -> bool {
        match slot {
            MeshSlot::PoolBig => self.pool_big,
            MeshSlot::PoolSmall => self.pool_small,
            MeshSlot::Decor => self.decor,
            MeshSlot::Water => true,
        }
    }

    /// Flips the visibility of a pool. Returns the new value.
    pub fn toggle(&mut self, slot: MeshSlot) -> bool {
        let flag = match slot {
            MeshSlot::PoolBig => &mut self.pool_big,
            MeshSlot::PoolSmall => &mut self.pool_small,
            MeshSlot::Decor => &mut self.decor,
            MeshSlot::Water => return true,
        };
        *flag = !*flag;
        *flag
    }
}

impl Default for SceneVisibility {
    fn default() -> Self {
        Self {
            pool_big: true,
            pool_small: false,
            decor: true,
        }
    }
}

/// Equirectangular environment image in linear RGBA32F.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentMap {
    pub width: u32,
    pub height: u32,
    pub texels: Vec<[f32; 4]>,
}

/// Everything the scene needs from disk, resolved into named slots.
///
/// Missing entries fall back to procedural placeholders via the accessor methods.
#[derive(Debug, Clone, Default)]
pub struct AssetManifest {
    meshes: HashMap<MeshSlot, MeshData>,
    pub environment: Option<EnvironmentMap>,
    pub foam_mask: Option<TextureImage>,
    pub normal_map: Option<TextureImage>,
    /// Material color of the decorative mesh.
    pub decor_color: Vec3,
}

impl AssetManifest {
    /// Half extent of the placeholder pools.
    pub const BIG_POOL_HALF_EXTENT: f32 = 4.0;

    pub fn new() -> Self {
        Self {
            decor_color: Vec3::new(0.8, 0.3, 0.2),
            ..Self::default()
        }
    }

    /// Stores every named mesh whose name matches a slot; other names are ignored.
    ///
    /// Returns the slots that were filled.
    pub fn resolve_named<I>(&mut self, named: I) -> Vec<MeshSlot>
    where
        I: IntoIterator<Item = (String, MeshData)>,
    {
        let mut filled = Vec::new();
        for (name, mesh) in named {
            match MeshSlot::from_name(&name) {
                Some(slot) => {
                    log::debug!("asset '{name}' resolved to {slot:?}");
                    self.meshes.insert(slot, mesh);
                    filled.push(slot);
                }
                None => log::debug!("ignoring unrecognised mesh '{name}'"),
            }
        }
        filled
    }

    /// Places a mesh into a slot directly.
    pub fn set_mesh(&mut self, slot: MeshSlot, mesh: MeshData) {
        self.meshes.insert(slot, mesh);
    }

    /// Returns the loaded mesh for a slot, if any.
    pub fn loaded_mesh(&self, slot: MeshSlot) -> Option<&MeshData> {
        self.meshes.get(&slot)
    }

    /// Returns the mesh for a slot, substituting a placeholder when it is missing.
    ///
    /// The decorative mesh has no placeholder and yields `None` when absent.
    pub fn mesh(&self, slot: MeshSlot) -> Option<MeshData> {
        if let Some(mesh) = self.meshes.get(&slot) {
            return Some(mesh.clone());
        }
        Self::placeholder_mesh(slot)
    }

    /// Procedural stand-in for a slot.
    pub fn placeholder_mesh(slot: MeshSlot) -> Option<MeshData> {
        match slot {
            MeshSlot::PoolBig => Some(MeshData::pool_basin(Self::BIG_POOL_HALF_EXTENT, 2.5)),
            MeshSlot::PoolSmall => Some(MeshData::pool_basin(2.0, 1.0)),
            MeshSlot::Water => Some(MeshData::plane(20.0)),
            MeshSlot::Decor => None,
        }
    }

    /// Foam mask, or the procedural one.
    pub fn foam_mask_or_placeholder(&self) -> TextureImage {
        self.foam_mask
            .clone()
            .unwrap_or_else(|| TextureImage::procedural_foam(128))
    }

    /// Normal map, or the procedural one.
    pub fn normal_map_or_placeholder(&self) -> TextureImage {
        self.normal_map
            .clone()
            .unwrap_or_else(|| TextureImage::procedural_normal_map(128))
    }
}
