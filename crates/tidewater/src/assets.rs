//! Reading scene assets from disk.
//!
//! Every file is optional. A file that fails to load is reported in
//! [`AssetBundle::failures`] and its slot keeps the procedural placeholder.

use std::path::Path;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::JoinHandle;

use glam::Vec3;
use tidewater_core::{
    AssetManifest, AssetPaths, EnvironmentMap, MeshData, Result, TextureImage, TidewaterError,
};

/// What a load produced.
#[derive(Debug)]
pub struct AssetBundle {
    pub manifest: AssetManifest,
    /// Files that could not be used.
    pub failures: Vec<TidewaterError>,
}

fn load_error(path: &Path, reason: impl ToString) -> TidewaterError {
    TidewaterError::AssetLoad {
        name: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Reads every object of an OBJ file as a named mesh.
pub fn load_obj_meshes(path: &Path) -> Result<Vec<(String, MeshData)>> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|e| load_error(path, e))?;

    models
        .into_iter()
        .map(|model| -> Result<(String, MeshData)> {
            let mesh = model.mesh;
            let positions: Vec<Vec3> = mesh
                .positions
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0], p[1], p[2]))
                .collect();
            // normals are only usable if they line up with positions
            let normals: Vec<Vec3> = if mesh.normals.len() == mesh.positions.len() {
                mesh.normals
                    .chunks_exact(3)
                    .map(|n| Vec3::new(n[0], n[1], n[2]))
                    .collect()
            } else {
                Vec::new()
            };
            let data = MeshData::new(positions, normals, mesh.indices)
                .map_err(|e| load_error(path, format!("object '{}': {e}", model.name)))?;
            Ok((model.name, data))
        })
        .collect()
}

/// Reads an image as RGBA8.
pub fn load_texture(path: &Path) -> Result<TextureImage> {
    let img = image::open(path).map_err(|e| load_error(path, e))?.to_rgba8();
    let (width, height) = img.dimensions();
    TextureImage::from_rgba8(width, height, img.into_raw())
}

/// Reads an equirectangular image (HDR or LDR) as linear RGBA32F.
pub fn load_environment(path: &Path) -> Result<EnvironmentMap> {
    let img = image::open(path).map_err(|e| load_error(path, e))?.to_rgba32f();
    let (width, height) = img.dimensions();
    let texels = img
        .into_raw()
        .chunks_exact(4)
        .map(|c| [c[0], c[1], c[2], c[3]])
        .collect();
    Ok(EnvironmentMap {
        width,
        height,
        texels,
    })
}

/// Loads everything `paths` names. Never fails as a whole.
pub fn load_bundle(paths: &AssetPaths, decor_color: Vec3) -> AssetBundle {
    let mut manifest = AssetManifest::new();
    manifest.decor_color = decor_color;
    let mut failures = Vec::new();

    if let Some(path) = &paths.scene {
        match load_obj_meshes(path) {
            Ok(named) => {
                let filled = manifest.resolve_named(named);
                log::info!("scene {}: filled {filled:?}", path.display());
            }
            Err(e) => failures.push(e),
        }
    }
    if let Some(path) = &paths.environment {
        match load_environment(path) {
            Ok(environment) => manifest.environment = Some(environment),
            Err(e) => failures.push(e),
        }
    }
    if let Some(path) = &paths.foam_mask {
        match load_texture(path) {
            Ok(texture) => manifest.foam_mask = Some(texture),
            Err(e) => failures.push(e),
        }
    }
    if let Some(path) = &paths.normal_map {
        match load_texture(path) {
            Ok(texture) => manifest.normal_map = Some(texture),
            Err(e) => failures.push(e),
        }
    }

    for failure in &failures {
        log::warn!("{failure}; keeping placeholder");
    }
    AssetBundle { manifest, failures }
}

/// Loads a bundle on a background thread.
pub struct AssetLoader {
    receiver: Receiver<AssetBundle>,
    handle: Option<JoinHandle<()>>,
}

impl AssetLoader {
    pub fn spawn(paths: AssetPaths, decor_color: Vec3) -> Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("tidewater-assets".to_string())
            .spawn(move || {
                let bundle = load_bundle(&paths, decor_color);
                // the app may have exited already
                let _ = sender.send(bundle);
            })?;
        Ok(Self {
            receiver,
            handle: Some(handle),
        })
    }

    /// Returns the bundle once it is ready. Never blocks.
    pub fn poll(&mut self) -> Option<AssetBundle> {
        match self.receiver.try_recv() {
            Ok(bundle) => {
                if let Some(handle) = self.handle.take() {
                    let _ = handle.join();
                }
                Some(bundle)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                if self.handle.take().is_some() {
                    log::warn!("asset loader stopped without delivering");
                }
                None
            }
        }
    }

    /// Whether the loader thread is still expected to deliver.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.handle.is_some()
    }
}
