//! Ephemeris session backed by ANISE.
//!
//! ANISE is a pure Rust replacement for NASA SPICE. It evaluates binary SPK
//! and PCK data; text kernels (frames, instruments, clocks) go into the
//! session's own [`KernelPool`].

use anise::astro::Aberration;
use anise::prelude::{Almanac, Frame};
use glam::{DMat3, DVec3};
use hifitime::Epoch;
use std::path::{Path, PathBuf};

use crate::error::{EphemerisError, EphemerisResult};
use crate::kernel_pool::KernelPool;
use crate::meta_kernel::{kernels_to_load, KernelKind};
use crate::source::{Correction, EphemerisSource};

impl Correction {
    fn aberration(&self) -> Option<Aberration> {
        match self {
            Correction::None => None,
            Correction::LightTime => Aberration::LT,
            Correction::LightTimeStellar => Aberration::LT_S,
        }
    }
}

/// Loaded kernels plus the text kernel pool, owned by the caller
pub struct AniseSession {
    almanac: Almanac,
    pool: KernelPool,
    loaded: Vec<PathBuf>,
}

impl Default for AniseSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AniseSession {
    /// Empty session with no kernels
    pub fn new() -> Self {
        Self {
            almanac: Almanac::default(),
            pool: KernelPool::new(),
            loaded: Vec::new(),
        }
    }

    /// Open a session from a SPICE meta-kernel
    pub fn open(meta_kernel: &Path) -> EphemerisResult<Self> {
        let mut session = Self::new();
        session.load(meta_kernel)?;
        Ok(session)
    }

    /// Load one kernel. Meta-kernels (`.tm`) load everything they list.
    pub fn load(&mut self, path: &Path) -> EphemerisResult<()> {
        if !path.exists() {
            return Err(EphemerisError::KernelLoad {
                path: path.to_path_buf(),
                reason: "file not found".to_string(),
            });
        }

        match KernelKind::from_path(path) {
            KernelKind::Binary => {
                tracing::info!("Loading binary kernel: {:?}", path);
                let path_str = path.to_str().ok_or_else(|| EphemerisError::KernelLoad {
                    path: path.to_path_buf(),
                    reason: "path is not valid UTF-8".to_string(),
                })?;
                self.almanac = self.almanac.load(path_str).map_err(|e| EphemerisError::KernelLoad {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
            }
            KernelKind::Text => {
                tracing::info!("Loading text kernel: {:?}", path);
                let mut scratch = KernelPool::new();
                scratch.load_file(path)?;
                let is_meta = scratch.contains("KERNELS_TO_LOAD");
                self.pool.load_file(path)?;

                let unrotatable = frames_without_orientation(&scratch);
                if !unrotatable.is_empty() {
                    tracing::warn!(
                        "{:?}: frames {} are known by name only; ANISE has no orientation data for CK or TK frames from text kernels",
                        path,
                        unrotatable.join(", ")
                    );
                }

                if is_meta {
                    let base = path.parent();
                    for kernel in kernels_to_load(&scratch, base)? {
                        self.load(&kernel)?;
                    }
                } else if path
                    .extension()
                    .map(|e| e.eq_ignore_ascii_case("tpc"))
                    .unwrap_or(false)
                {
                    tracing::warn!(
                        "{:?}: text PCK constants are kept in the kernel pool only; body-fixed rotations need the ANISE .pca form",
                        path
                    );
                }
            }
            KernelKind::Unsupported => {
                tracing::warn!("Skipping kernel {:?}: type not supported by the ANISE backend", path);
                return Ok(());
            }
        }

        self.loaded.push(path.to_path_buf());
        Ok(())
    }

    /// Kernels loaded so far, in load order
    pub fn loaded(&self) -> &[PathBuf] {
        &self.loaded
    }

    /// Drop every loaded kernel and pool variable
    pub fn unload_all(&mut self) {
        tracing::info!("Unloading {} kernels", self.loaded.len());
        self.almanac = Almanac::default();
        self.pool.clear();
        self.loaded.clear();
    }
}

/// CK (class 3) and TK (class 4) frames defined in a frame kernel.
/// Their ids resolve but the almanac cannot rotate into them.
pub(crate) fn frames_without_orientation(pool: &KernelPool) -> Vec<String> {
    let mut frames: Vec<String> = pool
        .names()
        .filter_map(|var| {
            let name = var.strip_prefix("FRAME_")?;
            let id = pool.first_number(var)? as i64;
            let class = pool.first_number(&format!("FRAME_{}_CLASS", id))?;
            (class == 3.0 || class == 4.0).then(|| name.to_string())
        })
        .collect();
    frames.sort();
    frames
}

impl EphemerisSource for AniseSession {
    fn position(
        &self,
        target: &str,
        observer: &str,
        frame: &str,
        epoch: Epoch,
        correction: Correction,
    ) -> EphemerisResult<DVec3> {
        let target_id = self.body_id(target)?;
        let observer_id = self.body_id(observer)?;
        let orientation_id = self.frame_id(frame)?;

        let state = self
            .almanac
            .transform(
                Frame::new(target_id, orientation_id),
                Frame::new(observer_id, orientation_id),
                epoch,
                correction.aberration(),
            )
            .map_err(|e| {
                EphemerisError::query(
                    format!("{} relative to {} in {} ({})", target, observer, frame, correction),
                    epoch,
                    e,
                )
            })?;

        Ok(DVec3::new(state.radius_km.x, state.radius_km.y, state.radius_km.z))
    }

    fn rotation(&self, from: &str, to: &str, epoch: Epoch) -> EphemerisResult<DMat3> {
        let from_id = self.frame_id(from)?;
        let to_id = self.frame_id(to)?;

        // Orientation queries only care about the orientation id
        let dcm = self
            .almanac
            .rotate(Frame::new(0, from_id), Frame::new(0, to_id), epoch)
            .map_err(|e| EphemerisError::query(format!("rotation {} -> {}", from, to), epoch, e))?;

        let m = dcm.rot_mat;
        Ok(DMat3::from_cols(
            DVec3::new(m[(0, 0)], m[(1, 0)], m[(2, 0)]),
            DVec3::new(m[(0, 1)], m[(1, 1)], m[(2, 1)]),
            DVec3::new(m[(0, 2)], m[(1, 2)], m[(2, 2)]),
        ))
    }

    fn kernel_pool(&self) -> &KernelPool {
        &self.pool
    }
}
