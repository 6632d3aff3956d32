//! Run configuration (JSON).
//!
//! Keys follow snake_case names; the short names used by older config files
//! (`metakernel`, `utc0`, `tsamples`, `pxlines`, ...) are accepted as aliases,
//! as are the legacy target layouts (`targetsname`/`targetsframe`/`targetsobj`
//! arrays, or a single `target`/`target_frame`/`targetobj`/`texture`).

use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use spirec_ephem::Correction;

use crate::error::{PipelineError, PipelineResult};
use crate::sample_id::{SampleId, MAX_SAMPLE_ID};

/// One body to render
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    pub frame: String,
    /// Wavefront OBJ, km
    pub mesh: PathBuf,
    #[serde(default, deserialize_with = "non_empty_path")]
    pub texture: Option<PathBuf>,
}

/// What sits at the scene origin
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneOrigin {
    /// Camera at the origin, any number of targets placed around it
    #[default]
    Observer,
    /// The single target at the origin, camera placed relative to it
    Target,
}

/// Output image file naming
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageNaming {
    /// `SIM_x000001.PNG`
    #[default]
    SampleId,
    /// `<observer>_<UTC>.PNG`
    Utc,
}

impl ImageNaming {
    pub fn file_name(&self, id: SampleId, observer: &str, utc: &str) -> String {
        match self {
            ImageNaming::SampleId => format!("SIM_x{}.PNG", id),
            ImageNaming::Utc => format!("{}_{}.PNG", observer, utc),
        }
    }
}

/// Validated run configuration
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawSceneConfig")]
pub struct SceneConfig {
    pub targets: Vec<TargetConfig>,
    pub smooth: bool,
    pub meta_kernel: PathBuf,
    pub output_dir: PathBuf,
    pub start: String,
    pub end: String,
    pub samples: usize,
    pub observer: String,
    pub observer_frame: Option<String>,
    /// Instrument whose kernel parameters fill in missing camera settings
    pub camera: Option<String>,
    pub camera_frame: Option<String>,
    pub illumination_source: String,
    pub yfov_deg: Option<f64>,
    pub aspect_ratio: Option<f64>,
    pub pixel_lines: Option<u32>,
    pub pixel_samples: Option<u32>,
    pub light_factor: f64,
    pub display: bool,
    pub save: bool,
    pub label_file: bool,
    pub origin: SceneOrigin,
    pub image_naming: ImageNaming,
    pub aberration: Correction,
    pub znear_km: f64,
}

impl SceneConfig {
    pub fn from_file(path: &Path) -> PipelineResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let config = Self::from_json(&text)?;
        tracing::info!(
            "Loaded config {:?}: {} target(s), {} samples",
            path,
            config.targets.len(),
            config.samples
        );
        Ok(config)
    }

    pub fn from_json(text: &str) -> PipelineResult<Self> {
        serde_json::from_str(text).map_err(|e| match e.classify() {
            serde_json::error::Category::Data => PipelineError::Configuration(e.to_string()),
            _ => PipelineError::Json(e),
        })
    }

    /// Instrument name used for kernel lookups
    pub fn camera_name(&self) -> &str {
        self.camera.as_deref().unwrap_or(&self.observer)
    }

    fn validate(&self) -> Result<(), String> {
        if self.targets.is_empty() {
            return Err("at least one target is required".to_string());
        }
        if self.origin == SceneOrigin::Target && self.targets.len() != 1 {
            return Err(format!(
                "origin \"target\" needs exactly one target, got {}",
                self.targets.len()
            ));
        }
        if self.samples == 0 {
            return Err("samples must be at least 1".to_string());
        }
        if self.samples > MAX_SAMPLE_ID as usize {
            return Err(format!(
                "samples = {} exceeds the largest sample id {}",
                self.samples, MAX_SAMPLE_ID
            ));
        }
        if let Some(yfov) = self.yfov_deg {
            if !(yfov > 0.0 && yfov < 180.0) {
                return Err(format!("yfov_deg must be in (0, 180), got {}", yfov));
            }
        }
        if let Some(ar) = self.aspect_ratio {
            if !(ar.is_finite() && ar > 0.0) {
                return Err(format!("aspect_ratio must be positive, got {}", ar));
            }
        }
        if !(self.light_factor.is_finite() && self.light_factor >= 0.0) {
            return Err(format!("light_factor must be non-negative, got {}", self.light_factor));
        }
        if !(self.znear_km.is_finite() && self.znear_km > 0.0) {
            return Err(format!("znear_km must be positive, got {}", self.znear_km));
        }
        if self.observer.trim().is_empty() {
            return Err("observer is required".to_string());
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct RawSceneConfig {
    #[serde(default)]
    targets: Vec<TargetConfig>,
    #[serde(default)]
    targetsname: Vec<String>,
    #[serde(default)]
    targetsframe: Vec<String>,
    #[serde(default)]
    targetsobj: Vec<PathBuf>,
    #[serde(default, deserialize_with = "non_empty_string")]
    target: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    target_frame: Option<String>,
    #[serde(default, deserialize_with = "non_empty_path")]
    targetobj: Option<PathBuf>,
    #[serde(default, deserialize_with = "non_empty_path")]
    texture: Option<PathBuf>,

    #[serde(default, deserialize_with = "flag")]
    smooth: bool,
    #[serde(alias = "metakernel")]
    meta_kernel: PathBuf,
    #[serde(alias = "output")]
    output_dir: PathBuf,
    #[serde(alias = "utc0")]
    start: String,
    #[serde(alias = "utcf")]
    end: String,
    #[serde(alias = "tsamples")]
    samples: usize,
    observer: String,
    #[serde(default, deserialize_with = "non_empty_string")]
    observer_frame: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    camera: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    camera_frame: Option<String>,
    #[serde(default = "default_illuminator", alias = "illumsource")]
    illumination_source: String,
    #[serde(default, deserialize_with = "loose_number")]
    yfov_deg: Option<f64>,
    /// Older configs: degrees for observer-centred runs, radians for
    /// target-centred ones
    #[serde(default, deserialize_with = "loose_number")]
    yfov: Option<f64>,
    #[serde(default, alias = "aspectratio", deserialize_with = "loose_number")]
    aspect_ratio: Option<f64>,
    #[serde(default, alias = "pxlines", deserialize_with = "loose_count")]
    pixel_lines: Option<u32>,
    #[serde(default, alias = "pxsamples", deserialize_with = "loose_count")]
    pixel_samples: Option<u32>,
    #[serde(default = "default_light_factor", alias = "lightfactor")]
    light_factor: f64,
    #[serde(default, alias = "plot", deserialize_with = "flag")]
    display: bool,
    #[serde(default = "default_true", deserialize_with = "flag")]
    save: bool,
    #[serde(default, alias = "labelfile", deserialize_with = "flag")]
    label_file: bool,
    #[serde(default)]
    origin: SceneOrigin,
    #[serde(default)]
    image_naming: ImageNaming,
    #[serde(default)]
    aberration: Correction,
    #[serde(default = "default_znear")]
    znear_km: f64,
}

impl RawSceneConfig {
    fn collect_targets(&mut self) -> Result<Vec<TargetConfig>, String> {
        let mut targets = std::mem::take(&mut self.targets);

        if !self.targetsname.is_empty() || !self.targetsobj.is_empty() {
            let (n, f, o) = (self.targetsname.len(), self.targetsframe.len(), self.targetsobj.len());
            if n != f || n != o {
                return Err(format!(
                    "targetsname, targetsframe and targetsobj lengths differ ({}, {}, {})",
                    n, f, o
                ));
            }
            for ((name, frame), mesh) in self
                .targetsname
                .drain(..)
                .zip(self.targetsframe.drain(..))
                .zip(self.targetsobj.drain(..))
            {
                targets.push(TargetConfig {
                    name,
                    frame,
                    mesh,
                    texture: None,
                });
            }
        }

        if let Some(mesh) = self.targetobj.take() {
            let name = self
                .target
                .take()
                .ok_or_else(|| "targetobj given without target".to_string())?;
            let frame = self
                .target_frame
                .take()
                .ok_or_else(|| format!("target_frame missing for target {}", name))?;
            targets.push(TargetConfig {
                name,
                frame,
                mesh,
                texture: self.texture.take(),
            });
        }

        Ok(targets)
    }
}

impl TryFrom<RawSceneConfig> for SceneConfig {
    type Error = String;

    fn try_from(mut raw: RawSceneConfig) -> Result<Self, Self::Error> {
        let targets = raw.collect_targets()?;
        let yfov_deg = match (raw.yfov_deg, raw.yfov) {
            (Some(deg), _) => Some(deg),
            (None, Some(legacy)) if raw.origin == SceneOrigin::Target => {
                tracing::warn!(
                    "Legacy key yfov = {} read as radians for a target-centred run; use yfov_deg instead",
                    legacy
                );
                Some(legacy.to_degrees())
            }
            (None, legacy) => legacy,
        };
        let config = SceneConfig {
            targets,
            smooth: raw.smooth,
            meta_kernel: raw.meta_kernel,
            output_dir: raw.output_dir,
            start: raw.start,
            end: raw.end,
            samples: raw.samples,
            observer: raw.observer,
            observer_frame: raw.observer_frame,
            camera: raw.camera,
            camera_frame: raw.camera_frame,
            illumination_source: raw.illumination_source,
            yfov_deg,
            aspect_ratio: raw.aspect_ratio,
            pixel_lines: raw.pixel_lines,
            pixel_samples: raw.pixel_samples,
            light_factor: raw.light_factor,
            display: raw.display,
            save: raw.save,
            label_file: raw.label_file,
            origin: raw.origin,
            image_naming: raw.image_naming,
            aberration: raw.aberration,
            znear_km: raw.znear_km,
        };
        config.validate()?;
        Ok(config)
    }
}

fn default_illuminator() -> String {
    "SUN".to_string()
}

fn default_light_factor() -> f64 {
    10.0
}

fn default_true() -> bool {
    true
}

fn default_znear() -> f64 {
    0.05
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// JSON boolean, or "true"/"false" in any case
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Loose::deserialize(deserializer)? {
        Loose::Bool(b) => Ok(b),
        Loose::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(de::Error::custom(format!("expected a boolean, got \"{}\"", s))),
        },
        Loose::Number(n) => Err(de::Error::custom(format!("expected a boolean, got {}", n))),
    }
}

/// Number, numeric string, or ""/null/0 for "not set"
fn loose_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = match Option::<Loose>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Loose::Number(n)) => n,
        Some(Loose::Text(s)) if s.trim().is_empty() => return Ok(None),
        Some(Loose::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("expected a number, got \"{}\"", s)))?,
        Some(Loose::Bool(b)) => return Err(de::Error::custom(format!("expected a number, got {}", b))),
    };
    Ok(if value == 0.0 { None } else { Some(value) })
}

fn loose_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    match loose_number(deserializer)? {
        None => Ok(None),
        Some(v) if v >= 1.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => Ok(Some(v as u32)),
        Some(v) => Err(de::Error::custom(format!("expected a pixel count, got {}", v))),
    }
}

fn non_empty_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn non_empty_path<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<PathBuf>, D::Error> {
    Ok(non_empty_string(deserializer)?.map(PathBuf::from))
}
