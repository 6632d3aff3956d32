//! Timeline driver: one scene, one image and one label row per sample

use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use spirec_ephem::EphemerisSource;
use spirec_render::{MeshData, SceneRenderer};

use crate::camera::{resolve_camera, ResolvedCamera};
use crate::config::SceneConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::label::LabelWriter;
use crate::poses::{compute_poses, TargetBody};
use crate::timeline::{format_utc, Timeline};

/// What a finished run produced
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub samples: usize,
    pub images: Vec<PathBuf>,
    pub label_file: Option<PathBuf>,
}

/// Sequential renderer for a configured run.
///
/// Camera settings, the time grid and the target meshes are fixed in
/// [`Pipeline::prepare`]; configuration problems surface there, before any
/// sample is processed.
pub struct Pipeline<'a, S: EphemerisSource + ?Sized, R: SceneRenderer + ?Sized> {
    config: &'a SceneConfig,
    source: &'a S,
    renderer: &'a mut R,
    camera: ResolvedCamera,
    timeline: Timeline,
    bodies: Vec<TargetBody>,
}

impl<'a, S: EphemerisSource + ?Sized, R: SceneRenderer + ?Sized> Pipeline<'a, S, R> {
    pub fn prepare(config: &'a SceneConfig, source: &'a S, renderer: &'a mut R) -> PipelineResult<Self> {
        let camera = resolve_camera(config, source)?;
        let timeline = Timeline::from_utc(&config.start, &config.end, config.samples)?;

        let mut bodies = Vec::with_capacity(config.targets.len());
        for target in &config.targets {
            let mut mesh = MeshData::load_obj(&target.mesh, config.smooth)?;
            if let Some(texture) = &target.texture {
                mesh = mesh.with_texture(texture)?;
            }
            bodies.push(TargetBody {
                name: target.name.clone(),
                frame: target.frame.clone(),
                mesh: renderer.register_mesh(&mesh)?,
            });
        }

        Ok(Self {
            config,
            source,
            renderer,
            camera,
            timeline,
            bodies,
        })
    }

    pub fn camera(&self) -> &ResolvedCamera {
        &self.camera
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Process every sample in order. The first error stops the run.
    pub fn run(self) -> PipelineResult<RunSummary> {
        let config = self.config;
        let output_dir = &config.output_dir;

        if config.save || config.label_file {
            std::fs::create_dir_all(output_dir).map_err(|e| PipelineError::io(output_dir, e))?;
        }
        let mut labels = if config.label_file {
            Some(LabelWriter::open(output_dir)?)
        } else {
            None
        };
        if config.display {
            tracing::warn!("Interactive display is not available in headless mode; images are only written to disk");
        }

        tracing::info!(
            "Rendering {} samples of {} target(s) from {} ({} origin)",
            self.timeline.len(),
            self.bodies.len(),
            config.observer,
            match config.origin {
                crate::config::SceneOrigin::Observer => "observer",
                crate::config::SceneOrigin::Target => "target",
            }
        );

        let pb = ProgressBar::new(self.timeline.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut summary = RunSummary::default();
        for sample in self.timeline.samples() {
            let sample = sample?;
            let utc = format_utc(sample.epoch);
            let span = tracing::debug_span!("sample", id = %sample.id, utc = %utc);
            let _enter = span.enter();

            let poses = compute_poses(self.source, sample.epoch, config, &self.camera)?;
            let scene = poses.scene(&self.bodies, &self.camera, config.light_factor)?;
            let image = self.renderer.render(&scene)?;
            tracing::debug!("Rendered {}x{}", image.width(), image.height());

            if config.save {
                let path = output_dir.join(config.image_naming.file_name(sample.id, &config.observer, &utc));
                image
                    .save_with_format(&path, image::ImageFormat::Png)
                    .map_err(|source| PipelineError::Image {
                        path: path.clone(),
                        source,
                    })?;
                summary.images.push(path);
            }
            if let Some(labels) = labels.as_mut() {
                labels.write_row(sample.id, &poses)?;
            }

            summary.samples += 1;
            pb.set_message(utc);
            pb.inc(1);
        }
        pb.finish_with_message("done");

        summary.label_file = labels.map(|l| l.path().to_path_buf());
        tracing::info!(
            "Finished {} samples, {} images written to {:?}",
            summary.samples,
            summary.images.len(),
            output_dir
        );
        Ok(summary)
    }
}

/// Prepare and run in one call
pub fn run<S: EphemerisSource + ?Sized, R: SceneRenderer + ?Sized>(
    config: &SceneConfig,
    source: &S,
    renderer: &mut R,
) -> PipelineResult<RunSummary> {
    Pipeline::prepare(config, source, renderer)?.run()
}
