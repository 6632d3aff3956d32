use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use spirec_core::matrix_to_quaternion;
use spirec_ephem::{instrument_parameters, observe, AniseSession, GeometryQuery};
use spirec_render::HeadlessRenderer;
use spirec_sim::{compute_poses, format_utc, parse_epoch, resolve_camera, SceneConfig, Timeline};

#[derive(Parser)]
#[command(name = "spirec")]
#[command(about = "Synthetic camera images from SPICE ephemerides")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every sample of a configured run
    Render {
        /// Run configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,
        /// Write images and labels here instead of the configured directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print observation geometry for one instant
    Geometry {
        #[arg(short, long)]
        config: PathBuf,
        /// UTC (ISO format, optional scale suffix)
        #[arg(short, long)]
        epoch: String,
    },

    /// Print the sample grid of a time interval
    Timeline {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(short, long, default_value = "10")]
        samples: usize,
    },

    /// Show camera parameters from instrument kernels
    Instrument {
        #[arg(short, long)]
        meta_kernel: PathBuf,
        /// Instrument name, e.g. ROS_NAVCAM-A
        #[arg(short, long)]
        camera: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render { config, output } => {
            let mut config = SceneConfig::from_file(&config)?;
            if let Some(dir) = output {
                config.output_dir = dir;
            }

            info!("Opening kernels from {:?}", config.meta_kernel);
            let session = AniseSession::open(&config.meta_kernel)
                .with_context(|| format!("loading kernels from {:?}", config.meta_kernel))?;
            info!("{} kernel file(s) loaded", session.loaded().len());

            let mut renderer = HeadlessRenderer::new().await?;
            info!("Rendering into {:?}", config.output_dir);

            let summary = spirec_sim::run(&config, &session, &mut renderer)?;
            println!("Rendered {} samples", summary.samples);
            if let Some(first) = summary.images.first() {
                println!("  images: {:?} .. ({} files)", first, summary.images.len());
            }
            if let Some(label) = summary.label_file {
                println!("  labels: {:?}", label);
            }
        }

        Commands::Geometry { config, epoch } => {
            let config = SceneConfig::from_file(&config)?;
            let session = AniseSession::open(&config.meta_kernel)
                .with_context(|| format!("loading kernels from {:?}", config.meta_kernel))?;
            let camera = resolve_camera(&config, &session)?;
            let epoch = parse_epoch(&epoch)?;

            println!("Epoch {} (ET {:.3} s)", format_utc(epoch), epoch.to_et_seconds());
            println!("Observer {} in {}, aberration {}", config.observer, camera.frame, config.aberration);

            println!(
                "\n{:<16} {:>14} {:>14} {:>14} {:>14}",
                "Target", "X (km)", "Y (km)", "Z (km)", "Range (km)"
            );
            for target in &config.targets {
                let geometry = observe(
                    &session,
                    epoch,
                    &GeometryQuery {
                        observer: &config.observer,
                        observer_frame: &camera.frame,
                        target: &target.name,
                        target_frame: &target.frame,
                        illuminator: &config.illumination_source,
                        correction: config.aberration,
                    },
                )?;
                let p = geometry.position;
                let q = matrix_to_quaternion(&geometry.rotation)?;
                println!(
                    "{:<16} {:>14.3} {:>14.3} {:>14.3} {:>14.3}",
                    target.name,
                    p.x,
                    p.y,
                    p.z,
                    p.length()
                );
                println!(
                    "  {} -> {}: q = ({:.6}, {:.6}, {:.6}, {:.6})",
                    camera.frame, target.frame, q.w, q.x, q.y, q.z
                );
                // Distant illuminator: target->sun is parallel to observer->sun
                let phase = (-p).angle_between(geometry.illumination);
                println!("  phase angle: {:.2} deg", phase.to_degrees());
            }

            let poses = compute_poses(&session, epoch, &config, &camera)?;
            let s = poses.illumination;
            println!("\nScene ({:?} at origin)", config.origin);
            println!(
                "  camera: ({:.3}, {:.3}, {:.3}) km",
                poses.camera_position.x, poses.camera_position.y, poses.camera_position.z
            );
            println!("  sun:    ({:.6}, {:.6}, {:.6})", s.x, s.y, s.z);
        }

        Commands::Timeline { start, end, samples } => {
            let timeline = Timeline::from_utc(&start, &end, samples)?;
            println!("{:<8} {:<24} {:>18}", "Id", "UTC", "ET (s)");
            for sample in timeline.samples() {
                let sample = sample?;
                println!(
                    "{:<8} {:<24} {:>18.3}",
                    sample.id.to_string(),
                    format_utc(sample.epoch),
                    sample.epoch.to_et_seconds()
                );
            }
        }

        Commands::Instrument { meta_kernel, camera } => {
            let session = AniseSession::open(&meta_kernel)
                .with_context(|| format!("loading kernels from {:?}", meta_kernel))?;
            let params = instrument_parameters(&session, &camera)?;
            print!("{}", params);
        }
    }

    Ok(())
}
