//! Camera settings resolved from config and instrument kernels

use spirec_ephem::{instrument_parameters, EphemerisError, EphemerisSource, InstrumentParameters};
use spirec_render::Resolution;

use crate::config::SceneConfig;
use crate::error::{PipelineError, PipelineResult};

/// Everything the run needs to know about the camera, fixed before the loop
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedCamera {
    pub instrument: String,
    /// Reference frame of the camera (boresight +Z)
    pub frame: String,
    /// Vertical field of view, radians
    pub yfov: f64,
    pub aspect_ratio: f64,
    pub resolution: Resolution,
    pub znear: f64,
}

/// Fill in camera settings: config values first, instrument kernel data for
/// anything not given. A setting missing from both is a configuration error.
pub fn resolve_camera<S: EphemerisSource + ?Sized>(
    config: &SceneConfig,
    source: &S,
) -> PipelineResult<ResolvedCamera> {
    let instrument = config.camera_name().to_string();

    let needs_kernel = (config.camera_frame.is_none() && config.observer_frame.is_none())
        || config.yfov_deg.is_none()
        || config.aspect_ratio.is_none()
        || config.pixel_lines.is_none()
        || config.pixel_samples.is_none();

    let params: Option<InstrumentParameters> = if needs_kernel {
        match instrument_parameters(source, &instrument) {
            Ok(p) => Some(p),
            Err(EphemerisError::BodyNotFound(_)) => None,
            Err(e) => return Err(e.into()),
        }
    } else {
        None
    };
    let missing = |what: &str| PipelineError::config(format!("{} not defined for {}", what, instrument));

    let frame = config
        .camera_frame
        .clone()
        .or_else(|| config.observer_frame.clone())
        .or_else(|| params.as_ref().and_then(|p| p.frame.clone()))
        .ok_or_else(|| missing("CAMERA FRAME"))?;

    let fov = params.as_ref().and_then(|p| p.field_of_view);
    let yfov = config
        .yfov_deg
        .map(f64::to_radians)
        .or(fov.map(|f| f.yfov))
        .ok_or_else(|| missing("Field of View aperture angles"))?;
    let aspect_ratio = config
        .aspect_ratio
        .or(fov.map(|f| f.aspect_ratio))
        .ok_or_else(|| missing("Field of View aperture angles"))?;

    let width = config
        .pixel_samples
        .or(params.as_ref().and_then(|p| p.pixel_samples))
        .ok_or_else(|| missing("PIXEL_SAMPLES"))?;
    let height = config
        .pixel_lines
        .or(params.as_ref().and_then(|p| p.pixel_lines))
        .ok_or_else(|| missing("PIXEL_LINES"))?;

    let camera = ResolvedCamera {
        instrument,
        frame,
        yfov,
        aspect_ratio,
        resolution: Resolution::new(width, height),
        znear: config.znear_km,
    };
    tracing::info!(
        "Camera {} in {}: {:.4} deg vertical FOV, aspect {:.4}, {}x{} px",
        camera.instrument,
        camera.frame,
        camera.yfov.to_degrees(),
        camera.aspect_ratio,
        width,
        height
    );
    Ok(camera)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::{DMat3, DVec3};
    use hifitime::Epoch;
    use spirec_ephem::{Correction, EphemerisResult, KernelPool};

    struct Kernels(KernelPool);

    impl EphemerisSource for Kernels {
        fn position(&self, t: &str, _: &str, _: &str, _: Epoch, _: Correction) -> EphemerisResult<DVec3> {
            Err(EphemerisError::BodyNotFound(t.to_string()))
        }
        fn rotation(&self, _: &str, _: &str, _: Epoch) -> EphemerisResult<DMat3> {
            Ok(DMat3::IDENTITY)
        }
        fn kernel_pool(&self) -> &KernelPool {
            &self.0
        }
    }

    fn navcam() -> Kernels {
        let mut pool = KernelPool::new();
        pool.load_str(
            "navcam.ti",
            "\\begindata\n\
             NAIF_BODY_NAME += 'ROS_NAVCAM-A'\n\
             NAIF_BODY_CODE += -226170\n\
             INS-226170_FOV_FRAME = 'ROS_NAVCAM-A'\n\
             INS-226170_FOV_REF_ANGLE = 2.5\n\
             INS-226170_FOV_CROSS_ANGLE = 2.5\n\
             INS-226170_PIXEL_LINES = 1024\n\
             INS-226170_PIXEL_SAMPLES = 1024\n",
        )
        .unwrap();
        Kernels(pool)
    }

    fn config(extra: &str) -> SceneConfig {
        SceneConfig::from_json(&format!(
            r#"{{
                "targets": [{{ "name": "67P/C-G", "frame": "67P/C-G_CK", "mesh": "cg.obj" }}],
                "meta_kernel": "mk.tm", "output_dir": "out",
                "start": "2014-08-01T00:00:00", "end": "2014-08-01T01:00:00", "samples": 2,
                "observer": "ROSETTA", "camera": "ROS_NAVCAM-A"{}
            }}"#,
            extra
        ))
        .unwrap()
    }

    #[test]
    fn test_everything_from_kernels() {
        let camera = resolve_camera(&config(""), &navcam()).unwrap();
        assert_eq!(camera.frame, "ROS_NAVCAM-A");
        assert_relative_eq!(camera.yfov, 5f64.to_radians(), epsilon = 1e-12);
        assert_relative_eq!(camera.aspect_ratio, 1.0, epsilon = 1e-12);
        assert_eq!(camera.resolution, Resolution::new(1024, 1024));
        assert_eq!(camera.znear, 0.05);
    }

    #[test]
    fn test_config_overrides_kernels() {
        let camera = resolve_camera(
            &config(r#", "camera_frame": "ROS_SPACECRAFT", "yfov_deg": 10, "pxsamples": 640, "pxlines": 480"#),
            &navcam(),
        )
        .unwrap();
        assert_eq!(camera.frame, "ROS_SPACECRAFT");
        assert_relative_eq!(camera.yfov, 10f64.to_radians(), epsilon = 1e-12);
        // Width from samples, height from lines
        assert_eq!(camera.resolution, Resolution::new(640, 480));
    }

    #[test]
    fn test_missing_parameters_name_the_instrument() {
        let err = resolve_camera(&config(""), &Kernels(KernelPool::new())).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, PipelineError::Configuration(_)));
        assert!(msg.contains("CAMERA FRAME"));
        assert!(msg.contains("ROS_NAVCAM-A"));

        let err = resolve_camera(
            &config(r#", "camera_frame": "ROS_NAVCAM-A", "yfov": 5, "aspectratio": 1, "pxlines": 1024"#),
            &Kernels(KernelPool::new()),
        )
        .unwrap_err();
        assert!(err.to_string().contains("PIXEL_SAMPLES"));
    }
}
