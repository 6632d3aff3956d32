//! Full runs against an in-memory ephemeris and a renderer that paints a
//! solid frame

use glam::{DMat3, DVec3};
use hifitime::Epoch;
use image::{Rgba, RgbaImage};
use std::path::Path;

use spirec_ephem::{Correction, EphemerisError, EphemerisResult, EphemerisSource, KernelPool};
use spirec_render::{MeshData, MeshId, RenderError, RenderResult, SceneDescription, SceneRenderer};
use spirec_sim::{run, LabelWriter, PipelineError, SceneConfig, LABEL_HEADER};

/// Probe drifting past a comet; the Sun stays well off the camera Z axis
struct Flyby {
    pool: KernelPool,
    t0: Epoch,
}

impl Flyby {
    fn new() -> Self {
        let mut pool = KernelPool::new();
        pool.load_str(
            "navcam.ti",
            "\\begindata\n\
             NAIF_BODY_NAME += 'PROBE_CAM'\n\
             NAIF_BODY_CODE += -999100\n\
             INS-999100_FOV_FRAME = 'PROBE_CAM'\n\
             INS-999100_FOV_REF_ANGLE = 2.5\n\
             INS-999100_FOV_CROSS_ANGLE = 2.5\n\
             INS-999100_PIXEL_LINES = 24\n\
             INS-999100_PIXEL_SAMPLES = 32\n",
        )
        .unwrap();
        Self {
            pool,
            t0: Epoch::from_gregorian_utc_at_midnight(2014, 8, 6),
        }
    }

    fn hours(&self, epoch: Epoch) -> f64 {
        (epoch - self.t0).to_seconds() / 3600.0
    }
}

impl EphemerisSource for Flyby {
    fn position(&self, target: &str, observer: &str, frame: &str, epoch: Epoch, _: Correction) -> EphemerisResult<DVec3> {
        if frame != "PROBE_CAM" && frame != "COMET_FIXED" {
            return Err(EphemerisError::FrameNotFound(frame.to_string()));
        }
        let h = self.hours(epoch);
        let comet = DVec3::new(h, 0.0, 100.0);
        let in_camera = match (target, observer) {
            ("COMET", "PROBE") => comet,
            ("PROBE", "COMET") => -comet,
            ("SUN", "PROBE") => DVec3::new(1.5e8, 2.0e7 * h, 1.0e7),
            ("SUN", "COMET") => DVec3::new(1.5e8, 2.0e7 * h, 1.0e7) - comet,
            _ => return Err(EphemerisError::BodyNotFound(target.to_string())),
        };
        Ok(self.rotation("PROBE_CAM", frame, epoch)? * in_camera)
    }

    fn rotation(&self, from: &str, to: &str, epoch: Epoch) -> EphemerisResult<DMat3> {
        let spin = DMat3::from_rotation_z(0.1 * self.hours(epoch));
        match (from, to) {
            (a, b) if a == b => Ok(DMat3::IDENTITY),
            ("PROBE_CAM", "COMET_FIXED") => Ok(spin),
            ("COMET_FIXED", "PROBE_CAM") => Ok(spin.transpose()),
            _ => Err(EphemerisError::FrameNotFound(format!("{} -> {}", from, to))),
        }
    }

    fn kernel_pool(&self) -> &KernelPool {
        &self.pool
    }
}

/// Counts calls and returns a grey frame at the requested resolution
#[derive(Default)]
struct SolidRenderer {
    meshes: usize,
    scenes: Vec<SceneDescription>,
}

impl SceneRenderer for SolidRenderer {
    fn register_mesh(&mut self, _mesh: &MeshData) -> RenderResult<MeshId> {
        self.meshes += 1;
        Ok(MeshId::new(self.meshes - 1))
    }

    fn render(&mut self, scene: &SceneDescription) -> RenderResult<RgbaImage> {
        for target in &scene.targets {
            if target.mesh.index() >= self.meshes {
                return Err(RenderError::UnknownMesh(target.mesh));
            }
        }
        self.scenes.push(scene.clone());
        let r = scene.resolution;
        Ok(RgbaImage::from_pixel(r.width, r.height, Rgba([40, 40, 40, 255])))
    }
}

fn write_mesh(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("comet.obj");
    std::fs::write(
        &path,
        "v -1 -1 0\nv 1 -1 0\nv 1 1 0\nv -1 1 0\nv 0 0 1\n\
         f 1 2 5\nf 2 3 5\nf 3 4 5\nf 4 1 5\nf 1 4 3 2\n",
    )
    .unwrap();
    path
}

fn config(dir: &Path, extra: &str) -> SceneConfig {
    let mesh = write_mesh(dir);
    SceneConfig::from_json(&format!(
        r#"{{
            "targets": [{{ "name": "COMET", "frame": "COMET_FIXED", "mesh": {mesh:?} }}],
            "meta_kernel": "unused.tm",
            "output_dir": {out:?},
            "start": "2014-08-06T00:00:00",
            "end": "2014-08-06T02:00:00",
            "samples": 3,
            "observer": "PROBE",
            "camera": "PROBE_CAM",
            "label_file": true{extra}
        }}"#,
        mesh = mesh.display().to_string(),
        out = dir.join("out").display().to_string(),
        extra = extra,
    ))
    .unwrap()
}

fn label_rows(path: &Path) -> Vec<Vec<f64>> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.starts_with('#'))
        .map(|l| l.split(", ").map(|v| v.parse::<f64>().unwrap()).collect())
        .collect()
}

#[test]
fn test_observer_run_writes_images_and_labels() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config(dir.path(), "");
    let source = Flyby::new();
    let mut renderer = SolidRenderer::default();

    let summary = run(&config, &source, &mut renderer).unwrap();
    assert_eq!(summary.samples, 3);
    assert_eq!(renderer.meshes, 1);
    assert_eq!(renderer.scenes.len(), 3);

    let out = dir.path().join("out");
    for (i, name) in ["SIM_x000001.PNG", "SIM_x000002.PNG", "SIM_x000003.PNG"].iter().enumerate() {
        assert_eq!(summary.images[i], out.join(name));
        let img = image::load_from_memory(&std::fs::read(out.join(name)).unwrap()).unwrap();
        assert_eq!((img.width(), img.height()), (32, 24));
    }

    let label = summary.label_file.unwrap();
    let text = std::fs::read_to_string(&label).unwrap();
    assert_eq!(text.lines().next(), Some(LABEL_HEADER));
    let rows = label_rows(&label);
    assert_eq!(rows.len(), 3);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.len(), 11);
        assert_eq!(row[0] as usize, i + 1);
        // Camera at the origin in observer mode
        assert_eq!(&row[1..4], &[0.0, 0.0, 0.0]);
        let sun = DVec3::new(row[8], row[9], row[10]);
        assert!((sun.length() - 1.0).abs() < 1e-9);
    }

    // Target moves across the field while the camera stays put
    let first = renderer.scenes[0].targets[0].position;
    let last = renderer.scenes[2].targets[0].position;
    assert!((last.x - first.x - 2.0).abs() < 1e-9);
}

#[test]
fn test_target_run_moves_the_camera() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config(dir.path(), r#", "origin": "target", "save": false"#);
    let source = Flyby::new();
    let mut renderer = SolidRenderer::default();

    let summary = run(&config, &source, &mut renderer).unwrap();
    assert!(summary.images.is_empty());
    assert!(!dir.path().join("out").join("SIM_x000001.PNG").exists());

    let rows = label_rows(&summary.label_file.unwrap());
    assert_eq!(rows.len(), 3);
    for (row, scene) in rows.iter().zip(&renderer.scenes) {
        assert_eq!(scene.targets[0].position, DVec3::ZERO);
        let camera = DVec3::new(row[1], row[2], row[3]);
        assert!((camera.length() - scene.camera.position.length()).abs() < 1e-9);
        assert!(camera.length() > 99.0);
    }
}

#[test]
fn test_second_run_appends_labels() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config(dir.path(), r#", "save": false"#);
    let source = Flyby::new();

    for _ in 0..2 {
        run(&config, &source, &mut SolidRenderer::default()).unwrap();
    }
    let label = dir.path().join("out").join(spirec_sim::LABEL_FILE_NAME);
    let text = std::fs::read_to_string(&label).unwrap();
    assert_eq!(text.lines().filter(|l| *l == LABEL_HEADER).count(), 2);
    assert_eq!(label_rows(&label).len(), 6);

    // Writer still usable on an existing file
    assert!(LabelWriter::open(&dir.path().join("out")).is_ok());
}

#[test]
fn test_unknown_body_stops_the_run() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = config(dir.path(), "");
    config.targets[0].name = "ASTEROID".into();
    let mut renderer = SolidRenderer::default();

    let err = run(&config, &Flyby::new(), &mut renderer).unwrap_err();
    assert!(matches!(err, PipelineError::Geometry(_)));
    assert!(renderer.scenes.is_empty());
}

#[test]
fn test_missing_mesh_fails_before_rendering() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = config(dir.path(), "");
    config.targets[0].mesh = dir.path().join("missing.obj");
    let mut renderer = SolidRenderer::default();

    let err = run(&config, &Flyby::new(), &mut renderer).unwrap_err();
    assert!(matches!(err, PipelineError::Render(RenderError::Mesh { .. })));
    assert_eq!(renderer.meshes, 0);
    assert!(!dir.path().join("out").exists());
}
