//! Geometry label file (`data.lbl`): one row per rendered sample

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::poses::SamplePoses;
use crate::sample_id::SampleId;

pub const LABEL_FILE_NAME: &str = "data.lbl";

pub const LABEL_HEADER: &str =
    "# id, xsc[km], ysc[km], zsc[km], qxsc[-], qysc[-], qzsc[-], qwsc[-], rxsun[-], rysun[-], rzsun[-]";

/// Appends label rows; the header is written once per run
pub struct LabelWriter {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl LabelWriter {
    pub fn open(output_dir: &Path) -> PipelineResult<Self> {
        let path = output_dir.join(LABEL_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| PipelineError::io(&path, e))?;

        let mut writer = Self {
            path,
            writer: BufWriter::new(file),
        };
        writer.write_line(LABEL_HEADER)?;
        Ok(writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Camera position, camera orientation (x, y, z, w) and Sun direction
    pub fn write_row(&mut self, id: SampleId, poses: &SamplePoses) -> PipelineResult<()> {
        self.write_line(&format_row(id, poses))
    }

    fn write_line(&mut self, line: &str) -> PipelineResult<()> {
        writeln!(self.writer, "{}", line)
            .and_then(|_| self.writer.flush())
            .map_err(|e| PipelineError::io(&self.path, e))
    }
}

pub fn format_row(id: SampleId, poses: &SamplePoses) -> String {
    let r = poses.camera_position;
    let q = poses.camera_orientation;
    let s = poses.illumination;
    format!(
        "{}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}",
        id, r.x, r.y, r.z, q.x, q.y, q.z, q.w, s.x, s.y, s.z
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DQuat, DVec3};

    fn poses() -> SamplePoses {
        SamplePoses {
            camera_position: DVec3::new(1.5, -2.0, 100.0),
            camera_orientation: DQuat::from_xyzw(0.0, 0.0, 1.0, 0.0),
            targets: vec![],
            illumination: DVec3::new(0.6, 0.8, 0.0),
        }
    }

    #[test]
    fn test_row_layout() {
        let row = format_row(SampleId::new(7).unwrap(), &poses());
        assert_eq!(row, "000007, 1.5, -2, 100, 0, 0, 1, 0, 0.6, 0.8, 0");
        assert_eq!(row.split(", ").count(), LABEL_HEADER.split(", ").count());
    }

    #[test]
    fn test_appends_across_runs() {
        let dir = tempfile::TempDir::new().unwrap();
        for _ in 0..2 {
            let mut writer = LabelWriter::open(dir.path()).unwrap();
            writer.write_row(SampleId::FIRST, &poses()).unwrap();
        }

        let text = std::fs::read_to_string(dir.path().join(LABEL_FILE_NAME)).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], LABEL_HEADER);
        assert_eq!(lines[2], LABEL_HEADER);
        assert!(lines[1].starts_with("000001, "));
    }
}
