//! Target meshes and textures loaded from disk

use glam::Vec3;
use image::RgbaImage;
use std::path::Path;

use crate::error::{RenderError, RenderResult};
use crate::gpu_types::GpuVertex;

/// Triangle mesh in body-fixed coordinates (km), ready for upload
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<GpuVertex>,
    pub indices: Vec<u32>,
    /// Albedo map; `None` renders white
    pub texture: Option<RgbaImage>,
}

impl MeshData {
    /// Load a Wavefront OBJ. `smooth` keeps per-vertex normals (file normals
    /// when present, averaged face normals otherwise); flat shading gives
    /// every triangle its own vertices and face normal.
    pub fn load_obj(path: &Path, smooth: bool) -> RenderResult<Self> {
        let options = tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ..Default::default()
        };
        let (models, _materials) = tobj::load_obj(path, &options).map_err(|e| RenderError::Mesh {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut mesh = MeshData {
            name: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            ..Default::default()
        };
        for model in &models {
            mesh.append(&model.mesh, smooth);
        }

        if mesh.indices.is_empty() {
            return Err(RenderError::Mesh {
                path: path.to_path_buf(),
                reason: "no triangles".to_string(),
            });
        }

        tracing::info!(
            "Loaded mesh {:?}: {} vertices, {} triangles ({})",
            path,
            mesh.vertices.len(),
            mesh.triangle_count(),
            if smooth { "smooth" } else { "flat" }
        );
        Ok(mesh)
    }

    /// Attach an albedo texture from an image file
    pub fn with_texture(mut self, path: &Path) -> RenderResult<Self> {
        let image = image::open(path).map_err(|source| RenderError::Texture {
            path: path.to_path_buf(),
            source,
        })?;
        self.texture = Some(image.to_rgba8());
        Ok(self)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn append(&mut self, src: &tobj::Mesh, smooth: bool) {
        let positions: Vec<Vec3> = src
            .positions
            .chunks_exact(3)
            .map(|p| Vec3::new(p[0], p[1], p[2]))
            .collect();
        let uvs: Vec<[f32; 2]> = if src.texcoords.len() / 2 == positions.len() {
            // OBJ texture v runs bottom-up
            src.texcoords.chunks_exact(2).map(|t| [t[0], 1.0 - t[1]]).collect()
        } else {
            vec![[0.0, 0.0]; positions.len()]
        };
        let base = self.vertices.len() as u32;

        if smooth {
            let normals: Vec<Vec3> = if src.normals.len() == src.positions.len() {
                src.normals
                    .chunks_exact(3)
                    .map(|n| Vec3::new(n[0], n[1], n[2]).normalize_or_zero())
                    .collect()
            } else {
                averaged_normals(&positions, &src.indices)
            };

            for (i, p) in positions.iter().enumerate() {
                self.vertices.push(GpuVertex {
                    position: p.to_array(),
                    normal: normals[i].to_array(),
                    uv: uvs[i],
                });
            }
            self.indices.extend(src.indices.iter().map(|i| base + i));
        } else {
            for (n, tri) in src.indices.chunks_exact(3).enumerate() {
                let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
                let normal = (positions[b] - positions[a])
                    .cross(positions[c] - positions[a])
                    .normalize_or_zero();
                for &k in &[a, b, c] {
                    self.vertices.push(GpuVertex {
                        position: positions[k].to_array(),
                        normal: normal.to_array(),
                        uv: uvs[k],
                    });
                }
                let first = base + 3 * n as u32;
                self.indices.extend_from_slice(&[first, first + 1, first + 2]);
            }
        }
    }
}

/// Area-weighted vertex normals
fn averaged_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals.iter().map(|n| n.normalize_or_zero()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Unit square pyramid, apex on +Z, base facing -Z
    const PYRAMID: &str = "\
o pyramid
v -1 -1 0
v 1 -1 0
v 1 1 0
v -1 1 0
v 0 0 1
f 1 2 5
f 2 3 5
f 3 4 5
f 4 1 5
f 1 4 3 2
";

    fn write_obj(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("pyramid.obj");
        std::fs::write(&path, PYRAMID).unwrap();
        path
    }

    #[test]
    fn test_flat_shading_splits_vertices() {
        let dir = tempfile::TempDir::new().unwrap();
        let mesh = MeshData::load_obj(&write_obj(&dir), false).unwrap();

        // 4 sides + quad base triangulated into 2
        assert_eq!(mesh.triangle_count(), 6);
        assert_eq!(mesh.vertices.len(), 18);
        assert_eq!(mesh.name, "pyramid");

        let base: Vec<_> = mesh.vertices[12..].iter().map(|v| v.normal).collect();
        for n in base {
            assert_relative_eq!(n[2], -1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_smooth_shading_shares_vertices() {
        let dir = tempfile::TempDir::new().unwrap();
        let mesh = MeshData::load_obj(&write_obj(&dir), true).unwrap();

        assert_eq!(mesh.vertices.len(), 5);
        assert_eq!(mesh.triangle_count(), 6);
        // Apex normal is the average of the four side faces
        let apex = mesh
            .vertices
            .iter()
            .find(|v| v.position == [0.0, 0.0, 1.0])
            .map(|v| Vec3::from_array(v.normal))
            .unwrap();
        assert_relative_eq!(apex.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(apex.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(apex.z, 1.0, epsilon = 1e-6);
        for v in &mesh.vertices {
            assert_relative_eq!(Vec3::from_array(v.normal).length(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_missing_files() {
        let err = MeshData::load_obj(Path::new("/nonexistent/model.obj"), false).unwrap_err();
        assert!(matches!(err, RenderError::Mesh { .. }));

        let err = MeshData::default()
            .with_texture(Path::new("/nonexistent/albedo.png"))
            .unwrap_err();
        assert!(matches!(err, RenderError::Texture { .. }));
    }

    #[test]
    fn test_texture_is_attached() {
        let dir = tempfile::TempDir::new().unwrap();
        let tex = dir.path().join("albedo.png");
        RgbaImage::from_pixel(4, 2, image::Rgba([200, 100, 50, 255])).save(&tex).unwrap();

        let mesh = MeshData::load_obj(&write_obj(&dir), false)
            .unwrap()
            .with_texture(&tex)
            .unwrap();
        let texture = mesh.texture.unwrap();
        assert_eq!(texture.dimensions(), (4, 2));
    }
}
