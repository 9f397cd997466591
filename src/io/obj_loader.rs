use crate::scene::mesh::Mesh;
use log::{info, warn};
use nalgebra::{Point3, Vector3};
use std::path::Path;

/// Loads an OBJ file into a single triangle mesh for the wireframe preview.
///
/// All models in the file are merged. Normals are kept only if every model
/// provides them.
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Mesh, String> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()));
    }

    info!("Loading OBJ file: {}", path.display());

    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, _materials) =
        tobj::load_obj(path, &load_options).map_err(|e| format!("Failed to load OBJ: {}", e))?;

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut indices = Vec::new();
    let mut all_normals = true;

    for model in &models {
        let mesh = &model.mesh;
        let offset = positions.len() as u32;

        if mesh.normals.len() != mesh.positions.len() {
            if all_normals {
                warn!("Mesh '{}' has no normals; normals are dropped", model.name);
            }
            all_normals = false;
        }

        positions.extend(
            mesh.positions
                .chunks_exact(3)
                .map(|p| Point3::new(p[0], p[1], p[2])),
        );
        if all_normals {
            normals.extend(
                mesh.normals
                    .chunks_exact(3)
                    .map(|n| Vector3::new(n[0], n[1], n[2])),
            );
        }
        indices.extend(mesh.indices.iter().map(|i| i + offset));
    }

    if !all_normals {
        normals.clear();
    }
    if positions.is_empty() {
        return Err(format!("OBJ file '{}' has no vertices", path.display()));
    }

    let mesh = Mesh::new(positions, normals, indices);
    info!(
        "OBJ loaded: {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_quad_as_two_triangles() {
        let path = std::env::temp_dir().join(format!("csg-scenes-quad-{}.obj", std::process::id()));
        fs::write(
            &path,
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n",
        )
        .unwrap();

        let mesh = load_obj(&path).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(!mesh.has_normals());
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_obj("no/such/model.obj").unwrap_err().contains("not found"));
    }
}
