//! OBJ mesh import
//!
//! Loads every model of an OBJ file as a separate sub-mesh. Each failure mode
//! has its own [`ImportError`] variant so callers can report it precisely.

use std::collections::TryReserveError;
use std::path::{Path, PathBuf};

use super::GeometryData;

/// Errors produced while importing a mesh file
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("could not read mesh file '{}': {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("mesh file '{}' contains no meshes", path.display())]
    NoMeshes { path: PathBuf },

    #[error("out of memory while importing mesh: {0}")]
    Allocation(#[from] TryReserveError),
}

/// CPU-side geometry of an imported mesh, one part per model in the file
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub source: PathBuf,
    pub parts: Vec<GeometryData>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.parts.iter().map(GeometryData::vertex_count).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.parts.iter().map(GeometryData::triangle_count).sum()
    }
}

/// Imports an OBJ file
///
/// Faces are triangulated and re-indexed to a single index stream. Normals are
/// taken from the file when present and computed otherwise. Models without
/// geometry are skipped; a file left with none is an error.
pub fn import_mesh(path: impl AsRef<Path>) -> Result<MeshData, ImportError> {
    let path = path.as_ref();

    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| ImportError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let mut parts = Vec::new();
    parts.try_reserve_exact(models.len())?;

    for model in &models {
        let mesh = &model.mesh;
        if mesh.positions.is_empty() || mesh.indices.is_empty() {
            log::debug!("Skipping empty model '{}' in {}", model.name, path.display());
            continue;
        }
        parts.push(geometry_from_tobj(mesh)?);
    }

    if parts.is_empty() {
        return Err(ImportError::NoMeshes {
            path: path.to_path_buf(),
        });
    }

    let data = MeshData {
        source: path.to_path_buf(),
        parts,
    };
    log::info!(
        "Imported {} ({} parts, {} vertices, {} triangles)",
        path.display(),
        data.parts.len(),
        data.vertex_count(),
        data.triangle_count()
    );
    Ok(data)
}

fn geometry_from_tobj(mesh: &tobj::Mesh) -> Result<GeometryData, ImportError> {
    let vertex_count = mesh.positions.len() / 3;
    let mut data = GeometryData::new();
    data.vertices.try_reserve_exact(vertex_count)?;
    data.tex_coords.try_reserve_exact(vertex_count)?;
    data.indices.try_reserve_exact(mesh.indices.len())?;

    data.vertices.extend(
        mesh.positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]]),
    );

    if mesh.texcoords.len() == vertex_count * 2 {
        // OBJ puts v = 0 at the bottom of the image
        data.tex_coords
            .extend(mesh.texcoords.chunks_exact(2).map(|t| [t[0], 1.0 - t[1]]));
    } else {
        data.tex_coords.resize(vertex_count, [0.0, 0.0]);
    }

    data.indices.extend_from_slice(&mesh.indices);

    if mesh.normals.len() == mesh.positions.len() {
        data.normals.try_reserve_exact(vertex_count)?;
        data.normals.extend(
            mesh.normals
                .chunks_exact(3)
                .map(|n| [n[0], n[1], n[2]]),
        );
    } else {
        data.compute_smooth_normals();
    }

    Ok(data)
}
