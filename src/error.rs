//! Error types for the core pipeline.
//!
//! `main` is the only place that turns one of these into a process exit
//! code; everywhere else they propagate with `?`.

use std::path::PathBuf;

use thiserror::Error;

/// Raised by [`crate::mesh::Mesh::new`], or by the scene adapter while
/// converting raw importer geometry into it, when the incoming geometry
/// violates one of the invariants in spec §3. Corresponds to spec §7's
/// **MalformedMesh**: the scene adapter catches this per-mesh and
/// substitutes an empty placeholder rather than failing the whole load.
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("mesh index buffer has {index_count} indices, not a multiple of 3 (not triangulated)")]
    NotTriangulated { index_count: usize },
    #[error("face {face} references vertex index {index}, but the mesh only has {vertex_count} vertices")]
    IndexOutOfBounds {
        face: usize,
        index: u32,
        vertex_count: usize,
    },
    #[error("mesh has {normals_len} normals but {vertex_count} vertices")]
    NormalsLenMismatch {
        normals_len: usize,
        vertex_count: usize,
    },
    #[error("mesh has {uvs_len} uv coordinates but {vertex_count} vertices")]
    UvsLenMismatch { uvs_len: usize, vertex_count: usize },
}

/// Raised while loading and adapting a scene file. Corresponds to spec §7's
/// **SceneLoadFailure** — fatal, the caller should abort with exit code 1.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("failed to import scene from {path}: {source}")]
    Import {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
    #[error("scene at {path} contains no meshes")]
    NoMeshes { path: PathBuf },
}
