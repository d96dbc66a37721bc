//! Scene ingestion: an importer-agnostic node-graph contract, flattened into
//! world-space mesh instances, plus the OBJ binding backed by `tobj`.

use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::error::{MeshError, SceneError};
use crate::lights::Light;
use crate::mesh::{Face, Mesh, MeshInstance};
use crate::prim::{Mat4, Scalar, Vec2, Vec4};

/// One node of an imported scene's hierarchy: a local transform, references
/// into `SceneGraph::meshes`, and child node indices.
#[derive(Debug, Clone)]
pub struct Node {
    pub transform: Mat4,
    pub mesh_indices: Vec<usize>,
    pub children: Vec<usize>,
}

/// A camera as exposed by an importer, prior to any CLI overrides.
#[derive(Debug, Clone)]
pub struct ImportedCamera {
    pub name: String,
    pub xform: Mat4,
    pub fov: Scalar,
    pub aspect: Scalar,
}

/// The flattened contract the core needs from any importer (spec §4.3,
/// §6): a node hierarchy with per-node transform and mesh references, a
/// shared mesh list, and a camera list. Every binding (OBJ today; glTF or
/// similar tomorrow) produces one of these and nothing else reaches the
/// core.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub meshes: Vec<Arc<Mesh>>,
    pub nodes: Vec<Node>,
    pub roots: Vec<usize>,
    pub cameras: Vec<ImportedCamera>,
}

impl SceneGraph {
    /// Depth-first traversal accumulating transforms by left-multiplication,
    /// producing one [`MeshInstance`] per mesh reference at each visited
    /// node (spec §4.3 "Leaves").
    pub fn flatten_instances(&self) -> Vec<MeshInstance> {
        let mut out = Vec::new();
        for &root in &self.roots {
            self.flatten_node(root, Mat4::identity(), &mut out);
        }
        out
    }

    fn flatten_node(&self, index: usize, parent_xform: Mat4, out: &mut Vec<MeshInstance>) {
        let node = &self.nodes[index];
        let xform = parent_xform * node.transform;
        for &mesh_idx in &node.mesh_indices {
            out.push(MeshInstance::new(self.meshes[mesh_idx].clone(), xform));
        }
        for &child in &node.children {
            self.flatten_node(child, xform, out);
        }
    }
}

/// A fully loaded scene: instances ready for [`crate::bvh::Bvh::build`],
/// lights, and the cameras available to pick from.
pub struct Scene {
    pub instances: Vec<MeshInstance>,
    pub cameras: Vec<ImportedCamera>,
    pub lights: Vec<Light>,
}

impl Scene {
    /// Flatten `graph`'s node hierarchy into world-space instances and pair
    /// it with `lights`, producing the value the renderer actually consumes.
    pub fn from_graph(graph: SceneGraph, lights: Vec<Light>) -> Scene {
        Scene {
            instances: graph.flatten_instances(),
            cameras: graph.cameras,
            lights,
        }
    }
}

/// Load an OBJ file via `tobj` and bind it into a [`SceneGraph`].
///
/// `tobj` triangulates n-gons and has no concept of a node hierarchy or
/// cameras, so the binding produces a single root node (identity transform)
/// referencing every mesh, and an empty camera list — the documented
/// degenerate case for this importer (see SPEC_FULL.md §4).
pub fn load_obj_scene_graph(path: &Path) -> Result<SceneGraph, SceneError> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| SceneError::Import {
        path: path.to_path_buf(),
        source,
    })?;

    if models.is_empty() {
        return Err(SceneError::NoMeshes {
            path: path.to_path_buf(),
        });
    }

    let meshes: Vec<Arc<Mesh>> = models
        .into_iter()
        .map(|model| Arc::new(mesh_from_tobj(model.name, model.mesh)))
        .collect();

    let mesh_indices = (0..meshes.len()).collect();
    let root = Node {
        transform: Mat4::identity(),
        mesh_indices,
        children: Vec::new(),
    };

    Ok(SceneGraph {
        meshes,
        nodes: vec![root],
        roots: vec![0],
        cameras: Vec::new(),
    })
}

/// Build a [`Mesh`] from a `tobj::Mesh`, substituting an empty placeholder
/// and logging on failure (spec §7 MalformedMesh).
fn mesh_from_tobj(name: String, raw: tobj::Mesh) -> Mesh {
    match try_mesh_from_tobj(&name, &raw) {
        Ok(mesh) => mesh,
        Err(err) => {
            warn!(mesh = %name, error = %err, "malformed mesh, substituting empty placeholder");
            Mesh::empty(name)
        }
    }
}

fn try_mesh_from_tobj(name: &str, raw: &tobj::Mesh) -> Result<Mesh, MeshError> {
    if raw.indices.len() % 3 != 0 {
        return Err(MeshError::NotTriangulated {
            index_count: raw.indices.len(),
        });
    }

    let vertex_count = raw.positions.len() / 3;
    let vertices: Vec<Vec4> = (0..vertex_count)
        .map(|i| {
            crate::prim::point4(
                raw.positions[i * 3] as Scalar,
                raw.positions[i * 3 + 1] as Scalar,
                raw.positions[i * 3 + 2] as Scalar,
            )
        })
        .collect();

    let normals: Vec<Vec4> = if raw.normals.is_empty() {
        Vec::new()
    } else {
        (0..raw.normals.len() / 3)
            .map(|i| {
                crate::prim::dir4(
                    raw.normals[i * 3] as Scalar,
                    raw.normals[i * 3 + 1] as Scalar,
                    raw.normals[i * 3 + 2] as Scalar,
                )
            })
            .collect()
    };

    let uvs: Vec<Vec2> = if raw.texcoords.is_empty() {
        Vec::new()
    } else {
        (0..raw.texcoords.len() / 2)
            .map(|i| {
                Vec2::new(
                    raw.texcoords[i * 2] as Scalar,
                    raw.texcoords[i * 2 + 1] as Scalar,
                )
            })
            .collect()
    };

    let faces: Vec<Face> = raw
        .indices
        .chunks_exact(3)
        .map(|c| Face {
            i0: c[0],
            i1: c[1],
            i2: c[2],
        })
        .collect();

    Mesh::new(name.to_string(), vertices, normals, uvs, faces)
}

/// The default light used when a scene defines none: a single white
/// directional light from `(1, -1, 0)`, matching the reference renderer's
/// fallback.
pub fn default_lights() -> Vec<Light> {
    vec![Light::Directional {
        color: crate::prim::Vec3::new(1.0, 1.0, 1.0),
        intensity: 1.0,
        dir: crate::prim::dir4(1.0, -1.0, 0.0).normalize(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prim::point4;

    fn two_node_graph() -> SceneGraph {
        let mesh = Mesh::new(
            "tri".to_string(),
            vec![
                point4(-1.0, -1.0, 0.0),
                point4(1.0, -1.0, 0.0),
                point4(0.0, 1.0, 0.0),
            ],
            vec![],
            vec![],
            vec![Face { i0: 0, i1: 1, i2: 2 }],
        )
        .unwrap();
        SceneGraph {
            meshes: vec![Arc::new(mesh)],
            nodes: vec![
                Node {
                    transform: Mat4::new_translation(&crate::prim::Vec3::new(5.0, 0.0, 0.0)),
                    mesh_indices: vec![0],
                    children: vec![1],
                },
                Node {
                    transform: Mat4::new_translation(&crate::prim::Vec3::new(0.0, 2.0, 0.0)),
                    mesh_indices: vec![0],
                    children: vec![],
                },
            ],
            roots: vec![0],
            cameras: Vec::new(),
        }
    }

    #[test]
    fn flatten_accumulates_transforms_depth_first() {
        let graph = two_node_graph();
        let instances = graph.flatten_instances();
        assert_eq!(instances.len(), 2);
        let p0 = instances[0].xform * point4(0.0, 0.0, 0.0);
        assert!((p0.x - 5.0).abs() < 1e-5);
        let p1 = instances[1].xform * point4(0.0, 0.0, 0.0);
        assert!((p1.x - 5.0).abs() < 1e-5);
        assert!((p1.y - 2.0).abs() < 1e-5);
    }

    #[test]
    fn default_lights_is_single_directional() {
        let lights = default_lights();
        assert_eq!(lights.len(), 1);
        assert!(matches!(lights[0], Light::Directional { .. }));
    }

    #[test]
    fn not_triangulated_error_message_reports_index_count() {
        let err = MeshError::NotTriangulated { index_count: 5 };
        assert!(err.to_string().contains("5 indices"));
    }
}
