//! Triangulated geometry: `Mesh` (shared, immutable) and `MeshInstance`
//! (one placement of a mesh under a world transform).

use std::sync::Arc;

use crate::aabb::Aabb;
use crate::error::MeshError;
use crate::prim::{xyz, Mat4, Scalar, Vec2, Vec3, Vec4};

/// One triangular face, indexing `Mesh::vertices`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub i0: u32,
    pub i1: u32,
    pub i2: u32,
}

/// Immutable triangulated geometry, shared by every [`MeshInstance`] that
/// places it in the scene.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vec4>,
    /// Per-vertex normals. Empty means "no vertex normals".
    pub normals: Vec<Vec4>,
    /// Per-vertex UVs. Empty means "no UVs".
    pub uvs: Vec<Vec2>,
    pub faces: Vec<Face>,
    /// Unit face-plane normals, one per face, computed at construction.
    pub plane_normals: Vec<Vec4>,
    pub object_space_aabb: Aabb,
}

impl Mesh {
    /// Validate and construct a mesh. Computes `plane_normals` and
    /// `object_space_aabb`. Fails if any face index is out of bounds, or if
    /// `normals`/`uvs` are non-empty but mismatched in length with
    /// `vertices`.
    pub fn new(
        name: String,
        vertices: Vec<Vec4>,
        normals: Vec<Vec4>,
        uvs: Vec<Vec2>,
        faces: Vec<Face>,
    ) -> Result<Mesh, MeshError> {
        for (face_idx, f) in faces.iter().enumerate() {
            for &idx in &[f.i0, f.i1, f.i2] {
                if idx as usize >= vertices.len() {
                    return Err(MeshError::IndexOutOfBounds {
                        face: face_idx,
                        index: idx,
                        vertex_count: vertices.len(),
                    });
                }
            }
        }
        if !normals.is_empty() && normals.len() != vertices.len() {
            return Err(MeshError::NormalsLenMismatch {
                normals_len: normals.len(),
                vertex_count: vertices.len(),
            });
        }
        if !uvs.is_empty() && uvs.len() != vertices.len() {
            return Err(MeshError::UvsLenMismatch {
                uvs_len: uvs.len(),
                vertex_count: vertices.len(),
            });
        }

        let plane_normals = faces
            .iter()
            .map(|f| {
                let v0 = xyz(vertices[f.i0 as usize]);
                let v1 = xyz(vertices[f.i1 as usize]);
                let v2 = xyz(vertices[f.i2 as usize]);
                let n = (v1 - v0).cross(&(v2 - v0)).normalize();
                Vec4::new(n.x, n.y, n.z, 0.0)
            })
            .collect();

        let object_space_aabb = Aabb::from_points(vertices.iter().map(|v| xyz(*v)));

        Ok(Mesh {
            name,
            vertices,
            normals,
            uvs,
            faces,
            plane_normals,
            object_space_aabb,
        })
    }

    /// The placeholder substituted for a mesh that failed construction
    /// (spec §7, MalformedMesh): zero geometry, empty bounds.
    pub fn empty(name: String) -> Mesh {
        Mesh {
            name,
            vertices: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            faces: Vec::new(),
            plane_normals: Vec::new(),
            object_space_aabb: Aabb::empty(),
        }
    }

    /// A restartable, lazily-computed sequence of triangle views.
    pub fn triangles(&self) -> impl Iterator<Item = TriangleView<'_>> + '_ {
        (0..self.faces.len()).map(move |face_index| TriangleView {
            mesh: self,
            face_index,
        })
    }
}

/// A lazily-computed view of one triangle of a [`Mesh`].
#[derive(Debug, Clone, Copy)]
pub struct TriangleView<'a> {
    mesh: &'a Mesh,
    face_index: usize,
}

impl<'a> TriangleView<'a> {
    fn face(&self) -> Face {
        self.mesh.faces[self.face_index]
    }

    pub fn p0(&self) -> Vec4 {
        self.mesh.vertices[self.face().i0 as usize]
    }

    pub fn p1(&self) -> Vec4 {
        self.mesh.vertices[self.face().i1 as usize]
    }

    pub fn p2(&self) -> Vec4 {
        self.mesh.vertices[self.face().i2 as usize]
    }

    pub fn plane_normal(&self) -> Vec4 {
        self.mesh.plane_normals[self.face_index]
    }

    /// Interpolate the vertex normals by barycentric coordinates. Falls back
    /// to the face's flat plane normal when the mesh carries no per-vertex
    /// normals (spec §4.2 step 5; see DESIGN.md for the §9 fallback
    /// resolution).
    pub fn surface_normal(&self, bary: Vec3) -> Vec4 {
        if self.mesh.normals.is_empty() {
            return self.plane_normal();
        }
        let f = self.face();
        let n0 = self.mesh.normals[f.i0 as usize];
        let n1 = self.mesh.normals[f.i1 as usize];
        let n2 = self.mesh.normals[f.i2 as usize];
        n0 * bary.x + n1 * bary.y + n2 * bary.z
    }

    pub fn surface_uvs(&self, bary: Vec3) -> Vec2 {
        if self.mesh.uvs.is_empty() {
            return Vec2::zeros();
        }
        let f = self.face();
        let uv0 = self.mesh.uvs[f.i0 as usize];
        let uv1 = self.mesh.uvs[f.i1 as usize];
        let uv2 = self.mesh.uvs[f.i2 as usize];
        uv0 * bary.x + uv1 * bary.y + uv2 * bary.z
    }
}

/// One placement of a shared [`Mesh`] under a world transform.
#[derive(Debug, Clone)]
pub struct MeshInstance {
    pub mesh: Arc<Mesh>,
    pub xform: Mat4,
    pub inv_xform: Mat4,
}

impl MeshInstance {
    pub fn new(mesh: Arc<Mesh>, xform: Mat4) -> MeshInstance {
        let inv_xform = xform
            .try_inverse()
            .expect("mesh instance transform must be invertible");
        MeshInstance {
            mesh,
            xform,
            inv_xform,
        }
    }

    /// The tight world-space AABB around this instance's oriented bounding
    /// box (spec §4.3: transform all 8 corners, take the component-wise
    /// min/max).
    pub fn world_aabb(&self) -> Aabb {
        self.mesh.object_space_aabb.transform(&self.xform)
    }
}

#[allow(dead_code)]
fn _assert_scalar_is_float(_: Scalar) {}
