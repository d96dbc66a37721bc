//! Bounding Volume Hierarchy over world-space mesh instances (spec §4.3/§4.4).
//!
//! Construction is a top-down median split on the longest axis. Traversal is
//! non-recursive, using an explicit stack of node references and a sorted
//! candidate list so AABB distance prunes triangle tests that can't win.

use tracing::debug;

use crate::aabb::Aabb;
use crate::mesh::MeshInstance;
use crate::prim::Scalar;
use crate::ray::{IntersectionType, Ray, TraceInfo};

/// One node of the tree. Leaves carry exactly one instance; internal nodes
/// carry two children and no instance.
enum BvNode {
    Leaf {
        volume: Aabb,
        instance: MeshInstance,
    },
    Internal {
        volume: Aabb,
        left: Box<BvNode>,
        right: Box<BvNode>,
    },
}

impl BvNode {
    fn volume(&self) -> &Aabb {
        match self {
            BvNode::Leaf { volume, .. } => volume,
            BvNode::Internal { volume, .. } => volume,
        }
    }
}

/// Bounding Volume Hierarchy. Built once over a flattened list of world-space
/// mesh instances, then queried many times via [`Bvh::trace_ray`].
pub struct Bvh {
    root: Option<Box<BvNode>>,
}

impl Bvh {
    /// Build a BVH over `instances`. Order is otherwise irrelevant; empty
    /// input produces a BVH whose every trace is a miss.
    pub fn build(instances: Vec<MeshInstance>) -> Bvh {
        let leaves: Vec<Box<BvNode>> = instances
            .into_iter()
            .map(|instance| {
                let volume = instance.world_aabb();
                Box::new(BvNode::Leaf { volume, instance })
            })
            .collect();

        debug!(leaves = leaves.len(), "building bvh");
        for (i, leaf) in leaves.iter().enumerate() {
            let volume = leaf.volume();
            let extent = volume.extent();
            debug!(leaf = i, x = extent.x, y = extent.y, z = extent.z, "leaf aabb extent");
        }

        Bvh {
            root: build_topdown(leaves),
        }
    }

    /// Trace `ray` through the tree, returning the closest triangle hit
    /// across every instance, or a miss if none is found (spec §4.4).
    pub fn trace_ray(&self, ray: &Ray) -> TraceInfo<'_> {
        struct LeafCandidate<'a> {
            instance: &'a MeshInstance,
            distance: Scalar,
        }

        let mut to_search: Vec<&BvNode> = Vec::new();
        if let Some(root) = &self.root {
            to_search.push(root);
        }

        let mut candidates: Vec<LeafCandidate> = Vec::new();
        while let Some(node) = to_search.pop() {
            let result = ray.intersect_aabb(node.volume());
            match result.kind {
                IntersectionType::Intersected | IntersectionType::InsideVolume => match node {
                    BvNode::Leaf { instance, .. } => candidates.push(LeafCandidate {
                        instance,
                        distance: result.distance,
                    }),
                    BvNode::Internal { left, right, .. } => {
                        to_search.push(left);
                        to_search.push(right);
                    }
                },
                _ => {}
            }
        }

        candidates.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap());

        let mut best = TraceInfo::miss();
        for candidate in &candidates {
            if best.distance < candidate.distance {
                break;
            }
            let hit = ray.intersect_mesh_instance(candidate.instance);
            if hit.kind == IntersectionType::Intersected && hit.distance < best.distance {
                best = hit;
            }
        }
        best
    }
}

/// Recursively build an internal-node tree over `nodes` by longest-axis
/// median split (spec §4.3). `nodes` is consumed; order within it does not
/// matter to the caller.
fn build_topdown(mut nodes: Vec<Box<BvNode>>) -> Option<Box<BvNode>> {
    match nodes.len() {
        0 => None,
        1 => nodes.pop(),
        _ => {
            let enclosing = nodes
                .iter()
                .fold(Aabb::empty(), |acc, n| acc.union(n.volume()));
            let extent = enclosing.extent();
            let axis = if extent.x >= extent.y && extent.x >= extent.z {
                0
            } else if extent.y >= extent.z {
                1
            } else {
                2
            };

            nodes.sort_by(|a, b| {
                let mid = |v: &Aabb| (v.min[axis] + v.max[axis]) * 0.5;
                mid(a.volume()).partial_cmp(&mid(b.volume())).unwrap()
            });

            let right_half = nodes.split_off(nodes.len() / 2);
            let left = build_topdown(nodes);
            let right = build_topdown(right_half);

            match (left, right) {
                (Some(left), Some(right)) => Some(Box::new(BvNode::Internal {
                    volume: enclosing,
                    left,
                    right,
                })),
                (Some(only), None) | (None, Some(only)) => Some(only),
                (None, None) => None,
            }
        }
    }
}
