// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use petgraph::{stable_graph, visit::EdgeRef};
use ultraviolet::{Vec2, Vec3};

bitflags::bitflags! {
    /// Per-element state shared by the simple point domains.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ElemFlags: u8 {
        const SELECTED = 1 << 0;
        const HIDDEN   = 1 << 1;
    }
}

/// A graph representation of an edit mesh.
/// The graph is stable so that deleting vertices does not change the index of other vertices;
/// a transform holding the index of a deleted vertex notices at flush time instead of writing
/// into an unrelated one.  Edges carry no data: their length is derived from the endpoints.
pub type MeshGraph = stable_graph::StableUnGraph<Vertex, ()>;

/// An index that represents a vertex in the mesh.
pub type VertIndex = stable_graph::NodeIndex;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub co: Vec3,
    pub normal: Vec3,
    pub flags: ElemFlags,
}

impl Vertex {
    pub fn new(co: Vec3) -> Self {
        Self {
            co,
            normal: Vec3::zero(),
            flags: ElemFlags::empty(),
        }
    }

    #[inline]
    pub fn is_selected(&self) -> bool {
        self.flags.contains(ElemFlags::SELECTED) && !self.is_hidden()
    }

    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.flags.contains(ElemFlags::HIDDEN)
    }
}

/// One face corner in a UV layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UvLoop {
    pub uv: Vec2,
    pub vert: VertIndex,
    pub face: usize,
    pub selected: bool,
}

/// Texture coordinates, stored per face corner.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UvLayer {
    pub loops: Vec<UvLoop>,
}

impl UvLayer {
    /// Partitions the loops into UV islands: corners of one face belong together, and corners
    /// of different faces belong together when they share a vertex and the same UV.  Returns
    /// the island label of every loop, labels dense from zero in loop order.
    pub fn islands(&self) -> Vec<usize> {
        let mut union_find = petgraph::unionfind::UnionFind::<usize>::new(self.loops.len());
        let mut first_in_face = std::collections::HashMap::new();
        let mut by_vert: std::collections::HashMap<VertIndex, Vec<usize>> = Default::default();
        for (i, l) in self.loops.iter().enumerate() {
            let first = *first_in_face.entry(l.face).or_insert(i);
            union_find.union(first, i);
            let shared = by_vert.entry(l.vert).or_default();
            for &j in shared.iter() {
                if self.loops[j].uv == l.uv {
                    union_find.union(i, j);
                }
            }
            shared.push(i);
        }
        dense_labels(union_find.into_labeling())
    }
}

/// Renumbers arbitrary representative labels to 0.., in order of first appearance.
pub fn dense_labels(labels: Vec<usize>) -> Vec<usize> {
    let mut remap = std::collections::HashMap::new();
    labels
        .into_iter()
        .map(|label| {
            let next = remap.len();
            *remap.entry(label).or_insert(next)
        })
        .collect()
}

/// An edit-mode mesh: vertices connected by edges, an optional active vertex, and an optional
/// UV layer.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub graph: MeshGraph,
    pub active: Option<VertIndex>,
    pub uv: Option<UvLayer>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, vertex: Vertex) -> VertIndex {
        self.graph.add_node(vertex)
    }

    pub fn add_edge(&mut self, a: VertIndex, b: VertIndex) {
        self.graph.add_edge(a, b, ());
    }

    pub fn vertex(&self, index: VertIndex) -> Option<&Vertex> {
        self.graph.node_weight(index)
    }

    pub fn vertex_mut(&mut self, index: VertIndex) -> Option<&mut Vertex> {
        self.graph.node_weight_mut(index)
    }

    pub fn contains(&self, index: VertIndex) -> bool {
        self.graph.contains_node(index)
    }

    /// Length of the edge between two vertices, computed from their current coordinates.
    pub fn edge_length(&self, edge: stable_graph::EdgeReference<'_, ()>) -> f32 {
        (self.graph[edge.source()].co - self.graph[edge.target()].co).mag()
    }

    /// Finds the vertex mirrored through the YZ plane, within `epsilon` on every axis.
    pub fn mirror_vertex(&self, index: VertIndex, epsilon: f32) -> Option<VertIndex> {
        let co = self.vertex(index)?.co;
        let target = Vec3::new(-co.x, co.y, co.z);
        self.graph.node_indices().find(|&other| {
            other != index && {
                let d = self.graph[other].co - target;
                d.x.abs() <= epsilon && d.y.abs() <= epsilon && d.z.abs() <= epsilon
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uv_islands_join_on_shared_coordinates() {
        let mut mesh = Mesh::new();
        let v: Vec<_> = (0..4)
            .map(|i| mesh.add_vertex(Vertex::new(Vec3::new(i as f32, 0.0, 0.0))))
            .collect();
        let uv = |x: f32, y: f32| Vec2::new(x, y);
        let loops = vec![
            UvLoop { uv: uv(0.0, 0.0), vert: v[0], face: 0, selected: true },
            UvLoop { uv: uv(0.1, 0.0), vert: v[1], face: 0, selected: true },
            // Shares v[1] and its UV with face 0.
            UvLoop { uv: uv(0.1, 0.0), vert: v[1], face: 1, selected: false },
            UvLoop { uv: uv(0.2, 0.0), vert: v[2], face: 1, selected: false },
            // Shares v[2] but with a different UV: a seam.
            UvLoop { uv: uv(0.9, 0.9), vert: v[2], face: 2, selected: false },
            UvLoop { uv: uv(0.8, 0.9), vert: v[3], face: 2, selected: false },
        ];
        mesh.uv = Some(UvLayer { loops });
        let islands = mesh.uv.as_ref().unwrap().islands();
        assert_eq!(islands, vec![0, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn mirror_vertex_lookup() {
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex(Vertex::new(Vec3::new(1.0, 2.0, 3.0)));
        let b = mesh.add_vertex(Vertex::new(Vec3::new(-1.0, 2.0, 3.0)));
        let c = mesh.add_vertex(Vertex::new(Vec3::new(0.0, 2.0, 3.0)));
        assert_eq!(mesh.mirror_vertex(a, 1e-4), Some(b));
        assert_eq!(mesh.mirror_vertex(c, 1e-4), None);
    }
}

// End of File
