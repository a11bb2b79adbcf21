//! Mesh topology queries via adjacency structures.

use hashbrown::HashMap;

/// Canonical (smaller, larger) key for an undirected edge.
#[inline]
pub fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a < b { (a, b) } else { (b, a) }
}

/// Lightweight topology structure for mesh queries.
///
/// Provides lookups for vertex-to-face and edge-to-face relationships
/// without the overhead of a full half-edge data structure. Hash map
/// iteration order is unspecified, so every query whose result order
/// matters walks the face list instead.
#[derive(Debug, Clone)]
pub struct MeshAdjacency {
    /// Maps vertex index → list of face indices that use this vertex.
    pub vertex_to_faces: HashMap<u32, Vec<u32>>,

    /// Maps edge (min_idx, max_idx) → list of face indices that share this edge.
    /// Edge key is always (smaller_index, larger_index) for canonical ordering.
    pub edge_to_faces: HashMap<(u32, u32), Vec<u32>>,
}

impl MeshAdjacency {
    /// Build adjacency structures from a face list.
    pub fn build(faces: &[[u32; 3]]) -> Self {
        let mut vertex_to_faces: HashMap<u32, Vec<u32>> = HashMap::new();
        let mut edge_to_faces: HashMap<(u32, u32), Vec<u32>> =
            HashMap::with_capacity(faces.len() * 3 / 2 + 3);

        for (face_idx, &[v0, v1, v2]) in faces.iter().enumerate() {
            let face_idx = face_idx as u32;

            vertex_to_faces.entry(v0).or_default().push(face_idx);
            vertex_to_faces.entry(v1).or_default().push(face_idx);
            vertex_to_faces.entry(v2).or_default().push(face_idx);

            for &(a, b) in &[(v0, v1), (v1, v2), (v2, v0)] {
                edge_to_faces.entry(edge_key(a, b)).or_default().push(face_idx);
            }
        }

        Self {
            vertex_to_faces,
            edge_to_faces,
        }
    }

    /// Number of distinct undirected edges.
    pub fn edge_count(&self) -> usize {
        self.edge_to_faces.len()
    }

    /// Find boundary edges (edges with exactly 1 adjacent face).
    ///
    /// In a watertight mesh, this returns an empty iterator.
    pub fn boundary_edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.edge_to_faces
            .iter()
            .filter(|(_, faces)| faces.len() == 1)
            .map(|(&edge, _)| edge)
    }

    /// Boundary edges oriented as they appear in their single face.
    ///
    /// Returned in face order, then corner order within each face, so the
    /// result is deterministic for a given face list.
    pub fn boundary_half_edges(&self, faces: &[[u32; 3]]) -> Vec<(u32, u32)> {
        let mut half_edges = Vec::new();
        for &[v0, v1, v2] in faces {
            for (a, b) in [(v0, v1), (v1, v2), (v2, v0)] {
                if self.is_boundary_edge(a, b) {
                    half_edges.push((a, b));
                }
            }
        }
        half_edges
    }

    /// Find non-manifold edges (edges with more than 2 adjacent faces).
    pub fn non_manifold_edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.edge_to_faces
            .iter()
            .filter(|(_, faces)| faces.len() > 2)
            .map(|(&edge, _)| edge)
    }

    /// Check if the mesh is manifold.
    ///
    /// A manifold mesh has at most 2 faces for every edge.
    /// (Edges with 1 face are boundary edges, which is allowed.)
    pub fn is_manifold(&self) -> bool {
        self.edge_to_faces.values().all(|faces| faces.len() <= 2)
    }

    /// Check if the mesh is watertight (no boundary edges).
    pub fn is_watertight(&self) -> bool {
        self.edge_to_faces.values().all(|faces| faces.len() >= 2)
    }

    /// Count boundary edges.
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_to_faces
            .values()
            .filter(|faces| faces.len() == 1)
            .count()
    }

    /// Whether the edge between `a` and `b` has exactly one adjacent face.
    pub fn is_boundary_edge(&self, a: u32, b: u32) -> bool {
        self.faces_for_edge(a, b).is_some_and(|f| f.len() == 1)
    }

    /// Get faces adjacent to a vertex.
    pub fn faces_for_vertex(&self, vertex_idx: u32) -> Option<&[u32]> {
        self.vertex_to_faces.get(&vertex_idx).map(|v| v.as_slice())
    }

    /// Get faces adjacent to an edge.
    /// The edge is automatically canonicalized (min, max).
    pub fn faces_for_edge(&self, v0: u32, v1: u32) -> Option<&[u32]> {
        self.edge_to_faces.get(&edge_key(v0, v1)).map(|v| v.as_slice())
    }

    /// Vertices sharing an edge with `vertex_idx`, sorted ascending.
    pub fn vertex_neighbors(&self, faces: &[[u32; 3]], vertex_idx: u32) -> Vec<u32> {
        let mut neighbors: Vec<u32> = self
            .faces_for_vertex(vertex_idx)
            .unwrap_or(&[])
            .iter()
            .flat_map(|&f| faces[f as usize])
            .filter(|&v| v != vertex_idx)
            .collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    /// Interior edges whose two faces traverse them in the same direction.
    ///
    /// A consistently oriented manifold has none. Sorted for stable reporting.
    pub fn inconsistent_edges(&self, faces: &[[u32; 3]]) -> Vec<(u32, u32)> {
        let mut edges: Vec<(u32, u32)> = self
            .edge_to_faces
            .iter()
            .filter(|(_, adjacent)| adjacent.len() == 2)
            .filter(|&(&(a, b), adjacent)| {
                let forward = |f: u32| {
                    let [v0, v1, v2] = faces[f as usize];
                    [(v0, v1), (v1, v2), (v2, v0)].contains(&(a, b))
                };
                forward(adjacent[0]) == forward(adjacent[1])
            })
            .map(|(&edge, _)| edge)
            .collect();
        edges.sort_unstable();
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_triangle() -> Vec<[u32; 3]> {
        vec![[0, 1, 2]]
    }

    fn two_triangles_shared_edge() -> Vec<[u32; 3]> {
        vec![[0, 1, 2], [1, 0, 3]]
    }

    fn tetrahedron() -> Vec<[u32; 3]> {
        vec![[0, 1, 2], [0, 2, 3], [0, 3, 1], [1, 3, 2]]
    }

    #[test]
    fn test_single_triangle_is_not_watertight() {
        let adj = MeshAdjacency::build(&single_triangle());
        assert!(!adj.is_watertight());
        assert!(adj.is_manifold());
        assert_eq!(adj.boundary_edge_count(), 3);
        assert_eq!(adj.edge_count(), 3);
    }

    #[test]
    fn test_two_triangles_shared_edge() {
        let adj = MeshAdjacency::build(&two_triangles_shared_edge());
        let shared = adj.faces_for_edge(0, 1).expect("edge exists");
        assert_eq!(shared.len(), 2);
        assert_eq!(adj.boundary_edge_count(), 4);
        assert!(!adj.is_boundary_edge(0, 1));
        assert!(adj.is_boundary_edge(1, 2));
    }

    #[test]
    fn test_tetrahedron_is_watertight() {
        let adj = MeshAdjacency::build(&tetrahedron());
        assert!(adj.is_watertight());
        assert!(adj.is_manifold());
        assert_eq!(adj.boundary_edge_count(), 0);
        assert_eq!(adj.non_manifold_edges().count(), 0);
        assert!(adj.inconsistent_edges(&tetrahedron()).is_empty());
    }

    #[test]
    fn test_vertex_to_faces() {
        let adj = MeshAdjacency::build(&tetrahedron());
        for v in 0..4u32 {
            let faces = adj.faces_for_vertex(v).expect("vertex exists");
            assert_eq!(faces.len(), 3, "vertex {} should touch 3 faces", v);
        }
    }

    #[test]
    fn test_edge_canonicalization() {
        let adj = MeshAdjacency::build(&two_triangles_shared_edge());
        let e1 = adj.faces_for_edge(0, 1);
        let e2 = adj.faces_for_edge(1, 0);
        assert_eq!(e1, e2);
    }

    #[test]
    fn test_boundary_half_edges_follow_face_winding() {
        let faces = two_triangles_shared_edge();
        let adj = MeshAdjacency::build(&faces);
        let half_edges = adj.boundary_half_edges(&faces);
        assert_eq!(half_edges, vec![(1, 2), (2, 0), (0, 3), (3, 1)]);
    }

    #[test]
    fn test_vertex_neighbors() {
        let faces = two_triangles_shared_edge();
        let adj = MeshAdjacency::build(&faces);
        assert_eq!(adj.vertex_neighbors(&faces, 0), vec![1, 2, 3]);
        assert_eq!(adj.vertex_neighbors(&faces, 2), vec![0, 1]);
        assert!(adj.vertex_neighbors(&faces, 9).is_empty());
    }

    #[test]
    fn test_inconsistent_winding_detected() {
        let faces = vec![[0, 1, 2], [0, 1, 3]];
        let adj = MeshAdjacency::build(&faces);
        assert_eq!(adj.inconsistent_edges(&faces), vec![(0, 1)]);
    }

    #[test]
    fn test_non_manifold_edge_detected() {
        let faces = vec![[0, 1, 2], [1, 0, 3], [0, 1, 4]];
        let adj = MeshAdjacency::build(&faces);
        assert!(!adj.is_manifold());
        assert_eq!(adj.non_manifold_edges().collect::<Vec<_>>(), vec![(0, 1)]);
    }
}
