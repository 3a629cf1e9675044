use std::collections::HashMap;

use anyhow::{anyhow, ensure, Result};

use crate::geometry::{orient, Orientation, Point};

/// Identifies a vertex of a [`Triangulation`].
///
/// The special value [`VertexId::INFINITE`] is the sentinel vertex
/// representing the unbounded region outside the convex hull. It has no
/// coordinates and never participates in an orientation test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexId(pub(crate) usize);

impl VertexId {
    pub const INFINITE: VertexId = VertexId(usize::MAX);

    pub fn is_infinite(self) -> bool {
        self == Self::INFINITE
    }

    /// The index of this vertex in the triangulation's point list.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Identifies a face (finite or infinite) of a [`Triangulation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(pub(crate) usize);

impl FaceId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Face {
    vertices: [VertexId; 3],
    neighbors: [FaceId; 3],
}

/// Corner index following `i` in counter-clockwise order.
pub(crate) fn ccw(i: usize) -> usize {
    (i + 1) % 3
}

/// Corner index preceding `i` in counter-clockwise order.
pub(crate) fn cw(i: usize) -> usize {
    (i + 2) % 3
}

const UNSET: FaceId = FaceId(usize::MAX);

/// A planar triangulation stored as an arena of faces.
///
/// Faces hold three vertex ids in counter-clockwise order and three neighbor
/// ids indexed such that `neighbors[i]` is the face sharing the edge
/// *opposite* `vertices[i]`. Adjacency is symmetric. The convex hull is
/// ringed with infinite faces (each containing [`VertexId::INFINITE`]) so
/// that every edge of the triangulation has exactly two incident faces,
/// which lets the walk strategies traverse the boundary without special
/// cases.
///
/// A triangulation is read-only once built: the walk strategies assume no
/// mutation happens mid-traversal. Running several walks concurrently over
/// one `Triangulation` is fine.
#[derive(Debug, Clone)]
pub struct Triangulation {
    points: Vec<Point>,
    faces: Vec<Face>,
    infinite_face: FaceId,
}

impl Triangulation {
    /// Builds a triangulation from a triangle soup.
    ///
    /// `triangles` holds vertex indices with a stride of 3. Triangles may be
    /// given in either winding; they are normalized to counter-clockwise.
    ///
    /// Fails if an index is out of range, a triangle is degenerate, an edge
    /// is shared by more than two triangles, or the boundary does not form a
    /// single closed loop (disconnected or punctured inputs are rejected).
    pub fn new(points: Vec<[f64; 2]>, triangles: Vec<usize>) -> Result<Self> {
        ensure!(
            triangles.len() % 3 == 0,
            "The triangle list should have a stride of 3 but its length is {}.",
            triangles.len()
        );
        ensure!(!triangles.is_empty(), "The triangulation has no triangles.");
        let points: Vec<Point> = points.iter().map(Point::from).collect();

        let mut faces = Vec::with_capacity(triangles.len() / 3);
        for tri in triangles.chunks_exact(3) {
            let [v0, v1, v2] = [tri[0], tri[1], tri[2]];
            for &v in &[v0, v1, v2] {
                ensure!(
                    v < points.len(),
                    "Vertex index {} is out of range (there are {} points).",
                    v,
                    points.len()
                );
            }
            // Normalize the winding so every finite face is counter-clockwise.
            let vertices = match orient(points[v0], points[v1], points[v2]) {
                Orientation::Left => [v0, v1, v2],
                Orientation::Right => [v0, v2, v1],
                Orientation::Collinear => {
                    return Err(anyhow!(
                        "Triangle ({}, {}, {}) is degenerate.",
                        v0,
                        v1,
                        v2
                    ))
                }
            };
            faces.push(Face {
                vertices: vertices.map(VertexId),
                neighbors: [UNSET; 3],
            });
        }

        // Match twin half-edges to fill in the adjacency. Each undirected
        // edge may be seen at most twice, and the two directed versions must
        // run in opposite directions once the winding is normalized.
        let mut unmatched: HashMap<(usize, usize), (usize, usize, (usize, usize))> =
            HashMap::with_capacity(faces.len() * 3 / 2);
        for f in 0..faces.len() {
            for i in 0..3 {
                let a = faces[f].vertices[ccw(i)].0;
                let b = faces[f].vertices[cw(i)].0;
                let key = (a.min(b), a.max(b));
                match unmatched.remove(&key) {
                    Some((g, j, (ga, gb))) => {
                        ensure!(
                            faces[g].neighbors[j] == UNSET && (ga, gb) == (b, a),
                            "Edge ({}, {}) is shared by more than two triangles or has \
                             inconsistent orientation.",
                            key.0,
                            key.1
                        );
                        faces[f].neighbors[i] = FaceId(g);
                        faces[g].neighbors[j] = FaceId(f);
                    }
                    None => {
                        ensure!(
                            faces[f].neighbors[i] == UNSET,
                            "Edge ({}, {}) is shared by more than two triangles.",
                            key.0,
                            key.1
                        );
                        unmatched.insert(key, (f, i, (a, b)));
                    }
                }
            }
        }

        // The remaining half-edges form the boundary. Ring it with infinite
        // faces so every edge gets a second incident face. A boundary edge
        // (a, b) taken from a counter-clockwise face runs counter-clockwise
        // around the hull, so chaining by start vertex closes the ring.
        ensure!(
            !unmatched.is_empty(),
            "The triangulation has no boundary edges."
        );
        // Iterate the boundary in face order, not `HashMap` order, so two
        // constructions from the same input assign the same infinite-face
        // ids.
        let mut boundary: Vec<_> = unmatched.into_values().collect();
        boundary.sort_unstable_by_key(|&(f, i, _)| (f, i));
        let mut hull_start: HashMap<usize, usize> = HashMap::with_capacity(boundary.len());
        let n_finite = faces.len();
        let mut hull_edges = Vec::with_capacity(boundary.len());
        for (f, i, (a, b)) in boundary {
            let g = faces.len();
            // Infinite face [b, a, INFINITE]: the finite edge is opposite the
            // infinite vertex, at neighbor slot 2.
            faces.push(Face {
                vertices: [VertexId(b), VertexId(a), VertexId::INFINITE],
                neighbors: [UNSET, UNSET, FaceId(f)],
            });
            faces[f].neighbors[i] = FaceId(g);
            ensure!(
                hull_start.insert(a, g).is_none(),
                "The boundary is pinched at vertex {}.",
                a
            );
            hull_edges.push((g, b));
        }
        for (g, b) in hull_edges {
            // The next hull edge starts where this one ends. The two infinite
            // faces share the edge (b, INFINITE).
            let next = *hull_start
                .get(&b)
                .ok_or_else(|| anyhow!("The boundary is not a closed loop at vertex {}.", b))?;
            faces[g].neighbors[1] = FaceId(next);
            faces[next].neighbors[0] = FaceId(g);
        }

        // A disconnected soup (or one with an interior hole) closes each of
        // its boundary loops independently; walks would then never reach the
        // faces outside the loop they start on. Require a single loop.
        let n_hull = faces.len() - n_finite;
        let mut f = n_finite;
        let mut laps = 0;
        loop {
            f = faces[f].neighbors[1].0;
            laps += 1;
            if f == n_finite || laps > n_hull {
                break;
            }
        }
        ensure!(
            laps == n_hull,
            "The boundary forms more than one loop: the triangulation is \
             disconnected or has a hole."
        );

        let triangulation = Self {
            points,
            faces,
            infinite_face: FaceId(n_finite),
        };
        debug_assert!(triangulation
            .faces
            .iter()
            .all(|face| face.neighbors.iter().all(|&n| n != UNSET)));
        Ok(triangulation)
    }

    /// Builds a triangulated regular grid with `nx` by `ny` cells, each cell
    /// split into two triangles.
    ///
    /// Cell `(i, j)` becomes faces `2 * (j * nx + i)` (lower-right triangle)
    /// and `2 * (j * nx + i) + 1` (upper-left triangle).
    pub fn grid(xmin: f64, xmax: f64, ymin: f64, ymax: f64, nx: usize, ny: usize) -> Result<Self> {
        ensure!(
            xmin < xmax && ymin < ymax,
            "The grid bounds should be non-empty."
        );
        ensure!(nx > 0 && ny > 0, "The grid should have at least one cell.");

        let dx = (xmax - xmin) / nx as f64;
        let dy = (ymax - ymin) / ny as f64;
        let mut points = Vec::with_capacity((nx + 1) * (ny + 1));
        for j in 0..=ny {
            for i in 0..=nx {
                points.push([xmin + i as f64 * dx, ymin + j as f64 * dy]);
            }
        }
        let mut triangles = Vec::with_capacity(6 * nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let p00 = j * (nx + 1) + i;
                let p10 = p00 + 1;
                let p01 = p00 + nx + 1;
                let p11 = p01 + 1;
                triangles.extend([p00, p10, p11]);
                triangles.extend([p00, p11, p01]);
            }
        }
        Self::new(points, triangles)
    }

    /// Number of (finite) vertices.
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Number of faces, infinite faces included.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of finite faces.
    pub fn finite_face_count(&self) -> usize {
        self.faces
            .iter()
            .filter(|face| !face.vertices.iter().any(|v| v.is_infinite()))
            .count()
    }

    /// Returns an arbitrary infinite face, the conventional entry point for
    /// a walk with no explicit start face.
    pub fn infinite_face(&self) -> FaceId {
        self.infinite_face
    }

    /// Returns `true` if `face` contains the infinite vertex.
    pub fn is_infinite(&self, face: FaceId) -> bool {
        self.faces[face.0].vertices.iter().any(|v| v.is_infinite())
    }

    /// Returns `true` if `face` is an id of this triangulation.
    pub fn has_face(&self, face: FaceId) -> bool {
        face.0 < self.faces.len()
    }

    /// The vertex at `corner` (0, 1 or 2) of `face`.
    pub fn vertex(&self, face: FaceId, corner: usize) -> VertexId {
        self.faces[face.0].vertices[corner]
    }

    /// The face sharing the edge of `face` opposite `corner`.
    pub fn neighbor(&self, face: FaceId, corner: usize) -> FaceId {
        self.faces[face.0].neighbors[corner]
    }

    /// The coordinates of a finite vertex.
    ///
    /// # Panics
    ///
    /// Panics if `vertex` is the infinite vertex.
    pub fn point(&self, vertex: VertexId) -> Point {
        assert!(
            !vertex.is_infinite(),
            "The infinite vertex has no coordinates."
        );
        self.points[vertex.0]
    }

    /// The corner of `face` whose opposite edge is shared with `neighbor`.
    pub fn index_of(&self, face: FaceId, neighbor: FaceId) -> Option<usize> {
        self.faces[face.0]
            .neighbors
            .iter()
            .position(|&n| n == neighbor)
    }

    /// The corner of `face` holding `vertex`.
    pub fn vertex_index(&self, face: FaceId, vertex: VertexId) -> Option<usize> {
        self.faces[face.0]
            .vertices
            .iter()
            .position(|&v| v == vertex)
    }

    /// Iterates over all face ids, infinite faces included.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        (0..self.faces.len()).map(FaceId)
    }

    /// The corner positions of a finite face, or [`None`] for an infinite
    /// face.
    ///
    /// This is the only rendering-adjacent operation of the crate: a walked
    /// face converts to a drawable triangle without any further geometry.
    pub fn triangle(&self, face: FaceId) -> Option<[Point; 3]> {
        let vertices = self.faces[face.0].vertices;
        if vertices.iter().any(|v| v.is_infinite()) {
            return None;
        }
        Some(vertices.map(|v| self.points[v.0]))
    }

    /// Returns `true` if `point` lies in `face` (boundary included).
    ///
    /// Always `false` for infinite faces.
    pub fn contains(&self, face: FaceId, point: Point) -> bool {
        let Some([a, b, c]) = self.triangle(face) else {
            return false;
        };
        // Counter-clockwise winding: inside means never to the right of an
        // edge.
        orient(a, b, point) != Orientation::Right
            && orient(b, c, point) != Orientation::Right
            && orient(c, a, point) != Orientation::Right
    }

    /// Checks the structural invariants of the triangulation.
    ///
    /// This is meant for debugging purposes.
    ///
    /// # Panics
    ///
    /// Panics if adjacency is not symmetric, a neighbor does not share the
    /// expected edge, or a finite face is not counter-clockwise.
    pub fn check(&self) {
        for f in self.face_ids() {
            for i in 0..3 {
                let n = self.neighbor(f, i);
                let j = self
                    .index_of(n, f)
                    .expect("Adjacency should be symmetric");
                // The shared edge has the same vertex pair on both sides.
                let mut ours = [self.vertex(f, ccw(i)), self.vertex(f, cw(i))];
                let mut theirs = [self.vertex(n, ccw(j)), self.vertex(n, cw(j))];
                ours.sort_by_key(|v| v.0);
                theirs.sort_by_key(|v| v.0);
                assert_eq!(ours, theirs, "Neighbors should share an edge");
            }
            if let Some([a, b, c]) = self.triangle(f) {
                assert_eq!(
                    orient(a, b, c),
                    Orientation::Left,
                    "Finite faces should be counter-clockwise"
                );
            }
        }
    }
}
