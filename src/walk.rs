use std::fmt::Display;

use itertools::Itertools;
use rand::Rng;
use rayon::prelude::*;

use crate::geometry::{orient, Orientation, Point};
use crate::triangulation::{ccw, cw, FaceId, Triangulation, VertexId};

/// The record of one walk: every face visited in order, plus statistics.
///
/// Revisits are permitted in the path (PivotWalk legitimately revisits the
/// pivot face once when it backtracks), so [`Walk::triangles_visited`] can
/// exceed [`Walk::distinct_triangles`].
#[derive(Debug, Clone, PartialEq)]
pub struct Walk {
    pub(crate) path: Vec<FaceId>,
    pub(crate) orientations: usize,
    pub(crate) pivots: Vec<Point>,
}

impl Walk {
    /// The visited faces, in visitation order.
    pub fn faces(&self) -> &[FaceId] {
        &self.path
    }

    /// The final face of the walk. Infinite when the target lies outside the
    /// convex hull.
    pub fn face(&self) -> FaceId {
        *self
            .path
            .last()
            .expect("A walk always visits at least one face")
    }

    /// Number of faces visited, revisits included.
    pub fn triangles_visited(&self) -> usize {
        self.path.len()
    }

    /// Number of distinct faces visited.
    pub fn distinct_triangles(&self) -> usize {
        self.path.iter().unique().count()
    }

    /// Number of orientation-predicate evaluations performed by the walk.
    pub fn orientations_performed(&self) -> usize {
        self.orientations
    }

    /// The pivot points used, in order. Empty for non-pivot strategies.
    pub fn pivots(&self) -> &[Point] {
        &self.pivots
    }

    /// Converts the visited faces into drawable triangles, skipping infinite
    /// faces.
    ///
    /// This is pure bookkeeping for a rendering layer: no geometry beyond
    /// reading vertex coordinates.
    pub fn polygons(&self, triangulation: &Triangulation) -> Vec<[Point; 3]> {
        self.path
            .iter()
            .filter_map(|&f| triangulation.triangle(f))
            .collect()
    }
}

/// A walk that could not be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkError {
    /// The starting face does not belong to the triangulation. Rejected
    /// before any traversal begins.
    InvalidStartFace(FaceId),
    /// The iteration budget was exhausted before the termination test was
    /// satisfied. Signals a traversal bug or a corrupted mesh; the partial
    /// path is never returned silently.
    DidNotConverge { faces_visited: usize },
}

impl Display for WalkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidStartFace(face) => {
                write!(
                    f,
                    "starting face {} does not belong to the triangulation",
                    face.index()
                )
            }
            Self::DidNotConverge { faces_visited } => {
                write!(
                    f,
                    "walk did not converge after visiting {} faces",
                    faces_visited
                )
            }
        }
    }
}

impl std::error::Error for WalkError {}

/// A fair binary random source.
///
/// The randomized strategies draw their per-step decisions from a
/// `BitSource` so tests can swap in a fixed sequence. Any [`rand::Rng`]
/// qualifies.
pub trait BitSource {
    fn next_bit(&mut self) -> bool;
}

impl<R: Rng> BitSource for R {
    fn next_bit(&mut self) -> bool {
        self.gen()
    }
}

/// Shared per-walk state threaded through every strategy: the visited-face
/// path, the orientation-test counter and the termination budget.
pub(crate) struct WalkContext<'t> {
    tri: &'t Triangulation,
    path: Vec<FaceId>,
    orientations: usize,
    pivots: Vec<Point>,
    budget: usize,
}

impl<'t> WalkContext<'t> {
    pub(crate) fn new(tri: &'t Triangulation) -> Self {
        Self {
            tri,
            path: Vec::new(),
            orientations: 0,
            pivots: Vec::new(),
            // Any walk visiting this many faces has revisited far beyond the
            // single legitimate backtrack, so treat it as non-termination.
            budget: 4 * tri.face_count() + 16,
        }
    }

    /// The counted orientation predicate. Every strategy routes its
    /// geometric tests through here; the count has no effect on control
    /// flow.
    pub(crate) fn orient(&mut self, p: Point, q: Point, r: Point) -> Orientation {
        self.orientations += 1;
        orient(p, q, r)
    }

    /// Appends a face to the path, in visitation order.
    pub(crate) fn visit(&mut self, face: FaceId) -> Result<(), WalkError> {
        self.path.push(face);
        if self.path.len() > self.budget {
            Err(WalkError::DidNotConverge {
                faces_visited: self.path.len(),
            })
        } else {
            Ok(())
        }
    }

    pub(crate) fn record_pivot(&mut self, pivot: Point) {
        self.pivots.push(pivot);
    }

    pub(crate) fn finish(self) -> Walk {
        Walk {
            path: self.path,
            orientations: self.orientations,
            pivots: self.pivots,
        }
    }
}

/// A point-location strategy walking over a triangulation.
///
/// All strategies share this contract: given a target point and a starting
/// face they produce the ordered path of faces visited together with
/// statistics. The mesh must not be mutated for the duration of a walk;
/// this is a caller obligation, not an enforced invariant.
pub trait Walker {
    /// The triangulation this walker operates on.
    fn triangulation(&self) -> &Triangulation;

    /// Walks from `start` to the face containing `target`.
    fn walk_from(&self, start: FaceId, target: Point) -> Result<Walk, WalkError>;

    /// Walks to the face containing `target`, starting from the infinite
    /// face.
    fn walk(&self, target: Point) -> Result<Walk, WalkError> {
        self.walk_from(self.triangulation().infinite_face(), target)
    }

    /// Locates one query point.
    ///
    /// Returns [`None`] if the query point lies outside the convex hull.
    fn locate_one(&self, point: &[f64; 2]) -> Result<Option<FaceId>, WalkError> {
        let walk = self.walk(Point::from(point))?;
        let face = walk.face();
        Ok((!self.triangulation().is_infinite(face)).then_some(face))
    }

    /// Locates several query points.
    fn locate_many(&self, points: &[[f64; 2]]) -> Result<Vec<Option<FaceId>>, WalkError> {
        points.iter().map(|point| self.locate_one(point)).collect()
    }

    /// Locates several query points in parallel.
    fn par_locate_many(&self, points: &[[f64; 2]]) -> Result<Vec<Option<FaceId>>, WalkError>
    where
        Self: std::marker::Sync,
    {
        points
            .par_iter()
            .map(|point| self.locate_one(point))
            .collect()
    }
}

/// Rejects start faces that do not belong to the triangulation.
pub(crate) fn validate_start(tri: &Triangulation, start: FaceId) -> Result<(), WalkError> {
    if tri.has_face(start) {
        Ok(())
    } else {
        Err(WalkError::InvalidStartFace(start))
    }
}

/// Probes an infinite start face's hull edge. Returns the interior neighbor
/// to step into (already visited), or [`None`] when the target lies on the
/// outer side of the hull edge and the infinite face is the answer.
pub(crate) fn enter_hull(
    tri: &Triangulation,
    ctx: &mut WalkContext,
    inf: FaceId,
    target: Point,
) -> Result<Option<FaceId>, WalkError> {
    let k = tri
        .vertex_index(inf, VertexId::INFINITE)
        .expect("An infinite face contains the infinite vertex");
    let f = tri.neighbor(inf, k);
    let j = tri
        .index_of(f, inf)
        .expect("Adjacency should be symmetric");
    let a = tri.point(tri.vertex(f, ccw(j)));
    let b = tri.point(tri.vertex(f, cw(j)));
    // Seen from the interior face, the outside is to the right of the hull
    // edge.
    if ctx.orient(a, b, target) == Orientation::Right {
        Ok(None)
    } else {
        ctx.visit(f)?;
        Ok(Some(f))
    }
}
