use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use smallvec::SmallVec;

use crate::geometry::{Orientation, Point};
use crate::triangulation::{ccw, cw, FaceId, Triangulation};
use crate::walk::{enter_hull, validate_start, BitSource, Walk, WalkContext, WalkError, Walker};

/// The canonical "walk toward the point" strategy.
///
/// At each step the two edges not entered through are tested in an order
/// chosen by a coin flip, and the walk crosses the first edge the target
/// lies strictly beyond. The randomization matters: a fixed test order has
/// pathological worst cases on adversarial meshes, while random order gives
/// expected sub-linear visits on well-shaped (e.g. Delaunay)
/// triangulations.
///
/// A walk draws its coin flips from a fresh [`ChaCha8Rng`] seeded with this
/// walker's seed, so the same seed always reproduces the same path. Use
/// [`VisibilityWalk::walk_with`] to supply an explicit [`BitSource`]
/// instead.
pub struct VisibilityWalk<'t> {
    tri: &'t Triangulation,
    seed: u64,
}

const DEFAULT_SEED: u64 = 1234;

impl<'t> VisibilityWalk<'t> {
    pub fn new(tri: &'t Triangulation) -> Self {
        Self::with_seed(tri, DEFAULT_SEED)
    }

    pub fn with_seed(tri: &'t Triangulation, seed: u64) -> Self {
        Self { tri, seed }
    }

    /// Walks with an explicit coin-flip source.
    pub fn walk_with<B: BitSource>(
        &self,
        bits: &mut B,
        start: FaceId,
        target: Point,
    ) -> Result<Walk, WalkError> {
        let tri = self.tri;
        validate_start(tri, start)?;
        let mut ctx = WalkContext::new(tri);

        let mut c = start;
        let mut prev = None;
        ctx.visit(c)?;
        if tri.is_infinite(c) {
            match enter_hull(tri, &mut ctx, c, target)? {
                Some(f) => {
                    prev = Some(c);
                    c = f;
                }
                // The target is outside the hull: the infinite face is the
                // answer.
                None => return Ok(ctx.finish()),
            }
        }

        'walk: loop {
            if tri.is_infinite(c) {
                break;
            }
            let entry = prev.and_then(|p| tri.index_of(c, p));
            let mut order: SmallVec<[usize; 3]> =
                (0..3).filter(|i| Some(*i) != entry).collect();
            if order.len() == 2 && bits.next_bit() {
                order.swap(0, 1);
            }
            for &i in &order {
                let a = tri.point(tri.vertex(c, ccw(i)));
                let b = tri.point(tri.vertex(c, cw(i)));
                // Strictly beyond this edge: cross it. Collinear does not
                // block, so a target exactly on an edge is accepted by
                // whichever face reaches it first.
                if ctx.orient(a, b, target) == Orientation::Right {
                    prev = Some(c);
                    c = tri.neighbor(c, i);
                    ctx.visit(c)?;
                    continue 'walk;
                }
            }
            // One final test on the entry edge before accepting this face.
            if let Some(i) = entry {
                let a = tri.point(tri.vertex(c, ccw(i)));
                let b = tri.point(tri.vertex(c, cw(i)));
                if ctx.orient(a, b, target) == Orientation::Right {
                    prev = Some(c);
                    c = tri.neighbor(c, i);
                    ctx.visit(c)?;
                    continue 'walk;
                }
            }
            break;
        }

        Ok(ctx.finish())
    }
}

impl Walker for VisibilityWalk<'_> {
    fn triangulation(&self) -> &Triangulation {
        self.tri
    }

    fn walk_from(&self, start: FaceId, target: Point) -> Result<Walk, WalkError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.walk_with(&mut rng, start, target)
    }
}
