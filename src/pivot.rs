use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::geometry::{Orientation, Point};
use crate::triangulation::{ccw, cw, FaceId, Triangulation, VertexId};
use crate::walk::{enter_hull, validate_start, BitSource, Walk, WalkContext, WalkError, Walker};

/// Sweep direction around a pivot vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SweepDir {
    Ccw,
    Cw,
}

impl SweepDir {
    fn flipped(self) -> Self {
        match self {
            Self::Ccw => Self::Cw,
            Self::Cw => Self::Ccw,
        }
    }
}

/// How a sweep direction is picked when a new pivot is established.
enum DirectionChooser<'b> {
    /// A fair coin flip per pivot (PivotWalk).
    Coin(&'b mut dyn BitSource),
    /// Alternate on a fixed schedule (SWalk).
    Alternating(SweepDir),
}

impl DirectionChooser<'_> {
    fn next(&mut self) -> SweepDir {
        match self {
            Self::Coin(bits) => {
                if bits.next_bit() {
                    SweepDir::Ccw
                } else {
                    SweepDir::Cw
                }
            }
            Self::Alternating(dir) => {
                let current = *dir;
                *dir = current.flipped();
                current
            }
        }
    }
}

/// The corner whose opposite edge the sweep crosses next, and the lead
/// vertex spanning the pivot ray being tested, for a face with the pivot at
/// `pivot_corner`.
fn lead(tri: &Triangulation, face: FaceId, pivot_corner: usize, dir: SweepDir) -> (usize, VertexId) {
    match dir {
        SweepDir::Ccw => (ccw(pivot_corner), tri.vertex(face, cw(pivot_corner))),
        SweepDir::Cw => (cw(pivot_corner), tri.vertex(face, ccw(pivot_corner))),
    }
}

/// Returns `true` if the target lies strictly beyond the pivot ray in the
/// sweep direction, i.e. the sweep should advance another face.
fn beyond_lead(
    ctx: &mut WalkContext,
    pivot: Point,
    lead: Point,
    target: Point,
    dir: SweepDir,
) -> bool {
    let side = ctx.orient(pivot, lead, target);
    match dir {
        SweepDir::Ccw => side == Orientation::Left,
        SweepDir::Cw => side == Orientation::Right,
    }
}

/// The sweep core shared by [`PivotWalk`] and [`SWalk`].
///
/// Walks around a sequence of pivot vertices. At each pivot the walk sweeps
/// through the incident faces in the chosen direction until the target is no
/// longer beyond the lead ray, then the sink test on the edge opposite the
/// pivot either confirms containment or crosses into the face that carries
/// the next pivot.
///
/// The first sweep test of a new pivot is omitted: the walk speculatively
/// advances past the lead edge and keeps the omitted ray pending. When a
/// continue test first fails with the omitted test still pending, the
/// omitted test runs; if it fails too, the speculation was wrong and the
/// walk backtracks to the pivot face (the path records the revisit), flips
/// direction and resolves there. Once one continue test has succeeded the
/// pending test is dropped, since the crossed ray re-establishes the wedge
/// invariant on its own.
fn sweep_walk(
    tri: &Triangulation,
    mut chooser: DirectionChooser,
    start: FaceId,
    target: Point,
) -> Result<Walk, WalkError> {
    validate_start(tri, start)?;
    let mut ctx = WalkContext::new(tri);

    let mut c = start;
    let mut prev;
    ctx.visit(c)?;
    if tri.is_infinite(c) {
        match enter_hull(tri, &mut ctx, c, target)? {
            Some(f) => {
                prev = c;
                c = f;
            }
            None => return Ok(ctx.finish()),
        }
    } else {
        // Probe the start face's edges for visibility, as VisibilityWalk
        // does, to find the first pivot.
        let mut crossed = None;
        for i in 0..3 {
            let a = tri.point(tri.vertex(c, ccw(i)));
            let b = tri.point(tri.vertex(c, cw(i)));
            if ctx.orient(a, b, target) == Orientation::Right {
                crossed = Some(i);
                break;
            }
        }
        let Some(i) = crossed else {
            // The start face already contains the target.
            return Ok(ctx.finish());
        };
        prev = c;
        c = tri.neighbor(c, i);
        ctx.visit(c)?;
    }

    'pivot: loop {
        if tri.is_infinite(c) {
            // Crossed a hull edge: the target is outside the convex hull.
            break;
        }
        // The pivot is the vertex of `c` opposite the entry edge. Entering
        // through that edge established that the target is on this side of
        // it, so if the target lands in the pivot's wedge it is in `c`.
        let pc = tri
            .index_of(c, prev)
            .expect("The pivot face is entered through a shared edge");
        let pivot = tri.vertex(c, pc);
        let pv = tri.point(pivot);
        ctx.record_pivot(pv);
        let mut dir = chooser.next();

        let (lead_corner, lead_vertex) = lead(tri, c, pc, dir);
        let lead_face = tri.neighbor(c, lead_corner);
        let mut omitted = None;
        let mut g;
        let mut gi;
        if !tri.is_infinite(lead_face) {
            // Speculative advance past the lead edge, first test omitted.
            omitted = Some(tri.point(lead_vertex));
            g = lead_face;
            ctx.visit(g)?;
            gi = tri
                .vertex_index(g, pivot)
                .expect("The sweep stays incident to the pivot");
        } else {
            // The lead edge is a hull edge: resolve without speculation.
            if beyond_lead(&mut ctx, pv, tri.point(lead_vertex), target, dir) {
                ctx.visit(lead_face)?;
                break;
            }
            dir = dir.flipped();
            let (flip_corner, flip_vertex) = lead(tri, c, pc, dir);
            if !beyond_lead(&mut ctx, pv, tri.point(flip_vertex), target, dir) {
                // In the wedge, and the entry edge is the sink: contained.
                break;
            }
            g = tri.neighbor(c, flip_corner);
            ctx.visit(g)?;
            if tri.is_infinite(g) {
                break;
            }
            gi = tri
                .vertex_index(g, pivot)
                .expect("The sweep stays incident to the pivot");
        }

        // Sweep around the pivot.
        loop {
            let (lead_corner, lead_vertex) = lead(tri, g, gi, dir);
            if beyond_lead(&mut ctx, pv, tri.point(lead_vertex), target, dir) {
                omitted = None;
                g = tri.neighbor(g, lead_corner);
                ctx.visit(g)?;
                if tri.is_infinite(g) {
                    break 'pivot;
                }
                gi = tri
                    .vertex_index(g, pivot)
                    .expect("The sweep stays incident to the pivot");
                continue;
            }
            if let Some(omitted_lead) = omitted.take() {
                if !beyond_lead(&mut ctx, pv, omitted_lead, target, dir) {
                    // Wrong speculation: backtrack to the pivot face and
                    // flip the sweep direction.
                    ctx.visit(c)?;
                    dir = dir.flipped();
                    let (flip_corner, flip_vertex) = lead(tri, c, pc, dir);
                    if !beyond_lead(&mut ctx, pv, tri.point(flip_vertex), target, dir) {
                        break 'pivot;
                    }
                    g = tri.neighbor(c, flip_corner);
                    ctx.visit(g)?;
                    if tri.is_infinite(g) {
                        break 'pivot;
                    }
                    gi = tri
                        .vertex_index(g, pivot)
                        .expect("The sweep stays incident to the pivot");
                    continue;
                }
            }
            // Sink test on the edge opposite the pivot.
            let a = tri.point(tri.vertex(g, ccw(gi)));
            let b = tri.point(tri.vertex(g, cw(gi)));
            if ctx.orient(a, b, target) == Orientation::Right {
                // The sweep is exhausted: the face across the sink edge
                // carries the next pivot.
                prev = g;
                c = tri.neighbor(g, gi);
                ctx.visit(c)?;
                continue 'pivot;
            }
            break 'pivot;
        }
    }

    Ok(ctx.finish())
}

/// The pivot walk: advances around a rotating pivot vertex, with the sweep
/// direction chosen by a coin flip whenever a new pivot is established.
///
/// Every pivot vertex used is recorded in the resulting [`Walk`] in
/// addition to the visited-face path. A walk draws its coin flips from a
/// fresh [`ChaCha8Rng`] seeded with this walker's seed; use
/// [`PivotWalk::walk_with`] to supply an explicit [`BitSource`].
pub struct PivotWalk<'t> {
    tri: &'t Triangulation,
    seed: u64,
}

const DEFAULT_SEED: u64 = 1234;

impl<'t> PivotWalk<'t> {
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
        sweep_walk(self.tri, DirectionChooser::Coin(bits), start, target)
    }
}

impl Walker for PivotWalk<'_> {
    fn triangulation(&self) -> &Triangulation {
        self.tri
    }

    fn walk_from(&self, start: FaceId, target: Point) -> Result<Walk, WalkError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.walk_with(&mut rng, start, target)
    }
}

/// The deterministic sibling of [`PivotWalk`]: the sweep direction
/// alternates every time a new pivot is established instead of being chosen
/// at random. Useful as a baseline when comparing against the randomized
/// walk.
pub struct SWalk<'t> {
    tri: &'t Triangulation,
}

impl<'t> SWalk<'t> {
    pub fn new(tri: &'t Triangulation) -> Self {
        Self { tri }
    }
}

impl Walker for SWalk<'_> {
    fn triangulation(&self) -> &Triangulation {
        self.tri
    }

    fn walk_from(&self, start: FaceId, target: Point) -> Result<Walk, WalkError> {
        sweep_walk(
            self.tri,
            DirectionChooser::Alternating(SweepDir::Ccw),
            start,
            target,
        )
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::straight::StraightWalk;
    use crate::visibility::VisibilityWalk;

    /// A coin that replays a fixed sequence, cycling.
    struct FixedBits {
        bits: Vec<bool>,
        next: usize,
    }

    impl FixedBits {
        fn new(bits: Vec<bool>) -> Self {
            Self { bits, next: 0 }
        }
    }

    impl BitSource for FixedBits {
        fn next_bit(&mut self) -> bool {
            let bit = self.bits[self.next % self.bits.len()];
            self.next += 1;
            bit
        }
    }

    fn assert_connected(tri: &Triangulation, walk: &Walk) {
        for pair in walk.faces().windows(2) {
            assert!(
                tri.index_of(pair[0], pair[1]).is_some(),
                "Consecutive faces {:?} and {:?} should be neighbors",
                pair[0],
                pair[1]
            );
        }
    }

    /// Revisits only ever come from the per-pivot backtrack, at most one
    /// per pivot.
    fn assert_revisits_accounted(walk: &Walk) {
        let duplicates = walk.triangles_visited() - walk.distinct_triangles();
        assert!(
            duplicates <= walk.pivots().len(),
            "{} duplicate visits for {} pivots",
            duplicates,
            walk.pivots().len()
        );
    }

    /// A square split into 4 triangles around its center point.
    ///
    ///    3 +---------+ 2
    ///      | \  2  / |
    ///      |  \   /  |
    ///      | 3  4  1 |
    ///      |  /   \  |
    ///      | /  0  \ |
    ///    0 +---------+ 1
    ///
    fn square_fan() -> Result<Triangulation> {
        Triangulation::new(
            vec![[0., 0.], [1., 0.], [1., 1.], [0., 1.], [0.5, 0.5]],
            vec![0, 1, 4, 1, 2, 4, 2, 3, 4, 3, 0, 4],
        )
    }

    #[test]
    fn invalid_start_face_is_rejected() -> Result<()> {
        let tri = Triangulation::grid(0., 1., 0., 1., 2, 2)?;

        assert_eq!(
            PivotWalk::new(&tri).walk_from(FaceId(77), Point::new(0.5, 0.5)),
            Err(WalkError::InvalidStartFace(FaceId(77)))
        );
        assert_eq!(
            SWalk::new(&tri).walk_from(FaceId(77), Point::new(0.5, 0.5)),
            Err(WalkError::InvalidStartFace(FaceId(77)))
        );

        Ok(())
    }

    #[test]
    fn pivots_are_mesh_vertices() -> Result<()> {
        let tri = Triangulation::grid(0., 10., 0., 10., 5, 5)?;
        let walker = PivotWalk::new(&tri);

        let walk = walker.walk(Point::new(7.3, 6.1))?;

        assert!(!walk.pivots().is_empty());
        for pivot in walk.pivots() {
            let on_grid = pivot.x.fract() == 0. && pivot.y.fract() == 0.;
            assert!(on_grid, "Pivot {:?} should be a grid vertex", pivot);
        }

        Ok(())
    }

    #[test]
    fn same_seed_reproduces_the_path() -> Result<()> {
        let tri = Triangulation::grid(0., 10., 0., 10., 6, 6)?;
        let target = Point::new(2.2, 8.4);

        let first = PivotWalk::with_seed(&tri, 7).walk(target)?;
        let second = PivotWalk::with_seed(&tri, 7).walk(target)?;

        assert_eq!(first, second);

        Ok(())
    }

    #[test]
    fn swalk_is_deterministic() -> Result<()> {
        let tri = Triangulation::grid(0., 10., 0., 10., 6, 6)?;
        let walker = SWalk::new(&tri);
        let target = Point::new(2.2, 8.4);

        let first = walker.walk(target)?;
        let second = walker.walk(target)?;

        assert_eq!(first, second);
        assert!(tri.contains(first.face(), target));

        Ok(())
    }

    #[test]
    fn forced_directions_still_locate_the_target() -> Result<()> {
        let tri = Triangulation::grid(0., 10., 0., 10., 5, 5)?;
        let walker = PivotWalk::new(&tri);
        let target = Point::new(8.3, 3.6);
        let start = tri.infinite_face();

        // Forcing every coin flip one way makes roughly half the pivots
        // start their sweep the wrong way, exercising the backtrack.
        for bits in [vec![false], vec![true], vec![true, false]] {
            let walk = walker.walk_with(&mut FixedBits::new(bits), start, target)?;
            assert_connected(&tri, &walk);
            assert_revisits_accounted(&walk);
            assert!(tri.contains(walk.face(), target));
        }

        Ok(())
    }

    #[test]
    fn square_fan_center_scenario() -> Result<()> {
        let tri = square_fan()?;
        let center = Point::new(0.5, 0.5);
        let center_vertex = VertexId(4);

        let straight = StraightWalk::new(&tri).walk(center)?;
        let visibility = VisibilityWalk::new(&tri).walk(center)?;
        let pivot = PivotWalk::new(&tri).walk(center)?;
        let swalk = SWalk::new(&tri).walk(center)?;

        for walk in [&straight, &visibility, &pivot, &swalk] {
            let f = walk.face();
            assert!(
                tri.vertex_index(f, center_vertex).is_some(),
                "The final face should share the center vertex"
            );
            assert!(walk.orientations_performed() >= 1);
        }

        Ok(())
    }

    #[rstest]
    #[case([0.7, 0.9])]
    #[case([4.3, 4.6])]
    #[case([9.1, 0.4])]
    #[case([0.6, 9.3])]
    #[case([5.2, 1.7])]
    fn all_strategies_agree_on_the_final_face(#[case] target: [f64; 2]) -> Result<()> {
        let tri = Triangulation::grid(0., 10., 0., 10., 4, 4)?;
        let target = Point::from(target);

        let straight = StraightWalk::new(&tri).walk(target)?;
        let visibility = VisibilityWalk::with_seed(&tri, 3).walk(target)?;
        let pivot = PivotWalk::with_seed(&tri, 5).walk(target)?;
        let swalk = SWalk::new(&tri).walk(target)?;

        // Paths and visit counts differ between strategies, but on a
        // generic target the containing face is unique.
        assert_eq!(straight.face(), visibility.face());
        assert_eq!(straight.face(), pivot.face());
        assert_eq!(straight.face(), swalk.face());
        assert!(tri.contains(straight.face(), target));

        Ok(())
    }

    #[test]
    fn target_outside_hull_terminates_at_infinite_face() -> Result<()> {
        let tri = Triangulation::grid(0., 1., 0., 1., 3, 3)?;

        for target in [Point::new(3.7, 0.4), Point::new(-2.1, -1.5)] {
            let pivot = PivotWalk::new(&tri).walk(target)?;
            let swalk = SWalk::new(&tri).walk(target)?;
            assert!(tri.is_infinite(pivot.face()));
            assert!(tri.is_infinite(swalk.face()));
        }

        Ok(())
    }

    #[test]
    fn target_at_a_vertex_terminates() -> Result<()> {
        let tri = Triangulation::grid(0., 1., 0., 1., 2, 2)?;
        let target = Point::new(0.5, 0.5);

        for walk in [
            PivotWalk::new(&tri).walk(target)?,
            SWalk::new(&tri).walk(target)?,
        ] {
            assert!(tri.contains(walk.face(), target));
        }

        Ok(())
    }

    #[test]
    fn pivot_walk_proptest() -> Result<()> {
        let (xmin, xmax) = (0., 10.);
        let (ymin, ymax) = (0., 10.);
        let tri = Triangulation::grid(xmin, xmax, ymin, ymax, 6, 6)?;

        proptest!(|(x in xmin..xmax, y in ymin..ymax, seed: u64)| {
            let target = Point::new(x, y);
            let walk = PivotWalk::with_seed(&tri, seed).walk(target).unwrap();
            assert_connected(&tri, &walk);
            assert_revisits_accounted(&walk);
            assert!(tri.contains(walk.face(), target));
        });

        Ok(())
    }

    #[test]
    fn swalk_proptest() -> Result<()> {
        let (xmin, xmax) = (0., 10.);
        let (ymin, ymax) = (0., 10.);
        let tri = Triangulation::grid(xmin, xmax, ymin, ymax, 6, 6)?;
        let walker = SWalk::new(&tri);

        proptest!(|(x in xmin..xmax, y in ymin..ymax)| {
            let target = Point::new(x, y);
            let walk = walker.walk(target).unwrap();
            assert_connected(&tri, &walk);
            assert_revisits_accounted(&walk);
            assert!(tri.contains(walk.face(), target));
        });

        Ok(())
    }

    #[test]
    fn sweep_visits_every_face_around_a_pivot_at_most_once_plus_backtrack() -> Result<()> {
        let tri = square_fan()?;
        let walker = PivotWalk::new(&tri);

        // Target in face 2, entering from below: the walk pivots around the
        // center vertex and sweeps through its fan.
        let walk = walker.walk_from(FaceId(0), Point::new(0.5, 0.9))?;

        assert_connected(&tri, &walk);
        assert_revisits_accounted(&walk);
        assert_eq!(walk.face(), FaceId(2));
        // The fan has 4 faces; even with a backtrack the walk stays small.
        assert!(walk.triangles_visited() <= 6);

        Ok(())
    }
}
