use crate::geometry::{Orientation, Point};
use crate::triangulation::{ccw, cw, FaceId, Triangulation, VertexId};
use crate::walk::{validate_start, Walk, WalkContext, WalkError, Walker};

/// The baseline strategy: a deterministic walk along the straight segment
/// from a reference point to the target.
///
/// The reference point is a vertex of the starting face. At each face the
/// walk crosses the edge the segment exits through, so for a fixed mesh,
/// start face and target the path is always the same.
pub struct StraightWalk<'t> {
    tri: &'t Triangulation,
}

impl<'t> StraightWalk<'t> {
    pub fn new(tri: &'t Triangulation) -> Self {
        Self { tri }
    }
}

impl Walker for StraightWalk<'_> {
    fn triangulation(&self) -> &Triangulation {
        self.tri
    }

    fn walk_from(&self, start: FaceId, target: Point) -> Result<Walk, WalkError> {
        let tri = self.tri;
        validate_start(tri, start)?;
        let mut ctx = WalkContext::new(tri);

        let mut c = start;
        let mut prev = None;
        ctx.visit(c)?;
        if tri.is_infinite(c) {
            // Step through the hull edge to get a finite face to take the
            // reference point from.
            let k = tri
                .vertex_index(c, VertexId::INFINITE)
                .expect("An infinite face contains the infinite vertex");
            prev = Some(c);
            c = tri.neighbor(c, k);
            ctx.visit(c)?;
        }
        let p = tri.point(tri.vertex(c, 0));

        loop {
            if tri.is_infinite(c) {
                // The segment left the convex hull: the target is outside.
                break;
            }
            // Find the edge the segment (p, target) exits through: the
            // target lies strictly beyond it and the segment straddles it.
            // Collinear results are tolerated so the walk can pass exactly
            // through a vertex.
            let mut exit = None;
            for i in 0..3 {
                if Some(tri.neighbor(c, i)) == prev {
                    continue;
                }
                let a = tri.point(tri.vertex(c, ccw(i)));
                let b = tri.point(tri.vertex(c, cw(i)));
                if ctx.orient(a, b, target) == Orientation::Right
                    && ctx.orient(p, target, a) != Orientation::Left
                    && ctx.orient(p, target, b) != Orientation::Right
                {
                    exit = Some(i);
                    break;
                }
            }
            match exit {
                Some(i) => {
                    prev = Some(c);
                    c = tri.neighbor(c, i);
                    ctx.visit(c)?;
                }
                // No exit edge: this face contains the target.
                None => break,
            }
        }

        Ok(ctx.finish())
    }
}
