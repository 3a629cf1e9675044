use itertools::Itertools;

/// A point of the 2D plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<&Point> for [f64; 2] {
    fn from(val: &Point) -> Self {
        [val.x, val.y]
    }
}

impl From<Point> for [f64; 2] {
    fn from(val: Point) -> Self {
        (&val).into()
    }
}

impl From<&[f64; 2]> for Point {
    fn from(value: &[f64; 2]) -> Self {
        Self {
            x: value[0],
            y: value[1],
        }
    }
}

impl From<[f64; 2]> for Point {
    fn from(value: [f64; 2]) -> Self {
        Self::from(&value)
    }
}

/// The turn made by the ordered point triple `(p, q, r)`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Orientation {
    /// Left turn: `r` lies to the left of the directed line `p -> q`.
    Left,
    /// Right turn: `r` lies to the right of the directed line `p -> q`.
    Right,
    /// The three points are collinear.
    Collinear,
}

/// Classifies the turn made by `(p, q, r)` from the sign of the cross product.
///
/// The collinear case is a regular outcome, not an error: the walk strategies
/// use it as a boundary condition for targets lying exactly on an edge.
pub fn orient<P: Into<Point>>(p: P, q: P, r: P) -> Orientation {
    let Point { x: x0, y: y0 } = p.into();
    let Point { x: x1, y: y1 } = q.into();
    let Point { x: x2, y: y2 } = r.into();
    let cross = (x1 - x0) * (y2 - y0) - (x2 - x0) * (y1 - y0);
    // `total_cmp` orders -0.0 below 0.0; both zeros are collinear.
    if cross == 0. {
        return Orientation::Collinear;
    }
    match cross.total_cmp(&0.) {
        std::cmp::Ordering::Greater => Orientation::Left,
        _ => Orientation::Right,
    }
}

impl Point {
    /// Computes the winding number for a [`Point`] in a polygon (defined by a slice of [`Point`]s).
    ///
    /// This number can be:
    /// - `0` if the [`Point`] is not inside the polygon
    /// - `> 0` if the polygon "winds" at least once around the [`Point`] counter-clockwise
    /// - `< 0` if the polygon "winds" at least once around the [`Point`] clockwise
    ///
    /// For more information, see <https://web.archive.org/web/20130126163405/http://geomalgorithms.com/a03-_inclusion.html>.
    pub fn wn<I>(&self, poly: I) -> isize
    where
        I: IntoIterator,
        <I as IntoIterator>::IntoIter: Clone,
        <I as IntoIterator>::IntoIter: ExactSizeIterator,
        <I as IntoIterator>::Item: Into<Point>,
        <I as IntoIterator>::Item: Clone,
    {
        let mut wn = 0;
        for (a, b) in poly.into_iter().circular_tuple_windows() {
            let a: Point = a.into();
            let b: Point = b.into();
            if a.y <= self.y {
                // `a` is below self
                if b.y > self.y {
                    // an upward crossing
                    if matches!(orient(a, b, *self), Orientation::Left) {
                        wn += 1;
                    }
                }
            } else {
                // `a` is above self
                if b.y <= self.y {
                    // a downward crossing
                    if matches!(orient(a, b, *self), Orientation::Right) {
                        wn -= 1;
                    }
                }
            }
        }
        wn
    }

    /// Returns `true` if the point is inside the input polygon.
    pub fn is_inside<I>(&self, poly: I) -> bool
    where
        I: IntoIterator,
        <I as IntoIterator>::IntoIter: Clone,
        <I as IntoIterator>::IntoIter: ExactSizeIterator,
        <I as IntoIterator>::Item: Into<Point>,
        <I as IntoIterator>::Item: Clone,
    {
        self.wn(poly) != 0
    }
}
