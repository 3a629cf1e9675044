//! Point location in planar triangulations by walking.
//!
//! A walk starts at some face of the triangulation and moves from neighbor
//! to neighbor, guided by orientation tests against the target point, until
//! it reaches the face containing the target. Every strategy records the
//! full path it took along with the number of orientation tests performed,
//! so the strategies can be compared on real meshes.
//!
//! Three families of strategies are provided:
//!
//! - [`StraightWalk`] follows the straight segment from a reference point to
//!   the target. Deterministic.
//! - [`VisibilityWalk`] repeatedly crosses an edge the target is visible
//!   through, testing the candidate edges in random order.
//! - [`PivotWalk`] and [`SWalk`] rotate around pivot vertices, sweeping the
//!   fan of faces incident to each pivot. [`PivotWalk`] picks the sweep
//!   direction at random, [`SWalk`] alternates it deterministically.
//!
//! All strategies implement the [`Walker`] trait:
//!
//! ```
//! use triwalk::{Triangulation, VisibilityWalk, Walker};
//!
//! # fn main() -> anyhow::Result<()> {
//! let tri = Triangulation::grid(0., 1., 0., 1., 10, 10)?;
//! let walker = VisibilityWalk::new(&tri);
//!
//! let face = walker.locate_one(&[0.55, 0.25])?;
//! assert!(face.is_some());
//!
//! let outside = walker.locate_one(&[2., 2.])?;
//! assert!(outside.is_none());
//! # Ok(())
//! # }
//! ```

mod geometry;
mod pivot;
mod straight;
mod triangulation;
mod visibility;
mod walk;

pub use geometry::{orient, Orientation, Point};
pub use pivot::{PivotWalk, SWalk};
pub use straight::StraightWalk;
pub use triangulation::{FaceId, Triangulation, VertexId};
pub use visibility::VisibilityWalk;
pub use walk::{BitSource, Walk, WalkError, Walker};
