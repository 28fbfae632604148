use kurbo::Shape as _;

use crate::foundation::core::{BezPath, Point};

/// Initial geometry for a leaf curve: an anchor plus an anchor-relative
/// vector path.
///
/// The engine places no constraint on where the path came from; these
/// constructors cover the basic shapes, and collaborator pipelines (markup,
/// SVG) can hand in arbitrary paths through [`Outline::from_absolute`].
#[derive(Clone, Debug)]
pub struct Outline {
    pub anchor: Point,
    pub path: BezPath,
}

impl Outline {
    /// Wrap an anchor-relative path.
    pub fn new(anchor: Point, path: BezPath) -> Self {
        Self { anchor, path }
    }

    /// Wrap a path expressed in absolute coordinates, rebasing it onto
    /// `anchor`.
    pub fn from_absolute(anchor: Point, mut path: BezPath) -> Self {
        path.apply_affine(kurbo::Affine::translate(-anchor.to_vec2()));
        Self { anchor, path }
    }

    /// Closed axis-aligned rectangle anchored at its NW corner.
    pub fn rect(nw: Point, width: f64, height: f64) -> Self {
        let mut path = BezPath::new();
        path.move_to(Point::new(0.0, 0.0));
        path.line_to(Point::new(0.0, height));
        path.line_to(Point::new(width, height));
        path.line_to(Point::new(width, 0.0));
        path.close_path();
        Self { anchor: nw, path }
    }

    /// Open polyline through `points`, anchored at the first point.
    pub fn polyline(points: &[Point]) -> Self {
        let anchor = points.first().copied().unwrap_or(Point::ORIGIN);
        let mut path = BezPath::new();
        if let Some((&first, rest)) = points.split_first() {
            path.move_to(first - anchor.to_vec2());
            for &p in rest {
                path.line_to(p - anchor.to_vec2());
            }
        }
        Self { anchor, path }
    }

    /// Closed regular polygon anchored at its center.
    pub fn regular_polygon(center: Point, radius: f64, sides: usize) -> Self {
        let sides = sides.max(3);
        let mut path = BezPath::new();
        for k in 0..sides {
            let theta = std::f64::consts::TAU * (k as f64) / (sides as f64);
            let p = Point::new(radius * theta.cos(), radius * theta.sin());
            if k == 0 {
                path.move_to(p);
            } else {
                path.line_to(p);
            }
        }
        path.close_path();
        Self {
            anchor: center,
            path,
        }
    }

    /// Open circular arc from `start_angle` to `end_angle`, approximated by
    /// a polyline and anchored at the arc's center.
    pub fn arc(center: Point, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        let segments = (radius.abs().ceil() as usize).max(8);
        let mut path = BezPath::new();
        for k in 0..=segments {
            let t = (k as f64) / (segments as f64);
            let theta = start_angle + t * (end_angle - start_angle);
            let p = Point::new(radius * theta.cos(), radius * theta.sin());
            if k == 0 {
                path.move_to(p);
            } else {
                path.line_to(p);
            }
        }
        Self {
            anchor: center,
            path,
        }
    }

    /// Small filled-circle marker anchored at its center.
    pub fn dot(center: Point, radius: f64) -> Self {
        let path = kurbo::Circle::new(Point::ORIGIN, radius).to_path(0.1);
        Self {
            anchor: center,
            path,
        }
    }
}
