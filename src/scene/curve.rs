use kurbo::Shape as _;

use crate::effects::apply::AttachedEffect;
use crate::foundation::core::{
    Affine, BezPath, Cardinals, DrawStyle, Epoch, PathEl, Point, Rgba8, Vec2,
};
use crate::scene::graph::{Node, NodeId, NodeKind, Scene};
use crate::scene::shapes::Outline;

/// Which end of a curve a decoration or query refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CurveEnd {
    /// The first point on the curve.
    Foot,
    /// The last point on the curve.
    Tip,
}

/// Marker shapes drawn on top of a curve at sampling time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DecorationKind {
    Dot,
    Tick,
    Arrow,
}

/// A marker attached to one end of a curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Decoration {
    pub kind: DecorationKind,
    pub at: CurveEnd,
}

pub(crate) struct CurveData {
    /// Anchor-relative vector path.
    pub(crate) path: BezPath,
    pub(crate) style: DrawStyle,
    pub(crate) effects: Vec<AttachedEffect>,
    pub(crate) decorations: Vec<Decoration>,
}

/// On-curve vertices and a closed flag when the path is purely polygonal
/// (a single move followed by line segments, optionally closed).
pub(crate) fn polyline_vertices(path: &BezPath) -> Option<(Vec<Point>, bool)> {
    let els = path.elements();
    let mut pts = Vec::with_capacity(els.len());
    let mut closed = false;
    for (i, el) in els.iter().enumerate() {
        match *el {
            PathEl::MoveTo(p) if i == 0 => pts.push(p),
            PathEl::LineTo(p) => pts.push(p),
            PathEl::ClosePath if i == els.len() - 1 => closed = true,
            _ => return None,
        }
    }
    if pts.len() < 2 {
        return None;
    }
    Some((pts, closed))
}

/// Interpolated point at fractional vertex index `k`.
pub(crate) fn point_along(verts: &[Point], k: f64) -> Point {
    let k = k.clamp(0.0, (verts.len() - 1) as f64);
    let j = k.floor() as usize;
    if j + 1 >= verts.len() {
        return verts[verts.len() - 1];
    }
    let t = k - j as f64;
    let (a, b) = (verts[j], verts[j + 1]);
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

/// Every on-curve endpoint of a path, in order (control points excluded).
pub(crate) fn on_curve_points(path: &BezPath) -> Vec<Point> {
    let mut out = Vec::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) | PathEl::LineTo(p) => out.push(p),
            PathEl::QuadTo(_, p) | PathEl::CurveTo(_, _, p) => out.push(p),
            PathEl::ClosePath => {}
        }
    }
    out
}

// Two points closer than this are treated as coincident when probing a
// curve's direction at an end.
const DIRECTION_TOL: f64 = 0.5;

/// Tangent-ish direction of the vertex run at one end, in radians.
///
/// Walks inward past coincident points; `None` when every point coincides.
pub(crate) fn end_direction(points: &[Point], at: CurveEnd) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    match at {
        CurveEnd::Foot => {
            let p0 = points[0];
            let q = points[1..]
                .iter()
                .find(|p| (**p - p0).hypot() > DIRECTION_TOL)?;
            Some((q.y - p0.y).atan2(q.x - p0.x))
        }
        CurveEnd::Tip => {
            let p1 = points[points.len() - 1];
            let q = points[..points.len() - 1]
                .iter()
                .rev()
                .find(|p| (**p - p1).hypot() > DIRECTION_TOL)?;
            Some((p1.y - q.y).atan2(p1.x - q.x))
        }
    }
}

impl Scene {
    /// Add a standalone leaf curve with the default style and window.
    pub fn add_curve(&mut self, label: impl Into<String>, outline: Outline) -> NodeId {
        let Outline { anchor, path } = outline;
        let cardinals = Cardinals::from_bounds(path.bounding_box(), Point::ORIGIN);
        self.push_node(Node {
            label: label.into(),
            epoch: Epoch::default(),
            masters: Vec::new(),
            anchor,
            cardinals,
            kind: NodeKind::Leaf(CurveData {
                path,
                style: DrawStyle::default(),
                effects: Vec::new(),
                decorations: Vec::new(),
            }),
        })
    }

    /// Current style of a leaf (`None` for containers).
    pub fn style(&self, id: NodeId) -> Option<DrawStyle> {
        match &self.node(id).kind {
            NodeKind::Leaf(c) => Some(c.style),
            NodeKind::Collection(_) => None,
        }
    }

    /// Anchor-relative path of a leaf (`None` for containers).
    pub fn path(&self, id: NodeId) -> Option<&BezPath> {
        match &self.node(id).kind {
            NodeKind::Leaf(c) => Some(&c.path),
            NodeKind::Collection(_) => None,
        }
    }

    // -------------------- style --------------------

    /// Replace the whole style, recursing through containers.
    pub fn set_style(&mut self, id: NodeId, style: DrawStyle) {
        self.style_each(id, &|s| *s = style);
    }

    /// Set the stroke paint, recursing through containers.
    pub fn set_stroke(&mut self, id: NodeId, paint: Option<Rgba8>) {
        self.style_each(id, &|s| s.stroke = paint);
    }

    /// Set the stroke width, recursing through containers.
    pub fn set_stroke_width(&mut self, id: NodeId, width: f64) {
        self.style_each(id, &|s| s.stroke_width = width);
    }

    /// Set the fill paint, recursing through containers.
    pub fn set_fill(&mut self, id: NodeId, paint: Option<Rgba8>) {
        self.style_each(id, &|s| s.fill = paint);
    }

    fn style_each(&mut self, id: NodeId, f: &impl Fn(&mut DrawStyle)) {
        match &mut self.node_mut(id).kind {
            NodeKind::Leaf(c) => f(&mut c.style),
            NodeKind::Collection(c) => {
                let kids = c.children.clone();
                for k in kids {
                    self.style_each(k, f);
                }
            }
        }
    }

    // -------------------- geometry --------------------

    /// Translate by `v`.
    pub fn translate(&mut self, id: NodeId, v: Vec2) {
        match self.container_kind(id) {
            None => {
                self.node_mut(id).anchor += v;
                self.after_leaf_geometry(id);
            }
            Some(_) => self.collection_translate(id, v),
        }
    }

    /// Scale about `center` by `(sx, sy)`.
    pub fn scale_about(&mut self, id: NodeId, center: Point, sx: f64, sy: f64) {
        match self.container_kind(id) {
            None => {
                let node = self.node_mut(id);
                node.anchor = Point::new(
                    center.x + (node.anchor.x - center.x) * sx,
                    center.y + (node.anchor.y - center.y) * sy,
                );
                node.cardinals = node.cardinals.map(|o| Vec2::new(o.x * sx, o.y * sy));
                if let NodeKind::Leaf(curve) = &mut node.kind {
                    curve.path.apply_affine(Affine::scale_non_uniform(sx, sy));
                }
                self.after_leaf_geometry(id);
            }
            Some(_) => self.collection_scale_about(id, center, sx, sy),
        }
    }

    /// Rotate about `center` by `angle` radians.
    pub fn rotate_about(&mut self, id: NodeId, center: Point, angle: f64) {
        match self.container_kind(id) {
            None => {
                let about = Affine::translate(center.to_vec2())
                    * Affine::rotate(angle)
                    * Affine::translate(-center.to_vec2());
                let (sin, cos) = angle.sin_cos();
                let node = self.node_mut(id);
                node.anchor = about * node.anchor;
                node.cardinals = node
                    .cardinals
                    .map(|o| Vec2::new(o.x * cos - o.y * sin, o.x * sin + o.y * cos));
                if let NodeKind::Leaf(curve) = &mut node.kind {
                    curve.path.apply_affine(Affine::rotate(angle));
                }
                self.after_leaf_geometry(id);
            }
            Some(_) => self.collection_rotate_about(id, center, angle),
        }
    }

    /// Move the anchor to `p`, carrying the geometry with it.
    pub fn move_to(&mut self, id: NodeId, p: Point) {
        match self.container_kind(id) {
            None => {
                self.node_mut(id).anchor = p;
                self.after_leaf_geometry(id);
            }
            Some(_) => self.collection_move_to(id, p),
        }
    }

    /// Re-express the geometry relative to a new anchor.
    ///
    /// Absolute geometry is unchanged, so nothing propagates; the
    /// operation is exactly reversible.
    pub fn re_anchor(&mut self, id: NodeId, new_anchor: Point) {
        let node = self.node_mut(id);
        let shift = node.anchor - new_anchor;
        node.cardinals = node.cardinals.map(|o| o + shift);
        if let NodeKind::Leaf(curve) = &mut node.kind {
            curve.path.apply_affine(Affine::translate(shift));
        }
        node.anchor = new_anchor;
    }

    // -------------------- polyline helpers --------------------

    /// Close a polygonal leaf curve if it is not already closed.
    pub fn close_curve(&mut self, id: NodeId) {
        if let NodeKind::Leaf(curve) = &mut self.node_mut(id).kind {
            if !matches!(curve.path.elements().last(), Some(PathEl::ClosePath)) {
                curve.path.push(PathEl::ClosePath);
            }
        } else {
            tracing::warn!(label = %self.node(id).label, "close_curve applies to leaves only; ignored");
        }
    }

    /// Remove the closing segment of a leaf curve if present.
    pub fn unclose_curve(&mut self, id: NodeId) {
        if let NodeKind::Leaf(curve) = &mut self.node_mut(id).kind {
            if matches!(curve.path.elements().last(), Some(PathEl::ClosePath)) {
                let mut els = curve.path.elements().to_vec();
                els.pop();
                curve.path = BezPath::from_vec(els);
            }
        } else {
            tracing::warn!(label = %self.node(id).label, "unclose_curve applies to leaves only; ignored");
        }
    }

    /// Absolute position of the first point on a leaf curve.
    pub fn foot(&self, id: NodeId) -> Option<Point> {
        let path = self.path(id)?;
        let p = on_curve_points(path).first().copied()?;
        Some(p + self.anchor(id).to_vec2())
    }

    /// Absolute position of the last point on a leaf curve.
    pub fn tip(&self, id: NodeId) -> Option<Point> {
        let path = self.path(id)?;
        let p = on_curve_points(path).last().copied()?;
        Some(p + self.anchor(id).to_vec2())
    }

    /// Absolute point at normalized position `s` along a polygonal leaf
    /// curve (`None` for containers and non-polyline paths).
    pub fn point_at(&self, id: NodeId, s: f64) -> Option<Point> {
        let path = self.path(id)?;
        let (verts, _) = polyline_vertices(path)?;
        let k = s.clamp(0.0, 1.0) * (verts.len() - 1) as f64;
        Some(point_along(&verts, k) + self.anchor(id).to_vec2())
    }

    // -------------------- decorations --------------------

    /// Attach end markers to a leaf curve.
    pub fn add_decorations(&mut self, id: NodeId, items: impl IntoIterator<Item = Decoration>) {
        if let NodeKind::Leaf(curve) = &mut self.node_mut(id).kind {
            curve.decorations.extend(items);
        } else {
            tracing::warn!(label = %self.node(id).label, "decorations apply to leaves only; ignored");
        }
    }
}
