use crate::foundation::core::{Affine, BezPath, DrawStyle, Point, Tick};
use crate::scene::curve::{CurveEnd, Decoration, DecorationKind, end_direction, on_curve_points};
use crate::scene::graph::{NodeId, NodeKind, Scene};

const DOT_RADIUS: f64 = 5.0;
const TICK_HALF: f64 = 10.0;
const TICK_STROKE_WIDTH: f64 = 4.0;
const ARROW_LEN: f64 = 16.0;
const ARROW_HALF_WIDTH: f64 = 4.0;

/// Ephemeral, fully resolved snapshot of a leaf's visual state at one tick.
///
/// Produced by sampling; the path stays anchor-relative so effects can
/// transform geometry and anchor independently.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Avatar {
    pub label: String,
    pub anchor: Point,
    pub path: BezPath,
    pub style: DrawStyle,
}

impl Avatar {
    pub(crate) fn scale_about(&mut self, center: Point, sx: f64, sy: f64) {
        self.anchor = Point::new(
            center.x + (self.anchor.x - center.x) * sx,
            center.y + (self.anchor.y - center.y) * sy,
        );
        self.path.apply_affine(Affine::scale_non_uniform(sx, sy));
    }

    pub(crate) fn rotate_about(&mut self, center: Point, angle: f64) {
        let about = Affine::translate(center.to_vec2())
            * Affine::rotate(angle)
            * Affine::translate(-center.to_vec2());
        self.anchor = about * self.anchor;
        self.path.apply_affine(Affine::rotate(angle));
    }

    /// Remap every path point (control points included) through `f`,
    /// expressed in absolute coordinates.
    pub(crate) fn map_absolute_points(&mut self, mut f: impl FnMut(Point) -> Point) {
        let a = self.anchor.to_vec2();
        let els: Vec<_> = self
            .path
            .elements()
            .iter()
            .map(|el| match *el {
                kurbo::PathEl::MoveTo(p) => kurbo::PathEl::MoveTo(f(p + a) - a),
                kurbo::PathEl::LineTo(p) => kurbo::PathEl::LineTo(f(p + a) - a),
                kurbo::PathEl::QuadTo(p1, p2) => kurbo::PathEl::QuadTo(f(p1 + a) - a, f(p2 + a) - a),
                kurbo::PathEl::CurveTo(p1, p2, p3) => {
                    kurbo::PathEl::CurveTo(f(p1 + a) - a, f(p2 + a) - a, f(p3 + a) - a)
                }
                kurbo::PathEl::ClosePath => kurbo::PathEl::ClosePath,
            })
            .collect();
        self.path = BezPath::from_vec(els);
    }

    /// Resolve into an absolute paint primitive; `None` when both tools
    /// carry no paint.
    pub fn to_prim(&self) -> Option<PaintPrim> {
        if self.style.is_blank() {
            return None;
        }
        let mut path = self.path.clone();
        path.apply_affine(Affine::translate(self.anchor.to_vec2()));
        Some(PaintPrim {
            label: self.label.clone(),
            path,
            style: self.style,
        })
    }
}

/// One drawable primitive handed to the rasterization collaborator: an
/// absolute vector path plus its paint.
#[derive(Clone, Debug, serde::Serialize)]
pub struct PaintPrim {
    pub label: String,
    pub path: BezPath,
    pub style: DrawStyle,
}

impl Scene {
    /// Sampled paint primitives for the subtree at `root`, in child order.
    ///
    /// Leaves outside their window, and leaves whose effects resolved to
    /// zero paint, contribute nothing.
    pub fn sample(&self, root: NodeId, t: Tick) -> Vec<PaintPrim> {
        let mut out = Vec::new();
        self.sample_into(root, t, &mut out);
        out
    }

    fn sample_into(&self, id: NodeId, t: Tick, out: &mut Vec<PaintPrim>) {
        match &self.node(id).kind {
            NodeKind::Collection(c) => {
                for &ch in &c.children {
                    self.sample_into(ch, t, out);
                }
            }
            NodeKind::Leaf(curve) => {
                let decorations = curve.decorations.clone();
                if let Some(avatar) = self.leaf_avatar(id, t) {
                    if let Some(prim) = avatar.to_prim() {
                        out.push(prim);
                    }
                    decoration_prims(&avatar, &decorations, out);
                }
            }
        }
    }

    /// Fully resolved snapshot of a leaf at `t`.
    ///
    /// `None` outside the leaf's window (not-yet/no-longer visible) and for
    /// containers.
    pub fn avatar(&self, id: NodeId, t: Tick) -> Option<Avatar> {
        self.leaf_avatar(id, t)
    }

    fn leaf_avatar(&self, id: NodeId, t: Tick) -> Option<Avatar> {
        let node = self.node(id);
        let NodeKind::Leaf(curve) = &node.kind else {
            return None;
        };
        if !node.epoch.contains(t) {
            return None;
        }

        let base = Avatar {
            label: node.label.clone(),
            anchor: node.anchor,
            path: curve.path.clone(),
            style: curve.style,
        };
        let mut avatar = base.clone();
        for eff in &curve.effects {
            eff.sample(&base, &mut avatar, t);
        }
        Some(avatar)
    }
}

// End markers inherit the avatar's stroke paint, so a hidden avatar hides
// its decorations too.
fn decoration_prims(avatar: &Avatar, decorations: &[Decoration], out: &mut Vec<PaintPrim>) {
    if decorations.is_empty() {
        return;
    }
    let Some(paint) = avatar.style.stroke else {
        return;
    };
    let points = on_curve_points(&avatar.path);
    if points.is_empty() {
        return;
    }

    for d in decorations {
        let rel = match d.at {
            CurveEnd::Foot => points[0],
            CurveEnd::Tip => points[points.len() - 1],
        };
        let at = rel + avatar.anchor.to_vec2();

        let (path, style) = match d.kind {
            DecorationKind::Dot => {
                let circle = kurbo::Circle::new(at, DOT_RADIUS);
                (
                    kurbo::Shape::to_path(&circle, 0.1),
                    DrawStyle {
                        stroke: Some(paint),
                        stroke_width: avatar.style.stroke_width,
                        fill: Some(paint),
                    },
                )
            }
            DecorationKind::Tick => {
                let Some(angle) = end_direction(&points, d.at) else {
                    continue;
                };
                let mut path = BezPath::new();
                path.move_to(Point::new(0.0, -TICK_HALF));
                path.line_to(Point::new(0.0, TICK_HALF));
                path.apply_affine(Affine::translate(at.to_vec2()) * Affine::rotate(angle));
                (
                    path,
                    DrawStyle {
                        stroke: Some(paint),
                        stroke_width: TICK_STROKE_WIDTH,
                        fill: None,
                    },
                )
            }
            DecorationKind::Arrow => {
                let Some(mut angle) = end_direction(&points, d.at) else {
                    continue;
                };
                if d.at == CurveEnd::Foot {
                    angle += std::f64::consts::PI;
                }
                let mut path = BezPath::new();
                path.move_to(Point::new(0.0, 0.0));
                path.line_to(Point::new(-ARROW_LEN, -ARROW_HALF_WIDTH));
                path.line_to(Point::new(-ARROW_LEN / 2.0, 0.0));
                path.line_to(Point::new(-ARROW_LEN, ARROW_HALF_WIDTH));
                path.close_path();
                path.apply_affine(Affine::translate(at.to_vec2()) * Affine::rotate(angle));
                (
                    path,
                    DrawStyle {
                        stroke: Some(paint),
                        stroke_width: avatar.style.stroke_width,
                        fill: Some(paint),
                    },
                )
            }
        };

        out.push(PaintPrim {
            label: avatar.label.clone(),
            path,
            style,
        });
    }
}
