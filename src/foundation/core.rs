use crate::foundation::error::{ScenographError, ScenographResult};

pub use kurbo::{Affine, BezPath, PathEl, Point, Rect, Vec2};

/// Integer simulation time unit. All activity windows are expressed in whole
/// ticks; there is no sub-tick precision anywhere in the graph.
pub type Tick = i64;

/// Default activity window length for freshly created entities and effect
/// templates, in ticks (two seconds at the conventional 24 ticks/second).
pub const DEFAULT_SPAN: Tick = 48;

/// Half-open activity window `[begin, end)` in ticks.
///
/// The `begin <= end` invariant is maintained by construction: a crossed
/// bound is clamped rather than rejected, with a warning diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Epoch {
    /// Inclusive window start.
    pub begin: Tick,
    /// Exclusive window end.
    pub end: Tick,
}

impl Epoch {
    /// Create a window, clamping `end` up to `begin` when crossed.
    pub fn new(begin: Tick, end: Tick) -> Self {
        if end < begin {
            tracing::warn!(begin, end, "epoch end precedes begin; clamped to begin");
            return Self { begin, end: begin };
        }
        Self { begin, end }
    }

    /// Window starting at `begin` with the given length (negative lengths
    /// clamp to zero).
    pub fn span(begin: Tick, len: Tick) -> Self {
        Self::new(begin, begin.saturating_add(len.max(0)))
    }

    /// Window length in ticks.
    pub fn len(self) -> Tick {
        self.end - self.begin
    }

    /// Return `true` when the window contains no ticks.
    pub fn is_empty(self) -> bool {
        self.begin == self.end
    }

    /// Return `true` when `t` falls inside `[begin, end)`.
    pub fn contains(self, t: Tick) -> bool {
        self.begin <= t && t < self.end
    }

    /// Clamp a tick into the closed hull `[begin, end]` of this window.
    pub fn clamp_tick(self, t: Tick) -> Tick {
        t.clamp(self.begin, self.end)
    }

    /// Shift both bounds by `dt`.
    pub fn shifted(self, dt: Tick) -> Self {
        Self {
            begin: self.begin + dt,
            end: self.end + dt,
        }
    }

    /// Smallest window covering both inputs.
    pub fn union(self, other: Self) -> Self {
        Self {
            begin: self.begin.min(other.begin),
            end: self.end.max(other.end),
        }
    }
}

impl Default for Epoch {
    fn default() -> Self {
        Self {
            begin: 0,
            end: DEFAULT_SPAN,
        }
    }
}

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> ScenographResult<Self> {
        if den == 0 {
            return Err(ScenographError::structural("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ScenographError::structural("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    /// Opaque color from RGB channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Paint configuration for a leaf curve: optional stroke and fill paints.
///
/// `None` means "no paint" for that tool, which is distinct from a fully
/// transparent color: effects skip tools that carry no base paint.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DrawStyle {
    pub stroke: Option<Rgba8>,
    pub stroke_width: f64,
    pub fill: Option<Rgba8>,
}

impl DrawStyle {
    /// Return `true` when neither tool carries paint.
    pub fn is_blank(&self) -> bool {
        self.stroke.is_none() && self.fill.is_none()
    }
}

impl Default for DrawStyle {
    fn default() -> Self {
        Self {
            stroke: Some(Rgba8::WHITE),
            stroke_width: 1.0,
            fill: None,
        }
    }
}

/// Compass-point selector for an entity's bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Cardinal {
    NorthWest,
    West,
    SouthWest,
    South,
    SouthEast,
    East,
    NorthEast,
    North,
    Center,
}

/// The eight compass points plus center of an entity's bounding box, stored
/// as offsets from the entity's anchor.
///
/// Offsets stay consistent with the anchor across every geometric
/// operation; the pair is always updated together.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Cardinals {
    pub nw: Vec2,
    pub w: Vec2,
    pub sw: Vec2,
    pub s: Vec2,
    pub se: Vec2,
    pub e: Vec2,
    pub ne: Vec2,
    pub n: Vec2,
    pub c: Vec2,
}

impl Cardinals {
    /// Offsets of `rect`'s compass points relative to `anchor`.
    ///
    /// Y grows downward, so "north" is the small-y edge.
    pub fn from_bounds(rect: Rect, anchor: Point) -> Self {
        let a = anchor.to_vec2();
        let nw = Point::new(rect.x0, rect.y0).to_vec2() - a;
        let sw = Point::new(rect.x0, rect.y1).to_vec2() - a;
        let se = Point::new(rect.x1, rect.y1).to_vec2() - a;
        let ne = Point::new(rect.x1, rect.y0).to_vec2() - a;
        Self {
            nw,
            w: (nw + sw) / 2.0,
            sw,
            s: (sw + se) / 2.0,
            se,
            e: (ne + se) / 2.0,
            ne,
            n: (nw + ne) / 2.0,
            c: (nw + se) / 2.0,
        }
    }

    /// Offset for one compass point.
    pub fn get(&self, which: Cardinal) -> Vec2 {
        match which {
            Cardinal::NorthWest => self.nw,
            Cardinal::West => self.w,
            Cardinal::SouthWest => self.sw,
            Cardinal::South => self.s,
            Cardinal::SouthEast => self.se,
            Cardinal::East => self.e,
            Cardinal::NorthEast => self.ne,
            Cardinal::North => self.n,
            Cardinal::Center => self.c,
        }
    }

    /// The four corner offsets in NW, SW, SE, NE order.
    pub fn corners(&self) -> [Vec2; 4] {
        [self.nw, self.sw, self.se, self.ne]
    }

    /// Apply `f` to every offset.
    pub fn map(&self, mut f: impl FnMut(Vec2) -> Vec2) -> Self {
        Self {
            nw: f(self.nw),
            w: f(self.w),
            sw: f(self.sw),
            s: f(self.s),
            se: f(self.se),
            e: f(self.e),
            ne: f(self.ne),
            n: f(self.n),
            c: f(self.c),
        }
    }

    /// Width of the box spanned by the offsets.
    pub fn width(&self) -> f64 {
        (self.ne - self.nw).hypot()
    }

    /// Height of the box spanned by the offsets.
    pub fn height(&self) -> f64 {
        (self.sw - self.nw).hypot()
    }
}
