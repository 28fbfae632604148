use crate::foundation::core::{Point, Rgba8, Vec2};

/// Interpolation contract for values an effect can blend toward a target.
pub trait Lerp: Sized {
    /// Interpolate from `a` to `b` with normalized factor `t` in `[0, 1]`.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

impl Lerp for Point {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

impl Lerp for Rgba8 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        fn lerp_u8(a: u8, b: u8, t: f64) -> u8 {
            let a = f64::from(a);
            let b = f64::from(b);
            (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
        }

        Self {
            r: lerp_u8(a.r, b.r, t),
            g: lerp_u8(a.g, b.g, t),
            b: lerp_u8(a.b, b.b, t),
            a: lerp_u8(a.a, b.a, t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_channels_round_to_nearest() {
        let half = Rgba8::lerp(&Rgba8::WHITE, &Rgba8::TRANSPARENT, 0.5);
        assert_eq!(
            half,
            Rgba8 {
                r: 128,
                g: 128,
                b: 128,
                a: 128
            }
        );
    }

    #[test]
    fn endpoints_are_exact() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(5.0, -2.0);
        assert_eq!(<Point as Lerp>::lerp(&a, &b, 0.0), a);
        assert_eq!(<Point as Lerp>::lerp(&a, &b, 1.0), b);
        assert_eq!(<Point as Lerp>::lerp(&a, &b, 0.5), Point::new(3.0, 0.0));
    }
}
