use glam::Vec2;

use crate::{FixedPoint, FRACBITS};

/// A line as an origin and a delta. The wall segment a draw seg came from is
/// kept in this form for the sprite side test.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DivLine {
    pub x: FixedPoint,
    pub y: FixedPoint,
    pub dx: FixedPoint,
    pub dy: FixedPoint,
}

impl DivLine {
    #[inline]
    pub const fn new(x: FixedPoint, y: FixedPoint, dx: FixedPoint, dy: FixedPoint) -> Self {
        Self { x, y, dx, dy }
    }

    /// From the two vertexes of a segment, `v1 -> v2`
    pub fn from_points(v1: (FixedPoint, FixedPoint), v2: (FixedPoint, FixedPoint)) -> Self {
        Self {
            x: v1.0,
            y: v1.1,
            dx: v2.0 - v1.0,
            dy: v2.1 - v1.1,
        }
    }

    /// Convenience for building map geometry from float coordinates
    pub fn from_vec2(v1: Vec2, v2: Vec2) -> Self {
        Self::from_points(
            (FixedPoint::from(v1.x), FixedPoint::from(v1.y)),
            (FixedPoint::from(v2.x), FixedPoint::from(v2.y)),
        )
    }

    /// R_PointOnSegSide. `false` is the front (right hand) side, `true` the
    /// back.
    pub fn point_on_side(&self, x: FixedPoint, y: FixedPoint) -> bool {
        let (lx, ly) = (self.x, self.y);
        let (ldx, ldy) = (self.dx.raw(), self.dy.raw());

        if ldx == 0 {
            if x <= lx {
                return ldy > 0;
            }
            return ldy < 0;
        }
        if ldy == 0 {
            if y <= ly {
                return ldx < 0;
            }
            return ldx > 0;
        }

        let dx = (x - lx).raw();
        let dy = (y - ly).raw();

        // Try to quickly decide by looking at sign bits.
        if (ldy ^ ldx ^ dx ^ dy) < 0 {
            // (left is negative)
            return (ldy ^ dx) < 0;
        }

        let left = FixedPoint::new(ldy >> FRACBITS) * FixedPoint::new(dx);
        let right = FixedPoint::new(dy) * FixedPoint::new(ldx >> FRACBITS);

        // front side if right < left
        right >= left
    }
}

#[cfg(test)]
mod tests {
    use super::DivLine;
    use crate::FixedPoint;
    use glam::Vec2;

    #[test]
    fn vertical_and_horizontal_sides() {
        // Line going north along x = 0, front is the east side
        let line = DivLine::from_vec2(Vec2::new(0.0, 0.0), Vec2::new(0.0, 64.0));
        assert!(!line.point_on_side(FixedPoint::from(10), FixedPoint::from(5)));
        assert!(line.point_on_side(FixedPoint::from(-10), FixedPoint::from(5)));

        // Line going east along y = 0, front is the south side
        let line = DivLine::from_vec2(Vec2::new(0.0, 0.0), Vec2::new(64.0, 0.0));
        assert!(!line.point_on_side(FixedPoint::from(5), FixedPoint::from(-10)));
        assert!(line.point_on_side(FixedPoint::from(5), FixedPoint::from(10)));
    }

    #[test]
    fn diagonal_side() {
        let line = DivLine::from_vec2(Vec2::new(0.0, 0.0), Vec2::new(64.0, 64.0));
        assert!(!line.point_on_side(FixedPoint::from(40), FixedPoint::from(10)));
        assert!(line.point_on_side(FixedPoint::from(10), FixedPoint::from(40)));
    }
}
