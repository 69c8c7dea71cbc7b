use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use crate::trig::{finecosine, finesine, slope_div, ANGLETOFINESHIFT, TANTOANGLE};
use crate::FixedPoint;

pub const ANG45: u32 = 0x2000_0000;
pub const ANG90: u32 = 0x4000_0000;
pub const ANG180: u32 = 0x8000_0000;
pub const ANG270: u32 = 0xC000_0000;

/// A binary angle measurement. The full `u32` range is one turn, so all
/// arithmetic wraps.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Angle(u32);

impl Angle {
    #[inline]
    pub const fn new(bam: u32) -> Self {
        Angle(bam)
    }

    #[inline]
    pub const fn bam(self) -> u32 {
        self.0
    }

    pub fn from_degrees(degrees: f32) -> Self {
        let turns = (degrees as f64 / 360.0).rem_euclid(1.0);
        Angle((turns * 4_294_967_296.0) as u64 as u32)
    }

    pub fn to_degrees(self) -> f32 {
        (self.0 as f64 * 360.0 / 4_294_967_296.0) as f32
    }

    /// Index in to the fine trig tables
    #[inline]
    pub const fn fine(self) -> usize {
        (self.0 >> ANGLETOFINESHIFT) as usize
    }

    #[inline]
    pub fn sin(self) -> FixedPoint {
        FixedPoint::new(finesine(self.fine()))
    }

    #[inline]
    pub fn cos(self) -> FixedPoint {
        FixedPoint::new(finecosine(self.fine()))
    }

    /// R_PointToAngle2 with the origin already subtracted. Uses the slope
    /// tables per octant rather than `atan2` so it is stable across targets.
    pub fn from_delta(x: FixedPoint, y: FixedPoint) -> Self {
        let (x, y) = (x.raw(), y.raw());
        if x == 0 && y == 0 {
            return Angle(0);
        }

        let ax = x.unsigned_abs();
        let ay = y.unsigned_abs();
        let bam = if x >= 0 {
            if y >= 0 {
                if ax > ay {
                    // octant 0
                    TANTOANGLE[slope_div(ay, ax)]
                } else {
                    // octant 1
                    (ANG90 - 1).wrapping_sub(TANTOANGLE[slope_div(ax, ay)])
                }
            } else if ax > ay {
                // octant 8
                TANTOANGLE[slope_div(ay, ax)].wrapping_neg()
            } else {
                // octant 7
                ANG270.wrapping_add(TANTOANGLE[slope_div(ax, ay)])
            }
        } else if y >= 0 {
            if ax > ay {
                // octant 3
                (ANG180 - 1).wrapping_sub(TANTOANGLE[slope_div(ay, ax)])
            } else {
                // octant 2
                ANG90.wrapping_add(TANTOANGLE[slope_div(ax, ay)])
            }
        } else if ax > ay {
            // octant 4
            ANG180.wrapping_add(TANTOANGLE[slope_div(ay, ax)])
        } else {
            // octant 5
            (ANG270 - 1).wrapping_sub(TANTOANGLE[slope_div(ax, ay)])
        };
        Angle(bam)
    }
}

/// R_RotatePoint. Rotates `(x, y)` by `angle` using the fine tables.
#[inline]
pub fn rotate_point(x: FixedPoint, y: FixedPoint, angle: Angle) -> (FixedPoint, FixedPoint) {
    let (sin, cos) = (angle.sin(), angle.cos());
    (x * cos - y * sin, x * sin + y * cos)
}

impl Add for Angle {
    type Output = Angle;
    #[inline]
    fn add(self, other: Angle) -> Angle {
        Angle(self.0.wrapping_add(other.0))
    }
}

impl Add<u32> for Angle {
    type Output = Angle;
    #[inline]
    fn add(self, other: u32) -> Angle {
        Angle(self.0.wrapping_add(other))
    }
}

impl AddAssign for Angle {
    #[inline]
    fn add_assign(&mut self, other: Angle) {
        self.0 = self.0.wrapping_add(other.0);
    }
}

impl Sub for Angle {
    type Output = Angle;
    #[inline]
    fn sub(self, other: Angle) -> Angle {
        Angle(self.0.wrapping_sub(other.0))
    }
}

impl Sub<u32> for Angle {
    type Output = Angle;
    #[inline]
    fn sub(self, other: u32) -> Angle {
        Angle(self.0.wrapping_sub(other))
    }
}

impl SubAssign for Angle {
    #[inline]
    fn sub_assign(&mut self, other: Angle) {
        self.0 = self.0.wrapping_sub(other.0);
    }
}

impl Neg for Angle {
    type Output = Angle;
    #[inline]
    fn neg(self) -> Angle {
        Angle(self.0.wrapping_neg())
    }
}

#[cfg(test)]
mod tests {
    use super::{rotate_point, Angle, ANG180, ANG270, ANG45, ANG90};
    use crate::FixedPoint;

    fn near(a: Angle, b: u32) -> bool {
        a.bam().wrapping_sub(b).min(b.wrapping_sub(a.bam())) < 0x0010_0000
    }

    #[test]
    fn delta_to_angle_quadrants() {
        let one = FixedPoint::from(64);
        let zero = FixedPoint::zero();
        assert!(near(Angle::from_delta(one, zero), 0));
        assert!(near(Angle::from_delta(zero, one), ANG90));
        assert!(near(Angle::from_delta(-one, zero), ANG180));
        assert!(near(Angle::from_delta(zero, -one), ANG270));
        assert!(near(Angle::from_delta(one, one), ANG45));
        assert!(near(Angle::from_delta(-one, -one), ANG180 + ANG45));
    }

    #[test]
    fn degrees_round_trip() {
        assert_eq!(Angle::from_degrees(90.0).bam(), ANG90);
        assert_eq!(Angle::from_degrees(-90.0).bam(), ANG270);
        assert!((Angle::new(ANG45).to_degrees() - 45.0).abs() < 0.001);
    }

    #[test]
    fn wrapping_arithmetic() {
        let a = Angle::new(ANG270) + Angle::new(ANG180);
        assert_eq!(a.bam(), ANG90);
        let b = Angle::new(0) - ANG90;
        assert_eq!(b.bam(), ANG270);
    }

    #[test]
    fn rotate_quarter_turn() {
        let (x, y) = rotate_point(FixedPoint::from(100), FixedPoint::zero(), Angle::new(ANG90));
        assert!(x.abs() < FixedPoint::unit());
        assert!((y - FixedPoint::from(100)).abs() < FixedPoint::unit());
    }
}
