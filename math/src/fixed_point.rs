use std::fmt;
use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Shl, Shr, Sub, SubAssign,
};

use crate::{fixed_to_float, float_to_fixed};

pub const FRACBITS: i32 = 16;
pub const FRACUNIT: i32 = 1 << FRACBITS;

/// A 16.16 fixed point number with the exact overflow and rounding behaviour
/// of the classic renderer:
///
/// - add/sub/neg wrap
/// - multiply is a 64bit product shifted right (truncating toward -inf)
/// - divide saturates to `MIN`/`MAX` when the quotient can't fit
#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedPoint(i32);

impl FixedPoint {
    #[inline]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn unit() -> Self {
        Self(FRACUNIT)
    }

    #[inline]
    pub const fn zero() -> Self {
        Self(0)
    }

    #[inline]
    pub const fn min() -> Self {
        Self(i32::MIN)
    }

    #[inline]
    pub const fn max() -> Self {
        Self(i32::MAX)
    }

    #[inline]
    pub const fn from_int(value: i32) -> Self {
        Self(value << FRACBITS)
    }

    /// The raw `fixed_t` bits
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Integer part, rounding toward negative infinity
    #[inline]
    pub const fn to_int(self) -> i32 {
        self.0 >> FRACBITS
    }

    /// Integer part, rounding half up. `FIXED2INT` in the projection code.
    #[inline]
    pub const fn round_int(self) -> i32 {
        (self.0.wrapping_add(FRACUNIT / 2)) >> FRACBITS
    }

    #[inline]
    pub const fn abs(self) -> Self {
        Self(self.0.wrapping_abs())
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn clamp(self, min: Self, max: Self) -> Self {
        if self < min {
            min
        } else if self > max {
            max
        } else {
            self
        }
    }

    /// FixedMul
    #[inline]
    pub const fn fixed_mul(self, rhs: Self) -> Self {
        Self(((self.0 as i64 * rhs.0 as i64) >> FRACBITS) as i32)
    }

    /// FixedDiv. Saturates instead of trapping when `|a| >> 14 >= |b|`, which
    /// also covers division by zero.
    #[inline]
    pub const fn fixed_div(self, rhs: Self) -> Self {
        if (self.0.unsigned_abs() >> 14) >= rhs.0.unsigned_abs() {
            return if (self.0 ^ rhs.0) < 0 {
                Self(i32::MIN)
            } else {
                Self(i32::MAX)
            };
        }
        Self((((self.0 as i64) << FRACBITS) / rhs.0 as i64) as i32)
    }
}

impl fmt::Debug for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedPoint({:#x} ~ {})", self.0, fixed_to_float(self.0))
    }
}

impl Add for FixedPoint {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl Add<i32> for FixedPoint {
    type Output = Self;

    /// Adds a *raw* fixed value, e.g. `frac + FRACUNIT`
    #[inline]
    fn add(self, rhs: i32) -> Self {
        Self(self.0.wrapping_add(rhs))
    }
}

impl Sub for FixedPoint {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl Sub<i32> for FixedPoint {
    type Output = Self;

    /// Subtracts a *raw* fixed value
    #[inline]
    fn sub(self, rhs: i32) -> Self {
        Self(self.0.wrapping_sub(rhs))
    }
}

impl Neg for FixedPoint {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self(self.0.wrapping_neg())
    }
}

impl Mul for FixedPoint {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.fixed_mul(rhs)
    }
}

impl Mul<i32> for FixedPoint {
    type Output = Self;

    /// Fixed times a plain integer, no shift
    #[inline]
    fn mul(self, rhs: i32) -> Self {
        Self(self.0.wrapping_mul(rhs))
    }
}

impl Mul<FixedPoint> for i32 {
    type Output = FixedPoint;

    #[inline]
    fn mul(self, rhs: FixedPoint) -> FixedPoint {
        rhs * self
    }
}

impl Div for FixedPoint {
    type Output = Self;

    #[inline]
    fn div(self, rhs: Self) -> Self {
        self.fixed_div(rhs)
    }
}

impl Shr<i32> for FixedPoint {
    type Output = Self;

    #[inline]
    fn shr(self, rhs: i32) -> Self {
        Self(self.0 >> rhs)
    }
}

impl Shl<i32> for FixedPoint {
    type Output = Self;

    #[inline]
    fn shl(self, rhs: i32) -> Self {
        Self(self.0.wrapping_shl(rhs as u32))
    }
}

impl AddAssign for FixedPoint {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

impl SubAssign for FixedPoint {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self.0.wrapping_sub(rhs.0);
    }
}

impl MulAssign for FixedPoint {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl DivAssign for FixedPoint {
    #[inline]
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl From<i32> for FixedPoint {
    /// Integer to fixed, `value << FRACBITS`
    fn from(value: i32) -> Self {
        Self(value << FRACBITS)
    }
}

impl From<f32> for FixedPoint {
    fn from(value: f32) -> Self {
        Self(float_to_fixed(value))
    }
}

impl From<FixedPoint> for f32 {
    fn from(value: FixedPoint) -> Self {
        fixed_to_float(value.0)
    }
}

impl From<FixedPoint> for i32 {
    /// Truncates the fraction (arithmetic shift)
    fn from(value: FixedPoint) -> Self {
        value.0 >> FRACBITS
    }
}
