//! Fixed-point and binary angle maths shared by the masked renderer.
//!
//! Everything here follows the integer rules of the classic renderer so that
//! the same scene always lands on the same pixels.

mod angle;
mod divline;
mod fixed_point;
mod trig;

pub use angle::*;
pub use divline::*;
pub use fixed_point::*;
pub use trig::{ANGLETOFINESHIFT, FINEANGLES, FINEMASK, SLOPERANGE};

/// Convert a Doom `fixed_t` fixed-point float to `f32`
pub const fn fixed_to_float(value: i32) -> f32 {
    value as f32 / FRACUNIT as f32
}

/// Convert an `f32` to a Doom `fixed_t`. Values outside the range saturate.
pub fn float_to_fixed(value: f32) -> i32 {
    (value * FRACUNIT as f32) as i32
}

/// P_AproxDistance. Cheap octagonal distance used for teleport detection.
#[inline]
pub fn approx_distance(dx: FixedPoint, dy: FixedPoint) -> FixedPoint {
    let dx = dx.abs();
    let dy = dy.abs();
    if dx < dy {
        dx + dy - (dx >> 1)
    } else {
        dx + dy - (dy >> 1)
    }
}
