use lazy_static::lazy_static;
use std::f64::consts::TAU;

/// Size of the fine angle tables
pub const FINEANGLES: usize = 8192;
pub const FINEMASK: usize = FINEANGLES - 1;
/// `angle_t >> ANGLETOFINESHIFT` gives a fine table index
pub const ANGLETOFINESHIFT: u32 = 19;
/// Resolution of the slope → angle table
pub const SLOPERANGE: usize = 2048;

lazy_static! {
    /// Sine over 5/4 of a circle so that cosine is `FINESINE[i + FINEANGLES/4]`.
    /// Sampled at the centre of each fine step, as in Doom's tables.
    pub(crate) static ref FINESINE: Vec<i32> = (0..FINEANGLES * 5 / 4)
        .map(|i| {
            let a = (i as f64 + 0.5) * TAU / FINEANGLES as f64;
            (a.sin() * 65536.0) as i32
        })
        .collect();

    /// Binary angle of `atan(i / SLOPERANGE)`, octant 0 only
    pub(crate) static ref TANTOANGLE: Vec<u32> = (0..=SLOPERANGE)
        .map(|i| {
            let a = (i as f64 / SLOPERANGE as f64).atan();
            (a / TAU * 4_294_967_296.0) as u32
        })
        .collect();
}

#[inline]
pub(crate) fn finesine(index: usize) -> i32 {
    FINESINE[index & FINEMASK]
}

#[inline]
pub(crate) fn finecosine(index: usize) -> i32 {
    FINESINE[(index & FINEMASK) + FINEANGLES / 4]
}

/// SlopeDiv
#[inline]
pub(crate) fn slope_div(num: u32, den: u32) -> usize {
    if den < 512 {
        return SLOPERANGE;
    }
    let ans = ((num as u64) << 3) / (den >> 8) as u64;
    if ans <= SLOPERANGE as u64 {
        ans as usize
    } else {
        SLOPERANGE
    }
}

#[cfg(test)]
mod tests {
    use super::{finecosine, finesine, slope_div, FINEANGLES, SLOPERANGE, TANTOANGLE};

    #[test]
    fn table_shape() {
        // quarter turn is very close to 1.0
        assert!(finesine(FINEANGLES / 4) > 65530);
        assert!(finecosine(0) > 65530);
        assert!(finesine(0).abs() < 30);
        // 45 degrees
        assert_eq!(TANTOANGLE[SLOPERANGE], 0x2000_0000);
    }

    #[test]
    fn slope_div_clamps() {
        assert_eq!(slope_div(10, 100), SLOPERANGE);
        assert_eq!(slope_div(1 << 20, 1 << 20), SLOPERANGE);
        assert_eq!(slope_div(1 << 19, 1 << 20), SLOPERANGE / 2);
    }
}
