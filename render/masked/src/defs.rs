use math::{DivLine, FixedPoint};

use crate::things::Thing;

pub const SIL_NONE: u8 = 0;
pub const SIL_BOTTOM: u8 = 1;
pub const SIL_TOP: u8 = 2;
pub const SIL_BOTH: u8 = 3;

pub const FF_FULLBRIGHT: u32 = 0x8000;
pub const FF_FRAMEMASK: u32 = 0x7FFF;

/// Number of sector light bands
pub const LIGHTLEVELS: usize = 16;
pub const LIGHTSEGSHIFT: i32 = 4;
/// Number of distance steps in a light band
pub const MAXLIGHTSCALE: usize = 48;
pub const LIGHTSCALESHIFT: i32 = 12;
pub const NUMCOLORMAPS: usize = 32;
/// The colourmap after the light levels, used for invulnerability
pub const INVERSECOLORMAP: usize = NUMCOLORMAPS;
const DISTMAP: usize = 2;

/// Nothing nearer than this is projected
pub const NEARCLIP: FixedPoint = FixedPoint::from_int(4);
pub const BASEYCENTER: i32 = 100;
/// Pushes the weapon down so it meets the screen bottom at any resolution.
/// Empirical, keep as is.
pub const WEAPONTWEAK: i32 = 0x9000;
/// Movement further than this in one tic is treated as a teleport
pub const INTERPOLATE_MAX_MOVE: FixedPoint = FixedPoint::from_int(128);

pub const MAXPLAYERS: usize = 255;
pub const NUMPSPRITES: usize = 2;

#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MapObjFlag {
    /// Drawn with the fuzz effect
    Shadow = 0x0004_0000,
    /// Two bits selecting one of the player colour translations
    Translation = 0x0c00_0000,
}

pub const MF_TRANSSHIFT: u32 = 26;

/// Which part of a fake-height sector the viewer sees a thing through
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum FakeSide {
    #[default]
    Center,
    BelowFloor,
    AboveCeiling,
}

/// Index of a set of colourmaps (a sector may carry its own coloured set)
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ColourmapId(pub usize);

/// A colourmap set plus the light level within it
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ShadeRef {
    pub map: ColourmapId,
    pub level: usize,
}

impl ShadeRef {
    pub const fn new(map: ColourmapId, level: usize) -> Self {
        Self { map, level }
    }

    pub const fn with(self, level: usize) -> Self {
        Self {
            map: self.map,
            level,
        }
    }
}

/// Index of a 256 entry palette translation table
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TranslationRef(pub usize);

/// The control sector of a deep water or fake ceiling effect
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct HeightSec {
    pub floor_height: FixedPoint,
    pub ceiling_height: FixedPoint,
    /// `SECF_IGNOREHEIGHTSEC`
    pub ignore: bool,
    pub colourmap: ColourmapId,
}

/// The parts of a sector the thing drawer needs
#[derive(Debug, Default, Clone)]
pub struct Sector {
    pub num: usize,
    pub light_level: i32,
    pub colourmap: ColourmapId,
    pub height_sec: Option<HeightSec>,
    pub things: Vec<Thing>,
}

impl Sector {
    /// The height sector if it takes part in clipping
    pub fn active_height_sec(&self) -> Option<HeightSec> {
        self.height_sec.filter(|h| !h.ignore)
    }
}

/// A masked (see-through) mid texture left behind by the wall drawer
#[derive(Debug, Clone)]
pub struct MaskedMid {
    pub texture: usize,
    pub texture_mid: FixedPoint,
    /// Texture column for each screen column starting at the seg `x1`,
    /// `None` where nothing is drawn
    pub columns: Vec<Option<usize>>,
    pub colourmap: ColourmapId,
    pub light_level: i32,
    /// `FRACUNIT` is opaque
    pub translucency: FixedPoint,
}

/// A wall segment as drawn by the wall renderer. Read only here.
#[derive(Debug, Clone)]
pub struct DrawSeg {
    pub x1: i32,
    pub x2: i32,

    pub scale1: FixedPoint,
    pub scale2: FixedPoint,
    pub scale_step: FixedPoint,

    /// 0=none, 1=bottom, 2=top, 3=both
    pub silhouette: u8,

    /// do not clip sprites above this, one entry per column from `x1`
    pub spr_top_clip: Option<Vec<i32>>,
    /// do not clip sprites below this, one entry per column from `x1`
    pub spr_bottom_clip: Option<Vec<i32>>,

    /// The seg line, front side on the right
    pub line: DivLine,
    pub masked: Option<MaskedMid>,
}

impl DrawSeg {
    pub fn new(x1: i32, x2: i32, line: DivLine) -> Self {
        DrawSeg {
            x1,
            x2,
            scale1: FixedPoint::zero(),
            scale2: FixedPoint::zero(),
            scale_step: FixedPoint::zero(),
            silhouette: SIL_NONE,
            spr_top_clip: None,
            spr_bottom_clip: None,
            line,
            masked: None,
        }
    }

    pub fn width(&self) -> usize {
        (self.x2 - self.x1 + 1).max(0) as usize
    }

    #[inline]
    pub fn top_clip(&self, x: i32) -> Option<i32> {
        let clip = self.spr_top_clip.as_ref()?;
        clip.get(usize::try_from(x - self.x1).ok()?).copied()
    }

    #[inline]
    pub fn bottom_clip(&self, x: i32) -> Option<i32> {
        let clip = self.spr_bottom_clip.as_ref()?;
        clip.get(usize::try_from(x - self.x1).ok()?).copied()
    }

    /// Near and far scale, in that order
    #[inline]
    pub fn scale_range(&self) -> (FixedPoint, FixedPoint) {
        if self.scale1 > self.scale2 {
            (self.scale1, self.scale2)
        } else {
            (self.scale2, self.scale1)
        }
    }
}

/// Colourmap levels per sector light band and distance step
#[derive(Debug, Clone)]
pub struct LightTables {
    scalelight: [[usize; MAXLIGHTSCALE]; LIGHTLEVELS],
}

impl LightTables {
    /// R_InitLightTables
    pub fn new() -> Self {
        let mut scalelight = [[0; MAXLIGHTSCALE]; LIGHTLEVELS];
        for (i, row) in scalelight.iter_mut().enumerate() {
            let startmap = ((LIGHTLEVELS - 1 - i) * 2 * NUMCOLORMAPS / LIGHTLEVELS) as i32;
            for (j, level) in row.iter_mut().enumerate() {
                let l = startmap - (j / DISTMAP) as i32;
                *level = l.clamp(0, NUMCOLORMAPS as i32 - 1) as usize;
            }
        }
        Self { scalelight }
    }

    /// Light band for a `lightnum`, clamped in to range
    #[inline]
    pub fn row(&self, lightnum: i32) -> &[usize; MAXLIGHTSCALE] {
        &self.scalelight[lightnum.clamp(0, LIGHTLEVELS as i32 - 1) as usize]
    }
}

impl Default for LightTables {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{DrawSeg, LightTables, MAXLIGHTSCALE, NUMCOLORMAPS, SIL_BOTTOM};
    use math::{DivLine, FixedPoint};

    #[test]
    fn light_rows_brighten_with_distance_index() {
        let lights = LightTables::new();
        // darkest band is black up close and far away
        assert_eq!(lights.row(0)[0], NUMCOLORMAPS - 1);
        assert_eq!(lights.row(0)[MAXLIGHTSCALE - 1], NUMCOLORMAPS - 1);
        // brightest band is full bright when near
        assert_eq!(lights.row(15)[MAXLIGHTSCALE - 1], 0);
        // clamps out of range light numbers
        assert_eq!(lights.row(-5), lights.row(0));
        assert_eq!(lights.row(99), lights.row(15));
    }

    #[test]
    fn drawseg_clip_lookup_is_relative_to_x1() {
        let mut ds = DrawSeg::new(10, 12, DivLine::default());
        ds.silhouette = SIL_BOTTOM;
        ds.spr_bottom_clip = Some(vec![100, 101, 102]);
        assert_eq!(ds.bottom_clip(9), None);
        assert_eq!(ds.bottom_clip(10), Some(100));
        assert_eq!(ds.bottom_clip(12), Some(102));
        assert_eq!(ds.bottom_clip(13), None);
        assert_eq!(ds.top_clip(10), None);
        assert_eq!(ds.width(), 3);
    }

    #[test]
    fn scale_range_orders_near_far() {
        let mut ds = DrawSeg::new(0, 0, DivLine::default());
        ds.scale1 = FixedPoint::from(1);
        ds.scale2 = FixedPoint::from(3);
        assert_eq!(ds.scale_range(), (FixedPoint::from(3), FixedPoint::from(1)));
    }
}
