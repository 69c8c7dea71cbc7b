use math::{Angle, FixedPoint, ANG180, ANG45};

use crate::context::FrameLight;
use crate::defs::{ShadeRef, FF_FULLBRIGHT, LIGHTSCALESHIFT, MAXLIGHTSCALE};
use crate::pic::SpriteFrame;

/// Pick one of the 16 rotation slots of a rotating frame from the angle the
/// viewer sees the thing at and the way the thing faces.
///
/// Eight-way frames store each view in two neighbouring slots, sixteen-way
/// frames are shifted by half a slot so both line up with the same angles.
pub fn select_rotation(frame: &SpriteFrame, view_to_thing: Angle, thing_angle: Angle) -> usize {
    let rel = view_to_thing - thing_angle + (ANG45 / 2) * 9;
    let rel = if frame.lump[0] == frame.lump[1] {
        rel
    } else {
        rel - ANG180 / 16
    };
    (rel.bam() >> 28) as usize
}

/// Distance light index for a scale, clamped to the light row
#[inline]
pub fn scale_light_index(yscale: FixedPoint, light_scale_x_mul: FixedPoint, shift: i32) -> usize {
    let index = (yscale * light_scale_x_mul).raw() >> shift;
    index.clamp(0, MAXLIGHTSCALE as i32 - 1) as usize
}

/// The colourmap for a thing sprite. First match wins: fixed light level,
/// fixed colourmap, full bright frame, full bright thing, then distance.
pub fn select_sprite_light(
    light: &FrameLight,
    base: ShadeRef,
    frame: u32,
    full_bright_thing: bool,
    yscale: FixedPoint,
    light_scale_x_mul: FixedPoint,
    sprite_lights: &[usize; MAXLIGHTSCALE],
) -> ShadeRef {
    if let Some(level) = light.fixed_light_level {
        base.with(level)
    } else if let Some(fixed) = light.fixed_colourmap {
        fixed
    } else if !light.foggy && frame & FF_FULLBRIGHT != 0 {
        base
    } else if !light.foggy && full_bright_thing {
        base
    } else {
        let index = scale_light_index(yscale, light_scale_x_mul, LIGHTSCALESHIFT);
        base.with(sprite_lights[index])
    }
}
