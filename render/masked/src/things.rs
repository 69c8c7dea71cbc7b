#[cfg(feature = "hprof")]
use coarse_prof::profile;
#[cfg(feature = "safety_check")]
use log::debug;
use log::error;
use math::{approx_distance, Angle, FixedPoint};

use crate::context::{clip_line, CamPoint, View};
use crate::defs::{
    FakeSide, HeightSec, Sector, ShadeRef, TranslationRef, FF_FRAMEMASK, INTERPOLATE_MAX_MOVE,
    LIGHTLEVELS, LIGHTSEGSHIFT, NEARCLIP,
};
use crate::pic::PicSource;
use crate::rotation::{select_rotation, select_sprite_light};
use crate::MaskedRenderer;

/// Identifies the actor a vissprite came from. Never dereferenced here.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ThingId(pub usize);

/// The parts of a map object the sprite projector reads
#[derive(Debug, Clone)]
pub struct Thing {
    pub id: ThingId,
    pub x: FixedPoint,
    pub y: FixedPoint,
    pub z: FixedPoint,
    /// Position at the previous tic, for interpolation
    pub prev_x: FixedPoint,
    pub prev_y: FixedPoint,
    pub prev_z: FixedPoint,
    pub angle: Angle,

    pub sprite: usize,
    /// Frame number with `FF_FULLBRIGHT` in the high bits
    pub frame: u32,
    /// `MapObjFlag` bits
    pub flags: u32,
    /// `MFO_FULLBRIGHT`
    pub full_bright: bool,
    /// `MFO_SPECTATOR`, projected but never drawn
    pub spectator: bool,
    /// `MF2_DONTDRAW`
    pub dont_draw: bool,
    /// The thing is a player who is spectating, not projected at all
    pub spectating_player: bool,
    /// `FRACUNIT` is opaque, zero is not drawn
    pub translucency: FixedPoint,
    pub translation: Option<TranslationRef>,
}

impl Thing {
    pub fn new(id: ThingId, x: FixedPoint, y: FixedPoint, z: FixedPoint, sprite: usize, frame: u32) -> Self {
        Self {
            id,
            x,
            y,
            z,
            prev_x: x,
            prev_y: y,
            prev_z: z,
            angle: Angle::default(),
            sprite,
            frame,
            flags: 0,
            full_bright: false,
            spectator: false,
            dont_draw: false,
            spectating_player: false,
            translucency: FixedPoint::unit(),
            translation: None,
        }
    }

    /// Moves the thing, keeping the old position for interpolation
    pub fn move_to(&mut self, x: FixedPoint, y: FixedPoint, z: FixedPoint) {
        self.prev_x = self.x;
        self.prev_y = self.y;
        self.prev_z = self.z;
        self.x = x;
        self.y = y;
        self.z = z;
    }

    /// Where to draw the thing this frame. Large moves are teleports and are
    /// not blended.
    pub fn render_position(&self, lerp: FixedPoint, interpolate: bool) -> (FixedPoint, FixedPoint, FixedPoint) {
        if interpolate && approx_distance(self.x - self.prev_x, self.y - self.prev_y) < INTERPOLATE_MAX_MOVE {
            (
                self.prev_x + lerp * (self.x - self.prev_x),
                self.prev_y + lerp * (self.y - self.prev_y),
                self.prev_z + lerp * (self.z - self.prev_z),
            )
        } else {
            (self.x, self.y, self.z)
        }
    }

    #[inline]
    fn is_drawable(&self) -> bool {
        !(self.dont_draw || self.translucency == FixedPoint::zero() || self.spectating_player)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VisKind {
    /// A sprite or weapon patch lump
    Patch { lump: usize },
    /// A filled square in one palette colour
    Particle { colour: u8 },
}

impl Default for VisKind {
    fn default() -> Self {
        VisKind::Patch { lump: 0 }
    }
}

/// A thing or particle projected on to the screen. Only lives for a frame.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct VisSprite {
    pub x1: i32,
    pub x2: i32,
    pub y1: i32,
    pub y2: i32,
    /// Camera space distance, the sort key
    pub depth: FixedPoint,

    pub xscale: FixedPoint,
    pub yscale: FixedPoint,
    /// Texture column of `x1`
    pub start_frac: FixedPoint,
    /// negative if flipped
    pub x_iscale: FixedPoint,
    pub texture_mid: FixedPoint,

    // Line side calc
    pub gx: FixedPoint,
    pub gy: FixedPoint,
    // Bottom and top for clipping
    pub gz: FixedPoint,
    pub gzt: FixedPoint,

    pub colourmap: ShadeRef,
    pub translucency: FixedPoint,
    pub translation: Option<TranslationRef>,
    pub mobj_flags: u32,
    pub kind: VisKind,
    pub thing: Option<ThingId>,

    pub height_sec: Option<HeightSec>,
    pub fake_side: FakeSide,
    pub spectator: bool,
}

/// A flat upright rectangle in the world, the input to `generate_vissprite`
#[derive(Debug, Default, Copy, Clone)]
pub struct SpriteQuad {
    pub x: FixedPoint,
    pub y: FixedPoint,
    pub z: FixedPoint,
    pub height: FixedPoint,
    pub width: FixedPoint,
    /// Distance from the top edge down to `z`
    pub top_offs: FixedPoint,
    /// Distance from the left edge to `x`
    pub side_offs: FixedPoint,
    pub flip: bool,
}

/// R_GenerateVisSprite. Projects a world rectangle in to a vissprite, or
/// `None` when nothing of it lands on screen.
pub fn generate_vissprite(view: &View, sector: &Sector, fake_side: FakeSide, quad: &SpriteQuad) -> Option<VisSprite> {
    // sprite edges in camera space
    let t = view.to_camera(quad.x, quad.y);
    let t1_x = if quad.flip {
        t.x - (quad.width - quad.side_offs)
    } else {
        t.x - quad.side_offs
    };
    let t1 = CamPoint::new(t1_x, t.y);
    let t2 = CamPoint::new(t1_x + quad.width, t.y);

    let (lclip, rclip) = view.clip_to_frustum(t1, t2, NEARCLIP)?;
    let (t1, t2) = clip_line(t1, t2, lclip, rclip);
    let clipped_offset = t1.x - t1_x;

    let gzt = quad.z + quad.top_offs;
    let gzb = quad.z;

    let x1 = view.project_x(t1.x, t.y);
    let x2 = view.project_x(t2.x, t.y) - 1;
    let (x1, x2) = view.check_projection_x(x1, x2)?;

    let y1 = view.project_y(gzt - view.z, t.y);
    let y2 = view.project_y(gzb - view.z, t.y) - 1;
    let (y1, y2) = view.check_projection_y(y1, y2)?;

    // things completely hidden by deep water or a fake ceiling
    let height_sec = sector.active_height_sec();
    if let Some(hs) = height_sec {
        let hidden = match fake_side {
            FakeSide::AboveCeiling => gzt < hs.ceiling_height,
            FakeSide::BelowFloor => gzb >= hs.floor_height,
            FakeSide::Center => gzt < hs.floor_height || gzb >= hs.ceiling_height,
        };
        if hidden {
            return None;
        }
    }

    let iscale = t.y / view.focal_x;
    let (start_frac, x_iscale) = if quad.flip {
        (quad.width - 1 - clipped_offset, -iscale)
    } else {
        (clipped_offset, iscale)
    };

    Some(VisSprite {
        x1,
        x2,
        y1,
        y2,
        depth: t.y,
        xscale: view.focal_x / t.y,
        yscale: view.focal_y / t.y,
        start_frac,
        x_iscale,
        texture_mid: gzt - view.z,
        gx: quad.x,
        gy: quad.y,
        gz: gzb,
        gzt,
        colourmap: ShadeRef::new(sector.colourmap, 0),
        translucency: FixedPoint::unit(),
        translation: None,
        mobj_flags: 0,
        kind: VisKind::default(),
        thing: None,
        height_sec,
        fake_side,
        spectator: false,
    })
}

impl MaskedRenderer {
    /// R_AddSprites. Called during BSP traversal for every subsector, but
    /// only the first call per sector each frame does anything.
    pub fn add_sprites(&mut self, sector: &Sector, light_level: i32, fake_side: FakeSide, pics: &impl PicSource) {
        #[cfg(feature = "hprof")]
        profile!("add_sprites");
        if sector.num >= self.sector_frame.len() {
            self.sector_frame.resize(sector.num + 1, 0);
        }
        if self.sector_frame[sector.num] == self.frame {
            return;
        }
        self.sector_frame[sector.num] = self.frame;

        let lightnum = (light_level >> LIGHTSEGSHIFT) + self.ctx.light.effective_extralight();
        self.sprite_lights = lightnum.clamp(0, LIGHTLEVELS as i32 - 1);

        for thing in sector.things.iter() {
            self.project_sprite(thing, sector, fake_side, pics);
        }
    }

    /// R_ProjectSprite
    pub(crate) fn project_sprite(
        &mut self,
        thing: &Thing,
        sector: &Sector,
        fake_side: FakeSide,
        pics: &impl PicSource,
    ) {
        if !thing.is_drawable() {
            return;
        }

        let (x, y, z) = thing.render_position(self.ctx.lerp, self.config.interpolation);

        let Some(sprite_def) = pics.sprite_def(thing.sprite) else {
            #[cfg(feature = "safety_check")]
            debug!("project_sprite: invalid sprite number {}", thing.sprite);
            return;
        };
        if sprite_def.frames.is_empty() {
            error!("No frames for sprite {}, {:?}", thing.sprite, thing.id);
            return;
        }
        let Some(frame) = sprite_def.frames.get((thing.frame & FF_FRAMEMASK) as usize) else {
            #[cfg(feature = "safety_check")]
            debug!("project_sprite: invalid sprite frame {} : {}", thing.sprite, thing.frame);
            return;
        };

        let rot = if frame.rotate {
            select_rotation(frame, self.ctx.view.point_to_angle(x, y), thing.angle)
        } else {
            0
        };
        let lump = frame.lump[rot];
        let Some(patch) = pics.patch(lump) else {
            #[cfg(feature = "safety_check")]
            debug!("project_sprite: missing patch {lump}");
            return;
        };

        let quad = SpriteQuad {
            x,
            y,
            z,
            height: FixedPoint::from(patch.height),
            width: FixedPoint::from(patch.width),
            top_offs: FixedPoint::from(patch.top_offset),
            side_offs: FixedPoint::from(patch.left_offset),
            flip: frame.flip[rot],
        };
        let Some(mut vis) = generate_vissprite(&self.ctx.view, sector, fake_side, &quad) else {
            return;
        };

        vis.mobj_flags = thing.flags;
        vis.spectator = thing.spectator;
        vis.translation = thing.translation;
        vis.translucency = thing.translucency;
        vis.kind = VisKind::Patch { lump };
        vis.thing = Some(thing.id);
        vis.colourmap = select_sprite_light(
            &self.ctx.light,
            vis.colourmap,
            thing.frame,
            thing.full_bright,
            vis.yscale,
            self.ctx.view.light_scale_x_mul,
            self.lights.row(self.sprite_lights),
        );

        self.pool.push(vis);
    }
}
