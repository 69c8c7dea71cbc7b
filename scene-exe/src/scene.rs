//! A hand built test map: two sectors split in to four subsectors, a
//! see-through fence, a low wall, a handful of things, a particle fountain and
//! the player's weapon.

use glam::Vec2;
use log::info;
use math::{Angle, DivLine, FixedPoint, FRACBITS, FRACUNIT};
use render_masked::{
    ColourmapId, DrawSeg, FakeSide, MapObjFlag, MaskedMid, MaskedRenderer, Patch, PicStore, PlayerView, Post,
    PspDef, RenderContext, Sector, SpriteDef, SpriteFrame, SubsectorLocator, Thing, ThingId, View, NEARCLIP,
    SIL_BOTTOM,
};
use render_trait::PixelBuffer;

const VIEW_HEIGHT: f32 = 41.0;
/// Sectors are split north/south here, subsectors also at x = 0
const SECTOR_SPLIT: f32 = 256.0;
const FOUNTAIN: Vec2 = Vec2::new(-40.0, 220.0);
const SKY: [u8; 4] = [40, 40, 40, 255];

#[inline]
fn fx(v: f32) -> FixedPoint {
    FixedPoint::from(v)
}

/// A wall the demo feeds to the masked renderer as a draw seg
struct Wall {
    v1: Vec2,
    v2: Vec2,
    top: f32,
    texture: usize,
    /// Masked mid texture, otherwise a solid low wall that hides what is
    /// below its top edge
    masked: bool,
}

/// What the renderer did with a frame
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameStats {
    pub vissprites: usize,
    pub particles: usize,
    pub segs: usize,
}

pub struct Scene {
    pub pics: PicStore,
    sectors: Vec<Sector>,
    /// Sector number of each subsector
    subsectors: Vec<usize>,
    walls: Vec<Wall>,
    player: PlayerView,
    tic: u32,
    /// Doom style index in to a fixed table of "random" numbers
    rnd: usize,
}

/// Numbers for jittering the particle fountain
const RNDTABLE: [u8; 16] = [0, 8, 109, 220, 222, 241, 149, 107, 75, 248, 254, 140, 16, 66, 74, 21];

impl Scene {
    pub fn new() -> Self {
        let mut pics = PicStore::new();
        pics.colourmaps[0] = PicStore::fading_colourmaps();
        // player colours for the translated thing
        pics.translations = (0..4)
            .map(|t| std::array::from_fn(|i| (i as u8).wrapping_add(t as u8 * 16)))
            .collect();
        pics.translations.resize(render_masked::MAXPLAYERS + 3, std::array::from_fn(|i| i as u8));

        let still = pics.add_patch(Patch::solid(24, 56, 160));
        let lamp = pics.add_patch(Patch::solid(12, 48, 250));
        let still_sprite = pics.add_sprite(SpriteDef {
            frames: vec![SpriteFrame::single(still, false)],
        });
        let lamp_sprite = pics.add_sprite(SpriteDef {
            frames: vec![SpriteFrame::single(lamp, false)],
        });

        // a different shade per view so rotation is visible
        let mut views = [(0, false); 8];
        for (i, view) in views.iter_mut().enumerate() {
            *view = (pics.add_patch(Patch::solid(32, 56, 96 + i as u8 * 12)), i > 4);
        }
        let turner_sprite = pics.add_sprite(SpriteDef {
            frames: vec![SpriteFrame::rotations(views)],
        });

        let weapon = {
            let mut patch = Patch::solid(64, 32, 200);
            patch.left_offset = -128;
            patch.top_offset = -135;
            pics.add_patch(patch)
        };
        let weapon_sprite = pics.add_sprite(SpriteDef {
            frames: vec![SpriteFrame::single(weapon, false)],
        });

        let grate = pics.add_texture(grate_texture(64, 64, 120));
        let brick = pics.add_texture(Patch::solid(64, 24, 70));

        let mut near = Sector {
            num: 0,
            light_level: 224,
            ..Sector::default()
        };
        let mut far = Sector {
            num: 1,
            light_level: 144,
            ..Sector::default()
        };

        let mut id = 0;
        let mut thing = |x: f32, y: f32, sprite: usize| {
            id += 1;
            Thing::new(ThingId(id), fx(x), fx(y), FixedPoint::zero(), sprite, 0)
        };

        near.things.push(thing(-96.0, 160.0, still_sprite));
        let mut lamp_thing = thing(72.0, 200.0, lamp_sprite);
        lamp_thing.full_bright = true;
        near.things.push(lamp_thing);

        let mut turner = thing(0.0, 400.0, turner_sprite);
        turner.angle = Angle::from_degrees(270.0);
        far.things.push(turner);
        let mut ghost = thing(128.0, 360.0, still_sprite);
        ghost.flags = MapObjFlag::Shadow as u32;
        far.things.push(ghost);
        let mut friend = thing(-128.0, 380.0, still_sprite);
        friend.flags = 1 << render_masked::MF_TRANSSHIFT;
        far.things.push(friend);
        let mut glass = thing(-48.0, 330.0, still_sprite);
        glass.translucency = FixedPoint::new(FRACUNIT / 2);
        far.things.push(glass);

        let walls = vec![
            Wall {
                v1: Vec2::new(-96.0, 300.0),
                v2: Vec2::new(96.0, 300.0),
                top: 64.0,
                texture: grate,
                masked: true,
            },
            Wall {
                v1: Vec2::new(100.0, 250.0),
                v2: Vec2::new(220.0, 250.0),
                top: 24.0,
                texture: brick,
                masked: false,
            },
        ];

        let player = PlayerView {
            psprites: [
                Some(PspDef {
                    sprite: weapon_sprite,
                    frame: 0,
                    sx: FixedPoint::unit(),
                    sy: FixedPoint::from(32),
                }),
                None,
            ],
            floor_light: near.light_level,
            ceiling_light: near.light_level,
            ..PlayerView::default()
        };

        info!(
            "Scene has {} sprites, {} patches, {} walls",
            pics.sprites.len(),
            pics.patches.len(),
            walls.len()
        );

        Self {
            pics,
            sectors: vec![near, far],
            subsectors: vec![0, 0, 1, 1],
            walls,
            player,
            tic: 0,
            rnd: 0,
        }
    }

    fn random(&mut self) -> i32 {
        self.rnd = (self.rnd + 1) % RNDTABLE.len();
        RNDTABLE[self.rnd] as i32
    }

    /// Advance the world one game tic
    pub fn tic(&mut self, renderer: &mut MaskedRenderer) {
        self.tic += 1;
        let phase = Angle::new(self.tic.wrapping_mul(1 << 26));

        // pace left and right, turning the rotating thing
        for sector in self.sectors.iter_mut() {
            for thing in sector.things.iter_mut() {
                let dx = phase.cos() * 3;
                thing.move_to(thing.x + dx, thing.y, thing.z);
            }
        }
        if let Some(turner) = self.sectors[1].things.first_mut() {
            turner.angle += Angle::new(1 << 27);
        }

        // weapon bob
        if let Some(psp) = self.player.psprites[0].as_mut() {
            psp.sx = FixedPoint::unit() + phase.cos() * 4;
            psp.sy = FixedPoint::from(32) + (phase.sin() * 2).abs();
        }

        let particles = renderer.particles_mut();
        particles.think();
        for _ in 0..3 {
            let (jx, jy, jz) = (self.random() - 128, self.random() - 128, self.random());
            let Some(p) = particles.new_particle() else {
                break;
            };
            p.x = fx(FOUNTAIN.x);
            p.y = fx(FOUNTAIN.y);
            p.z = FixedPoint::from(8);
            p.vel_x = FixedPoint::new(jx << 9);
            p.vel_y = FixedPoint::new(jy << 9);
            p.vel_z = FixedPoint::new((jz << 10) + FRACUNIT * 2);
            p.acc_z = FixedPoint::new(-FRACUNIT / 8);
            p.size = 6;
            p.colour = 230;
            p.trans = 255;
            p.fade = 7;
            p.ttl = 35;
        }
    }

    /// The camera for this tic, swaying so the rotating thing shows more
    /// than one view
    pub fn camera(&self, base: View) -> View {
        let sway = Angle::new(self.tic.wrapping_mul(1 << 25)).sin();
        let degrees = 90.0 + f32::from(sway) * 20.0;
        base.with_position(
            FixedPoint::zero(),
            FixedPoint::zero(),
            fx(VIEW_HEIGHT),
            Angle::from_degrees(degrees),
        )
    }

    /// Runs the sprite stage for one frame as the BSP walk would
    pub fn render(
        &self,
        renderer: &mut MaskedRenderer,
        ctx: RenderContext,
        pixels: &mut dyn PixelBuffer,
    ) -> FrameStats {
        renderer.begin_frame(ctx, Some(self));

        for (ss, sector_num) in self.subsectors.iter().enumerate() {
            let sector = &self.sectors[*sector_num];
            renderer.add_sprites(sector, sector.light_level, FakeSide::Center, &self.pics);
            renderer.add_particles(ss, sector, FakeSide::Center);
        }

        let segs: Vec<DrawSeg> = self
            .walls
            .iter()
            .filter_map(|wall| self.project_wall(&ctx.view, wall))
            .collect();

        pixels.clear_with_colour(&SKY);
        let vissprites = renderer.vissprites().len();
        renderer.draw_masked(&segs, Some(&self.player), &self.pics, pixels);

        FrameStats {
            vissprites,
            particles: renderer.particles().active_count(),
            segs: segs.len(),
        }
    }

    /// A stand in for the wall renderer. Walls are assumed to be wholly in
    /// front of the camera.
    fn project_wall(&self, view: &View, wall: &Wall) -> Option<DrawSeg> {
        let t1 = view.to_camera(fx(wall.v1.x), fx(wall.v1.y));
        let t2 = view.to_camera(fx(wall.v2.x), fx(wall.v2.y));
        if t1.y < NEARCLIP || t2.y < NEARCLIP {
            return None;
        }

        let xa = view.project_x(t1.x, t1.y);
        let xb = view.project_x(t2.x, t2.y);
        if xb <= xa {
            return None;
        }
        let (x1, x2) = view.check_projection_x(xa, xb - 1)?;

        let s1 = view.focal_y / t1.y;
        let s2 = view.focal_y / t2.y;
        let step = FixedPoint::new((s2 - s1).raw() / (xb - xa));

        let mut seg = DrawSeg::new(x1, x2, DivLine::from_vec2(wall.v1, wall.v2));
        seg.scale1 = s1 + step * (x1 - xa);
        seg.scale2 = s1 + step * (x2 - xa);
        seg.scale_step = step;

        let sector = &self.sectors[self.subsectors[self.point_in_subsector(seg.line.x, seg.line.y)]];
        if wall.masked {
            // perspective correct texture column per screen column
            let (z1, z2) = (f32::from(t1.y), f32::from(t2.y));
            let len = wall.v1.distance(wall.v2);
            let width = self.pics.textures[wall.texture].width.max(1) as usize;
            let columns = (x1..=x2)
                .map(|x| {
                    let ts = (x - xa) as f32 / (xb - xa) as f32;
                    let t = (ts / z2) / ((1.0 - ts) / z1 + ts / z2);
                    Some((t * len) as usize % width)
                })
                .collect();
            seg.masked = Some(MaskedMid {
                texture: wall.texture,
                texture_mid: fx(wall.top) - view.z,
                columns,
                colourmap: ColourmapId(0),
                light_level: sector.light_level,
                translucency: FixedPoint::unit(),
            });
        } else {
            let top = fx(wall.top) - view.z;
            let mut scale = seg.scale1;
            let clip = (x1..=x2)
                .map(|_| {
                    let row = (view.centery_frac - top * scale).raw() >> FRACBITS;
                    scale += step;
                    row.clamp(0, view.height)
                })
                .collect();
            seg.silhouette = SIL_BOTTOM;
            seg.spr_bottom_clip = Some(clip);
        }
        Some(seg)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl SubsectorLocator for Scene {
    fn num_subsectors(&self) -> usize {
        self.subsectors.len()
    }

    fn point_in_subsector(&self, x: FixedPoint, y: FixedPoint) -> usize {
        let east = (x >= FixedPoint::zero()) as usize;
        let north = (y >= fx(SECTOR_SPLIT)) as usize;
        north * 2 + east
    }
}

/// Vertical bars with gaps, every other column left empty
fn grate_texture(width: i32, height: i32, colour: u8) -> Patch {
    let columns = (0..width)
        .map(|x| {
            if (x / 4) % 2 == 0 {
                vec![Post::new(0, vec![colour; height as usize])]
            } else {
                // a cross bar part way down
                vec![Post::new(height / 3, vec![colour.wrapping_add(20); 6])]
            }
        })
        .collect();
    Patch {
        width,
        height,
        left_offset: 0,
        top_offset: 0,
        columns,
    }
}

#[cfg(test)]
mod tests {
    use super::Scene;
    use math::FixedPoint;
    use render_masked::{MaskedRenderer, RenderConfig, RenderContext, SubsectorLocator, View};
    use render_trait::SoftFramebuffer;

    #[test]
    fn subsectors_by_quadrant() {
        let scene = Scene::new();
        assert_eq!(scene.point_in_subsector(FixedPoint::from(-10), FixedPoint::from(10)), 0);
        assert_eq!(scene.point_in_subsector(FixedPoint::from(10), FixedPoint::from(10)), 1);
        assert_eq!(scene.point_in_subsector(FixedPoint::from(-10), FixedPoint::from(300)), 2);
        assert_eq!(scene.point_in_subsector(FixedPoint::from(10), FixedPoint::from(300)), 3);
    }

    #[test]
    fn frames_render_things_and_walls() {
        let mut scene = Scene::new();
        let mut renderer = MaskedRenderer::new(RenderConfig::default(), 320, 200);
        let mut pixels = SoftFramebuffer::new(320, 200);
        let base = View::new(320, 200, 90.0);

        let mut stats = Default::default();
        for _ in 0..10 {
            scene.tic(&mut renderer);
            let ctx = RenderContext::new(scene.camera(base));
            stats = scene.render(&mut renderer, ctx, &mut pixels);
        }
        assert!(stats.vissprites >= 5, "{stats:?}");
        assert_eq!(stats.segs, 2);
        assert!(stats.particles > 0);
    }
}
