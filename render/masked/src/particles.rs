//! Particles: a fixed pool with an active and an inactive list, bucketed by
//! subsector each frame so BSP traversal can project them as it goes.

use log::debug;
use math::{FixedPoint, FRACUNIT};
use render_trait::PixelBuffer;

use crate::columns::blend;
use crate::context::RenderContext;
use crate::defs::{
    FakeSide, LightTables, Sector, ShadeRef, LIGHTLEVELS, LIGHTSCALESHIFT, LIGHTSEGSHIFT,
};
use crate::pic::PicSource;
use crate::rotation::scale_light_index;
use crate::things::{generate_vissprite, SpriteQuad, VisKind, VisSprite};
use crate::MaskedRenderer;

/// Finds the subsector a map position lies in. Provided by the BSP owner.
pub trait SubsectorLocator {
    fn num_subsectors(&self) -> usize;
    fn point_in_subsector(&self, x: FixedPoint, y: FixedPoint) -> usize;
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: FixedPoint,
    pub y: FixedPoint,
    pub z: FixedPoint,
    pub vel_x: FixedPoint,
    pub vel_y: FixedPoint,
    pub vel_z: FixedPoint,
    pub acc_x: FixedPoint,
    pub acc_y: FixedPoint,
    pub acc_z: FixedPoint,
    /// Quarter map units
    pub size: u8,
    /// Palette index
    pub colour: u8,
    /// 255 is opaque
    pub trans: u8,
    /// Subtracted from `trans` every tic
    pub fade: u8,
    /// Tics left to live
    pub ttl: i16,
    next: Option<usize>,
    next_in_subsector: Option<usize>,
}

#[derive(Debug)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    active: Option<usize>,
    inactive: Option<usize>,
    /// First particle of each subsector bucket this frame
    in_subsector: Vec<Option<usize>>,
}

impl ParticleSystem {
    /// R_InitParticles, `capacity` should already be sized by the config
    pub fn new(capacity: usize) -> Self {
        let mut system = Self {
            particles: vec![Particle::default(); capacity.max(1)],
            active: None,
            inactive: None,
            in_subsector: Vec::new(),
        };
        system.clear();
        system
    }

    /// R_ClearParticles. Every slot goes back on the inactive list.
    pub fn clear(&mut self) {
        let len = self.particles.len();
        for (i, p) in self.particles.iter_mut().enumerate() {
            *p = Particle::default();
            p.next = (i + 1 < len).then_some(i + 1);
        }
        self.active = None;
        self.inactive = Some(0);
        self.in_subsector.fill(None);
    }

    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    /// Take a particle off the inactive list, `None` when all are in use
    pub fn new_particle(&mut self) -> Option<&mut Particle> {
        let index = self.inactive?;
        let active = self.active;
        let p = &mut self.particles[index];
        self.inactive = p.next;
        *p = Particle {
            next: active,
            ..Particle::default()
        };
        self.active = Some(index);
        Some(p)
    }

    pub fn iter_active(&self) -> ActiveIter<'_> {
        ActiveIter {
            particles: &self.particles,
            next: self.active,
            in_subsector: false,
        }
    }

    pub fn active_count(&self) -> usize {
        self.iter_active().count()
    }

    /// P_ThinkParticles. Fades, moves and accelerates every active particle
    /// and retires the ones that faded out or expired. The subsector buckets
    /// are dropped since particles have moved and slots may be reused.
    pub fn think(&mut self) {
        self.clear_subsectors();
        let mut prev: Option<usize> = None;
        let mut i = self.active;
        while let Some(index) = i {
            let p = &mut self.particles[index];
            i = p.next;

            let (trans, faded) = p.trans.overflowing_sub(p.fade);
            p.ttl -= 1;
            if faded || p.ttl <= 0 {
                *p = Particle {
                    next: self.inactive,
                    ..Particle::default()
                };
                self.inactive = Some(index);
                match prev {
                    Some(prev) => self.particles[prev].next = i,
                    None => self.active = i,
                }
                continue;
            }

            p.trans = trans;
            p.x += p.vel_x;
            p.y += p.vel_y;
            p.z += p.vel_z;
            p.vel_x += p.acc_x;
            p.vel_y += p.acc_y;
            p.vel_z += p.acc_z;
            prev = Some(index);
        }
    }

    /// R_FindParticleSubsectors. Rebuilds the per subsector buckets, leaving
    /// them all empty when particles are turned off.
    pub fn find_subsectors(&mut self, locator: &dyn SubsectorLocator, enabled: bool) {
        self.in_subsector.clear();
        self.in_subsector.resize(locator.num_subsectors(), None);
        if !enabled {
            return;
        }

        let mut i = self.active;
        while let Some(index) = i {
            let p = &mut self.particles[index];
            i = p.next;
            let ssnum = locator.point_in_subsector(p.x, p.y);
            let Some(head) = self.in_subsector.get_mut(ssnum) else {
                debug!("particle {index} outside of the map, subsector {ssnum}");
                continue;
            };
            p.next_in_subsector = *head;
            *head = Some(index);
        }
    }

    /// Empty every bucket until the next `find_subsectors`
    pub fn clear_subsectors(&mut self) {
        self.in_subsector.fill(None);
    }

    /// The particles found in a subsector by the last `find_subsectors`
    pub fn in_subsector(&self, subsector: usize) -> ActiveIter<'_> {
        ActiveIter {
            particles: &self.particles,
            next: self.in_subsector.get(subsector).copied().flatten(),
            in_subsector: true,
        }
    }
}

pub struct ActiveIter<'a> {
    particles: &'a [Particle],
    next: Option<usize>,
    in_subsector: bool,
}

impl<'a> Iterator for ActiveIter<'a> {
    type Item = &'a Particle;

    fn next(&mut self) -> Option<Self::Item> {
        let p = self.particles.get(self.next?)?;
        self.next = if self.in_subsector {
            p.next_in_subsector
        } else {
            p.next
        };
        Some(p)
    }
}

/// R_ProjectParticle
pub fn project_particle(
    ctx: &RenderContext,
    lights: &LightTables,
    particle: &Particle,
    sector: &Sector,
    fake_side: FakeSide,
) -> Option<VisSprite> {
    let size = FixedPoint::new(particle.size as i32 * (FRACUNIT / 4));
    let quad = SpriteQuad {
        x: particle.x,
        y: particle.y,
        z: particle.z,
        height: size,
        width: size,
        top_offs: size,
        side_offs: size >> 1,
        flip: false,
    };
    let mut vis = generate_vissprite(&ctx.view, sector, fake_side, &quad)?;

    vis.kind = VisKind::Particle {
        colour: particle.colour,
    };
    vis.translucency = FixedPoint::new((particle.trans as i32 + 1) << 8);

    let light = &ctx.light;
    vis.colourmap = if let Some(fixed) = light.fixed_colourmap {
        fixed
    } else {
        let map = match vis.height_sec {
            Some(hs) if vis.fake_side != FakeSide::Center => ShadeRef::new(hs.colourmap, 0),
            _ => ShadeRef::new(sector.colourmap, 0),
        };
        if let Some(level) = light.fixed_light_level {
            map.with(level)
        } else {
            let index = scale_light_index(vis.yscale, ctx.view.light_scale_x_mul, LIGHTSCALESHIFT - 1);
            let lightnum = ((sector.light_level >> LIGHTSEGSHIFT) + light.effective_extralight())
                .clamp(0, LIGHTLEVELS as i32 - 1);
            map.with(lights.row(lightnum)[index])
        }
    };

    Some(vis)
}

/// R_DrawParticle. A particle is small so the clip is only checked at its
/// two edge columns.
pub fn draw_particle(
    vis: &VisSprite,
    clip_top: &[i32],
    clip_bottom: &[i32],
    pics: &impl PicSource,
    pixels: &mut dyn PixelBuffer,
) {
    let VisKind::Particle { colour } = vis.kind else {
        return;
    };
    let (x1, x2) = (vis.x1 as usize, vis.x2 as usize);
    let (Some(t1), Some(t2), Some(b1), Some(b2)) = (
        clip_top.get(x1),
        clip_top.get(x2),
        clip_bottom.get(x1),
        clip_bottom.get(x2),
    ) else {
        return;
    };
    let y1 = vis.y1.max(t1 + 1).max(t2 + 1);
    let y2 = vis.y2.min(b1 - 1).min(b2 - 1);

    let colourmap = pics.colourmap(vis.colourmap);
    let src = &pics.palette()[colourmap[colour as usize] as usize];
    for y in y1..=y2 {
        for x in vis.x1..=vis.x2 {
            let dst = pixels.read_pixel(x as usize, y as usize);
            pixels.set_pixel(x as usize, y as usize, &blend(src, &dst, vis.translucency));
        }
    }
}

impl MaskedRenderer {
    /// Project the particles in one subsector, called during BSP traversal
    pub fn add_particles(&mut self, subsector: usize, sector: &Sector, fake_side: FakeSide) {
        for particle in self.particles.in_subsector(subsector) {
            if let Some(vis) = project_particle(&self.ctx, &self.lights, particle, sector, fake_side) {
                self.pool.push(vis);
            }
        }
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut ParticleSystem {
        &mut self.particles
    }
}

#[cfg(test)]
mod tests {
    use super::{draw_particle, project_particle, ParticleSystem, SubsectorLocator};
    use crate::context::{RenderContext, View};
    use crate::defs::{ColourmapId, FakeSide, HeightSec, LightTables, Sector, ShadeRef};
    use crate::pic::PicStore;
    use crate::things::VisKind;
    use math::FixedPoint;
    use render_trait::{PixelBuffer, SoftFramebuffer};

    /// Two subsectors split at x = 0
    struct Halves;

    impl SubsectorLocator for Halves {
        fn num_subsectors(&self) -> usize {
            2
        }

        fn point_in_subsector(&self, x: FixedPoint, _y: FixedPoint) -> usize {
            if x.is_negative() { 0 } else { 1 }
        }
    }

    fn fp(v: i32) -> FixedPoint {
        FixedPoint::from(v)
    }

    #[test]
    fn pool_exhausts_and_recycles() {
        let mut ps = ParticleSystem::new(3);
        for _ in 0..3 {
            let p = ps.new_particle().unwrap();
            p.ttl = 1;
            p.trans = 255;
        }
        assert!(ps.new_particle().is_none());
        assert_eq!(ps.active_count(), 3);

        // all expire after one tic
        ps.think();
        assert_eq!(ps.active_count(), 0);
        assert!(ps.new_particle().is_some());

        ps.clear();
        assert_eq!(ps.active_count(), 0);
        for _ in 0..3 {
            assert!(ps.new_particle().is_some());
        }
    }

    #[test]
    fn think_moves_and_fades() {
        let mut ps = ParticleSystem::new(4);
        {
            let p = ps.new_particle().unwrap();
            p.ttl = 10;
            p.trans = 100;
            p.fade = 40;
            p.vel_x = fp(2);
            p.acc_x = fp(1);
        }
        {
            let p = ps.new_particle().unwrap();
            p.ttl = 10;
            p.trans = 30;
            p.fade = 40;
        }
        ps.think();
        // the faint one wrapped below zero and was retired
        let active: Vec<_> = ps.iter_active().copied().collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].x, fp(2));
        assert_eq!(active[0].vel_x, fp(3));
        assert_eq!(active[0].trans, 60);

        ps.think();
        let p = ps.iter_active().next().unwrap();
        assert_eq!(p.x, fp(5));
        assert_eq!(p.trans, 20);
    }

    #[test]
    fn buckets_by_subsector() {
        let mut ps = ParticleSystem::new(8);
        for x in [-10, 10, 20, -30] {
            let p = ps.new_particle().unwrap();
            p.x = fp(x);
            p.ttl = 5;
        }
        ps.find_subsectors(&Halves, true);
        let mut left: Vec<i32> = ps.in_subsector(0).map(|p| p.x.to_int()).collect();
        let mut right: Vec<i32> = ps.in_subsector(1).map(|p| p.x.to_int()).collect();
        left.sort();
        right.sort();
        assert_eq!(left, vec![-30, -10]);
        assert_eq!(right, vec![10, 20]);
        assert_eq!(ps.in_subsector(5).count(), 0);

        // disabled particles leave every bucket empty
        ps.find_subsectors(&Halves, false);
        assert_eq!(ps.in_subsector(0).count(), 0);
        assert_eq!(ps.in_subsector(1).count(), 0);
    }

    #[test]
    fn reused_slot_is_not_left_in_old_bucket() {
        let mut ps = ParticleSystem::new(1);
        {
            let p = ps.new_particle().unwrap();
            p.x = fp(80);
            p.ttl = 1;
            p.trans = 255;
        }
        ps.find_subsectors(&Halves, true);
        assert_eq!(ps.in_subsector(1).count(), 1);

        ps.think();
        assert_eq!(ps.active_count(), 0);
        assert_eq!(ps.in_subsector(1).count(), 0);

        {
            let p = ps.new_particle().unwrap();
            p.x = fp(-500);
            p.ttl = 5;
        }
        assert_eq!(ps.in_subsector(0).count(), 0);
        assert_eq!(ps.in_subsector(1).count(), 0);

        ps.find_subsectors(&Halves, true);
        let left: Vec<i32> = ps.in_subsector(0).map(|p| p.x.to_int()).collect();
        assert_eq!(left, vec![-500]);
        assert_eq!(ps.in_subsector(1).count(), 0);
    }

    #[test]
    fn projects_square_with_light() {
        let ctx = RenderContext::new(View::new(320, 200, 90.0));
        let lights = LightTables::new();
        let mut ps = ParticleSystem::new(1);
        let p = ps.new_particle().unwrap();
        p.x = fp(80);
        p.size = 8;
        p.trans = 255;
        p.colour = 40;
        let particle = *p;

        let sector = Sector {
            light_level: 160,
            colourmap: ColourmapId(1),
            ..Sector::default()
        };
        let vis = project_particle(&ctx, &lights, &particle, &sector, FakeSide::Center).unwrap();
        assert_eq!(vis.kind, VisKind::Particle { colour: 40 });
        assert_eq!(vis.translucency, FixedPoint::unit());
        assert_eq!(vis.colourmap.map, ColourmapId(1));
        // 2 units wide at 80 units away, two columns either side of the centre
        assert!(vis.x2 - vis.x1 <= 4);
        assert!((158..=162).contains(&vis.x1));
        // scale 2.0 with one less shift than sprites is past the end of the row
        assert_eq!(vis.colourmap.level, lights.row(10)[47]);

        // seen through a fake floor the control sector's colourmap is used
        let mut sector = sector;
        sector.height_sec = Some(HeightSec {
            floor_height: fp(-64),
            ceiling_height: fp(64),
            ignore: false,
            colourmap: ColourmapId(3),
        });
        let vis = project_particle(&ctx, &lights, &particle, &sector, FakeSide::AboveCeiling);
        assert!(vis.is_none());
        let vis = project_particle(&ctx, &lights, &particle, &sector, FakeSide::Center).unwrap();
        assert_eq!(vis.colourmap.map, ColourmapId(1));

        let mut ctx = ctx;
        let fixed = ShadeRef::new(ColourmapId(0), 32);
        ctx.light.fixed_colourmap = Some(fixed);
        let vis = project_particle(&ctx, &lights, &particle, &sector, FakeSide::Center).unwrap();
        assert_eq!(vis.colourmap, fixed);
    }

    #[test]
    fn draw_uses_edge_clips() {
        let ctx = RenderContext::new(View::new(320, 200, 90.0));
        let lights = LightTables::new();
        let particle = super::Particle {
            x: fp(40),
            size: 16,
            trans: 255,
            colour: 77,
            ..Default::default()
        };
        let sector = Sector {
            light_level: 255,
            ..Sector::default()
        };
        let vis = project_particle(&ctx, &lights, &particle, &sector, FakeSide::Center).unwrap();
        let pics = PicStore::new();
        let mut pixels = SoftFramebuffer::new(320, 200);
        let top = vec![-1; 320];
        let mut bottom = vec![200; 320];
        bottom[vis.x2 as usize] = vis.y1 + 2;
        draw_particle(&vis, &top, &bottom, &pics, &mut pixels);

        assert_eq!(pixels.read_pixel(vis.x1 as usize, vis.y1 as usize), [77, 77, 77, 255]);
        assert_eq!(pixels.read_pixel(vis.x1 as usize, vis.y1 as usize + 1), [77, 77, 77, 255]);
        // the right edge clip cuts every column
        assert_eq!(pixels.read_pixel(vis.x1 as usize, vis.y1 as usize + 2), [0, 0, 0, 0]);
    }
}
