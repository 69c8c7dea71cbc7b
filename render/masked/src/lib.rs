//! Things, particles and masked mid textures for the software renderer.
//!
//! The wall renderer hands over its draw segs once the BSP walk is done. In
//! between, every visited subsector reports its sector's things through
//! `MaskedRenderer::add_sprites` and its particles through
//! `MaskedRenderer::add_particles`. `MaskedRenderer::draw_masked` then sorts
//! and clips everything against the segs and paints it back to front, with
//! the player's weapon last.
//!
//! A frame:
//! - `begin_frame` with the camera and lighting for the frame
//! - `add_sprites` / `add_particles` per subsector
//! - `draw_masked` with the frame's draw segs

use log::debug;

mod columns;
mod config;
mod context;
mod defs;
mod masked;
mod particles;
mod pic;
mod pool;
mod psprites;
mod rotation;
mod sort;
mod things;

pub use columns::{draw_vissprite, DrawVariant};
pub use config::{ConfigError, RenderConfig};
pub use context::{CamPoint, FrameLight, RenderContext, View};
pub use defs::*;
pub use particles::{Particle, ParticleSystem, SubsectorLocator};
pub use pic::{Colourmap, Palette, Patch, PicSource, PicStore, Post, SpriteDef, SpriteFrame};
pub use pool::{VisHandle, VisSpritePool};
pub use psprites::{PlayerView, PspDef};
pub use rotation::{select_rotation, select_sprite_light};
pub use sort::sort_vissprites;
pub use things::{generate_vissprite, SpriteQuad, Thing, ThingId, VisKind, VisSprite};

/// Holds everything the sprite stage keeps between calls in a frame
pub struct MaskedRenderer {
    config: RenderConfig,
    ctx: RenderContext,
    pool: VisSpritePool,
    particles: ParticleSystem,
    lights: LightTables,
    /// Light band of the sector whose things are being projected
    sprite_lights: i32,
    /// Frame number each sector last had its things added in
    sector_frame: Vec<u32>,
    frame: u32,
    sort_order: Vec<usize>,
    /// Per column, last hidden row above and first hidden row below
    clip_top: Vec<i32>,
    clip_bottom: Vec<i32>,
    /// Per draw seg, which masked columns have been painted this frame
    masked_drawn: Vec<Vec<bool>>,
    fuzz_pos: usize,
}

impl MaskedRenderer {
    pub fn new(config: RenderConfig, width: i32, height: i32) -> Self {
        let view = View::new(width, height, 90.0);
        let columns = view.width as usize;
        Self {
            pool: VisSpritePool::new(config.initial_vissprites),
            particles: ParticleSystem::new(config.particle_capacity()),
            config,
            ctx: RenderContext::new(view),
            lights: LightTables::new(),
            sprite_lights: 0,
            sector_frame: Vec::new(),
            frame: 0,
            sort_order: Vec::new(),
            clip_top: vec![-1; columns],
            clip_bottom: vec![view.height; columns],
            masked_drawn: Vec::new(),
            fuzz_pos: 0,
        }
    }

    /// R_ClearSprites. Empties the vissprite pool, takes the camera for the
    /// new frame and re-buckets the particles. Without a locator every
    /// particle bucket is left empty for the frame.
    pub fn begin_frame(&mut self, ctx: RenderContext, locator: Option<&dyn SubsectorLocator>) {
        self.ctx = ctx;
        self.pool.reset();

        self.frame = self.frame.wrapping_add(1);
        if self.frame == 0 {
            self.sector_frame.fill(0);
            self.frame = 1;
        }

        let columns = ctx.view.width.max(1) as usize;
        if self.clip_top.len() != columns {
            debug!("Resizing sprite clip arrays to {columns} columns");
            self.clip_top.resize(columns, -1);
            self.clip_bottom.resize(columns, ctx.view.height);
        }

        match locator {
            Some(locator) => self.particles.find_subsectors(locator, self.config.particles),
            None => self.particles.clear_subsectors(),
        }
    }

    /// This frame's projected sprites, in projection order
    pub fn vissprites(&self) -> &[VisSprite] {
        self.pool.as_slice()
    }

    pub fn pool(&self) -> &VisSpritePool {
        &self.pool
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Swap in new options. A changed particle count rebuilds the particle
    /// pool, dropping any live particles.
    pub fn set_config(&mut self, config: RenderConfig) {
        if config.particle_capacity() != self.particles.capacity() {
            self.particles = ParticleSystem::new(config.particle_capacity());
        }
        self.config = config;
    }
}
