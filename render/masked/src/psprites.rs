//! The player's weapon and muzzle flash, drawn over everything else

use log::warn;
use math::{FixedPoint, FRACUNIT};
use render_trait::PixelBuffer;

use crate::columns::draw_vissprite;
use crate::context::View;
use crate::defs::{
    ColourmapId, MapObjFlag, ShadeRef, BASEYCENTER, FF_FRAMEMASK, FF_FULLBRIGHT, INVERSECOLORMAP, LIGHTSEGSHIFT,
    MAXLIGHTSCALE, NUMPSPRITES, WEAPONTWEAK,
};
use crate::pic::PicSource;
use crate::things::{VisKind, VisSprite};
use crate::MaskedRenderer;

/// Weapon offset from the centre, `sx` is the horizontal bob position
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct PspDef {
    pub sprite: usize,
    pub frame: u32,
    pub sx: FixedPoint,
    pub sy: FixedPoint,
}

/// What the overlay needs to know about the player being looked through
#[derive(Debug, Default, Clone)]
pub struct PlayerView {
    /// Weapon then flash, `None` when the slot is idle
    pub psprites: [Option<PspDef>; NUMPSPRITES],
    /// Light of the floor and ceiling the player stands in, after any fake
    /// flats are applied
    pub floor_light: i32,
    pub ceiling_light: i32,
    pub colourmap: ColourmapId,
    /// Remaining tics of the powers, `0` when not active
    pub invisibility: i32,
    pub invulnerability: i32,
    pub chasecam: bool,
    /// A spectator looking through their own eyes has no weapon
    pub spectating_own_view: bool,
}

#[inline]
fn power_visible(tics: i32) -> bool {
    tics > 4 * 32 || tics & 8 != 0
}

impl MaskedRenderer {
    /// R_DrawPlayerSprites
    pub fn draw_player_sprites(&mut self, player: &PlayerView, pics: &impl PicSource, pixels: &mut dyn PixelBuffer) {
        if self.config.draw_player_sprites <= 0.0 || player.chasecam || player.spectating_own_view {
            return;
        }

        let lightnum =
            ((player.floor_light + player.ceiling_light) >> (LIGHTSEGSHIFT + 1)) + self.ctx.light.effective_extralight();
        let sprite_lights = *self.lights.row(lightnum);

        // the weapon is positioned for a centred view
        let view = self.ctx.view.with_centery(self.ctx.view.height / 2 + 1);
        self.clip_top.fill(-1);
        self.clip_bottom.fill(view.height);

        for psp in player.psprites.iter().flatten() {
            self.draw_player_sprite(&view, psp, player, &sprite_lights, pics, pixels);
        }
    }

    /// R_DrawPSprite
    fn draw_player_sprite(
        &mut self,
        view: &View,
        psp: &PspDef,
        player: &PlayerView,
        sprite_lights: &[usize; MAXLIGHTSCALE],
        pics: &impl PicSource,
        pixels: &mut dyn PixelBuffer,
    ) {
        let Some(frame) = pics
            .sprite_def(psp.sprite)
            .and_then(|def| def.frames.get((psp.frame & FF_FRAMEMASK) as usize))
        else {
            warn!("Weapon sprite {} has no frame {}", psp.sprite, psp.frame & FF_FRAMEMASK);
            return;
        };
        let lump = frame.lump[0];
        let flip = frame.flip[0];
        let Some(patch) = pics.patch(lump) else {
            warn!("Weapon sprite {} is missing patch {lump}", psp.sprite);
            return;
        };

        // 160 centres the weapon at any width
        let mut tx = psp.sx - FixedPoint::from(160) - FixedPoint::from(patch.left_offset);
        let x1 = (view.centerx_frac + tx * view.psprite_xscale).raw() >> 16;
        if x1 > view.width {
            return;
        }
        tx += FixedPoint::from(patch.width);
        let x2 = ((view.centerx_frac + tx * view.psprite_xscale).raw() >> 16) - 1;
        if x2 < 0 {
            return;
        }

        let translucency = FixedPoint::from(self.config.draw_player_sprites).clamp(FixedPoint::zero(), FixedPoint::unit());
        let mut vis = VisSprite {
            x1: x1.max(0),
            x2: x2.min(view.width - 1),
            depth: FixedPoint::zero(),
            xscale: view.psprite_xscale,
            yscale: view.psprite_yscale,
            texture_mid: FixedPoint::from(BASEYCENTER) + FRACUNIT / 2
                - (psp.sy + WEAPONTWEAK - FixedPoint::from(patch.top_offset)),
            translucency,
            kind: VisKind::Patch { lump },
            ..VisSprite::default()
        };

        if flip {
            vis.x_iscale = -view.psprite_xiscale;
            vis.start_frac = FixedPoint::from(patch.width) - 1;
        } else {
            vis.x_iscale = view.psprite_xiscale;
            vis.start_frac = FixedPoint::zero();
        }
        if vis.x1 > x1 {
            vis.start_frac += vis.x_iscale * (vis.x1 - x1);
        }

        let base = ShadeRef::new(player.colourmap, 0);
        let light = self.ctx.light;
        vis.colourmap = if let Some(level) = light.fixed_light_level {
            base.with(level)
        } else if let Some(map) = light.fixed_colourmap {
            map
        } else if psp.frame & FF_FULLBRIGHT != 0 {
            base
        } else {
            base.with(sprite_lights[MAXLIGHTSCALE - 1])
        };

        if power_visible(player.invisibility) {
            vis.mobj_flags = MapObjFlag::Shadow as u32;
        }
        if self.config.soft_invuln_effect && power_visible(player.invulnerability) {
            vis.colourmap = ShadeRef::new(ColourmapId(0), INVERSECOLORMAP);
        }

        draw_vissprite(
            view,
            &vis,
            &self.clip_top,
            &self.clip_bottom,
            pics,
            &mut self.fuzz_pos,
            pixels,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{PlayerView, PspDef};
    use crate::config::RenderConfig;
    use crate::context::{RenderContext, View};
    use crate::pic::{Patch, PicStore, SpriteDef, SpriteFrame};
    use crate::MaskedRenderer;
    use math::FixedPoint;
    use render_trait::{PixelBuffer, SoftFramebuffer};

    const WEAPON_COLOUR: u8 = 200;

    fn weapon_pics() -> (PicStore, usize) {
        let mut pics = PicStore::new();
        pics.colourmaps[0] = PicStore::fading_colourmaps();
        let mut patch = Patch::solid(64, 32, WEAPON_COLOUR);
        patch.left_offset = -128;
        patch.top_offset = -135;
        let lump = pics.add_patch(patch);
        let sprite = pics.add_sprite(SpriteDef {
            frames: vec![SpriteFrame::single(lump, false)],
        });
        (pics, sprite)
    }

    fn player(sprite: usize) -> PlayerView {
        PlayerView {
            psprites: [
                Some(PspDef {
                    sprite,
                    frame: 0,
                    sx: FixedPoint::unit(),
                    sy: FixedPoint::from(32),
                }),
                None,
            ],
            floor_light: 255,
            ceiling_light: 255,
            ..PlayerView::default()
        }
    }

    fn renderer(config: RenderConfig) -> MaskedRenderer {
        let mut renderer = MaskedRenderer::new(config, 320, 200);
        renderer.begin_frame(RenderContext::new(View::new(320, 200, 90.0)), None);
        renderer
    }

    fn colour(pixels: &SoftFramebuffer, x: usize, y: usize) -> u8 {
        pixels.read_pixel(x, y)[0]
    }

    #[test]
    fn weapon_sits_at_screen_bottom() {
        let (pics, sprite) = weapon_pics();
        let mut pixels = SoftFramebuffer::new(320, 200);
        let mut renderer = renderer(RenderConfig::default());

        renderer.draw_player_sprites(&player(sprite), &pics, &mut pixels);
        assert_eq!(colour(&pixels, 160, 185), WEAPON_COLOUR);
        assert_eq!(colour(&pixels, 160, 199), WEAPON_COLOUR);
        assert_eq!(colour(&pixels, 160, 150), 0);
        assert_eq!(colour(&pixels, 100, 185), 0);
    }

    #[test]
    fn hidden_weapon_cases() {
        let (pics, sprite) = weapon_pics();

        let config = RenderConfig {
            draw_player_sprites: 0.0,
            ..RenderConfig::default()
        };
        let mut pixels = SoftFramebuffer::new(320, 200);
        renderer(config).draw_player_sprites(&player(sprite), &pics, &mut pixels);
        assert_eq!(colour(&pixels, 160, 185), 0);

        let mut chase = player(sprite);
        chase.chasecam = true;
        renderer(RenderConfig::default()).draw_player_sprites(&chase, &pics, &mut pixels);
        assert_eq!(colour(&pixels, 160, 185), 0);

        let mut spectator = player(sprite);
        spectator.spectating_own_view = true;
        renderer(RenderConfig::default()).draw_player_sprites(&spectator, &pics, &mut pixels);
        assert_eq!(colour(&pixels, 160, 185), 0);
    }

    #[test]
    fn half_visible_weapon_blends() {
        let (pics, sprite) = weapon_pics();
        let config = RenderConfig {
            draw_player_sprites: 0.5,
            ..RenderConfig::default()
        };
        let mut pixels = SoftFramebuffer::new(320, 200);
        renderer(config).draw_player_sprites(&player(sprite), &pics, &mut pixels);
        assert_eq!(colour(&pixels, 160, 185), WEAPON_COLOUR / 2);
    }

    #[test]
    fn invisibility_fuzzes_the_weapon() {
        let (pics, sprite) = weapon_pics();
        let mut pixels = SoftFramebuffer::new(320, 200);
        pixels.clear_with_colour(&[100, 100, 100, 255]);

        let mut view = player(sprite);
        view.invisibility = 1000;
        renderer(RenderConfig::default()).draw_player_sprites(&view, &pics, &mut pixels);
        // darkened background, not the weapon colour
        let c = colour(&pixels, 160, 185);
        assert!(c < 100 && c > 0, "{c}");
        assert_eq!(colour(&pixels, 100, 185), 100);
    }

    #[test]
    fn invulnerability_inverts_the_weapon() {
        let (pics, sprite) = weapon_pics();
        let mut pixels = SoftFramebuffer::new(320, 200);

        let mut view = player(sprite);
        view.invulnerability = 1000;
        renderer(RenderConfig::default()).draw_player_sprites(&view, &pics, &mut pixels);
        assert_eq!(colour(&pixels, 160, 185), 255 - WEAPON_COLOUR);

        // the blinking end of the power shows the normal weapon
        let mut pixels = SoftFramebuffer::new(320, 200);
        view.invulnerability = 16;
        renderer(RenderConfig::default()).draw_player_sprites(&view, &pics, &mut pixels);
        assert_eq!(colour(&pixels, 160, 185), WEAPON_COLOUR);

        let config = RenderConfig {
            soft_invuln_effect: false,
            ..RenderConfig::default()
        };
        view.invulnerability = 1000;
        renderer(config).draw_player_sprites(&view, &pics, &mut pixels);
        assert_eq!(colour(&pixels, 160, 185), WEAPON_COLOUR);
    }
}
