#[cfg(feature = "hprof")]
use coarse_prof::profile;
use log::debug;
use math::FixedPoint;
use render_trait::PixelBuffer;

use crate::columns::{draw_vissprite, ColumnBlast, ColumnPainter, DrawVariant};
use crate::context::View;
use crate::defs::{DrawSeg, FakeSide, ShadeRef, LIGHTSCALESHIFT, LIGHTSEGSHIFT, SIL_BOTH, SIL_BOTTOM, SIL_TOP};
use crate::pic::PicSource;
use crate::psprites::PlayerView;
use crate::rotation::scale_light_index;
use crate::sort::sort_vissprites;
use crate::things::VisSprite;
use crate::MaskedRenderer;

/// Screen row of a fake floor or ceiling at the sprite's distance
#[inline]
fn fake_plane_row(view: &View, height: FixedPoint, yscale: FixedPoint) -> i32 {
    let h = (height - view.z).raw() as i64 * yscale.raw() as i64 >> 16;
    ((view.centery_frac.raw() as i64 - h) >> 16) as i32
}

impl MaskedRenderer {
    /// R_DrawMasked. Sprites back to front, interleaved with the masked
    /// mid textures of segs behind them, then whatever masked columns are
    /// left and the weapon on top.
    pub fn draw_masked(
        &mut self,
        segs: &[DrawSeg],
        player: Option<&PlayerView>,
        pics: &impl PicSource,
        pixels: &mut dyn PixelBuffer,
    ) {
        #[cfg(feature = "hprof")]
        profile!("draw_masked");

        self.masked_drawn.resize_with(segs.len(), Vec::new);
        for (drawn, seg) in self.masked_drawn.iter_mut().zip(segs) {
            drawn.clear();
            drawn.resize(seg.width(), false);
        }

        let mut order = std::mem::take(&mut self.sort_order);
        sort_vissprites(self.pool.as_slice(), &mut order);
        debug!("draw_masked: {} vissprites, {} segs", order.len(), segs.len());

        for &i in order.iter().rev() {
            let vis = self.pool.as_slice()[i];
            self.draw_sprite(&vis, segs, pics, pixels);
        }
        self.sort_order = order;

        for (i, seg) in segs.iter().enumerate().rev() {
            if seg.masked.is_some() {
                self.render_masked_seg_range(i, seg, seg.x1, seg.x2, pics, pixels);
            }
        }

        if let Some(player) = player {
            self.draw_player_sprites(player, pics, pixels);
        }
    }

    /// R_DrawSprite. Builds the clip arrays for one sprite from the segs in
    /// front of it, drawing the masked parts of any segs behind it first.
    pub(crate) fn draw_sprite(
        &mut self,
        vis: &VisSprite,
        segs: &[DrawSeg],
        pics: &impl PicSource,
        pixels: &mut dyn PixelBuffer,
    ) {
        if vis.x1 > vis.x2 {
            return;
        }
        let view = self.ctx.view;

        let mut top = 0;
        let mut bottom = view.height;
        if let Some(hs) = vis.height_sec {
            if vis.fake_side != FakeSide::AboveCeiling {
                let h = fake_plane_row(&view, hs.floor_height, vis.yscale);
                if vis.fake_side == FakeSide::BelowFloor {
                    if h > top {
                        top = h.min(view.height);
                    }
                } else if h < bottom {
                    bottom = h.max(0);
                }
            }
            if vis.fake_side != FakeSide::BelowFloor {
                let h = fake_plane_row(&view, hs.ceiling_height, vis.yscale);
                if vis.fake_side == FakeSide::AboveCeiling {
                    if h < bottom {
                        bottom = h.max(0);
                    }
                } else if h > top {
                    top = h.min(view.height);
                }
            }
        }

        let (x1, x2) = (vis.x1 as usize, vis.x2 as usize);
        if x2 >= self.clip_top.len() {
            debug!("draw_sprite: sprite {}..{} is off the screen", vis.x1, vis.x2);
            return;
        }
        self.clip_top[x1..=x2].fill(top);
        self.clip_bottom[x1..=x2].fill(bottom);

        for (i, seg) in segs.iter().enumerate().rev() {
            if seg.x1 > vis.x2 || seg.x2 < vis.x1 || (seg.silhouette & SIL_BOTH == 0 && seg.masked.is_none()) {
                continue;
            }

            let r1 = seg.x1.max(vis.x1);
            let r2 = seg.x2.min(vis.x2);

            let (scale, lowscale) = seg.scale_range();
            if scale < vis.yscale || (lowscale < vis.yscale && !seg.line.point_on_side(vis.gx, vis.gy)) {
                // seg is behind sprite
                if seg.masked.is_some() {
                    self.render_masked_seg_range(i, seg, r1, r2, pics, pixels);
                }
                continue;
            }

            for x in r1..=r2 {
                let c = x as usize;
                if seg.silhouette & SIL_BOTTOM != 0 {
                    if let Some(clip) = seg.bottom_clip(x) {
                        self.clip_bottom[c] = self.clip_bottom[c].min(clip);
                    }
                }
                if seg.silhouette & SIL_TOP != 0 {
                    if let Some(clip) = seg.top_clip(x) {
                        self.clip_top[c] = self.clip_top[c].max(clip);
                    }
                }
            }
        }

        draw_vissprite(
            &view,
            vis,
            &self.clip_top,
            &self.clip_bottom,
            pics,
            &mut self.fuzz_pos,
            pixels,
        );
    }

    /// R_RenderMaskedSegRange. Columns already drawn this frame are skipped
    /// so a seg split across several sprites is painted once.
    pub(crate) fn render_masked_seg_range(
        &mut self,
        seg_index: usize,
        seg: &DrawSeg,
        x1: i32,
        x2: i32,
        pics: &impl PicSource,
        pixels: &mut dyn PixelBuffer,
    ) {
        let Some(mid) = seg.masked.as_ref() else {
            return;
        };
        let Some(texture) = pics.wall_texture(mid.texture) else {
            debug!("render_masked_seg_range: missing texture {}", mid.texture);
            return;
        };
        let Some(drawn) = self.masked_drawn.get_mut(seg_index) else {
            return;
        };
        let view = self.ctx.view;
        let light = self.ctx.light;

        let lightnum = (mid.light_level >> LIGHTSEGSHIFT) + light.effective_extralight();
        let wall_lights = self.lights.row(lightnum);
        let base = ShadeRef::new(mid.colourmap, 0);
        let variant = if mid.translucency < FixedPoint::unit() {
            DrawVariant::Lucent(mid.translucency)
        } else {
            DrawVariant::Plain
        };

        let mut scale = seg.scale1 + seg.scale_step * (x1 - seg.x1);
        for x in x1..=x2 {
            let col = (x - seg.x1) as usize;
            let tex_col = mid.columns.get(col).copied().flatten();
            if let (Some(tex_col), Some(false)) = (tex_col, drawn.get(col).copied()) {
                let shade = if let Some(level) = light.fixed_light_level {
                    base.with(level)
                } else if let Some(map) = light.fixed_colourmap {
                    map
                } else {
                    base.with(wall_lights[scale_light_index(scale, view.light_scale_x_mul, LIGHTSCALESHIFT)])
                };

                let top = seg.top_clip(x).unwrap_or(-1);
                let bottom = seg.bottom_clip(x).unwrap_or(view.height);
                let blast = ColumnBlast::new(&view, mid.texture_mid, scale).with_clip(top, bottom);
                let painter = ColumnPainter::new(variant, pics.colourmap(shade), view.height, pics);
                if let Some(posts) = texture.column(tex_col as i32) {
                    for post in posts {
                        if let Some(span) = blast.span(post) {
                            painter.draw(x, span, blast.iscale, &post.pixels, &mut self.fuzz_pos, pixels);
                        }
                    }
                }
                drawn[col] = true;
            }
            scale += seg.scale_step;
        }
    }
}
