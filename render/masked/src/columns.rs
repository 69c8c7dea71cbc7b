//! Column drawing for sprites, weapon sprites and masked mid textures.
//!
//! The clipping in `ColumnBlast::span` decides which rows of a post land on
//! screen and where in the post texturing starts. The `DrawVariant` then
//! decides how each pixel is shaded.

#[cfg(feature = "safety_check")]
use log::debug;
use math::{FixedPoint, FRACBITS, FRACUNIT};
use render_trait::{PixelBuffer, SOFT_PIXEL_CHANNELS};

use crate::context::View;
use crate::defs::{MapObjFlag, TranslationRef, MAXPLAYERS, MF_TRANSSHIFT};
use crate::pic::{Colourmap, Palette, PicSource, Post};
use crate::things::{VisKind, VisSprite};

const FUZZTABLE: usize = 50;

/// Rows above (-1) or below (+1) to copy for the shadow effect
const FUZZOFFSET: [i32; FUZZTABLE] = [
    1, -1, 1, -1, 1, 1, -1, 1, 1, -1, 1, 1, 1, -1, 1, 1, 1, -1, -1, -1, -1, 1, -1, -1, 1, 1, 1, 1, -1, 1,
    -1, 1, 1, -1, -1, 1, 1, -1, -1, -1, -1, 1, 1, 1, 1, -1, 1, 1, -1, 1,
];

/// Shadow darkening, out of 32
const FUZZ_SHADE: u32 = 26;

/// How the pixels of one sprite are shaded
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DrawVariant {
    Plain,
    Translated(TranslationRef),
    /// Blend level, `FRACUNIT` is opaque
    Lucent(FixedPoint),
    TranslatedLucent(TranslationRef, FixedPoint),
    /// Shadow effect, smears the pixels already on screen
    Fuzz,
}

impl DrawVariant {
    /// Shadow beats everything, then translated+translucent, translucent,
    /// translated and finally plain.
    pub fn select(vis: &VisSprite) -> Self {
        let translation = vis.translation.or_else(|| {
            let bits = vis.mobj_flags & MapObjFlag::Translation as u32;
            (bits != 0).then(|| TranslationRef(MAXPLAYERS - 1 + (bits >> MF_TRANSSHIFT) as usize))
        });

        if vis.mobj_flags & MapObjFlag::Shadow as u32 != 0 {
            return DrawVariant::Fuzz;
        }
        let lucent = vis.translucency < FixedPoint::unit();
        match (translation, lucent) {
            (Some(t), true) => DrawVariant::TranslatedLucent(t, vis.translucency),
            (None, true) => DrawVariant::Lucent(vis.translucency),
            (Some(t), false) => DrawVariant::Translated(t),
            (None, false) => DrawVariant::Plain,
        }
    }

    fn translation(&self) -> Option<TranslationRef> {
        match self {
            DrawVariant::Translated(t) | DrawVariant::TranslatedLucent(t, _) => Some(*t),
            _ => None,
        }
    }

    fn level(&self) -> Option<FixedPoint> {
        match self {
            DrawVariant::Lucent(l) | DrawVariant::TranslatedLucent(_, l) => Some(*l),
            _ => None,
        }
    }
}

/// Blend `src` over `dst`, `level` of `FRACUNIT` is fully `src`
#[inline]
pub fn blend(src: &[u8; SOFT_PIXEL_CHANNELS], dst: &[u8; SOFT_PIXEL_CHANNELS], level: FixedPoint) -> [u8; SOFT_PIXEL_CHANNELS] {
    let fg = level.raw().clamp(0, FRACUNIT) as u32;
    let bg = FRACUNIT as u32 - fg;
    let mut out = [255; SOFT_PIXEL_CHANNELS];
    for (o, (s, d)) in out.iter_mut().zip(src.iter().zip(dst.iter())).take(3) {
        *o = ((*s as u32 * fg + *d as u32 * bg) >> FRACBITS) as u8;
    }
    out
}

/// `iscale` for a scale, done unsigned so near sprites don't saturate
#[inline]
pub fn inverse_scale(yscale: FixedPoint) -> FixedPoint {
    FixedPoint::new((0xffff_ffffu32 / yscale.raw().max(1) as u32) as i32)
}

/// Skip the rows whose texture position is above the post. Returns the new
/// `yl` and texture position.
#[inline]
pub fn adjust_start(yl: i32, frac: FixedPoint, iscale: FixedPoint) -> (i32, FixedPoint) {
    if frac.is_negative() {
        let cnt = ((-frac / iscale) + (FRACUNIT - 1)).raw() >> FRACBITS;
        (yl + cnt, frac + iscale * cnt)
    } else {
        (yl, frac)
    }
}

/// Drop the rows that would read past the end of a post of `len` pixels.
/// Returns the new `yh`.
#[inline]
pub fn adjust_end(yl: i32, yh: i32, frac: FixedPoint, iscale: FixedPoint, len: i32) -> i32 {
    let endfrac = frac + iscale * (yh - yl);
    let maxfrac = FixedPoint::from(len);
    if endfrac >= maxfrac {
        let cnt = (((endfrac - maxfrac - 1) / iscale) + (FRACUNIT - 1)).raw() >> FRACBITS;
        yh - cnt
    } else {
        yh
    }
}

/// The on screen rows of one post and where in it to start sampling
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PostSpan {
    pub yl: i32,
    pub yh: i32,
    pub frac: FixedPoint,
}

/// Per column state of R_BlastSpriteColumn
#[derive(Debug, Copy, Clone)]
pub struct ColumnBlast {
    pub texture_mid: FixedPoint,
    pub yscale: FixedPoint,
    pub iscale: FixedPoint,
    /// Screen position of the texture top, `sprtopscreen`
    pub top_screen: FixedPoint,
    pub centery_frac: FixedPoint,
    pub view_height: i32,
    /// Last row hidden above, first row hidden below
    pub clip_top: i32,
    pub clip_bottom: i32,
}

impl ColumnBlast {
    pub fn new(view: &View, texture_mid: FixedPoint, yscale: FixedPoint) -> Self {
        Self {
            texture_mid,
            yscale,
            iscale: inverse_scale(yscale),
            top_screen: view.centery_frac - texture_mid * yscale,
            centery_frac: view.centery_frac,
            view_height: view.height,
            clip_top: -1,
            clip_bottom: view.height,
        }
    }

    #[inline]
    pub fn with_clip(mut self, clip_top: i32, clip_bottom: i32) -> Self {
        self.clip_top = clip_top;
        self.clip_bottom = clip_bottom;
        self
    }

    /// The visible part of a post, `None` if it is fully clipped
    pub fn span(&self, post: &Post) -> Option<PostSpan> {
        let topscreen = self.top_screen + self.yscale * post.top_delta + 1;
        let yl = (topscreen + FRACUNIT).raw() >> FRACBITS;
        let yh = (topscreen + self.yscale * post.len()).raw() >> FRACBITS;

        let yl = yl.max(self.clip_top + 1);
        let yh = yh.min(self.clip_bottom - 1);

        let frac = self.texture_mid - FixedPoint::from(post.top_delta) + self.iscale * yl
            - (self.centery_frac - FRACUNIT) * self.iscale;

        let (yl, frac) = adjust_start(yl, frac, self.iscale);
        let yh = adjust_end(yl, yh, frac, self.iscale, post.len());

        (yl >= 0 && yh < self.view_height && yl <= yh).then_some(PostSpan { yl, yh, frac })
    }
}

/// Everything needed to shade the pixels of one sprite
pub struct ColumnPainter<'a> {
    pub variant: DrawVariant,
    pub palette: &'a Palette,
    pub colourmap: &'a Colourmap,
    pub translation: Option<&'a Colourmap>,
    pub view_height: i32,
}

impl<'a> ColumnPainter<'a> {
    pub fn new(variant: DrawVariant, colourmap: &'a Colourmap, view_height: i32, pics: &'a impl PicSource) -> Self {
        let translation = variant.translation().and_then(|t| pics.translation(t));
        Self {
            variant,
            palette: pics.palette(),
            colourmap,
            translation,
            view_height,
        }
    }

    /// Draw the rows of `span` in column `x`, sampling `source`
    pub fn draw(
        &self,
        x: i32,
        span: PostSpan,
        iscale: FixedPoint,
        source: &[u8],
        fuzz_pos: &mut usize,
        pixels: &mut dyn PixelBuffer,
    ) {
        if self.variant == DrawVariant::Fuzz {
            self.draw_fuzz(x, span, fuzz_pos, pixels);
            return;
        }

        let level = self.variant.level();
        let mut frac = span.frac;
        for y in span.yl..=span.yh {
            let Some(&texel) = source.get((frac.raw() >> FRACBITS).max(0) as usize) else {
                #[cfg(feature = "safety_check")]
                debug!("column sample out of range at {x},{y}");
                break;
            };
            let texel = match self.translation {
                Some(table) => table[texel as usize],
                None => texel,
            };
            let colour = &self.palette[self.colourmap[texel as usize] as usize];
            match level {
                Some(level) => {
                    let dst = pixels.read_pixel(x as usize, y as usize);
                    pixels.set_pixel(x as usize, y as usize, &blend(colour, &dst, level));
                }
                None => pixels.set_pixel(x as usize, y as usize, colour),
            }
            frac += iscale;
        }
    }

    /// R_DrawFuzzColumn. Copies a darkened neighbouring row.
    fn draw_fuzz(&self, x: i32, span: PostSpan, fuzz_pos: &mut usize, pixels: &mut dyn PixelBuffer) {
        // keep the neighbour reads on screen
        let yl = span.yl.max(1);
        let yh = span.yh.min(self.view_height - 2);
        for y in yl..=yh {
            let src = pixels.read_pixel(x as usize, (y + FUZZOFFSET[*fuzz_pos]) as usize);
            let mut out = src;
            for c in out.iter_mut().take(3) {
                *c = (*c as u32 * FUZZ_SHADE / 32) as u8;
            }
            pixels.set_pixel(x as usize, y as usize, &out);
            *fuzz_pos = (*fuzz_pos + 1) % FUZZTABLE;
        }
    }
}

/// R_DrawVisSprite. `clip_top` and `clip_bottom` are indexed by screen column
/// and hold the last hidden row above and the first hidden row below.
#[allow(clippy::too_many_arguments)]
pub fn draw_vissprite(
    view: &View,
    vis: &VisSprite,
    clip_top: &[i32],
    clip_bottom: &[i32],
    pics: &impl PicSource,
    fuzz_pos: &mut usize,
    pixels: &mut dyn PixelBuffer,
) {
    if vis.yscale <= FixedPoint::zero() || vis.spectator {
        return;
    }

    let lump = match vis.kind {
        VisKind::Patch { lump } => lump,
        VisKind::Particle { .. } => {
            crate::particles::draw_particle(vis, clip_top, clip_bottom, pics, pixels);
            return;
        }
    };
    let Some(patch) = pics.patch(lump) else {
        #[cfg(feature = "safety_check")]
        debug!("draw_vissprite: missing patch {lump}");
        return;
    };

    // don't fall off the side of the patch
    let start = vis.start_frac.raw() >> FRACBITS;
    if start < 0 || start > patch.width {
        return;
    }
    let end = (vis.start_frac + vis.x_iscale * (vis.x2 - vis.x1)).raw() >> FRACBITS;
    if end < 0 || end > patch.width {
        return;
    }

    let variant = DrawVariant::select(vis);
    let painter = ColumnPainter::new(variant, pics.colourmap(vis.colourmap), view.height, pics);
    let blast = ColumnBlast::new(view, vis.texture_mid, vis.yscale);

    let mut colfrac = vis.start_frac;
    for x in vis.x1..=vis.x2 {
        let column = patch.column(colfrac.raw() >> FRACBITS);
        colfrac += vis.x_iscale;
        let (Some(column), Some(&top), Some(&bottom)) =
            (column, clip_top.get(x as usize), clip_bottom.get(x as usize))
        else {
            continue;
        };
        let blast = blast.with_clip(top, bottom);
        for post in column {
            if let Some(span) = blast.span(post) {
                painter.draw(x, span, blast.iscale, &post.pixels, fuzz_pos, pixels);
            }
        }
    }
}
