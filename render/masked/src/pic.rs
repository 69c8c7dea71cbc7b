//! Picture data the thing drawer reads: sprite definitions, patches, masked
//! wall textures, the palette, colourmaps and translation tables.
//!
//! Loading these is somebody else's job. `PicSource` is the seam, `PicStore`
//! is a plain in-memory implementation.

use crate::defs::{ShadeRef, TranslationRef, NUMCOLORMAPS};

pub type Palette = [[u8; 4]; 256];
pub type Colourmap = [u8; 256];

/// Handed out when a store has no usable colourmap set
static IDENTITY_COLOURMAP: Colourmap = {
    let mut map = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        map[i] = i as u8;
        i += 1;
    }
    map
};

/// A vertical run of opaque pixels in a patch column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub top_delta: i32,
    pub pixels: Vec<u8>,
}

impl Post {
    pub fn new(top_delta: i32, pixels: Vec<u8>) -> Self {
        Self { top_delta, pixels }
    }

    #[inline]
    pub fn len(&self) -> i32 {
        self.pixels.len() as i32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// A column-major masked picture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub width: i32,
    pub height: i32,
    pub left_offset: i32,
    pub top_offset: i32,
    pub columns: Vec<Vec<Post>>,
}

impl Patch {
    /// A fully opaque patch of one colour, handy for tests and demos
    pub fn solid(width: i32, height: i32, colour: u8) -> Self {
        Self {
            width,
            height,
            left_offset: width / 2,
            top_offset: height,
            columns: (0..width)
                .map(|_| vec![Post::new(0, vec![colour; height as usize])])
                .collect(),
        }
    }

    #[inline]
    pub fn column(&self, col: i32) -> Option<&[Post]> {
        self.columns
            .get(usize::try_from(col).ok()?)
            .map(|c| c.as_slice())
    }
}

/// One animation frame of a sprite, possibly with per-view rotations.
///
/// There are 16 view slots. Eight-way sprites fill them in pairs, which is
/// what the rotation select tie-break relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteFrame {
    pub rotate: bool,
    pub lump: [usize; 16],
    pub flip: [bool; 16],
}

impl SpriteFrame {
    /// The same picture from every angle
    pub fn single(lump: usize, flip: bool) -> Self {
        Self {
            rotate: false,
            lump: [lump; 16],
            flip: [flip; 16],
        }
    }

    /// Classic eight rotations, index 0 is the front
    pub fn rotations(views: [(usize, bool); 8]) -> Self {
        let mut frame = Self {
            rotate: true,
            lump: [0; 16],
            flip: [false; 16],
        };
        for (r, (lump, flip)) in views.iter().enumerate() {
            frame.lump[r * 2] = *lump;
            frame.lump[r * 2 + 1] = *lump;
            frame.flip[r * 2] = *flip;
            frame.flip[r * 2 + 1] = *flip;
        }
        frame
    }

    /// Sixteen distinct rotations
    pub fn rotations16(views: [(usize, bool); 16]) -> Self {
        let mut frame = Self {
            rotate: true,
            lump: [0; 16],
            flip: [false; 16],
        };
        for (r, (lump, flip)) in views.iter().enumerate() {
            frame.lump[r] = *lump;
            frame.flip[r] = *flip;
        }
        frame
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpriteDef {
    pub frames: Vec<SpriteFrame>,
}

pub trait PicSource {
    fn sprite_def(&self, sprite: usize) -> Option<&SpriteDef>;
    /// Sprite or weapon patch by lump
    fn patch(&self, lump: usize) -> Option<&Patch>;
    /// Masked mid texture
    fn wall_texture(&self, texture: usize) -> Option<&Patch>;
    fn palette(&self) -> &Palette;
    /// Always returns a map, out of range levels are clamped
    fn colourmap(&self, shade: ShadeRef) -> &Colourmap;
    fn translation(&self, table: TranslationRef) -> Option<&Colourmap>;
}

/// Simple owned picture storage
#[derive(Debug, Clone)]
pub struct PicStore {
    pub palette: Palette,
    /// Per set: `NUMCOLORMAPS` light levels plus the inverse map
    pub colourmaps: Vec<Vec<Colourmap>>,
    pub translations: Vec<Colourmap>,
    pub sprites: Vec<SpriteDef>,
    pub patches: Vec<Patch>,
    pub textures: Vec<Patch>,
}

impl PicStore {
    /// A store with a greyscale palette and one identity colourmap set
    pub fn new() -> Self {
        let mut palette = [[0u8; 4]; 256];
        for (i, c) in palette.iter_mut().enumerate() {
            *c = [i as u8, i as u8, i as u8, 255];
        }
        let identity: Colourmap = std::array::from_fn(|i| i as u8);
        Self {
            palette,
            colourmaps: vec![vec![identity; NUMCOLORMAPS + 1]],
            translations: Vec::new(),
            sprites: Vec::new(),
            patches: Vec::new(),
            textures: Vec::new(),
        }
    }

    /// Builds a colourmap set that fades the greyscale palette toward black,
    /// with an inverted map at the end
    pub fn fading_colourmaps() -> Vec<Colourmap> {
        let mut maps: Vec<Colourmap> = (0..NUMCOLORMAPS)
            .map(|level| {
                std::array::from_fn(|i| {
                    (i * (NUMCOLORMAPS - level) / NUMCOLORMAPS) as u8
                })
            })
            .collect();
        maps.push(std::array::from_fn(|i| 255 - i as u8));
        maps
    }

    pub fn add_patch(&mut self, patch: Patch) -> usize {
        self.patches.push(patch);
        self.patches.len() - 1
    }

    pub fn add_texture(&mut self, texture: Patch) -> usize {
        self.textures.push(texture);
        self.textures.len() - 1
    }

    pub fn add_sprite(&mut self, def: SpriteDef) -> usize {
        self.sprites.push(def);
        self.sprites.len() - 1
    }
}

impl Default for PicStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PicSource for PicStore {
    fn sprite_def(&self, sprite: usize) -> Option<&SpriteDef> {
        self.sprites.get(sprite)
    }

    fn patch(&self, lump: usize) -> Option<&Patch> {
        self.patches.get(lump)
    }

    fn wall_texture(&self, texture: usize) -> Option<&Patch> {
        self.textures.get(texture)
    }

    fn palette(&self) -> &Palette {
        &self.palette
    }

    fn colourmap(&self, shade: ShadeRef) -> &Colourmap {
        self.colourmaps
            .get(shade.map.0)
            .filter(|set| !set.is_empty())
            .or_else(|| self.colourmaps.first())
            .and_then(|set| set.get(shade.level.min(set.len().saturating_sub(1))))
            .unwrap_or(&IDENTITY_COLOURMAP)
    }

    fn translation(&self, table: TranslationRef) -> Option<&Colourmap> {
        self.translations.get(table.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{PicSource, PicStore, SpriteFrame};
    use crate::defs::{ColourmapId, ShadeRef, INVERSECOLORMAP};

    #[test]
    fn eight_rotations_fill_pairs() {
        let views = std::array::from_fn(|i| (i + 10, i % 2 == 1));
        let frame = SpriteFrame::rotations(views);
        assert!(frame.rotate);
        assert_eq!(frame.lump[0], frame.lump[1]);
        assert_eq!(frame.lump[14], 17);
        assert!(frame.flip[3]);
        assert!(!frame.flip[4]);
    }

    #[test]
    fn colourmap_lookup_clamps() {
        let mut store = PicStore::new();
        store.colourmaps = vec![PicStore::fading_colourmaps()];
        let bright = store.colourmap(ShadeRef::new(ColourmapId(0), 0));
        assert_eq!(bright[200], 200);
        let dark = store.colourmap(ShadeRef::new(ColourmapId(0), 31));
        assert!(dark[200] < 10);
        let inverse = store.colourmap(ShadeRef::new(ColourmapId(0), INVERSECOLORMAP));
        assert_eq!(inverse[0], 255);
        // unknown set falls back to the first, huge level to the last map
        let fallback = store.colourmap(ShadeRef::new(ColourmapId(7), 1000));
        assert_eq!(fallback[0], 255);
    }

    #[test]
    fn colourmap_lookup_survives_empty_sets() {
        let mut store = PicStore::new();
        store.colourmaps = vec![Vec::new(), PicStore::fading_colourmaps()];
        // the empty first set leaves only the identity map to fall back on
        assert_eq!(store.colourmap(ShadeRef::new(ColourmapId(0), 3))[200], 200);
        assert!(store.colourmap(ShadeRef::new(ColourmapId(1), 31))[200] < 10);

        store.colourmaps.clear();
        let map = store.colourmap(ShadeRef::new(ColourmapId(2), 5));
        assert_eq!(map[17], 17);
    }
}
