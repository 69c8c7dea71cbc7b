use log::debug;

use crate::things::VisSprite;

/// Default starting size, doubled whenever a frame runs out
pub const MAXVISSPRITES: usize = 128;

/// Refers to one pool entry for the frame it was allocated in
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VisHandle {
    pub index: usize,
    pub generation: u32,
}

/// Frame scoped storage for projected sprites. Entries are only ever
/// appended during a frame and all dropped at once by `reset`.
#[derive(Debug)]
pub struct VisSpritePool {
    sprites: Vec<VisSprite>,
    /// Number of entries in use this frame
    count: usize,
    generation: u32,
}

impl VisSpritePool {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            sprites: vec![VisSprite::default(); capacity],
            count: 0,
            generation: 0,
        }
    }

    /// R_ClearSprites. Drops every entry and invalidates outstanding handles.
    pub fn reset(&mut self) {
        self.count = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    /// R_NewVisSprite. The returned slot holds stale data from an earlier
    /// frame and must be fully written by the caller.
    pub fn allocate_next(&mut self) -> VisHandle {
        if self.count == self.sprites.len() {
            let capacity = self.sprites.len() * 2;
            self.sprites.resize(capacity, VisSprite::default());
            debug!("MaxVisSprites increased to {capacity}");
        }
        let index = self.count;
        self.count += 1;
        VisHandle {
            index,
            generation: self.generation,
        }
    }

    /// Allocate and fill in one go
    pub fn push(&mut self, vis: VisSprite) -> VisHandle {
        let handle = self.allocate_next();
        self.sprites[handle.index] = vis;
        handle
    }

    #[inline]
    fn is_live(&self, handle: VisHandle) -> bool {
        handle.generation == self.generation && handle.index < self.count
    }

    pub fn get(&self, handle: VisHandle) -> Option<&VisSprite> {
        if self.is_live(handle) {
            self.sprites.get(handle.index)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, handle: VisHandle) -> Option<&mut VisSprite> {
        if self.is_live(handle) {
            self.sprites.get_mut(handle.index)
        } else {
            None
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.sprites.len()
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// The entries allocated this frame, in allocation order
    #[inline]
    pub fn as_slice(&self) -> &[VisSprite] {
        &self.sprites[..self.count]
    }
}

impl Default for VisSpritePool {
    fn default() -> Self {
        Self::new(MAXVISSPRITES)
    }
}

#[cfg(test)]
mod tests {
    use super::VisSpritePool;
    use crate::things::VisSprite;
    use math::FixedPoint;

    fn marked(i: i32) -> VisSprite {
        VisSprite {
            x1: i,
            x2: i + 1,
            depth: FixedPoint::from(i),
            ..VisSprite::default()
        }
    }

    #[test]
    fn grows_by_doubling() {
        let mut pool = VisSpritePool::new(4);
        let handles: Vec<_> = (0..9).map(|i| pool.push(marked(i))).collect();

        // 4 -> 8 -> 16, the smallest power of two multiple that fits 9
        assert_eq!(pool.capacity(), 16);
        assert_eq!(pool.len(), 9);
        for (i, h) in handles.iter().enumerate() {
            let vis = pool.get(*h).unwrap();
            assert_eq!(vis.x1, i as i32);
            assert_eq!(vis.depth, FixedPoint::from(i as i32));
        }
    }

    #[test]
    fn exact_fit_does_not_grow() {
        let mut pool = VisSpritePool::new(4);
        for i in 0..4 {
            pool.push(marked(i));
        }
        assert_eq!(pool.capacity(), 4);
        pool.push(marked(4));
        assert_eq!(pool.capacity(), 8);
    }

    #[test]
    fn reset_invalidates_handles() {
        let mut pool = VisSpritePool::new(2);
        let old = pool.push(marked(1));
        assert!(pool.get(old).is_some());

        pool.reset();
        assert!(pool.is_empty());
        assert!(pool.get(old).is_none());
        assert!(pool.get_mut(old).is_none());

        // same slot, new frame
        let new = pool.push(marked(2));
        assert_eq!(new.index, old.index);
        assert_ne!(new.generation, old.generation);
        assert_eq!(pool.get(new).unwrap().x1, 2);
        assert!(pool.get(old).is_none());
        // capacity is kept between frames
        assert_eq!(pool.capacity(), 2);
    }

    #[test]
    fn slice_is_allocation_order() {
        let mut pool = VisSpritePool::new(1);
        for i in 0..3 {
            let h = pool.allocate_next();
            pool.get_mut(h).unwrap().x1 = i * 10;
        }
        let xs: Vec<i32> = pool.as_slice().iter().map(|v| v.x1).collect();
        assert_eq!(xs, vec![0, 10, 20]);
    }
}
