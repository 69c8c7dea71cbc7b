//! The pixel buffer seam between the masked renderer and whatever presents
//! the frame. Pixels are RGBA, palette lookups happen before writing.

/// channels should match pixel format
pub const SOFT_PIXEL_CHANNELS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSize {
    width_usize: usize,
    height_usize: usize,
    width: i32,
    height: i32,
}

impl BufferSize {
    pub const fn new(width: usize, height: usize) -> Self {
        Self {
            width_usize: width,
            height_usize: height,
            width: width as i32,
            height: height as i32,
        }
    }

    pub const fn width(&self) -> i32 {
        self.width
    }

    pub const fn height(&self) -> i32 {
        self.height
    }

    pub const fn half_width(&self) -> i32 {
        self.width / 2
    }

    pub const fn half_height(&self) -> i32 {
        self.height / 2
    }

    pub const fn width_usize(&self) -> usize {
        self.width_usize
    }

    pub const fn height_usize(&self) -> usize {
        self.height_usize
    }
}

pub trait PixelBuffer {
    fn size(&self) -> &BufferSize;
    fn clear(&mut self);
    fn clear_with_colour(&mut self, colour: &[u8; SOFT_PIXEL_CHANNELS]);
    fn set_pixel(&mut self, x: usize, y: usize, colour: &[u8; SOFT_PIXEL_CHANNELS]);
    fn read_pixel(&self, x: usize, y: usize) -> [u8; SOFT_PIXEL_CHANNELS];
    /// The full buffer, rows of RGBA
    fn buf(&self) -> &[u8];
    /// The pitch that should be added/subtracted to go up or down the Y while
    /// keeping X position
    fn pitch(&self) -> usize;
}

/// A plain in-memory RGBA framebuffer
pub struct SoftFramebuffer {
    size: BufferSize,
    /// Total length is width * height * CHANNELS
    buffer: Vec<u8>,
}

impl SoftFramebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            size: BufferSize::new(width, height),
            buffer: vec![0; width * height * SOFT_PIXEL_CHANNELS],
        }
    }

    #[inline]
    fn get_buf_index(&self, x: usize, y: usize) -> usize {
        y * self.pitch() + x * SOFT_PIXEL_CHANNELS
    }
}

impl PixelBuffer for SoftFramebuffer {
    #[inline]
    fn size(&self) -> &BufferSize {
        &self.size
    }

    #[inline]
    fn clear(&mut self) {
        self.buffer.fill(0);
    }

    fn clear_with_colour(&mut self, colour: &[u8; SOFT_PIXEL_CHANNELS]) {
        for px in self.buffer.chunks_exact_mut(SOFT_PIXEL_CHANNELS) {
            px.copy_from_slice(colour);
        }
    }

    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, colour: &[u8; SOFT_PIXEL_CHANNELS]) {
        if x >= self.size.width_usize() || y >= self.size.height_usize() {
            return;
        }
        let pos = self.get_buf_index(x, y);
        self.buffer[pos..pos + SOFT_PIXEL_CHANNELS].copy_from_slice(colour);
    }

    /// Read the colour of a single pixel at X|Y
    #[inline]
    fn read_pixel(&self, x: usize, y: usize) -> [u8; SOFT_PIXEL_CHANNELS] {
        if x >= self.size.width_usize() || y >= self.size.height_usize() {
            return [0; SOFT_PIXEL_CHANNELS];
        }
        let pos = self.get_buf_index(x, y);
        let mut out = [0; SOFT_PIXEL_CHANNELS];
        out.copy_from_slice(&self.buffer[pos..pos + SOFT_PIXEL_CHANNELS]);
        out
    }

    #[inline]
    fn buf(&self) -> &[u8] {
        &self.buffer
    }

    #[inline]
    fn pitch(&self) -> usize {
        self.size.width_usize() * SOFT_PIXEL_CHANNELS
    }
}

#[cfg(test)]
mod tests {
    use crate::{PixelBuffer, SoftFramebuffer};

    #[test]
    fn write_read_pixel() {
        let mut pixels = SoftFramebuffer::new(320, 200);

        pixels.set_pixel(10, 10, &[255, 10, 3, 255]);
        pixels.set_pixel(319, 199, &[25, 10, 3, 255]);

        assert_eq!(pixels.read_pixel(10, 10), [255, 10, 3, 255]);
        assert_eq!(pixels.read_pixel(319, 199), [25, 10, 3, 255]);
        assert_eq!(pixels.read_pixel(11, 10), [0, 0, 0, 0]);
    }

    #[test]
    fn out_of_bounds_is_ignored() {
        let mut pixels = SoftFramebuffer::new(4, 4);
        pixels.set_pixel(4, 0, &[1, 1, 1, 1]);
        pixels.set_pixel(0, 4, &[1, 1, 1, 1]);
        assert!(pixels.buf().iter().all(|b| *b == 0));
        assert_eq!(pixels.read_pixel(9, 9), [0; 4]);
    }

    #[test]
    fn clear_with_colour_fills() {
        let mut pixels = SoftFramebuffer::new(3, 2);
        pixels.clear_with_colour(&[1, 2, 3, 4]);
        assert_eq!(pixels.read_pixel(2, 1), [1, 2, 3, 4]);
        pixels.clear();
        assert_eq!(pixels.read_pixel(2, 1), [0, 0, 0, 0]);
    }
}
