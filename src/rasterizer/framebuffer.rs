//! Packed pixel buffer with scoped write access
//!
//! Pixels are only writable through a [`FrameLock`]. Dropping the lock
//! publishes the region touched while it was held, so a display can upload
//! just that rectangle.

use super::types::Color;

/// Axis-aligned pixel region, inclusive of `x`/`y`, exclusive of
/// `x + width`/`y + height`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl DirtyRect {
    fn pixel(x: usize, y: usize) -> Self {
        Self { x, y, width: 1, height: 1 }
    }

    pub fn union(self, other: DirtyRect) -> DirtyRect {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.width).max(other.x + other.width);
        let y1 = (self.y + self.height).max(other.y + other.height);
        DirtyRect { x: x0, y: y0, width: x1 - x0, height: y1 - y0 }
    }

    fn merge(slot: &mut Option<DirtyRect>, rect: DirtyRect) {
        *slot = Some(match *slot {
            Some(existing) => existing.union(rect),
            None => rect,
        });
    }
}

/// Fixed-size framebuffer, one BGRX word per pixel
pub struct Framebuffer {
    pixels: Vec<u32>,
    width: usize,
    height: usize,
    published: Option<DirtyRect>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![Color::BLACK.to_bgrx(); width * height],
            width,
            height,
            published: None,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x < self.width && y < self.height {
            Some(Color::from_bgrx(self.pixels[y * self.width + x]))
        } else {
            None
        }
    }

    /// Acquire exclusive write access until the returned guard drops
    pub fn lock(&mut self) -> FrameLock<'_> {
        FrameLock { fb: self, dirty: None }
    }

    /// Region written since the last call, for incremental display updates
    pub fn take_dirty(&mut self) -> Option<DirtyRect> {
        self.published.take()
    }

    /// Convert to RGBA bytes (4 per pixel) for display or export
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|&word| Color::from_bgrx(word).to_rgba())
            .collect()
    }
}

/// Exclusive write access to a [`Framebuffer`]
pub struct FrameLock<'a> {
    fb: &'a mut Framebuffer,
    dirty: Option<DirtyRect>,
}

impl FrameLock<'_> {
    pub fn width(&self) -> usize {
        self.fb.width
    }

    pub fn height(&self) -> usize {
        self.fb.height
    }

    pub fn clear(&mut self, color: Color) {
        self.fb.pixels.fill(color.to_bgrx());
        if self.fb.width > 0 && self.fb.height > 0 {
            DirtyRect::merge(
                &mut self.dirty,
                DirtyRect { x: 0, y: 0, width: self.fb.width, height: self.fb.height },
            );
        }
    }

    /// Store one pixel; coordinates outside the buffer are ignored
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x < self.fb.width && y < self.fb.height {
            self.fb.pixels[y * self.fb.width + x] = color.to_bgrx();
            DirtyRect::merge(&mut self.dirty, DirtyRect::pixel(x, y));
        }
    }
}

impl Drop for FrameLock<'_> {
    fn drop(&mut self) {
        if let Some(rect) = self.dirty.take() {
            DirtyRect::merge(&mut self.fb.published, rect);
        }
    }
}
