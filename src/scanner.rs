use glam::{UVec2, Vec2};

use crate::canvas::{Canvas, Rect};
use crate::permutation::PermutationStore;

/// Fixed mapping from window pixels to image pixels for one run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScanGeometry {
    window: UVec2,
    image: UVec2,
    scale: Vec2,
    block: UVec2,
}

impl ScanGeometry {
    /// Both sizes must be non-zero in each dimension.
    pub fn new(window: UVec2, image: UVec2) -> Self {
        debug_assert!(window.cmpgt(UVec2::ZERO).all() && image.cmpgt(UVec2::ZERO).all());
        let scale = window.as_vec2() / image.as_vec2();
        // Truncated, then at least one pixel each way.
        let block = scale.as_uvec2().max(UVec2::ONE);
        Self {
            window,
            image,
            scale,
            block,
        }
    }

    pub fn window(&self) -> UVec2 {
        self.window
    }

    pub fn image(&self) -> UVec2 {
        self.image
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn block(&self) -> UVec2 {
        self.block
    }

    pub fn window_pixels(&self) -> u64 {
        u64::from(self.window.x) * u64::from(self.window.y)
    }

    /// `floor(dst / scale)`, clamped so float rounding never leaves the image.
    pub fn map_to_image(&self, dst: UVec2) -> UVec2 {
        (dst.as_vec2() / self.scale)
            .floor()
            .as_uvec2()
            .min(self.image - UVec2::ONE)
    }

    pub fn image_index(&self, at: UVec2) -> usize {
        at.x as usize + at.y as usize * self.image.x as usize
    }

    /// Destination block drawn for the window pixel `dst`.
    pub fn block_rect(&self, dst: UVec2) -> Rect {
        Rect::new(dst.x, dst.y, self.block.x, self.block.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Scanning,
    /// The cursor just covered the last window pixel and is back at the origin.
    Wrapped,
}

/// Walks the window in row-major order, drawing every pixel whose image slot
/// is back in its sorted position.
#[derive(Clone, Debug)]
pub struct RevealScanner {
    geometry: ScanGeometry,
    cursor: UVec2,
    draw_count: u64,
}

impl RevealScanner {
    pub fn new(geometry: ScanGeometry) -> Self {
        Self {
            geometry,
            cursor: UVec2::ZERO,
            draw_count: 0,
        }
    }

    pub fn geometry(&self) -> &ScanGeometry {
        &self.geometry
    }

    pub fn cursor(&self) -> UVec2 {
        self.cursor
    }

    /// Pixels drawn since the last [`reset`](Self::reset).
    pub fn draw_count(&self) -> u64 {
        self.draw_count
    }

    /// Evaluates the pixel under the cursor, then advances it.
    ///
    /// The slot read races with the sort thread on purpose. Seeing an old
    /// value only means the pixel waits for a later sweep; once the sort is
    /// done every slot reads as home.
    pub fn step<C: Canvas + ?Sized>(&mut self, permutation: &PermutationStore, canvas: &mut C) -> Step {
        let src = self.geometry.map_to_image(self.cursor);
        let idx = self.geometry.image_index(src);
        if permutation.is_home(idx) {
            canvas.draw_scaled_block(src, self.geometry.block_rect(self.cursor));
            self.draw_count += 1;
        }

        self.cursor.x += 1;
        if self.cursor.x < self.geometry.window.x {
            return Step::Scanning;
        }
        self.cursor.x = 0;
        self.cursor.y += 1;
        if self.cursor.y < self.geometry.window.y {
            return Step::Scanning;
        }
        self.cursor.y = 0;
        Step::Wrapped
    }

    /// Steps until the current sweep wraps and returns its draw count.
    pub fn sweep<C: Canvas + ?Sized>(&mut self, permutation: &PermutationStore, canvas: &mut C) -> u64 {
        while self.step(permutation, canvas) == Step::Scanning {}
        self.draw_count
    }

    /// Cursor back to the origin and DrawCount to zero.
    pub fn reset(&mut self) {
        self.cursor = UVec2::ZERO;
        self.draw_count = 0;
    }
}
