use std::collections::VecDeque;
use std::path::Path;

use anyhow::Result;
use glam::UVec2;

use crate::error::SetupError;

pub type Rgba = [u8; 4];

pub const BLACK: Rgba = [0, 0, 0, 255];

/// Axis-aligned rectangle in window pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

/// Drawing surface the reveal loop talks to.
pub trait Canvas {
    fn clear(&mut self);

    /// Copies the single source pixel `src` stretched over `dst`.
    fn draw_scaled_block(&mut self, src: UVec2, dst: Rect);

    fn present(&mut self) -> Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Enter,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Quit,
    KeyPress(Key),
}

/// Non-blocking source of user input.
pub trait EventSource {
    fn poll(&mut self) -> Option<InputEvent>;

    /// Drains everything pending and reports whether a quit was among it.
    fn quit_requested(&mut self) -> bool {
        let mut quit = false;
        while let Some(event) = self.poll() {
            quit |= event == InputEvent::Quit;
        }
        quit
    }
}

impl EventSource for VecDeque<InputEvent> {
    fn poll(&mut self) -> Option<InputEvent> {
        self.pop_front()
    }
}

/// Decoded RGBA image the reveal copies pixels from.
#[derive(Clone, Debug)]
pub struct SourceImage {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl SourceImage {
    pub fn open(path: &Path) -> Result<Self, SetupError> {
        let decoded = image::open(path)
            .map_err(|source| SetupError::ImageLoad {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(SetupError::EmptyImage {
                path: path.to_path_buf(),
            });
        }
        let (width, height) = decoded.dimensions();
        let pixels = decoded.pixels().map(|p| p.0).collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Builds an image from row-major pixels; `pixels.len()` must be `width * height`.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Rgba>) -> Self {
        assert_eq!(pixels.len(), (width * height) as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    pub fn pixel(&self, at: UVec2) -> Rgba {
        self.pixels[(at.x + at.y * self.width) as usize]
    }
}

/// CPU-side RGBA framebuffer.
#[derive(Clone, Debug)]
pub struct Pixmap {
    width: u32,
    height: u32,
    data: Vec<Rgba>,
}

impl Pixmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![BLACK; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fill(&mut self, color: Rgba) {
        self.data.fill(color);
    }

    /// Fills `rect` clipped to the pixmap bounds.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        if rect.x >= self.width || rect.y >= self.height {
            return;
        }
        let x0 = rect.x as usize;
        let x1 = rect.x.saturating_add(rect.w).min(self.width) as usize;
        let y1 = rect.y.saturating_add(rect.h).min(self.height);
        let stride = self.width as usize;
        for y in rect.y..y1 {
            let row = y as usize * stride;
            self.data[row + x0..row + x1].fill(color);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        self.data[(x + y * self.width) as usize]
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.data
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

/// Canvas that draws into a [`Pixmap`] from a [`SourceImage`].
///
/// `present` only counts; a screen-backed canvas wraps this and uploads the
/// pixmap when presenting.
pub struct PixmapCanvas {
    source: SourceImage,
    pixmap: Pixmap,
    presents: u64,
}

impl PixmapCanvas {
    pub fn new(source: SourceImage, width: u32, height: u32) -> Self {
        Self {
            source,
            pixmap: Pixmap::new(width, height),
            presents: 0,
        }
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    pub fn presents(&self) -> u64 {
        self.presents
    }
}

impl Canvas for PixmapCanvas {
    fn clear(&mut self) {
        self.pixmap.fill(BLACK);
    }

    fn draw_scaled_block(&mut self, src: UVec2, dst: Rect) {
        let color = self.source.pixel(src);
        self.pixmap.fill_rect(dst, color);
    }

    fn present(&mut self) -> Result<()> {
        self.presents += 1;
        Ok(())
    }
}
