use algo_reveal::canvas::Rgba;
use algo_reveal::{Canvas, PermutationStore, PixmapCanvas, Rect, RevealScanner, ScanGeometry, SourceImage};
use anyhow::Result;
use glam::{UVec2, Vec2};
use test_log::test;

#[derive(Default)]
struct RecordingCanvas {
    clears: usize,
    blocks: Vec<(UVec2, Rect)>,
    presents: usize,
}

impl Canvas for RecordingCanvas {
    fn clear(&mut self) {
        self.clears += 1;
    }

    fn draw_scaled_block(&mut self, src: UVec2, dst: Rect) {
        self.blocks.push((src, dst));
    }

    fn present(&mut self) -> Result<()> {
        self.presents += 1;
        Ok(())
    }
}

fn gradient(width: u32, height: u32) -> SourceImage {
    let pixels: Vec<Rgba> = (0..height)
        .flat_map(|y| (0..width).map(move |x| [x as u8 * 20, y as u8 * 20, 7, 255]))
        .collect();
    SourceImage::from_pixels(width, height, pixels)
}

#[test]
fn ten_by_ten_image_in_classic_window() {
    let geometry = ScanGeometry::new(UVec2::new(1000, 600), UVec2::new(10, 10));
    assert_eq!(geometry.scale(), Vec2::new(100.0, 60.0));

    let mut scanner = RevealScanner::new(geometry);
    let store = PermutationStore::identity(100);
    let mut canvas = RecordingCanvas::default();
    let drawn = scanner.sweep(&store, &mut canvas);

    assert_eq!(drawn, 600_000);
    assert!(canvas
        .blocks
        .iter()
        .all(|(_, dst)| dst.w == 100 && dst.h == 60));
    let (src, dst) = canvas.blocks[(60 * 1000 + 100) as usize];
    assert_eq!(src, UVec2::new(1, 1));
    assert_eq!(dst, Rect::new(100, 60, 100, 60));
}

#[test]
fn unsorted_slots_are_skipped_every_sweep() {
    let geometry = ScanGeometry::new(UVec2::new(6, 4), UVec2::new(3, 2));
    let mut scanner = RevealScanner::new(geometry);
    // Slots 1 and 4 swapped: those two pixels stay hidden.
    let store = PermutationStore::from_values(vec![0, 4, 2, 3, 1, 5]);
    let mut canvas = RecordingCanvas::default();

    for _ in 0..3 {
        scanner.reset();
        canvas.blocks.clear();
        assert_eq!(scanner.sweep(&store, &mut canvas), 24 - 2 * 4);
        assert!(canvas.blocks.iter().all(|(src, _)| *src != UVec2::new(1, 0)));
        assert!(canvas.blocks.iter().all(|(src, _)| *src != UVec2::new(1, 1)));
    }

    store.swap(1, 4);
    scanner.reset();
    assert_eq!(scanner.sweep(&store, &mut canvas), 24);
}

#[test]
fn full_reveal_matches_nearest_neighbour_upscale() {
    let source = gradient(5, 3);
    let geometry = ScanGeometry::new(UVec2::new(17, 11), source.size());
    let expected: Vec<Rgba> = (0..11)
        .flat_map(|y| (0..17).map(move |x| UVec2::new(x, y)))
        .map(|p| source.pixel(geometry.map_to_image(p)))
        .collect();

    let mut scanner = RevealScanner::new(geometry);
    let store = PermutationStore::identity(15);
    let mut canvas = PixmapCanvas::new(source, 17, 11);
    scanner.sweep(&store, &mut canvas);

    assert_eq!(canvas.pixmap().pixels(), expected.as_slice());
}
