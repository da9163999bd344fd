//! Sorting visualizer that reveals an image as a shuffled permutation of
//! its pixel indices is sorted back into place on a background thread.

pub mod algorithms;
pub mod app;
pub mod canvas;
pub mod config;
pub mod engine;
pub mod error;
pub mod pacer;
pub mod permutation;
pub mod renderer;
pub mod scanner;
pub mod worker;

pub use algorithms::{AlgorithmKind, SortAlgorithm, SortOutcome};
pub use canvas::{Canvas, EventSource, InputEvent, Key, Pixmap, PixmapCanvas, Rect, SourceImage};
pub use engine::{RevealEngine, RunState};
pub use error::SetupError;
pub use pacer::FramePacer;
pub use permutation::PermutationStore;
pub use scanner::{RevealScanner, ScanGeometry};
pub use worker::{SortReport, SortStatus, SortWorker};
