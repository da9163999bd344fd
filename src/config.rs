use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use glam::UVec2;

use crate::algorithms::AlgorithmKind;
use crate::error::SetupError;

/// Largest window side the renderer's frame texture can hold on default
/// wgpu limits.
pub const MAX_WINDOW_DIMENSION: u32 = 8192;

#[derive(Clone, Debug, Parser)]
#[command(
    name = "algo-reveal",
    about = "Reveal an image pixel by pixel while a sort puts it back together",
    version
)]
pub struct Config {
    /// Image to reveal (BMP or PNG)
    #[arg(default_value = "image.bmp")]
    pub image: PathBuf,

    /// Sorting algorithm
    #[arg(short, long, value_enum, default_value_t = AlgorithmKind::Merge)]
    pub algorithm: AlgorithmKind,

    /// Window width in pixels
    #[arg(long, default_value_t = 1000)]
    pub width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = 600)]
    pub height: u32,

    /// Maximum presents per second
    #[arg(long, default_value_t = 30.0)]
    pub fps: f32,

    /// Pixels a sweep must draw before it is presented
    #[arg(long, default_value_t = 1)]
    pub min_draws: u64,

    /// Seed for the initial shuffle (defaults to the clock)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Give up shuffle-retry after this many shuffles
    #[arg(long)]
    pub max_shuffles: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image: PathBuf::from("image.bmp"),
            algorithm: AlgorithmKind::Merge,
            width: 1000,
            height: 600,
            fps: 30.0,
            min_draws: 1,
            seed: None,
            max_shuffles: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.width == 0 || self.height == 0 {
            return Err(SetupError::InvalidConfig(format!(
                "window size {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        if self.width > MAX_WINDOW_DIMENSION || self.height > MAX_WINDOW_DIMENSION {
            return Err(SetupError::InvalidConfig(format!(
                "window size {}x{} exceeds {} pixels per side",
                self.width, self.height, MAX_WINDOW_DIMENSION
            )));
        }
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(SetupError::InvalidConfig(format!(
                "fps must be positive, got {}",
                self.fps
            )));
        }
        self.frame_interval()?;
        Ok(())
    }

    pub fn window_size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    pub fn frame_interval(&self) -> Result<Duration, SetupError> {
        Duration::try_from_secs_f32(1.0 / self.fps).map_err(|err| {
            SetupError::InvalidConfig(format!("fps {} gives no usable frame interval: {err}", self.fps))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn defaults_match_the_classic_window() {
        let config = Config::try_parse_from(["algo-reveal"]).unwrap();
        assert_eq!(config.image, PathBuf::from("image.bmp"));
        assert_eq!(config.algorithm, AlgorithmKind::Merge);
        assert_eq!(config.window_size(), UVec2::new(1000, 600));
        assert_eq!(config.min_draws, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_algorithm_and_seed() {
        let config = Config::try_parse_from([
            "algo-reveal",
            "cat.png",
            "-a",
            "shuffle-retry",
            "--seed",
            "7",
            "--max-shuffles",
            "1000",
        ])
        .unwrap();
        assert_eq!(config.image, PathBuf::from("cat.png"));
        assert_eq!(config.algorithm, AlgorithmKind::ShuffleRetry);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_shuffles, Some(1000));
    }

    #[test]
    fn rejects_zero_window_and_bad_fps() {
        let config = Config {
            width: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(SetupError::InvalidConfig(_))));

        let config = Config {
            fps: 0.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_fps_too_small_for_a_duration() {
        let config = Config {
            fps: 1e-20,
            ..Config::default()
        };
        assert!(matches!(config.frame_interval(), Err(SetupError::InvalidConfig(_))));
        assert!(matches!(config.validate(), Err(SetupError::InvalidConfig(_))));
    }

    #[test]
    fn frame_interval_follows_fps() {
        let millis = Config::default().frame_interval().unwrap().as_secs_f64() * 1000.0;
        assert!((millis - 33.333).abs() < 0.01);
    }

    #[test]
    fn rejects_windows_larger_than_a_frame_texture() {
        let config = Config {
            width: 10_000,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(SetupError::InvalidConfig(_))));

        let config = Config {
            width: MAX_WINDOW_DIMENSION,
            height: MAX_WINDOW_DIMENSION,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }
}
