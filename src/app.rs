use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use glam::UVec2;
use log::{error, info, warn};
use rand::{rngs::SmallRng, SeedableRng};
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowBuilder},
};

use crate::algorithms::{AlgorithmKind, SortAlgorithm, SHUFFLE_RETRY_PRACTICAL_LIMIT};
use crate::canvas::{Canvas, EventSource, InputEvent, Key, PixmapCanvas, Rect, SourceImage};
use crate::config::Config;
use crate::engine::{RevealEngine, RunState};
use crate::error::SetupError;
use crate::pacer::FramePacer;
use crate::permutation::{time_seed, PermutationStore};
use crate::renderer::Renderer;
use crate::scanner::ScanGeometry;
use crate::worker::{SortStatus, SortWorker};

/// Pixmap canvas whose presents go to the window.
pub struct ScreenCanvas<'a> {
    inner: PixmapCanvas,
    renderer: Renderer<'a>,
}

impl<'a> ScreenCanvas<'a> {
    pub fn new(inner: PixmapCanvas, renderer: Renderer<'a>) -> Self {
        Self { inner, renderer }
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.renderer.resize(size);
    }

    /// Re-shows the last framebuffer contents, e.g. after an expose.
    pub fn refresh(&mut self) -> Result<()> {
        self.renderer.render(self.inner.pixmap())
    }
}

impl Canvas for ScreenCanvas<'_> {
    fn clear(&mut self) {
        self.inner.clear();
    }

    fn draw_scaled_block(&mut self, src: UVec2, dst: Rect) {
        self.inner.draw_scaled_block(src, dst);
    }

    fn present(&mut self) -> Result<()> {
        self.inner.present()?;
        self.renderer.render(self.inner.pixmap())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for Enter before the sort starts.
    AwaitStart,
    Running,
    /// Run is Done or Aborted; waiting for Enter before teardown.
    AwaitExit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Everything about a run that does not need a window: the shuffled
/// permutation, the chosen algorithm, the worker and the reveal engine.
pub struct Session {
    kind: AlgorithmKind,
    phase: Phase,
    permutation: Arc<PermutationStore>,
    status: SortStatus,
    algorithm: Option<Box<dyn SortAlgorithm>>,
    worker: Option<SortWorker>,
    engine: RevealEngine,
    events: VecDeque<InputEvent>,
}

impl Session {
    pub fn new(config: &Config, image: UVec2) -> Result<Self, SetupError> {
        config.validate()?;
        let permutation = Arc::new(PermutationStore::for_image(image.x, image.y)?);
        if permutation.is_empty() {
            return Err(SetupError::InvalidConfig("image has no pixels".into()));
        }

        let seed = config.seed.unwrap_or_else(time_seed);
        permutation.shuffle(&mut SmallRng::seed_from_u64(seed));
        info!("Shuffled {} pixels (seed {})", permutation.len(), seed);

        if config.algorithm == AlgorithmKind::ShuffleRetry
            && permutation.len() > SHUFFLE_RETRY_PRACTICAL_LIMIT
        {
            match config.max_shuffles {
                Some(cap) => warn!(
                    "shuffle-retry over {} pixels will almost surely give up after {} shuffles",
                    permutation.len(),
                    cap
                ),
                None => warn!(
                    "shuffle-retry over {} pixels is not expected to ever finish; pass --max-shuffles to cap it",
                    permutation.len()
                ),
            }
        }

        let status = SortStatus::new();
        let geometry = ScanGeometry::new(config.window_size(), image);
        let pacer = FramePacer::new(config.frame_interval()?, config.min_draws);
        let engine = RevealEngine::new(geometry, Arc::clone(&permutation), status.clone(), pacer);
        let algorithm = config.algorithm.build(seed.wrapping_add(1), config.max_shuffles);

        Ok(Self {
            kind: config.algorithm,
            phase: Phase::AwaitStart,
            permutation,
            status,
            algorithm: Some(algorithm),
            worker: None,
            engine,
            events: VecDeque::new(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> RunState {
        self.engine.state()
    }

    pub fn engine(&self) -> &RevealEngine {
        &self.engine
    }

    pub fn status(&self) -> &SortStatus {
        &self.status
    }

    pub fn permutation(&self) -> &Arc<PermutationStore> {
        &self.permutation
    }

    pub fn push_event(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    /// Advances whichever phase is current by one unit of work: pending input
    /// while waiting, one sweep while running.
    pub fn pump<C: Canvas + ?Sized>(&mut self, canvas: &mut C) -> Result<Flow> {
        match self.phase {
            Phase::AwaitStart => {
                while let Some(event) = self.events.poll() {
                    match event {
                        InputEvent::Quit => return Ok(Flow::Exit),
                        InputEvent::KeyPress(Key::Enter) => {
                            self.begin()?;
                            break;
                        }
                        InputEvent::KeyPress(Key::Other) => {}
                    }
                }
            }
            Phase::Running => {
                let state = self.engine.run_sweep(canvas, &mut self.events)?;
                if state.is_terminal() {
                    self.phase = Phase::AwaitExit;
                    info!("Press 'Enter' in the window to exit");
                }
            }
            Phase::AwaitExit => {
                while let Some(event) = self.events.poll() {
                    if matches!(event, InputEvent::Quit | InputEvent::KeyPress(Key::Enter)) {
                        return Ok(Flow::Exit);
                    }
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn begin(&mut self) -> Result<()> {
        if let Some(algorithm) = self.algorithm.take() {
            let worker = SortWorker::spawn(Arc::clone(&self.permutation), algorithm, self.status.clone())?;
            self.worker = Some(worker);
        }
        self.engine.start(Instant::now());
        self.phase = Phase::Running;
        Ok(())
    }

    pub fn title(&self) -> String {
        let mut title = format!("Algo Reveal - {} - {}", self.kind, self.engine.state());
        if let Some(elapsed) = self.status.elapsed() {
            title.push_str(&format!(" - sorted in {}ms", elapsed.as_millis()));
        }
        title
    }

    /// Joins the worker if it is done, otherwise detaches it.
    pub fn shutdown(mut self) {
        info!(
            "Run ended {} after {} sweeps",
            self.engine.state(),
            self.engine.sweeps()
        );
        if let Some(worker) = self.worker.take() {
            worker.shutdown();
        }
    }
}

fn map_key(key: PhysicalKey) -> Key {
    match key {
        PhysicalKey::Code(KeyCode::Enter | KeyCode::NumpadEnter) => Key::Enter,
        _ => Key::Other,
    }
}

pub async fn run(config: Config) -> Result<()> {
    config.validate()?;
    let source = SourceImage::open(&config.image)?;
    info!(
        "Loaded {} ({}x{})",
        config.image.display(),
        source.width(),
        source.height()
    );
    let mut session = Some(Session::new(&config, source.size())?);

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title(format!("Algo Reveal - {}", config.algorithm))
        .with_inner_size(PhysicalSize::new(config.width, config.height))
        .with_resizable(false)
        .build(&event_loop)?;

    // Leak the window to satisfy the surface lifetime; acceptable for single-window app
    let window: &'static Window = Box::leak(Box::new(window));

    let renderer = Renderer::new(window, config.window_size()).await?;
    let mut canvas = ScreenCanvas::new(
        PixmapCanvas::new(source, config.width, config.height),
        renderer,
    );
    canvas.refresh()?;
    info!("Press 'Enter' in the window to start");

    let mut failure: Option<anyhow::Error> = None;
    let failure_slot = &mut failure;
    let mut last_title = String::new();

    event_loop.run(move |event, target| {
        let Some(active) = session.as_mut() else {
            return;
        };

        let flow = match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    active.push_event(InputEvent::Quit);
                    Ok(Flow::Continue)
                }
                WindowEvent::Resized(size) => {
                    canvas.resize(size);
                    Ok(Flow::Continue)
                }
                WindowEvent::KeyboardInput { event, .. }
                    if event.state == ElementState::Pressed && !event.repeat =>
                {
                    active.push_event(InputEvent::KeyPress(map_key(event.physical_key)));
                    Ok(Flow::Continue)
                }
                WindowEvent::RedrawRequested => {
                    if active.phase() == Phase::Running {
                        active.pump(&mut canvas)
                    } else {
                        canvas.refresh().map(|_| Flow::Continue)
                    }
                }
                _ => Ok(Flow::Continue),
            },
            Event::AboutToWait => {
                let flow = if active.phase() == Phase::Running {
                    Ok(Flow::Continue)
                } else {
                    active.pump(&mut canvas)
                };
                if active.phase() == Phase::Running {
                    target.set_control_flow(ControlFlow::Poll);
                    window.request_redraw();
                } else {
                    target.set_control_flow(ControlFlow::Wait);
                }
                let title = active.title();
                if title != last_title {
                    window.set_title(&title);
                    last_title = title;
                }
                flow
            }
            _ => Ok(Flow::Continue),
        };

        let exit = match flow {
            Ok(Flow::Continue) => false,
            Ok(Flow::Exit) => true,
            Err(err) => {
                error!("Render error: {err:#}");
                *failure_slot = Some(err);
                true
            }
        };
        if exit {
            if let Some(finished) = session.take() {
                finished.shutdown();
            }
            target.exit();
        }
    })?;

    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
