use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

use crate::canvas::{Canvas, EventSource};
use crate::pacer::FramePacer;
use crate::permutation::PermutationStore;
use crate::scanner::{RevealScanner, ScanGeometry};
use crate::worker::SortStatus;

/// Lifecycle of a reveal run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Sweeping,
    Done,
    Aborted,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::Aborted)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunState::Idle => "idle",
            RunState::Sweeping => "sweeping",
            RunState::Done => "done",
            RunState::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

/// Render-thread side of a run: scanner, pacer and the run state machine.
pub struct RevealEngine {
    permutation: Arc<PermutationStore>,
    status: SortStatus,
    scanner: RevealScanner,
    pacer: FramePacer,
    state: RunState,
    sweeps: u64,
}

impl RevealEngine {
    pub fn new(
        geometry: ScanGeometry,
        permutation: Arc<PermutationStore>,
        status: SortStatus,
        pacer: FramePacer,
    ) -> Self {
        debug_assert_eq!(
            permutation.len(),
            geometry.image().x as usize * geometry.image().y as usize
        );
        Self {
            permutation,
            status,
            scanner: RevealScanner::new(geometry),
            pacer,
            state: RunState::Idle,
            sweeps: 0,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Completed sweeps since `start`.
    pub fn sweeps(&self) -> u64 {
        self.sweeps
    }

    pub fn scanner(&self) -> &RevealScanner {
        &self.scanner
    }

    pub fn pacer(&self) -> &FramePacer {
        &self.pacer
    }

    /// Idle -> Sweeping. Any other state is left alone.
    pub fn start(&mut self, now: Instant) {
        if self.state == RunState::Idle {
            self.scanner.reset();
            self.pacer.reset(now);
            self.state = RunState::Sweeping;
        }
    }

    /// One full sweep followed by the wraparound decisions.
    pub fn run_sweep<C, E>(&mut self, canvas: &mut C, events: &mut E) -> Result<RunState>
    where
        C: Canvas + ?Sized,
        E: EventSource + ?Sized,
    {
        if self.state != RunState::Sweeping {
            return Ok(self.state);
        }
        self.scan_sweep(canvas);
        self.finish_sweep(canvas, events, Instant::now())
    }

    /// Scans the rest of the current sweep, returning its DrawCount.
    pub fn scan_sweep<C: Canvas + ?Sized>(&mut self, canvas: &mut C) -> u64 {
        if self.state != RunState::Sweeping {
            return self.scanner.draw_count();
        }
        self.scanner.sweep(&self.permutation, canvas)
    }

    /// Wraparound handling: quit poll, paced present, then either Done or a
    /// cleared canvas for the next sweep.
    pub fn finish_sweep<C, E>(&mut self, canvas: &mut C, events: &mut E, now: Instant) -> Result<RunState>
    where
        C: Canvas + ?Sized,
        E: EventSource + ?Sized,
    {
        if self.state != RunState::Sweeping {
            return Ok(self.state);
        }
        self.sweeps += 1;
        let draw_count = self.scanner.draw_count();
        log::trace!("sweep {} drew {} pixels", self.sweeps, draw_count);

        if events.quit_requested() {
            log::info!("Quit received after {} sweeps", self.sweeps);
            self.state = RunState::Aborted;
            return Ok(self.state);
        }

        let presented = self.pacer.should_present(now, draw_count);
        if presented {
            canvas.present()?;
            self.pacer.record_present(now);
            log::debug!(
                "present #{}: sweep {} drew {}/{} pixels",
                self.pacer.presents(),
                self.sweeps,
                draw_count,
                self.scanner.geometry().window_pixels()
            );
        }

        let window_pixels = self.scanner.geometry().window_pixels();
        if self
            .pacer
            .is_complete(self.status.is_finished(), draw_count, window_pixels)
        {
            // The finished image stays up, so it is always shown.
            if !presented {
                canvas.present()?;
            }
            self.state = RunState::Done;
            log::info!("Image fully revealed after {} sweeps", self.sweeps);
            return Ok(self.state);
        }

        canvas.clear();
        self.scanner.reset();
        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{InputEvent, Rect};
    use glam::UVec2;
    use std::collections::VecDeque;
    use std::time::Duration;
    use test_log::test;

    #[derive(Default)]
    struct Counting {
        clears: usize,
        draws: usize,
        presents: usize,
    }

    impl Canvas for Counting {
        fn clear(&mut self) {
            self.clears += 1;
        }

        fn draw_scaled_block(&mut self, _src: UVec2, _dst: Rect) {
            self.draws += 1;
        }

        fn present(&mut self) -> Result<()> {
            self.presents += 1;
            Ok(())
        }
    }

    fn engine(values: Vec<u32>, status: SortStatus) -> RevealEngine {
        let geometry = ScanGeometry::new(UVec2::new(4, 4), UVec2::new(2, 2));
        RevealEngine::new(
            geometry,
            Arc::new(PermutationStore::from_values(values)),
            status,
            FramePacer::new(Duration::from_millis(30), 1),
        )
    }

    #[test]
    fn idle_engine_does_nothing() {
        let mut engine = engine(vec![0, 1, 2, 3], SortStatus::new());
        let mut canvas = Counting::default();
        let mut events: VecDeque<InputEvent> = VecDeque::new();

        assert_eq!(engine.run_sweep(&mut canvas, &mut events).unwrap(), RunState::Idle);
        assert_eq!(canvas.draws, 0);
    }

    #[test]
    fn unfinished_sort_keeps_sweeping() {
        let mut engine = engine(vec![0, 1, 2, 3], SortStatus::new());
        let mut canvas = Counting::default();
        let mut events: VecDeque<InputEvent> = VecDeque::new();
        let start = Instant::now();
        engine.start(start);

        assert_eq!(engine.scan_sweep(&mut canvas), 16);
        let state = engine
            .finish_sweep(&mut canvas, &mut events, start + Duration::from_millis(40))
            .unwrap();
        assert_eq!(state, RunState::Sweeping);
        assert_eq!(canvas.presents, 1);
        assert_eq!(canvas.clears, 1);
        assert_eq!(engine.scanner().draw_count(), 0);
    }

    #[test]
    fn finished_sort_with_full_sweep_is_done() {
        let status = SortStatus::new();
        status.finish(Duration::from_millis(1));
        let mut engine = engine(vec![0, 1, 2, 3], status);
        let mut canvas = Counting::default();
        let mut events: VecDeque<InputEvent> = VecDeque::new();
        let start = Instant::now();
        engine.start(start);

        engine.scan_sweep(&mut canvas);
        let state = engine.finish_sweep(&mut canvas, &mut events, start).unwrap();
        assert_eq!(state, RunState::Done);
        // Paced present skipped (interval not elapsed), final present made.
        assert_eq!(canvas.presents, 1);
        assert_eq!(canvas.clears, 0);
    }

    #[test]
    fn partial_sweep_is_not_done_even_when_sorted_flag_set() {
        let status = SortStatus::new();
        status.finish(Duration::ZERO);
        let mut engine = engine(vec![1, 0, 2, 3], status);
        let mut canvas = Counting::default();
        let mut events: VecDeque<InputEvent> = VecDeque::new();
        let start = Instant::now();
        engine.start(start);

        assert_eq!(engine.scan_sweep(&mut canvas), 8);
        let state = engine.finish_sweep(&mut canvas, &mut events, start).unwrap();
        assert_eq!(state, RunState::Sweeping);
    }

    #[test]
    fn quit_aborts_and_stops_drawing() {
        let mut engine = engine(vec![0, 1, 2, 3], SortStatus::new());
        let mut canvas = Counting::default();
        let mut events = VecDeque::from([InputEvent::Quit]);
        let start = Instant::now();
        engine.start(start);

        engine.scan_sweep(&mut canvas);
        let state = engine
            .finish_sweep(&mut canvas, &mut events, start + Duration::from_secs(1))
            .unwrap();
        assert_eq!(state, RunState::Aborted);
        assert_eq!(canvas.presents, 0);

        let draws = canvas.draws;
        assert_eq!(engine.run_sweep(&mut canvas, &mut events).unwrap(), RunState::Aborted);
        assert_eq!(canvas.draws, draws);
        assert_eq!(canvas.presents, 0);
    }

    #[test]
    fn start_is_ignored_after_terminal_state() {
        let mut engine = engine(vec![0, 1, 2, 3], SortStatus::new());
        let mut canvas = Counting::default();
        let mut events = VecDeque::from([InputEvent::Quit]);
        engine.start(Instant::now());
        engine.run_sweep(&mut canvas, &mut events).unwrap();

        engine.start(Instant::now());
        assert_eq!(engine.state(), RunState::Aborted);
        assert!(engine.state().is_terminal());
    }
}
