//! Real-time battle driver
//!
//! Paces `sim::tick` against wall-clock time with a fixed timestep
//! accumulator. Frames that arrive too late are capped at `MAX_SUBSTEPS`
//! ticks and the backlog is dropped, so the logical rate stays stable.

use crate::consts::MAX_SUBSTEPS;
use crate::error::SimError;
use crate::settings::Settings;
use crate::sim::{configure, is_terminal, tick, BattleResult, BattleState, TickEvents};

/// Longest frame the driver will account for, in seconds
const MAX_FRAME_TIME: f32 = 0.1;

/// A battle advanced by elapsed real time
#[derive(Debug)]
pub struct RealtimeDriver {
    state: BattleState,
    accumulator: f32,
    timestep: f32,
    /// Ticks run over the driver's lifetime
    ticks_run: u64,
    /// Frames that hit the substep cap
    dropped_frames: u32,
}

impl RealtimeDriver {
    pub fn new(state: BattleState) -> Self {
        let timestep = state.settings.timestep();
        Self {
            state,
            accumulator: 0.0,
            timestep,
            ticks_run: 0,
            dropped_frames: 0,
        }
    }

    /// Configure a fresh battle and wrap it
    pub fn start(left: &str, right: &str, seed: u64, settings: Settings) -> Result<Self, SimError> {
        Ok(Self::new(configure(left, right, seed, settings)?))
    }

    /// Run as many fixed ticks as `dt` seconds cover
    ///
    /// Returns the events of every tick run, in order.
    pub fn advance(&mut self, dt: f32) -> TickEvents {
        let mut events = TickEvents::new();
        if is_terminal(&self.state).is_some() {
            return events;
        }

        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_TIME) } else { 0.0 };
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= self.timestep && substeps < MAX_SUBSTEPS {
            events.extend(tick(&mut self.state));
            self.accumulator -= self.timestep;
            self.ticks_run += 1;
            substeps += 1;

            if is_terminal(&self.state).is_some() {
                self.accumulator = 0.0;
                break;
            }
        }

        if substeps == MAX_SUBSTEPS && self.accumulator >= self.timestep {
            // Skip the backlog instead of spiralling
            log::debug!(
                "Dropping {:.3}s of backlog at tick {}",
                self.accumulator,
                self.state.tick
            );
            self.accumulator = 0.0;
            self.dropped_frames += 1;
        }

        events
    }

    /// Fraction of a tick left in the accumulator, for render interpolation
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.timestep).clamp(0.0, 1.0)
    }

    pub fn result(&self) -> Option<&BattleResult> {
        is_terminal(&self.state)
    }

    pub fn is_finished(&self) -> bool {
        self.result().is_some()
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn into_state(self) -> BattleState {
        self.state
    }

    pub fn ticks_run(&self) -> u64 {
        self.ticks_run
    }

    pub fn dropped_frames(&self) -> u32 {
        self.dropped_frames
    }

    /// Seconds of real time one tick represents
    pub fn timestep(&self) -> f32 {
        self.timestep
    }
}
