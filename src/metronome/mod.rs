//! Metronome - a self-rescheduling click
//!
//! Clicks once on start, then every `60000 / bpm` ms. The first beat of each
//! bar is accented with a higher pitch. Like the composer, each tick carries a
//! generation so a tick that outlived `stop` does nothing.

use log::info;

use crate::timeline::{Scheduler, TimerHandle};

pub const DEFAULT_BPM: f32 = 120.0;
pub const MIN_BPM: f32 = 40.0;
pub const MAX_BPM: f32 = 240.0;
pub const BEATS_PER_BAR: u64 = 4;

/// Pitch of an ordinary beat
pub const CLICK_HZ: f32 = 1_000.0;
/// Pitch of the first beat in a bar
pub const ACCENT_HZ: f32 = 1_500.0;

/// Timeline payload for metronome timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetronomeCue {
    pub generation: u64,
}

/// One click to sound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Click {
    /// Beats since start, counting from 1
    pub beat: u64,
    pub accent: bool,
}

impl Click {
    pub fn frequency(&self) -> f32 {
        if self.accent {
            ACCENT_HZ
        } else {
            CLICK_HZ
        }
    }
}

pub struct Metronome {
    bpm: f32,
    running: bool,
    generation: u64,
    pending: Option<TimerHandle>,
    beat: u64,
}

impl Metronome {
    pub fn new(bpm: f32) -> Self {
        Self {
            bpm: clamp_bpm(bpm),
            running: false,
            generation: 0,
            pending: None,
            beat: 0,
        }
    }

    /// Start clicking. The first click is due immediately. No-op if running.
    pub fn start<E: From<MetronomeCue>>(&mut self, scheduler: &mut Scheduler<E>) -> bool {
        if self.running {
            return false;
        }

        self.running = true;
        self.beat = 0;
        self.generation += 1;

        let cue = MetronomeCue {
            generation: self.generation,
        };
        self.pending = Some(scheduler.schedule_in(0.0, cue.into()));
        info!("metronome started at {} bpm", self.bpm);
        true
    }

    /// Stop clicking. Cancels only the metronome's own timer.
    pub fn stop<E>(&mut self, scheduler: &mut Scheduler<E>) -> bool {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel(handle);
        }
        self.generation += 1;

        let was_running = std::mem::replace(&mut self.running, false);
        if was_running {
            info!("metronome stopped after {} beats", self.beat);
        }
        was_running
    }

    /// Start if stopped, stop if running. Returns the new running state.
    pub fn toggle<E: From<MetronomeCue>>(&mut self, scheduler: &mut Scheduler<E>) -> bool {
        if self.running {
            self.stop(scheduler);
        } else {
            self.start(scheduler);
        }
        self.running
    }

    /// Handle a fired cue: count the beat and schedule the next one.
    pub fn tick<E: From<MetronomeCue>>(
        &mut self,
        cue: MetronomeCue,
        scheduler: &mut Scheduler<E>,
    ) -> Option<Click> {
        if !self.running || cue.generation != self.generation {
            return None;
        }

        let accent = self.beat % BEATS_PER_BAR == 0;
        self.beat += 1;

        self.pending = Some(scheduler.schedule_in(self.interval_ms(), cue.into()));
        Some(Click {
            beat: self.beat,
            accent,
        })
    }

    /// Change tempo. Takes effect from the next scheduled tick.
    pub fn set_bpm(&mut self, bpm: f32) {
        self.bpm = clamp_bpm(bpm);
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    /// Milliseconds between clicks
    pub fn interval_ms(&self) -> f64 {
        60_000.0 / f64::from(self.bpm)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Beats clicked since the last start
    pub fn beat(&self) -> u64 {
        self.beat
    }
}

impl Default for Metronome {
    fn default() -> Self {
        Self::new(DEFAULT_BPM)
    }
}

fn clamp_bpm(bpm: f32) -> f32 {
    if bpm.is_nan() {
        DEFAULT_BPM
    } else {
        bpm.clamp(MIN_BPM, MAX_BPM)
    }
}
