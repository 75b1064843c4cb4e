//! Event recorder - capture what was played, replay it with the same timing
//!
//! ```text
//!            start_recording            stop_recording
//!   Idle ────────────────────→ Recording ──────────────→ Idle
//!     │                            │
//!     │ playback                   │ playback (stops recording first)
//!     ↓                            ↓
//!   Playing ──── last event fired / stop_playback ────→ Idle
//! ```
//!
//! Recording stores each press/release with its offset from the moment
//! recording started. Playback schedules every event on the timeline at
//! `playback start + offset`, all at once. Each event has its own deadline,
//! so a late-firing event never pushes back the ones after it - timing comes
//! from the recorded offsets, not from a chain of waits.

use std::collections::BTreeSet;

use log::{debug, info};

use crate::keyboard::Note;
use crate::timeline::{Scheduler, TimerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Playing,
}

/// One captured key event.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordedEvent {
    pub note: Note,
    /// Milliseconds since recording started
    pub offset_ms: f64,
    pub is_press: bool,
}

/// Timeline payload for a scheduled playback step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCue {
    Event { session: u64, index: usize },
    Finished { session: u64 },
}

/// What the owner of the recorder should do when a cue fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CueAction {
    Press(Note),
    Release(Note),
    /// Playback ran to the end; release the notes it left down
    Finished(Vec<Note>),
}

/// Identifies one playback run, so callers can wait for it as a unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackHandle {
    session: u64,
    /// Milliseconds from playback start to the last event
    duration_ms: f64,
}

impl PlaybackHandle {
    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }
}

pub struct EventRecorder {
    state: RecorderState,
    events: Vec<RecordedEvent>,
    /// Timeline position (ms) when recording started
    anchor_ms: f64,
    /// Bumped on every playback start and stop
    session: u64,
    pending: Vec<TimerHandle>,
    /// Notes pressed by the current playback and not yet released
    sounding: BTreeSet<Note>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self {
            state: RecorderState::Idle,
            events: Vec::new(),
            anchor_ms: 0.0,
            session: 0,
            pending: Vec::new(),
            sounding: BTreeSet::new(),
        }
    }

    /// Begin a fresh recording, discarding the previous one.
    ///
    /// A playback in progress is cancelled; the notes it left sounding are returned.
    pub fn start_recording<E>(&mut self, scheduler: &mut Scheduler<E>) -> Vec<Note> {
        let orphaned = self.stop_playback(scheduler);

        self.events.clear();
        self.anchor_ms = scheduler.now_ms();
        self.state = RecorderState::Recording;
        info!("recording started at {:.1}ms", self.anchor_ms);
        orphaned
    }

    /// Append an event if recording; otherwise do nothing.
    pub fn record_event(&mut self, note: Note, is_press: bool, now_ms: f64) {
        if self.state != RecorderState::Recording {
            return;
        }

        // Offsets never go backwards, even if the caller's clock does
        let last = self.events.last().map_or(0.0, |e| e.offset_ms);
        let offset_ms = (now_ms - self.anchor_ms).max(last);

        self.events.push(RecordedEvent {
            note,
            offset_ms,
            is_press,
        });
    }

    pub fn stop_recording(&mut self) {
        if self.state == RecorderState::Recording {
            self.state = RecorderState::Idle;
            info!("recording stopped: {} events", self.events.len());
        }
    }

    /// Schedule the whole recording on the timeline, starting now.
    ///
    /// Returns `None` when there is nothing to play.
    pub fn playback<E: From<PlaybackCue>>(
        &mut self,
        scheduler: &mut Scheduler<E>,
    ) -> Option<PlaybackHandle> {
        if self.events.is_empty() {
            debug!("playback requested with an empty recording");
            return None;
        }

        self.stop_recording();
        self.stop_playback(scheduler);

        self.session += 1;
        let session = self.session;
        self.state = RecorderState::Playing;

        for (index, event) in self.events.iter().enumerate() {
            let cue = PlaybackCue::Event { session, index };
            self.pending.push(scheduler.schedule_in(event.offset_ms, cue.into()));
        }

        // Same deadline as the last event, scheduled after it, so it fires last
        let duration_ms = self.duration_ms();
        let handle = scheduler.schedule_in(duration_ms, PlaybackCue::Finished { session }.into());
        self.pending.push(handle);

        info!("playback started: {} events over {:.1}ms", self.events.len(), duration_ms);
        Some(PlaybackHandle {
            session,
            duration_ms,
        })
    }

    /// Resolve a fired cue. Cues from a cancelled or superseded playback yield `None`.
    pub fn take_cue(&mut self, cue: PlaybackCue) -> Option<CueAction> {
        if self.state != RecorderState::Playing {
            return None;
        }

        match cue {
            PlaybackCue::Event { session, index } if session == self.session => {
                let event = self.events.get(index)?;
                if event.is_press {
                    self.sounding.insert(event.note);
                    Some(CueAction::Press(event.note))
                } else {
                    self.sounding.remove(&event.note);
                    Some(CueAction::Release(event.note))
                }
            }
            PlaybackCue::Finished { session } if session == self.session => {
                self.state = RecorderState::Idle;
                self.pending.clear();
                let stuck: Vec<Note> = std::mem::take(&mut self.sounding).into_iter().collect();
                info!("playback finished");
                Some(CueAction::Finished(stuck))
            }
            _ => None,
        }
    }

    /// Cancel a playback in progress. Returns notes it pressed and never released.
    pub fn stop_playback<E>(&mut self, scheduler: &mut Scheduler<E>) -> Vec<Note> {
        for handle in self.pending.drain(..) {
            scheduler.cancel(handle);
        }

        if self.state == RecorderState::Playing {
            self.state = RecorderState::Idle;
            self.session += 1;
            debug!("playback cancelled");
        }

        std::mem::take(&mut self.sounding).into_iter().collect()
    }

    /// True once the playback identified by `handle` has completed or been cancelled.
    pub fn is_finished(&self, handle: &PlaybackHandle) -> bool {
        self.state != RecorderState::Playing || self.session != handle.session
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    pub fn is_playing(&self) -> bool {
        self.state == RecorderState::Playing
    }

    pub fn has_recording(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Offset of the last recorded event
    pub fn duration_ms(&self) -> f64 {
        self.events.last().map_or(0.0, |e| e.offset_ms)
    }
}

impl Default for EventRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::notes::{C4, E4, G4};

    const SAMPLE_RATE: f32 = 1_000.0;

    /// Run the timeline up to `until`, collecting (time, action) pairs.
    fn run(
        recorder: &mut EventRecorder,
        scheduler: &mut Scheduler<PlaybackCue>,
        until: u64,
    ) -> Vec<(u64, CueAction)> {
        let mut fired = Vec::new();
        while let Some(due) = scheduler.pop_due(until) {
            if let Some(action) = recorder.take_cue(due.event) {
                fired.push((due.deadline, action));
            }
        }
        scheduler.set_now(until);
        fired
    }

    fn recorded(events: &[(Note, f64, bool)]) -> (EventRecorder, Scheduler<PlaybackCue>) {
        let mut scheduler = Scheduler::new(SAMPLE_RATE);
        let mut recorder = EventRecorder::new();
        recorder.start_recording(&mut scheduler);
        for &(note, at, is_press) in events {
            recorder.record_event(note, is_press, at);
        }
        recorder.stop_recording();
        (recorder, scheduler)
    }

    #[test]
    fn records_offsets_from_start() {
        let mut scheduler: Scheduler<PlaybackCue> = Scheduler::new(SAMPLE_RATE);
        scheduler.set_now(2_000);

        let mut recorder = EventRecorder::new();
        recorder.start_recording(&mut scheduler);
        recorder.record_event(C4, true, 2_100.0);
        recorder.record_event(C4, false, 2_600.0);

        let offsets: Vec<_> = recorder.events().iter().map(|e| e.offset_ms).collect();
        assert_eq!(offsets, vec![100.0, 600.0]);
        assert!(recorder.is_recording());
    }

    #[test]
    fn ignores_events_outside_recording() {
        let mut recorder = EventRecorder::new();
        recorder.record_event(C4, true, 10.0);
        assert!(!recorder.has_recording());
    }

    #[test]
    fn new_recording_replaces_old_one() {
        let (mut recorder, mut scheduler) = recorded(&[(C4, 0.0, true), (C4, 100.0, false)]);

        recorder.start_recording(&mut scheduler);
        recorder.record_event(G4, true, 50.0);
        recorder.stop_recording();

        assert_eq!(recorder.events().len(), 1);
        assert_eq!(recorder.events()[0].note, G4);
    }

    #[test]
    fn playback_preserves_relative_timing() {
        let (mut recorder, mut scheduler) = recorded(&[(C4, 0.0, true), (C4, 500.0, false)]);
        scheduler.set_now(10_000);

        let handle = recorder.playback(&mut scheduler).expect("recording is not empty");
        assert_eq!(handle.duration_ms(), 500.0);

        let fired = run(&mut recorder, &mut scheduler, 20_000);
        assert_eq!(
            fired,
            vec![
                (10_000, CueAction::Press(C4)),
                (10_500, CueAction::Release(C4)),
                (10_500, CueAction::Finished(Vec::new())),
            ]
        );
        assert!(recorder.is_finished(&handle));
        assert_eq!(recorder.state(), RecorderState::Idle);
    }

    #[test]
    fn overlapping_notes_fire_at_their_own_offsets() {
        let (mut recorder, mut scheduler) = recorded(&[
            (C4, 0.0, true),
            (E4, 10.0, true),
            (G4, 20.0, true),
            (E4, 300.0, false),
            (C4, 300.0, false),
            (G4, 900.0, false),
        ]);
        recorder.playback(&mut scheduler);

        // One large block: nothing waits behind anything else
        let times: Vec<_> = run(&mut recorder, &mut scheduler, 5_000)
            .into_iter()
            .map(|(t, _)| t)
            .collect();
        assert_eq!(times, vec![0, 10, 20, 300, 300, 900, 900]);
    }

    #[test]
    fn nothing_fires_early() {
        let (mut recorder, mut scheduler) = recorded(&[(C4, 0.0, true), (C4, 500.0, false)]);
        recorder.playback(&mut scheduler);

        let fired = run(&mut recorder, &mut scheduler, 499);
        assert_eq!(fired, vec![(0, CueAction::Press(C4))]);
        assert!(recorder.is_playing());
    }

    #[test]
    fn empty_recording_does_not_play() {
        let mut scheduler: Scheduler<PlaybackCue> = Scheduler::new(SAMPLE_RATE);
        let mut recorder = EventRecorder::new();

        assert!(recorder.playback(&mut scheduler).is_none());
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(recorder.state(), RecorderState::Idle);
    }

    #[test]
    fn playback_while_recording_stops_recording_first() {
        let mut scheduler: Scheduler<PlaybackCue> = Scheduler::new(SAMPLE_RATE);
        let mut recorder = EventRecorder::new();
        recorder.start_recording(&mut scheduler);
        recorder.record_event(C4, true, 0.0);

        recorder.playback(&mut scheduler);
        assert!(recorder.is_playing());

        // Recording is closed: further events are not captured
        recorder.record_event(E4, true, 1.0);
        assert_eq!(recorder.events().len(), 1);
    }

    #[test]
    fn stopping_playback_cancels_pending_events_and_reports_stuck_notes() {
        let (mut recorder, mut scheduler) = recorded(&[(C4, 0.0, true), (C4, 500.0, false)]);
        let handle = recorder.playback(&mut scheduler).expect("playable");

        run(&mut recorder, &mut scheduler, 100);
        let stuck = recorder.stop_playback(&mut scheduler);

        assert_eq!(stuck, vec![C4]);
        assert_eq!(scheduler.pending(), 0);
        assert!(recorder.is_finished(&handle));
        assert!(run(&mut recorder, &mut scheduler, 1_000).is_empty());
    }

    #[test]
    fn starting_a_recording_cancels_playback() {
        let (mut recorder, mut scheduler) = recorded(&[(C4, 0.0, true), (C4, 500.0, false)]);
        recorder.playback(&mut scheduler);
        run(&mut recorder, &mut scheduler, 10);

        let stuck = recorder.start_recording(&mut scheduler);
        assert_eq!(stuck, vec![C4]);
        assert!(recorder.is_recording());
        assert!(!recorder.has_recording());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn finishing_reports_notes_left_down() {
        // Recording stopped while G4 was still held
        let (mut recorder, mut scheduler) = recorded(&[
            (C4, 0.0, true),
            (G4, 100.0, true),
            (C4, 200.0, false),
        ]);
        let handle = recorder.playback(&mut scheduler).expect("playable");

        let fired = run(&mut recorder, &mut scheduler, 1_000);
        assert_eq!(fired.last(), Some(&(200, CueAction::Finished(vec![G4]))));
        assert!(recorder.is_finished(&handle));
        assert!(recorder.stop_playback(&mut scheduler).is_empty());
    }

    #[test]
    fn stale_cues_are_ignored() {
        let (mut recorder, mut scheduler) = recorded(&[(C4, 0.0, true), (C4, 500.0, false)]);
        recorder.playback(&mut scheduler);
        recorder.playback(&mut scheduler);

        let stale = PlaybackCue::Event {
            session: 1,
            index: 0,
        };
        assert_eq!(recorder.take_cue(stale), None);
    }
}
