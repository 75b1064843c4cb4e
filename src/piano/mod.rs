//! Piano - the engine tying notes, time and the generative parts together
//!
//! One `Piano` owns one timeline. Key input goes straight to the voice
//! manager (and the recorder, when it is listening). Everything scheduled
//! for later - playback, composer ticks, chord notes, metronome clicks -
//! is a `TimelineEvent` on the shared scheduler, dispatched by `advance`.
//!
//! ```text
//!   keys ──→ press/release ──→ VoiceManager ──→ Synthesizer
//!                 │                  ↑
//!                 ↓                  │
//!            EventRecorder      dispatch ←── Scheduler ←── advance(frames)
//!                 │                  ↑           ↑
//!                 └── playback ──────┘           ├── Composer ticks
//!                                                └── Metronome ticks
//! ```
//!
//! The audio thread calls `advance` with the number of frames it is about to
//! render, so timing is as accurate as the block size.

use std::collections::VecDeque;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::composer::{analyze_mood, moods, Composer, ComposerCue};
use crate::config::{ConfigError, PianoConfig};
use crate::keyboard::Note;
use crate::metronome::{Metronome, MetronomeCue};
use crate::recorder::{CueAction, EventRecorder, PlaybackCue, PlaybackHandle};
use crate::status::PianoStatus;
use crate::synth::{Release, Synthesizer, VoiceManager};
use crate::timeline::Scheduler;

/// Click loudness relative to master gain
const CLICK_GAIN: f32 = 0.5;
/// Oldest notifications are dropped past this many
const MAX_NOTIFICATIONS: usize = 256;

/// Everything that can sit on the piano's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineEvent {
    Playback(PlaybackCue),
    Composer(ComposerCue),
    Metronome(MetronomeCue),
}

impl From<PlaybackCue> for TimelineEvent {
    fn from(cue: PlaybackCue) -> Self {
        TimelineEvent::Playback(cue)
    }
}

impl From<ComposerCue> for TimelineEvent {
    fn from(cue: ComposerCue) -> Self {
        TimelineEvent::Composer(cue)
    }
}

impl From<MetronomeCue> for TimelineEvent {
    fn from(cue: MetronomeCue) -> Self {
        TimelineEvent::Metronome(cue)
    }
}

/// State changes for observers (UI, logs, tests).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notification {
    NoteOn(Note),
    NoteOff(Note),
    SustainChanged(bool),
    VolumeChanged(f32),
    RecordingStarted,
    RecordingStopped { events: usize },
    PlaybackStarted { duration_ms: f64 },
    PlaybackFinished,
    CompositionStarted { mood: &'static str },
    CompositionStopped,
    MetronomeStarted { bpm: f32 },
    MetronomeStopped,
    MetronomeTick { beat: u64, accent: bool },
}

pub struct Piano<S: Synthesizer> {
    scheduler: Scheduler<TimelineEvent>,
    voices: VoiceManager<S>,
    recorder: EventRecorder,
    composer: Composer,
    metronome: Metronome,
    notifications: VecDeque<Notification>,
}

impl<S: Synthesizer> Piano<S> {
    pub fn new(synth: S, config: PianoConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut voices = VoiceManager::new(synth);
        voices.set_volume(config.volume);

        info!(
            "piano ready: {}Hz, volume {}%, {} bpm",
            config.sample_rate,
            config.volume,
            config.clamped_bpm()
        );

        Ok(Self {
            scheduler: Scheduler::new(config.sample_rate),
            voices,
            recorder: EventRecorder::new(),
            composer: Composer::new(config.composer_settings(), rng),
            metronome: Metronome::new(config.clamped_bpm()),
            notifications: VecDeque::with_capacity(64),
        })
    }

    // ---- keys ----

    /// Key down. Recorded when a recording is running.
    pub fn press(&mut self, note: Note) {
        self.recorder.record_event(note, true, self.scheduler.now_ms());
        self.sound_press(note);
    }

    /// Key up. Recorded when a recording is running.
    pub fn release(&mut self, note: Note) {
        self.recorder.record_event(note, false, self.scheduler.now_ms());
        self.sound_release(note);
    }

    /// Press by name (`"C#4"`, `"Eb5"`). Unknown names are ignored.
    pub fn press_named(&mut self, name: &str) -> bool {
        match Note::from_name(name) {
            Some(note) => {
                self.press(note);
                true
            }
            None => {
                debug!("ignoring press of unknown note {:?}", name);
                false
            }
        }
    }

    /// Release by name. Unknown names are ignored.
    pub fn release_named(&mut self, name: &str) -> bool {
        match Note::from_name(name) {
            Some(note) => {
                self.release(note);
                true
            }
            None => {
                debug!("ignoring release of unknown note {:?}", name);
                false
            }
        }
    }

    pub fn set_sustain(&mut self, active: bool) {
        if self.voices.is_sustained() == active {
            return;
        }

        let flushed = self.voices.set_sustain(active);
        self.notify(Notification::SustainChanged(active));
        for note in flushed {
            self.notify(Notification::NoteOff(note));
        }
    }

    pub fn toggle_sustain(&mut self) {
        self.set_sustain(!self.voices.is_sustained());
    }

    /// Master volume in percent. Only affects notes started afterwards.
    pub fn set_volume(&mut self, percent: f32) {
        self.voices.set_volume(percent);
        let volume = self.voices.volume_percent();
        self.notify(Notification::VolumeChanged(volume));
    }

    pub fn adjust_volume(&mut self, delta: f32) {
        self.set_volume(self.voices.volume_percent() + delta);
    }

    // ---- recording ----

    /// Start a new recording. Any playback in progress is cancelled.
    pub fn start_recording(&mut self) {
        self.stop_playback();
        let orphaned = self.recorder.start_recording(&mut self.scheduler);
        self.release_all(orphaned);
        self.notify(Notification::RecordingStarted);
    }

    pub fn stop_recording(&mut self) {
        if self.recorder.is_recording() {
            self.recorder.stop_recording();
            let events = self.recorder.events().len();
            self.notify(Notification::RecordingStopped { events });
        }
    }

    pub fn toggle_recording(&mut self) {
        if self.recorder.is_recording() {
            self.stop_recording();
        } else {
            self.start_recording();
        }
    }

    /// Play the last recording from now. `None` if nothing was recorded.
    pub fn play_recording(&mut self) -> Option<PlaybackHandle> {
        if !self.recorder.has_recording() {
            debug!("nothing recorded to play");
            return None;
        }

        self.stop_recording();
        self.stop_playback();

        let handle = self.recorder.playback(&mut self.scheduler)?;
        self.notify(Notification::PlaybackStarted {
            duration_ms: handle.duration_ms(),
        });
        Some(handle)
    }

    /// Cancel playback, releasing any note it left down.
    pub fn stop_playback(&mut self) {
        let was_playing = self.recorder.is_playing();
        let stuck = self.recorder.stop_playback(&mut self.scheduler);
        self.release_all(stuck);
        if was_playing {
            self.notify(Notification::PlaybackFinished);
        }
    }

    /// True once the playback behind `handle` completed or was cancelled.
    pub fn is_playback_finished(&self, handle: &PlaybackHandle) -> bool {
        self.recorder.is_finished(handle)
    }

    // ---- composer ----

    /// Start composing in a mood by key. Unknown keys change nothing.
    pub fn compose(&mut self, mood_key: &str) -> bool {
        if !self.composer.compose(mood_key, &mut self.scheduler) {
            return false;
        }
        if let Some(mood) = self.composer.mood() {
            self.notify(Notification::CompositionStarted { mood });
        }
        true
    }

    /// Pick a mood from free text and start composing. Returns the mood's name.
    pub fn compose_from_text(&mut self, text: &str) -> &'static str {
        let mood = analyze_mood(text);
        debug!("{:?} reads as {}", text, mood.key);
        self.compose(mood.key);
        mood.name
    }

    /// Compose the mood at `index` in menu order.
    pub fn compose_by_index(&mut self, index: usize) -> bool {
        match moods().get(index) {
            Some(mood) => self.compose(mood.key),
            None => false,
        }
    }

    pub fn stop_composing(&mut self) {
        if self.composer.stop(&mut self.scheduler) {
            self.notify(Notification::CompositionStopped);
        }
    }

    // ---- metronome ----

    pub fn start_metronome(&mut self) {
        if self.metronome.start(&mut self.scheduler) {
            let bpm = self.metronome.bpm();
            self.notify(Notification::MetronomeStarted { bpm });
        }
    }

    pub fn stop_metronome(&mut self) {
        if self.metronome.stop(&mut self.scheduler) {
            self.notify(Notification::MetronomeStopped);
        }
    }

    pub fn toggle_metronome(&mut self) {
        if self.metronome.is_running() {
            self.stop_metronome();
        } else {
            self.start_metronome();
        }
    }

    pub fn set_bpm(&mut self, bpm: f32) {
        self.metronome.set_bpm(bpm);
    }

    pub fn adjust_bpm(&mut self, delta: f32) {
        self.set_bpm(self.metronome.bpm() + delta);
    }

    // ---- time ----

    /// Move the clock forward by `frames`, firing everything that comes due.
    pub fn advance(&mut self, frames: u64) {
        let target = self.scheduler.now() + frames;
        while let Some(due) = self.scheduler.pop_due(target) {
            self.dispatch(due.event);
        }
        self.scheduler.set_now(target);
    }

    pub fn advance_ms(&mut self, ms: f64) {
        let frames = self.scheduler.ms_to_frames(ms);
        self.advance(frames);
    }

    fn dispatch(&mut self, event: TimelineEvent) {
        match event {
            TimelineEvent::Playback(cue) => match self.recorder.take_cue(cue) {
                Some(CueAction::Press(note)) => self.sound_press(note),
                Some(CueAction::Release(note)) => self.sound_release(note),
                Some(CueAction::Finished(stuck)) => {
                    self.release_all(stuck);
                    self.notify(Notification::PlaybackFinished);
                }
                None => {}
            },
            TimelineEvent::Composer(ComposerCue::Tick { generation }) => {
                if let Some(note) = self.composer.tick(generation, &mut self.scheduler) {
                    self.sound_press(note);
                }
            }
            TimelineEvent::Composer(ComposerCue::ChordPress { note }) => self.sound_press(note),
            TimelineEvent::Composer(ComposerCue::Release { note }) => self.sound_release(note),
            TimelineEvent::Metronome(cue) => {
                if let Some(click) = self.metronome.tick(cue, &mut self.scheduler) {
                    let gain = self.voices.master_gain() * CLICK_GAIN;
                    self.voices.synth_mut().click(click.frequency(), gain);
                    self.notify(Notification::MetronomeTick {
                        beat: click.beat,
                        accent: click.accent,
                    });
                }
            }
        }
    }

    // ---- output ----

    /// Stop everything: composer, metronome, playback and every voice.
    pub fn all_notes_off(&mut self) {
        self.stop_composing();
        self.stop_metronome();
        self.stop_playback();
        for note in self.voices.all_notes_off() {
            self.notify(Notification::NoteOff(note));
        }
    }

    pub fn status(&self) -> PianoStatus {
        PianoStatus {
            active: PianoStatus::mask(self.voices.active_notes()),
            sustain: self.voices.is_sustained(),
            volume: self.voices.volume_percent(),
            recording: self.recorder.is_recording(),
            has_recording: self.recorder.has_recording(),
            playing: self.recorder.is_playing(),
            mood: self.composer.mood(),
            metronome: self.metronome.is_running(),
            bpm: self.metronome.bpm(),
            beat: self.metronome.beat(),
            time_ms: self.scheduler.now_ms(),
        }
    }

    /// Take every notification since the last drain, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    pub fn active_notes(&self) -> Vec<Note> {
        self.voices.active_notes()
    }

    pub fn now_ms(&self) -> f64 {
        self.scheduler.now_ms()
    }

    pub fn voices(&self) -> &VoiceManager<S> {
        &self.voices
    }

    pub fn synth(&self) -> &S {
        self.voices.synth()
    }

    pub fn synth_mut(&mut self) -> &mut S {
        self.voices.synth_mut()
    }

    pub fn recorder(&self) -> &EventRecorder {
        &self.recorder
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn metronome(&self) -> &Metronome {
        &self.metronome
    }

    pub fn scheduler(&self) -> &Scheduler<TimelineEvent> {
        &self.scheduler
    }

    // ---- internals ----

    fn sound_press(&mut self, note: Note) {
        self.voices.press(note);
        self.notify(Notification::NoteOn(note));
    }

    fn sound_release(&mut self, note: Note) {
        if self.voices.release(note) == Release::Stopped {
            self.notify(Notification::NoteOff(note));
        }
    }

    fn release_all(&mut self, notes: Vec<Note>) {
        for note in notes {
            self.sound_release(note);
        }
    }

    fn notify(&mut self, notification: Notification) {
        if self.notifications.len() == MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
        self.notifications.push_back(notification);
    }
}
