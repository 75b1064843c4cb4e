//! Composer - mood-driven generative melody loop
//!
//! `compose` picks a mood, generates a melody from its scale and schedules
//! the first tick right away. Each tick plays one melody note, sometimes
//! colors it with a chord, and schedules the next tick one rhythm step later.
//!
//! ```text
//!   tick @ t
//!     ├─ press melody[i]                     (now)
//!     ├─ press chord notes (p = 0.3)          t + 50ms
//!     ├─ release melody[i]                    t + rhythm * 0.8
//!     ├─ release chord notes                  t + 50ms + rhythm * 0.8
//!     └─ next tick                            t + rhythm
//! ```
//!
//! Only the next-tick timer is tracked. Chord presses and note releases are
//! fire-and-forget, so stopping lets whatever is in flight ring out.
//!
//! Every tick carries the generation it was scheduled under. `compose` and
//! `stop` bump the generation, so a tick that escaped cancellation is
//! recognized as stale and dropped. At most one composition ever advances.

pub mod melody;
pub mod mood;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::Rng;

use crate::keyboard::Note;
use crate::timeline::{Scheduler, TimerHandle};

use melody::MelodyPattern;
use mood::MoodProfile;

pub use mood::{analyze_mood, find_mood, moods, FALLBACK_MOOD};

/// Timeline payload for composer timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerCue {
    Tick { generation: u64 },
    ChordPress { note: Note },
    Release { note: Note },
}

/// Tuning for the composer loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComposerSettings {
    /// Chance of a chord on each tick, 0.0-1.0
    pub chord_probability: f64,
    /// Delay between the melody note and its chord
    pub chord_delay_ms: f64,
    /// Fraction of the rhythm step a note is held for
    pub release_ratio: f64,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self {
            chord_probability: 0.3,
            chord_delay_ms: 50.0,
            release_ratio: 0.8,
        }
    }
}

struct Composition {
    mood: &'static MoodProfile,
    melody: Vec<Note>,
    melody_cursor: usize,
    chord_cursor: usize,
    rhythm_cursor: usize,
}

pub struct Composer {
    settings: ComposerSettings,
    rng: StdRng,
    generation: u64,
    /// The next-tick timer
    pending: Option<TimerHandle>,
    composition: Option<Composition>,
}

impl Composer {
    pub fn new(settings: ComposerSettings, rng: StdRng) -> Self {
        Self {
            settings,
            rng,
            generation: 0,
            pending: None,
            composition: None,
        }
    }

    /// Start composing in `mood_key`, replacing any running composition.
    ///
    /// Returns false (and changes nothing) for an unknown mood.
    pub fn compose<E: From<ComposerCue>>(
        &mut self,
        mood_key: &str,
        scheduler: &mut Scheduler<E>,
    ) -> bool {
        let Some(mood) = find_mood(mood_key) else {
            debug!("unknown mood {:?}", mood_key);
            return false;
        };

        self.stop(scheduler);

        let melody = MelodyPattern::from_tag(mood.pattern).generate(mood.scale, &mut self.rng);
        if melody.is_empty() {
            debug!("mood {} cannot produce a melody", mood.key);
            return false;
        }

        info!("composing {} ({} notes, {})", mood.name, melody.len(), mood.pattern);
        self.composition = Some(Composition {
            mood,
            melody,
            melody_cursor: 0,
            chord_cursor: 0,
            rhythm_cursor: 0,
        });

        let generation = self.generation;
        self.pending = Some(scheduler.schedule_in(0.0, ComposerCue::Tick { generation }.into()));
        true
    }

    /// Run one tick. Returns the melody note to press now, or `None` for a stale tick.
    pub fn tick<E: From<ComposerCue>>(
        &mut self,
        generation: u64,
        scheduler: &mut Scheduler<E>,
    ) -> Option<Note> {
        if generation != self.generation {
            debug!("stale composer tick {} (current {})", generation, self.generation);
            return None;
        }

        let settings = self.settings;
        let composition = self.composition.as_mut()?;
        let mood = composition.mood;

        let note = composition.melody[composition.melody_cursor];
        let step_ms = f64::from(mood.step_ms(composition.rhythm_cursor));
        let hold_ms = step_ms * settings.release_ratio;

        if !mood.chords.is_empty() && self.rng.random_bool(settings.chord_probability) {
            let chord = mood.chords[composition.chord_cursor];
            for &chord_note in chord.iter().filter(|&&n| n != note) {
                scheduler.schedule_in(
                    settings.chord_delay_ms,
                    ComposerCue::ChordPress { note: chord_note }.into(),
                );
                scheduler.schedule_in(
                    settings.chord_delay_ms + hold_ms,
                    ComposerCue::Release { note: chord_note }.into(),
                );
            }
            composition.chord_cursor = (composition.chord_cursor + 1) % mood.chords.len();
        }

        scheduler.schedule_in(hold_ms, ComposerCue::Release { note }.into());

        composition.melody_cursor = (composition.melody_cursor + 1) % composition.melody.len();
        composition.rhythm_cursor = (composition.rhythm_cursor + 1) % mood.rhythm.len().max(1);

        self.pending = Some(scheduler.schedule_in(step_ms, ComposerCue::Tick { generation }.into()));
        Some(note)
    }

    /// Stop composing. Returns true if a composition was running.
    pub fn stop<E>(&mut self, scheduler: &mut Scheduler<E>) -> bool {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel(handle);
        }
        self.generation += 1;

        let was_composing = self.composition.take().is_some();
        if was_composing {
            info!("composition stopped");
        }
        was_composing
    }

    pub fn is_composing(&self) -> bool {
        self.composition.is_some()
    }

    /// Display name of the current mood
    pub fn mood(&self) -> Option<&'static str> {
        self.composition.as_ref().map(|c| c.mood.name)
    }

    /// The generated melody, empty when idle
    pub fn melody(&self) -> &[Note] {
        match &self.composition {
            Some(composition) => &composition.melody,
            None => &[],
        }
    }

    pub fn settings(&self) -> ComposerSettings {
        self.settings
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[cfg(test)]
    fn chord_cursor(&self) -> Option<usize> {
        self.composition.as_ref().map(|c| c.chord_cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn composer(chord_probability: f64) -> Composer {
        let settings = ComposerSettings {
            chord_probability,
            ..ComposerSettings::default()
        };
        Composer::new(settings, StdRng::seed_from_u64(42))
    }

    /// Run the timeline, collecting melody presses as (time, note).
    fn run(
        composer: &mut Composer,
        scheduler: &mut Scheduler<ComposerCue>,
        until: u64,
    ) -> (Vec<(u64, Note)>, Vec<ComposerCue>) {
        let mut melody = Vec::new();
        let mut other = Vec::new();
        while let Some(due) = scheduler.pop_due(until) {
            match due.event {
                ComposerCue::Tick { generation } => {
                    if let Some(note) = composer.tick(generation, scheduler) {
                        melody.push((due.deadline, note));
                    }
                }
                cue => other.push(cue),
            }
        }
        scheduler.set_now(until);
        (melody, other)
    }

    #[test]
    fn first_tick_fires_immediately() {
        let mut composer = composer(0.0);
        let mut scheduler = Scheduler::new(SAMPLE_RATE);

        assert!(composer.compose("hopeful", &mut scheduler));
        let (melody, _) = run(&mut composer, &mut scheduler, 0);
        assert_eq!(melody.len(), 1);
        assert_eq!(melody[0].0, 0);
    }

    #[test]
    fn ticks_follow_the_rhythm_cycle() {
        let mut composer = composer(0.0);
        let mut scheduler = Scheduler::new(SAMPLE_RATE);
        composer.compose("hopeful", &mut scheduler);

        // Hopeful rhythm: 500 500 500 1000
        let (melody, _) = run(&mut composer, &mut scheduler, 3_500);
        let times: Vec<_> = melody.iter().map(|&(t, _)| t).collect();
        assert_eq!(times, vec![0, 500, 1_000, 1_500, 2_500, 3_000, 3_500]);

        // Ascending pattern plays the scale in order
        let notes: Vec<_> = melody.iter().map(|&(_, n)| n).collect();
        assert_eq!(notes, composer.melody()[..7].to_vec());
    }

    #[test]
    fn melody_notes_are_released_at_eighty_percent() {
        let mut composer = composer(0.0);
        let mut scheduler = Scheduler::new(SAMPLE_RATE);
        composer.compose("hopeful", &mut scheduler);

        let (melody, other) = run(&mut composer, &mut scheduler, 400);
        assert_eq!(other, vec![ComposerCue::Release { note: melody[0].1 }]);
    }

    #[test]
    fn chords_follow_the_melody_note() {
        let mut composer = composer(1.0);
        let mut scheduler = Scheduler::new(SAMPLE_RATE);
        composer.compose("joy", &mut scheduler);

        let (melody, _) = run(&mut composer, &mut scheduler, 0);
        let note = melody[0].1;

        // Chord presses wait for the delay
        assert_eq!(scheduler.next_deadline(), Some(50));
        let (_, other) = run(&mut composer, &mut scheduler, 50);
        let presses: Vec<_> = other
            .iter()
            .filter_map(|cue| match cue {
                ComposerCue::ChordPress { note } => Some(*note),
                _ => None,
            })
            .collect();

        let first_chord = find_mood("joy").map(|m| m.chords[0]).unwrap_or(&[]);
        let expected: Vec<_> = first_chord.iter().copied().filter(|&n| n != note).collect();
        assert_eq!(presses, expected);
    }

    fn chord_presses(cues: &[ComposerCue]) -> Vec<Note> {
        cues.iter()
            .filter_map(|cue| match cue {
                ComposerCue::ChordPress { note } => Some(*note),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn each_chord_moves_to_the_next_in_the_progression() {
        let mut composer = composer(1.0);
        let mut scheduler = Scheduler::new(SAMPLE_RATE);
        composer.compose("joy", &mut scheduler);
        let chords = find_mood("joy").map(|m| m.chords).unwrap_or(&[]);

        // Joy steps 300ms; chords land 50ms after each tick
        let (first, _) = run(&mut composer, &mut scheduler, 0);
        let (_, other) = run(&mut composer, &mut scheduler, 50);
        let expected: Vec<_> = chords[0].iter().copied().filter(|&n| n != first[0].1).collect();
        assert_eq!(chord_presses(&other), expected);
        assert_eq!(composer.chord_cursor(), Some(1));

        let (second, _) = run(&mut composer, &mut scheduler, 300);
        let (_, other) = run(&mut composer, &mut scheduler, 350);
        let expected: Vec<_> = chords[1].iter().copied().filter(|&n| n != second[0].1).collect();
        assert_eq!(chord_presses(&other), expected);
        assert_eq!(composer.chord_cursor(), Some(2));
    }

    #[test]
    fn chord_cursor_holds_without_chords() {
        let mut composer = composer(0.0);
        let mut scheduler = Scheduler::new(SAMPLE_RATE);
        composer.compose("joy", &mut scheduler);

        let (melody, other) = run(&mut composer, &mut scheduler, 5_000);
        assert!(melody.len() > 4);
        assert!(chord_presses(&other).is_empty());
        assert_eq!(composer.chord_cursor(), Some(0));
    }

    #[test]
    fn stop_cancels_the_next_tick() {
        let mut composer = composer(0.0);
        let mut scheduler = Scheduler::new(SAMPLE_RATE);
        composer.compose("calm", &mut scheduler);
        run(&mut composer, &mut scheduler, 0);

        assert!(composer.stop(&mut scheduler));
        assert!(!composer.is_composing());
        assert!(composer.melody().is_empty());

        // The pending release still fires; no further melody does
        let (melody, other) = run(&mut composer, &mut scheduler, 10_000);
        assert!(melody.is_empty());
        assert_eq!(other.len(), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn stale_ticks_are_dropped() {
        let mut composer = composer(0.0);
        let mut scheduler: Scheduler<ComposerCue> = Scheduler::new(SAMPLE_RATE);
        composer.compose("calm", &mut scheduler);
        let old = composer.generation();

        composer.compose("storm", &mut scheduler);
        assert_eq!(composer.tick(old, &mut scheduler), None);
    }

    #[test]
    fn recompose_keeps_a_single_loop() {
        let mut composer = composer(0.0);
        let mut scheduler = Scheduler::new(SAMPLE_RATE);
        composer.compose("calm", &mut scheduler);
        run(&mut composer, &mut scheduler, 1_000);

        composer.compose("storm", &mut scheduler);
        composer.compose("rain", &mut scheduler);
        assert_eq!(composer.mood(), Some("Rainy Day"));

        // Rain rhythm: 200 200 400 200 600, starting at 1000
        let (melody, _) = run(&mut composer, &mut scheduler, 2_199);
        assert_eq!(melody.len(), 5);
        let times: Vec<_> = melody.iter().map(|&(t, _)| t).collect();
        assert_eq!(times, vec![1_000, 1_200, 1_400, 1_800, 2_000]);
    }

    #[test]
    fn unknown_mood_is_ignored() {
        let mut composer = composer(0.0);
        let mut scheduler: Scheduler<ComposerCue> = Scheduler::new(SAMPLE_RATE);
        composer.compose("calm", &mut scheduler);

        assert!(!composer.compose("polka", &mut scheduler));
        assert_eq!(composer.mood(), Some("Calm"), "running composition is untouched");
    }

    #[test]
    fn same_seed_same_music() {
        let mut a = composer(0.5);
        let mut b = composer(0.5);
        let mut sa = Scheduler::new(SAMPLE_RATE);
        let mut sb = Scheduler::new(SAMPLE_RATE);
        a.compose("storm", &mut sa);
        b.compose("storm", &mut sb);

        assert_eq!(run(&mut a, &mut sa, 5_000), run(&mut b, &mut sb, 5_000));
    }
}
