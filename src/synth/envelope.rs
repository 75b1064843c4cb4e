/*
Piano Envelope
==============

Amplitude shaping for a single tone. A struck string jumps up almost
instantly, falls back to a quieter ringing level, rings while the key (or the
sustain pedal) holds it, then dies away once released:

  Level
    1.0 ┐ ╱╲
        │╱  ╲______________
    S   │                  ╲
        │                   ╲
    0.0 └────────────────────╲──→ Time
        A  D     Sustain      R

Stages are counted in frames rather than stepping the level by a fixed
increment, so changing the sample rate never changes the shape.

A sustain level of zero makes the envelope one-shot: once decay finishes the
voice is done, no note-off required. The metronome click uses that.

Release always starts from the *current* level. Releasing halfway through the
attack fades from wherever the level got to instead of jumping.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

#[derive(Debug, Clone)]
pub struct Envelope {
    attack_frames: u32,
    decay_frames: u32,
    sustain_level: f32,
    release_frames: u32,

    stage: Stage,
    /// Frames spent in the current stage
    elapsed: u32,
    level: f32,
    /// Level at the moment release began
    release_from: f32,
}

impl Envelope {
    /// Build from times in seconds.
    pub fn new(sample_rate: f32, attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        let frames = |seconds: f32| (seconds.max(0.0) * sample_rate).round().max(1.0) as u32;

        Self {
            attack_frames: frames(attack),
            decay_frames: frames(decay),
            sustain_level: sustain.clamp(0.0, 1.0),
            release_frames: frames(release),
            stage: Stage::Idle,
            elapsed: 0,
            level: 0.0,
            release_from: 0.0,
        }
    }

    /// Struck piano string: fast attack, long ring, medium release.
    pub fn piano(sample_rate: f32) -> Self {
        Self::new(sample_rate, 0.005, 0.4, 0.45, 0.35)
    }

    /// Short percussive blip with no sustain.
    pub fn click(sample_rate: f32) -> Self {
        Self::new(sample_rate, 0.001, 0.04, 0.0, 0.005)
    }

    pub fn note_on(&mut self) {
        self.stage = Stage::Attack;
        self.elapsed = 0;
    }

    pub fn note_off(&mut self) {
        if matches!(self.stage, Stage::Idle | Stage::Release) {
            return;
        }
        self.release_from = self.level;
        self.stage = Stage::Release;
        self.elapsed = 0;
    }

    /// Advance one frame and return the new level.
    pub fn next_level(&mut self) -> f32 {
        self.elapsed = self.elapsed.saturating_add(1);

        match self.stage {
            Stage::Idle => self.level = 0.0,
            Stage::Attack => {
                self.level = (self.elapsed as f32 / self.attack_frames as f32).min(1.0);
                if self.elapsed >= self.attack_frames {
                    self.enter(Stage::Decay);
                }
            }
            Stage::Decay => {
                let progress = (self.elapsed as f32 / self.decay_frames as f32).min(1.0);
                self.level = 1.0 - (1.0 - self.sustain_level) * progress;
                if self.elapsed >= self.decay_frames {
                    if self.sustain_level <= 0.0 {
                        self.enter(Stage::Idle);
                    } else {
                        self.enter(Stage::Sustain);
                    }
                }
            }
            Stage::Sustain => self.level = self.sustain_level,
            Stage::Release => {
                let progress = (self.elapsed as f32 / self.release_frames as f32).min(1.0);
                self.level = self.release_from * (1.0 - progress);
                if self.elapsed >= self.release_frames {
                    self.enter(Stage::Idle);
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        self.elapsed = 0;
        if stage == Stage::Idle {
            self.level = 0.0;
        }
    }

    /// Still producing sound
    pub fn is_active(&self) -> bool {
        self.stage != Stage::Idle
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn level(&self) -> f32 {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn run(env: &mut Envelope, frames: usize) {
        for _ in 0..frames {
            env.next_level();
        }
    }

    #[test]
    fn attack_reaches_full_level() {
        let mut env = Envelope::new(SAMPLE_RATE, 0.01, 0.1, 0.5, 0.1);
        env.note_on();
        run(&mut env, 10);

        assert!((env.level() - 1.0).abs() < 1e-6);
        assert_eq!(env.stage(), Stage::Decay);
    }

    #[test]
    fn holds_sustain_until_released() {
        let mut env = Envelope::new(SAMPLE_RATE, 0.01, 0.05, 0.4, 0.1);
        env.note_on();
        run(&mut env, 500);

        assert_eq!(env.stage(), Stage::Sustain);
        assert!((env.level() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn release_fades_from_current_level() {
        let mut env = Envelope::new(SAMPLE_RATE, 0.1, 0.1, 0.5, 0.02);
        env.note_on();
        run(&mut env, 50); // halfway up the attack
        let before = env.level();

        env.note_off();
        let first = env.next_level();
        assert!(first < before && first > 0.0, "release starts where attack left off");

        run(&mut env, 20);
        assert!(!env.is_active());
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn zero_sustain_is_one_shot() {
        let mut env = Envelope::click(SAMPLE_RATE);
        env.note_on();
        run(&mut env, 100);

        assert!(!env.is_active(), "click should finish without note_off");
    }

    #[test]
    fn note_off_while_idle_is_ignored() {
        let mut env = Envelope::piano(SAMPLE_RATE);
        env.note_off();
        assert_eq!(env.stage(), Stage::Idle);
    }
}
