use saavy_piano::keyboard::notes::{A4, C4, E4, G4};
use saavy_piano::synth::{CaptureSynth, SynthCall};
use saavy_piano::{Notification, Piano, PianoConfig};

/// 1kHz timeline: one frame per millisecond
fn piano() -> Piano<CaptureSynth> {
    piano_with(PianoConfig::new(1_000.0).with_seed(3).with_volume(100.0))
}

fn piano_with(config: PianoConfig) -> Piano<CaptureSynth> {
    Piano::new(CaptureSynth::new(), config).expect("valid config")
}

fn starts(piano: &Piano<CaptureSynth>) -> Vec<(f32, f32)> {
    piano
        .synth()
        .calls()
        .iter()
        .filter_map(|call| match call {
            SynthCall::Start {
                frequency, gain, ..
            } => Some((*frequency, *gain)),
            _ => None,
        })
        .collect()
}

fn note_ons(notifications: &[Notification]) -> usize {
    notifications
        .iter()
        .filter(|n| matches!(n, Notification::NoteOn(_)))
        .count()
}

#[test]
fn pressing_a_note_twice_leaves_one_voice() {
    let mut piano = piano();
    piano.press(C4);
    piano.press(C4);

    assert_eq!(piano.active_notes(), vec![C4]);
    assert_eq!(piano.synth().sounding(), 1);
}

#[test]
fn sustain_holds_notes_until_released() {
    let mut piano = piano();
    piano.set_sustain(true);
    piano.press(C4);
    piano.release(C4);
    piano.press(E4);
    piano.release(E4);

    assert_eq!(piano.active_notes(), vec![C4, E4]);
    assert_eq!(piano.voices().held_notes(), vec![C4, E4]);

    piano.set_sustain(false);
    assert!(piano.active_notes().is_empty());
    assert_eq!(piano.synth().sounding(), 0);

    let offs: Vec<_> = piano
        .drain_notifications()
        .into_iter()
        .filter(|n| matches!(n, Notification::NoteOff(_)))
        .collect();
    assert_eq!(offs, vec![Notification::NoteOff(C4), Notification::NoteOff(E4)]);
}

#[test]
fn recording_plays_back_with_original_timing() {
    let mut piano = piano();
    piano.start_recording();
    piano.press(C4);
    piano.advance_ms(500.0);
    piano.release(C4);
    piano.stop_recording();

    let offsets: Vec<_> = piano.recorder().events().iter().map(|e| e.offset_ms).collect();
    assert_eq!(offsets, vec![0.0, 500.0]);

    piano.advance_ms(1_000.0);
    let handle = piano.play_recording().expect("something was recorded");

    piano.advance_ms(0.0);
    assert_eq!(piano.active_notes(), vec![C4]);

    piano.advance_ms(499.0);
    assert_eq!(piano.active_notes(), vec![C4], "not released early");
    assert!(!piano.is_playback_finished(&handle));

    piano.advance_ms(1.0);
    assert!(piano.active_notes().is_empty());
    assert!(piano.is_playback_finished(&handle));
    assert!(piano
        .drain_notifications()
        .contains(&Notification::PlaybackFinished));
}

#[test]
fn playback_survives_one_large_block() {
    let mut piano = piano();
    piano.start_recording();
    piano.press(C4);
    piano.advance_ms(100.0);
    piano.press(E4);
    piano.advance_ms(100.0);
    piano.press(G4);
    piano.advance_ms(300.0);
    for note in [C4, E4, G4] {
        piano.release(note);
    }

    let handle = piano.play_recording().expect("recorded");
    piano.advance_ms(10_000.0);

    assert!(piano.is_playback_finished(&handle));
    assert!(piano.active_notes().is_empty());
    assert_eq!(piano.synth().sounding(), 0);
}

#[test]
fn playback_with_nothing_recorded_is_a_no_op() {
    let mut piano = piano();
    assert!(piano.play_recording().is_none());
    assert!(piano.drain_notifications().is_empty());
}

#[test]
fn volume_applies_to_new_voices_only() {
    let mut piano = piano();
    piano.set_volume(50.0);
    piano.press(A4);
    assert_eq!(starts(&piano), vec![(440.0, 0.5)]);

    piano.set_volume(0.0);
    assert_eq!(piano.active_notes(), vec![A4], "A4 keeps playing");

    piano.press(C4);
    assert_eq!(starts(&piano)[1].1, 0.0);
}

#[test]
fn mood_text_picks_the_first_best_match() {
    let mut piano = piano();
    assert_eq!(piano.compose_from_text("I feel the rain and thunder"), "Rainy Day");
    assert_eq!(piano.status().mood, Some("Rainy Day"));

    assert_eq!(piano.compose_from_text("nothing in particular"), "Calm");
}

#[test]
fn recomposing_never_runs_two_loops() {
    let config = PianoConfig::new(1_000.0)
        .with_seed(11)
        .with_chord_probability(0.0);
    let mut piano = piano_with(config);

    piano.compose("hopeful");
    piano.compose("hopeful");
    piano.compose("hopeful");

    // Hopeful ticks at 0, 500, 1000, 1500, 2500, 3000, 3500
    piano.advance_ms(3_500.0);
    assert_eq!(note_ons(&piano.drain_notifications()), 7);
}

#[test]
fn stopping_the_composer_halts_future_notes() {
    let mut piano = piano();
    piano.compose("energetic");
    piano.advance_ms(1_000.0);

    piano.stop_composing();
    piano.drain_notifications();

    piano.advance_ms(10_000.0);
    assert_eq!(note_ons(&piano.drain_notifications()), 0);
    assert!(!piano.status().is_composing());
    assert!(
        piano.active_notes().is_empty(),
        "in-flight notes ring out and release on their own"
    );
}

#[test]
fn ascending_mood_plays_its_scale_in_order() {
    let config = PianoConfig::new(1_000.0).with_chord_probability(0.0);
    let mut piano = piano_with(config);
    piano.compose("hopeful");
    piano.advance_ms(1_500.0);

    let frequencies: Vec<_> = starts(&piano).into_iter().map(|(f, _)| f).collect();
    assert_eq!(frequencies, vec![261.63, 293.66, 329.63, 392.0]);
}

#[test]
fn unknown_inputs_are_tolerated() {
    let mut piano = piano();
    assert!(!piano.press_named("X4"));
    assert!(!piano.compose("bebop"));
    assert!(!piano.compose_by_index(42));
    assert!(piano.synth().calls().is_empty());
}

#[test]
fn metronome_runs_alongside_the_composer() {
    let mut piano = piano();
    piano.compose("calm");
    piano.start_metronome();
    piano.advance_ms(2_000.0);

    piano.stop_metronome();
    let clicks = piano.synth().clicks().len();
    assert_eq!(clicks, 5);
    assert!(piano.status().is_composing(), "stopping the metronome leaves the composer alone");

    piano.advance_ms(2_000.0);
    assert_eq!(piano.synth().clicks().len(), clicks);
}

#[test]
fn status_reflects_every_component() {
    let mut piano = piano();
    piano.press(E4);
    piano.set_sustain(true);
    piano.start_recording();
    piano.start_metronome();
    piano.set_bpm(90.0);

    let status = piano.status();
    assert!(status.is_active(E4));
    assert!(status.sustain);
    assert!(status.recording);
    assert!(status.metronome);
    assert_eq!(status.bpm, 90.0);
    assert_eq!(status.volume, 100.0);
}
