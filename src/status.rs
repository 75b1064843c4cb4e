//! Status snapshots for display
//!
//! `PianoStatus` is `Copy` and allocation-free so the audio thread can hand it
//! to the UI through a ring buffer without touching the allocator. The UI only
//! cares about the newest snapshot, so receivers drain and keep the last one.

#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, RingBuffer};

use crate::keyboard::{Note, NOTE_COUNT};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PianoStatus {
    /// Bit i set when `Note::from_index(i)` is sounding
    pub active: u32,
    pub sustain: bool,
    /// Master volume, 0-100
    pub volume: f32,
    pub recording: bool,
    pub has_recording: bool,
    pub playing: bool,
    /// Display name of the running mood
    pub mood: Option<&'static str>,
    pub metronome: bool,
    pub bpm: f32,
    pub beat: u64,
    /// Timeline position
    pub time_ms: f64,
}

impl PianoStatus {
    pub fn mask(notes: impl IntoIterator<Item = Note>) -> u32 {
        notes
            .into_iter()
            .fold(0, |mask, note| mask | (1 << note.index()))
    }

    pub fn is_active(&self, note: Note) -> bool {
        self.active & (1 << note.index()) != 0
    }

    /// Sounding notes, lowest first
    pub fn active_notes(&self) -> impl Iterator<Item = Note> + '_ {
        (0..NOTE_COUNT)
            .filter_map(Note::from_index)
            .filter(|&note| self.is_active(note))
    }

    pub fn is_composing(&self) -> bool {
        self.mood.is_some()
    }
}

impl Default for PianoStatus {
    fn default() -> Self {
        Self {
            active: 0,
            sustain: false,
            volume: 70.0,
            recording: false,
            has_recording: false,
            playing: false,
            mood: None,
            metronome: false,
            bpm: 120.0,
            beat: 0,
            time_ms: 0.0,
        }
    }
}

/// Somewhere to publish snapshots. Publishing never blocks; a full sink drops.
pub trait StatusSink {
    fn publish(&mut self, status: PianoStatus) -> bool;
}

/// Somewhere to read snapshots from.
pub trait StatusReceiver {
    /// Drain pending snapshots, returning only the newest
    fn latest(&mut self) -> Option<PianoStatus>;
}

#[cfg(feature = "rtrb")]
impl StatusSink for Producer<PianoStatus> {
    fn publish(&mut self, status: PianoStatus) -> bool {
        self.push(status).is_ok()
    }
}

#[cfg(feature = "rtrb")]
impl StatusReceiver for Consumer<PianoStatus> {
    fn latest(&mut self) -> Option<PianoStatus> {
        let mut newest = None;
        while let Ok(status) = self.pop() {
            newest = Some(status);
        }
        newest
    }
}

/// Lock-free single-producer single-consumer status feed
#[cfg(feature = "rtrb")]
pub fn status_channel(capacity: usize) -> (Producer<PianoStatus>, Consumer<PianoStatus>) {
    RingBuffer::new(capacity.max(1))
}
