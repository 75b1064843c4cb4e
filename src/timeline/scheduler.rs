/*
Timeline Scheduler
==================

Everything that happens "later" in the piano goes through one scheduler:
recorded events waiting for their playback offset, the composer's next tick,
a chord note delayed behind the melody, the metronome's next click. The
scheduler is a single cooperative event loop - nothing runs on its own thread.

Time
----

The clock counts sample frames. The audio callback renders N frames, then
advances the clock by N, so every deadline lands on the block it belongs to.
Milliseconds are converted at the edges:

    frames = round(ms * sample_rate / 1000)

At 48kHz one frame is ~0.02ms, far below anything audible as timing jitter.
Tests run at 1kHz so that one frame is exactly one millisecond.

Ordering
--------

Deadlines are keyed by (frame, sequence number). Two events due on the same
frame fire in the order they were scheduled. Popping an event moves `now` to
that event's deadline, so anything it schedules is relative to when it was
*due*, not when the block happened to be processed:

    tick @ 1000 ──schedule_in(500)──→ next tick @ 1500   (never 1500 + block)

That is what keeps self-rescheduling loops drift-free.

Cancellation
------------

`schedule_*` returns a `TimerHandle`. Cancelling removes exactly that entry;
there is no global "cancel everything" token. A handle that already fired or
was cancelled is simply not found.
*/

use std::collections::{BTreeMap, HashMap};

/// Handle to one pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// A timer that has come due.
#[derive(Debug)]
pub struct Due<E> {
    pub handle: TimerHandle,
    /// Frame the timer was scheduled for
    pub deadline: u64,
    pub event: E,
}

pub struct Scheduler<E> {
    sample_rate: f32,
    /// Current position in frames
    now: u64,
    next_id: u64,
    /// Pending events keyed by (deadline, id)
    queue: BTreeMap<(u64, u64), E>,
    /// id → deadline, for cancellation
    deadlines: HashMap<u64, u64>,
}

impl<E> Scheduler<E> {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            now: 0,
            next_id: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Current position in frames
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Current position in milliseconds
    pub fn now_ms(&self) -> f64 {
        self.frames_to_ms(self.now)
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn ms_to_frames(&self, ms: f64) -> u64 {
        (ms.max(0.0) * self.sample_rate as f64 / 1000.0).round() as u64
    }

    pub fn frames_to_ms(&self, frames: u64) -> f64 {
        frames as f64 * 1000.0 / self.sample_rate as f64
    }

    /// Schedule `event` at an absolute frame. Past frames fire on the next pop.
    pub fn schedule_at(&mut self, frame: u64, event: E) -> TimerHandle {
        let deadline = frame.max(self.now);
        let id = self.next_id;
        self.next_id += 1;

        self.queue.insert((deadline, id), event);
        self.deadlines.insert(id, deadline);
        TimerHandle(id)
    }

    /// Schedule `event` `ms` milliseconds from now.
    pub fn schedule_in(&mut self, ms: f64, event: E) -> TimerHandle {
        let frame = self.now + self.ms_to_frames(ms);
        self.schedule_at(frame, event)
    }

    /// Cancel a pending timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.deadlines.remove(&handle.0) {
            Some(deadline) => self.queue.remove(&(deadline, handle.0)).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(&handle.0)
    }

    /// Number of timers waiting to fire
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.keys().next().map(|&(deadline, _)| deadline)
    }

    /// Pop the earliest timer due at or before `until`, moving `now` to its deadline.
    pub fn pop_due(&mut self, until: u64) -> Option<Due<E>> {
        let &(deadline, _) = self.queue.keys().next()?;
        if deadline > until {
            return None;
        }

        let ((deadline, id), event) = self.queue.pop_first()?;
        self.deadlines.remove(&id);
        self.now = self.now.max(deadline);

        Some(Due {
            handle: TimerHandle(id),
            deadline,
            event,
        })
    }

    /// Move the clock forward. The clock never runs backwards.
    pub fn set_now(&mut self, frame: u64) {
        self.now = self.now.max(frame);
    }
}
