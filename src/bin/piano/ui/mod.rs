//! TUI for the piano
//!
//! Draws the keyboard, the transport bar and an oscilloscope, and turns
//! terminal key events into piano calls.
//!
//! Terminals that support the kitty keyboard protocol report key releases, so
//! notes sound for as long as the key is held and the space bar works as a
//! real pedal. Elsewhere every note is released automatically after a short
//! hold and the space bar toggles sustain.

mod keyboard;
mod transport;
mod waveform;

use std::collections::{HashMap, VecDeque};
use std::io::stdout;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use log::{debug, warn};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use saavy_piano::{
    keyboard::{Action, InputRouter, Routed},
    status::StatusReceiver,
    synth::ToneSynth,
    Note, Notification, Piano, PianoStatus,
};

use crate::app::{Feeds, SharedPiano, SCOPE_LEN};

use keyboard::render_keyboard;
use transport::render_transport;
use waveform::render_waveform;

/// How long a note sounds when the terminal cannot report key releases
const AUTO_RELEASE: Duration = Duration::from_millis(250);
const VOLUME_STEP: f32 = 5.0;
const BPM_STEP: f32 = 5.0;
/// Notification lines kept for the message bar
const MESSAGE_HISTORY: usize = 3;

enum Mode {
    Play,
    /// Typing a mood description
    Prompt(String),
}

pub struct UiApp {
    piano: SharedPiano,
    feeds: Feeds,
    router: InputRouter,
    status: PianoStatus,
    scope: Vec<f32>,
    mode: Mode,
    /// Whether the terminal reports key release events
    releases: bool,
    /// Notes waiting for their automatic release
    auto_release: HashMap<Note, Instant>,
    messages: VecDeque<String>,
    should_quit: bool,
}

impl UiApp {
    pub fn new(piano: SharedPiano, feeds: Feeds) -> Self {
        Self {
            piano,
            feeds,
            router: InputRouter::new(),
            status: PianoStatus::default(),
            scope: vec![0.0; SCOPE_LEN],
            mode: Mode::Play,
            releases: false,
            auto_release: HashMap::new(),
            messages: VecDeque::with_capacity(MESSAGE_HISTORY + 1),
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        self.releases = crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
        if self.releases {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        } else {
            warn!("terminal does not report key releases; notes auto-release");
        }

        let result = self.event_loop(terminal);

        if self.releases {
            execute!(stdout(), PopKeyboardEnhancementFlags)?;
        }
        result
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_scope();
            self.poll_status();
            self.poll_notifications();
            self.expire_auto_releases();

            terminal.draw(|frame| self.render(frame))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    fn poll_scope(&mut self) {
        let mut fresh = Vec::new();
        while let Ok(sample) = self.feeds.scope.pop() {
            fresh.push(sample);
        }

        if !fresh.is_empty() {
            self.scope.extend(fresh);
            if self.scope.len() > SCOPE_LEN {
                let excess = self.scope.len() - SCOPE_LEN;
                self.scope.drain(0..excess);
            }
        }
    }

    fn poll_status(&mut self) {
        if let Some(status) = self.feeds.status.latest() {
            self.status = status;
        }
    }

    fn poll_notifications(&mut self) {
        let notifications = match self.piano.lock() {
            Ok(mut piano) => piano.drain_notifications(),
            Err(_) => return,
        };

        for notification in notifications {
            if let Some(message) = describe(notification) {
                self.push_message(message);
            }
        }
    }

    fn push_message(&mut self, message: String) {
        if self.messages.len() == MESSAGE_HISTORY {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    fn expire_auto_releases(&mut self) {
        if self.auto_release.is_empty() {
            return;
        }

        let now = Instant::now();
        let due: Vec<Note> = self
            .auto_release
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(&note, _)| note)
            .collect();

        for note in due {
            self.auto_release.remove(&note);
            self.with_piano(|piano| piano.release(note));
        }
    }

    fn with_piano(&self, f: impl FnOnce(&mut Piano<ToneSynth>)) {
        if let Ok(mut piano) = self.piano.lock() {
            f(&mut piano);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if let Mode::Prompt(_) = self.mode {
            if key.kind != KeyEventKind::Release {
                self.handle_prompt_key(key.code);
            }
            return;
        }

        if key.code == KeyCode::Esc {
            self.should_quit = true;
            return;
        }

        let KeyCode::Char(c) = key.code else {
            return;
        };
        let Some(routed) = self.router.route(c) else {
            return;
        };

        match (routed, key.kind) {
            (Routed::Note(note), KeyEventKind::Press) => {
                self.with_piano(|piano| piano.press(note));
                if !self.releases {
                    self.auto_release.insert(note, Instant::now() + AUTO_RELEASE);
                }
            }
            (Routed::Note(note), KeyEventKind::Release) => {
                self.with_piano(|piano| piano.release(note));
            }
            (Routed::Action(Action::Sustain), KeyEventKind::Press) if self.releases => {
                self.with_piano(|piano| piano.set_sustain(true));
            }
            (Routed::Action(Action::Sustain), KeyEventKind::Release) => {
                self.with_piano(|piano| piano.set_sustain(false));
            }
            (Routed::Action(action), KeyEventKind::Press) => self.handle_action(action),
            // Key repeat and stray releases
            _ => {}
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Sustain => self.with_piano(|piano| piano.toggle_sustain()),
            Action::ToggleRecording => self.with_piano(|piano| piano.toggle_recording()),
            Action::PlayRecording => self.with_piano(|piano| {
                if piano.play_recording().is_none() {
                    debug!("nothing recorded yet");
                }
            }),
            Action::ToggleMetronome => self.with_piano(|piano| piano.toggle_metronome()),
            Action::StopComposing => self.with_piano(|piano| piano.stop_composing()),
            Action::VolumeDown => self.with_piano(|piano| piano.adjust_volume(-VOLUME_STEP)),
            Action::VolumeUp => self.with_piano(|piano| piano.adjust_volume(VOLUME_STEP)),
            Action::BpmDown => self.with_piano(|piano| piano.adjust_bpm(-BPM_STEP)),
            Action::BpmUp => self.with_piano(|piano| piano.adjust_bpm(BPM_STEP)),
            Action::ComposeMood(index) => self.with_piano(|piano| {
                piano.compose_by_index(index);
            }),
            Action::MoodPrompt => self.mode = Mode::Prompt(String::new()),
        }
    }

    fn handle_prompt_key(&mut self, code: KeyCode) {
        let Mode::Prompt(text) = &mut self.mode else {
            return;
        };

        match code {
            KeyCode::Char(c) => text.push(c),
            KeyCode::Backspace => {
                text.pop();
            }
            KeyCode::Esc => self.mode = Mode::Play,
            KeyCode::Enter => {
                let text = std::mem::take(text);
                self.mode = Mode::Play;
                self.with_piano(|piano| {
                    piano.compose_from_text(&text);
                });
            }
            _ => {}
        }
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Transport bar
                Constraint::Min(8),    // Keyboard
                Constraint::Length(8), // Waveform
                Constraint::Length(3), // Messages
                Constraint::Length(1), // Help / prompt
            ])
            .split(frame.area());

        render_transport(frame, chunks[0], &self.status, self.releases);
        render_keyboard(frame, chunks[1], &self.status, &self.router);
        render_waveform(frame, chunks[2], &self.scope);

        let lines: Vec<Line> = self
            .messages
            .iter()
            .map(|m| Line::from(Span::styled(m.as_str(), Style::default().fg(Color::Gray))))
            .collect();
        frame.render_widget(Paragraph::new(lines), chunks[3]);

        let bottom = match &self.mode {
            Mode::Prompt(text) => Paragraph::new(format!(" Mood> {}_", text))
                .style(Style::default().fg(Color::Yellow)),
            Mode::Play => Paragraph::new(
                " [Space] Sustain  [Z] Rec  [X] Play  [C] Click  [1-0] Mood  [/] Describe  [V] Stop  [ [ ] ] Vol  [ , . ] BPM  [Esc] Quit",
            )
            .style(Style::default().fg(Color::DarkGray)),
        };
        frame.render_widget(bottom, chunks[4]);
    }
}

/// One-line description of a notification worth showing.
fn describe(notification: Notification) -> Option<String> {
    let message = match notification {
        Notification::RecordingStarted => "● Recording".to_string(),
        Notification::RecordingStopped { events } => format!("Recorded {} events", events),
        Notification::PlaybackStarted { duration_ms } => {
            format!("▶ Playing back ({:.1}s)", duration_ms / 1000.0)
        }
        Notification::PlaybackFinished => "Playback finished".to_string(),
        Notification::CompositionStarted { mood } => format!("♪ Composing: {}", mood),
        Notification::CompositionStopped => "Composition stopped".to_string(),
        Notification::MetronomeStarted { bpm } => format!("Metronome on ({:.0} bpm)", bpm),
        Notification::MetronomeStopped => "Metronome off".to_string(),
        Notification::NoteOn(_)
        | Notification::NoteOff(_)
        | Notification::SustainChanged(_)
        | Notification::VolumeChanged(_)
        | Notification::MetronomeTick { .. } => return None,
    };
    Some(message)
}
