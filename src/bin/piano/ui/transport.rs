//! Transport bar widget - sustain, volume, recorder, composer and metronome state

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use saavy_piano::PianoStatus;

/// Render the transport bar
pub fn render_transport(frame: &mut Frame, area: Rect, status: &PianoStatus, releases: bool) {
    let block = Block::default()
        .title(" saavy piano ")
        .borders(Borders::ALL);

    let (record_symbol, record_color) = if status.recording {
        ("● REC", Color::Red)
    } else if status.playing {
        ("▶ PLAY", Color::Green)
    } else if status.has_recording {
        ("■ take", Color::White)
    } else {
        ("■ empty", Color::DarkGray)
    };

    let sustain = match (status.sustain, releases) {
        (true, _) => "Pedal ▼",
        (false, true) => "Pedal",
        (false, false) => "Pedal (toggle)",
    };

    let metronome = if status.metronome {
        // Beat within the bar, 1-4
        let beat = (status.beat + 3) % 4 + 1;
        format!("♩ {:.0} bpm [{}]", status.bpm, beat)
    } else {
        format!("♩ {:.0} bpm", status.bpm)
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" Vol: {:.0}%  ", status.volume),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("{}  ", sustain),
            Style::default().fg(if status.sustain {
                Color::Yellow
            } else {
                Color::DarkGray
            }),
        ),
        Span::styled(
            format!("{}  ", record_symbol),
            Style::default().fg(record_color),
        ),
        Span::styled(
            format!("{}  ", status.mood.unwrap_or("no composition")),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(
            format!("{}  ", metronome),
            Style::default().fg(if status.metronome {
                Color::Green
            } else {
                Color::DarkGray
            }),
        ),
        Span::styled(
            format!("{:.1}s", status.time_ms / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let paragraph = Paragraph::new(line).block(block);
    frame.render_widget(paragraph, area);
}
