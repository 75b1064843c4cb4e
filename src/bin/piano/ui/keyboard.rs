//! Keyboard widget - two rows of keys, lit while sounding

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use saavy_piano::{keyboard::InputRouter, Note, PianoStatus};

/// Columns per white key
const KEY_WIDTH: usize = 6;

/// Render the keyboard, black keys above white keys, each with its typing key
pub fn render_keyboard(frame: &mut Frame, area: Rect, status: &PianoStatus, router: &InputRouter) {
    let block = Block::default()
        .title(" Keyboard ")
        .borders(Borders::ALL);

    let whites: Vec<Note> = Note::ALL.iter().copied().filter(|n| !n.is_sharp()).collect();

    // Black keys sit between white keys, offset by half a key
    let half = " ".repeat(KEY_WIDTH / 2);
    let mut black_names = vec![Span::raw(half.clone())];
    let mut black_keys = vec![Span::raw(half)];
    for white in &whites {
        let sharp = Note::from_index(white.index() + 1).filter(|n| n.is_sharp());
        match sharp {
            Some(note) => {
                let style = key_style(status.is_active(note), Color::DarkGray);
                black_names.push(Span::styled(format!("{:^w$}", note.name(), w = KEY_WIDTH), style));
                black_keys.push(label(router, note));
            }
            None => {
                black_names.push(Span::raw(" ".repeat(KEY_WIDTH)));
                black_keys.push(Span::raw(" ".repeat(KEY_WIDTH)));
            }
        }
    }

    let mut white_names = Vec::with_capacity(whites.len());
    let mut white_keys = Vec::with_capacity(whites.len());
    for &note in &whites {
        let style = key_style(status.is_active(note), Color::Gray);
        white_names.push(Span::styled(format!("{:^w$}", note.name(), w = KEY_WIDTH), style));
        white_keys.push(label(router, note));
    }

    let lines = vec![
        Line::from(black_names),
        Line::from(black_keys),
        Line::default(),
        Line::from(white_names),
        Line::from(white_keys),
    ];

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

fn key_style(active: bool, idle: Color) -> Style {
    if active {
        Style::default()
            .fg(Color::Black)
            .bg(Color::LightYellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Black).bg(idle)
    }
}

fn label(router: &InputRouter, note: Note) -> Span<'static> {
    let key = router.key_for(note).map(|k| k.to_ascii_uppercase()).unwrap_or(' ');
    Span::styled(
        format!("{:^w$}", key, w = KEY_WIDTH),
        Style::default().fg(Color::DarkGray),
    )
}
