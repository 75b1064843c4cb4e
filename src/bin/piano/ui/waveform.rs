//! Waveform oscilloscope widget

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

/// Render the output scope, downsampled to the widget width
pub fn render_waveform(frame: &mut Frame, area: Rect, scope: &[f32]) {
    let peak = scope.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
    let block = Block::default()
        .title(format!(" Output  peak {:.2} ", peak))
        .borders(Borders::ALL);

    let width = area.width.max(1) as usize;
    let step = scope.len().div_ceil(width).max(1);
    let data: Vec<(f64, f64)> = scope
        .iter()
        .step_by(step)
        .enumerate()
        .map(|(i, &sample)| ((i * step) as f64, sample as f64))
        .collect();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(if peak > 0.99 { Color::Red } else { Color::Cyan }))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, scope.len().max(1) as f64])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-1.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
