//! piano - play the terminal like a keyboard
//!
//! Run with: cargo run --bin piano
//!
//! Logs go to `piano.log` (set RUST_LOG=debug for more detail).

mod app;
mod ui;

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use saavy_piano::PianoConfig;

use app::AudioApp;
use ui::UiApp;

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    init_logging()?;

    let (audio, feeds) = AudioApp::start(PianoConfig::default())?;

    let mut terminal = ratatui::init();
    let mut ui = UiApp::new(audio.piano(), feeds);
    let result = ui.run(&mut terminal);
    ratatui::restore();

    // Let nothing ring on after the stream is dropped
    audio.shutdown();
    result
}

fn init_logging() -> EyreResult<()> {
    let file = std::fs::File::create("piano.log").wrap_err("failed to create piano.log")?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}
