//! Audio side - cpal output stream driving the piano clock

use std::sync::{Arc, Mutex};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{error, info};
use rtrb::{Consumer, PushError, RingBuffer};

use saavy_piano::{
    status::{status_channel, StatusSink},
    synth::ToneSynth,
    Piano, PianoConfig, PianoStatus, MAX_BLOCK_SIZE,
};

/// Scope window shown by the UI
pub const SCOPE_LEN: usize = 1024;
/// Capacity in scope windows for the audio→UI ring
const SCOPE_RING_BLOCKS: usize = 16;
const STATUS_RING_LEN: usize = 32;

pub type SharedPiano = Arc<Mutex<Piano<ToneSynth>>>;

/// Receiving ends of the audio→UI feeds
pub struct Feeds {
    pub scope: Consumer<f32>,
    pub status: Consumer<PianoStatus>,
}

/// Owns the output stream. Dropping it stops audio.
pub struct AudioApp {
    piano: SharedPiano,
    _stream: cpal::Stream,
}

impl AudioApp {
    pub fn start(config: PianoConfig) -> EyreResult<(Self, Feeds)> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let stream_config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = stream_config.sample_rate().0 as f32;
        let channels = stream_config.channels() as usize;
        info!("audio output: {} Hz, {} channels", sample_rate, channels);

        let config = PianoConfig {
            sample_rate,
            ..config
        };
        let piano = Piano::new(ToneSynth::new(sample_rate), config)
            .wrap_err("invalid piano configuration")?;
        let piano: SharedPiano = Arc::new(Mutex::new(piano));

        let (mut scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_LEN * SCOPE_RING_BLOCKS);
        let (mut status_tx, status_rx) = status_channel(STATUS_RING_LEN);

        let shared = piano.clone();
        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device
            .build_output_stream(
                &stream_config.into(),
                move |data: &mut [f32], _| {
                    let Ok(mut piano) = shared.lock() else {
                        data.fill(0.0);
                        return;
                    };

                    let total_frames = data.len() / channels;
                    let mut frames_written = 0;

                    while frames_written < total_frames {
                        let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);

                        // Fire everything due in this block, then render it
                        piano.advance(frames_to_render as u64);
                        let block = &mut render_buf[..frames_to_render];
                        piano.synth_mut().render(block);

                        // Mono to all channels
                        let out_off = frames_written * channels;
                        for (i, &s) in block.iter().enumerate() {
                            for ch in 0..channels {
                                data[out_off + i * channels + ch] = s;
                            }
                        }

                        // Feed the scope; drop the rest of the block if the UI is behind
                        for &s in block.iter() {
                            if let Err(PushError::Full(_)) = scope_tx.push(s) {
                                break;
                            }
                        }

                        frames_written += frames_to_render;
                    }

                    status_tx.publish(piano.status());
                },
                |err| error!("audio stream error: {}", err),
                None,
            )
            .wrap_err("failed to build output stream")?;

        stream.play().wrap_err("failed to start output stream")?;

        let feeds = Feeds {
            scope: scope_rx,
            status: status_rx,
        };
        Ok((
            Self {
                piano,
                _stream: stream,
            },
            feeds,
        ))
    }

    pub fn piano(&self) -> SharedPiano {
        self.piano.clone()
    }

    /// Silence every source before the stream goes away.
    pub fn shutdown(self) {
        if let Ok(mut piano) = self.piano.lock() {
            piano.all_notes_off();
        }
        info!("audio stopped");
    }
}
