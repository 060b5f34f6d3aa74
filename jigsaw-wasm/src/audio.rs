use wasm_bindgen::JsValue;
use web_sys::{AudioContext, AudioContextState, OscillatorType};

use crate::utils::log;

/// Owns the lazily created `AudioContext`. Browsers refuse to start audio
/// before a user gesture, so the context is first created from inside the
/// drop handler; creation failure leaves the game silent.
pub struct SnapAudio {
    ctx: Option<AudioContext>,
}

impl SnapAudio {
    pub fn new() -> Self {
        Self { ctx: None }
    }

    /// Short confirmation beep for a successful placement.
    pub fn play_snap(&mut self) {
        if self.ctx.is_none() {
            self.ctx = AudioContext::new().ok();
        }
        let Some(ctx) = &self.ctx else {
            return;
        };
        if ctx.state() == AudioContextState::Suspended {
            let _ = ctx.resume();
        }
        if let Err(e) = beep(ctx) {
            log(&format!("snap sound failed: {e:?}"));
        }
    }
}

fn beep(ctx: &AudioContext) -> Result<(), JsValue> {
    let osc = ctx.create_oscillator()?;
    let gain = ctx.create_gain()?;
    osc.set_type(OscillatorType::Sine);
    osc.frequency().set_value(800.0);
    gain.gain().set_value(0.1);
    osc.connect_with_audio_node(&gain)?;
    gain.connect_with_audio_node(&ctx.destination())?;
    let t = ctx.current_time();
    osc.start()?;
    osc.stop_with_when(t + 0.1)?;
    Ok(())
}
