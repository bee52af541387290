//! Audio cues using the Web Audio API
//!
//! Procedurally generated tones, no sound files. Every Web Audio call is
//! allowed to fail silently: a missing or blocked audio context never
//! affects the games.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::sim::SoundCue;

/// Plays simulator sound cues
pub struct AudioManager {
    ctx: Option<AudioContext>,
    volume: f32,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            volume: 0.6,
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Play every cue in order
    pub fn play_all(&self, cues: &[SoundCue]) {
        for &cue in cues {
            self.play(cue);
        }
    }

    pub fn play(&self, cue: SoundCue) {
        if self.volume <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };

        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        let vol = self.volume;
        match cue {
            SoundCue::Jump => self.play_jump(ctx, vol),
            SoundCue::FoodEaten => self.play_food(ctx, vol),
            SoundCue::GameOver => self.play_game_over(ctx, vol),
            SoundCue::CardRevealed => self.play_reveal(ctx, vol),
            SoundCue::Victory => self.play_victory(ctx, vol),
        }
    }

    /// Oscillator routed through a gain node to the output
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Short upward chirp
    fn play_jump(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 300.0, OscillatorType::Square) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.15, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.12)
            .ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(700.0, t + 0.1)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.15).ok();
    }

    /// Two quick blips
    fn play_food(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [660.0, 880.0].iter().enumerate() {
            let t = ctx.current_time() + i as f64 * 0.06;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Sine) {
                gain.gain().set_value_at_time(vol * 0.3, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.1)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.12).ok();
            }
        }
    }

    /// Sad descending steps
    fn play_game_over(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [400.0, 350.0, 300.0, 200.0].iter().enumerate() {
            let t = ctx.current_time() + i as f64 * 0.2;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Sine) {
                gain.gain().set_value_at_time(vol * 0.3, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.4).ok();
            }
        }
    }

    /// Bright arpeggio
    fn play_reveal(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [523.0, 659.0, 784.0].iter().enumerate() {
            let t = ctx.current_time() + i as f64 * 0.08;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Triangle) {
                gain.gain().set_value_at_time(vol * 0.25, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.25)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.3).ok();
            }
        }
    }

    /// Celebratory fanfare
    fn play_victory(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [523.0, 659.0, 784.0, 1047.0, 784.0, 1047.0].iter().enumerate() {
            let t = ctx.current_time() + i as f64 * 0.12;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Triangle) {
                gain.gain().set_value_at_time(vol * 0.3, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.35)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.4).ok();
            }
        }
    }
}
