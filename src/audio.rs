//! Sound cues
//!
//! The simulation only names cue categories. The browser build plays them as
//! procedurally generated Web Audio blips; other targets stay silent.

/// Cue categories emitted by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    /// Player fired
    Shoot,
    /// Enemy hit but survived
    Hit,
    /// Player hit but survived
    Hurt,
    /// Enemy destroyed
    Kill,
    /// Player destroyed
    Death,
    /// Heart collected
    Heal,
    /// Buff collected
    PowerUp,
}

/// Anything that can voice a cue
pub trait CuePlayer {
    /// `volume` is the 0..=100 slider value
    fn play(&self, cue: Cue, enabled: bool, volume: u8);
}

/// Output gain for the sound toggle and slider (0.0 - 1.0)
pub fn cue_gain(enabled: bool, volume: u8) -> f32 {
    if !enabled {
        return 0.0;
    }
    f32::from(volume.min(100)) / 100.0
}

/// Player for headless runs
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayer;

impl CuePlayer for SilentPlayer {
    fn play(&self, cue: Cue, enabled: bool, volume: u8) {
        if cue_gain(enabled, volume) > 0.0 {
            log::trace!("cue {:?}", cue);
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, AudioContextState, GainNode, OscillatorNode, OscillatorType};

    use super::{Cue, CuePlayer, cue_gain};

    /// Web Audio cue player
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master_volume: f32,
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
                master_volume: 0.8,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

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

        /// Single decaying tone, optionally sliding to `end_freq`
        fn blip(&self, ctx: &AudioContext, vol: f32, osc_type: OscillatorType, freq: f32, end_freq: f32, secs: f64) {
            let Some((osc, gain)) = self.create_osc(ctx, freq, osc_type) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + secs)
                .ok();
            if end_freq != freq {
                osc.frequency().set_value_at_time(freq, t).ok();
                osc.frequency()
                    .exponential_ramp_to_value_at_time(end_freq, t + secs)
                    .ok();
            }

            osc.start().ok();
            osc.stop_with_when(t + secs + 0.05).ok();
        }

        /// Rising arpeggio
        fn chime(&self, ctx: &AudioContext, vol: f32, freqs: &[f32]) {
            for (i, freq) in freqs.iter().enumerate() {
                let delay = i as f64 * 0.08;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Sine) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.15)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.2).ok();
                }
            }
        }
    }

    impl CuePlayer for AudioManager {
        fn play(&self, cue: Cue, enabled: bool, volume: u8) {
            let vol = self.master_volume * cue_gain(enabled, volume);
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            // Browsers start the context suspended until a user gesture
            if ctx.state() == AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match cue {
                Cue::Shoot => self.blip(ctx, vol * 0.15, OscillatorType::Square, 900.0, 300.0, 0.06),
                Cue::Hit => self.blip(ctx, vol * 0.3, OscillatorType::Triangle, 300.0, 300.0, 0.08),
                Cue::Hurt => self.blip(ctx, vol * 0.4, OscillatorType::Sawtooth, 220.0, 110.0, 0.15),
                Cue::Kill => {
                    self.blip(ctx, vol * 0.5, OscillatorType::Sawtooth, 100.0, 30.0, 0.4);
                    self.blip(ctx, vol * 0.2, OscillatorType::Square, 1500.0, 1500.0, 0.1);
                }
                Cue::Death => self.blip(ctx, vol * 0.6, OscillatorType::Sawtooth, 300.0, 20.0, 0.9),
                Cue::Heal => self.chime(ctx, vol * 0.25, &[600.0, 800.0, 1000.0]),
                Cue::PowerUp => self.chime(ctx, vol * 0.3, &[400.0, 500.0, 600.0, 800.0]),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_follows_toggle_and_slider() {
        assert_eq!(cue_gain(false, 100), 0.0);
        assert_eq!(cue_gain(true, 0), 0.0);
        assert_eq!(cue_gain(true, 50), 0.5);
        assert_eq!(cue_gain(true, 255), 1.0);
    }
}
