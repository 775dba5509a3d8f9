//! Audio: combo chimes and background music
//!
//! Chimes come from `sound/001.mp3`..`sound/005.mp3`; if a clip failed to
//! load a short oscillator arpeggio stands in. Nothing plays until the first
//! user gesture has initialised the audio context.

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Merge/clear chime for combo level 1..=5
    Combo(u8),
}

impl SoundEffect {
    /// Sound to play for an engine event, if any
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::ComboSound { level } if *level > 0 => Some(SoundEffect::Combo(*level)),
            _ => None,
        }
    }
}

/// C major pentatonic, one note per combo level
const CHIME_SCALE: [f32; 5] = [523.25, 587.33, 659.25, 783.99, 880.0];

/// Notes of the fallback arpeggio: one more note per combo level
pub fn chime_notes(level: u8) -> &'static [f32] {
    let n = (level as usize).clamp(1, CHIME_SCALE.len());
    &CHIME_SCALE[..n]
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioSubsystem;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::collections::HashMap;

    use web_sys::{AudioContext, GainNode, HtmlAudioElement, OscillatorNode, OscillatorType};

    use super::{SoundEffect, chime_notes};
    use crate::assets::{self, MAX_COMBO_SOUND, asset_url};
    use crate::settings::Settings;

    /// Audio for the game
    pub struct AudioSubsystem {
        ctx: Option<AudioContext>,
        combo_clips: HashMap<u8, HtmlAudioElement>,
        bgm: Option<HtmlAudioElement>,
        sfx_gain: f32,
        music_gain: f32,
        bgm_playing: bool,
    }

    impl AudioSubsystem {
        pub fn new(settings: &Settings) -> Self {
            let mut combo_clips = HashMap::new();
            for level in 1..=MAX_COMBO_SOUND {
                let Some(path) = assets::combo_sound(level) else {
                    continue;
                };
                match HtmlAudioElement::new_with_src(&asset_url(&path)) {
                    Ok(el) => {
                        combo_clips.insert(level, el);
                    }
                    Err(e) => log::warn!("Failed to load audio at {}: {:?}", path, e),
                }
            }
            let bgm = HtmlAudioElement::new_with_src(&asset_url(assets::BGM))
                .map_err(|e| log::warn!("Failed to load BGM: {:?}", e))
                .ok();

            let mut audio = Self {
                ctx: None,
                combo_clips,
                bgm,
                sfx_gain: 0.0,
                music_gain: 0.0,
                bgm_playing: false,
            };
            audio.apply_settings(settings);
            audio
        }

        /// Create/resume the audio context. Call from a user-gesture
        /// handler; repeat calls are cheap no-ops.
        pub fn initialize(&mut self) {
            if let Some(ctx) = &self.ctx {
                if ctx.state() == web_sys::AudioContextState::Suspended {
                    let _ = ctx.resume();
                }
                return;
            }
            // May fail outside a secure context
            self.ctx = AudioContext::new().ok();
            if self.ctx.is_none() {
                log::warn!("Failed to create AudioContext - chime fallback disabled");
            }
            log::info!("Audio initialized");
        }

        pub fn is_initialized(&self) -> bool {
            self.ctx.is_some()
        }

        pub fn is_bgm_playing(&self) -> bool {
            self.bgm_playing
        }

        pub fn apply_settings(&mut self, settings: &Settings) {
            self.sfx_gain = settings.sfx_gain();
            self.music_gain = settings.music_gain();
            if let Some(bgm) = &self.bgm {
                bgm.set_volume(self.music_gain as f64);
            }
        }

        /// Play a sound effect
        pub fn play(&self, effect: SoundEffect) {
            if !self.is_initialized() || self.sfx_gain <= 0.0 {
                return;
            }
            match effect {
                SoundEffect::Combo(level) => self.play_combo(level),
            }
        }

        /// Restart the music from the top
        pub fn play_bgm(&mut self) {
            let Some(bgm) = &self.bgm else { return };
            let _ = bgm.pause();
            bgm.set_current_time(0.0);
            bgm.set_volume(self.music_gain as f64);
            if let Err(e) = bgm.play() {
                log::warn!("Error playing BGM: {:?}", e);
                return;
            }
            self.bgm_playing = true;
        }

        pub fn stop_bgm(&mut self) {
            if let Some(bgm) = &self.bgm {
                let _ = bgm.pause();
                bgm.set_current_time(0.0);
            }
            self.bgm_playing = false;
        }

        fn play_combo(&self, level: u8) {
            let level = level.min(MAX_COMBO_SOUND);
            if let Some(clip) = self.combo_clips.get(&level) {
                clip.set_current_time(0.0);
                clip.set_volume(self.sfx_gain as f64);
                if clip.play().is_ok() {
                    return;
                }
            }
            if let Some(ctx) = &self.ctx {
                self.play_chime(ctx, level, self.sfx_gain);
            }
        }

        // === Sound generators ===

        /// Create an oscillator with gain envelope
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

        /// Combo chime - rising arpeggio, longer at higher levels
        fn play_chime(&self, ctx: &AudioContext, level: u8, vol: f32) {
            for (i, freq) in chime_notes(level).iter().enumerate() {
                let delay = i as f64 * 0.07;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Triangle) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.25, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.2)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.25).ok();
                }
            }
        }
    }
}
