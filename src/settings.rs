//! Player settings and preferences
//!
//! Persisted separately from the high score cache in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::platform::storage;

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Background music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Silence everything
    pub muted: bool,

    // === Effects ===
    /// Celebratory video overlays
    pub overlays: bool,

    // === HUD ===
    /// Show the session timer
    pub show_timer: bool,

    // === Accessibility ===
    /// Reduced motion (no full-screen overlays)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            sfx_volume: 1.0,
            music_volume: 0.2,
            muted: false,

            overlays: true,

            show_timer: true,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "maru_merge_settings";

    /// Effective overlay toggle (respects reduced_motion)
    pub fn effective_overlays(&self) -> bool {
        self.overlays && !self.reduced_motion
    }

    /// Gain applied to sound effects
    pub fn sfx_gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// Gain applied to background music
    pub fn music_gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.music_volume).clamp(0.0, 1.0)
        }
    }

    /// Load settings, falling back to defaults
    pub fn load() -> Self {
        if let Some(json) = storage::get(Self::STORAGE_KEY) {
            match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring stored settings: {}", e),
            }
        }
        log::info!("Using default settings");
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gains() {
        let mut s = Settings::default();
        assert!((s.music_gain() - 0.2).abs() < 1e-6);
        assert_eq!(s.sfx_gain(), 1.0);
        s.master_volume = 0.5;
        assert!((s.sfx_gain() - 0.5).abs() < 1e-6);
        s.muted = true;
        assert_eq!(s.sfx_gain(), 0.0);
        assert_eq!(s.music_gain(), 0.0);
    }

    #[test]
    fn test_reduced_motion_disables_overlays() {
        let mut s = Settings::default();
        assert!(s.effective_overlays());
        s.reduced_motion = true;
        assert!(!s.effective_overlays());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let s: Settings = serde_json::from_str(r#"{"muted": true}"#).unwrap();
        assert!(s.muted);
        assert!(s.overlays);
        assert!((s.music_volume - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_native_load_is_default() {
        let s = Settings::load();
        assert!(!s.muted);
    }
}
