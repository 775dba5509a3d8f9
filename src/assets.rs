//! Asset paths and the browser image cache
//!
//! Every asset is optional: a missing image just skips its draw call and a
//! missing sound stays silent.

use crate::sim::tier::TIERS;

/// Background while playing
pub const BACKGROUND_PLAY: &str = "bg/0001.jpg";
/// Background on the game-over screen
pub const BACKGROUND_GAME_OVER: &str = "bg/0002.jpg";
/// Background music loop
pub const BGM: &str = "sound/000.mp3";

/// Highest combo level with its own chime
pub const MAX_COMBO_SOUND: u8 = 5;

/// Sprite for one score digit (`count/00.png`..`count/09.png`)
pub fn digit_sprite(digit: u8) -> String {
    format!("count/{:02}.png", digit % 10)
}

/// Chime for a combo level (`sound/001.mp3`..`sound/005.mp3`)
pub fn combo_sound(level: u8) -> Option<String> {
    (1..=MAX_COMBO_SOUND)
        .contains(&level)
        .then(|| format!("sound/{:03}.mp3", level))
}

/// Every image the renderer may ask for
pub fn image_manifest() -> Vec<String> {
    let mut paths = vec![BACKGROUND_PLAY.to_string(), BACKGROUND_GAME_OVER.to_string()];
    paths.extend((0..10).map(digit_sprite));
    paths.extend(TIERS.iter().map(|t| t.sprite.to_string()));
    paths
}

/// Join a relative asset path onto a base URL; absolute URLs pass through
pub fn join_base(base: &str, path: &str) -> String {
    let p = path.trim();
    if p.starts_with("http://") || p.starts_with("https://") || p.starts_with("data:") {
        return p.to_string();
    }
    let base = base.trim_end_matches('/');
    format!("{}/{}", base, p.trim_start_matches('/'))
}

/// Absolute URL for an asset, honouring `window.__BASE_URL` when the host
/// page sets one
#[cfg(target_arch = "wasm32")]
pub fn asset_url(path: &str) -> String {
    use wasm_bindgen::JsValue;

    let base = web_sys::window()
        .and_then(|w| {
            let v = js_sys::Reflect::get(&w, &JsValue::from_str("__BASE_URL")).ok()?;
            v.as_string()
        })
        .unwrap_or_else(|| ".".to_string());
    join_base(&base, path)
}

#[cfg(target_arch = "wasm32")]
pub use images::ImageCache;

#[cfg(target_arch = "wasm32")]
mod images {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use wasm_bindgen::JsValue;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::HtmlImageElement;

    use super::asset_url;

    /// Decoded images keyed by relative path
    #[derive(Clone, Default)]
    pub struct ImageCache {
        images: Rc<RefCell<HashMap<String, HtmlImageElement>>>,
    }

    impl ImageCache {
        pub fn new() -> Self {
            Self::default()
        }

        /// Kick off background loads; each image appears once decoded
        pub fn load_all(&self, paths: Vec<String>) {
            for path in paths {
                let images = self.images.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    match load_image(&path).await {
                        Ok(img) => {
                            log::debug!("Image loaded: {}", path);
                            images.borrow_mut().insert(path, img);
                        }
                        Err(e) => log::warn!("Failed to load image at {}: {:?}", path, e),
                    }
                });
            }
        }

        pub fn get(&self, path: &str) -> Option<HtmlImageElement> {
            self.images.borrow().get(path).cloned()
        }
    }

    async fn load_image(path: &str) -> Result<HtmlImageElement, JsValue> {
        let img = HtmlImageElement::new()?;
        img.set_src(&asset_url(path));
        JsFuture::from(img.decode()).await?;
        Ok(img)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_sprites() {
        assert_eq!(digit_sprite(0), "count/00.png");
        assert_eq!(digit_sprite(9), "count/09.png");
    }

    #[test]
    fn test_combo_sounds() {
        assert_eq!(combo_sound(0), None);
        assert_eq!(combo_sound(1).as_deref(), Some("sound/001.mp3"));
        assert_eq!(combo_sound(5).as_deref(), Some("sound/005.mp3"));
        assert_eq!(combo_sound(6), None);
    }

    #[test]
    fn test_manifest_covers_tiers_and_digits() {
        let paths = image_manifest();
        assert_eq!(paths.len(), 2 + 10 + TIERS.len());
        assert!(paths.contains(&"maru/010.png".to_string()));
        assert!(paths.contains(&"count/05.png".to_string()));
        assert!(paths.contains(&BACKGROUND_GAME_OVER.to_string()));
    }

    #[test]
    fn test_join_base() {
        assert_eq!(join_base("/", "bg/0001.jpg"), "/bg/0001.jpg");
        assert_eq!(join_base("https://cdn.example/game/", "/maru/001.png"), "https://cdn.example/game/maru/001.png");
        assert_eq!(join_base(".", "sound/000.mp3"), "./sound/000.mp3");
        assert_eq!(join_base("/x", "https://other/a.png"), "https://other/a.png");
    }
}
