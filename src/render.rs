//! Canvas 2D renderer
//!
//! Draws one frame from the session: background, balls, HUD. Anything whose
//! image has not loaded yet is skipped for that frame.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::assets::{self, ImageCache};
use crate::highscores::HighScores;
use crate::hud::{self, Viewport};
use crate::settings::Settings;
use crate::sim::{Session, tier_spec};

fn set_fill_style(ctx: &CanvasRenderingContext2d, color: &str) {
    let _ = js_sys::Reflect::set(
        ctx.as_ref(),
        &JsValue::from_str("fillStyle"),
        &JsValue::from_str(color),
    );
}

pub struct Renderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    images: ImageCache,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(canvas: HtmlCanvasElement, images: ImageCache) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2D context not available"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        let viewport = Viewport::for_window(canvas.width() as f64);
        Ok(Self {
            canvas,
            ctx,
            images,
            viewport,
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Fit the canvas to the window width
    pub fn resize(&mut self, window_width: f64) -> Viewport {
        self.viewport = Viewport::for_window(window_width);
        self.canvas.set_width(self.viewport.width as u32);
        self.canvas.set_height(self.viewport.height as u32);
        log::info!("Canvas resized {}x{}", self.viewport.width, self.viewport.height);
        self.viewport
    }

    /// Render the current frame
    pub fn render(&self, session: &Session, board: &HighScores, settings: &Settings) {
        let (w, h) = (self.viewport.width, self.viewport.height);
        self.ctx.clear_rect(0.0, 0.0, w, h);

        if session.is_playing() {
            self.draw_background(assets::BACKGROUND_PLAY);
            self.draw_balls(session);
            self.draw_score(session.score, hud::SCORE_ORIGIN.0, hud::SCORE_ORIGIN.1);
            if settings.show_timer {
                self.draw_text(&hud::timer_text(session.elapsed_ms), w / 2.0, hud::TIMER_Y, 24, "center");
            }
            self.draw_podium(board, session.tuning().podium_rank);
            self.draw_next_ball(session.next_tier);
        } else {
            self.draw_background(assets::BACKGROUND_GAME_OVER);
            self.draw_final_score(session.score);
        }
    }

    fn image(&self, path: &str) -> Option<HtmlImageElement> {
        self.images.get(path)
    }

    fn draw_background(&self, path: &str) {
        if let Some(img) = self.image(path) {
            let _ = self.ctx.draw_image_with_html_image_element_and_dw_and_dh(
                &img,
                0.0,
                0.0,
                self.viewport.width,
                self.viewport.height,
            );
        }
    }

    fn draw_balls(&self, session: &Session) {
        let scale = self.viewport.scale();
        for ball in &session.balls {
            let Some(spec) = tier_spec(ball.tier) else { continue };
            let Some(img) = self.image(spec.sprite) else { continue };
            let r = spec.radius as f64 * scale;

            self.ctx.save();
            let _ = self
                .ctx
                .translate(ball.pos.x as f64 * scale, ball.pos.y as f64 * scale);
            let _ = self.ctx.rotate(ball.angle as f64);
            let _ = self
                .ctx
                .draw_image_with_html_image_element_and_dw_and_dh(&img, -r, -r, r * 2.0, r * 2.0);
            self.ctx.restore();
        }
    }

    fn digit_images(&self, score: u64) -> Vec<HtmlImageElement> {
        hud::score_digits(score)
            .into_iter()
            .filter_map(|d| self.image(&assets::digit_sprite(d)))
            .collect()
    }

    fn draw_digits(&self, digits: &[HtmlImageElement], mut x: f64, y_of: impl Fn(f64) -> f64) {
        for img in digits {
            let (iw, ih) = (img.width() as f64, img.height() as f64);
            let _ = self
                .ctx
                .draw_image_with_html_image_element_and_dw_and_dh(img, x, y_of(ih), iw, ih);
            x += iw + hud::DIGIT_GAP;
        }
    }

    fn draw_score(&self, score: u64, x: f64, y: f64) {
        self.draw_digits(&self.digit_images(score), x, |_| y);
    }

    fn draw_final_score(&self, score: u64) {
        let digits = self.digit_images(score);
        let total = hud::digits_width(digits.iter().map(|img| img.width() as f64));
        let cx = self.viewport.width / 2.0;
        let cy = self.viewport.height / 2.0;
        self.draw_digits(&digits, cx - total / 2.0, |ih| cy - ih / 2.0);
    }

    fn draw_text(&self, text: &str, x: f64, y: f64, size: u32, align: &str) {
        set_fill_style(&self.ctx, "white");
        self.ctx.set_font(&format!("{}px sans-serif", size));
        self.ctx.set_text_align(align);
        let _ = self.ctx.fill_text(text, x, y);
    }

    fn draw_podium(&self, board: &HighScores, count: usize) {
        let (x, y) = hud::PODIUM_ORIGIN;
        self.draw_text(hud::PODIUM_HEADER, x, y, 18, "left");
        for (i, line) in hud::podium_lines(board, count).iter().enumerate() {
            let line_y = y + hud::PODIUM_LINE_HEIGHT * (i + 1) as f64;
            self.draw_text(line, x, line_y, 18, "left");
        }
    }

    fn draw_next_ball(&self, tier: u8) {
        let Some(spec) = tier_spec(tier) else { return };
        let Some(img) = self.image(spec.sprite) else { return };
        let (x, y, size) = self.viewport.next_ball_rect(spec.radius as f64);
        let _ = self
            .ctx
            .draw_image_with_html_image_element_and_dw_and_dh(&img, x, y, size, size);
    }
}
