//! Celebratory video overlay
//!
//! A chroma-keyed clip played over the playfield after a big merge. The
//! controller is plain data so the cancel/complete bookkeeping can be tested
//! natively; the browser side ([`VideoOverlay`]) does the drawing.

use std::cell::Cell;
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Key colour (#05FE01)
pub const CHROMA_KEY: [u8; 3] = [0x05, 0xFE, 0x01];
/// Per-channel distance below which a pixel counts as key colour
pub const CHROMA_THRESHOLD: u8 = 100;
/// Clips are scaled to this height and centred
pub const OVERLAY_DRAW_HEIGHT: f64 = 960.0;

/// Whether one RGB pixel matches the key colour
#[inline]
pub fn is_keyed(r: u8, g: u8, b: u8) -> bool {
    r.abs_diff(CHROMA_KEY[0]) < CHROMA_THRESHOLD
        && g.abs_diff(CHROMA_KEY[1]) < CHROMA_THRESHOLD
        && b.abs_diff(CHROMA_KEY[2]) < CHROMA_THRESHOLD
}

/// Zero the alpha of keyed pixels in an RGBA buffer. Returns how many were keyed.
pub fn apply_chroma_key(rgba: &mut [u8]) -> usize {
    let mut keyed = 0;
    for px in rgba.chunks_exact_mut(4) {
        if is_keyed(px[0], px[1], px[2]) {
            px[3] = 0;
            keyed += 1;
        }
    }
    keyed
}

/// Destination rect `(x, y, w, h)` for a clip of the given size
pub fn overlay_rect(video_w: f64, video_h: f64, canvas_w: f64, canvas_h: f64) -> (f64, f64, f64, f64) {
    let h = OVERLAY_DRAW_HEIGHT;
    let w = if video_h > 0.0 { video_w * (h / video_h) } else { 0.0 };
    ((canvas_w - w) / 2.0, (canvas_h - h) / 2.0, w, h)
}

/// Handle for one requested playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayTicket {
    pub generation: u64,
    pub clip: String,
}

/// Tracks which overlay (if any) is allowed to draw
///
/// Every request or cancel bumps the generation; a playback whose ticket is
/// no longer current must stop drawing and its completion is ignored.
#[derive(Debug)]
pub struct OverlayController {
    clips: Vec<String>,
    generation: u64,
    active: Option<u64>,
    rng: Pcg32,
}

impl OverlayController {
    pub fn new(seed: u64, clips: Vec<String>) -> Self {
        Self {
            clips,
            generation: 0,
            active: None,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Start a new overlay, superseding any running one
    pub fn request(&mut self) -> Option<OverlayTicket> {
        if self.clips.is_empty() {
            log::warn!("Overlay requested but no clips configured");
            return None;
        }
        let clip = self.clips[self.rng.random_range(0..self.clips.len())].clone();
        self.generation += 1;
        self.active = Some(self.generation);
        log::debug!("Overlay {} -> {}", self.generation, clip);
        Some(OverlayTicket {
            generation: self.generation,
            clip,
        })
    }

    pub fn is_current(&self, ticket: &OverlayTicket) -> bool {
        self.active == Some(ticket.generation)
    }

    /// Playback ended. Returns false for a stale ticket.
    pub fn finish(&mut self, ticket: &OverlayTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.active = None;
        true
    }

    /// Stop whatever is playing (game over, reset)
    pub fn cancel(&mut self) {
        if self.active.take().is_some() {
            log::debug!("Overlay {} cancelled", self.generation);
        }
        self.generation += 1;
    }
}

/// Clip media and frame loops owned by the overlay
///
/// Only the newest clip plays. A superseded clip's frame loop can still have
/// an animation frame booked, so it stays owned here until the loop sets its
/// `exited` flag.
#[derive(Debug)]
pub struct Playbacks<M, L> {
    current: Option<M>,
    loops: Vec<(L, Rc<Cell<bool>>)>,
}

impl<M, L> Default for Playbacks<M, L> {
    fn default() -> Self {
        Self {
            current: None,
            loops: Vec::new(),
        }
    }
}

impl<M, L> Playbacks<M, L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `media` the playing clip. Returns the clip it replaces, which the caller must stop.
    pub fn start(&mut self, media: M, frame_loop: L, exited: Rc<Cell<bool>>) -> Option<M> {
        self.release_exited();
        self.loops.push((frame_loop, exited));
        self.current.replace(media)
    }

    /// Take the playing clip so the caller can stop it
    pub fn stop(&mut self) -> Option<M> {
        self.release_exited();
        self.current.take()
    }

    /// Frame loops not yet released
    pub fn live_loops(&self) -> usize {
        self.loops.len()
    }

    fn release_exited(&mut self) {
        self.loops.retain(|(_, exited)| !exited.get());
    }
}

#[cfg(target_arch = "wasm32")]
pub use video::VideoOverlay;

#[cfg(target_arch = "wasm32")]
mod video {
    use std::cell::{Cell, RefCell};
    use std::rc::{Rc, Weak};

    use wasm_bindgen::prelude::*;
    use wasm_bindgen::{Clamped, JsCast};
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlVideoElement, ImageData};

    use super::{OverlayController, OverlayTicket, Playbacks, apply_chroma_key, overlay_rect};
    use crate::assets::asset_url;

    type FrameClosure = Closure<dyn FnMut(f64)>;
    type FrameSlot = Rc<RefCell<Option<FrameClosure>>>;

    /// Draws overlay clips onto a dedicated canvas stacked over the game
    pub struct VideoOverlay {
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        controller: Rc<RefCell<OverlayController>>,
        playbacks: RefCell<Playbacks<HtmlVideoElement, FrameSlot>>,
    }

    impl VideoOverlay {
        pub fn new(canvas: HtmlCanvasElement, controller: Rc<RefCell<OverlayController>>) -> Result<Self, JsValue> {
            let ctx = canvas
                .get_context("2d")?
                .ok_or_else(|| JsValue::from_str("2D context not available"))?
                .dyn_into::<CanvasRenderingContext2d>()?;
            Ok(Self {
                canvas,
                ctx,
                controller,
                playbacks: RefCell::new(Playbacks::new()),
            })
        }

        pub fn resize(&self, width: u32, height: u32) {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
        }

        pub fn clear(&self) {
            self.ctx
                .clear_rect(0.0, 0.0, self.canvas.width() as f64, self.canvas.height() as f64);
        }

        /// Request a new clip and start it in the background
        pub fn celebrate(&self) {
            let Some(ticket) = self.controller.borrow_mut().request() else {
                return;
            };
            if let Err(e) = self.play(ticket) {
                log::warn!("Overlay failed to start: {:?}", e);
            }
        }

        /// Stop the playing clip and clear the canvas
        pub fn cancel(&self) {
            self.controller.borrow_mut().cancel();
            if let Some(video) = self.playbacks.borrow_mut().stop() {
                stop_video(&video);
            }
            self.clear();
        }

        fn play(&self, ticket: OverlayTicket) -> Result<(), JsValue> {
            let document = web_sys::window()
                .and_then(|w| w.document())
                .ok_or_else(|| JsValue::from_str("no document"))?;
            let video: HtmlVideoElement = document.create_element("video")?.dyn_into()?;
            video.set_src(&asset_url(&ticket.clip));
            video.set_plays_inline(true);

            let exited = Rc::new(Cell::new(false));
            let frame_loop = self.frame_loop(video.clone(), ticket, exited.clone());
            let replaced = self
                .playbacks
                .borrow_mut()
                .start(video.clone(), frame_loop.clone(), exited);
            if let Some(old) = replaced {
                stop_video(&old);
            }
            log::debug!("{} overlay loops alive", self.playbacks.borrow().live_loops());

            self.clear();
            if let Some(f) = frame_loop.borrow().as_ref() {
                request_frame(f);
            }

            let promise = video.play()?;
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = wasm_bindgen_futures::JsFuture::from(promise).await {
                    log::warn!("Error playing overlay clip: {:?}", e);
                }
            });
            Ok(())
        }

        /// Per-frame draw until the clip ends or the ticket goes stale.
        /// The loop sets `exited` once it stops booking frames.
        fn frame_loop(&self, video: HtmlVideoElement, ticket: OverlayTicket, exited: Rc<Cell<bool>>) -> FrameSlot {
            let slot: FrameSlot = Rc::new(RefCell::new(None));
            let weak: Weak<RefCell<Option<FrameClosure>>> = Rc::downgrade(&slot);
            let controller = self.controller.clone();
            let canvas = self.canvas.clone();
            let ctx = self.ctx.clone();

            let closure = Closure::wrap(Box::new(move |_ts: f64| {
                let current = controller.borrow().is_current(&ticket);
                if !current || video.ended() {
                    stop_video(&video);
                    if current {
                        ctx.clear_rect(0.0, 0.0, canvas.width() as f64, canvas.height() as f64);
                    }
                    if controller.borrow_mut().finish(&ticket) {
                        log::debug!("Overlay {} finished", ticket.generation);
                    }
                    exited.set(true);
                    return;
                }
                if !video.paused() {
                    if let Err(e) = draw_keyed_frame(&ctx, &canvas, &video) {
                        log::warn!("Overlay frame failed: {:?}", e);
                    }
                }
                if let Some(slot) = weak.upgrade() {
                    if let Some(f) = slot.borrow().as_ref() {
                        request_frame(f);
                    }
                }
            }) as Box<dyn FnMut(f64)>);

            *slot.borrow_mut() = Some(closure);
            slot
        }
    }

    fn request_frame(f: &FrameClosure) {
        if let Some(window) = web_sys::window() {
            let _ = window.request_animation_frame(f.as_ref().unchecked_ref());
        }
    }

    fn stop_video(video: &HtmlVideoElement) {
        let _ = video.pause();
        video.set_src("");
        video.load();
    }

    fn draw_keyed_frame(
        ctx: &CanvasRenderingContext2d,
        canvas: &HtmlCanvasElement,
        video: &HtmlVideoElement,
    ) -> Result<(), JsValue> {
        let (cw, ch) = (canvas.width(), canvas.height());
        if cw == 0 || ch == 0 {
            return Ok(());
        }
        let (x, y, w, h) = overlay_rect(
            video.video_width() as f64,
            video.video_height() as f64,
            cw as f64,
            ch as f64,
        );
        ctx.clear_rect(0.0, 0.0, cw as f64, ch as f64);
        ctx.draw_image_with_html_video_element_and_dw_and_dh(video, x, y, w, h)?;

        let frame = ctx.get_image_data(0.0, 0.0, cw as f64, ch as f64)?;
        let mut pixels = frame.data().0;
        apply_chroma_key(&mut pixels);
        let keyed = ImageData::new_with_u8_clamped_array_and_sh(Clamped(&pixels), cw, ch)?;
        ctx.put_image_data(&keyed, 0.0, 0.0)
    }
}
