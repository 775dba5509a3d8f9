//! Maru Merge entry point
//!
//! Browser: wires canvas, input, audio and the high score client around one
//! shared game and runs the frame loop. Native: plays a seeded headless
//! session against the high score service, in memory or backed by `--store`.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, HtmlElement, KeyboardEvent, MouseEvent, TouchEvent, Window};

    use maru_merge::assets::{self, ImageCache};
    use maru_merge::audio::{AudioSubsystem, SoundEffect};
    use maru_merge::consts::*;
    use maru_merge::net::{BoardHandle, BrowserReporter};
    use maru_merge::overlay::{OverlayController, VideoOverlay};
    use maru_merge::physics::{PhysicsWorld, RapierWorld};
    use maru_merge::platform;
    use maru_merge::render::Renderer;
    use maru_merge::sim::{GameEvent, GameOverReport, Session};
    use maru_merge::{Settings, Tuning};

    /// Game instance holding all state
    struct Game {
        session: Session,
        physics: RapierWorld,
        renderer: Renderer,
        audio: AudioSubsystem,
        overlay: VideoOverlay,
        board: BoardHandle,
        settings: Settings,
        restart_area: Option<HtmlElement>,
        accumulator: f32,
        last_time: f64,
    }

    impl Game {
        /// Pointer/touch at client x: unlock audio, then try to drop
        fn pointer_down(&mut self, client_x: f64) {
            self.audio.initialize();
            if !self.audio.is_bgm_playing() && self.session.is_playing() {
                self.audio.play_bgm();
            }

            let rect = self.renderer.canvas().get_bounding_client_rect();
            let x = self
                .renderer
                .viewport()
                .client_to_sim_x(client_x, rect.left(), rect.width());
            self.session.try_drop(x, platform::now_ms(), &mut self.physics);
        }

        /// Run simulation ticks, then the session clock
        fn update(&mut self, dt: f32) {
            if !self.session.is_playing() {
                return;
            }
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let pairs = self.physics.step(SIM_DT);
                self.session.sync_poses(&self.physics);
                let outcome = self.session.resolve_collisions(&pairs, &mut self.physics);
                self.handle_events(&outcome.events);
                self.accumulator -= SIM_DT;
                substeps += 1;
            }

            let board = self.board.snapshot();
            let mut reporter = BrowserReporter::new(self.board.clone());
            if let Some(report) = self
                .session
                .update_clock(platform::now_ms(), &board, &mut reporter)
            {
                self.on_game_over(report);
            }
        }

        fn handle_events(&self, events: &[GameEvent]) {
            for event in events {
                if let Some(effect) = SoundEffect::for_event(event) {
                    self.audio.play(effect);
                }
                if let GameEvent::SpecialEvent { tier } = event {
                    if self.settings.effective_overlays() {
                        log::debug!("Celebrating tier {}", tier);
                        self.overlay.celebrate();
                    }
                }
            }
        }

        /// Debug trigger (Enter)
        fn force_game_over(&mut self) {
            let board = self.board.snapshot();
            let mut reporter = BrowserReporter::new(self.board.clone());
            if let Some(report) = self
                .session
                .end_game(platform::now_ms(), &board, &mut reporter)
            {
                self.on_game_over(report);
            }
        }

        fn on_game_over(&mut self, report: GameOverReport) {
            self.audio.stop_bgm();
            self.overlay.cancel();
            set_visible(self.restart_area.as_ref(), true);
            if let Some(name) = &report.submitted_as {
                log::info!("Submitted {} as {}", report.score, name);
            }
        }

        /// Reset game state for restart
        fn restart(&mut self) {
            self.session.reset(platform::now_ms(), &mut self.physics);
            self.overlay.cancel();
            self.accumulator = 0.0;
            set_visible(self.restart_area.as_ref(), false);
            self.audio.initialize();
            self.audio.play_bgm();
        }

        fn resize(&mut self, window_width: f64) {
            let viewport = self.renderer.resize(window_width);
            self.overlay
                .resize(viewport.width as u32, viewport.height as u32);
            if let Some(area) = &self.restart_area {
                let style = area.style();
                let _ = style.set_property("width", &format!("{}px", viewport.width));
                let _ = style.set_property("height", "150px");
                let _ = style.set_property("bottom", "10%");
            }
        }

        fn render(&self) {
            self.renderer
                .render(&self.session, &self.board.snapshot(), &self.settings);
        }
    }

    fn set_visible(el: Option<&HtmlElement>, visible: bool) {
        if let Some(el) = el {
            let _ = el
                .style()
                .set_property("display", if visible { "block" } else { "none" });
        }
    }

    fn window_width(window: &Window) -> f64 {
        window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(ARENA_WIDTH as f64)
    }

    fn canvas_by_id(document: &Document, id: &str) -> Result<HtmlCanvasElement, JsValue> {
        document
            .get_element_by_id(id)
            .ok_or_else(|| JsValue::from_str(&format!("no #{}", id)))?
            .dyn_into()
            .map_err(|_| JsValue::from_str(&format!("#{} is not a canvas", id)))
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Maru Merge starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas = canvas_by_id(&document, "gameCanvas")?;
        let video_canvas = canvas_by_id(&document, "videoCanvas")?;
        let restart_area = document
            .get_element_by_id("restartArea")
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());
        set_visible(restart_area.as_ref(), false);

        let tuning = Tuning::default();
        let settings = Settings::load();

        let images = ImageCache::new();
        images.load_all(assets::image_manifest());
        let renderer = Renderer::new(canvas, images)?;

        let seed = js_sys::Date::now() as u64;
        let controller = Rc::new(RefCell::new(OverlayController::new(
            seed,
            tuning.overlay_clips.clone(),
        )));
        let overlay = VideoOverlay::new(video_canvas, controller)?;

        let board = BoardHandle::new(&tuning.score_endpoint);
        board.refresh();

        let audio = AudioSubsystem::new(&settings);
        let physics = RapierWorld::from_tuning(&tuning);
        let session = Session::new(seed, platform::now_ms(), tuning);
        log::info!("Game initialized with seed: {}", seed);

        let game = Rc::new(RefCell::new(Game {
            session,
            physics,
            renderer,
            audio,
            overlay,
            board,
            settings,
            restart_area,
            accumulator: 0.0,
            last_time: 0.0,
        }));
        game.borrow_mut().resize(window_width(&window));

        setup_input_handlers(&document, game.clone());
        setup_restart_area(&document, game.clone());
        setup_resize(&window, game.clone());

        request_animation_frame(game);

        log::info!("Maru Merge running!");
        Ok(())
    }

    fn setup_input_handlers(document: &Document, game: Rc<RefCell<Game>>) {
        // Mouse down anywhere drops at the pointer's x
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                game.borrow_mut().pointer_down(event.client_x() as f64);
            });
            let _ = document
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                if let Some(touch) = event.touches().get(0) {
                    game.borrow_mut().pointer_down(touch.client_x() as f64);
                }
            });
            let _ = document
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.code().as_str() {
                    "Space" => {
                        g.restart();
                        log::info!("Game restarted");
                    }
                    "Enter" => g.force_game_over(),
                    _ => {}
                }
            });
            let _ = document
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_restart_area(document: &Document, game: Rc<RefCell<Game>>) {
        if let Some(area) = document.get_element_by_id("restartArea") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                if g.session.is_playing() {
                    return;
                }
                g.restart();
                log::info!("Game restarted by clicking restart area");
            });
            let _ = area.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(window: &Window, game: Rc<RefCell<Game>>) {
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if let Some(window) = web_sys::window() {
                game.borrow_mut().resize(window_width(&window));
            }
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt);
            g.render();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(e) = wasm_game::run() {
        web_sys::console::error_1(&e);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use clap::Parser;

    use maru_merge::Tuning;
    use maru_merge::service::{JsonFileStore, MemoryStore};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Maru Merge (native) starting...");

    let args = headless::Args::parse();
    let tuning = match &args.tuning {
        Some(path) => Tuning::load_file(path)?,
        None => Tuning::default(),
    };

    let board = match &args.store {
        Some(path) => {
            let store = JsonFileStore::new(path);
            log::info!("High scores kept in {}", store.path().display());
            headless::run(args.seed, tuning, store)?
        }
        None => headless::run(args.seed, tuning, MemoryStore::new())?,
    };
    for (i, entry) in board.top(10).iter().enumerate() {
        println!("{}. {}pt {}", i + 1, entry.score, entry.name);
    }
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use anyhow::{Result, ensure};
    use clap::Parser;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use maru_merge::consts::{ARENA_WIDTH, SIM_DT};
    use maru_merge::highscores::{HighScoreEntry, HighScores, ScoreReporter};
    use maru_merge::overlay::OverlayController;
    use maru_merge::physics::{PhysicsWorld, RapierWorld};
    use maru_merge::service::{ApiRequest, HIGHSCORES_PATH, HighScoreService, ScoreStore, ServiceConfig};
    use maru_merge::sim::{GameEvent, Session};
    use maru_merge::{Tuning, net};

    #[derive(Parser, Debug)]
    #[command(about = "Play one seeded headless session against the high score service", version)]
    pub struct Args {
        /// Balance file overriding the built-in tuning
        pub tuning: Option<PathBuf>,
        /// Seed for both the session and the random dropper
        #[arg(default_value_t = 42)]
        pub seed: u64,
        /// Keep the score table in this JSON file instead of memory
        #[arg(long)]
        pub store: Option<PathBuf>,
    }

    /// Submits straight into the in-process service
    struct ServiceReporter<'a, S: ScoreStore> {
        service: &'a mut HighScoreService<S>,
    }

    impl<S: ScoreStore> ScoreReporter for ServiceReporter<'_, S> {
        fn request_name(&mut self, _score: u64) -> Option<String> {
            Some("headless".to_string())
        }

        fn submit(&mut self, entry: HighScoreEntry) {
            let body = match net::submission_body(&entry) {
                Ok(body) => body,
                Err(e) => {
                    log::warn!("{:#}", e);
                    return;
                }
            };
            let res = self.service.handle(&ApiRequest::post(HIGHSCORES_PATH, body));
            log::info!("Submission answered {}", res.status);
        }
    }

    fn fetch_board<S: ScoreStore>(service: &mut HighScoreService<S>) -> Result<HighScores> {
        let res = service.handle(&ApiRequest::get(HIGHSCORES_PATH));
        ensure!(res.status == 200, "GET {} answered {}", HIGHSCORES_PATH, res.status);
        ensure!(
            res.header("Content-Type") == Some("application/json"),
            "GET {} is not JSON",
            HIGHSCORES_PATH
        );
        HighScores::from_json(&res.body.unwrap_or_default().to_string())
    }

    /// One full session with a random dropper. Returns the board afterwards.
    pub fn run<S: ScoreStore>(seed: u64, tuning: Tuning, store: S) -> Result<HighScores> {
        let mut service = HighScoreService::new(store, ServiceConfig::default());
        let mut overlay = OverlayController::new(seed, tuning.overlay_clips.clone());
        let mut physics = RapierWorld::from_tuning(&tuning);
        let mut session = Session::new(seed, 0.0, tuning);
        let mut hand = Pcg32::seed_from_u64(seed.wrapping_add(1));

        let board = fetch_board(&mut service)?;
        let frame_ms = SIM_DT as f64 * 1000.0;
        let mut now = 0.0;
        let mut merges = 0u32;
        let mut celebrations = 0u32;

        loop {
            now += frame_ms;
            let x = hand.random_range(0.0..ARENA_WIDTH);
            session.try_drop(x, now, &mut physics);

            let pairs = physics.step(SIM_DT);
            session.sync_poses(&physics);
            let outcome = session.resolve_collisions(&pairs, &mut physics);
            for event in &outcome.events {
                match event {
                    GameEvent::Merged { .. } | GameEvent::Annihilated { .. } => merges += 1,
                    GameEvent::SpecialEvent { .. } => {
                        if let Some(ticket) = overlay.request() {
                            celebrations += 1;
                            // Nothing to play here; the clip ends at once
                            overlay.finish(&ticket);
                        }
                    }
                    _ => {}
                }
            }

            let mut reporter = ServiceReporter {
                service: &mut service,
            };
            if let Some(report) = session.update_clock(now, &board, &mut reporter) {
                println!(
                    "Game over after {:.1}s: score {}, {} merges, {} celebrations, {} balls left",
                    report.elapsed_ms / 1000.0,
                    report.score,
                    merges,
                    celebrations,
                    physics.ball_count()
                );
                log::debug!("{} bodies in the world at game over", physics.body_count());
                break;
            }
        }

        fetch_board(&mut service)
    }

}
