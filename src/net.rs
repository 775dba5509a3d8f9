//! High score client
//!
//! Fetches the remote board and posts new records. Failures are logged and
//! otherwise ignored; the cached board stays on screen.

use anyhow::{Context, Result};

use crate::highscores::HighScoreEntry;

/// Shown when a score makes the podium
pub const NAME_PROMPT: &str = "スコアランキング3位以内に入りました！名前を入力してください:";

/// JSON body for `POST /highscores`
pub fn submission_body(entry: &HighScoreEntry) -> Result<String> {
    serde_json::to_string(entry).context("encoding high score submission")
}

#[cfg(target_arch = "wasm32")]
pub use web::{BoardHandle, BrowserReporter};

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Request, RequestInit, Response};

    use super::{NAME_PROMPT, submission_body};
    use crate::highscores::{HighScoreEntry, HighScores, ScoreReporter};

    fn js_err(e: anyhow::Error) -> JsValue {
        JsValue::from_str(&format!("{:#}", e))
    }

    async fn fetch_board(endpoint: &str) -> Result<HighScores, JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let resp: Response = JsFuture::from(window.fetch_with_str(endpoint))
            .await?
            .dyn_into()?;
        if !resp.ok() {
            return Err(JsValue::from_str(&format!("HTTP {}", resp.status())));
        }
        let text = JsFuture::from(resp.text()?)
            .await?
            .as_string()
            .ok_or("response body is not text")?;
        HighScores::from_json(&text).map_err(js_err)
    }

    async fn post_score(endpoint: &str, entry: &HighScoreEntry) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let body = submission_body(entry).map_err(js_err)?;

        let opts = RequestInit::new();
        opts.set_method("POST");
        opts.set_body(&JsValue::from_str(&body));
        let request = Request::new_with_str_and_init(endpoint, &opts)?;
        request.headers().set("Content-Type", "application/json")?;

        let resp: Response = JsFuture::from(window.fetch_with_request(&request))
            .await?
            .dyn_into()?;
        if !resp.ok() {
            return Err(JsValue::from_str(&format!("HTTP {}", resp.status())));
        }
        Ok(())
    }

    /// Shared view of the remote board, seeded from the LocalStorage cache
    #[derive(Clone)]
    pub struct BoardHandle {
        board: Rc<RefCell<HighScores>>,
        endpoint: Rc<str>,
    }

    impl BoardHandle {
        pub fn new(endpoint: &str) -> Self {
            Self {
                board: Rc::new(RefCell::new(HighScores::load_cached())),
                endpoint: endpoint.into(),
            }
        }

        pub fn snapshot(&self) -> HighScores {
            self.board.borrow().clone()
        }

        /// Refetch in the background; the old board stays on failure
        pub fn refresh(&self) {
            let handle = self.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match fetch_board(&handle.endpoint).await {
                    Ok(board) => {
                        log::info!("High scores fetched ({} entries)", board.entries.len());
                        board.save_cached();
                        *handle.board.borrow_mut() = board;
                    }
                    Err(e) => log::warn!("Error fetching high scores: {:?}", e),
                }
            });
        }

        /// Post a record, then refetch the board
        pub fn submit(&self, entry: HighScoreEntry) {
            let handle = self.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match post_score(&handle.endpoint, &entry).await {
                    Ok(()) => {
                        log::info!("High score saved: {} {}", entry.name, entry.score);
                        handle.refresh();
                    }
                    Err(e) => log::warn!("Error saving high score: {:?}", e),
                }
            });
        }
    }

    /// Name prompt via `window.prompt`, submission via the board handle
    pub struct BrowserReporter {
        board: BoardHandle,
    }

    impl BrowserReporter {
        pub fn new(board: BoardHandle) -> Self {
            Self { board }
        }
    }

    impl ScoreReporter for BrowserReporter {
        fn request_name(&mut self, _score: u64) -> Option<String> {
            web_sys::window()?
                .prompt_with_message(NAME_PROMPT)
                .ok()
                .flatten()
        }

        fn submit(&mut self, entry: HighScoreEntry) {
            self.board.submit(entry);
        }
    }
}
