//! High score service
//!
//! Request handler for `GET /highscores` and `POST /highscores`, independent
//! of any HTTP server. The transport hands in an [`ApiRequest`] and writes
//! back the [`ApiResponse`].

pub mod store;

use serde_json::{Value, json};

pub use store::{MemoryStore, ScoreStore, StoredScore};
#[cfg(not(target_arch = "wasm32"))]
pub use store::JsonFileStore;

/// Route served by the handler
pub const HIGHSCORES_PATH: &str = "/highscores";

/// Longest accepted player name (characters)
pub const MAX_NAME_LEN: usize = 32;

/// Incoming request as seen by the handler
#[derive(Debug, Clone, Default)]
pub struct ApiRequest {
    pub method: String,
    pub path: String,
    /// `Origin` header, absent for same-origin requests
    pub origin: Option<String>,
    pub body: String,
}

impl ApiRequest {
    pub fn get(path: &str) -> Self {
        Self {
            method: "GET".into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn post(path: &str, body: impl Into<String>) -> Self {
        Self {
            method: "POST".into(),
            path: path.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Outgoing response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiResponse {
    fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: Some(body),
        }
    }

    fn empty(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Failures the handler maps onto status codes
#[derive(Debug)]
enum ApiError {
    BadRequest(&'static str),
    Forbidden,
    NotFound,
    MethodNotAllowed,
    Internal(anyhow::Error),
}

impl ApiError {
    fn into_response(self) -> ApiResponse {
        match self {
            ApiError::BadRequest(msg) => ApiResponse::json(400, json!({ "error": msg })),
            ApiError::Forbidden => ApiResponse::json(403, json!({ "error": "Origin not allowed" })),
            ApiError::NotFound => ApiResponse::json(404, json!({ "error": "Not Found" })),
            ApiError::MethodNotAllowed => {
                let mut res = ApiResponse::json(405, json!({ "error": "Method Not Allowed" }));
                res.headers.push(("Allow".into(), "GET, POST, OPTIONS".into()));
                res
            }
            ApiError::Internal(e) => {
                log::error!("High score store failure: {:#}", e);
                ApiResponse::json(500, json!({ "error": "Internal Server Error" }))
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

/// Handler configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Web origins allowed to call the API; `"*"` allows any
    pub allowed_origins: Vec<String>,
    /// Rows returned by GET (None = all)
    pub top_limit: Option<usize>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://gameru.girly.jp".into(),
                "http://nyandaru.starfree.jp".into(),
            ],
            top_limit: Some(10),
        }
    }
}

pub struct HighScoreService<S: ScoreStore> {
    store: S,
    config: ServiceConfig,
}

impl<S: ScoreStore> HighScoreService<S> {
    pub fn new(store: S, config: ServiceConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handle one request
    pub fn handle(&mut self, req: &ApiRequest) -> ApiResponse {
        let allow_origin = match self.allowed_origin(req.origin.as_deref()) {
            Ok(allow) => allow,
            Err(e) => return e.into_response(),
        };

        let mut res = match self.route(req) {
            Ok(res) => res,
            Err(e) => e.into_response(),
        };
        if let Some(origin) = allow_origin {
            res.headers
                .push(("Access-Control-Allow-Origin".into(), origin));
        }
        res
    }

    fn route(&mut self, req: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let path = req.path.split('?').next().unwrap_or_default();
        if path != HIGHSCORES_PATH {
            return Err(ApiError::NotFound);
        }
        match req.method.to_ascii_uppercase().as_str() {
            "GET" => self.list(),
            "POST" => self.create(&req.body),
            "OPTIONS" => {
                let mut res = ApiResponse::empty(204);
                res.headers
                    .push(("Access-Control-Allow-Methods".into(), "GET, POST".into()));
                res.headers
                    .push(("Access-Control-Allow-Headers".into(), "Content-Type".into()));
                Ok(res)
            }
            _ => Err(ApiError::MethodNotAllowed),
        }
    }

    fn list(&self) -> Result<ApiResponse, ApiError> {
        let rows = self.store.top(self.config.top_limit)?;
        let body = serde_json::to_value(rows).map_err(anyhow::Error::from)?;
        Ok(ApiResponse::json(200, body))
    }

    fn create(&mut self, body: &str) -> Result<ApiResponse, ApiError> {
        let (name, score) = parse_submission(body)?;
        let row = self.store.insert(&name, score)?;
        log::info!("Stored high score {} for {}", row.score, row.name);
        let body = serde_json::to_value(row).map_err(anyhow::Error::from)?;
        Ok(ApiResponse::json(201, body))
    }

    /// Value for `Access-Control-Allow-Origin`, or Forbidden
    fn allowed_origin(&self, origin: Option<&str>) -> Result<Option<String>, ApiError> {
        let Some(origin) = origin else {
            return Ok(None);
        };
        if self.config.allowed_origins.iter().any(|o| o == "*") {
            return Ok(Some("*".into()));
        }
        if self.config.allowed_origins.iter().any(|o| o == origin) {
            Ok(Some(origin.to_string()))
        } else {
            log::warn!("Rejected request from origin {}", origin);
            Err(ApiError::Forbidden)
        }
    }
}

/// Pull `(name, score)` out of a POST body
fn parse_submission(body: &str) -> Result<(String, u64), ApiError> {
    const MISSING: &str = "name and score are required";

    let value: Value = serde_json::from_str(body).map_err(|_| ApiError::BadRequest(MISSING))?;
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(ApiError::BadRequest(MISSING))?;
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::BadRequest("name is too long"));
    }
    let score = value
        .get("score")
        .and_then(Value::as_f64)
        .ok_or(ApiError::BadRequest(MISSING))?;
    if !score.is_finite() || score < 0.0 {
        return Err(ApiError::BadRequest("score must be a non-negative number"));
    }
    Ok((name.to_string(), score.floor() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    fn service() -> HighScoreService<MemoryStore> {
        HighScoreService::new(MemoryStore::new(), ServiceConfig::default())
    }

    fn post(svc: &mut HighScoreService<MemoryStore>, name: &str, score: u64) {
        let body = json!({ "name": name, "score": score }).to_string();
        assert_eq!(svc.handle(&ApiRequest::post(HIGHSCORES_PATH, body)).status, 201);
    }

    #[test]
    fn test_get_returns_top_ten_descending() {
        let mut svc = service();
        for i in 0..15 {
            post(&mut svc, &format!("p{}", i), i * 100);
        }
        let res = svc.handle(&ApiRequest::get(HIGHSCORES_PATH));
        assert_eq!(res.status, 200);
        let rows = res.body.unwrap();
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0]["score"], 1400);
        assert_eq!(rows[9]["score"], 500);
    }

    #[test]
    fn test_unlimited_listing() {
        let mut svc = HighScoreService::new(
            MemoryStore::new(),
            ServiceConfig {
                top_limit: None,
                ..Default::default()
            },
        );
        for i in 0..12 {
            post(&mut svc, "x", i);
        }
        let res = svc.handle(&ApiRequest::get(HIGHSCORES_PATH));
        assert_eq!(res.body.unwrap().as_array().unwrap().len(), 12);
    }

    #[test]
    fn test_post_returns_stored_record() {
        let mut svc = service();
        let res = svc.handle(&ApiRequest::post(
            HIGHSCORES_PATH,
            r#"{"name": "  hana ", "score": 1234.7}"#,
        ));
        assert_eq!(res.status, 201);
        assert_eq!(res.body.unwrap(), json!({ "id": 1, "name": "hana", "score": 1234 }));
        assert_eq!(svc.store().len(), 1);
    }

    #[test]
    fn test_post_never_dedups() {
        let mut svc = service();
        post(&mut svc, "same", 10);
        post(&mut svc, "same", 10);
        assert_eq!(svc.store().len(), 2);
    }

    #[test]
    fn test_post_validation() {
        let mut svc = service();
        for body in [
            r#"{"score": 10}"#,
            r#"{"name": "a"}"#,
            r#"{"name": "", "score": 10}"#,
            r#"{"name": "a", "score": "10"}"#,
            r#"{"name": "a", "score": -1}"#,
            r#"not json"#,
        ] {
            let res = svc.handle(&ApiRequest::post(HIGHSCORES_PATH, body));
            assert_eq!(res.status, 400, "body {}", body);
            assert!(res.body.unwrap()["error"].is_string());
        }
        let long = json!({ "name": "x".repeat(MAX_NAME_LEN + 1), "score": 1 }).to_string();
        assert_eq!(svc.handle(&ApiRequest::post(HIGHSCORES_PATH, long)).status, 400);
        assert!(svc.store().is_empty());
    }

    #[test]
    fn test_cors() {
        let mut svc = service();
        let res = svc.handle(&ApiRequest::get(HIGHSCORES_PATH).with_origin("http://gameru.girly.jp"));
        assert_eq!(res.status, 200);
        assert_eq!(res.header("access-control-allow-origin"), Some("http://gameru.girly.jp"));

        let res = svc.handle(&ApiRequest::get(HIGHSCORES_PATH).with_origin("http://evil.example"));
        assert_eq!(res.status, 403);

        let rejected = ApiRequest::post(HIGHSCORES_PATH, r#"{"name": "a", "score": 1}"#)
            .with_origin("http://evil.example");
        assert_eq!(svc.handle(&rejected).status, 403);
        assert!(svc.store().is_empty());

        let res = svc.handle(&ApiRequest::get(HIGHSCORES_PATH));
        assert!(res.header("access-control-allow-origin").is_none());
    }

    #[test]
    fn test_wildcard_origin() {
        let mut svc = HighScoreService::new(
            MemoryStore::new(),
            ServiceConfig {
                allowed_origins: vec!["*".into()],
                ..Default::default()
            },
        );
        let res = svc.handle(&ApiRequest::get(HIGHSCORES_PATH).with_origin("http://anywhere"));
        assert_eq!(res.status, 200);
        assert_eq!(res.header("Access-Control-Allow-Origin"), Some("*"));
    }

    #[test]
    fn test_routing() {
        let mut svc = service();
        assert_eq!(svc.handle(&ApiRequest::get("/scores")).status, 404);
        assert_eq!(svc.handle(&ApiRequest::get("/highscores?limit=3")).status, 200);

        let delete = ApiRequest {
            method: "DELETE".into(),
            path: HIGHSCORES_PATH.into(),
            ..Default::default()
        };
        let res = svc.handle(&delete);
        assert_eq!(res.status, 405);
        assert_eq!(res.header("Allow"), Some("GET, POST, OPTIONS"));

        let preflight = ApiRequest {
            method: "OPTIONS".into(),
            path: HIGHSCORES_PATH.into(),
            origin: Some("http://nyandaru.starfree.jp".into()),
            ..Default::default()
        };
        let res = svc.handle(&preflight);
        assert_eq!(res.status, 204);
        assert!(res.body.is_none());
        assert_eq!(res.header("Access-Control-Allow-Methods"), Some("GET, POST"));
    }

    struct BrokenStore;

    impl ScoreStore for BrokenStore {
        fn top(&self, _limit: Option<usize>) -> anyhow::Result<Vec<StoredScore>> {
            bail!("connection refused")
        }

        fn insert(&mut self, _name: &str, _score: u64) -> anyhow::Result<StoredScore> {
            bail!("connection refused")
        }
    }

    #[test]
    fn test_store_failure_is_generic_500() {
        let mut svc = HighScoreService::new(BrokenStore, ServiceConfig::default());
        for req in [
            ApiRequest::get(HIGHSCORES_PATH),
            ApiRequest::post(HIGHSCORES_PATH, r#"{"name": "a", "score": 1}"#),
        ] {
            let res = svc.handle(&req);
            assert_eq!(res.status, 500);
            assert_eq!(res.body.unwrap(), json!({ "error": "Internal Server Error" }));
        }
    }
}
