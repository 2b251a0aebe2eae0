//! Mock HTTP server for the tracker API.
//!
//! Serves the same endpoints as the real server, backed by an in-memory
//! fixture of aquariums and per-user visit records. Sessions are plain cookie
//! tokens (see [`MOCK_USERS`]). Tests can inject one-shot failures and read
//! per-endpoint request counts through the handle.

use std::{
    collections::{BTreeMap, HashMap},
    net::SocketAddr,
    sync::Arc,
};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, put},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::config::SESSION_COOKIE_NAME;

/// Session tokens accepted by the mock: (token, user_id, email, name)
pub const MOCK_USERS: &[(&str, &str, &str, Option<&str>)] = &[
    ("token-hanako", "u-hanako", "hanako@example.com", Some("Hanako")),
    ("token-taro", "u-taro", "taro@example.com", None),
];

/// Endpoints of the mock, used for failure injection and request counts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MockEndpoint {
    Health,
    Session,
    Items,
    Stats,
    SetVisited,
    SetNote,
    Logout,
}

/// Aquarium record as stored by the mock
#[derive(Clone, Debug)]
pub struct MockAquarium {
    pub id: u64,
    pub name: String,
    pub prefecture: String,
    pub city: String,
    pub location_raw: String,
    pub url: Option<String>,
    pub mola_star: u8,
    /// Sent as-is, so fixtures can use numbers, numeric strings, or null
    pub lat: Value,
    pub lng: Value,
}

impl MockAquarium {
    pub fn new(id: u64, name: &str, prefecture: &str, city: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            prefecture: prefecture.to_string(),
            city: city.to_string(),
            location_raw: format!("{prefecture}{city}"),
            url: None,
            mola_star: 0,
            lat: Value::Null,
            lng: Value::Null,
        }
    }

    pub fn at(mut self, lat: f64, lng: f64) -> Self {
        self.lat = json!(lat);
        self.lng = json!(lng);
        self
    }

    pub fn starred(mut self) -> Self {
        self.mola_star = 1;
        self
    }

    pub fn url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }
}

/// Default fixture: a handful of aquariums spread over several regions,
/// including one with string coordinates and one with none.
pub fn default_aquariums() -> Vec<MockAquarium> {
    let mut fukushima = MockAquarium::new(5, "アクアマリンふくしま", "福島県", "いわき市");
    fukushima.lat = json!("36.9447");
    fukushima.lng = json!("140.9030");
    vec![
        MockAquarium::new(1, "おたる水族館", "北海道", "小樽市").at(43.2298, 141.0203),
        MockAquarium::new(2, "すみだ水族館", "東京都", "墨田区")
            .at(35.7101, 139.8107)
            .starred()
            .url("https://www.sumida-aquarium.com/"),
        MockAquarium::new(3, "海遊館", "大阪府", "大阪市")
            .at(34.6545, 135.4290)
            .starred(),
        MockAquarium::new(4, "沖縄美ら海水族館", "沖縄県", "本部町").at(26.6943, 127.8779),
        fukushima,
        MockAquarium::new(6, "新江ノ島水族館", "神奈川県", "藤沢市"),
    ]
}

#[derive(Clone, Debug, Default)]
struct VisitRow {
    visited: bool,
    visited_at: Option<String>,
    note: String,
    updated_at: Option<String>,
}

#[derive(Debug)]
struct MockUser {
    user_id: String,
    email: String,
    name: Option<String>,
}

/// Injected one-shot response
#[derive(Debug)]
struct Failure {
    status: StatusCode,
    location: Option<String>,
    body: String,
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        match self.location {
            Some(location) => (self.status, [(header::LOCATION, location)], self.body).into_response(),
            None => (self.status, self.body).into_response(),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    aquariums: Vec<MockAquarium>,
    users: HashMap<String, MockUser>,
    visits: HashMap<(String, u64), VisitRow>,
    failures: HashMap<MockEndpoint, Failure>,
    counts: BTreeMap<MockEndpoint, u64>,
}

type SharedState = Arc<Mutex<MockState>>;

impl MockState {
    /// Counts the request and returns an injected failure, if one is pending.
    fn enter(&mut self, endpoint: MockEndpoint) -> Option<Response> {
        *self.counts.entry(endpoint).or_default() += 1;
        self.failures.remove(&endpoint).map(IntoResponse::into_response)
    }

    fn user_id(&self, headers: &HeaderMap) -> Option<String> {
        let token = session_token(headers)?;
        self.users.get(&token).map(|user| user.user_id.clone())
    }

    fn item_json(&self, user_id: &str, aquarium: &MockAquarium) -> Value {
        let visit = self.visits.get(&(user_id.to_string(), aquarium.id));
        json!({
            "id": aquarium.id,
            "name": aquarium.name,
            "prefecture": aquarium.prefecture,
            "city": aquarium.city,
            "location_raw": aquarium.location_raw,
            "url": aquarium.url,
            "mola_star": aquarium.mola_star,
            "visited": visit.is_some_and(|v| v.visited),
            "visited_at": visit.and_then(|v| v.visited_at.clone()),
            "note": visit.map(|v| v.note.clone()).unwrap_or_default(),
            "updated_at": visit.and_then(|v| v.updated_at.clone()),
            "lat": aquarium.lat,
            "lng": aquarium.lng,
        })
    }
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
}

fn timestamp() -> String {
    Utc::now()
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

fn not_logged_in() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Not logged in"})),
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"detail": "Aquarium not found"})),
    )
        .into_response()
}

fn bad_id(id: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({"detail": format!("invalid aquarium id: {id}")})),
    )
        .into_response()
}

/// Handle to a running mock server.
pub struct MockTrackerServerHandle {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: tokio::task::JoinHandle<()>,
    state: SharedState,
}

impl MockTrackerServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base url for a client, e.g. "http://127.0.0.1:40211"
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        let _ = self.task.await;
    }

    /// The next request to `endpoint` fails with `status` and `body`.
    pub fn fail_next(&self, endpoint: MockEndpoint, status: u16, body: &str) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.state.lock().failures.insert(
            endpoint,
            Failure {
                status,
                location: None,
                body: body.to_string(),
            },
        );
    }

    /// The next request to `endpoint` gets a 302 to `location`, as a server
    /// sending unauthenticated users to a login page would.
    pub fn redirect_next(&self, endpoint: MockEndpoint, location: &str) {
        self.state.lock().failures.insert(
            endpoint,
            Failure {
                status: StatusCode::FOUND,
                location: Some(location.to_string()),
                body: String::new(),
            },
        );
    }

    /// Number of requests received by `endpoint`
    pub fn request_count(&self, endpoint: MockEndpoint) -> u64 {
        self.state
            .lock()
            .counts
            .get(&endpoint)
            .copied()
            .unwrap_or_default()
    }

    /// Replaces the aquarium fixture. Visit records are kept.
    pub fn set_aquariums(&self, aquariums: Vec<MockAquarium>) {
        self.state.lock().aquariums = aquariums;
    }
}

#[derive(Clone)]
pub struct MockTrackerServer {
    state: SharedState,
}

impl MockTrackerServer {
    pub fn new() -> Self {
        Self::with_aquariums(default_aquariums())
    }

    pub fn with_aquariums(aquariums: Vec<MockAquarium>) -> Self {
        let users = MOCK_USERS
            .iter()
            .map(|(token, user_id, email, name)| {
                (
                    token.to_string(),
                    MockUser {
                        user_id: user_id.to_string(),
                        email: email.to_string(),
                        name: name.map(str::to_string),
                    },
                )
            })
            .collect();
        Self {
            state: Arc::new(Mutex::new(MockState {
                aquariums,
                users,
                ..Default::default()
            })),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/health", get(health))
            .route("/api/session", get(session))
            .route("/api/items", get(list_items))
            .route("/api/stats", get(stats))
            .route("/api/items/:id/visited", put(set_visited))
            .route("/api/items/:id/note", put(set_note))
            .route("/logout", get(logout))
            .with_state(self.state.clone())
    }

    pub async fn serve(
        self,
        listener: tokio::net::TcpListener,
        shutdown: oneshot::Receiver<()>,
    ) -> std::io::Result<()> {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async {
                let _ = shutdown.await;
            })
            .await
    }

    /// Binds `addr` (port 0 picks a free port) and serves in a background task.
    pub async fn start(addr: SocketAddr) -> std::io::Result<MockTrackerServerHandle> {
        Self::new().spawn(addr).await
    }

    pub async fn spawn(self, addr: SocketAddr) -> std::io::Result<MockTrackerServerHandle> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let state = self.state.clone();
        let task = tokio::spawn(async move {
            let _ = self.serve(listener, shutdown_rx).await;
        });
        info!(%addr, "mock tracker server started");
        Ok(MockTrackerServerHandle {
            addr,
            shutdown: shutdown_tx,
            task,
            state,
        })
    }
}

impl Default for MockTrackerServer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

async fn health(State(state): State<SharedState>) -> Response {
    if let Some(failure) = state.lock().enter(MockEndpoint::Health) {
        return failure;
    }
    Json(json!({"ok": true})).into_response()
}

async fn session(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let mut state = state.lock();
    if let Some(failure) = state.enter(MockEndpoint::Session) {
        return failure;
    }
    let user = session_token(&headers).and_then(|token| state.users.get(&token));
    match user {
        Some(user) => Json(json!({
            "logged_in": true,
            "user_id": user.user_id,
            "email": user.email,
            "name": user.name,
        }))
        .into_response(),
        None => Json(json!({"logged_in": false})).into_response(),
    }
}

async fn list_items(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let mut state = state.lock();
    if let Some(failure) = state.enter(MockEndpoint::Items) {
        return failure;
    }
    let Some(user_id) = state.user_id(&headers) else {
        return not_logged_in();
    };
    let items: Vec<Value> = state
        .aquariums
        .iter()
        .map(|aquarium| state.item_json(&user_id, aquarium))
        .collect();
    Json(Value::Array(items)).into_response()
}

async fn stats(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let mut state = state.lock();
    if let Some(failure) = state.enter(MockEndpoint::Stats) {
        return failure;
    }
    let Some(user_id) = state.user_id(&headers) else {
        return not_logged_in();
    };
    let visited = state
        .aquariums
        .iter()
        .filter(|a| {
            state
                .visits
                .get(&(user_id.clone(), a.id))
                .is_some_and(|v| v.visited)
        })
        .count();
    Json(json!({"total": state.aquariums.len(), "visited": visited})).into_response()
}

#[derive(Deserialize)]
struct VisitedBody {
    visited: bool,
}

#[derive(Deserialize)]
struct NoteBody {
    note: String,
}

async fn set_visited(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<VisitedBody>,
) -> Response {
    let mut state = state.lock();
    if let Some(failure) = state.enter(MockEndpoint::SetVisited) {
        return failure;
    }
    let Some(user_id) = state.user_id(&headers) else {
        return not_logged_in();
    };
    let Ok(id) = id.parse::<u64>() else {
        return bad_id(&id);
    };
    if !state.aquariums.iter().any(|a| a.id == id) {
        return not_found();
    }
    let now = timestamp();
    let row = state.visits.entry((user_id, id)).or_default();
    row.visited = body.visited;
    row.visited_at = body.visited.then(|| now.clone());
    row.updated_at = Some(now);
    debug!(id, visited = body.visited, "mock set_visited");
    Json(json!({
        "aquarium_id": id,
        "visited": row.visited,
        "visited_at": row.visited_at,
    }))
    .into_response()
}

async fn set_note(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<NoteBody>,
) -> Response {
    let mut state = state.lock();
    if let Some(failure) = state.enter(MockEndpoint::SetNote) {
        return failure;
    }
    let Some(user_id) = state.user_id(&headers) else {
        return not_logged_in();
    };
    let Ok(id) = id.parse::<u64>() else {
        return bad_id(&id);
    };
    if !state.aquariums.iter().any(|a| a.id == id) {
        return not_found();
    }
    let row = state.visits.entry((user_id, id)).or_default();
    row.note = body.note;
    row.updated_at = Some(timestamp());
    debug!(id, "mock set_note");
    Json(json!({
        "aquarium_id": id,
        "note": row.note,
        "updated_at": row.updated_at,
    }))
    .into_response()
}

async fn logout(State(state): State<SharedState>) -> Response {
    if let Some(failure) = state.lock().enter(MockEndpoint::Logout) {
        return failure;
    }
    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/".to_string()),
            (
                header::SET_COOKIE,
                format!("{SESSION_COOKIE_NAME}=; Max-Age=0; Path=/"),
            ),
        ],
    )
        .into_response()
}
