//! Axum-based Sous Chef gateway: HTTP front for cooking sessions. Config-driven via CoreConfig.

mod handlers;

use axum::{
    extract::State,
    response::sse::{Event, Sse},
    routing::{get, post},
    Router,
};
use axum::http::Method;
use souschef_core::{
    CoreConfig, Kitchen, MemorySessionStore, RecipeLibrary, SessionBackend, SessionStore,
    SledSessionStore,
};
use souschef_skills::{LlmMode, ModelRouter, SousChefAgent};
use std::fmt::Write as _;
use std::path::Path as StdPath;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tracing::field::Visit;
use tracing_subscriber::layer::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Collects an event's message plus its structured fields as `key=value` pairs.
#[derive(Default)]
struct LineCollector {
    message: String,
    fields: String,
}

impl Visit for LineCollector {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

/// Sends each tracing event as a line to a broadcast channel for SSE log streaming.
#[derive(Clone)]
struct LogBroadcastLayer {
    tx: broadcast::Sender<String>,
}

impl LogBroadcastLayer {
    fn new(tx: broadcast::Sender<String>) -> Self {
        Self { tx }
    }
}

impl<S> tracing_subscriber::Layer<S> for LogBroadcastLayer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut line = LineCollector::default();
        event.record(&mut line);
        let _ = self.tx.send(format!(
            "{} [{}] {}{}",
            event.metadata().level(),
            event.metadata().target(),
            line.message,
            line.fields
        ));
    }
}

fn open_session_store(config: &CoreConfig) -> Result<Arc<dyn SessionStore>, String> {
    match config.session_backend {
        SessionBackend::Memory => Ok(Arc::new(MemorySessionStore::new())),
        SessionBackend::Sled => {
            let path = config.sessions_path();
            let store = SledSessionStore::open_path(&path)
                .map_err(|e| format!("session store at {} LOCKED or inaccessible: {}", path.display(), e))?;
            Ok(Arc::new(store))
        }
    }
}

/// Pre-flight check: config, recipe library, session backend and port availability.
fn run_verify() -> Result<(), String> {
    let config = CoreConfig::load().map_err(|e| format!("Config load failed: {}", e))?;

    print!("Checking recipe library... ");
    let library = RecipeLibrary::load(&config.recipes_path);
    if library.is_empty() {
        return Err("recipe library is empty".to_string());
    }
    println!("OK ({} recipes)", library.len());

    print!("Checking session backend ({:?})... ", config.session_backend);
    let store = open_session_store(&config)?;
    let sessions = store.list().map_err(|e| format!("session listing failed: {}", e))?;
    drop(store);
    println!("OK ({} stored sessions)", sessions.len());

    let mode = LlmMode::parse(&config.llm_mode);
    if mode == LlmMode::Live && config.llm_api_key.is_none() {
        println!("Note: llm_mode=live without llm_api_key or OPENAI_API_KEY");
    }

    let port = config.port;
    print!("Checking port {}... ", port);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    match std::net::TcpListener::bind(addr) {
        Ok(listener) => {
            drop(listener);
            println!("OK (available)");
        }
        Err(e) => {
            return Err(format!("Port {} BLOCKED: {}", port, e));
        }
    }

    println!("\nSUCCESS: All systems GO. Ready to start gateway.");
    Ok(())
}

/// `--prepare-recipes <csv> [out.json]`: converts a recipe CSV into the JSON library.
fn run_prepare_recipes(args: &[String]) -> Result<(), String> {
    let csv_path = args
        .first()
        .ok_or("usage: souschef-gateway --prepare-recipes <recipes.csv> [out.json]")?;
    let out_path = match args.get(1) {
        Some(p) => p.clone(),
        None => CoreConfig::load()
            .map(|c| c.recipes_path)
            .unwrap_or_else(|_| CoreConfig::default().recipes_path),
    };
    let library = RecipeLibrary::from_csv(csv_path)
        .map_err(|e| format!("CSV import from {} failed: {}", csv_path, e))?;
    library
        .write_json(&out_path)
        .map_err(|e| format!("writing {} failed: {}", out_path, e))?;
    println!("Saved {} recipes to {}", library.len(), out_path);
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[souschef-gateway] .env not loaded: {} (using system environment)", e);
    }

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--verify") {
        match run_verify() {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("PRE-FLIGHT FAILED: {}", e);
                std::process::exit(1);
            }
        }
    }
    if let Some(pos) = args.iter().position(|a| a == "--prepare-recipes") {
        match run_prepare_recipes(&args[pos + 1..]) {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("RECIPE IMPORT FAILED: {}", e);
                std::process::exit(1);
            }
        }
    }

    let (log_tx, _) = broadcast::channel(1000);
    let log_layer = LogBroadcastLayer::new(log_tx.clone());

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(log_layer)
        .init();

    if let Err(e) = serve(log_tx).await {
        tracing::error!(target: "souschef::gateway", error = %e, "Gateway stopped");
        std::process::exit(1);
    }
}

async fn serve(log_tx: broadcast::Sender<String>) -> Result<(), String> {
    let config = Arc::new(CoreConfig::load().map_err(|e| format!("Config load failed: {}", e))?);
    let library = Arc::new(RecipeLibrary::load(StdPath::new(&config.recipes_path)));
    let store = open_session_store(&config)?;
    let router = ModelRouter::from_config(&config).map_err(|e| format!("LLM client setup failed: {}", e))?;
    let llm_mode = router.mode();
    let kitchen = Kitchen::new(library, store, Arc::new(SousChefAgent::new(router)))
        .with_fallback_timeout(config.llm_timeout());

    let app = build_app(AppState {
        config: Arc::clone(&config),
        kitchen: Arc::new(kitchen),
        llm_mode,
        log_tx,
    });

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("bind {} failed: {}", addr, e))?;
    tracing::info!(
        target: "souschef::gateway",
        llm_mode = llm_mode.as_str(),
        backend = ?config.session_backend,
        "{} listening on {}",
        config.app_name,
        addr
    );
    axum::serve(listener, app).await.map_err(|e| e.to_string())
}

fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/v1/status", get(status))
        .route("/api/v1/health", get(health))
        .route("/api/v1/logs", get(logs_stream))
        .route("/recipes", get(list_recipes))
        .route("/session/start", post(handlers::session::start_session))
        .route("/session/:id/message", post(handlers::session::send_message))
        .route(
            "/session/:id",
            get(handlers::session::get_session).delete(handlers::session::delete_session),
        )
        .route("/sessions", get(handlers::session::list_sessions))
        .with_state(state)
        .layer(cors)
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<CoreConfig>,
    pub(crate) kitchen: Arc<Kitchen>,
    pub(crate) llm_mode: LlmMode,
    pub(crate) log_tx: broadcast::Sender<String>,
}

/// GET /api/v1/health – liveness check for UI and scripts.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/v1/logs – Server-Sent Events stream of gateway logs (tracing output).
async fn logs_stream(
    State(state): State<AppState>,
) -> Sse<impl futures_util::Stream<Item = Result<Event, std::convert::Infallible>> + Send + 'static> {
    use async_stream::stream;
    let mut rx = state.log_tx.subscribe();
    let stream = stream! {
        loop {
            match rx.recv().await {
                Ok(line) => yield Ok(Event::default().data(line)),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    yield Ok(Event::default().data(format!("... {} log lines dropped", n)));
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };
    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    )
}

/// GET /v1/status – app identity, LLM mode and storage summary.
async fn status(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "app_name": state.config.app_name,
        "port": state.config.port,
        "llm_mode": state.llm_mode.as_str(),
        "session_backend": state.config.session_backend,
        "recipe_count": state.kitchen.library().len(),
    }))
}

/// GET /recipes – catalog order (by name).
async fn list_recipes(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    let library = state.kitchen.library();
    let recipes: Vec<serde_json::Value> = library
        .catalog()
        .iter()
        .filter_map(|entry| library.get(&entry.key))
        .map(|r| {
            serde_json::json!({
                "key": r.key,
                "name": r.name,
                "description": r.description,
            })
        })
        .collect();
    axum::Json(serde_json::Value::Array(recipes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_log_tx() -> broadcast::Sender<String> {
        let (tx, _) = broadcast::channel(1);
        tx
    }

    fn test_config() -> CoreConfig {
        CoreConfig {
            app_name: "Test Kitchen".to_string(),
            port: 4000,
            ..CoreConfig::default()
        }
    }

    fn test_app() -> Router {
        let kitchen = Kitchen::new(
            Arc::new(RecipeLibrary::builtin()),
            Arc::new(MemorySessionStore::new()),
            Arc::new(SousChefAgent::new(ModelRouter::with_mode(LlmMode::Mock))),
        );
        build_app(AppState {
            config: Arc::new(test_config()),
            kitchen: Arc::new(kitchen),
            llm_mode: LlmMode::Mock,
            log_tx: test_log_tx(),
        })
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
        let req = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(json) => req
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    async fn start(app: &Router, recipe_key: &str) -> String {
        let (status, json) = call(
            app,
            "POST",
            "/session/start",
            Some(serde_json::json!({ "recipe_key": recipe_key })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        json["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, json) = call(&test_app(), "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn status_reports_identity_and_library() {
        let (status, json) = call(&test_app(), "GET", "/v1/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["app_name"], "Test Kitchen");
        assert_eq!(json["port"], 4000);
        assert_eq!(json["llm_mode"], "mock");
        assert_eq!(json["session_backend"], "memory");
        assert_eq!(json["recipe_count"], 2);
    }

    #[tokio::test]
    async fn recipes_are_listed_by_name() {
        let (status, json) = call(&test_app(), "GET", "/recipes", None).await;
        assert_eq!(status, StatusCode::OK);
        let list = json.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["key"], "garlic_pasta");
        assert_eq!(list[1]["key"], "scrambled_eggs");
        assert!(list[0]["description"].is_string());
    }

    #[tokio::test]
    async fn start_session_returns_greeting() {
        let app = test_app();
        let (status, json) = call(
            &app,
            "POST",
            "/session/start",
            Some(serde_json::json!({ "recipe_key": "scrambled_eggs" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["recipe_name"], "Soft Scrambled Eggs");
        assert!(json["reply"].as_str().unwrap().starts_with("Let's cook Soft Scrambled Eggs!"));
        assert!(json["session_id"].is_string());
    }

    #[tokio::test]
    async fn unknown_recipe_is_404() {
        let (status, json) = call(
            &test_app(),
            "POST",
            "/session/start",
            Some(serde_json::json!({ "recipe_key": "nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["status"], "error");
    }

    #[tokio::test]
    async fn message_runs_command_engine() {
        let app = test_app();
        let id = start(&app, "garlic_pasta").await;
        let uri = format!("/session/{}/message", id);

        let (status, json) = call(&app, "POST", &uri, Some(serde_json::json!({ "message": "next" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["current_step"], 1);
        assert_eq!(json["total_steps"], 7);
        assert_eq!(json["handled"], true);

        let (_, json) = call(&app, "POST", &uri, Some(serde_json::json!({ "message": "sub butter for olive oil" }))).await;
        assert_eq!(json["substitutions"]["3 tablespoons olive oil"], "butter");

        let (_, json) = call(&app, "GET", &format!("/session/{}", id), None).await;
        assert_eq!(json["recipe_name"], "Simple Garlic Pasta");
        assert_eq!(json["current_step"], 1);
        assert_eq!(json["message_count"], 5);
    }

    #[tokio::test]
    async fn free_text_uses_mock_fallback() {
        let app = test_app();
        let id = start(&app, "garlic_pasta").await;
        let (status, json) = call(
            &app,
            "POST",
            &format!("/session/{}/message", id),
            Some(serde_json::json!({ "message": "alright I'm finished boiling" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["handled"], false);
        assert!(json["reply"].as_str().unwrap().starts_with("[Mock LLM]"));
        assert_eq!(json["current_step"], 1);
    }

    #[tokio::test]
    async fn empty_message_is_400() {
        let app = test_app();
        let id = start(&app, "garlic_pasta").await;
        let (status, json) = call(
            &app,
            "POST",
            &format!("/session/{}/message", id),
            Some(serde_json::json!({ "message": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Message cannot be empty");
    }

    #[tokio::test]
    async fn delete_then_lookup_is_404() {
        let app = test_app();
        let id = start(&app, "garlic_pasta").await;

        let (_, json) = call(&app, "GET", "/sessions", None).await;
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["recipe_name"], "Simple Garlic Pasta");

        let (status, json) = call(&app, "DELETE", &format!("/session/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Session deleted");

        let (status, _) = call(&app, "GET", &format!("/session/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, "DELETE", &format!("/session/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn broadcast_layer_forwards_fields() {
        let (tx, mut rx) = broadcast::channel(8);
        let subscriber = tracing_subscriber::registry().with(LogBroadcastLayer::new(tx));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "souschef::gateway", session_id = "abc", "Session started");
        });
        let line = rx.try_recv().unwrap();
        assert_eq!(line, "INFO [souschef::gateway] Session started session_id=abc");
    }
}
