use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use guillotine_editor::config::LayoutConfig;
use guillotine_editor::editor::{Editor, Moved};
use guillotine_editor::error::PlacementError;
use guillotine_editor::layout::Layout;
use guillotine_editor::pattern::Pattern;
use guillotine_editor::types::{Piece, PieceId, Region, Size};
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

type Shared = Arc<Mutex<Editor>>;
type ApiError = (StatusCode, Json<Rejection>);

#[derive(Debug, Serialize)]
struct Rejection {
    accepted: bool,
    code: &'static str,
    reason: String,
}

impl Rejection {
    fn new(status: StatusCode, code: &'static str, reason: impl ToString) -> ApiError {
        (
            status,
            Json(Rejection {
                accepted: false,
                code,
                reason: reason.to_string(),
            }),
        )
    }
}

fn placement_error(e: PlacementError) -> ApiError {
    let status = match e {
        PlacementError::UnknownPiece(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    tracing::info!(code = e.code(), "rejected: {e}");
    Rejection::new(status, e.code(), e)
}

fn lock(editor: &Shared) -> Result<MutexGuard<'_, Editor>, ApiError> {
    editor.lock().map_err(|_| {
        Rejection::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "poisoned",
            "editor state is unavailable",
        )
    })
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    config: LayoutConfig,
    pieces: Vec<Piece>,
    layout: Layout,
}

impl SessionResponse {
    fn from_editor(editor: &Editor) -> Self {
        Self {
            config: *editor.config(),
            pieces: editor.pieces().to_vec(),
            layout: editor.layout().clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Accepted {
    accepted: bool,
    x: Option<f64>,
    y: Option<f64>,
    region: Option<Region>,
    returned_to_pool: bool,
    layout: Layout,
}

#[derive(Deserialize, Serialize)]
struct NewPiece {
    #[serde(default)]
    name: Option<String>,
    width: f64,
    height: f64,
}

#[derive(Deserialize, Serialize)]
struct Position {
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
struct PatternRequest {
    pattern: serde_json::Value,
    #[serde(default)]
    layout: usize,
    #[serde(default)]
    config: LayoutConfig,
}

async fn new_session(
    State(editor): State<Shared>,
    Json(config): Json<LayoutConfig>,
) -> Result<Json<SessionResponse>, ApiError> {
    tracing::info!(
        body = serde_json::to_string(&config).unwrap_or_default(),
        "POST /session"
    );
    let fresh =
        Editor::new(config).map_err(|e| Rejection::new(StatusCode::BAD_REQUEST, "config", e))?;
    let mut guard = lock(&editor)?;
    *guard = fresh;
    Ok(Json(SessionResponse::from_editor(&guard)))
}

async fn get_layout(State(editor): State<Shared>) -> Result<Json<SessionResponse>, ApiError> {
    let guard = lock(&editor)?;
    Ok(Json(SessionResponse::from_editor(&guard)))
}

async fn add_piece(
    State(editor): State<Shared>,
    Json(req): Json<NewPiece>,
) -> Result<(StatusCode, Json<Piece>), ApiError> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /pieces"
    );
    if !(req.width > 0.0 && req.height > 0.0) {
        return Err(Rejection::new(
            StatusCode::BAD_REQUEST,
            "invalid_size",
            "piece dimensions must be positive",
        ));
    }
    let mut guard = lock(&editor)?;
    let size = Size::new(req.width, req.height);
    let name = req.name.unwrap_or_else(|| size.to_string());
    let id = guard.add_piece(name, size);
    let piece = guard
        .piece(id)
        .cloned()
        .ok_or_else(|| placement_error(PlacementError::UnknownPiece(id)))?;
    Ok((StatusCode::CREATED, Json(piece)))
}

async fn place_piece(
    State(editor): State<Shared>,
    Path(id): Path<PieceId>,
    Json(pos): Json<Position>,
) -> Result<Json<Accepted>, ApiError> {
    let mut guard = lock(&editor)?;
    let placed = guard.place(id, pos.x, pos.y).map_err(placement_error)?;
    Ok(Json(Accepted {
        accepted: true,
        x: Some(placed.x),
        y: Some(placed.y),
        region: Some(placed.region),
        returned_to_pool: false,
        layout: guard.layout().clone(),
    }))
}

async fn move_piece(
    State(editor): State<Shared>,
    Path(id): Path<PieceId>,
    Json(pos): Json<Position>,
) -> Result<Json<Accepted>, ApiError> {
    let mut guard = lock(&editor)?;
    let moved = guard.move_piece(id, pos.x, pos.y).map_err(placement_error)?;
    let layout = guard.layout().clone();
    Ok(Json(match moved {
        Moved::Placed(placed) => Accepted {
            accepted: true,
            x: Some(placed.x),
            y: Some(placed.y),
            region: Some(placed.region),
            returned_to_pool: false,
            layout,
        },
        Moved::ReturnedToPool => Accepted {
            accepted: true,
            x: None,
            y: None,
            region: None,
            returned_to_pool: true,
            layout,
        },
    }))
}

async fn rotate_piece(
    State(editor): State<Shared>,
    Path(id): Path<PieceId>,
) -> Result<Json<SessionResponse>, ApiError> {
    let mut guard = lock(&editor)?;
    guard.rotate(id).map_err(placement_error)?;
    Ok(Json(SessionResponse::from_editor(&guard)))
}

async fn remove_piece(
    State(editor): State<Shared>,
    Path(id): Path<PieceId>,
) -> Result<Json<SessionResponse>, ApiError> {
    let mut guard = lock(&editor)?;
    guard.remove(id).map_err(placement_error)?;
    Ok(Json(SessionResponse::from_editor(&guard)))
}

async fn rebuild(State(editor): State<Shared>) -> Result<Json<Layout>, ApiError> {
    let mut guard = lock(&editor)?;
    Ok(Json(guard.rebuild_all().clone()))
}

async fn load_pattern(
    State(editor): State<Shared>,
    Json(req): Json<PatternRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    tracing::info!(layout = req.layout, "POST /pattern");
    let bad = |e: guillotine_editor::error::PatternError| {
        Rejection::new(StatusCode::BAD_REQUEST, "pattern", e)
    };
    let pattern = Pattern::from_json(&req.pattern.to_string()).map_err(bad)?;
    let sheet = pattern.layout(req.layout).map_err(bad)?;
    let config = sheet.config(&req.config).map_err(bad)?;
    let pieces = sheet.pieces(&config).map_err(bad)?;
    let fresh = Editor::with_pieces(config, pieces)
        .map_err(|e| Rejection::new(StatusCode::BAD_REQUEST, "config", e))?;

    let mut guard = lock(&editor)?;
    *guard = fresh;
    Ok(Json(SessionResponse::from_editor(&guard)))
}

fn app(editor: Shared) -> Router {
    Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/session", post(new_session))
        .route("/layout", get(get_layout))
        .route("/rebuild", post(rebuild))
        .route("/pattern", post(load_pattern))
        .route("/pieces", post(add_piece))
        .route("/pieces/{id}", delete(remove_piece))
        .route("/pieces/{id}/place", post(place_piece))
        .route("/pieces/{id}/move", post(move_piece))
        .route("/pieces/{id}/rotate", post(rotate_piece))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(editor)
}

#[tokio::main]
async fn main() {
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let editor = Editor::new(LayoutConfig::default()).expect("default config is valid");
    let shared: Shared = Arc::new(Mutex::new(editor));

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    eprintln!("Listening on {addr}");
    axum::serve(listener, app(shared)).await.unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared() -> Shared {
        Arc::new(Mutex::new(Editor::new(LayoutConfig::default()).unwrap()))
    }

    async fn add(editor: &Shared, width: f64, height: f64) -> PieceId {
        let (status, Json(piece)) = add_piece(
            State(editor.clone()),
            Json(NewPiece {
                name: None,
                width,
                height,
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        piece.id
    }

    #[tokio::test]
    async fn test_place_and_reject() {
        let editor = shared();
        let a = add(&editor, 400.0, 300.0).await;
        let b = add(&editor, 300.0, 300.0).await;

        let Json(accepted) = place_piece(
            State(editor.clone()),
            Path(a),
            Json(Position { x: 15.0, y: 12.0 }),
        )
        .await
        .unwrap();
        assert_eq!((accepted.x, accepted.y), (Some(10.0), Some(10.0)));
        assert_eq!(accepted.layout.cuts.len(), 1);

        let (status, Json(rejection)) = place_piece(
            State(editor.clone()),
            Path(b),
            Json(Position { x: 100.0, y: 100.0 }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(rejection.code, "collision");

        let (status, _) = rotate_piece(State(editor.clone()), Path(99))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rotate_refused_when_it_strands_a_piece() {
        let editor = shared();
        let a = add(&editor, 400.0, 300.0).await;
        let b = add(&editor, 500.0, 300.0).await;
        for (id, x) in [(a, 10.0), (b, 411.5)] {
            place_piece(
                State(editor.clone()),
                Path(id),
                Json(Position { x, y: 10.0 }),
            )
            .await
            .unwrap();
        }

        let (status, Json(rejection)) = rotate_piece(State(editor.clone()), Path(a))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(rejection.code, "strands_piece");
    }

    #[tokio::test]
    async fn test_move_off_board_and_remove() {
        let editor = shared();
        let a = add(&editor, 400.0, 300.0).await;
        place_piece(
            State(editor.clone()),
            Path(a),
            Json(Position { x: 10.0, y: 10.0 }),
        )
        .await
        .unwrap();

        let Json(moved) = move_piece(
            State(editor.clone()),
            Path(a),
            Json(Position { x: -900.0, y: 10.0 }),
        )
        .await
        .unwrap();
        assert!(moved.returned_to_pool);
        assert!(moved.layout.cuts.is_empty());

        let (status, Json(rejection)) = remove_piece(State(editor.clone()), Path(a))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(rejection.code, "not_placed");
    }

    #[tokio::test]
    async fn test_session_and_pattern() {
        let editor = shared();
        let bad = LayoutConfig {
            kerf: -1.0,
            ..Default::default()
        };
        let (status, _) = new_session(State(editor.clone()), Json(bad))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let pattern = serde_json::json!([{"layout": [{"part": [
            {"part": 1, "width": 400, "length": 300, "x": 0, "y": 0}
        ]}]}]);
        let Json(session) = load_pattern(
            State(editor.clone()),
            Json(PatternRequest {
                pattern,
                layout: 0,
                config: LayoutConfig::default(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(session.pieces.len(), 1);
        assert_eq!(session.layout.cuts.len(), 1);

        let Json(layout) = rebuild(State(editor.clone())).await.unwrap();
        assert_eq!(layout, session.layout);
    }
}
