use std::env;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use dotenv::dotenv;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::{TcpListener, UnixListener};
use tower_http::services::{ServeDir, ServeFile};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use klassiq::curriculum::{self, CurriculumMap, GRADE_BANDS};
use klassiq::lesson::{self, PlanRequest};
use klassiq::merge::{self, MergeReport};
use klassiq::resolve::{self, LookupError, LookupMatch};

struct AppState {
    /// Swapped wholesale on rebuild so in-flight requests keep reading the
    /// map they started with.
    curriculum: RwLock<Option<Arc<CurriculumMap>>>,
    client: reqwest::Client,
    data_dir: PathBuf,
    map_path: PathBuf,
}

impl AppState {
    fn current(&self) -> Result<Arc<CurriculumMap>, LookupError> {
        self.curriculum
            .read()
            .expect("curriculum index lock poisoned")
            .clone()
            .ok_or(LookupError::IndexUnavailable)
    }

    fn publish(&self, map: CurriculumMap) {
        *self
            .curriculum
            .write()
            .expect("curriculum index lock poisoned") = Some(Arc::new(map));
    }
}

#[derive(Debug, Deserialize)]
struct LookupRequest {
    grade: String,
    subject: String,
    topic: String,
}

#[derive(Debug, Deserialize)]
struct LessonRequest {
    grade: String,
    subject: String,
    topic: String,
    teacher_input: Option<String>,
    #[serde(default = "default_language")]
    language: String,
    #[serde(default = "default_classroom_context")]
    classroom_context: String,
    #[serde(default = "default_output_mode")]
    output_mode: String,
}

fn default_language() -> String {
    "English".to_string()
}

fn default_classroom_context() -> String {
    "rural".to_string()
}

fn default_output_mode() -> String {
    "full".to_string()
}

fn fail(e: LookupError) -> (StatusCode, Json<LookupError>) {
    let status = match e {
        LookupError::IndexUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::NOT_FOUND,
    };
    (status, Json(e))
}

#[axum::debug_handler]
async fn health(state: State<Arc<AppState>>) -> Json<Value> {
    let loaded = state
        .curriculum
        .read()
        .expect("curriculum index lock poisoned")
        .is_some();
    Json(json!({
        "status": "ok",
        "index_loaded": loaded,
        "message": "KlassIQ backend is running smoothly."
    }))
}

#[axum::debug_handler]
async fn get_grades() -> Json<Vec<&'static str>> {
    Json(GRADE_BANDS.to_vec())
}

#[axum::debug_handler]
async fn get_subjects(
    state: State<Arc<AppState>>,
    Path(grade): Path<String>,
) -> Result<Json<Vec<String>>, (StatusCode, Json<LookupError>)> {
    let map = state.current().map_err(fail)?;
    let band = resolve::resolve_grade(&grade).map_err(fail)?;
    let subjects = map
        .get(band)
        .map(|s| s.keys().cloned().collect())
        .unwrap_or_default();
    Ok(Json(subjects))
}

#[axum::debug_handler]
async fn get_topics(
    state: State<Arc<AppState>>,
    Path((grade, subject)): Path<(String, String)>,
) -> Result<Json<Vec<String>>, (StatusCode, Json<LookupError>)> {
    let map = state.current().map_err(fail)?;
    let band = resolve::resolve_grade(&grade).map_err(fail)?;
    let subjects = match map.get(band) {
        Some(subjects) => subjects,
        None => return Ok(Json(Vec::new())),
    };
    let subject_key = resolve::resolve_subject(subjects, band, &subject).map_err(fail)?;
    Ok(Json(subjects[&subject_key].keys().cloned().collect()))
}

#[axum::debug_handler]
async fn lookup_curriculum(
    state: State<Arc<AppState>>,
    Json(body): Json<LookupRequest>,
) -> Result<Json<LookupMatch>, (StatusCode, Json<LookupError>)> {
    let map = state.current().map_err(fail)?;
    resolve::lookup(&map, &body.grade, &body.subject, &body.topic)
        .map(Json)
        .map_err(fail)
}

#[axum::debug_handler]
async fn generate_plan(
    state: State<Arc<AppState>>,
    Json(body): Json<LessonRequest>,
) -> Result<Json<Value>, (StatusCode, Json<LookupError>)> {
    let map = state.current().map_err(fail)?;
    let matched =
        resolve::lookup(&map, &body.grade, &body.subject, &body.topic).map_err(fail)?;

    let plan = lesson::generate_lesson_plan(
        &state.client,
        &PlanRequest {
            grade: matched.grade.clone(),
            subject: matched.subject.clone(),
            topic: matched.topic.clone(),
            curriculum_context: lesson::curriculum_context(&matched.record),
            teacher_input: body.teacher_input,
            language: body.language,
            classroom_context: body.classroom_context,
            output_mode: body.output_mode,
        },
    )
    .await;

    Ok(Json(json!({
        "grade": matched.grade,
        "subject": matched.subject,
        "topic": matched.topic,
        "objectives": matched.record.objectives,
        "from_cache": plan.from_cache,
        "lesson_plan": plan.result,
    })))
}

#[axum::debug_handler]
async fn rebuild(
    state: State<Arc<AppState>>,
) -> Result<Json<MergeReport>, (StatusCode, String)> {
    match merge::merge(&state.data_dir) {
        Ok((map, report)) => {
            if let Err(e) = curriculum::save_map(&map, &state.map_path) {
                warn!("could not persist curriculum map: {}", e);
            }
            state.publish(map);
            info!(
                "curriculum rebuilt: {} merged, {} skipped",
                report.merged_count(),
                report.skipped_count()
            );
            Ok(Json(report))
        }
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

/// Load the persisted artifact if present, otherwise run a fresh merge.
/// Returns None when neither works; lookups then get IndexUnavailable until
/// an operator triggers /api/rebuild.
fn initial_map(data_dir: &std::path::Path, map_path: &std::path::Path) -> Option<CurriculumMap> {
    if map_path.exists() {
        match curriculum::load_map(map_path) {
            Ok(map) => {
                info!("loaded curriculum map from {}", map_path.display());
                return Some(map);
            }
            Err(e) => warn!(
                "could not load {}, re-merging: {}",
                map_path.display(),
                e
            ),
        }
    }

    match merge::merge(data_dir) {
        Ok((map, report)) => {
            info!(
                "merged curriculum: {} subjects, {} skipped",
                report.merged_count(),
                report.skipped_count()
            );
            if let Err(e) = curriculum::save_map(&map, map_path) {
                warn!("could not persist curriculum map: {}", e);
            }
            Some(map)
        }
        Err(e) => {
            warn!("curriculum merge failed: {}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "klassiq=info,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = PathBuf::from(
        env::var("CURRICULUM_DATA_DIR")
            .unwrap_or_else(|_| "curriculum_data/parsed_jsons".to_string()),
    );
    let map_path = PathBuf::from(
        env::var("CURRICULUM_MAP_PATH").unwrap_or_else(|_| "data/curriculum_map.json".to_string()),
    );

    let map = initial_map(&data_dir, &map_path);

    let shared_state = Arc::new(AppState {
        curriculum: RwLock::new(map.map(Arc::new)),
        client: reqwest::Client::new(),
        data_dir,
        map_path,
    });

    // Parse command-line arguments
    let args: Vec<String> = std::env::args().collect();
    let mut port = "8090".to_string();
    let mut unix_socket = None;

    let mut i = 1; // Skip program name
    while i < args.len() {
        if args[i] == "--unix" && i + 1 < args.len() {
            unix_socket = Some(args[i + 1].clone());
            i += 2; // Skip both --unix and the socket path
        } else {
            port = args[i].clone();
            i += 1;
        }
    }

    let app = Router::new()
        .route_service("/", ServeFile::new("frontend/out/index.html"))
        .route("/api/health", get(health))
        .route("/api/grades", get(get_grades))
        .route("/api/subjects/{grade}", get(get_subjects))
        .route("/api/topics/{grade}/{subject}", get(get_topics))
        .route("/api/lookup", post(lookup_curriculum))
        .route("/api/generate-plan", post(generate_plan))
        .route("/api/rebuild", post(rebuild))
        .fallback_service(ServeDir::new("frontend/out"))
        .with_state(shared_state);

    info!("Initialized routes");

    if let Some(socket_path) = unix_socket {
        // delete the file before binding
        tokio::fs::remove_file(&socket_path).await.ok();
        let listener = UnixListener::bind(&socket_path)?;

        info!("Starting server on Unix socket: {}", socket_path);
        axum::serve(listener, app.into_make_service()).await?;
    } else {
        let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
        info!("Starting server on port {}", port);
        axum::serve(listener, app.into_make_service()).await?;
    }

    Ok(())
}
