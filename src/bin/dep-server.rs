use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use ognibuild::debian::apt::{dependency_to_possible_deb_dependencies, AptManager};
use ognibuild::dependency::{dependency_from_json, known_families};
#[cfg(target_os = "linux")]
use ognibuild::session::schroot::SchrootSession;
use ognibuild::session::{plain::PlainSession, Session};
use std::io::Write;
use std::sync::Arc;

#[derive(Parser)]
struct Args {
    #[clap(short, long)]
    listen_address: String,

    #[clap(short, long)]
    port: u16,

    #[cfg(target_os = "linux")]
    #[clap(short, long)]
    schroot: Option<String>,

    #[clap(short, long)]
    debug: bool,
}

#[derive(Clone)]
struct AppState {
    session: Arc<dyn Session + Send + Sync>,
}

#[derive(serde::Deserialize)]
struct ResolveAptRequest {
    requirement: serde_json::Value,
}

async fn families_handler() -> Json<Vec<&'static str>> {
    Json(known_families())
}

fn family_unknown_response() -> Response {
    let mut response = StatusCode::NOT_FOUND.into_response();
    response
        .headers_mut()
        .insert("Reason", HeaderValue::from_static("family-unknown"));
    response
}

async fn resolve_apt_handler(
    State(state): State<AppState>,
    Json(body): Json<ResolveAptRequest>,
) -> Response {
    let mut tuple = match body.requirement {
        serde_json::Value::Array(items) if items.len() == 2 => items,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                "requirement must be a [family, payload] tuple",
            )
                .into_response();
        }
    };
    let payload = tuple.remove(1);
    let family = match tuple.remove(0) {
        serde_json::Value::String(s) => s,
        _ => {
            return (StatusCode::BAD_REQUEST, "requirement family must be a string")
                .into_response();
        }
    };

    let dep = match dependency_from_json(&family, payload) {
        Some(dep) => dep,
        None => return family_unknown_response(),
    };

    let apt = AptManager::from_session(state.session.as_ref());
    let candidates = dependency_to_possible_deb_dependencies(&apt, dep.as_ref());
    Json(candidates).into_response()
}

#[tokio::main]
async fn main() -> Result<(), i8> {
    let args = Args::parse();

    env_logger::builder()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .filter(
            None,
            if args.debug {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            },
        )
        .init();

    #[cfg(target_os = "linux")]
    let session: Arc<dyn Session + Send + Sync> = if let Some(schroot) = args.schroot {
        Arc::new(SchrootSession::new(&schroot, None).unwrap())
    } else {
        Arc::new(PlainSession::new())
    };

    #[cfg(not(target_os = "linux"))]
    let session: Arc<dyn Session + Send + Sync> = Arc::new(PlainSession::new());

    let state = AppState { session };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/version", get(|| async { env!("CARGO_PKG_VERSION") }))
        .route("/ready", get(|| async { "ok" }))
        .route("/families", get(families_handler))
        .route("/resolve-apt", post(resolve_apt_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind((args.listen_address.as_str(), args.port))
        .await
        .unwrap();
    log::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
    Ok(())
}
