//! HTTP routes for the browser surface

use crate::jobs::JobRunner;
use crate::session::{Notice, SharedSession, View};
use crate::views;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use stemdeck_core::catalog::{Catalog, TrackEntry};
use tokio_util::io::ReaderStream;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub session: SharedSession,
    pub jobs: Arc<JobRunner>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/process", post(process))
        .route("/cancel", post(cancel))
        .route("/open/:name", post(open_track))
        .route("/back", post(back))
        .route("/delete/:name", post(delete_track))
        .route("/audio/:name/:file", get(stream_audio))
        .route("/download/:name/:file", get(download_audio))
        .route("/status", get(status))
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let job = state.jobs.snapshot().await;
    let mut session = state.session.write().await;
    let notice = session.take_notice();

    let body = match session.view().clone() {
        View::Detail(name) => match state.catalog.entry(&name) {
            Some(entry) => views::detail(&entry),
            None => {
                // Selection vanished from disk; fall back to the list.
                session.close();
                views::list(&list_entries(&state.catalog))
            }
        },
        View::Index => views::list(&list_entries(&state.catalog)),
    };

    Html(views::page(&body, job.as_ref(), notice.as_ref()))
}

fn list_entries(catalog: &Catalog) -> Vec<TrackEntry> {
    match catalog.list() {
        Ok(entries) => entries,
        Err(e) => {
            warn!("catalog listing failed: {}", e);
            Vec::new()
        }
    }
}

#[derive(Deserialize)]
struct ProcessForm {
    url: String,
    name: String,
}

async fn process(State(state): State<AppState>, Form(form): Form<ProcessForm>) -> Redirect {
    let url = form.url.trim().to_string();
    let name = form.name.trim().to_string();

    let notice = if url.is_empty() {
        Notice::Error("the URL field is required".to_string())
    } else if name.is_empty() {
        Notice::Error("name your track first".to_string())
    } else {
        match state.jobs.submit(url, name).await {
            Ok(job) => Notice::Info(format!("processing {} started", job.name)),
            Err(e) => Notice::Error(e.to_string()),
        }
    };

    state.session.write().await.push_notice(notice);
    Redirect::to("/")
}

async fn cancel(State(state): State<AppState>) -> Redirect {
    let notice = if state.jobs.cancel().await {
        Notice::Info("cancelling the current run".to_string())
    } else {
        Notice::Error("nothing is processing".to_string())
    };
    state.session.write().await.push_notice(notice);
    Redirect::to("/")
}

async fn open_track(State(state): State<AppState>, Path(name): Path<String>) -> Redirect {
    let mut session = state.session.write().await;
    if state.catalog.entry(&name).is_some() {
        session.open(name);
    } else {
        session.push_notice(Notice::Error(format!("no such track: {name}")));
    }
    Redirect::to("/")
}

async fn back(State(state): State<AppState>) -> Redirect {
    state.session.write().await.close();
    Redirect::to("/")
}

async fn delete_track(State(state): State<AppState>, Path(name): Path<String>) -> Redirect {
    let mut session = state.session.write().await;
    match state.catalog.delete(&name) {
        Ok(()) => {
            session.close();
            session.push_notice(Notice::Success(format!("{name} deleted")));
        }
        Err(e) => {
            session.push_notice(Notice::Error(format!("could not delete {name}: {e}")));
        }
    }
    Redirect::to("/")
}

async fn stream_audio(
    State(state): State<AppState>,
    Path((name, file)): Path<(String, String)>,
) -> Response {
    serve_file(&state, &name, &file, false).await
}

async fn download_audio(
    State(state): State<AppState>,
    Path((name, file)): Path<(String, String)>,
) -> Response {
    serve_file(&state, &name, &file, true).await
}

/// Stream a whitelisted result file, inline or as an attachment.
async fn serve_file(state: &AppState, name: &str, file: &str, attachment: bool) -> Response {
    let Some(path) = state.catalog.resolve_file(name, file) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let audio = match tokio::fs::File::open(&path).await {
        Ok(f) => f,
        Err(e) => {
            warn!("could not open {}: {}", path.display(), e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let body = Body::from_stream(ReaderStream::new(audio));
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "audio/mpeg");
    if attachment {
        builder = builder.header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{name}_{file}\""),
        );
    }
    builder.body(body).unwrap()
}

#[derive(Serialize)]
struct StatusResponse {
    processing: bool,
    name: Option<String>,
    stage: Option<String>,
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    match state.jobs.snapshot().await {
        Some(job) => Json(StatusResponse {
            processing: true,
            name: Some(job.name),
            stage: Some(job.stage),
        }),
        None => Json(StatusResponse {
            processing: false,
            name: None,
            stage: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use stemdeck_core::Config;
    use tokio::sync::RwLock;

    fn state(root: std::path::PathBuf) -> AppState {
        let session: SharedSession = Arc::new(RwLock::new(Session::new()));
        AppState {
            catalog: Catalog::new(root),
            jobs: Arc::new(JobRunner::new(Config::default(), Arc::clone(&session))),
            session,
        }
    }

    #[tokio::test]
    async fn test_serve_file_rejects_unknown_names() {
        let tmp = tempfile::tempdir().unwrap();
        let state = state(tmp.path().to_path_buf());

        let response = serve_file(&state, "../etc", "vocals.mp3", false).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = serve_file(&state, "ghost", "vocals.mp3", false).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serve_file_streams_known_stem() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("Test_Song");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("vocals.mp3"), b"mp3-bytes").unwrap();

        let state = state(tmp.path().to_path_buf());
        let response = serve_file(&state, "Test_Song", "vocals.mp3", true).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_DISPOSITION)
                .unwrap()
                .to_str()
                .unwrap(),
            "attachment; filename=\"Test_Song_vocals.mp3\""
        );
    }

    #[tokio::test]
    async fn test_status_json_shape() {
        let tmp = tempfile::tempdir().unwrap();
        let Json(response) = status(State(state(tmp.path().to_path_buf()))).await;
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({ "processing": false, "name": null, "stage": null })
        );
    }

    #[tokio::test]
    async fn test_delete_clears_selection() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("Test_Song");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("vocals.mp3"), b"mp3").unwrap();

        let state = state(tmp.path().to_path_buf());
        state.session.write().await.open("Test_Song".to_string());

        delete_track(State(state.clone()), Path("Test_Song".to_string())).await;

        assert!(!dir.exists());
        let mut session = state.session.write().await;
        assert_eq!(session.view(), &View::Index);
        assert!(matches!(session.take_notice(), Some(Notice::Success(_))));
    }
}
