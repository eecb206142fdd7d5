//! In-process stand-in for the remote API, used by tests

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// What the consultation endpoint received
#[derive(Debug, Clone, Default)]
pub struct RecordedUpload {
    pub patient_id: String,
    pub date: String,
    pub notes: String,
    /// (filename, content type, size)
    pub files: Vec<(String, String, usize)>,
}

#[derive(Default)]
struct MockState {
    requests: AtomicUsize,
    uploads: Mutex<Vec<RecordedUpload>>,
    /// Uploads for patient "hold" park here until released
    upload_started: Notify,
    upload_release: Notify,
}

pub struct MockApi {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockApi {
    /// Number of requests the server has seen
    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    pub fn last_upload(&self) -> Option<RecordedUpload> {
        self.state.uploads.lock().unwrap().last().cloned()
    }

    pub fn uploads(&self) -> usize {
        self.state.uploads.lock().unwrap().len()
    }

    /// Wait until an upload for patient "hold" has arrived
    pub async fn held_upload_started(&self) {
        self.state.upload_started.notified().await;
    }

    pub fn release_held_upload(&self) {
        self.state.upload_release.notify_one();
    }
}

/// Start the mock API on an ephemeral port
pub async fn spawn() -> MockApi {
    let state = Arc::new(MockState::default());

    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/users", get(users))
        .route("/api/patients", get(list_patients).post(create_patient))
        .route(
            "/api/patients/:id",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .route("/api/consultations", get(list_consultations).post(create_consultation))
        .route(
            "/api/consultations/:id",
            get(get_consultation).delete(delete_consultation),
        )
        .route("/api/consultations/:id/report", get(report))
        .route("/api/dashboard/stats", get(stats))
        .layer(DefaultBodyLimit::max(32 * 1024 * 1024))
        .layer(axum::middleware::from_fn_with_state(state.clone(), count_requests))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockApi {
        base_url: format!("http://{}/api", addr),
        state,
    }
}

/// Base URL of a port nobody is listening on
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api", addr)
}

async fn count_requests(
    State(state): State<Arc<MockState>>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    next.run(request).await
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(Json(body): Json<LoginBody>) -> Response {
    let account = match (body.username.as_str(), body.password.as_str()) {
        ("admin", "admin-pass") => Some((1, "Server Admin", "admin")),
        ("doctor", "doctor-pass") => Some((2, "Dr. Amara Okafor", "doctor")),
        ("nurse", "nurse-pass") => Some((3, "Nia Jones", "nurse")),
        _ => None,
    };

    match account {
        Some((id, full_name, role)) => Json(json!({
            "success": true,
            "data": {"id": id, "username": body.username, "full_name": full_name, "role": role}
        }))
        .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "error": "Invalid username or password"})),
        )
            .into_response(),
    }
}

async fn users() -> Json<Value> {
    Json(json!([
        {"id": 1, "username": "admin", "full_name": "Server Admin", "role": "admin"},
        {"id": 2, "username": "doctor", "full_name": "Dr. Amara Okafor", "role": "doctor"}
    ]))
}

fn patient(id: &str) -> Option<Value> {
    match id {
        "1" => Some(json!({"id": 1, "name": "Lena Park", "age": 67, "gender": "F"})),
        "2" => Some(json!({"id": 2, "name": "Tomas Varga", "age": 72, "gender": "M"})),
        _ => None,
    }
}

async fn list_patients() -> Json<Value> {
    Json(json!({"success": true, "data": [patient("1"), patient("2")]}))
}

async fn get_patient(Path(id): Path<String>) -> Response {
    match patient(&id) {
        Some(p) => Json(p).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "Patient not found"}))).into_response(),
    }
}

async fn create_patient(Json(body): Json<Value>) -> Response {
    let mut created = body;
    created["id"] = json!(3);
    (StatusCode::CREATED, Json(json!({"success": true, "data": created}))).into_response()
}

async fn update_patient(Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    if patient(&id).is_none() {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "Patient not found"}))).into_response();
    }
    let mut updated = body;
    updated["id"] = json!(id);
    Json(updated).into_response()
}

async fn delete_patient(Path(id): Path<String>) -> Response {
    match patient(&id) {
        Some(_) => Json(json!({"success": true})).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "Patient not found"}))).into_response(),
    }
}

fn consultations() -> Vec<Value> {
    vec![
        json!({"id": 10, "patient_id": 1, "patient_name": "Lena Park", "date": "2026-09-30",
               "diagnosis": "Normal", "probability": 0.12}),
        json!({"id": 11, "patient_id": 2, "patient_name": "Tomas Varga", "date": "2026-10-02",
               "diagnosis": "Stroke", "probability": 0.88, "doctor_id": 2}),
    ]
}

async fn list_consultations(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let items: Vec<Value> = consultations()
        .into_iter()
        .filter(|c| match params.get("patient_id") {
            Some(pid) => c["patient_id"].to_string() == *pid,
            None => true,
        })
        .collect();
    Json(json!({"success": true, "data": items}))
}

async fn get_consultation(Path(id): Path<String>) -> Response {
    match consultations().into_iter().find(|c| c["id"].to_string() == id) {
        Some(c) => Json(c).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "Consultation not found"}))).into_response(),
    }
}

async fn delete_consultation(Path(id): Path<String>) -> Json<Value> {
    if id == "11" {
        return Json(json!({"success": false, "message": "Consultation has a signed report"}));
    }
    Json(json!({"success": true}))
}

async fn create_consultation(State(state): State<Arc<MockState>>, mut multipart: Multipart) -> Response {
    let mut upload = RecordedUpload::default();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "images" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let data = field.bytes().await.unwrap();
                upload.files.push((filename, content_type, data.len()));
            }
            "patient_id" => upload.patient_id = field.text().await.unwrap(),
            "date" => upload.date = field.text().await.unwrap(),
            "notes" => upload.notes = field.text().await.unwrap(),
            _ => {}
        }
    }
    state.uploads.lock().unwrap().push(upload.clone());

    if upload.patient_id == "hold" {
        state.upload_started.notify_one();
        state.upload_release.notified().await;
    }
    if upload.patient_id == "502" {
        return StatusCode::BAD_GATEWAY.into_response();
    }
    if upload.patient_id == "500" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Model inference failed"})),
        )
            .into_response();
    }

    let analyses: Vec<Value> = upload
        .files
        .iter()
        .map(|(filename, _, _)| {
            json!({"filename": filename, "diagnosis": "Stroke", "confidence": 0.9, "probability": 0.9})
        })
        .collect();
    Json(json!({
        "consultation_id": 91,
        "diagnosis": "Stroke",
        "probability": 0.9,
        "image_analyses": analyses
    }))
    .into_response()
}

async fn report(Path(id): Path<String>) -> Response {
    if id == "404" {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "Report not found"}))).into_response();
    }
    (
        [(axum::http::header::CONTENT_TYPE, "application/pdf")],
        format!("%PDF-1.4 consultation {}", id).into_bytes(),
    )
        .into_response()
}

async fn stats() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "total_patients": 2,
            "total_consultations": 4,
            "stroke_cases": 1,
            "normal_cases": 3,
            "monthly_consultations": [
                {"month": "2026-08", "count": 1},
                {"month": "2026-09", "count": 1},
                {"month": "2026-10", "count": 2}
            ],
            "diagnosis_distribution": [
                {"label": "Stroke", "count": 1},
                {"label": "Normal", "count": 3}
            ],
            "recent_consultations": consultations()
        }
    }))
}
