//! Typed client for the stroke detection REST API

use crate::api::models::{
    Consultation, ConsultationSubmission, DashboardStats, DiagnosisResult, Patient, PatientInput,
    Payload, SuccessResponse, UserSummary,
};
use crate::auth::models::{Credentials, LoginRequest, LoginResponse};
use crate::core::error::{ApiErrorBody, DashboardError, Result};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| DashboardError::Config(format!("Invalid API base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(DashboardError::Config(format!("'{}' cannot be used as a base URL", base_url)));
        }

        let client = Client::builder()
            .user_agent(concat!("stroke-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DashboardError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `<base>/<segments...>`, keeping any path already in the base URL
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| DashboardError::Config("API base URL cannot have paths".to_string()))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    // Authentication

    /// POST /auth/login
    ///
    /// Credential rejections come back as `Ok` with `success == false`; only
    /// transport and unexpected server failures are errors.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        let url = self.endpoint(&["auth", "login"])?;
        tracing::debug!(%url, username = %credentials.username, "Sending login request");

        let response = self
            .client
            .post(url)
            .json(&LoginRequest {
                username: &credentials.username,
                password: &credentials.password,
            })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        let rejection = matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        );
        if !status.is_success() && !rejection {
            return Err(status_error(status, &body));
        }

        match serde_json::from_str::<LoginResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if rejection => Ok(LoginResponse {
                success: false,
                data: None,
                error: ApiErrorBody::parse(&body).into_message(),
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Malformed login response");
                Err(DashboardError::server_unexplained("Unexpected response from server"))
            }
        }
    }

    // Users

    /// GET /users
    pub async fn list_users(&self) -> Result<Vec<UserSummary>> {
        let url = self.endpoint(&["users"])?;
        self.fetch_json::<Payload<Vec<UserSummary>>>(self.client.get(url))
            .await
            .map(Payload::into_inner)
    }

    // Patients

    /// GET /patients
    pub async fn list_patients(&self) -> Result<Vec<Patient>> {
        let url = self.endpoint(&["patients"])?;
        self.fetch_json::<Payload<Vec<Patient>>>(self.client.get(url))
            .await
            .map(Payload::into_inner)
    }

    /// GET /patients/{id}
    pub async fn get_patient(&self, id: &str) -> Result<Patient> {
        let url = self.endpoint(&["patients", id])?;
        self.fetch_json::<Payload<Patient>>(self.client.get(url))
            .await
            .map(Payload::into_inner)
    }

    /// POST /patients
    pub async fn create_patient(&self, input: &PatientInput) -> Result<Patient> {
        input.validate()?;
        let url = self.endpoint(&["patients"])?;
        self.fetch_json::<Payload<Patient>>(self.client.post(url).json(input))
            .await
            .map(Payload::into_inner)
    }

    /// PUT /patients/{id}
    pub async fn update_patient(&self, id: &str, input: &PatientInput) -> Result<Patient> {
        input.validate()?;
        let url = self.endpoint(&["patients", id])?;
        self.fetch_json::<Payload<Patient>>(self.client.put(url).json(input))
            .await
            .map(Payload::into_inner)
    }

    /// DELETE /patients/{id}
    pub async fn delete_patient(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&["patients", id])?;
        self.delete(url).await
    }

    // Consultations

    /// GET /consultations, optionally filtered by patient
    pub async fn list_consultations(&self, patient_id: Option<&str>) -> Result<Vec<Consultation>> {
        let url = self.endpoint(&["consultations"])?;
        let mut request = self.client.get(url);
        if let Some(patient_id) = patient_id {
            request = request.query(&[("patient_id", patient_id)]);
        }
        self.fetch_json::<Payload<Vec<Consultation>>>(request)
            .await
            .map(Payload::into_inner)
    }

    /// GET /consultations/{id}
    pub async fn get_consultation(&self, id: &str) -> Result<Consultation> {
        let url = self.endpoint(&["consultations", id])?;
        self.fetch_json::<Payload<Consultation>>(self.client.get(url))
            .await
            .map(Payload::into_inner)
    }

    /// DELETE /consultations/{id}
    pub async fn delete_consultation(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&["consultations", id])?;
        self.delete(url).await
    }

    /// POST /consultations as multipart form data
    pub async fn create_consultation(&self, submission: &ConsultationSubmission) -> Result<DiagnosisResult> {
        let url = self.endpoint(&["consultations"])?;

        let mut form = Form::new()
            .text("patient_id", submission.patient_id.clone())
            .text("date", submission.date.format("%Y-%m-%d").to_string())
            .text("notes", submission.notes.clone());
        for image in &submission.images {
            let part = Part::bytes(image.data.to_vec())
                .file_name(image.filename.clone())
                .mime_str(&image.content_type)
                .map_err(|e| {
                    DashboardError::Validation(format!(
                        "'{}' has an invalid content type: {}",
                        image.filename, e
                    ))
                })?;
            form = form.part("images", part);
        }

        tracing::info!(
            patient_id = %submission.patient_id,
            images = submission.images.len(),
            "Submitting consultation for analysis"
        );

        self.fetch_json::<Payload<DiagnosisResult>>(self.client.post(url).multipart(form))
            .await
            .map(Payload::into_inner)
    }

    /// GET /consultations/{id}/report (binary document)
    pub async fn download_report(&self, consultation_id: &str) -> Result<Bytes> {
        let url = self.endpoint(&["consultations", consultation_id, "report"])?;
        let response = self.send(self.client.get(url)).await?;
        response.bytes().await.map_err(transport_error)
    }

    // Dashboard

    /// GET /dashboard/stats
    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let url = self.endpoint(&["dashboard", "stats"])?;
        self.fetch_json::<Payload<DashboardStats>>(self.client.get(url))
            .await
            .map(Payload::into_inner)
    }

    /// Send a request and turn non-2xx responses into errors
    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }

    /// DELETE and check the acknowledgement; an empty body counts as success
    async fn delete(&self, url: Url) -> Result<()> {
        let response = self.send(self.client.delete(url)).await?;
        let body = response.text().await.map_err(transport_error)?;
        match serde_json::from_str::<SuccessResponse>(&body) {
            Ok(SuccessResponse { success: false, message: Some(message) }) => {
                Err(DashboardError::server(message))
            }
            Ok(SuccessResponse { success: false, message: None }) => Err(
                DashboardError::server_unexplained("The server refused the deletion"),
            ),
            _ => Ok(()),
        }
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        let body = response.text().await.map_err(transport_error)?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(error = %e, "Malformed API response");
            DashboardError::server_unexplained("Unexpected response from server")
        })
    }
}

/// Prefix of the messages used when the server gave no reason of its own
const GENERIC_FAILURE: &str = "Request failed";

/// Classify a failure that happened before a response was received.
///
/// Only a connection that could not be established counts as the server
/// being unreachable. Timeouts and broken bodies may have reached the server
/// and are reported as server errors.

fn transport_error(err: reqwest::Error) -> DashboardError {
    if err.is_connect() {
        tracing::warn!(error = %err, "API server unreachable");
        DashboardError::Connectivity(err.to_string())
    } else if err.is_timeout() {
        DashboardError::server_unexplained("The server did not respond in time")
    } else {
        DashboardError::server_unexplained(format!("{}: {}", GENERIC_FAILURE, err))
    }
}

/// Map a non-2xx response, surfacing the server's own message when it sent one
fn status_error(status: StatusCode, body: &str) -> DashboardError {
    let message = ApiErrorBody::parse(body).into_message();
    tracing::debug!(%status, message = ?message, "API request failed");

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DashboardError::Authentication(
            message.unwrap_or_else(|| "You are not authorized to perform this action".to_string()),
        ),
        _ => match message {
            Some(message) => DashboardError::server(message),
            None => DashboardError::server_unexplained(format!(
                "{} with status {}",
                GENERIC_FAILURE,
                status.as_u16()
            )),
        },
    }
}
