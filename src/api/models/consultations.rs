use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Consultation record as listed by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consultation {
    #[serde(deserialize_with = "crate::core::serde_ext::string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "crate::core::serde_ext::string_or_number")]
    pub patient_id: String,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default, deserialize_with = "crate::core::serde_ext::opt_string_or_number")]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Per-image inference outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    pub filename: String,
    pub diagnosis: String,
    pub confidence: f64,
    pub probability: f64,
}

/// Outcome of a consultation submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    #[serde(deserialize_with = "crate::core::serde_ext::string_or_number")]
    pub consultation_id: String,
    pub diagnosis: String,
    pub probability: f64,
    #[serde(default)]
    pub image_analyses: Vec<ImageAnalysis>,
}

impl DiagnosisResult {
    /// Overall probability as a percentage for display
    pub fn probability_percent(&self) -> f64 {
        (self.probability * 100.0).clamp(0.0, 100.0)
    }
}

/// Image selected for upload
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

impl ImageFile {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Everything the consultation endpoint needs for one analysis
#[derive(Debug, Clone)]
pub struct ConsultationSubmission {
    pub patient_id: String,
    pub date: chrono::NaiveDate,
    pub notes: String,
    pub images: Vec<ImageFile>,
}
