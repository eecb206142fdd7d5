//! Diagnosis submission
//!
//! Collects images for one consultation, uploads them for analysis and
//! fetches the resulting report.

pub mod images;
pub mod flow;

pub use flow::{ConsultationDraft, DiagnosisFlow};
pub use images::{ImageFilter, Rejection};
