use crate::api::models::{ConsultationSubmission, DiagnosisResult, ImageFile};
use crate::api::ApiClient;
use crate::core::busy::BusyFlag;
use crate::core::error::{DashboardError, Result};
use crate::core::notify::Notification;
use crate::diagnosis::images::{self, ImageFilter, Rejection};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const SUBMIT_FAILED: &str = "Failed to analyse images";
const REPORT_FAILED: &str = "Failed to download report";

/// Form state for a consultation that has not been submitted yet
#[derive(Debug, Clone, PartialEq)]
pub struct ConsultationDraft {
    pub patient_id: String,
    pub date: NaiveDate,
    pub notes: String,
    pub images: Vec<ImageFile>,
}

impl Default for ConsultationDraft {
    fn default() -> Self {
        Self {
            patient_id: String::new(),
            date: chrono::Local::now().date_naive(),
            notes: String::new(),
            images: Vec::new(),
        }
    }
}

/// Image selection, submission and report retrieval for one consultation
pub struct DiagnosisFlow {
    api: ApiClient,
    filter: ImageFilter,
    draft: Mutex<ConsultationDraft>,
    result: Mutex<Option<DiagnosisResult>>,
    submitting: BusyFlag,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl DiagnosisFlow {
    pub fn new(api: ApiClient, max_image_bytes: u64) -> Self {
        Self {
            api,
            filter: ImageFilter::new(max_image_bytes),
            draft: Mutex::new(ConsultationDraft::default()),
            result: Mutex::new(None),
            submitting: BusyFlag::new(),
        }
    }

    pub fn draft(&self) -> ConsultationDraft {
        lock(&self.draft).clone()
    }

    pub fn set_patient(&self, patient_id: impl Into<String>) {
        lock(&self.draft).patient_id = patient_id.into();
    }

    pub fn set_date(&self, date: NaiveDate) {
        lock(&self.draft).date = date;
    }

    pub fn set_notes(&self, notes: impl Into<String>) {
        lock(&self.draft).notes = notes.into();
    }

    /// File names of the images queued for upload, in order
    pub fn pending_images(&self) -> Vec<String> {
        lock(&self.draft)
            .images
            .iter()
            .map(|image| image.filename.clone())
            .collect()
    }

    /// Queue images for upload.
    ///
    /// Files that are not images or exceed the size limit are skipped with
    /// one warning each; the rest are appended in the order given.
    pub fn add_images(&self, files: Vec<ImageFile>) -> Vec<Notification> {
        let mut notices = Vec::new();
        let mut accepted = Vec::new();
        for file in files {
            match self.filter.check(&file) {
                Ok(()) => accepted.push(file),
                Err(rejection) => notices.push(rejected(&file.filename, &rejection)),
            }
        }

        if !accepted.is_empty() {
            tracing::debug!(count = accepted.len(), "Images queued");
            lock(&self.draft).images.extend(accepted);
        }
        notices
    }

    /// Queue images from disk, checking type and size before reading
    pub fn add_image_paths(&self, paths: &[PathBuf]) -> Vec<Notification> {
        let mut notices = Vec::new();
        let mut loaded = Vec::new();
        for path in paths {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());

            let precheck = self
                .filter
                .check_type(&images::content_type_for(path))
                .and_then(|()| match std::fs::metadata(path) {
                    Ok(meta) => self.filter.check_size(meta.len()),
                    Err(e) => Err(Rejection::Unreadable { reason: e.to_string() }),
                });
            if let Err(rejection) = precheck {
                notices.push(rejected(&name, &rejection));
                continue;
            }

            match images::load_image(path) {
                Ok(image) => loaded.push(image),
                Err(e) => notices.push(rejected(
                    &name,
                    &Rejection::Unreadable { reason: e.to_string() },
                )),
            }
        }

        notices.extend(self.add_images(loaded));
        notices
    }

    /// Drop the queued image at `index`; out of range is a no-op
    pub fn remove_image(&self, index: usize) -> Option<ImageFile> {
        let mut draft = lock(&self.draft);
        if index < draft.images.len() {
            Some(draft.images.remove(index))
        } else {
            None
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.is_set()
    }

    /// Result of the last successful submission
    pub fn result(&self) -> Option<DiagnosisResult> {
        lock(&self.result).clone()
    }

    /// Send the draft for analysis.
    ///
    /// On success the result is kept and the draft is cleared. On failure
    /// the draft is left as it was so the user can retry.
    pub async fn submit(&self) -> Result<DiagnosisResult> {
        let draft = self.draft();
        if draft.patient_id.trim().is_empty() {
            return Err(DashboardError::Validation("Please select a patient".to_string()));
        }
        if draft.images.is_empty() {
            return Err(DashboardError::Validation(
                "Please add at least one image".to_string(),
            ));
        }

        let _busy = self.submitting.acquire("Analysis")?;
        let submission = ConsultationSubmission {
            patient_id: draft.patient_id.trim().to_string(),
            date: draft.date,
            notes: draft.notes,
            images: draft.images,
        };

        match self.api.create_consultation(&submission).await {
            Ok(result) => {
                tracing::info!(
                    consultation_id = %result.consultation_id,
                    diagnosis = %result.diagnosis,
                    "Analysis complete"
                );
                *lock(&self.result) = Some(result.clone());
                *lock(&self.draft) = ConsultationDraft::default();
                Ok(result)
            }
            Err(e) => {
                tracing::error!(error = %e, patient_id = %submission.patient_id, "Analysis failed");
                Err(match e {
                    DashboardError::Server { reported: false, .. } => {
                        DashboardError::server_unexplained(SUBMIT_FAILED)
                    }
                    other => other,
                })
            }
        }
    }

    /// Save the PDF report for a consultation into `dir`.
    ///
    /// Returns the written path. Failures leave the current result alone
    /// and never leave a partial file under the final name.
    pub async fn download_report(&self, consultation_id: &str, dir: &Path) -> Result<PathBuf> {
        let bytes = self.api.download_report(consultation_id).await.map_err(|e| {
            tracing::error!(error = %e, %consultation_id, "Report download failed");
            DashboardError::server_unexplained(REPORT_FAILED)
        })?;

        let path = dir.join(report_file_name(consultation_id));
        save_atomically(dir, &path, &bytes).map_err(|e| {
            tracing::error!(error = %e, path = %path.display(), "Could not save report");
            DashboardError::server_unexplained(REPORT_FAILED)
        })?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "Report saved");
        Ok(path)
    }

    /// Discard the last result. The draft is left as it is.
    pub fn reset(&self) {
        *lock(&self.result) = None;
    }
}

fn save_atomically(dir: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let tmp = path.with_extension("pdf.part");
    if let Err(e) = std::fs::write(&tmp, bytes).and_then(|()| std::fs::rename(&tmp, path)) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

fn rejected(name: &str, rejection: &Rejection) -> Notification {
    Notification::warning(format!("'{}' {} and was skipped", name, rejection))
}

/// `consultation_<id>_report.pdf`, keeping the id filesystem safe
pub fn report_file_name(consultation_id: &str) -> String {
    let safe: String = consultation_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("consultation_{}_report.pdf", safe)
}
