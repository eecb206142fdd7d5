use serde::{Deserialize, Serialize};

// Dashboard statistics API models

/// Aggregated figures behind the statistics page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_patients: u64,
    #[serde(default)]
    pub total_consultations: u64,
    #[serde(default)]
    pub stroke_cases: u64,
    #[serde(default)]
    pub normal_cases: u64,
    /// Consultations per month, oldest first
    #[serde(default)]
    pub monthly_consultations: Vec<MonthlyCount>,
    /// Count per diagnosis label
    #[serde(default)]
    pub diagnosis_distribution: Vec<LabelCount>,
    #[serde(default)]
    pub recent_consultations: Vec<super::Consultation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCount {
    /// `YYYY-MM`
    pub month: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: u64,
}
