//! Statistics page data
//!
//! Turns the aggregated figures from `/dashboard/stats` into the summary
//! cards and chart series the front end renders.

use crate::api::models::{Consultation, DashboardStats};
use crate::api::ApiClient;
use crate::core::error::Result;
use serde::Serialize;

/// Labels, raw values and their share of the total, index aligned
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
    pub percentages: Vec<f64>,
}

impl ChartSeries {
    fn from_pairs(pairs: impl IntoIterator<Item = (String, u64)>) -> Self {
        let (labels, values): (Vec<String>, Vec<u64>) = pairs.into_iter().unzip();
        let total: u64 = values.iter().sum();
        let percentages = values
            .iter()
            .map(|&v| {
                if total == 0 {
                    0.0
                } else {
                    v as f64 * 100.0 / total as f64
                }
            })
            .collect();
        Self { labels, values, percentages }
    }

    /// Diagnosis label distribution (pie chart)
    pub fn diagnosis_distribution(stats: &DashboardStats) -> Self {
        Self::from_pairs(
            stats
                .diagnosis_distribution
                .iter()
                .map(|d| (d.label.clone(), d.count)),
        )
    }

    /// Consultations per month (line chart)
    pub fn monthly_trend(stats: &DashboardStats) -> Self {
        Self::from_pairs(
            stats
                .monthly_consultations
                .iter()
                .map(|m| (m.month.clone(), m.count)),
        )
    }

    pub fn total(&self) -> u64 {
        self.values.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Headline figures
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_patients: u64,
    pub total_consultations: u64,
    pub stroke_cases: u64,
    pub normal_cases: u64,
}

impl Summary {
    /// Share of diagnosed cases that were strokes, in percent
    pub fn stroke_rate(&self) -> f64 {
        let diagnosed = self.stroke_cases + self.normal_cases;
        if diagnosed == 0 {
            0.0
        } else {
            self.stroke_cases as f64 * 100.0 / diagnosed as f64
        }
    }
}

impl From<&DashboardStats> for Summary {
    fn from(stats: &DashboardStats) -> Self {
        Self {
            total_patients: stats.total_patients,
            total_consultations: stats.total_consultations,
            stroke_cases: stats.stroke_cases,
            normal_cases: stats.normal_cases,
        }
    }
}

/// Everything the statistics page shows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardView {
    pub summary: Summary,
    pub distribution: ChartSeries,
    pub trend: ChartSeries,
    pub recent: Vec<Consultation>,
}

impl DashboardView {
    pub fn from_stats(stats: DashboardStats) -> Self {
        Self {
            summary: Summary::from(&stats),
            distribution: ChartSeries::diagnosis_distribution(&stats),
            trend: ChartSeries::monthly_trend(&stats),
            recent: stats.recent_consultations,
        }
    }

    pub async fn load(api: &ApiClient) -> Result<Self> {
        let stats = api.dashboard_stats().await?;
        tracing::debug!(
            patients = stats.total_patients,
            consultations = stats.total_consultations,
            "Dashboard statistics loaded"
        );
        Ok(Self::from_stats(stats))
    }
}
