//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; the API binary installs the
//! Prometheus recorder that exports them.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_SUBMITTED_TOTAL: &str = "scenecast_jobs_submitted_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "scenecast_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "scenecast_jobs_failed_total";
    pub const JOB_DURATION_SECONDS: &str = "scenecast_job_duration_seconds";
    pub const DISPATCH_DURATION_SECONDS: &str = "scenecast_dispatch_duration_seconds";
    pub const SCENES_RENDERED_TOTAL: &str = "scenecast_scenes_rendered_total";
}

/// Execution mode label values.
pub mod mode {
    pub const DISTRIBUTED: &str = "distributed";
    pub const SYNC: &str = "sync";
}

pub fn record_job_submitted(mode: &'static str) {
    counter!(names::JOBS_SUBMITTED_TOTAL, "mode" => mode).increment(1);
}

pub fn record_job_completed(mode: &'static str, duration_secs: f64) {
    counter!(names::JOBS_COMPLETED_TOTAL, "mode" => mode).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, "mode" => mode).record(duration_secs);
}

/// Record a failed job, labelled with the stage that failed.
pub fn record_job_failed(mode: &'static str, stage: &'static str) {
    counter!(names::JOBS_FAILED_TOTAL, "mode" => mode, "stage" => stage).increment(1);
}

pub fn record_dispatch_duration(workers: usize, duration_secs: f64) {
    let labels = [("workers", workers.to_string())];
    histogram!(names::DISPATCH_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_scenes_rendered(mode: &'static str, count: usize) {
    counter!(names::SCENES_RENDERED_TOTAL, "mode" => mode).increment(count as u64);
}
