//! Reporting arithmetic
//!
//! Pure functions over lead counts. Stores supply the counts (natively
//! aggregated where the backend can); these functions only shape them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Status literal counted as the top of the funnel. Case-sensitive.
pub const STATUS_NEW: &str = "New";

/// Status literal counted as a won lead. Case-sensitive.
pub const STATUS_CLOSED: &str = "Closed";

/// One group of the pipeline distribution. A lead without a status is
/// grouped under `_id: null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StatusCount {
    #[serde(rename = "_id")]
    pub status: Option<String>,
    pub count: u64,
}

/// Conversion response body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ConversionReport {
    pub conversion_rate: f64,
}

/// Summary response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PipelineSummary {
    pub total_leads: u64,
    pub total_closed: u64,
}

/// Count statuses in a single pass. Group order is unspecified.
pub fn group_by_status<I, S>(statuses: I) -> Vec<StatusCount>
where
    I: IntoIterator<Item = Option<S>>,
    S: Into<String>,
{
    let mut counts: HashMap<Option<String>, u64> = HashMap::new();
    for status in statuses {
        *counts.entry(status.map(Into::into)).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect()
}

/// Closed-over-new percentage. Zero unless both counts are nonzero.
pub fn conversion_rate(total_new: u64, total_closed: u64) -> f64 {
    if total_new == 0 || total_closed == 0 {
        return 0.0;
    }
    (total_closed as f64 / total_new as f64) * 100.0
}

impl ConversionReport {
    pub fn from_counts(total_new: u64, total_closed: u64) -> Self {
        Self {
            conversion_rate: conversion_rate(total_new, total_closed),
        }
    }
}

/// Look up a single group's count; zero when the group is absent.
pub fn count_for(groups: &[StatusCount], status: Option<&str>) -> u64 {
    groups
        .iter()
        .find(|g| g.status.as_deref() == status)
        .map(|g| g.count)
        .unwrap_or(0)
}
