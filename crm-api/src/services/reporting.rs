//! Reporting Service
//!
//! Recomputed on every call from store aggregates.

use crm_core::{
    count_for, ConversionReport, LeadFilter, PipelineSummary, StatusCount, STATUS_CLOSED,
    STATUS_NEW,
};
use crm_storage::CrmStore;

use crate::error::ApiResult;

/// Lead count per status. Group order is whatever the store returns.
pub async fn pipeline(store: &dyn CrmStore) -> ApiResult<Vec<StatusCount>> {
    Ok(store.lead_status_counts().await?)
}

/// Closed leads as a percentage of new leads.
pub async fn conversions(store: &dyn CrmStore) -> ApiResult<ConversionReport> {
    let groups = store.lead_status_counts().await?;
    Ok(ConversionReport::from_counts(
        count_for(&groups, Some(STATUS_NEW)),
        count_for(&groups, Some(STATUS_CLOSED)),
    ))
}

/// Total leads and closed leads.
pub async fn summary(store: &dyn CrmStore) -> ApiResult<PipelineSummary> {
    let total_leads = store.lead_count(&LeadFilter::default()).await?;
    let total_closed = store
        .lead_count(&LeadFilter::with_status(STATUS_CLOSED))
        .await?;
    Ok(PipelineSummary {
        total_leads,
        total_closed,
    })
}
