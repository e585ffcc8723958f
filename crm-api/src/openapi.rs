//! OpenAPI document for the Leadline REST API.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::{agent, comment, health, integrity, lead, reporting, tag};
use crate::services::{CommentLink, IntegrityReport, RepairReport};
use crate::telemetry::metrics;
use crate::types::{AddTagsRequest, CreateCommentRequest, DeleteResponse};

use crm_core::{
    Agent, Comment, ConversionReport, EntityType, Lead, LeadUpdate, NewAgent, NewLead, NewTag,
    PipelineSummary, ResolvedLead, StatusCount, Tag,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leadline API",
        version = "0.1.0",
        description = "Lead tracking backend: leads, agents, comments, tags and pipeline reporting",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Leads", description = "Sales leads and their pipeline status"),
        (name = "Comments", description = "Notes attached to leads"),
        (name = "Tags", description = "Tag catalog and lead tagging"),
        (name = "Agents", description = "Sales agents leads can be assigned to"),
        (name = "Reporting", description = "Pipeline and conversion figures"),
        (name = "Integrity", description = "Lead/comment link checks"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        lead::create_lead,
        lead::list_leads,
        lead::get_lead,
        lead::update_lead,
        lead::delete_lead,
        comment::create_comment,
        comment::list_comments,
        tag::create_tag,
        tag::list_tags,
        tag::add_lead_tags,
        agent::create_agent,
        agent::list_agents,
        reporting::pipeline,
        reporting::conversions,
        reporting::summary,
        integrity::comment_report,
        integrity::repair_comments,
        health::ping,
        health::liveness,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(
        schemas(
            Lead,
            NewLead,
            LeadUpdate,
            ResolvedLead,
            Agent,
            NewAgent,
            Comment,
            Tag,
            NewTag,
            StatusCount,
            ConversionReport,
            PipelineSummary,
            EntityType,
            CreateCommentRequest,
            AddTagsRequest,
            DeleteResponse,
            IntegrityReport,
            CommentLink,
            RepairReport,
            health::HealthResponse,
            health::HealthStatus,
            health::HealthDetails,
            health::ComponentHealth,
            ApiError,
            ErrorCode,
        )
    )
)]
pub struct ApiDoc;
