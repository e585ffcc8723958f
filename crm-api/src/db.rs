//! Database Connection Pool Module
//!
//! PostgreSQL-backed `CrmStore`. Each collection is a table of JSONB
//! documents keyed by UUIDv7, so `ORDER BY id` is creation order. Documents
//! use the same JSON shape as the wire format.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use crm_core::{
    Agent, AgentId, Comment, CommentId, CrmError, CrmResult, EntityType, Lead, LeadFilter,
    LeadId, LeadUpdate, NewAgent, NewComment, NewLead, NewTag, StatusCount, StorageError, Tag,
};
use crm_storage::CrmStore;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio_postgres::error::SqlState;
use tokio_postgres::NoTls;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// How long to wait for a pooled connection
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "leadline".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("CRM_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("CRM_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("CRM_DB_NAME").unwrap_or_else(|_| "leadline".to_string()),
            user: std::env::var("CRM_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("CRM_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("CRM_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("CRM_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = deadpool_postgres::PoolConfig::new(self.max_size);
        pool_cfg.timeouts.wait = Some(self.timeout);
        cfg.pool = Some(pool_cfg);

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS crm_agents (
    id uuid PRIMARY KEY,
    doc jsonb NOT NULL,
    created_at timestamptz NOT NULL DEFAULT now()
);
CREATE TABLE IF NOT EXISTS crm_leads (
    id uuid PRIMARY KEY,
    doc jsonb NOT NULL,
    created_at timestamptz NOT NULL DEFAULT now()
);
CREATE TABLE IF NOT EXISTS crm_comments (
    id uuid PRIMARY KEY,
    doc jsonb NOT NULL,
    created_at timestamptz NOT NULL DEFAULT now()
);
CREATE TABLE IF NOT EXISTS crm_tags (
    id uuid PRIMARY KEY,
    doc jsonb NOT NULL,
    created_at timestamptz NOT NULL DEFAULT now()
);
CREATE UNIQUE INDEX IF NOT EXISTS crm_tags_name_key ON crm_tags ((doc->>'name'));
CREATE INDEX IF NOT EXISTS crm_leads_status_idx ON crm_leads ((doc->>'status'));
"#;

/// Matches every lead when all four parameters are NULL.
const LEAD_FILTER_SQL: &str = "($1::text IS NULL OR doc->>'assignedAgent' = $1) \
     AND ($2::text IS NULL OR doc->>'status' = $2) \
     AND ($3::text IS NULL OR doc->>'source' = $3) \
     AND ($4::text IS NULL OR doc->>'priority' = $4)";

fn table_for(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Agent => "crm_agents",
        EntityType::Lead => "crm_leads",
        EntityType::Comment => "crm_comments",
        EntityType::Tag => "crm_tags",
    }
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

fn backend_error(err: impl std::fmt::Display) -> CrmError {
    CrmError::Storage(StorageError::Backend {
        reason: err.to_string(),
    })
}

fn to_doc<T: Serialize>(value: &T) -> CrmResult<JsonValue> {
    serde_json::to_value(value).map_err(backend_error)
}

fn from_doc<T: DeserializeOwned>(doc: JsonValue) -> CrmResult<T> {
    serde_json::from_value(doc).map_err(backend_error)
}

fn filter_params(filter: &LeadFilter) -> [Option<String>; 4] {
    [
        filter.assigned_agent.map(|id| id.to_string()),
        filter.status.clone(),
        filter.source.clone(),
        filter.priority.clone(),
    ]
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// Postgres document store behind a deadpool connection pool.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Get a connection from the pool.
    pub async fn get_conn(&self) -> ApiResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(ApiError::from)
    }

    /// Create the collection tables and indexes if they are missing.
    pub async fn ensure_schema(&self) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        conn.batch_execute(SCHEMA_SQL).await?;
        tracing::info!("Database schema ready");
        Ok(())
    }

    async fn conn(&self) -> CrmResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(backend_error)
    }

    async fn insert_doc<T: Serialize + Sync>(
        &self,
        entity_type: EntityType,
        id: Uuid,
        value: &T,
    ) -> CrmResult<()> {
        let doc = to_doc(value)?;
        let sql = format!("INSERT INTO {} (id, doc) VALUES ($1, $2)", table_for(entity_type));
        let conn = self.conn().await?;
        conn.execute(sql.as_str(), &[&id, &doc])
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn list_docs<T: DeserializeOwned>(&self, entity_type: EntityType) -> CrmResult<Vec<T>> {
        let sql = format!("SELECT doc FROM {} ORDER BY id", table_for(entity_type));
        let conn = self.conn().await?;
        let rows = conn.query(sql.as_str(), &[]).await.map_err(backend_error)?;
        rows.into_iter().map(|row| from_doc(row.get(0))).collect()
    }

    /// Fetch documents by id, returned in the order requested.
    async fn get_many_docs<T: DeserializeOwned>(
        &self,
        entity_type: EntityType,
        ids: &[Uuid],
    ) -> CrmResult<Vec<T>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, doc FROM {} WHERE id = ANY($1)",
            table_for(entity_type)
        );
        let conn = self.conn().await?;
        let rows = conn.query(sql.as_str(), &[&ids]).await.map_err(backend_error)?;

        let mut by_id: HashMap<Uuid, JsonValue> = rows
            .into_iter()
            .map(|row| (row.get::<_, Uuid>(0), row.get::<_, JsonValue>(1)))
            .collect();
        ids.iter()
            .filter_map(|id| by_id.remove(id))
            .map(from_doc)
            .collect()
    }

    /// Read-modify-write a single lead under a row lock.
    async fn modify_lead<F>(&self, id: LeadId, modify: F) -> CrmResult<Lead>
    where
        F: FnOnce(&mut Lead) + Send,
    {
        let mut conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(backend_error)?;

        let row = tx
            .query_opt("SELECT doc FROM crm_leads WHERE id = $1 FOR UPDATE", &[&id])
            .await
            .map_err(backend_error)?
            .ok_or_else(|| CrmError::not_found(EntityType::Lead, id))?;

        let mut lead: Lead = from_doc(row.get(0))?;
        modify(&mut lead);
        let doc = to_doc(&lead)?;

        tx.execute("UPDATE crm_leads SET doc = $2 WHERE id = $1", &[&id, &doc])
            .await
            .map_err(backend_error)?;
        tx.commit().await.map_err(backend_error)?;
        Ok(lead)
    }
}

#[async_trait]
impl CrmStore for DbClient {
    // === Agent Operations ===

    async fn agent_insert(&self, new: NewAgent) -> CrmResult<Agent> {
        let agent = Agent::from_new(new);
        self.insert_doc(EntityType::Agent, agent.id, &agent).await?;
        tracing::debug!(agent_id = %agent.id, "Agent inserted");
        Ok(agent)
    }

    async fn agent_list(&self) -> CrmResult<Vec<Agent>> {
        self.list_docs(EntityType::Agent).await
    }

    async fn agent_get_many(&self, ids: &[AgentId]) -> CrmResult<Vec<Agent>> {
        self.get_many_docs(EntityType::Agent, ids).await
    }

    // === Lead Operations ===

    async fn lead_insert(&self, new: NewLead) -> CrmResult<Lead> {
        let lead = Lead::from_new(new);
        self.insert_doc(EntityType::Lead, lead.id, &lead).await?;
        tracing::debug!(lead_id = %lead.id, "Lead inserted");
        Ok(lead)
    }

    async fn lead_get(&self, id: LeadId) -> CrmResult<Option<Lead>> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt("SELECT doc FROM crm_leads WHERE id = $1", &[&id])
            .await
            .map_err(backend_error)?;
        row.map(|row| from_doc(row.get(0))).transpose()
    }

    async fn lead_list(&self, filter: &LeadFilter) -> CrmResult<Vec<Lead>> {
        let [agent, status, source, priority] = filter_params(filter);
        let sql = format!("SELECT doc FROM crm_leads WHERE {} ORDER BY id", LEAD_FILTER_SQL);
        let conn = self.conn().await?;
        let rows = conn
            .query(sql.as_str(), &[&agent, &status, &source, &priority])
            .await
            .map_err(backend_error)?;
        rows.into_iter().map(|row| from_doc(row.get(0))).collect()
    }

    async fn lead_update(&self, id: LeadId, update: LeadUpdate) -> CrmResult<Lead> {
        self.modify_lead(id, move |lead| lead.apply_update(update))
            .await
    }

    async fn lead_delete(&self, id: LeadId) -> CrmResult<()> {
        let conn = self.conn().await?;
        let deleted = conn
            .execute("DELETE FROM crm_leads WHERE id = $1", &[&id])
            .await
            .map_err(backend_error)?;
        if deleted == 0 {
            return Err(CrmError::not_found(EntityType::Lead, id));
        }
        Ok(())
    }

    async fn lead_push_comment(&self, id: LeadId, comment_id: CommentId) -> CrmResult<bool> {
        let conn = self.conn().await?;
        let comment = comment_id.to_string();
        let now = Utc::now().to_rfc3339();
        let updated = conn
            .execute(
                "UPDATE crm_leads SET doc = jsonb_set(doc, '{comments}', \
                     COALESCE(doc->'comments', '[]'::jsonb) || jsonb_build_array($2::text)) \
                     || jsonb_build_object('updatedAt', $3::text) \
                 WHERE id = $1 AND NOT (COALESCE(doc->'comments', '[]'::jsonb) ? $2::text)",
                &[&id, &comment, &now],
            )
            .await
            .map_err(backend_error)?;
        if updated > 0 {
            return Ok(true);
        }

        // Nothing updated: either the lead is gone or it already lists the id.
        let exists = conn
            .query_opt("SELECT 1 FROM crm_leads WHERE id = $1", &[&id])
            .await
            .map_err(backend_error)?;
        match exists {
            Some(_) => Ok(false),
            None => Err(CrmError::not_found(EntityType::Lead, id)),
        }
    }

    async fn lead_add_tags(&self, id: LeadId, tags: Vec<String>) -> CrmResult<Lead> {
        self.modify_lead(id, move |lead| {
            lead.add_tags(tags);
        })
        .await
    }

    async fn lead_count(&self, filter: &LeadFilter) -> CrmResult<u64> {
        let [agent, status, source, priority] = filter_params(filter);
        let sql = format!("SELECT COUNT(*) FROM crm_leads WHERE {}", LEAD_FILTER_SQL);
        let conn = self.conn().await?;
        let row = conn
            .query_one(sql.as_str(), &[&agent, &status, &source, &priority])
            .await
            .map_err(backend_error)?;
        let count: i64 = row.get(0);
        Ok(count.max(0) as u64)
    }

    async fn lead_status_counts(&self) -> CrmResult<Vec<StatusCount>> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT doc->>'status', COUNT(*) FROM crm_leads GROUP BY doc->>'status'",
                &[],
            )
            .await
            .map_err(backend_error)?;
        Ok(rows
            .into_iter()
            .map(|row| StatusCount {
                status: row.get::<_, Option<String>>(0),
                count: row.get::<_, i64>(1).max(0) as u64,
            })
            .collect())
    }

    // === Comment Operations ===

    async fn comment_insert(&self, new: NewComment) -> CrmResult<Comment> {
        let comment = Comment::from_new(new);
        self.insert_doc(EntityType::Comment, comment.id, &comment)
            .await?;
        Ok(comment)
    }

    async fn comment_get_many(&self, ids: &[CommentId]) -> CrmResult<Vec<Comment>> {
        self.get_many_docs(EntityType::Comment, ids).await
    }

    async fn comment_list(&self) -> CrmResult<Vec<Comment>> {
        self.list_docs(EntityType::Comment).await
    }

    // === Tag Operations ===

    async fn tag_insert(&self, new: NewTag) -> CrmResult<Tag> {
        new.validate()?;
        let tag = Tag::from_new(new);
        let doc = to_doc(&tag)?;
        let conn = self.conn().await?;
        let inserted = conn
            .execute(
                "INSERT INTO crm_tags (id, doc) VALUES ($1, $2)",
                &[&tag.id, &doc],
            )
            .await;
        match inserted {
            Ok(_) => Ok(tag),
            Err(e) if e.code() == Some(&SqlState::UNIQUE_VIOLATION) => {
                Err(StorageError::Conflict {
                    entity_type: EntityType::Tag,
                    field: "name".to_string(),
                    value: tag.name,
                }
                .into())
            }
            Err(e) => Err(backend_error(e)),
        }
    }

    async fn tag_list(&self) -> CrmResult<Vec<Tag>> {
        self.list_docs(EntityType::Tag).await
    }

    async fn ping(&self) -> CrmResult<()> {
        let conn = self.conn().await?;
        conn.query_one("SELECT 1", &[]).await.map_err(backend_error)?;
        Ok(())
    }
}
