//! Service Layer
//!
//! Operations that span more than one store call: relationship
//! resolution, comment attachment, reporting and link integrity.
//! Route handlers stay thin and delegate here.

pub mod comments;
pub mod integrity;
pub mod reporting;
pub mod resolver;

pub use comments::{attach_comment, AttachedComment};
pub use integrity::{
    check_comment_links, repair_orphaned_comments, CommentLink, IntegrityReport, RepairReport,
};
pub use resolver::{get_resolved_lead, lead_comments, resolve_lead, resolve_leads};
