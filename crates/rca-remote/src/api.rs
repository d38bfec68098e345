//! Backend capability
//!
//! Everything the form core needs from the server, as one async trait. The
//! HTTP client implements it for production; tests substitute a mock or an
//! in-memory recording backend.

use crate::error::RemoteResult;
use crate::payload::ApplicationPayload;
use async_trait::async_trait;
use rca_schema::{Application, Comment, NewComment, PrincipalInvestigator, ResearchActivity, StaffMember};

/// REST operations of the compliance backend
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait ComplianceApi: Send + Sync {
    /// `GET /applications/{id}`
    async fn get_application(&self, id: &str) -> RemoteResult<Application>;

    /// `GET /principal-investigators`
    async fn list_principal_investigators(&self) -> RemoteResult<Vec<PrincipalInvestigator>>;

    /// `GET /research-activities[?principalInvestigatorId=]`
    async fn list_research_activities(
        &self,
        principal_investigator_id: Option<String>,
    ) -> RemoteResult<Vec<ResearchActivity>>;

    /// `GET /research-activities/{id}/staff`
    async fn list_activity_staff(&self, activity_id: &str) -> RemoteResult<Vec<StaffMember>>;

    /// `GET /applications/{id}/comments`
    async fn list_comments(&self, application_id: &str) -> RemoteResult<Vec<Comment>>;

    /// `PATCH /applications/{id}`
    async fn patch_application(&self, id: &str, payload: ApplicationPayload) -> RemoteResult<Application>;

    /// `POST /applications/{id}/comments`
    async fn post_comment(&self, application_id: &str, comment: NewComment) -> RemoteResult<Comment>;

    /// `POST /applications`
    async fn create_application(&self, payload: ApplicationPayload) -> RemoteResult<Application>;
}
