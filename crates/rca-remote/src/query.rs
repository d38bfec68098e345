//! Cached access to the backend
//!
//! Reads go through the [`QueryCache`]; writes go straight to the backend
//! and then invalidate every key whose answer they may have changed.

use crate::api::ComplianceApi;
use crate::cache::{get_typed, QueryCache, QueryKey};
use crate::error::RemoteResult;
use crate::payload::ApplicationPayload;
use rca_schema::{
    sort_timeline, Application, Comment, NewComment, PrincipalInvestigator, ResearchActivity,
    StaffMember,
};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Backend plus query cache
#[derive(Clone)]
pub struct QueryClient {
    api: Arc<dyn ComplianceApi>,
    cache: Arc<dyn QueryCache>,
}

impl fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryClient")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl QueryClient {
    #[must_use]
    pub fn new(api: Arc<dyn ComplianceApi>, cache: Arc<dyn QueryCache>) -> Self {
        Self { api, cache }
    }

    /// Underlying cache
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn QueryCache> {
        &self.cache
    }

    /// Cached value for `key`, or fetch and cache it
    async fn cached<T, F, Fut>(&self, key: QueryKey, fetch: F) -> RemoteResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = RemoteResult<T>>,
    {
        if let Some(hit) = get_typed::<T>(self.cache.as_ref(), &key).await {
            tracing::debug!(%key, "cache hit");
            return Ok(hit);
        }

        let value = fetch().await?;
        self.cache.set(key, Arc::new(value.clone())).await;
        Ok(value)
    }

    pub async fn application(&self, id: &str) -> RemoteResult<Application> {
        self.cached(QueryKey::Application(id.to_string()), || {
            self.api.get_application(id)
        })
        .await
    }

    pub async fn principal_investigators(&self) -> RemoteResult<Vec<PrincipalInvestigator>> {
        self.cached(QueryKey::PrincipalInvestigators, || {
            self.api.list_principal_investigators()
        })
        .await
    }

    pub async fn research_activities(
        &self,
        principal_investigator_id: Option<&str>,
    ) -> RemoteResult<Vec<ResearchActivity>> {
        let filter = principal_investigator_id.map(str::to_string);
        self.cached(QueryKey::ResearchActivities(filter.clone()), || {
            self.api.list_research_activities(filter)
        })
        .await
    }

    pub async fn activity_staff(&self, activity_id: &str) -> RemoteResult<Vec<StaffMember>> {
        self.cached(QueryKey::ActivityStaff(activity_id.to_string()), || {
            self.api.list_activity_staff(activity_id)
        })
        .await
    }

    /// Timeline, oldest first
    pub async fn comments(&self, application_id: &str) -> RemoteResult<Vec<Comment>> {
        self.cached(QueryKey::Comments(application_id.to_string()), || async {
            let mut comments = self.api.list_comments(application_id).await?;
            sort_timeline(&mut comments);
            Ok(comments)
        })
        .await
    }

    /// PATCH an application; the cached copy is replaced by the response
    pub async fn update_application(
        &self,
        id: &str,
        payload: ApplicationPayload,
    ) -> RemoteResult<Application> {
        let updated = self.api.patch_application(id, payload).await?;
        self.cache
            .set(QueryKey::Application(id.to_string()), Arc::new(updated.clone()))
            .await;
        Ok(updated)
    }

    /// POST a comment and invalidate the timeline
    pub async fn add_comment(&self, application_id: &str, comment: NewComment) -> RemoteResult<Comment> {
        let created = self.api.post_comment(application_id, comment).await?;
        self.cache
            .invalidate(&QueryKey::Comments(application_id.to_string()))
            .await;
        Ok(created)
    }

    /// POST a new application and cache it under its new id
    pub async fn create_application(&self, payload: ApplicationPayload) -> RemoteResult<Application> {
        let created = self.api.create_application(payload).await?;
        self.cache
            .set(QueryKey::Application(created.id.clone()), Arc::new(created.clone()))
            .await;
        Ok(created)
    }

    /// Drop everything cached about one application
    pub async fn invalidate_application(&self, id: &str) {
        self.cache.invalidate(&QueryKey::Application(id.to_string())).await;
        self.cache.invalidate(&QueryKey::Comments(id.to_string())).await;
    }
}
