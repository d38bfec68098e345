//! Application session and workflow actions
//!
//! An [`ApplicationSession`] binds one form controller to the backend. It
//! exposes the two user actions, save draft and submit, plus loading,
//! reference-data lookups and the comment timeline.
//!
//! # Concurrency
//!
//! Form state sits behind a mutex that is never held across an `.await`.
//! Save and submit share one in-flight flag: while either is pending, a
//! second invocation fails with [`WorkflowError::ActionPending`]. Responses
//! are not reconciled against edits made while a request was in flight; the
//! values that were sent become the clean snapshot.

use crate::config::RcaConfig;
use crate::error::{WorkflowError, WorkflowResult};
use crate::notify::{Notification, Notifier};
use parking_lot::Mutex;
use rca_form::FormController;
use rca_remote::{
    ApplicationPayload, HttpComplianceClient, MokaQueryCache, QueryClient, RemoteError,
};
use rca_schema::{
    validate_transition, Application, ApplicationKind, ApplicationNumber, ApplicationStatus,
    Comment, Field, FieldIssue, FieldValue, FormValues, NewComment, PrincipalInvestigator,
    RecordId, ResearchActivity, TeamMember, ValidationMode,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Where the UI should go after an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Read-only view of a submitted application
    ApplicationView { id: String },
}

/// Clears the in-flight flag when the action finishes, on every path
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> WorkflowResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| WorkflowError::ActionPending)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
struct SessionState {
    /// Empty until the backend has created the application
    id: String,
    number: Option<ApplicationNumber>,
    form: FormController,
}

/// What an action sends, captured under the lock
struct Outgoing {
    id: String,
    kind: ApplicationKind,
    values: FormValues,
}

/// One open application
#[derive(Debug)]
pub struct ApplicationSession {
    queries: QueryClient,
    notifier: Arc<dyn Notifier>,
    state: Mutex<SessionState>,
    in_flight: AtomicBool,
}

impl ApplicationSession {
    /// Fetch an application and open it.
    ///
    /// The team selector is pre-filled from the stored team members.
    ///
    /// # Errors
    /// Propagates the fetch failure after notifying the user.
    pub async fn load(
        queries: QueryClient,
        notifier: Arc<dyn Notifier>,
        id: &str,
    ) -> WorkflowResult<Self> {
        let mut app = match queries.application(id).await {
            Ok(app) => app,
            Err(err) => {
                notifier.notify(Notification::from_remote(&err));
                return Err(err.into());
            }
        };
        app.form.team_member_selection = app
            .form
            .protocol_team_members
            .iter()
            .map(|m| m.user_id.clone())
            .collect();

        tracing::info!(id, status = %app.status, "application loaded");
        Ok(Self::from_parts(queries, notifier, &app))
    }

    /// Build the HTTP client and cache from `config`, then [`Self::load`]
    ///
    /// # Errors
    /// [`WorkflowError::Remote`] for an invalid base URL or a failed fetch.
    pub async fn connect(
        config: &RcaConfig,
        notifier: Arc<dyn Notifier>,
        id: &str,
    ) -> WorkflowResult<Self> {
        Self::load(Self::queries_for(config)?, notifier, id).await
    }

    /// Query client backed by HTTP and a moka cache, as configured
    ///
    /// # Errors
    /// [`WorkflowError::Remote`] for an invalid base URL.
    pub fn queries_for(config: &RcaConfig) -> WorkflowResult<QueryClient> {
        let api = HttpComplianceClient::new(&config.client)?;
        let cache = MokaQueryCache::from_config(&config.cache);
        Ok(QueryClient::new(Arc::new(api), Arc::new(cache)))
    }

    /// Open a new, unsaved draft
    #[must_use]
    pub fn new_unsaved(queries: QueryClient, notifier: Arc<dyn Notifier>, kind: ApplicationKind) -> Self {
        Self::from_parts(queries, notifier, &Application::new_draft(kind))
    }

    fn from_parts(queries: QueryClient, notifier: Arc<dyn Notifier>, app: &Application) -> Self {
        Self {
            queries,
            notifier,
            state: Mutex::new(SessionState {
                id: app.id.clone(),
                number: app.number.clone(),
                form: FormController::from_application(app),
            }),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Server id; `None` until the first save
    #[must_use]
    pub fn id(&self) -> Option<String> {
        let state = self.state.lock();
        (!state.id.is_empty()).then(|| state.id.clone())
    }

    /// Application number, once assigned
    #[must_use]
    pub fn number(&self) -> Option<ApplicationNumber> {
        self.state.lock().number.clone()
    }

    #[must_use]
    pub fn status(&self) -> ApplicationStatus {
        self.state.lock().form.status()
    }

    /// A save or submit is pending
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run `f` against the form controller.
    ///
    /// The session lock is held for the duration of `f`; do not block in it.
    pub fn with_form<R>(&self, f: impl FnOnce(&mut FormController) -> R) -> R {
        f(&mut self.state.lock().form)
    }

    /// Persist the current values as a draft.
    ///
    /// Never requires a comment and never touches the timeline. Unsaved
    /// applications are created; saved ones are patched.
    ///
    /// # Errors
    /// - [`WorkflowError::ActionPending`] while another action runs
    /// - [`WorkflowError::NotAllowed`] outside of draft
    /// - [`WorkflowError::Invalid`] when a structural limit is exceeded
    /// - [`WorkflowError::Remote`] when the request fails (user notified)
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn save_draft(&self) -> WorkflowResult<Application> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let outgoing = self.prepare("save draft", ValidationMode::Draft)?;

        let result = self.write(&outgoing, true).await;
        let saved = self.remote(result)?;

        self.adopt(&saved, outgoing.values, None);
        tracing::info!(id = %saved.id, "draft saved");
        self.notifier.notify(Notification::success("Draft saved"));
        Ok(saved)
    }

    /// Submit for review.
    ///
    /// Requires a non-blank submission comment and a form that passes the
    /// full schema; both are checked before any request is sent. Sends the
    /// application update first, then the comment.
    ///
    /// # Errors
    /// - [`WorkflowError::ActionPending`] while another action runs
    /// - [`WorkflowError::CommentRequired`] for a blank comment
    /// - [`WorkflowError::Invalid`] when the schema fails
    /// - [`WorkflowError::NotAllowed`] / [`WorkflowError::Transition`] outside of draft
    /// - [`WorkflowError::Remote`] when a request fails (user notified)
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn submit(&self) -> WorkflowResult<Route> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let outgoing = self.prepare("submit", ValidationMode::Submit)?;
        let comment = NewComment::submission(outgoing.values.submission_comment.trim());

        let result = self.write(&outgoing, false).await;
        let submitted = self.remote(result)?;
        self.adopt(&submitted, outgoing.values, Some(ApplicationStatus::Submitted));

        // the application is submitted even if the comment fails to post
        let posted = self.queries.add_comment(&submitted.id, comment).await;
        if posted.is_err() {
            tracing::error!(id = %submitted.id, "submission comment not saved");
        }
        self.remote(posted)?;

        tracing::info!(id = %submitted.id, "application submitted");
        self.notifier.notify(Notification::success("Application submitted"));
        Ok(Route::ApplicationView { id: submitted.id })
    }

    /// Local checks shared by both actions; snapshots what will be sent
    fn prepare(&self, action: &'static str, mode: ValidationMode) -> WorkflowResult<Outgoing> {
        let mut state = self.state.lock();
        let status = state.form.status();
        if status.is_read_only() {
            tracing::warn!(action, %status, "action rejected");
            return Err(WorkflowError::NotAllowed { action, status });
        }

        if mode == ValidationMode::Submit {
            validate_transition(status, ApplicationStatus::Submitted)?;
            let blank = state.form.values().submission_comment.trim().is_empty();
            let checked = state.form.validate(mode);
            if blank {
                state.form.set_issue(FieldIssue::new(
                    Field::SubmissionComment,
                    "required",
                    "A comment is required to submit",
                ));
                tracing::warn!(action, "submission comment missing");
                return Err(WorkflowError::CommentRequired);
            }
            checked.map_err(WorkflowError::Invalid)?;
        } else {
            state.form.validate(mode).map_err(WorkflowError::Invalid)?;
        }

        Ok(Outgoing {
            id: state.id.clone(),
            kind: state.form.kind(),
            values: state.form.values().clone(),
        })
    }

    /// Create unsaved applications, patch saved ones
    async fn write(&self, outgoing: &Outgoing, is_draft: bool) -> Result<Application, RemoteError> {
        if outgoing.id.is_empty() {
            let payload = ApplicationPayload::for_create(outgoing.kind, &outgoing.values, is_draft)?;
            self.queries.create_application(payload).await
        } else {
            let payload = ApplicationPayload::from_form(&outgoing.values, is_draft)?;
            self.queries.update_application(&outgoing.id, payload).await
        }
    }

    /// Record a successful write
    fn adopt(&self, app: &Application, sent: FormValues, status: Option<ApplicationStatus>) {
        let mut state = self.state.lock();
        if state.id.is_empty() {
            state.id.clone_from(&app.id);
        }
        if app.number.is_some() {
            state.number.clone_from(&app.number);
        }
        state.form.mark_saved(sent);
        if let Some(status) = status {
            state.form.set_status(status);
        }
    }

    /// Notify on failure and lift the error
    fn remote<T>(&self, result: Result<T, RemoteError>) -> WorkflowResult<T> {
        result.map_err(|err| {
            tracing::warn!(error = %err, "backend request failed");
            self.notifier.notify(Notification::from_remote(&err));
            WorkflowError::Remote(err)
        })
    }

    /// Comment timeline, oldest first; empty for unsaved applications.
    ///
    /// # Errors
    /// [`WorkflowError::Remote`] when the request fails (user notified).
    pub async fn timeline(&self) -> WorkflowResult<Vec<Comment>> {
        let Some(id) = self.id() else {
            return Ok(Vec::new());
        };
        let result = self.queries.comments(&id).await;
        self.remote(result)
    }

    /// Principal investigators available for selection.
    ///
    /// # Errors
    /// [`WorkflowError::Remote`] when the request fails (user notified).
    pub async fn principal_investigators(&self) -> WorkflowResult<Vec<PrincipalInvestigator>> {
        let result = self.queries.principal_investigators().await;
        self.remote(result)
    }

    /// Research activities of the selected principal investigator, or all
    /// activities when none is selected.
    ///
    /// # Errors
    /// [`WorkflowError::Remote`] when the request fails (user notified).
    pub async fn research_activities(&self) -> WorkflowResult<Vec<ResearchActivity>> {
        let pi = self.with_form(|form| form.values().principal_investigator_id.trim().to_string());
        let filter = (!pi.is_empty()).then_some(pi.as_str());
        let result = self.queries.research_activities(filter).await;
        self.remote(result)
    }

    /// Rebuild the team member list from the selected staff.
    ///
    /// Looks up the staff of every selected research activity and keeps the
    /// selected user ids in selection order. Members that were already on
    /// the list keep their record id, and are kept as stored when none of
    /// the selected activities lists them. Selected ids that are neither
    /// staff nor existing members are skipped.
    ///
    /// # Errors
    /// [`WorkflowError::Remote`] when a staff lookup fails (user notified),
    /// or [`WorkflowError::Form`] when the controller rejects the write.
    pub async fn apply_team_selection(&self) -> WorkflowResult<Vec<TeamMember>> {
        let (activities, selection, existing) = self.with_form(|form| {
            let values = form.values();
            (
                values.research_activity_ids.clone(),
                values.team_member_selection.clone(),
                values.protocol_team_members.clone(),
            )
        });

        let mut staff = HashMap::new();
        for activity in &activities {
            let result = self.queries.activity_staff(activity).await;
            for member in self.remote(result)? {
                staff.entry(member.user_id.clone()).or_insert(member);
            }
        }

        let members: Vec<TeamMember> = selection
            .iter()
            .filter_map(|user_id| {
                let current = existing.iter().find(|m| &m.user_id == user_id);
                match (staff.get(user_id), current) {
                    (Some(person), _) => Some(TeamMember {
                        id: current.map_or_else(RecordId::temporary, |m| m.id.clone()),
                        user_id: person.user_id.clone(),
                        name: person.name.clone(),
                        role: person.role.clone(),
                    }),
                    // activity ids are not persisted; saved members survive a reload
                    (None, Some(member)) => Some(member.clone()),
                    (None, None) => {
                        tracing::warn!(user_id, "selected staff member not found in any activity");
                        None
                    }
                }
            })
            .collect();

        self.with_form(|form| {
            form.set(Field::ProtocolTeamMembers, FieldValue::TeamMembers(members.clone()))
        })?;
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::QueuedNotifier;
    use rca_remote::{MockComplianceApi, MokaQueryCache};

    fn session(api: MockComplianceApi) -> ApplicationSession {
        let queries = QueryClient::new(Arc::new(api), Arc::new(MokaQueryCache::new(16)));
        ApplicationSession::new_unsaved(queries, Arc::new(QueuedNotifier::new()), ApplicationKind::Ibc)
    }

    #[test]
    fn in_flight_guard_resets_on_drop() {
        let flag = AtomicBool::new(false);
        {
            let _guard = InFlight::acquire(&flag).unwrap();
            assert!(matches!(InFlight::acquire(&flag), Err(WorkflowError::ActionPending)));
        }
        assert!(InFlight::acquire(&flag).is_ok());
    }

    #[tokio::test]
    async fn unsaved_timeline_is_empty_without_request() {
        let session = session(MockComplianceApi::new());
        assert!(session.id().is_none());
        assert!(session.timeline().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_comment_sets_inline_issue() {
        let session = session(MockComplianceApi::new());
        session.with_form(|form| form.set(Field::SubmissionComment, "   ".into()).unwrap());
        let err = session.submit().await.unwrap_err();
        assert!(matches!(err, WorkflowError::CommentRequired));
        assert_eq!(session.with_form(|form| form.errors_for(Field::SubmissionComment).count()), 1);
        assert!(!session.is_busy());
    }
}
