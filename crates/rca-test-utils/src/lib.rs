//! Testing utilities for RCA workspace
//!
//! Shared fixtures and an in-memory backend that records every call.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rca_remote::{ApplicationPayload, ComplianceApi, RemoteError, RemoteResult};
use rca_schema::{
    Application, ApplicationKind, ApplicationStatus, CellLine, Comment, FormValues,
    HazardousProcedure, NewComment, PrincipalInvestigator, RecordId, ResearchActivity,
    StaffMember, TeamMember,
};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// 2026-01-05T09:00:00Z; recorded comments are one minute apart from here
const CLOCK_START: i64 = 1_767_603_600;

/// Minimal IBC form that passes submit validation
pub fn ibc_values() -> FormValues {
    FormValues {
        title: "Lentiviral transduction of HEK293".into(),
        project_summary: "Gene knockdown in human cell lines".into(),
        principal_investigator_id: "pi-1".into(),
        biosafety_level: "BSL-2".into(),
        ..FormValues::default()
    }
}

/// Saved IBC draft holding [`ibc_values`]
pub fn ibc_draft(id: &str) -> Application {
    let mut app = Application::new_draft(ApplicationKind::Ibc);
    app.id = id.to_string();
    app.number = "IBC-2026-0042".parse().ok();
    app.form = ibc_values();
    app
}

/// Complete cell line record
pub fn hek293() -> CellLine {
    CellLine {
        id: RecordId::server("cl-hek293"),
        name: "HEK293".into(),
        biosafety_level: "BSL-2".into(),
        acquisition_sources: vec!["ATCC".into()],
        passage: "12".into(),
        exposure_types: vec!["Splash".into()],
        notes: String::new(),
    }
}

/// Complete procedure on `cell_line`
pub fn procedure_on(cell_line: &CellLine) -> HazardousProcedure {
    HazardousProcedure {
        id: RecordId::server("hp-transfection"),
        procedure: "Lentiviral transfection".into(),
        cell_line_id: Some(cell_line.id.clone()),
        hazards: vec!["Aerosol".into()],
        control_measures: "Class II biosafety cabinet".into(),
    }
}

/// IBC values with the human materials section open and filled
pub fn ibc_with_cell_lines() -> FormValues {
    let cell_line = hek293();
    FormValues {
        human_non_human_primate_material: true,
        human_materials_description: "HEK293 cultures".into(),
        bloodborne_training_completed: true,
        hazardous_procedures: vec![procedure_on(&cell_line)],
        cell_lines: vec![cell_line],
        ..ibc_values()
    }
}

pub fn investigator(id: &str, name: &str) -> PrincipalInvestigator {
    PrincipalInvestigator {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{id}@example.edu"),
        department: "Microbiology".into(),
    }
}

pub fn activity(id: &str, principal_investigator_id: &str) -> ResearchActivity {
    ResearchActivity {
        id: id.to_string(),
        title: format!("Activity {id}"),
        principal_investigator_id: principal_investigator_id.to_string(),
    }
}

pub fn staff(user_id: &str, name: &str, role: &str) -> StaffMember {
    StaffMember {
        user_id: user_id.to_string(),
        name: name.to_string(),
        role: role.to_string(),
    }
}

pub fn team_member(user_id: &str, name: &str) -> TeamMember {
    TeamMember {
        id: RecordId::server(format!("tm-{user_id}")),
        user_id: user_id.to_string(),
        name: name.to_string(),
        role: "Researcher".into(),
    }
}

/// One backend call, as received
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    GetApplication(String),
    ListPrincipalInvestigators,
    ListResearchActivities(Option<String>),
    ListActivityStaff(String),
    ListComments(String),
    PatchApplication {
        id: String,
        payload: ApplicationPayload,
    },
    PostComment {
        application_id: String,
        comment: NewComment,
    },
    CreateApplication(ApplicationPayload),
}

impl ApiCall {
    /// Writes change server state; reads do not
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::PatchApplication { .. } | Self::PostComment { .. } | Self::CreateApplication(_)
        )
    }
}

#[derive(Debug, Default)]
struct Backend {
    applications: HashMap<String, Application>,
    comments: HashMap<String, Vec<Comment>>,
    investigators: Vec<PrincipalInvestigator>,
    activities: Vec<ResearchActivity>,
    staff: HashMap<String, Vec<StaffMember>>,
    calls: Vec<ApiCall>,
    failures: VecDeque<RemoteError>,
    comment_failure: Option<RemoteError>,
    created: u32,
    posted: i64,
}

impl Backend {
    /// Record `call`, then fail if a failure was queued
    fn receive(&mut self, call: ApiCall) -> RemoteResult<()> {
        self.calls.push(call);
        self.failures.pop_front().map_or(Ok(()), Err)
    }
}

/// In-memory backend that records calls in order.
///
/// PATCH merges the flat body into the stored application and marks it
/// submitted when `isDraft` is false, as the real server does.
#[derive(Debug, Default)]
pub struct RecordingApi {
    backend: Mutex<Backend>,
    latency: Option<Duration>,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call; the backend lock is not held while waiting
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_application(self, app: Application) -> Self {
        self.backend.lock().applications.insert(app.id.clone(), app);
        self
    }

    pub fn with_investigators(self, investigators: Vec<PrincipalInvestigator>) -> Self {
        self.backend.lock().investigators = investigators;
        self
    }

    pub fn with_activities(self, activities: Vec<ResearchActivity>) -> Self {
        self.backend.lock().activities = activities;
        self
    }

    pub fn with_staff(self, activity_id: &str, staff: Vec<StaffMember>) -> Self {
        self.backend
            .lock()
            .staff
            .insert(activity_id.to_string(), staff);
        self
    }

    /// Fail the next call with `err`; queued failures are used in order
    pub fn fail_next(&self, err: RemoteError) {
        self.backend.lock().failures.push_back(err);
    }

    /// Fail the next comment POST with `err`, whatever comes before it
    pub fn fail_next_comment(&self, err: RemoteError) {
        self.backend.lock().comment_failure = Some(err);
    }

    /// Every call so far, oldest first
    pub fn calls(&self) -> Vec<ApiCall> {
        self.backend.lock().calls.clone()
    }

    /// Write calls only
    pub fn writes(&self) -> Vec<ApiCall> {
        self.calls().into_iter().filter(ApiCall::is_write).collect()
    }

    /// Stored copy of an application
    pub fn application(&self, id: &str) -> Option<Application> {
        self.backend.lock().applications.get(id).cloned()
    }

    /// Stored timeline of an application, in posting order
    pub fn comments(&self, application_id: &str) -> Vec<Comment> {
        self.backend
            .lock()
            .comments
            .get(application_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn not_found(what: &str) -> RemoteError {
    RemoteError::Http {
        status: 404,
        message: Some(format!("{what} not found")),
    }
}

/// Apply a flat write body to `app`
fn merge(app: &Application, payload: &ApplicationPayload) -> RemoteResult<Application> {
    let mut json = serde_json::to_value(app)?;
    if let Some(object) = json.as_object_mut() {
        for (key, value) in &payload.fields {
            object.insert(key.clone(), value.clone());
        }
        if !payload.is_draft {
            object.insert(
                "status".into(),
                serde_json::to_value(ApplicationStatus::Submitted)?,
            );
        }
    }
    Ok(serde_json::from_value(json)?)
}

#[async_trait]
impl ComplianceApi for RecordingApi {
    async fn get_application(&self, id: &str) -> RemoteResult<Application> {
        self.delay().await;
        let mut backend = self.backend.lock();
        backend.receive(ApiCall::GetApplication(id.to_string()))?;
        backend
            .applications
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("Application"))
    }

    async fn list_principal_investigators(&self) -> RemoteResult<Vec<PrincipalInvestigator>> {
        self.delay().await;
        let mut backend = self.backend.lock();
        backend.receive(ApiCall::ListPrincipalInvestigators)?;
        Ok(backend.investigators.clone())
    }

    async fn list_research_activities(
        &self,
        principal_investigator_id: Option<String>,
    ) -> RemoteResult<Vec<ResearchActivity>> {
        self.delay().await;
        let mut backend = self.backend.lock();
        backend.receive(ApiCall::ListResearchActivities(
            principal_investigator_id.clone(),
        ))?;
        Ok(backend
            .activities
            .iter()
            .filter(|a| {
                principal_investigator_id
                    .as_deref()
                    .map_or(true, |pi| a.principal_investigator_id == pi)
            })
            .cloned()
            .collect())
    }

    async fn list_activity_staff(&self, activity_id: &str) -> RemoteResult<Vec<StaffMember>> {
        self.delay().await;
        let mut backend = self.backend.lock();
        backend.receive(ApiCall::ListActivityStaff(activity_id.to_string()))?;
        Ok(backend.staff.get(activity_id).cloned().unwrap_or_default())
    }

    async fn list_comments(&self, application_id: &str) -> RemoteResult<Vec<Comment>> {
        self.delay().await;
        let mut backend = self.backend.lock();
        backend.receive(ApiCall::ListComments(application_id.to_string()))?;
        Ok(backend
            .comments
            .get(application_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn patch_application(
        &self,
        id: &str,
        payload: ApplicationPayload,
    ) -> RemoteResult<Application> {
        self.delay().await;
        let mut backend = self.backend.lock();
        backend.receive(ApiCall::PatchApplication {
            id: id.to_string(),
            payload: payload.clone(),
        })?;
        let current = backend
            .applications
            .get(id)
            .ok_or_else(|| not_found("Application"))?;
        let updated = merge(current, &payload)?;
        backend.applications.insert(id.to_string(), updated.clone());
        Ok(updated)
    }

    async fn post_comment(
        &self,
        application_id: &str,
        comment: NewComment,
    ) -> RemoteResult<Comment> {
        self.delay().await;
        let mut backend = self.backend.lock();
        backend.receive(ApiCall::PostComment {
            application_id: application_id.to_string(),
            comment: comment.clone(),
        })?;
        if let Some(err) = backend.comment_failure.take() {
            return Err(err);
        }
        if !backend.applications.contains_key(application_id) {
            return Err(not_found("Application"));
        }
        backend.posted += 1;
        let created = Comment {
            id: format!("c-{}", backend.posted),
            application_id: application_id.to_string(),
            text: comment.text,
            created_at: DateTime::<Utc>::from_timestamp(CLOCK_START + backend.posted * 60, 0)
                .unwrap_or_default(),
            author: "applicant".into(),
            kind: comment.kind,
        };
        backend
            .comments
            .entry(application_id.to_string())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn create_application(&self, payload: ApplicationPayload) -> RemoteResult<Application> {
        self.delay().await;
        let mut backend = self.backend.lock();
        backend.receive(ApiCall::CreateApplication(payload.clone()))?;
        backend.created += 1;
        let kind = payload.kind.unwrap_or_default();
        let mut app = Application::new_draft(kind);
        app.id = format!("app-{}", backend.created);
        app.number = format!("{}-2026-{:04}", kind.number_prefix(), backend.created)
            .parse()
            .ok();
        let created = merge(&app, &payload)?;
        backend.applications.insert(created.id.clone(), created.clone());
        Ok(created)
    }
}
