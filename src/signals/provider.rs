use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::models::{ApplicationStatus, ProfileChecklist, ResumeSignal};
use crate::shared::AppError;

/// External collaborator signals consumed by the composite calculator.
/// Every method returns an empty default when nothing is known for the
/// user; absence of a signal is never an error.
#[async_trait]
pub trait SignalProvider: Send + Sync {
    async fn profile_checklist(&self, user_id: &str) -> Result<ProfileChecklist, AppError>;
    async fn resume_signal(&self, user_id: &str) -> Result<ResumeSignal, AppError>;
    async fn application_statuses(&self, user_id: &str)
        -> Result<Vec<ApplicationStatus>, AppError>;
}

/// In-memory provider for development and testing
#[derive(Default)]
pub struct InMemorySignalProvider {
    profiles: Mutex<HashMap<String, ProfileChecklist>>,
    resumes: Mutex<HashMap<String, ResumeSignal>>,
    applications: Mutex<HashMap<String, Vec<ApplicationStatus>>>,
}

impl InMemorySignalProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_profile(&self, user_id: &str, checklist: ProfileChecklist) {
        self.profiles
            .lock()
            .unwrap()
            .insert(user_id.to_string(), checklist);
    }

    pub fn set_resume(&self, user_id: &str, signal: ResumeSignal) {
        self.resumes
            .lock()
            .unwrap()
            .insert(user_id.to_string(), signal);
    }

    pub fn set_applications(&self, user_id: &str, statuses: Vec<ApplicationStatus>) {
        self.applications
            .lock()
            .unwrap()
            .insert(user_id.to_string(), statuses);
    }
}

#[async_trait]
impl SignalProvider for InMemorySignalProvider {
    async fn profile_checklist(&self, user_id: &str) -> Result<ProfileChecklist, AppError> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn resume_signal(&self, user_id: &str) -> Result<ResumeSignal, AppError> {
        Ok(self
            .resumes
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn application_statuses(
        &self,
        user_id: &str,
    ) -> Result<Vec<ApplicationStatus>, AppError> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}
