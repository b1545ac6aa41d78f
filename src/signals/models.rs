use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum_macros::{Display, EnumString};

/// Which profile checklist fields a user has filled in, as reported by
/// the external profile evaluator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileChecklist {
    pub completed_fields: BTreeSet<String>,
}

impl ProfileChecklist {
    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            completed_fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has(&self, field: &str) -> bool {
        self.completed_fields.contains(field)
    }
}

/// Resume existence and quality as reported by the external resume analyzer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeSignal {
    pub has_resume: bool,
    /// 0-100 quality score; ignored entirely when has_resume is false
    pub quality: Option<f64>,
}

/// Lifecycle status of one job application
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Submitted,
    Reviewing,
    Interview,
    Offer,
    Hired,
}
