pub mod models;
pub mod provider;

pub use models::{ApplicationStatus, ProfileChecklist, ResumeSignal};
pub use provider::{InMemorySignalProvider, SignalProvider};
