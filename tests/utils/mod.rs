pub mod builders;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use builders::SessionBuilder;
#[allow(unused_imports)]
pub use setup::{router, TestSetup, TestSetupBuilder};
