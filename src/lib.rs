pub mod branch;
pub mod errors;
pub mod git;
pub mod jira;
pub mod logging;
pub mod settings;
pub mod setup;
pub mod slug;
pub mod workflow;
