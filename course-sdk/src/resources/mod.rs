//! SDK resource modules
//!
//! Resource-specific clients for the task server endpoints and the model API.

pub mod challenge;
pub mod data;
pub mod llm;
pub mod lookup;
pub mod report;

pub use challenge::ChallengeClient;
pub use data::DataClient;
pub use llm::LlmClient;
pub use lookup::LookupClient;
pub use report::ReportClient;
