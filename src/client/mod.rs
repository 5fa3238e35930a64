pub mod error;
pub mod normalize;
pub mod remote;

pub use error::FetchError;
pub use remote::{HttpWorkflowBackend, WorkflowBackend};
