pub mod api;
pub mod client;
pub mod config;
pub mod models;
pub mod service;

pub use client::{FetchError, HttpWorkflowBackend, WorkflowBackend};
pub use config::AppConfig;
pub use service::{AuditDesk, FallbackSimulator};
