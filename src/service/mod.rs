pub mod audit_desk;
pub mod audit_session;
pub mod query_view;
pub mod queue_store;
pub mod simulator;

pub use audit_desk::{AuditDesk, QueueView};
pub use audit_session::{AuditPhase, AuditSession, SessionError, SessionId};
pub use query_view::{filter_queue, StatusFilter};
pub use queue_store::{QueueSnapshot, QueueStore, RefreshReport};
pub use simulator::{FallbackSimulator, SimulatedStage};
