pub mod api;
pub mod config;
pub mod error;
pub mod report;
pub mod session;
pub mod ui;

pub use api::{
	messages::{AuditRequest, AuditResponse, CipherDescriptor, CUSTOM_CIPHER_ID},
	ApiClient,
	AuditBackend,
};
pub use config::ClientConfig;
pub use error::{ConfigError, SessionError, TransportError};
pub use report::{AuditReport, AvalancheGrade, ReportSummary};
pub use session::{AuditOutcome, CipherList, PendingAudit, Phase, Session, DEFAULT_CUSTOM_SOURCE};
pub use ui::{editor::SourceEditor, selection::RoundsRange, Dashboard, ViewState};
