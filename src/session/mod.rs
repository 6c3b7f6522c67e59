//! Canonical client state and the audit workflow.
//!
//! `Session` is the single owner of everything the views display. Views read
//! it and report changes back through the narrow mutators below; nothing else
//! keeps a copy.

use crate::api::{AuditBackend, AuditRequest, AuditResponse, CipherDescriptor, CUSTOM_CIPHER_ID};
use crate::config::ClientConfig;
use crate::error::{SessionError, TransportError};
use crate::report::AuditReport;
use crate::ui::selection::RoundsRange;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Template shown in the editor before the user writes their own cipher.
pub const DEFAULT_CUSTOM_SOURCE: &str = include_str!("custom_cipher.py");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CipherList {
    Unloaded,
    Loaded(Vec<CipherDescriptor>),
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Success,
    Failed,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Loading => "auditing",
            Phase::Success => "report ready",
            Phase::Failed => "failed",
        }
    }
}

/// Holds the in-flight flag for one submission; dropping it clears the flag.
#[derive(Debug)]
pub struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard { flag: flag.clone() })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// A submission that has left the session and awaits the backend.
#[derive(Debug)]
pub struct PendingAudit {
    pub submission: u64,
    pub request: AuditRequest,
    guard: InFlightGuard,
}

impl PendingAudit {
    pub async fn run(self, backend: &dyn AuditBackend) -> AuditOutcome {
        let PendingAudit {
            submission,
            request,
            guard,
        } = self;
        let result = backend.submit_audit(&request).await;
        AuditOutcome {
            submission,
            result,
            guard,
        }
    }
}

/// Result of a submission, still holding the in-flight guard until applied.
#[derive(Debug)]
pub struct AuditOutcome {
    pub submission: u64,
    pub result: Result<AuditResponse, TransportError>,
    guard: InFlightGuard,
}

#[derive(Debug)]
pub struct Session {
    ciphers: CipherList,
    selected: Option<String>,
    rounds: u32,
    custom_code: String,
    report: Option<AuditReport>,
    report_title: Option<String>,
    error: Option<SessionError>,
    in_flight: Arc<AtomicBool>,
    submission: u64,
}

impl Default for Session {
    fn default() -> Self {
        Session::new(RoundsRange::AUDIT.snap(crate::config::DEFAULT_ROUNDS), None, None)
    }
}

impl Session {
    pub fn new(rounds: u32, preselected: Option<String>, custom_code: Option<String>) -> Self {
        Session {
            ciphers: CipherList::Unloaded,
            selected: preselected,
            rounds,
            custom_code: custom_code.unwrap_or_else(|| DEFAULT_CUSTOM_SOURCE.to_string()),
            report: None,
            report_title: None,
            error: None,
            in_flight: Arc::new(AtomicBool::new(false)),
            submission: 0,
        }
    }

    pub fn from_config(config: &ClientConfig, custom_code: Option<String>) -> Self {
        Session::new(config.initial_rounds(), config.cipher.clone(), custom_code)
    }

    pub fn ciphers(&self) -> &CipherList {
        &self.ciphers
    }

    pub fn cipher_descriptors(&self) -> &[CipherDescriptor] {
        match &self.ciphers {
            CipherList::Loaded(list) => list,
            _ => &[],
        }
    }

    pub fn selected_cipher(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn custom_code(&self) -> &str {
        &self.custom_code
    }

    pub fn report(&self) -> Option<&AuditReport> {
        self.report.as_ref()
    }

    pub fn report_title(&self) -> Option<&str> {
        self.report_title.as_deref()
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> Phase {
        if self.is_loading() {
            Phase::Loading
        } else if self.report.is_some() {
            Phase::Success
        } else if self.error.as_ref().is_some_and(SessionError::is_audit) {
            Phase::Failed
        } else {
            Phase::Idle
        }
    }

    /// The trigger is available whenever no audit is in flight.
    pub fn can_submit(&self) -> bool {
        !self.is_loading()
    }

    pub fn editor_visible(&self) -> bool {
        self.selected.as_deref() == Some(CUSTOM_CIPHER_ID)
    }

    pub fn select_cipher(&mut self, id: &str) {
        self.selected = Some(id.to_string());
    }

    pub fn set_rounds(&mut self, rounds: u32) {
        self.rounds = rounds;
    }

    pub fn set_custom_code(&mut self, text: String) {
        self.custom_code = text;
    }

    pub fn apply_cipher_list(&mut self, result: Result<Vec<CipherDescriptor>, TransportError>) {
        match result {
            Ok(list) => {
                info!(count = list.len(), "cipher list loaded");
                let keep_selection = self
                    .selected
                    .as_deref()
                    .is_some_and(|id| list.iter().any(|cipher| cipher.id == id));
                if !keep_selection {
                    if let Some(first) = list.first() {
                        self.selected = Some(first.id.clone());
                    }
                }
                self.ciphers = CipherList::Loaded(list);
            }
            Err(err) => {
                warn!(error = %err, "cipher list unavailable");
                self.ciphers = CipherList::Failed;
                self.error = Some(SessionError::CiphersLoad);
            }
        }
    }

    pub async fn load_ciphers(&mut self, backend: &dyn AuditBackend) {
        let result = backend.list_ciphers().await;
        self.apply_cipher_list(result);
    }

    /// Clears the previous result and enters `Loading`. `None` while another audit is in flight.
    pub fn begin_audit(&mut self) -> Option<PendingAudit> {
        let guard = InFlightGuard::acquire(&self.in_flight)?;
        self.report = None;
        self.report_title = None;
        self.error = None;
        self.submission += 1;
        let cipher_id = self.selected.clone().unwrap_or_default();
        let request = AuditRequest::new(&cipher_id, &self.custom_code, self.rounds);
        info!(
            submission = self.submission,
            cipher = %request.cipher_id,
            rounds = request.rounds,
            "audit started"
        );
        Some(PendingAudit {
            submission: self.submission,
            request,
            guard,
        })
    }

    /// Stores the report or the error, then releases the in-flight flag.
    pub fn complete_audit(&mut self, outcome: AuditOutcome) {
        let AuditOutcome {
            submission,
            result,
            guard,
        } = outcome;
        if submission != self.submission {
            warn!(submission, latest = self.submission, "discarding stale audit outcome");
            return;
        }
        match result {
            Ok(response) => {
                info!(submission, metrics = response.report.len(), "audit finished");
                self.report_title = response.cipher_name;
                self.report = Some(response.report);
            }
            Err(err) => {
                warn!(submission, error = %err, "audit failed");
                self.error = Some(SessionError::from_audit_failure(&err));
            }
        }
        drop(guard);
    }

    /// Runs one full submission against `backend`. Returns `false` if one was already in flight.
    pub async fn submit(&mut self, backend: &dyn AuditBackend) -> bool {
        let Some(pending) = self.begin_audit() else {
            return false;
        };
        let outcome = pending.run(backend).await;
        self.complete_audit(outcome);
        true
    }
}
