// src/services/completion.rs

//! Certificate issuance on course completion.
//!
//! One orchestrator lives for one course session. It reacts to
//! `not-complete -> complete` transitions and makes at most one
//! check/issue cycle per session; a fresh session creates a fresh
//! orchestrator.

use crate::api::LearningApi;
use crate::error::AppError;
use crate::models::{Certificate, CertificateLookup};

use super::progress::CompletionTransition;

/// Orchestrator phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    CheckingExisting,
    Issuing,
    Done,
}

/// What a transition led to.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// The transition was not `not-complete -> complete`
    NotTriggered,
    /// A cycle already ran in this session
    AlreadyAttempted,
    ExistingCertificate(Certificate),
    Issued(Certificate),
    /// Issuance failed; the learner is congratulated anyway
    IssueFailed(String),
    /// Certificate service refused or is down
    Unavailable(String),
    /// Session expired mid-cycle; left to the auth layer
    AuthExpired,
}

impl CompletionOutcome {
    /// Whether the learner should see a congratulations notice.
    pub fn congratulates(&self) -> bool {
        !matches!(
            self,
            Self::NotTriggered | Self::AlreadyAttempted | Self::AuthExpired
        )
    }

    pub fn certificate(&self) -> Option<&Certificate> {
        match self {
            Self::ExistingCertificate(certificate) | Self::Issued(certificate) => Some(certificate),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct CompletionOrchestrator {
    course_id: String,
    phase: Phase,
    attempted: bool,
    history: Vec<Phase>,
}

impl CompletionOrchestrator {
    pub fn new(course_id: impl Into<String>) -> Self {
        Self {
            course_id: course_id.into(),
            phase: Phase::Idle,
            attempted: false,
            history: vec![Phase::Idle],
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn has_attempted(&self) -> bool {
        self.attempted
    }

    /// Every phase entered so far, starting with `Idle`.
    pub fn history(&self) -> &[Phase] {
        &self.history
    }

    /// React to the completion transition of one lecture update.
    pub async fn on_transition(
        &mut self,
        api: &dyn LearningApi,
        transition: CompletionTransition,
    ) -> CompletionOutcome {
        if !transition.became_complete() {
            return CompletionOutcome::NotTriggered;
        }
        if self.attempted {
            log::debug!(
                "Certificate for {} already attempted this session",
                self.course_id
            );
            return CompletionOutcome::AlreadyAttempted;
        }
        // Set before any network call.
        self.attempted = true;

        log::info!("Course {} complete, checking for a certificate", self.course_id);
        self.enter(Phase::CheckingExisting);
        let lookup = match api.get_certificate_by_course(&self.course_id).await {
            Ok(lookup) => lookup,
            Err(AppError::AuthExpired) => return self.finish(CompletionOutcome::AuthExpired),
            Err(e) => CertificateLookup::Unavailable(e.to_string()),
        };

        match lookup {
            CertificateLookup::Found(certificate) => {
                return self.finish(CompletionOutcome::ExistingCertificate(certificate));
            }
            CertificateLookup::Unavailable(reason) => {
                log::warn!("Certificate service unavailable: {}", reason);
                return self.finish(CompletionOutcome::Unavailable(reason));
            }
            CertificateLookup::NotFound => {}
        }

        self.enter(Phase::Issuing);
        let outcome = match api.generate_certificate(&self.course_id).await {
            Ok(certificate) => {
                log::info!("Issued certificate {} for {}", certificate.id, self.course_id);
                CompletionOutcome::Issued(certificate)
            }
            Err(AppError::AuthExpired) => CompletionOutcome::AuthExpired,
            Err(AppError::ServiceUnavailable(reason)) => {
                log::warn!("Certificate service unavailable: {}", reason);
                CompletionOutcome::Unavailable(reason)
            }
            Err(e) => {
                log::error!("Certificate generation failed for {}: {}", self.course_id, e);
                CompletionOutcome::IssueFailed(e.to_string())
            }
        };
        self.finish(outcome)
    }

    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.history.push(phase);
    }

    fn finish(&mut self, outcome: CompletionOutcome) -> CompletionOutcome {
        self.enter(Phase::Done);
        outcome
    }
}
