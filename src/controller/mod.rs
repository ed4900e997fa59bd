//! Submission controller.
//!
//! Owns the draft and the request lifecycle:
//! `Idle -> Submitting -> Succeeded | Failed`, plus `Invalid` when the draft
//! is refused locally. State sits behind a mutex that is never held across an
//! await, so one controller can serve several callers; a second `submit`
//! while one is in flight is turned away.

mod banner;

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::form::{DraftRecord, Field, FormRules, ValidationError};
use crate::handoff::{ChatHandoff, LinkLauncher};
use crate::intake::{FormIntake, IntakeClient, IntakeError};

pub use banner::Banner;

const SUBMISSION_FAILED: &str = "Submission failed";
const NETWORK_ERROR: &str = "Network error";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed(Vec<String>),
    Invalid(Vec<Field>),
}

impl SubmissionStatus {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SubmissionStatus::Submitting)
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("a submission is already in progress")]
    InFlight,

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// What happened to the post-success chat handoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandoffOutcome {
    pub url: String,
    /// The launcher accepted the link. False when launching is disabled or failed.
    pub launched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of one completed submission attempt.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptReport {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub status: SubmissionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handoff: Option<HandoffOutcome>,
}

#[derive(Debug, Default)]
struct ControllerState {
    draft: DraftRecord,
    status: SubmissionStatus,
}

/// Handoff settings for a controller.
pub struct HandoffSettings<L> {
    pub handoff: ChatHandoff,
    pub launcher: L,
    /// When false the link is still built and reported but never launched.
    pub launch: bool,
}

pub struct SubmissionController<I, L> {
    intake: I,
    rules: FormRules,
    handoff: HandoffSettings<L>,
    state: Mutex<ControllerState>,
}

impl<L: LinkLauncher> SubmissionController<IntakeClient, L> {
    /// Wire up the hosted intake and chat handoff from configuration.
    pub fn from_config(config: &Config, launcher: L) -> Self {
        Self::new(
            IntakeClient::from_config(config),
            config.form_rules(),
            HandoffSettings {
                handoff: ChatHandoff::from_config(&config.chat),
                launcher,
                launch: config.chat.open_after_success,
            },
        )
    }
}

impl<I, L> SubmissionController<I, L>
where
    I: FormIntake,
    L: LinkLauncher,
{
    pub fn new(intake: I, rules: FormRules, handoff: HandoffSettings<L>) -> Self {
        Self {
            intake,
            rules,
            handoff,
            state: Mutex::new(ControllerState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        // State is plain data; a panic elsewhere cannot leave it half-written.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn rules(&self) -> &FormRules {
        &self.rules
    }

    pub fn update(&self, field: Field, value: impl Into<String>) -> DraftRecord {
        let mut state = self.lock();
        let draft = std::mem::take(&mut state.draft).update(field, value);
        state.draft = draft.clone();
        draft
    }

    pub fn reset(&self) -> DraftRecord {
        let mut state = self.lock();
        state.draft = DraftRecord::reset();
        state.draft.clone()
    }

    pub fn draft(&self) -> DraftRecord {
        self.lock().draft.clone()
    }

    pub fn current_state(&self) -> SubmissionStatus {
        self.lock().status.clone()
    }

    pub fn banner(&self) -> Option<Banner> {
        let state = self.lock();
        Banner::for_status(&state.status, &state.draft)
    }

    /// Send the current draft to the intake service.
    ///
    /// Returns the report for a completed attempt, whether the intake accepted
    /// it or not. Local refusals (already submitting, invalid draft) come back
    /// as errors and never reach the network.
    pub async fn submit(&self) -> Result<AttemptReport, SubmitError> {
        let snapshot = self.begin(None)?;
        Ok(self.send(snapshot).await)
    }

    /// Replace the whole draft and send it, as when a page posts every field
    /// at once. A caller turned away as in flight leaves the draft untouched.
    pub async fn submit_draft(&self, draft: DraftRecord) -> Result<AttemptReport, SubmitError> {
        let snapshot = self.begin(Some(draft))?;
        Ok(self.send(snapshot).await)
    }

    /// Guard, optional replace, validation and the move to `Submitting`, all
    /// under one lock.
    fn begin(&self, replacement: Option<DraftRecord>) -> Result<DraftRecord, SubmitError> {
        let mut state = self.lock();
        if state.status.is_in_flight() {
            return Err(SubmitError::InFlight);
        }
        if let Some(draft) = replacement {
            state.draft = draft;
        }
        if let Err(err) = state.draft.validate(&self.rules) {
            state.status = SubmissionStatus::Invalid(err.fields.clone());
            return Err(err.into());
        }
        state.status = SubmissionStatus::Submitting;
        Ok(state.draft.clone())
    }

    async fn send(&self, snapshot: DraftRecord) -> AttemptReport {
        let id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(attempt = %id, "submitting contact form");

        let result = self.intake.submit(&snapshot.payload(&self.rules)).await;

        let status = match result {
            Ok(()) => SubmissionStatus::Succeeded,
            Err(IntakeError::Rejected { status, errors }) => {
                warn!(attempt = %id, status, reasons = errors.len(), "intake rejected submission");
                if errors.is_empty() {
                    SubmissionStatus::Failed(vec![SUBMISSION_FAILED.to_string()])
                } else {
                    SubmissionStatus::Failed(errors)
                }
            }
            Err(IntakeError::Transport(err)) => {
                warn!(attempt = %id, error = %err, "intake unreachable");
                SubmissionStatus::Failed(vec![NETWORK_ERROR.to_string()])
            }
        };

        {
            let mut state = self.lock();
            if status == SubmissionStatus::Succeeded {
                state.draft = DraftRecord::reset();
            }
            state.status = status.clone();
        }

        let handoff = match status {
            SubmissionStatus::Succeeded => {
                info!(attempt = %id, "contact form accepted");
                Some(self.hand_off(id, &snapshot))
            }
            _ => None,
        };

        AttemptReport {
            id,
            started_at,
            status,
            handoff,
        }
    }

    /// Runs after the status is already `Succeeded`; its outcome is reported
    /// alongside the attempt and cannot change it.
    fn hand_off(&self, id: Uuid, submitted: &DraftRecord) -> HandoffOutcome {
        let url = self.handoff.handoff.url(submitted);
        if !self.handoff.launch {
            return HandoffOutcome {
                url,
                launched: false,
                error: None,
            };
        }

        match self.handoff.launcher.launch(&url) {
            Ok(()) => HandoffOutcome {
                url,
                launched: true,
                error: None,
            },
            Err(err) => {
                warn!(attempt = %id, error = %err, "chat handoff failed");
                HandoffOutcome {
                    url,
                    launched: false,
                    error: Some(err.to_string()),
                }
            }
        }
    }
}
