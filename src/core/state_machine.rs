//! State machine tracking a single pipeline run
//!
//! `Initial → Cleaning → Generating → (Publishing) → Done`, with `Failed`
//! reachable from every non-terminal state. `Done` and `Failed` are absorbing.

use crate::core::error::DocsError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Initial,
    Cleaning,
    Generating,
    Publishing,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    fn can_transition_to(&self, to: PipelineState) -> bool {
        use PipelineState::*;

        match (self, to) {
            (Done | Failed, _) => false,
            (_, Failed) => true,
            (Initial, Cleaning) => true,
            (Cleaning, Generating) => true,
            (Generating, Publishing | Done) => true,
            (Publishing, Done) => true,
            _ => false,
        }
    }
}

/// State transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateTransition {
    pub from: PipelineState,
    pub to: PipelineState,
    pub timestamp: DateTime<Utc>,
}

/// In-memory state machine for one pipeline run
#[derive(Debug)]
pub struct PipelineStateMachine {
    current_state: PipelineState,
    transitions: Vec<StateTransition>,
    error: Option<String>,
}

impl Default for PipelineStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStateMachine {
    pub fn new() -> Self {
        Self {
            current_state: PipelineState::Initial,
            transitions: Vec::new(),
            error: None,
        }
    }

    /// Transition to a new state
    pub fn transition(&mut self, to: PipelineState) -> Result<(), DocsError> {
        if !self.current_state.can_transition_to(to) {
            return Err(DocsError::InvalidTransition {
                from: format!("{:?}", self.current_state),
                to: format!("{:?}", to),
            });
        }

        self.transitions.push(StateTransition {
            from: self.current_state,
            to,
            timestamp: Utc::now(),
        });
        self.current_state = to;

        Ok(())
    }

    /// Move to `Failed`, remembering the error message
    pub fn fail(&mut self, error: &DocsError) {
        if self.current_state.is_terminal() {
            return;
        }
        self.error = Some(error.to_string());
        // Failed is reachable from every non-terminal state.
        let _ = self.transition(PipelineState::Failed);
    }

    pub fn get_state(&self) -> PipelineState {
        self.current_state
    }

    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    pub fn get_last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Get elapsed time in milliseconds between first and last transition
    pub fn get_elapsed_time(&self) -> i64 {
        match (self.transitions.first(), self.transitions.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_milliseconds(),
            _ => 0,
        }
    }

    /// Get transition history as human-readable string
    pub fn get_history(&self) -> String {
        self.transitions
            .iter()
            .map(|t| format!("{}: {:?} → {:?}", t.timestamp.to_rfc3339(), t.from, t.to))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
