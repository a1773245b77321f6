//! Session/job state machine for the conversion workflow.
//!
//! [`transition`] is a pure function from the current state and an
//! observed event to the next state and the side effect the orchestrator
//! must perform. The orchestrator owns the I/O; this module only decides.

use serde::Serialize;

use crate::status::JobStatus;
use crate::types::{ArtifactId, BearerToken};

/// Where a workflow instance currently is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    /// Logged in, no job in flight.
    Idle,
    /// Logged in, waiting for the conversion of `source`.
    JobPending { source: ArtifactId },
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::Unauthenticated)
    }
}

/// Something the orchestrator observed.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    LoginSucceeded(BearerToken),
    Submitted { source: ArtifactId },
    PollCompleted { source: ArtifactId, result: ArtifactId },
    PollTimedOut { source: ArtifactId, last_status: JobStatus },
    LoggedOut,
    /// Any failed operation. Never changes state.
    Failed,
}

/// Side effect the orchestrator applies after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StoreToken(BearerToken),
    /// Drop the token and the last job snapshot.
    ClearSession,
    TrackJob(ArtifactId),
    ExposeResult(ArtifactId),
    ExposePending {
        source: ArtifactId,
        last_status: JobStatus,
    },
    None,
    /// The event is not valid in the current state; nothing changes.
    Ignored,
}

pub fn transition(state: &SessionState, event: WorkflowEvent) -> (SessionState, Effect) {
    use SessionState::*;

    match (state, event) {
        (JobPending { source }, WorkflowEvent::LoginSucceeded(token)) => (
            JobPending {
                source: source.clone(),
            },
            Effect::StoreToken(token),
        ),
        (_, WorkflowEvent::LoginSucceeded(token)) => (Idle, Effect::StoreToken(token)),

        (Idle, WorkflowEvent::Submitted { source }) => (
            JobPending {
                source: source.clone(),
            },
            Effect::TrackJob(source),
        ),

        (JobPending { source: pending }, WorkflowEvent::PollCompleted { source, result })
            if *pending == source =>
        {
            (Idle, Effect::ExposeResult(result))
        }

        (
            JobPending { source: pending },
            WorkflowEvent::PollTimedOut {
                source,
                last_status,
            },
        ) if *pending == source => (
            Idle,
            Effect::ExposePending {
                source,
                last_status,
            },
        ),

        (_, WorkflowEvent::LoggedOut) => (Unauthenticated, Effect::ClearSession),

        (current, WorkflowEvent::Failed) => (current.clone(), Effect::None),

        (current, _) => (current.clone(), Effect::Ignored),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn id(s: &str) -> ArtifactId {
        ArtifactId::new(s).unwrap()
    }

    fn token(s: &str) -> BearerToken {
        BearerToken::new(s).unwrap()
    }

    // -- Happy path ----------------------------------------------------------

    #[test]
    fn login_moves_to_idle_and_stores_token() {
        let (next, effect) = transition(
            &SessionState::Unauthenticated,
            WorkflowEvent::LoginSucceeded(token("T1")),
        );
        assert_eq!(next, SessionState::Idle);
        assert_eq!(effect, Effect::StoreToken(token("T1")));
    }

    #[test]
    fn full_cycle_submit_then_complete() {
        let (pending, effect) = transition(
            &SessionState::Idle,
            WorkflowEvent::Submitted { source: id("vid-42") },
        );
        assert_eq!(pending, SessionState::JobPending { source: id("vid-42") });
        assert_eq!(effect, Effect::TrackJob(id("vid-42")));

        let (idle, effect) = transition(
            &pending,
            WorkflowEvent::PollCompleted {
                source: id("vid-42"),
                result: id("mp3-7"),
            },
        );
        assert_eq!(idle, SessionState::Idle);
        assert_eq!(effect, Effect::ExposeResult(id("mp3-7")));
    }

    #[test]
    fn timeout_returns_to_idle_with_last_status() {
        let pending = SessionState::JobPending { source: id("vid-42") };
        let (next, effect) = transition(
            &pending,
            WorkflowEvent::PollTimedOut {
                source: id("vid-42"),
                last_status: JobStatus::InProgress,
            },
        );
        assert_eq!(next, SessionState::Idle);
        assert_matches!(
            effect,
            Effect::ExposePending { source, last_status: JobStatus::InProgress } if source == id("vid-42")
        );
    }

    #[test]
    fn logout_from_any_authenticated_state() {
        for state in [
            SessionState::Idle,
            SessionState::JobPending { source: id("vid-1") },
        ] {
            let (next, effect) = transition(&state, WorkflowEvent::LoggedOut);
            assert_eq!(next, SessionState::Unauthenticated);
            assert_eq!(effect, Effect::ClearSession);
        }
    }

    // -- Failures and invalid events -----------------------------------------

    #[test]
    fn failure_keeps_state() {
        let pending = SessionState::JobPending { source: id("vid-1") };
        let (next, effect) = transition(&pending, WorkflowEvent::Failed);
        assert_eq!(next, pending);
        assert_eq!(effect, Effect::None);

        let (next, _) = transition(&SessionState::Unauthenticated, WorkflowEvent::Failed);
        assert_eq!(next, SessionState::Unauthenticated);
    }

    #[test]
    fn submit_without_login_is_ignored() {
        let (next, effect) = transition(
            &SessionState::Unauthenticated,
            WorkflowEvent::Submitted { source: id("vid-1") },
        );
        assert_eq!(next, SessionState::Unauthenticated);
        assert_eq!(effect, Effect::Ignored);
    }

    #[test]
    fn completion_for_another_job_is_ignored() {
        let pending = SessionState::JobPending { source: id("vid-1") };
        let (next, effect) = transition(
            &pending,
            WorkflowEvent::PollCompleted {
                source: id("vid-2"),
                result: id("mp3-2"),
            },
        );
        assert_eq!(next, pending);
        assert_eq!(effect, Effect::Ignored);
    }

    #[test]
    fn relogin_while_pending_keeps_the_job() {
        let pending = SessionState::JobPending { source: id("vid-1") };
        let (next, effect) =
            transition(&pending, WorkflowEvent::LoginSucceeded(token("T2")));
        assert_eq!(next, pending);
        assert_eq!(effect, Effect::StoreToken(token("T2")));
    }
}
