// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Lifecycle State Machine
//!
//! Formal FSM for one declared resource during a provisioning run.
//!
//! # States
//!
//! - Declared: registered in the graph, run not started
//! - Waiting: suspended on its deferred inputs
//! - Creating: inputs resolved, provider call in flight
//! - Succeeded: provider returned outputs (terminal)
//! - Failed: provider rejected the call (terminal)
//! - DependencyFailed: an input's producer failed; never attempted (terminal)
//!
//! # Inputs
//!
//! - AwaitInputs: Declared → Waiting
//! - InputsResolved: Waiting → Creating
//! - UpstreamFailed: Waiting → DependencyFailed
//! - CreationSucceeded: Creating → Succeeded
//! - CreationFailed: Creating → Failed

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{StateMachine, TransitionError, TransitionResult};

/// Lifecycle state of a declared resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    Declared,
    Waiting,
    Creating,
    Succeeded,
    Failed,
    DependencyFailed,
}

impl ResourceState {
    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::DependencyFailed)
    }

    /// Whether this terminal state counts as a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::DependencyFailed)
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Declared => "declared",
            Self::Waiting => "waiting",
            Self::Creating => "creating",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::DependencyFailed => "dependency_failed",
        };
        f.write_str(s)
    }
}

/// Lifecycle command (FSM input)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleCommand {
    /// Start waiting on deferred inputs
    AwaitInputs,

    /// All inputs resolved; issue the provider call
    InputsResolved,

    /// An input's producer failed
    UpstreamFailed,

    /// Provider returned outputs
    CreationSucceeded,

    /// Provider rejected the call
    CreationFailed,
}

impl StateMachine for ResourceState {
    type Input = LifecycleCommand;

    fn transition(&self, input: LifecycleCommand) -> TransitionResult<Self> {
        use LifecycleCommand::*;
        use ResourceState::*;

        match (*self, input) {
            (Declared, AwaitInputs) => Ok(Waiting),
            (Waiting, InputsResolved) => Ok(Creating),
            (Waiting, UpstreamFailed) => Ok(DependencyFailed),
            (Creating, CreationSucceeded) => Ok(Succeeded),
            (Creating, CreationFailed) => Ok(Failed),

            (state, _) if state.is_terminal() => Err(TransitionError::Terminal(state.to_string())),
            (state, command) => Err(TransitionError::InvalidTransition {
                from: state.to_string(),
                input: format!("{command:?}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(ResourceState::Declared, LifecycleCommand::AwaitInputs => ResourceState::Waiting)]
    #[test_case(ResourceState::Waiting, LifecycleCommand::InputsResolved => ResourceState::Creating)]
    #[test_case(ResourceState::Waiting, LifecycleCommand::UpstreamFailed => ResourceState::DependencyFailed)]
    #[test_case(ResourceState::Creating, LifecycleCommand::CreationSucceeded => ResourceState::Succeeded)]
    #[test_case(ResourceState::Creating, LifecycleCommand::CreationFailed => ResourceState::Failed)]
    fn test_accepted_transition(state: ResourceState, command: LifecycleCommand) -> ResourceState {
        state.transition(command).unwrap()
    }

    #[test]
    fn test_terminal_states_reject_input() {
        for state in [
            ResourceState::Succeeded,
            ResourceState::Failed,
            ResourceState::DependencyFailed,
        ] {
            assert!(state.is_terminal());
            assert!(matches!(
                state.transition(LifecycleCommand::AwaitInputs),
                Err(TransitionError::Terminal(_))
            ));
        }
    }

    #[test]
    fn test_cannot_create_before_inputs_resolve() {
        assert!(matches!(
            ResourceState::Declared.transition(LifecycleCommand::CreationSucceeded),
            Err(TransitionError::InvalidTransition { .. })
        ));
        assert!(ResourceState::Waiting
            .transition(LifecycleCommand::CreationFailed)
            .is_err());
    }

    #[test]
    fn test_failure_states() {
        assert!(ResourceState::Failed.is_failure());
        assert!(ResourceState::DependencyFailed.is_failure());
        assert!(!ResourceState::Succeeded.is_failure());
    }
}
