// Copyright (c) 2025 - Cowboy AI, Inc.
//! Finite state machines with a recorded path
//!
//! A machine is a pure `(state, input) -> state` function. [`Recorded`]
//! applies inputs to one and keeps every accepted step with its timestamp,
//! which is what the executor reports per resource.
//!
//! ```rust,ignore
//! use cim_provisioning::state_machine::*;
//!
//! let mut lifecycle = Recorded::new(ResourceState::Declared);
//! lifecycle.apply(LifecycleCommand::AwaitInputs, Utc::now())?;
//! lifecycle.apply(LifecycleCommand::InputsResolved, Utc::now())?;
//! assert_eq!(lifecycle.state(), ResourceState::Creating);
//! ```

use chrono::{DateTime, Utc};
use std::fmt::Debug;

pub mod resource_lifecycle;

pub use resource_lifecycle::{LifecycleCommand, ResourceState};

pub type TransitionResult<S> = Result<S, TransitionError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The input is not accepted in the current state
    #[error("Invalid transition from {from} on {input}")]
    InvalidTransition { from: String, input: String },

    /// State is terminal and accepts no further input
    #[error("State {0} is terminal")]
    Terminal(String),
}

/// Pure transition function over a copyable state
pub trait StateMachine: Copy + Debug {
    type Input: Copy + Debug;

    fn transition(&self, input: Self::Input) -> TransitionResult<Self>;
}

/// One accepted step
#[derive(Debug, Clone, Copy)]
pub struct Step<S, I> {
    pub from: S,
    pub to: S,
    pub input: I,
    pub at: DateTime<Utc>,
}

/// A machine plus the steps it has taken
#[derive(Debug, Clone)]
pub struct Recorded<M: StateMachine> {
    state: M,
    steps: Vec<Step<M, M::Input>>,
}

impl<M: StateMachine> Recorded<M> {
    pub fn new(initial: M) -> Self {
        Self {
            state: initial,
            steps: Vec::new(),
        }
    }

    /// Apply an input; a rejected input leaves state and steps untouched
    pub fn apply(&mut self, input: M::Input, at: DateTime<Utc>) -> TransitionResult<M> {
        let to = self.state.transition(input)?;
        self.steps.push(Step {
            from: self.state,
            to,
            input,
            at,
        });
        self.state = to;
        Ok(to)
    }

    pub fn state(&self) -> M {
        self.state
    }

    pub fn steps(&self) -> &[Step<M, M::Input>] {
        &self.steps
    }
}
