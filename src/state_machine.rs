//! State machine for domain aggregates
//!
//! Aggregates use an input-driven (Mealy) state machine to enforce valid
//! state transitions: whether a transition is allowed depends on the current
//! state, the target state, and the input that requests it. For orders the
//! input is the acting party, so the same target state can be reachable by
//! an administrator but not by a customer.

use crate::entity::EntityId;
use crate::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::marker::PhantomData;
use uuid::Uuid;

/// Input to a state machine transition
pub trait TransitionInput: Debug + Clone + Send + Sync {
    /// Get a description of this input for logging
    fn description(&self) -> String;
}

/// Trait for types that can be used as states in a state machine
pub trait State: Debug + Clone + PartialEq + Eq + Send + Sync {
    /// Get the name of this state for logging/debugging
    fn name(&self) -> &'static str;

    /// Check if this is a terminal state
    fn is_terminal(&self) -> bool {
        false
    }
}

/// Input-driven state transitions: validity depends on state AND input.
pub trait MealyStateTransitions: State {
    /// The input type for transitions
    type Input: TransitionInput;

    /// Check if a transition is valid given the input
    fn can_transition_to(&self, target: &Self, input: &Self::Input) -> bool;

    /// Get all valid target states for a given input
    fn valid_transitions(&self, input: &Self::Input) -> Vec<Self>;
}

/// Record of a state transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition<S, I> {
    /// The state before the transition
    pub from: S,
    /// The state after the transition
    pub to: S,
    /// The input that triggered the transition
    pub input: I,
    /// Unique identifier for this transition instance
    pub transition_id: Uuid,
    /// When the transition occurred
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Mealy state machine for aggregates
#[derive(Debug, Clone)]
pub struct MealyMachine<S: MealyStateTransitions, M> {
    current_state: S,
    aggregate_id: EntityId<M>,
    transition_history: Vec<StateTransition<S, S::Input>>,
    _phantom: PhantomData<M>,
}

impl<S: MealyStateTransitions, M> MealyMachine<S, M> {
    /// Create a new state machine for an aggregate
    pub fn new(initial_state: S, aggregate_id: EntityId<M>) -> Self {
        Self {
            current_state: initial_state,
            aggregate_id,
            transition_history: Vec::new(),
            _phantom: PhantomData,
        }
    }

    /// Get the current state
    pub fn current_state(&self) -> &S {
        &self.current_state
    }

    /// Get the aggregate ID
    pub fn aggregate_id(&self) -> &EntityId<M> {
        &self.aggregate_id
    }

    /// Transition to a new state with input
    pub fn transition_to(
        &mut self,
        new_state: S,
        input: S::Input,
    ) -> DomainResult<StateTransition<S, S::Input>> {
        if self.current_state.is_terminal()
            || !self.current_state.can_transition_to(&new_state, &input)
        {
            return Err(DomainError::InvalidStateTransition {
                from: self.current_state.name().to_string(),
                to: new_state.name().to_string(),
            });
        }

        Ok(self.record(new_state, input))
    }

    /// Apply a transition without checking the table.
    ///
    /// Callers own the decision to bypass the table (the permissive admin
    /// policy); the transition is still recorded in the history.
    pub fn force_transition_to(
        &mut self,
        new_state: S,
        input: S::Input,
    ) -> StateTransition<S, S::Input> {
        self.record(new_state, input)
    }

    fn record(&mut self, new_state: S, input: S::Input) -> StateTransition<S, S::Input> {
        let transition = StateTransition {
            from: self.current_state.clone(),
            to: new_state.clone(),
            input,
            transition_id: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
        };

        self.current_state = new_state;
        self.transition_history.push(transition.clone());
        transition
    }

    /// Get the transition history
    pub fn history(&self) -> &[StateTransition<S, S::Input>] {
        &self.transition_history
    }

    /// Check if in a specific state
    pub fn is_in_state(&self, state: &S) -> bool {
        &self.current_state == state
    }

    /// Get valid next states for given input
    pub fn valid_next_states(&self, input: &S::Input) -> Vec<S> {
        if self.current_state.is_terminal() {
            return Vec::new();
        }
        self.current_state.valid_transitions(input)
    }
}
