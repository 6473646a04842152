//! Shared state carried through the pipeline.
//!
//! The context only grows during a run: there is no removal API. Strict
//! writes refuse to change an existing value, explicit `upsert` may
//! overwrite one, and every step's own payload lives in a namespace keyed
//! by its id so collaborators cannot collide on ad hoc keys.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::workflow::DeploymentChoice;
use crate::{Error, Result};

/// The agreed vocabulary between steps.
pub mod keys {
    /// Latest external input fed in by the caller.
    pub const USER_INPUT: &str = "user_input";
    pub const PROJECT_REQUIREMENTS: &str = "project_requirements";
    /// Ordered sequence of file identifiers.
    pub const GENERATED_FILES: &str = "generated_files";
    /// One of `github`, `executable`, `source_only`.
    pub const DEPLOYMENT_CHOICE: &str = "deployment_choice";
    /// Criterion name to collaborator-specific payload.
    pub const VALIDATION_RESULTS: &str = "validation_results";
    pub const CONVERSATION: &str = "conversation";
    /// Flag a Definition step sets in its payload once scope is agreed.
    pub const SCOPE_CONFIRMED: &str = "scope_confirmed";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowContext {
    values: BTreeMap<String, Value>,
    steps: BTreeMap<String, Map<String, Value>>,
}

impl WorkflowContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.steps.is_empty()
    }

    /// Write a new key.
    ///
    /// Re-writing the same value is a no-op so a re-run phase stays
    /// idempotent; a different value is a [`Error::ContextConflict`].
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
        let key = key.into();
        match self.values.get(&key) {
            Some(existing) if *existing == value => Ok(()),
            Some(_) => Err(Error::ContextConflict { key }),
            None => {
                debug!(key = %key, "context insert");
                self.values.insert(key, value);
                Ok(())
            }
        }
    }

    /// Write a key, replacing any previous value.
    pub fn upsert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        trace!(key = %key, value = %value, "context upsert");
        self.values.insert(key, value);
    }

    /// Store the caller's latest input.
    pub fn set_input(&mut self, input: &str) {
        self.upsert(keys::USER_INPUT, Value::String(input.to_string()));
    }

    pub fn user_input(&self) -> Option<&str> {
        self.get(keys::USER_INPUT).and_then(Value::as_str)
    }

    pub fn project_requirements(&self) -> Option<&Value> {
        self.get(keys::PROJECT_REQUIREMENTS)
    }

    /// File identifiers in generation order; empty when none were recorded.
    pub fn generated_files(&self) -> Vec<String> {
        self.get(keys::GENERATED_FILES)
            .and_then(Value::as_array)
            .map(|files| {
                files
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn deployment_choice(&self) -> Option<DeploymentChoice> {
        self.get(keys::DEPLOYMENT_CHOICE)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    pub fn set_deployment_choice(&mut self, choice: DeploymentChoice) {
        self.upsert(keys::DEPLOYMENT_CHOICE, Value::String(choice.to_string()));
    }

    pub fn validation_results(&self) -> Option<&Map<String, Value>> {
        self.get(keys::VALIDATION_RESULTS).and_then(Value::as_object)
    }

    /// Payload recorded by the step with this id, if it has run.
    pub fn step_data(&self, step_id: &str) -> Option<&Map<String, Value>> {
        self.steps.get(step_id)
    }

    /// Every step payload, ordered by step id.
    pub fn all_step_data(&self) -> impl Iterator<Item = (&str, &Map<String, Value>)> {
        self.steps.iter().map(|(id, data)| (id.as_str(), data))
    }

    /// Replace the namespaced payload of `step_id`.
    pub fn record_step_data(&mut self, step_id: &str, data: Map<String, Value>) {
        self.steps.insert(step_id.to_string(), data);
    }
}
