//! Integration test suite for agentflow.
//!
//! These tests drive complete runs through the public API: a registry of
//! scripted steps, the orchestrator state machine, and the validation
//! gate. They verify that the components work together correctly.
//!
//! # Test Categories
//!
//! - `workflow_e2e`: Full runs from Setup to Completed
//! - `recovery`: Pause on recoverable failures and resume
//! - `validation`: Findings flowing into the final validation gate
//!
//! # CI Compatibility
//!
//! Steps are scripted in-process; only the command-step tests spawn `sh`,
//! and those are limited to unix.

mod fixtures;

mod recovery;
mod validation;
