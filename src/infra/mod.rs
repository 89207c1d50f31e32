//! Infrastructure layer — concrete implementations of application port
//! traits.
//!
//! This module contains all I/O-performing code: the container runtime
//! client, the git checkout, compose invocation, process execution, config
//! loading, probing, and log archiving.
//!
//! Imports from `crate::domain` and `crate::application::ports` are
//! allowed. Imports from `crate::api` are forbidden.

pub mod archive;
pub mod command_runner;
pub mod compose;
pub mod config;
pub mod docker;
pub mod git;
pub mod probe;
