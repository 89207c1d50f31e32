//! Unit tests for the dockhand agent.
//!
//! These tests use mocked ports and run fast without a container runtime,
//! a network, or a remote repository.

mod mocks;
mod restart;
mod status;
