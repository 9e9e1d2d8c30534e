//! Shared test utilities for the weaseltree workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`]: repository fixtures and a thin `git` CLI runner
//! - [`repo`]: [`repo::LinkedPair`] builder for primary/mirror scenarios

pub mod git;
pub mod repo;
