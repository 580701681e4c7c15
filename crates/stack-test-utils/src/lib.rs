//! Shared test utilities for the Stack Builder workspace.
//!
//! This crate provides standardised project fixtures so crate test suites do
//! not each hand-roll temp directories and env files. It is a dev-dependency
//! only and never published.
//!
//! # Modules
//!
//! - [`project`]: [`TestProject`] builder for configuration source layouts

pub mod project;

pub use project::TestProject;
