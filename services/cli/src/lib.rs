//! Interview CLI Library Crate
//!
//! Holds the environment configuration for the terminal front-end. The
//! `interview` binary is a thin wrapper around this library and the
//! `interview-core` orchestrator.

pub mod config;
