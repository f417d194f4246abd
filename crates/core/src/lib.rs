//! Core state machine and protocol adapter for scripted mock interviews.
//!
//! The crate is organized leaves-first:
//! - [`prompts`]: parameterized instruction templates for the three phases.
//! - [`transcript`]: the exchange log and its model-facing renderings.
//! - [`retry`]: the bounded-backoff policy for outbound calls.
//! - [`client`]: the request/response adapter to the generation service.
//! - [`session`]: the interview orchestrator driving one session.
//!
//! A presentation layer (see the `interview-cli` service) constructs an
//! [`Interview`], invokes its operations on user action, and re-renders from
//! the returned session state.

pub mod client;
pub mod prompts;
pub mod retry;
pub mod session;
pub mod transcript;

pub use client::{GeminiClient, GenerateError, GenerationClient};
pub use retry::RetryPolicy;
pub use session::{Interview, InterviewError, Phase, Session};
pub use transcript::{Exchange, Level, Speaker, Turn, TurnRole};
