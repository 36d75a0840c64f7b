#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Cleanup operations for migsweep
//!
//! This crate holds the core of the tool: classifying a repository's
//! migration toolchain, deciding whether it needs cleaning, staging the
//! deletions on a fork branch, proposing them as a pull request, and
//! coordinating all of that over a list of candidates.

mod classify;
mod cleanup;
mod context;
mod pattern;
mod publish;
mod relevance;
mod run;

pub use classify::classify;
pub use cleanup::Cleaner;
pub use context::{OpsContextBuilder, OpsCtx};
pub use pattern::DeprecatedRevisionMatcher;
pub use publish::{publish, render_body};
pub use relevance::is_relevant;
pub use run::{resolve_candidates, run};
