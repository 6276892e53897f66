#![forbid(unsafe_code)]

//! Session orchestrator for interactive, stepwise program inlining.
//!
//! A host (typically a notebook extension) creates one
//! [`TransformSession`](session::TransformSession) per cell through the
//! [`SessionRegistry`](registry::SessionRegistry). Sessions drive a remote
//! `InteractiveInliner` object living in a persistent interpreter via the
//! [`CommandBridge`](bridge::CommandBridge), keep the program history and
//! target/suggestion lists in step with it, and run the two-phase optimize
//! fixpoint.

pub mod bridge;
pub mod config;
pub mod editor;
pub mod errors;
pub mod kernel;
pub mod logging;
pub mod models;
pub mod registry;
pub mod session;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
