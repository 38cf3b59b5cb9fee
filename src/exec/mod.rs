// src/exec/mod.rs

//! Build execution layer.
//!
//! - [`backend`] provides the `SceneCompiler` trait that the worker talks to,
//!   and which tests replace with fakes.
//! - [`command`] is the production compiler: a shell command whose stdout is
//!   the bundle.
//! - [`single_flight`] owns the `BuildWorker`, which collapses concurrent
//!   builds of one scene into a single compiler invocation.

pub mod backend;
pub mod command;
pub mod single_flight;

pub use backend::{CompileRequest, SceneCompiler};
pub use command::CommandCompiler;
pub use single_flight::{
    log_build, BuildFuture, BuildObserver, BuildResult, BuildWorker, CompileSettings,
};
