//! compkit-lib: multi-target component build orchestration
//!
//! This crate provides the pieces a component build is assembled from:
//! - `files`: the script, typed and other file sets of a source tree
//! - `task`: named build steps and the registry that resolves them
//! - `plan`: the staged plans chosen for a project's shape and targets
//! - `execute`: the orchestrator that runs plans and the miniapp compiler
//! - `transform` and `miniapp`: the external collaborators steps delegate to

pub mod config;
pub mod consts;
pub mod context;
pub mod execute;
pub mod files;
pub mod miniapp;
pub mod plan;
pub mod task;
pub mod transform;
pub mod util;
