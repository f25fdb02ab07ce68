//! Command-line front end for the annotation import engine.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
