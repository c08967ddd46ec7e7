//! CLI module for the quire command-line interface
//!
//! Argument parsing lives in [`args`]; [`commands`] turns parsed arguments
//! into library calls.

pub mod args;
pub mod commands;
