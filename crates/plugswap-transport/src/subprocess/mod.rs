//! Subprocess capability
//!
//! Runs external tools either to completion with captured output, or
//! detached so they outlive the calling process.

pub mod process;

pub use process::{ProcessConfig, ProcessInvoker, ProcessOutput, SystemProcessInvoker};
