//! GitPulse Repository - repository acquisition and history statistics
//!
//! Clones or updates working copies with the system git binary, queries their
//! history and turns the output into per-contributor statistics

pub mod acquisition;
pub mod analyzer;
pub mod batch;
pub mod git;
pub mod history;
pub mod parser;
pub mod report;
pub mod url;

pub use acquisition::*;
pub use analyzer::*;
pub use batch::*;
pub use git::*;
pub use history::*;
pub use report::*;
pub use url::*;
