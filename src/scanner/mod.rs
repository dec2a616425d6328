//! scanner
//!
//! Static-analysis tool invocation: the subprocess runner, its raw
//! output model, and ephemeral repository checkouts.

pub mod mock;
pub mod tool;
pub mod workspace;

pub use mock::StaticScanTool;
pub use tool::{parse_tool_output, RawExtra, RawPosition, RawResult, ScanTool, ScanToolError, SemgrepTool};
pub use workspace::{Workspace, WorkspaceError};
