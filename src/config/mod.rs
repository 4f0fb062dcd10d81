//! Expectation files.
//!
//! An expectation file lists the sequence `seqlog check` looks for, in YAML
//! (JSON works too, being a subset):
//!
//! ```yaml
//! expectations:
//!   - level: info
//!     source: svc
//!     message: svc.start
//!     data:
//!       task: ${TASK:-build}
//!   - level: error
//!     error: connection refused
//! ```

pub mod loader;
pub mod schema;

pub use loader::{ExpectationLoader, LoadResult, LoadWarning, LoaderOptions};
pub use schema::{ExpectationConfig, ExpectationFile, LevelSpec};
