//! Shared helpers for `seqlog` integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::sync::Arc;

use seqlog::logger::{Logger, TestSink};
use tempfile::NamedTempFile;

/// A root logger wired to a fresh in-memory sink.
#[must_use]
pub fn logger_with_sink(component: &str) -> (Logger, Arc<TestSink>) {
    let sink = Arc::new(TestSink::new());
    let mut logger = Logger::new(component);
    logger.register_sink(sink.clone());
    (logger, sink)
}

/// Writes `contents` to a temporary file that lives as long as the handle.
#[allow(clippy::missing_panics_doc)]
pub fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

/// Runs the `seqlog` binary with `args`, feeding `stdin` if given.
#[allow(clippy::missing_panics_doc)]
pub fn run_seqlog(args: &[&str], stdin: Option<&[u8]>) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_seqlog"))
        .args(args)
        .env_remove("SEQLOG_LOG_LEVEL")
        .env_remove("SEQLOG_EXPECT")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn seqlog");

    let mut pipe = child.stdin.take().expect("stdin not captured");
    if let Some(bytes) = stdin {
        pipe.write_all(bytes).expect("write stdin");
    }
    drop(pipe);

    child.wait_with_output().expect("wait for seqlog")
}

/// Path argument as `&str`.
#[allow(clippy::missing_panics_doc)]
#[must_use]
pub fn path_str(path: &Path) -> &str {
    path.to_str().expect("non-UTF-8 temp path")
}
