//! End-to-end tests of the `seqlog` binary.

mod common;

use seqlog::error::ExitCode;
use seqlog::logger::TestSink;
use seqlog::record::Data;

use common::{logger_with_sink, path_str, run_seqlog, temp_file};

const EXPECT_START_FAIL: &str = "\
expectations:
  - level: info
    message: svc.start
    data:
      task: t1
  - level: error
    message: svc.fail
    error: disk full
";

fn sample_log() -> Vec<u8> {
    let (logger, sink): (_, std::sync::Arc<TestSink>) = logger_with_sink("svc");
    logger.info("start", &[Data::from([("task", "t1")])]);
    logger.debug("noise", &[]);
    logger.error("fail", Some(&std::io::Error::other("disk full")), &[]);
    sink.buffer().contents().to_vec()
}

#[test]
fn check_file_success() {
    let expect = temp_file(EXPECT_START_FAIL);
    let log = temp_file(std::str::from_utf8(&sample_log()).unwrap());

    let out = run_seqlog(&["check", "--expect", path_str(expect.path()), path_str(log.path())], None);
    assert_eq!(out.status.code(), Some(ExitCode::SUCCESS));
    assert!(String::from_utf8_lossy(&out.stdout).starts_with("ok:"));
}

#[test]
fn check_stdin_mismatch_prints_report() {
    let expect = temp_file(
        "expectations:\n  - level: error\n    message: svc.fail\n  - level: info\n    message: svc.start\n",
    );
    let log = sample_log();

    let out = run_seqlog(&["check", "-e", path_str(expect.path()), "-"], Some(&log));
    assert_eq!(out.status.code(), Some(ExitCode::MISMATCH));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("to contain log sequence"));
    assert!(stderr.contains("first unmatched expectation [1]"));
}

#[test]
fn check_negated() {
    let expect = temp_file("expectations:\n  - level: fatal\n");
    let log = sample_log();

    let out = run_seqlog(&["check", "-e", path_str(expect.path()), "--negate"], Some(&log));
    assert_eq!(out.status.code(), Some(ExitCode::SUCCESS));

    let expect = temp_file("expectations:\n  - level: debug\n");
    let out = run_seqlog(&["check", "-e", path_str(expect.path()), "--negate"], Some(&log));
    assert_eq!(out.status.code(), Some(ExitCode::MISMATCH));
    assert!(String::from_utf8_lossy(&out.stderr).contains("not to contain log sequence"));
}

#[test]
fn check_json_report() {
    let expect = temp_file(EXPECT_START_FAIL);
    let out = run_seqlog(
        &["check", "-e", path_str(expect.path()), "--format", "json"],
        Some(&sample_log()),
    );
    assert_eq!(out.status.code(), Some(ExitCode::SUCCESS));

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["passed"], true);
    assert_eq!(report["records"], 3);
    assert_eq!(report["outcome"]["indices"], serde_json::json!([0, 2]));
}

#[test]
fn check_malformed_log_is_decode_error() {
    let expect = temp_file(EXPECT_START_FAIL);
    let out = run_seqlog(&["check", "-e", path_str(expect.path())], Some(b"{\"log_level\":"));
    assert_eq!(out.status.code(), Some(ExitCode::DECODE_ERROR));
}

#[test]
fn check_missing_log_file_is_io_error() {
    let expect = temp_file(EXPECT_START_FAIL);
    let out = run_seqlog(
        &["check", "-e", path_str(expect.path()), "/nonexistent/seqlog/app.log"],
        None,
    );
    assert_eq!(out.status.code(), Some(ExitCode::IO_ERROR));
}

#[test]
fn check_bad_expectation_file_is_config_error() {
    let expect = temp_file("expectations:\n  - level: warn\n");
    let out = run_seqlog(&["check", "-e", path_str(expect.path())], Some(b""));
    assert_eq!(out.status.code(), Some(ExitCode::CONFIG_ERROR));
    assert!(String::from_utf8_lossy(&out.stderr).contains("expectations[0].level"));

    let empty = temp_file("");
    let out = run_seqlog(&["check", "-e", path_str(empty.path())], Some(b""));
    assert_eq!(out.status.code(), Some(ExitCode::CONFIG_ERROR));
}

#[test]
fn usage_error_exit_code() {
    let out = run_seqlog(&["check"], None);
    assert_eq!(out.status.code(), Some(ExitCode::USAGE_ERROR));
}

#[test]
fn version_json() {
    let out = run_seqlog(&["version", "--format", "json"], None);
    assert_eq!(out.status.code(), Some(ExitCode::SUCCESS));
    let version: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(version["name"], "seqlog");
}
