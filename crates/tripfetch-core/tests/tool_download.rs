//! Integration tests: the batch fetcher driving the external `curl` and `wget`
//! binaries against a local HTTP server. Skipped when the tool isn't installed.

mod common;

use common::range_server::{self, ServerOptions, TestServer};
use std::collections::HashMap;
use std::path::Path;
use tempfile::tempdir;
use tripfetch_core::batch::run_batch;
use tripfetch_core::config::BatchConfig;
use tripfetch_core::fetch::{tool_available, FetchError, FetchOutcome, Tool, ToolFetcher};

const TOTAL: usize = 50_000;
const PARTIAL: usize = 20_000;

fn body_for(month: u8) -> Vec<u8> {
    (0u8..=250).cycle().skip(month as usize).take(TOTAL).collect()
}

fn name(month: u8) -> String {
    format!("yellow_tripdata_2020-{:02}.parquet", month)
}

fn serve(months: &[u8]) -> TestServer {
    let files: HashMap<String, Vec<u8>> = months.iter().map(|&m| (name(m), body_for(m))).collect();
    range_server::start(files, ServerOptions::default())
}

fn config(server: &TestServer, output_dir: &Path, months: Vec<u8>) -> BatchConfig {
    BatchConfig {
        base_url: server.base_url.clone(),
        years: vec![2020],
        months,
        output_dir: output_dir.to_path_buf(),
        ..BatchConfig::default()
    }
}

fn installed(tool: Tool) -> bool {
    if tool_available(tool) {
        return true;
    }
    eprintln!("{} not installed; skipping", tool.program());
    false
}

fn resume_then_rerun_is_complete(tool: Tool) {
    let server = serve(&[1]);
    let tmp = tempdir().unwrap();
    let body = body_for(1);
    std::fs::write(tmp.path().join(name(1)), &body[..PARTIAL]).unwrap();
    let cfg = config(&server, tmp.path(), vec![1]);
    let fetcher = ToolFetcher::new(tool);

    let first = run_batch(&cfg, &fetcher, &mut std::io::sink()).unwrap();
    assert!(
        matches!(
            first.outcomes[0].result,
            Ok(FetchOutcome::Resumed { from, bytes })
                if from == PARTIAL as u64 && bytes == TOTAL as u64
        ),
        "{}: first run gave {:?}",
        tool.program(),
        first.outcomes[0].result
    );
    assert_eq!(std::fs::read(tmp.path().join(name(1))).unwrap(), body);
    let gets_after_first = server.stats.gets();

    let mut transcript = Vec::new();
    let second = run_batch(&cfg, &fetcher, &mut transcript).unwrap();
    assert!(
        matches!(
            second.outcomes[0].result,
            Ok(FetchOutcome::AlreadyComplete { size }) if size == TOTAL as u64
        ),
        "{}: second run gave {:?}",
        tool.program(),
        second.outcomes[0].result
    );
    assert_eq!(server.stats.gets(), gets_after_first);
    assert_eq!(std::fs::read(tmp.path().join(name(1))).unwrap(), body);
    let text = String::from_utf8(transcript).unwrap();
    assert!(text.contains(&format!("Successfully downloaded {}\n", name(1))));
}

fn missing_month_fails_cleanly(tool: Tool) {
    // 02 is not served.
    let server = serve(&[1, 3]);
    let tmp = tempdir().unwrap();
    let cfg = config(&server, tmp.path(), vec![1, 2, 3]);

    let report = run_batch(&cfg, &ToolFetcher::new(tool), &mut std::io::sink()).unwrap();

    assert_eq!(report.attempted(), 3);
    assert_eq!(report.succeeded(), 2);
    assert!(matches!(
        report.outcomes[1].result,
        Err(FetchError::Tool { .. })
    ));
    assert!(
        !tmp.path().join(name(2)).exists(),
        "{} left a file behind for a 404",
        tool.program()
    );
    assert!(matches!(
        report.outcomes[2].result,
        Ok(FetchOutcome::Downloaded { bytes }) if bytes == TOTAL as u64
    ));
    assert_eq!(std::fs::read(tmp.path().join(name(3))).unwrap(), body_for(3));
}

#[test]
fn curl_tool_resumes_then_reports_complete() {
    if installed(Tool::Curl) {
        resume_then_rerun_is_complete(Tool::Curl);
    }
}

#[test]
fn wget_tool_resumes_then_reports_complete() {
    if installed(Tool::Wget) {
        resume_then_rerun_is_complete(Tool::Wget);
    }
}

#[test]
fn curl_tool_missing_file_fails_and_leaves_nothing() {
    if installed(Tool::Curl) {
        missing_month_fails_cleanly(Tool::Curl);
    }
}

#[test]
fn wget_tool_missing_file_fails_and_leaves_nothing() {
    if installed(Tool::Wget) {
        missing_month_fails_cleanly(Tool::Wget);
    }
}
