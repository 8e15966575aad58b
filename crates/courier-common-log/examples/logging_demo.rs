//! Example showing the Courier logging setup with a dispatch span.

use std::path::PathBuf;
use courier_common_log::spans::{dispatch_span, Timer};
use courier_common_log::{debug, info, init, warn, LogConfig, LogFormat, LogLevel};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = LogConfig {
        level: LogLevel::Debug,
        format: LogFormat::Json,
        file_path: Some(PathBuf::from("/tmp/courier-demo.log")),
        source_location: true,
        span_events: true,
    };

    init(config)?;

    let span = dispatch_span("GET", "http://example.com/index.html");
    let _guard = span.enter();

    let timer = Timer::start("demo");
    debug!("resolving url");
    info!(status = 200, bytes = 1270, cached = false, "dispatch complete");
    warn!(rule = "([bad", "skipping malformed rewrite rule");
    timer.finish();

    println!("Log file written to /tmp/courier-demo.log");
    Ok(())
}
