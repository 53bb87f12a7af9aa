// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::env;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{EnvFilter, Layer, Registry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "G09WRAP_LOG";
pub const LOG_FORMAT_ENV: &str = "G09WRAP_LOG_FORMAT";
pub const LOG_SPAN_EVENTS_ENV: &str = "G09WRAP_LOG_SPAN_EVENTS";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum LogFormat {
    Json,
    Pretty,
    Compact,
}

/// Installs the global subscriber: stderr always, plus `log_file` when given.
/// Keep the returned guard alive until exit or buffered file lines are lost.
pub fn init(verbose: bool, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let format = parse_format(env::var(LOG_FORMAT_ENV).ok().as_deref());
    let span_events = parse_span_events(env::var(LOG_SPAN_EVENTS_ENV).ok().as_deref());

    let mut layers: Vec<BoxedLayer> = vec![fmt_layer(
        format,
        span_events.clone(),
        std::io::stderr,
        true,
    )];
    let guard = log_file.and_then(build_file_writer).map(|(writer, guard)| {
        layers.push(fmt_layer(format, span_events, writer, false));
        guard
    });

    tracing_subscriber::registry()
        .with(layers)
        .with(build_filter(verbose))
        .with(tracing_error::ErrorLayer::default())
        .init();
    guard
}

fn fmt_layer<W>(format: LogFormat, span_events: FmtSpan, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_timer(UtcTime::rfc_3339())
        .with_span_events(span_events)
        .with_ansi(ansi)
        .with_writer(writer);
    match format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

fn build_filter(verbose: bool) -> EnvFilter {
    match env::var(LOG_ENV) {
        Ok(value) => EnvFilter::new(value),
        Err(_) => {
            if verbose {
                EnvFilter::new("debug")
            } else {
                EnvFilter::new("info")
            }
        }
    }
}

fn normalized(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| value.to_ascii_lowercase())
}

fn parse_format(value: Option<&str>) -> LogFormat {
    match normalized(value).as_deref() {
        Some("json") => LogFormat::Json,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::Compact,
    }
}

fn parse_span_events(value: Option<&str>) -> FmtSpan {
    match normalized(value).as_deref() {
        Some("new") => FmtSpan::NEW,
        Some("enter") => FmtSpan::ENTER,
        Some("exit") => FmtSpan::EXIT,
        Some("close") => FmtSpan::CLOSE,
        _ => FmtSpan::NONE,
    }
}

fn build_file_writer(path: &Path) -> Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let file_name = path.file_name()?.to_string_lossy().to_string();
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let appender = tracing_appender::rolling::never(dir, file_name);
    Some(tracing_appender::non_blocking(appender))
}
