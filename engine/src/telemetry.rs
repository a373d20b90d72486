//! Telemetry and Observability
//!
//! Every collaboration runs inside a `collaboration` span carrying its
//! `run_id`, so each log line can be traced back to the run that produced it.
//! The subscriber installed here keeps that span visible on every event and
//! logs when a run's span closes, which records how long the run took.
//!
//! Debug builds write compact text; release builds write one JSON object per line.

use tracing::Subscriber;
use tracing_subscriber::fmt::{self, format::FmtSpan, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Filter used when `RUST_LOG` is unset: dependencies stay at `warn`, the
/// engine and binary log at `log_level`
pub fn filter_directives(log_level: &str) -> String {
    format!("warn,roundtable_engine={0},roundtable={0}", log_level)
}

/// Human-readable layer; each line names the `collaboration` span and ends with its `run_id`
pub fn text_layer<S, W>(writer: W, ansi: bool) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .compact()
        .with_target(false)
        .with_ansi(ansi)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(writer)
}

/// JSON layer; the current span (with `run_id`) is nested under `"span"`
pub fn json_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(writer)
}

/// Install the global subscriber, writing to stderr so stdout carries only
/// the transcript.
///
/// Priority: `RUST_LOG` env var > `log_level` parameter.
/// Only the first successful call installs a subscriber; later calls are no-ops.
pub fn init_telemetry_with_level(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(log_level)));

    #[cfg(debug_assertions)]
    use std::io::{self, IsTerminal};

    #[cfg(debug_assertions)]
    let output = text_layer(std::io::stderr, io::stderr().is_terminal());

    #[cfg(not(debug_assertions))]
    let output = json_layer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(output)
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use tracing::{info, info_span};

    /// Collects everything a layer writes
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn log_one_turn() {
        let span = info_span!("collaboration", run_id = "run-42");
        let _entered = span.enter();
        info!(turn = 1, participant = "BusinessAnalyst", "Turn recorded");
    }

    #[test]
    fn test_filter_keeps_dependencies_quiet() {
        assert_eq!(
            filter_directives("debug"),
            "warn,roundtable_engine=debug,roundtable=debug"
        );
        assert!(EnvFilter::try_new(filter_directives("trace")).is_ok());
    }

    #[test]
    fn test_text_lines_carry_run_id() {
        let captured = Captured::default();
        let writer = {
            let captured = captured.clone();
            move || captured.clone()
        };
        let subscriber = tracing_subscriber::registry().with(text_layer(writer, false));

        tracing::subscriber::with_default(subscriber, log_one_turn);

        let output = captured.text();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2, "one event and one span close: {}", output);
        assert!(lines[0].contains("collaboration"));
        assert!(lines[0].contains("run_id=\"run-42\"") || lines[0].contains("run_id=run-42"));
        assert!(lines[0].contains("Turn recorded"));
        assert!(lines[1].contains("close"));
    }

    #[test]
    fn test_json_lines_nest_current_span() {
        let captured = Captured::default();
        let writer = {
            let captured = captured.clone();
            move || captured.clone()
        };
        let subscriber = tracing_subscriber::registry().with(json_layer(writer));

        tracing::subscriber::with_default(subscriber, log_one_turn);

        let output = captured.text();
        let event: serde_json::Value =
            serde_json::from_str(output.lines().next().unwrap()).unwrap();
        assert_eq!(event["fields"]["message"], "Turn recorded");
        assert_eq!(event["fields"]["turn"], 1);
        assert_eq!(event["span"]["name"], "collaboration");
        assert_eq!(event["span"]["run_id"], "run-42");
        assert!(event.get("spans").is_none());
    }

    #[test]
    fn test_repeated_init_is_harmless() {
        init_telemetry_with_level("debug");
        init_telemetry_with_level("info");
        tracing::info!("telemetry initialized twice");
    }
}
