//! Logging and tracing setup
//!
//! Installs a `tracing` subscriber with an `EnvFilter` and a pretty or JSON
//! formatter on stderr. When an OTLP endpoint is configured, spans are also
//! exported over OTLP/HTTP.
//!
//! Stage spans use dot-notation field names so they map directly onto
//! OpenTelemetry attributes:
//!
//! ```text
//! packwise.plan                (root, one per request)
//!   └─ packwise.stage          (one per model call)
//! ```

use anyhow::{Context, Result};
use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_semantic_conventions::resource::SERVICE_VERSION;
use tracing::Span;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;
use crate::error::Stage;

const SERVICE_NAME: &str = "packwise";

/// Root span for one packing plan run.
pub const SPAN_PLAN: &str = "packwise.plan";
/// One stage of the pipeline.
pub const SPAN_STAGE: &str = "packwise.stage";

pub const FIELD_SUCCESS: &str = "packwise.success";
pub const FIELD_DURATION_MS: &str = "packwise.duration_ms";
pub const FIELD_TOOL_CALLS: &str = "packwise.tool_calls";
pub const FIELD_RESOLUTION: &str = "packwise.resolution";

/// Keeps the OTLP pipeline alive; flushes pending spans on drop
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("Failed to flush traces: {e}");
            }
        }
    }
}

fn tracer_provider(endpoint: &str) -> Result<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .with_context(|| format!("Failed to build OTLP exporter for {endpoint}"))?;

    let resource = Resource::builder()
        .with_service_name(SERVICE_NAME)
        .with_attribute(KeyValue::new(SERVICE_VERSION, crate::VERSION))
        .build();

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build())
}

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over `config.level`; `verbose` forces debug.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<TelemetryGuard> {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let provider = config
        .otlp_endpoint
        .as_deref()
        .map(tracer_provider)
        .transpose()?;
    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer(SERVICE_NAME)));

    let registry = tracing_subscriber::registry().with(filter).with(otel_layer);
    let installed = if config.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    installed.context("Failed to install tracing subscriber")?;

    Ok(TelemetryGuard { provider })
}

/// Create the root span for a plan run.
///
/// Filled later via [`record_plan_result`]: success, resolution, duration.
pub fn plan_span(days: u32) -> Span {
    tracing::info_span!(
        SPAN_PLAN,
        "packwise.days" = days,
        "packwise.success" = tracing::field::Empty,
        "packwise.resolution" = tracing::field::Empty,
        "packwise.duration_ms" = tracing::field::Empty,
    )
}

pub fn record_plan_result(span: &Span, success: bool, resolution: Option<&str>, duration_ms: u64) {
    span.record(FIELD_SUCCESS, success);
    if let Some(resolution) = resolution {
        span.record(FIELD_RESOLUTION, resolution);
    }
    span.record(FIELD_DURATION_MS, duration_ms);
}

/// Create a span for one stage's model call.
///
/// Filled later via [`record_stage_result`]: success, tool calls, duration.
pub fn stage_span(stage: Stage) -> Span {
    tracing::info_span!(
        SPAN_STAGE,
        "packwise.stage.name" = stage.as_str(),
        "packwise.success" = tracing::field::Empty,
        "packwise.tool_calls" = tracing::field::Empty,
        "packwise.duration_ms" = tracing::field::Empty,
    )
}

pub fn record_stage_result(span: &Span, success: bool, tool_calls: usize, duration_ms: u64) {
    span.record(FIELD_SUCCESS, success);
    span.record(FIELD_TOOL_CALLS, tool_calls as u64);
    span.record(FIELD_DURATION_MS, duration_ms);
}
