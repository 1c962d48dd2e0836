use opentelemetry::trace::TracerProvider;
use opentelemetry::KeyValue;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::{trace::SdkTracerProvider, Resource};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::AppConfig;

/// Installs the JSON log subscriber, plus an OTLP span exporter when
/// telemetry is enabled. The returned provider must be shut down on exit
/// to flush buffered spans.
pub fn init_tracing(config: &AppConfig) -> anyhow::Result<Option<SdkTracerProvider>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let provider = if config.telemetry_enabled {
        let exporter = SpanExporter::builder()
            .with_tonic()
            .with_endpoint(&config.telemetry_otlp_endpoint)
            .build()?;

        Some(
            SdkTracerProvider::builder()
                .with_batch_exporter(exporter)
                .with_resource(service_resource(
                    &config.telemetry_service_name,
                    &config.telemetry_service_version,
                    &config.telemetry_environment,
                ))
                .build(),
        )
    } else {
        None
    };

    let otel_layer = provider
        .as_ref()
        .map(|p| OpenTelemetryLayer::new(p.tracer(config.telemetry_service_name.clone())));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json())
        .with(otel_layer)
        .init();

    if let Some(provider) = &provider {
        opentelemetry::global::set_tracer_provider(provider.clone());
        tracing::info!(
            service = %config.telemetry_service_name,
            endpoint = %config.telemetry_otlp_endpoint,
            "span export enabled"
        );
    }

    Ok(provider)
}

fn service_resource(name: &str, version: &str, environment: &str) -> Resource {
    Resource::builder_empty()
        .with_attribute(KeyValue::new(SERVICE_NAME, name.to_string()))
        .with_attribute(KeyValue::new(SERVICE_VERSION, version.to_string()))
        .with_attribute(KeyValue::new("deployment.environment.name", environment.to_string()))
        .build()
}

#[cfg(test)]
mod tests {
    use opentelemetry::Key;

    use super::*;

    #[test]
    fn test_service_resource_attributes() {
        let resource = service_resource("locations", "0.1.0", "staging");

        assert_eq!(
            resource.get(&Key::from_static_str(SERVICE_NAME)).map(|v| v.to_string()),
            Some("locations".to_string())
        );
        assert_eq!(
            resource.get(&Key::from_static_str("deployment.environment.name")).map(|v| v.to_string()),
            Some("staging".to_string())
        );
        assert_eq!(resource.len(), 3);
    }
}
