use crate::error::ApiError;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use std::time::Duration;

/// Request counters exported through the global meter provider.
///
/// Without an OTLP collector the global provider is a no-op, so recording is
/// always safe.
pub struct RequestMetrics {
    requests: Counter<u64>,
    errors: Counter<u64>,
    duration: Histogram<f64>,
}

impl RequestMetrics {
    pub fn new(meter_name: &'static str) -> Self {
        let meter = global::meter(meter_name);
        let latency_buckets = [
            0.005, 0.01, 0.02, 0.03, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 0.75, 1.0, 2.0, 5.0,
        ];

        let duration = meter
            .f64_histogram("classify_duration_seconds")
            .with_description("Time to classify one image (decode + infer + postprocess)")
            .with_unit("s")
            .with_boundaries(latency_buckets.to_vec())
            .build();
        let requests = meter
            .u64_counter("classify_requests_total")
            .with_description("Total classification requests")
            .build();
        let errors = meter
            .u64_counter("classify_errors_total")
            .with_description("Classification requests that ended in an error, by code")
            .build();

        Self {
            requests,
            errors,
            duration,
        }
    }

    pub fn record<T>(&self, result: &Result<T, ApiError>, elapsed: Duration) {
        let status = match result {
            Ok(_) => 200,
            Err(e) => e.status().as_u16(),
        };
        let attrs = [KeyValue::new("status", status as i64)];

        self.requests.add(1, &attrs);
        self.duration.record(elapsed.as_secs_f64(), &attrs);

        if let Err(e) = result {
            self.errors.add(1, &[KeyValue::new("code", e.code())]);
        }
    }
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self::new("gateway")
    }
}
