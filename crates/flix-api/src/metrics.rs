//! Prometheus metrics served on `/metrics`.
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub builds: IntCounterVec,
    pub build_seconds: HistogramVec,
    pub verifications: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let builds = IntCounterVec::new(
            Opts::new("flix_builds_total", "Template builds by outcome"),
            &["outcome"],
        )?;
        let build_seconds = HistogramVec::new(
            HistogramOpts::new("flix_build_duration_seconds", "Template build latency"),
            &["format"],
        )?;
        let verifications = IntCounterVec::new(
            Opts::new("flix_verifications_total", "Template verifications by result"),
            &["result"],
        )?;
        registry.register(Box::new(builds.clone()))?;
        registry.register(Box::new(build_seconds.clone()))?;
        registry.register(Box::new(verifications.clone()))?;

        Ok(Self {
            registry,
            builds,
            build_seconds,
            verifications,
        })
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
