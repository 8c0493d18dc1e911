mod client;

pub use client::TelemetryApiClient;
