pub mod telemetry_api;
