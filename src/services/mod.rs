pub mod exporter;
pub mod health_monitor;

pub use exporter::AnalysisReport;
pub use health_monitor::{EndpointStatus, HealthMonitor};
