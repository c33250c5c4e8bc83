use crate::dto::HealthRes;

/// Service name reported by health and info endpoints.
pub const SERVICE_NAME: &str = "Medical Prescription Firewall";

/// Simple health service shared by the adapters.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Static health check; the firewall has no external dependencies to check.
    pub fn check_health() -> HealthRes {
        HealthRes {
            status: "healthy".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            service: SERVICE_NAME.into(),
        }
    }
}
