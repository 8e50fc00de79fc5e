//! Health check command for monitoring

use crate::context::AppContext;
use crate::utils::health::HealthStatus;

/// Get application health status
///
/// # Example Response
/// ```json
/// {
///   "isHealthy": true,
///   "score": 1.0,
///   "message": null,
///   "components": [
///     { "name": "database", "isHealthy": true, "message": null },
///     { "name": "secret_codec", "isHealthy": true, "message": null }
///   ],
///   "timestamp": 1698765432
/// }
/// ```
pub async fn get_app_health(context: &AppContext) -> HealthStatus {
    context.health_check().await
}
