//! Command execution helpers
//!
//! Removes the timing and logging boilerplate from every command.

use std::future::Future;
use std::time::Instant;

use hearth_domain::Result as DomainResult;

use crate::utils::logging::log_command_execution;

/// Execute a command, timing it and logging the outcome.
///
/// # Example
///
/// ```rust,ignore
/// pub async fn list_calendar_accounts(
///     ctx: &AppContext,
///     user_id: &str,
/// ) -> Result<Vec<CalendarAccount>> {
///     execute_command("calendar::list_accounts", || async {
///         ctx.calendar.list_accounts(user_id).await
///     })
///     .await
/// }
/// ```
pub async fn execute_command<F, Fut, T>(command_name: &str, command_fn: F) -> DomainResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    let start = Instant::now();
    let result = command_fn().await;
    log_command_execution(command_name, start.elapsed(), result.as_ref().err());
    result
}

/// Same as [`execute_command`] but flattens the error into its serialized
/// `{type, message}` JSON form for callers that speak JSON.
pub async fn execute_with_json_error<F, Fut, T>(
    command_name: &str,
    command_fn: F,
) -> Result<T, serde_json::Value>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    execute_command(command_name, command_fn).await.map_err(|err| {
        serde_json::to_value(&err)
            .unwrap_or_else(|_| serde_json::json!({"type": err.label(), "message": err.to_string()}))
    })
}
