//! Reminder commands

use chrono::Utc;
use hearth_core::DispatchSummary;
use hearth_domain::Result;
use hearth_infra::OutboxEntry;

use crate::utils::command_helpers::execute_command;
use crate::AppContext;

/// Queue notifications for every reminder due now.
pub async fn dispatch_due_reminders(ctx: &AppContext) -> Result<DispatchSummary> {
    execute_command("reminders::dispatch_due_reminders", || async {
        ctx.reminders.dispatch_due(Utc::now()).await
    })
    .await
}

/// Oldest queued notifications, at most `limit`.
pub async fn pending_notifications(ctx: &AppContext, limit: usize) -> Result<Vec<OutboxEntry>> {
    execute_command("reminders::pending_notifications", || async {
        ctx.outbox.pending(limit).await
    })
    .await
}
