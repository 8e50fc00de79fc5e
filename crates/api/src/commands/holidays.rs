//! Holiday commands

use chrono::{Datelike, Utc};
use hearth_domain::{Holiday, Result};

use super::required;
use crate::utils::command_helpers::execute_command;
use crate::AppContext;

/// Fetch and store the user's country holidays for `year` (default: current
/// UTC year), mirroring them into the calendar.
pub async fn sync_holidays(
    ctx: &AppContext,
    user_id: &str,
    year: Option<i32>,
) -> Result<Vec<Holiday>> {
    execute_command("holidays::sync_holidays", || async {
        let user_id = required("userId", user_id)?;
        let year = year.unwrap_or_else(|| Utc::now().year());
        ctx.holidays.sync_holidays_for_user(user_id, year).await
    })
    .await
}
