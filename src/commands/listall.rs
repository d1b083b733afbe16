use crate::context::AppContext;
use crate::error::AppResult;
use crate::output::OutputMode;

use super::snapshot_lines;

pub async fn run(ctx: &AppContext) -> AppResult<()> {
    let domain = ctx.require_domain()?;
    let access_token = ctx.access_token().await?;
    let groups = ctx
        .directory
        .list_groups_with_members(&access_token, &domain)
        .await?;

    if ctx.output.mode() == OutputMode::Text {
        for entry in &groups {
            for line in snapshot_lines(&entry.group.email, &entry.members) {
                println!("{line}");
            }
        }
        return Ok(());
    }

    let text = format!("{} aliases", groups.len());
    ctx.output.emit(&text, &groups)
}
