use crate::api::models::GroupWithMembers;
use crate::cli::ListArgs;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::output::OutputMode;

use super::snapshot_lines;

pub async fn run(ctx: &AppContext, args: ListArgs) -> AppResult<()> {
    let access_token = ctx.access_token().await?;

    // unknown aliases propagate the not-found error with its reason code
    let group = ctx.directory.get_group(&access_token, &args.alias).await?;
    let members = ctx.directory.list_members(&access_token, &group.email).await?;

    if ctx.output.mode() == OutputMode::Text {
        for line in snapshot_lines(&group.email, &members) {
            println!("{line}");
        }
        return Ok(());
    }

    let text = format!("{}: {} members", group.email, members.len());
    ctx.output.emit(&text, &GroupWithMembers { group, members })
}
