use crate::cli::MutateArgs;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::output::OutputMode;

use super::snapshot_lines;

pub async fn run(ctx: &AppContext, args: MutateArgs) -> AppResult<()> {
    let access_token = ctx.access_token().await?;
    let report = ctx
        .directory
        .ensure_alias_member(&access_token, &args.alias, &args.destination)
        .await?;

    if ctx.output.mode() == OutputMode::Text {
        if report.created_alias {
            println!("new alias {}", report.alias);
        }
        if report.already_member {
            println!("{} is already in {}", report.address, report.alias);
        } else {
            println!("added {} to {}", report.address, report.alias);
        }

        println!("current members:");
        for line in snapshot_lines(&report.alias, &report.members) {
            println!("{line}");
        }
        return Ok(());
    }

    let text = format!("added {} to {}", report.address, report.alias);
    ctx.output.emit(&text, &report)
}
