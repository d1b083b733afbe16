use crate::api::models::DeleteReport;
use crate::cli::MutateArgs;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::output::OutputMode;

use super::snapshot_lines;

pub async fn run(ctx: &AppContext, args: MutateArgs) -> AppResult<()> {
    let access_token = ctx.access_token().await?;
    let report = ctx
        .directory
        .remove_alias_member(&access_token, &args.alias, &args.destination)
        .await?;

    if ctx.output.mode() == OutputMode::Text {
        print_text(&report);
        return Ok(());
    }

    ctx.output.emit(&summary(&report), &report)
}

fn print_text(report: &DeleteReport) {
    match report {
        DeleteReport::UnknownAlias { alias } => {
            println!("invalid alias {alias}");
        }
        DeleteReport::NotAMember {
            alias,
            address,
            members,
        } => {
            let banner = "*".repeat(70);
            println!("{banner}");
            println!("* {address} is not in {alias}");
            println!("{banner}");
            println!("current members:");
            for line in snapshot_lines(alias, members) {
                println!("{line}");
            }
        }
        DeleteReport::Removed {
            alias,
            address,
            members,
            alias_deleted,
        } => {
            println!("deleted {address} from {alias}");
            if *alias_deleted {
                println!("alias empty, removing alias");
            } else {
                println!("current members:");
                for line in snapshot_lines(alias, members) {
                    println!("{line}");
                }
            }
        }
    }
}

fn summary(report: &DeleteReport) -> String {
    match report {
        DeleteReport::UnknownAlias { alias } => format!("invalid alias {alias}"),
        DeleteReport::NotAMember { alias, address, .. } => {
            format!("{address} is not in {alias}")
        }
        DeleteReport::Removed {
            alias,
            address,
            alias_deleted,
            ..
        } => {
            if *alias_deleted {
                format!("deleted {address} from {alias}; alias removed")
            } else {
                format!("deleted {address} from {alias}")
            }
        }
    }
}
