use crate::cli::{Cli, Command};
use crate::commands;
use crate::context::AppContext;
use crate::error::AppResult;

pub async fn run(cli: Cli) -> AppResult<()> {
    let ctx = AppContext::bootstrap(&cli)?;

    match cli.command {
        Command::Listall => commands::listall::run(&ctx).await,
        Command::List(args) => commands::list::run(&ctx, args).await,
        Command::ListMemberships(args) => commands::memberships::run(&ctx, args).await,
        Command::Add(args) => commands::add::run(&ctx, args).await,
        Command::Delete(args) => commands::delete::run(&ctx, args).await,
        Command::Auth(args) => commands::auth::run(&ctx, args.command).await,
    }
}
