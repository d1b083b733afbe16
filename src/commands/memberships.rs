use crate::cli::ListMembershipsArgs;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::output::OutputMode;

pub async fn run(ctx: &AppContext, args: ListMembershipsArgs) -> AppResult<()> {
    let domain = ctx.require_domain()?;
    let access_token = ctx.access_token().await?;
    let memberships = ctx
        .directory
        .list_memberships(&access_token, &domain, &args.addresses)
        .await?;

    if ctx.output.mode() == OutputMode::Text {
        for membership in &memberships {
            println!("{}:", membership.address);
            for group in &membership.groups {
                println!("  {group}");
            }
            println!();
        }
        return Ok(());
    }

    let text = format!("{} addresses", memberships.len());
    ctx.output.emit(&text, &memberships)
}
