use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "galias", version, about = "Google Workspace group alias manager")]
pub struct Cli {
    #[arg(short = 'u', long, global = true, help = "Workspace admin username")]
    pub username: Option<String>,
    #[arg(
        short = 'p',
        long,
        global = true,
        help = "Workspace admin password (config-file compatibility; auth is oauth)"
    )]
    pub password: Option<String>,
    #[arg(short = 'd', long, global = true, help = "Workspace domain to operate on")]
    pub domain: Option<String>,
    #[arg(
        long,
        global = true,
        default_value = "default",
        help = "Profile name to use"
    )]
    pub profile: String,
    #[arg(long, global = true, help = "Emit JSON output")]
    pub json: bool,
    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Verbose logging")]
    pub verbose: u8,
    #[arg(
        long,
        global = true,
        help = "Do not run a local callback server during login"
    )]
    pub no_local_server: bool,
    #[arg(long, global = true, help = "Host for the oauth callback server")]
    pub auth_host: Option<String>,
    #[arg(long, global = true, help = "Port for the oauth callback server")]
    pub auth_port: Option<u16>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "List every alias in the domain with its members")]
    Listall,
    #[command(about = "List the members of one alias")]
    List(ListArgs),
    #[command(
        name = "list_memberships",
        visible_alias = "list-memberships",
        about = "List the aliases each address belongs to"
    )]
    ListMemberships(ListMembershipsArgs),
    #[command(about = "Add a destination address to an alias, creating it if needed")]
    Add(MutateArgs),
    #[command(about = "Remove a destination address from an alias")]
    Delete(MutateArgs),
    #[command(about = "Manage oauth credentials")]
    Auth(AuthArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(help = "Alias email address")]
    pub alias: String,
}

#[derive(Debug, Args)]
pub struct ListMembershipsArgs {
    #[arg(help = "Addresses to inspect; every domain user when omitted")]
    pub addresses: Vec<String>,
}

#[derive(Debug, Args)]
pub struct MutateArgs {
    #[arg(help = "Alias email address")]
    pub alias: String,
    #[arg(help = "Destination address")]
    pub destination: String,
}

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    Login,
    Status,
    Logout,
}
