use clap::Parser;
use vaultsync::cli::commands;
use vaultsync::cli::{Cli, Commands, Context};

fn main() {
    let cli = Cli::parse();
    vaultsync::logging::init_logging(cli.verbose);

    let result = Context::from_cli(&cli).and_then(|ctx| run(&cli, &ctx));

    if let Err(e) = result {
        vaultsync::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}

fn run(cli: &Cli, ctx: &Context) -> vaultsync::errors::Result<()> {
    match cli.command {
        Commands::Subscriptions => commands::subscriptions::execute(ctx),
        Commands::Vaults { ref subscription } => {
            commands::vaults::execute(ctx, subscription.as_deref())
        }
        Commands::Compare {
            filter,
            show_values,
            show_metadata,
        } => commands::compare::execute(ctx, filter, show_values, show_metadata),
        Commands::Sync {
            ref name,
            dry_run,
            apply,
        } => commands::sync::execute(ctx, name, dry_run, apply),
        Commands::SyncAll {
            dry_run,
            apply,
            yes,
        } => commands::sync_all::execute(ctx, dry_run, apply, yes),
        Commands::Edit {
            ref name,
            ref value,
            dry_run,
        } => commands::edit::execute(ctx, name, value.as_deref(), dry_run),
        Commands::Export {
            ref vault,
            ref output,
        } => commands::export::execute(ctx, vault.as_deref(), output.as_deref()),
        Commands::Import { ref file } => commands::import_cmd::execute(ctx, file),
        Commands::Audit { last, ref since } => {
            commands::audit_cmd::execute(ctx, last, since.as_deref())
        }
        Commands::Completions { ref shell } => commands::completions::execute(shell),
    }
}
