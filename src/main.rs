use clap::Parser;
use nokvault::cli::{commands, output, Cli, Commands};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "NOKVAULT_LOG";

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Encrypt {
            ref path,
            ref output,
            compress,
            no_compress,
            dry_run,
        } => commands::encrypt::execute(
            &cli,
            path,
            output.as_deref(),
            compress,
            no_compress,
            dry_run,
        ),
        Commands::Decrypt {
            ref path,
            ref output,
            dry_run,
        } => commands::decrypt::execute(&cli, path, output.as_deref(), dry_run),
        Commands::RotateKey {
            ref path,
            ref new_password,
            ref new_keyfile,
        } => commands::rotate::execute(
            &cli,
            path,
            new_password.as_deref(),
            new_keyfile.as_deref(),
        ),
        Commands::SecureDelete {
            ref path,
            passes,
            force,
        } => commands::shred::execute(&cli, path, passes, force),
        Commands::Info { ref path } => commands::info::execute(path),
        Commands::KeyfileGenerate { ref path } => commands::keyfile::execute(path),
        Commands::Config {
            show: _,
            init,
            ref get,
        } => commands::config::execute(init, get.as_deref()),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        if let Some(hint) = e.hint() {
            output::tip(hint);
        }
        std::process::exit(1);
    }
}
