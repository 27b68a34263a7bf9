//! jxlaunch binary entry point.

use std::io::{self, BufRead, Write};

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jxlaunch::auth::FileCredentialStore;
use jxlaunch::cli::{self, Cli};
use jxlaunch::config::LauncherConfig;
use jxlaunch::error::LauncherError;
use jxlaunch::session::{LaunchOutcome, SessionOrchestrator};

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let interactive = cli.is_interactive() && !cli.status && !cli.logout;

    if let Err(err) = run(cli).await {
        tracing::error!(category = %err.category(), "{err}");
        eprintln!("Error: {err}");
        if interactive {
            wait_for_enter();
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), LauncherError> {
    let payload = cli.intent_payload()?;
    let config = LauncherConfig::load()?;

    if cli.status || cli.logout {
        let store = FileCredentialStore::new(config.config_dir.clone());
        let mut stdout = io::stdout();
        if cli.logout {
            return cli::auth::handle_logout(&store, &mut stdout);
        }
        return cli::auth::handle_status(&store, config.expiry_margin, &mut stdout);
    }

    let orchestrator = SessionOrchestrator::from_config(config);
    let outcome = tokio::select! {
        outcome = orchestrator.run(payload) => outcome?,
        _ = tokio::signal::ctrl_c() => return Err(LauncherError::Interrupted),
    };

    match outcome {
        LaunchOutcome::LoginStarted { authorize_url } => {
            println!("🔗 Continue logging in in your browser.");
            println!("   If it did not open, visit: {authorize_url}");
        }
        LaunchOutcome::NoAccountChosen => println!("No account was chosen"),
        LaunchOutcome::Launched { account } => {
            println!("✅ Launched game as {}", account.display_name)
        }
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(io::stderr)
                .compact(),
        )
        .init();
}

fn wait_for_enter() {
    eprint!("Press Enter to exit...");
    let _ = io::stderr().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}
