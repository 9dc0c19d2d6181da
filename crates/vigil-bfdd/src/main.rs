//! bfdd - BFD configuration loader for the vigil failover suite
//!
//! Entry point for the bfdd daemon. Loads the shared configuration file
//! with the keyword set of the requested role and reports what was built.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use vigil_bfdd::{load_config_path, EnabledRoles, Role};

#[derive(Debug, Parser)]
#[command(name = "bfdd", about = "BFD configuration loader for vigil")]
struct Args {
    /// Configuration file to load.
    config: PathBuf,

    /// Role to parse the configuration as.
    #[arg(long, default_value = "bfd")]
    role: Role,

    /// Run without the redundancy daemon integration.
    #[arg(long)]
    no_vrrp: bool,

    /// Run without the health-checker daemon integration.
    #[arg(long)]
    no_checker: bool,

    /// Dump the parsed configuration as JSON.
    #[arg(long)]
    dump: bool,
}

/// Initializes tracing/logging subsystem
fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn run(args: &Args) -> anyhow::Result<()> {
    info!("--- Starting bfdd ({} role) ---", args.role);

    let enabled = EnabledRoles {
        vrrp: !args.no_vrrp,
        checker: !args.no_checker,
    };

    let ctx = load_config_path(&args.config, args.role, enabled)
        .with_context(|| format!("loading {}", args.config.display()))?;

    match args.role {
        Role::Bfd | Role::Parent => {
            info!("{} BFD instance(s) configured", ctx.bfd.instances.len());
        }
        Role::Vrrp => {
            info!(
                "{} BFD instance(s) tracked by the redundancy role",
                ctx.vrrp.tracked_bfds.len()
            );
        }
        Role::Checker => {
            info!(
                "{} BFD instance(s) tracked by the checker role",
                ctx.checker.tracked_bfds.len()
            );
        }
    }

    if args.dump {
        let dump = serde_json::json!({
            "instances": ctx.bfd.instances,
            "vrrp_tracked_bfds": ctx.vrrp.tracked_bfds,
            "checker_tracked_bfds": ctx.checker.tracked_bfds,
        });
        println!("{}", serde_json::to_string_pretty(&dump)?);
    }

    Ok(())
}

fn main() -> ExitCode {
    init_logging();

    let args = Args::parse();
    if let Err(err) = run(&args) {
        error!("{:#}", err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
