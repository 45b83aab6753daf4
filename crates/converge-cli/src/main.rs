mod args;
mod commands;

use args::{Target, WaitArgs};
use clap::{Parser, Subcommand};
use converge::LifecycleState;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "converge")]
#[command(about = "Wait for cloud resources to reach a lifecycle state", long_about = None)]
struct Cli {
    /// Verbose logging (debug level unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Sakura Cloud zone
    #[arg(long, global = true, env = "CONVERGE_ZONE", default_value = "is1a")]
    zone: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a native status through the built-in tables
    Translate {
        /// Provider name (e.g. openstack-nova, cloudstack)
        provider: String,
        /// Resource kind (server, load-balancer, volume, disk, vapp, task)
        kind: String,
        /// Native status as reported by the provider
        status: String,
    },
    /// List built-in status tables
    Tables {
        /// Only show tables of this provider
        #[arg(short, long)]
        provider: Option<String>,
    },
    /// List wait profiles from the config file
    Profiles,
    /// Wait until a Sakura Cloud resource reaches a state
    Wait {
        target: Target,
        id: String,
        /// Desired state
        #[arg(long, default_value = "active")]
        state: LifecycleState,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Wait until a Sakura Cloud resource is gone
    #[command(name = "wait-deleted")]
    WaitDeleted {
        target: Target,
        id: String,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Power on a server
    #[command(name = "power-on")]
    PowerOn {
        id: String,
        /// Wait until the server is up
        #[arg(long)]
        wait: bool,
        #[command(flatten)]
        wait_args: WaitArgs,
    },
    /// Shut down a server
    Shutdown {
        id: String,
        /// Pull the plug instead of an ACPI shutdown
        #[arg(short, long)]
        force: bool,
        /// Wait until the server is down
        #[arg(long)]
        wait: bool,
        #[command(flatten)]
        wait_args: WaitArgs,
    },
    /// Delete a server or disk
    Delete {
        target: Target,
        id: String,
        /// Delete attached disks too (servers only)
        #[arg(long)]
        with_disks: bool,
        /// Wait until the resource is gone
        #[arg(long)]
        wait: bool,
        #[command(flatten)]
        wait_args: WaitArgs,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Translate {
            provider,
            kind,
            status,
        } => commands::translate::handle(&provider, &kind, &status)?,
        Commands::Tables { provider } => commands::translate::handle_tables(provider.as_deref()),
        Commands::Profiles => commands::profiles::handle()?,
        Commands::Wait {
            target,
            id,
            state,
            wait,
        } => commands::wait::handle(&cli.zone, target, &id, state, &wait).await?,
        Commands::WaitDeleted { target, id, wait } => {
            commands::wait::handle_deleted(&cli.zone, target, &id, &wait).await?
        }
        Commands::PowerOn {
            id,
            wait,
            wait_args,
        } => commands::power::handle_power_on(&cli.zone, &id, wait, &wait_args).await?,
        Commands::Shutdown {
            id,
            force,
            wait,
            wait_args,
        } => commands::power::handle_shutdown(&cli.zone, &id, force, wait, &wait_args).await?,
        Commands::Delete {
            target,
            id,
            with_disks,
            wait,
            wait_args,
        } => {
            commands::power::handle_delete(&cli.zone, target, &id, with_disks, wait, &wait_args)
                .await?
        }
        Commands::Version => {
            println!("converge {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
