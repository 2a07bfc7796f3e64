use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use sshproxy_manager::client::{ClientError, ManagerClient};

#[derive(Parser)]
#[command(name = "sshproxyctl")]
#[command(about = "Management CLI for sshproxy-managerd", long_about = None)]
struct Cli {
    /// Daemon control address.
    #[arg(short, long, default_value = "127.0.0.1:55555")]
    addr: String,

    /// Seconds to wait for a reply.
    #[arg(short, long, default_value_t = 10)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the backend for a new session
    Connect { user: String, host: String },
    /// Report that a session ended
    Disconnect { user: String, host: String },
    /// Exclude a backend from routing
    Disable { host: String },
    /// Re-admit a disabled backend (probes it immediately)
    Enable { host: String },
    /// Report a suspected backend failure
    Failure { host: String },
    /// Show tracked sessions or host checks
    Show {
        #[arg(value_enum)]
        what: ShowTarget,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ShowTarget {
    Connections,
    Checks,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let client = ManagerClient::new(cli.addr).with_timeout(Duration::from_secs(cli.timeout));

    let result = match &cli.command {
        Commands::Connect { user, host } => client.connect(user, host).await,
        Commands::Disconnect { user, host } => client.disconnect(user, host).await,
        Commands::Disable { host } => client.disable(host).await,
        Commands::Enable { host } => client.enable(host).await,
        Commands::Failure { host } => client.failure(host).await,
        Commands::Show { what } => {
            let category = match what {
                ShowTarget::Connections => "connections",
                ShowTarget::Checks => "checks",
            };
            client.info(category).await
        }
    };

    match result {
        Ok(payload) => {
            if !payload.is_empty() {
                println!("{}", payload);
            }
            ExitCode::SUCCESS
        }
        Err(ClientError::Server(message)) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: cannot talk to daemon: {}", e);
            ExitCode::from(2)
        }
    }
}
