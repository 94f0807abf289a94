use std::io::BufRead;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use robonomics_interface::chain::account::SEED_ENV_VAR;
use robonomics_interface::config::loader::{finalize, load_config};
use robonomics_interface::events::{SubEvent, Subscriber};
use robonomics_interface::lifecycle::signals::shutdown_on_ctrl_c;
use robonomics_interface::modules::{Datalog, Launch};
use robonomics_interface::observability::logging;
use robonomics_interface::{Account, ClientConfig, RobonomicsError, Service, Shutdown};

#[derive(Parser)]
#[command(name = "robonomics-io")]
#[command(about = "Write datalogs and launches to Robonomics, or follow them", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Node websocket address, e.g. ws://127.0.0.1:9944
    #[arg(long = "remote_ws", global = true)]
    remote_ws: Option<String>,

    /// Account seed in mnemonic or raw 0x form (falls back to ROBONOMICS_SEED)
    #[arg(short = 's', global = true)]
    seed: Option<String>,

    /// Target account ss58 address
    #[arg(short = 'r', global = true)]
    target: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send an extrinsic with a payload read from stdin
    Write {
        #[command(subcommand)]
        what: Record,
    },
    /// Print matching events until interrupted
    Read {
        #[command(subcommand)]
        what: Record,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum Record {
    /// Datalog records
    Datalog,
    /// Launch commands
    Launch,
}

fn load(cli: &Cli) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    if let Some(remote_ws) = &cli.remote_ws {
        config.node.remote_ws = remote_ws.clone();
    }
    Ok(finalize(config)?)
}

fn read_stdin_line() -> Result<String, Box<dyn std::error::Error>> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load(&cli)?;
    logging::init(&config.observability);

    match cli.command {
        Commands::Write { what } => {
            let seed = cli
                .seed
                .clone()
                .or_else(|| std::env::var(SEED_ENV_VAR).ok())
                .ok_or_else(|| RobonomicsError::NoPrivateKey("pass -s <seed> to sign".to_string()))?;
            let account = Account::new(Some(&seed), &config)?;
            let service = Service::new(account.clone(), &config);

            match what {
                Record::Datalog => {
                    let data = read_stdin_line()?;
                    let outcome = Datalog::new(service).record(&data, None).await?;
                    println!("{}", outcome);
                }
                Record::Launch => {
                    let target = cli
                        .target
                        .clone()
                        .ok_or_else(|| RobonomicsError::InvalidAddress("pass -r <target>".to_string()))?;
                    let parameter = read_stdin_line()?;
                    let outcome = Launch::new(service).launch(&target, &parameter, None).await?;
                    println!(
                        "({}, \"{} -> {}: {}\")",
                        outcome,
                        account.get_address()?,
                        target,
                        parameter
                    );
                }
            }
        }
        Commands::Read { what } => {
            let kind = match what {
                Record::Datalog => SubEvent::NewRecord,
                Record::Launch => SubEvent::NewLaunch,
            };
            let targets: Vec<String> = cli.target.iter().cloned().collect();
            let service = Service::new(Account::read_only(&config), &config);

            let shutdown = Shutdown::new();
            let subscriber = Subscriber::new(service, vec![kind], &targets, config.subscriber.clone())?;
            let (mut events, handle) = subscriber.spawn(shutdown.subscribe());
            tokio::spawn(shutdown_on_ctrl_c(shutdown));

            while let Some(event) = events.recv().await {
                println!(
                    "{} {}",
                    event.event_id(),
                    event.render_attributes(config.node.ss58_prefix).join(" ")
                );
            }
            handle.await?;
        }
    }

    Ok(())
}
