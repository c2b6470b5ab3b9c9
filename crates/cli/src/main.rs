//! Bitebox CLI - Talk to a Bitebox backend from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Is the backend up?
//! bitebox health
//!
//! # Sign in as a driver and look at the queue
//! bitebox login -e rider@example.com --role driver
//! bitebox driver queue
//! bitebox driver accept ord_123
//!
//! # Browse
//! bitebox restaurants --search suya
//! bitebox menu rest_42
//! ```
//!
//! # Environment Variables
//!
//! - `BITEBOX_API_BASE_URL` - Gateway base URL
//! - `BITEBOX_DATA_DIR` - Where the session is kept between runs
//! - `BITEBOX_PASSWORD` - Password for `login` when `--password` is omitted
//! - `RUST_LOG` - Log filter (default `bitebox=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use bitebox_client::{AppState, ClientConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Output;
use commands::session::RoleArg;

#[derive(Parser)]
#[command(name = "bitebox")]
#[command(author, version, about = "Bitebox delivery client")]
struct Cli {
    /// Emit logs and command output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the backend is reachable
    Health,
    /// Sign in and keep the session
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Password (falls back to `BITEBOX_PASSWORD`)
        #[arg(short, long)]
        password: Option<String>,

        /// Which app to sign in to
        #[arg(short, long, value_enum, default_value = "customer")]
        role: RoleArg,
    },
    /// Forget the saved session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List restaurants
    Restaurants {
        /// Only show restaurants whose name or cuisine matches
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show a restaurant's menu
    Menu {
        /// Restaurant ID
        restaurant_id: String,
    },
    /// Show your order history
    Orders,
    /// Show your saved addresses
    Addresses,
    /// Driver tools
    Driver {
        #[command(subcommand)]
        action: DriverCommand,
    },
}

#[derive(Subcommand)]
enum DriverCommand {
    /// List orders waiting for a driver
    Queue,
    /// Accept an order from the queue
    Accept {
        /// Order ID
        order_id: String,
    },
    /// Show delivery counters and earnings
    Stats,
    /// Report your current position
    Location {
        /// Latitude in degrees
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.json);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bitebox=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let mut state = AppState::open(config)?;
    let out = Output::new(cli.json);

    match cli.command {
        Commands::Health => commands::catalog::health(&state, out).await?,
        Commands::Login {
            email,
            password,
            role,
        } => commands::session::login(&mut state, out, &email, password, role).await?,
        Commands::Logout => commands::session::logout(&mut state, out),
        Commands::Whoami => commands::session::whoami(&state, out)?,
        Commands::Restaurants { search } => {
            commands::catalog::restaurants(&state, out, search.as_deref()).await?;
        }
        Commands::Menu { restaurant_id } => {
            commands::catalog::menu(&state, out, &restaurant_id).await?;
        }
        Commands::Orders => commands::account::orders(&mut state, out).await?,
        Commands::Addresses => commands::account::addresses(&state, out).await?,
        Commands::Driver { action } => match action {
            DriverCommand::Queue => commands::driver::queue(&state, out).await?,
            DriverCommand::Accept { order_id } => {
                commands::driver::accept(&state, out, &order_id).await?;
            }
            DriverCommand::Stats => commands::driver::stats(&state, out).await?,
            DriverCommand::Location { lat, lng } => {
                commands::driver::location(&state, out, lat, lng).await?;
            }
        },
    }
    Ok(())
}
