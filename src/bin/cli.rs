//! TallyKV CLI Client
//!
//! Command-line interface for interacting with TallyKV.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tallykv::network::Client;
use tallykv::protocol::Response;
use tallykv::Result;

/// TallyKV CLI
#[derive(Parser, Debug)]
#[command(name = "tallykv-cli")]
#[command(about = "CLI for the TallyKV key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the value stored under a key
    Get {
        username: String,
        table: String,
        key: String,
    },

    /// Store a value under a key
    Set {
        username: String,
        table: String,
        key: String,
        value: String,
    },

    /// Add one to the integer stored under a key
    Incr {
        /// Run the increment inside BEGIN/COMMIT
        #[arg(short, long)]
        transaction: bool,

        username: String,
        table: String,
        key: String,
    },

    /// Send raw request lines and print every response
    Send {
        /// Request lines, e.g. "LOGIN alice" "CREATE accounts"
        #[arg(required = true)]
        requests: Vec<String>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Execute the chosen subcommand; `Ok(false)` means the server refused something
fn run(args: Args) -> Result<bool> {
    let mut client = Client::connect(&args.server)?;

    match args.command {
        Commands::Get {
            username,
            table,
            key,
        } => {
            client.login(&username)?;
            let value = client.get_value(&table, &key)?;
            println!("{}", value);
            client.bye()?;
        }
        Commands::Set {
            username,
            table,
            key,
            value,
        } => {
            client.login(&username)?;
            client.set_value(&table, &key, &value)?;
            client.bye()?;
        }
        Commands::Incr {
            transaction,
            username,
            table,
            key,
        } => {
            client.login(&username)?;
            client.increment(&table, &key, transaction)?;
            client.bye()?;
        }
        Commands::Send { requests } => {
            let mut success = true;
            for request in &requests {
                let response = client.send_line(request)?;
                println!("{}", response);
                match response {
                    Response::Failed(_) => success = false,
                    Response::Error(_) => return Ok(false),
                    _ => {}
                }
            }
            return Ok(success);
        }
    }

    Ok(true)
}
