//! unitsyncctl - CLI for unitsyncd
//!
//! Communicates with the daemon over /run/unitsync.sock.
//! Use --user to communicate with the user daemon.

use clap::{Parser, Subcommand};
use peercred_ipc::Client;
use unitsync::config::canonical_name;
use unitsync::protocol::{socket_path, Request, Response, UnitInfo};
use unitsync::Mode;

#[derive(Parser)]
#[command(name = "unitsyncctl")]
#[command(about = "Control the unitsync daemon")]
struct Args {
    /// Connect to the user daemon instead of the system one
    #[arg(long, global = true)]
    user: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List tracked units
    List,

    /// Show a tracked unit
    Status {
        /// Unit name (e.g., "nginx" or "nginx.service")
        name: String,
    },

    /// Start a unit
    Start {
        name: String,
        /// How to resolve conflicts with queued jobs
        #[arg(long, value_enum)]
        mode: Option<Mode>,
    },

    /// Stop a unit
    Stop {
        name: String,
        #[arg(long, value_enum)]
        mode: Option<Mode>,
    },

    /// Restart a unit
    Restart {
        name: String,
        #[arg(long, value_enum)]
        mode: Option<Mode>,
    },

    /// Enable a unit to start at boot
    Enable { name: String },

    /// Disable a unit from starting at boot
    Disable { name: String },

    /// Switch a unit on (start, holding "wait-on" until it runs)
    On { name: String },

    /// Switch a unit off (stop, holding "wait-off" until it stops)
    Off { name: String },

    /// Check if a unit is enabled
    IsEnabled { name: String },

    /// Run a reconciliation pass now
    Refresh,

    /// Ping the daemon
    Ping,
}

impl Command {
    fn into_request(self) -> Request {
        match self {
            Command::List => Request::List,
            Command::Refresh => Request::Refresh,
            Command::Ping => Request::Ping,
            Command::Status { name } => Request::Status { name: canonical_name(&name) },
            Command::Start { name, mode } => Request::Start {
                name: canonical_name(&name),
                mode,
            },
            Command::Stop { name, mode } => Request::Stop {
                name: canonical_name(&name),
                mode,
            },
            Command::Restart { name, mode } => Request::Restart {
                name: canonical_name(&name),
                mode,
            },
            Command::Enable { name } => Request::Enable { name: canonical_name(&name) },
            Command::Disable { name } => Request::Disable { name: canonical_name(&name) },
            Command::On { name } => Request::TurnOn { name: canonical_name(&name) },
            Command::Off { name } => Request::TurnOff { name: canonical_name(&name) },
            Command::IsEnabled { name } => Request::IsEnabled { name: canonical_name(&name) },
        }
    }
}

fn main() {
    let args = Args::parse();
    let sock_path = socket_path(args.user);
    let request = args.command.into_request();

    let response = match Client::call(&sock_path, &request) {
        Ok(response) => response,
        Err(e) => {
            let message = e.to_string();
            if message.contains("connect") || message.contains("No such file") {
                let hint = if args.user { "unitsyncd --user" } else { "sudo unitsyncd" };
                eprintln!("unitsyncctl: no daemon listening on {}", sock_path);
                eprintln!("  run `{}` first", hint);
            } else {
                eprintln!("unitsyncctl: {}", message);
            }
            std::process::exit(1);
        }
    };
    print_response(response);
}

fn print_unit(unit: &UnitInfo) {
    let marker = match (unit.available, unit.is_on) {
        (false, _) => "?",
        (true, true) => "●",
        (true, false) => "○",
    };
    println!("{} {}", marker, unit.name);
    println!("        State: {}", unit.state);
    println!("    Available: {}", if unit.available { "yes" } else { "no" });
    if let Some(unit_type) = &unit.unit_type {
        println!("         Type: {}", unit_type);
    }
    if let Some(code) = unit.exit_code {
        println!("    Exit code: {}", code);
    }
    if let Some(at) = &unit.last_activity {
        println!("Last activity: {} UTC", at);
    }
    if let Some(triggers) = unit.triggered_by.as_deref().filter(|t| !t.is_empty()) {
        println!(" Triggered by: {}", triggers);
    }
}

fn print_response(response: Response) {
    match response {
        Response::Ok => {} // Silent success
        Response::Skipped => {
            eprintln!("unit is not tracked, nothing to do");
        }
        Response::Pong => println!("pong"),
        Response::Busy => println!("refresh already in progress"),
        Response::Error(msg) => {
            eprintln!("error: {}", msg);
            std::process::exit(1);
        }
        Response::Units(units) => {
            if units.is_empty() {
                println!("No units tracked");
                return;
            }
            println!("{:<40} {:>10} {:>6} {:>10}", "UNIT", "STATE", "ON", "AVAILABLE");
            for unit in units {
                println!(
                    "{:<40} {:>10} {:>6} {:>10}",
                    unit.name,
                    unit.state,
                    if unit.is_on { "yes" } else { "no" },
                    if unit.available { "yes" } else { "no" }
                );
            }
        }
        Response::Status(unit) => print_unit(&unit),
        Response::EnabledState(state) => {
            println!("{}", state);
            // Exit with code 1 if disabled (like systemctl)
            if state == "disabled" {
                std::process::exit(1);
            }
        }
    }
}
