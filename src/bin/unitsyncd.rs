//! unitsyncd - systemd unit synchronization daemon
//!
//! Polls the service manager every scan interval and keeps the selected
//! units in sync. Listens on /run/unitsync.sock for commands from
//! unitsyncctl.
//!
//! Signals:
//! - SIGHUP: re-read the config file
//!
//! User mode (--user):
//! - Talks to the user service manager on the session bus
//! - Reads ~/.config/unitsync.toml
//! - Socket at /run/user/<uid>/unitsync.sock

use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::broadcast::error::RecvError;

use peercred_ipc::{CallerInfo, Connection, Server};
use unitsync::config::{default_config_path, Settings};
use unitsync::protocol::{socket_path, Request, Response};
use unitsync::{Action, ActionOutcome, DbusBus, Worker};

#[derive(Parser)]
#[command(name = "unitsyncd")]
#[command(about = "Keep selected systemd units in sync")]
#[command(
    long_about = "unitsyncd polls the systemd service manager over D-Bus, tracks the \
    selected service units and exposes their state and lifecycle actions on \
    /run/unitsync.sock for unitsyncctl."
)]
struct Args {
    /// Run against the user service manager (session bus)
    #[arg(long)]
    user: bool,

    /// Config file (default: /etc/unitsync.toml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Track this unit in addition to the config file (repeatable)
    #[arg(long = "service", short = 's')]
    services: Vec<String>,

    /// Seconds between reconciliation passes
    #[arg(long)]
    scan_interval: Option<u64>,
}

impl Args {
    fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| default_config_path(self.user))
    }

    /// Config file merged with command-line overrides
    fn settings(&self) -> Result<Settings, unitsync::config::ConfigError> {
        let path = self.config_path();
        let mut settings = if self.config.is_some() {
            Settings::load(&path)?
        } else {
            Settings::load_or_default(&path)?
        };
        settings.extend(&self.services);
        if let Some(interval) = self.scan_interval {
            settings.scan_interval = interval;
        }
        settings.validate()?;
        Ok(settings)
    }
}

type SharedWorker = Arc<Worker<DbusBus>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Arc::new(Args::parse());

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = args.settings()?;
    info!(
        "Tracking {} units every {}s",
        settings.services.len(),
        settings.scan_interval
    );

    let bus = if args.user {
        DbusBus::session().await?
    } else {
        DbusBus::system().await?
    };

    let worker: SharedWorker = Arc::new(Worker::new(bus, settings));

    // Log a summary after every pass
    let mut updates = worker.subscribe();
    let worker_log = Arc::clone(&worker);
    tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(()) => {
                    let units = worker_log.snapshot().await;
                    let available = units.iter().filter(|u| u.available).count();
                    let on = units.iter().filter(|u| u.is_on).count();
                    log::debug!(
                        "Units updated: {} tracked, {} available, {} on",
                        units.len(),
                        available,
                        on
                    );
                }
                Err(RecvError::Lagged(missed)) => {
                    log::debug!("Update listener lagged by {} passes", missed);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    tokio::spawn(Arc::clone(&worker).run());

    // SIGHUP: reload config
    let mut hangup = signal(SignalKind::hangup())?;
    let worker_hup = Arc::clone(&worker);
    let args_hup = Arc::clone(&args);
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            info!("Received SIGHUP, reloading {}", args_hup.config_path().display());
            match args_hup.settings() {
                Ok(settings) => worker_hup.update_settings(settings).await,
                Err(e) => log::warn!("Keeping current settings: {}", e),
            }
        }
    });

    let sock_path = socket_path(args.user);
    let server = Server::bind(&sock_path)?;
    info!(
        "unitsyncd{} listening on {}",
        if args.user { " (user)" } else { "" },
        sock_path
    );

    loop {
        match server.accept().await {
            Ok((conn, caller)) => {
                let worker = Arc::clone(&worker);
                tokio::spawn(handle_connection(conn, caller, worker));
            }
            Err(e) => {
                log::error!("accept error: {}", e);
            }
        }
    }
}

/// One request, one response per connection
async fn handle_connection(mut conn: Connection, caller: CallerInfo, worker: SharedWorker) {
    let request: Request = match conn.read().await {
        Ok(request) => request,
        Err(e) => {
            log::warn!("Malformed request from pid {}: {}", caller.pid, e);
            let _ = conn.write(&Response::Error("invalid request".into())).await;
            return;
        }
    };
    log::debug!("{:?} from uid={} pid={}", request, caller.uid, caller.pid);

    let response = handle_request(request, &worker).await;
    if let Err(e) = conn.write(&response).await {
        log::warn!("Could not answer pid {}: {}", caller.pid, e);
    }
}

fn action_response(action: &str, name: &str, outcome: ActionOutcome) -> Response {
    match outcome {
        ActionOutcome::Done => Response::Ok,
        ActionOutcome::Skipped => Response::Skipped,
        ActionOutcome::Failed => Response::Error(format!("{} {} failed", action, name)),
    }
}

async fn handle_request(request: Request, worker: &SharedWorker) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::List => Response::Units(worker.snapshot().await),

        Request::Status { name } => match worker.unit(&name).await {
            Some(info) => Response::Status(info),
            None => Response::Error(format!("unit not tracked: {}", name)),
        },

        Request::Start { name, mode } => {
            let outcome = worker.perform(Action::Start, &name, mode).await;
            action_response(Action::Start.as_str(), &name, outcome)
        }

        Request::Stop { name, mode } => {
            let outcome = worker.perform(Action::Stop, &name, mode).await;
            action_response(Action::Stop.as_str(), &name, outcome)
        }

        Request::Restart { name, mode } => {
            let outcome = worker.perform(Action::Restart, &name, mode).await;
            action_response(Action::Restart.as_str(), &name, outcome)
        }

        Request::Enable { name } => {
            let outcome = worker.perform(Action::Enable, &name, None).await;
            action_response(Action::Enable.as_str(), &name, outcome)
        }

        Request::Disable { name } => {
            let outcome = worker.perform(Action::Disable, &name, None).await;
            action_response(Action::Disable.as_str(), &name, outcome)
        }

        Request::TurnOn { name } => {
            let outcome = worker.turn_on(&name).await;
            action_response("turn on", &name, outcome)
        }

        Request::TurnOff { name } => {
            let outcome = worker.turn_off(&name).await;
            action_response("turn off", &name, outcome)
        }

        Request::IsEnabled { name } => match worker.is_enabled(&name).await {
            Some(state) => Response::EnabledState(state),
            None => Response::Error(format!("no unit file for {}", name)),
        },

        Request::Refresh => {
            if worker.reconcile().await {
                Response::Ok
            } else {
                Response::Busy
            }
        }
    }
}
