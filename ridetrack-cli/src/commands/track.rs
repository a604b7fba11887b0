//! Track command - run a live tracking session from a replayed GPS path.
//!
//! `--replay FILE` streams the file's path to the configured server.
//! `--demo` replays a built-in path against an in-process server that
//! greets the client and, for drivers, assigns a job.

use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info};

use ridetrack::coord::Coordinate;
use ridetrack::location::ReplayPlatform;
use ridetrack::maps::MappingService;
use ridetrack::realtime::{
    MemoryPeer, MemoryTransport, Role, Transport, WebSocketTransport, EVENT_JOB_ASSIGNMENT,
};
use ridetrack::session::{
    spawn_session_logger, SessionConfig, SessionOrchestrator, SessionView, DEFAULT_LOG_INTERVAL,
};

use super::common::{describe_changes, RoleArg};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Server URL used for the in-process demo server.
const DEMO_SERVER_URL: &str = "ws://demo.local";

/// Delay before the demo server assigns a job to a driver.
const DEMO_JOB_DELAY: Duration = Duration::from_secs(3);

/// Arguments for the track command.
pub struct TrackArgs {
    pub replay: Option<String>,
    pub demo: bool,
    pub destination: Option<Coordinate>,
    pub role: Option<RoleArg>,
    pub cadence: u64,
    pub duration: Option<u64>,
    pub debug: bool,
}

/// Run the track command.
pub fn run(args: TrackArgs) -> Result<(), CliError> {
    let mut runner = CliRunner::new(args.debug, false)?;
    if let Some(role) = args.role {
        runner.config_mut().session.role = role.into();
    }
    runner.log_startup("track");

    let path = match (&args.replay, args.demo) {
        (Some(file), _) => read_path(file)?,
        (None, true) => demo_path(),
        (None, false) => {
            return Err(CliError::Config(
                "No location source. Use --replay FILE or --demo.".to_string(),
            ))
        }
    };
    let platform = ReplayPlatform::new(path)
        .with_cadence(Duration::from_secs(args.cadence.max(1)))
        .looped(args.demo);

    let maps = runner.maps_client()?;
    let mut session_config = runner.config().session_config();
    let runtime = runner.runtime()?;

    runtime.block_on(async move {
        if args.demo {
            session_config.server_url = DEMO_SERVER_URL.to_string();
            let (transport, peers) = MemoryTransport::new();
            tokio::spawn(demo_server(peers, session_config.role()));
            drive(session_config, platform, maps, transport, &args).await
        } else {
            drive(session_config, platform, maps, WebSocketTransport::new(), &args).await
        }
    })
}

async fn drive<M, T>(
    config: SessionConfig,
    platform: ReplayPlatform,
    maps: M,
    transport: T,
    args: &TrackArgs,
) -> Result<(), CliError>
where
    M: MappingService,
    T: Transport,
{
    println!(
        "Tracking as {} ({}){}",
        config.identity.id(),
        config.role(),
        if config.server_url.is_empty() {
            String::new()
        } else {
            format!(" via {}", config.server_url)
        }
    );
    println!("Press Ctrl-C to stop.");

    let handle = SessionOrchestrator::start(config, platform, maps, transport);
    let logger = tracing::enabled!(tracing::Level::DEBUG).then(|| {
        spawn_session_logger(
            handle.subscribe(),
            handle.cancellation_token(),
            DEFAULT_LOG_INTERVAL,
        )
    });

    if let Some(destination) = args.destination {
        handle.set_destination(destination, None)?;
    }

    let mut views = handle.subscribe();
    let mut previous = SessionView::default();

    let stop = async {
        match args.duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(stop, ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                println!("Stopping...");
                break;
            }
            _ = &mut stop => break,
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                for line in describe_changes(&previous, &view) {
                    println!("{}", line);
                }
                previous = view;
            }
        }
    }

    handle.shutdown().await;
    if let Some(logger) = logger {
        let _ = logger.await;
    }
    info!("Tracking session finished");
    Ok(())
}

fn read_path(file: &str) -> Result<Vec<Coordinate>, CliError> {
    let content = std::fs::read_to_string(file).map_err(|error| CliError::FileRead {
        path: file.to_string(),
        error,
    })?;
    let path = ReplayPlatform::parse(&content)
        .map_err(|e| CliError::Config(format!("{}: {}", file, e)))?;
    if path.is_empty() {
        return Err(CliError::Config(format!("{}: no coordinates", file)));
    }
    Ok(path)
}

/// A short drive through Yaba, Lagos.
fn demo_path() -> Vec<Coordinate> {
    [
        (6.5095, 3.3711),
        (6.5110, 3.3718),
        (6.5128, 3.3726),
        (6.5146, 3.3735),
        (6.5163, 3.3744),
        (6.5181, 3.3752),
        (6.5199, 3.3761),
        (6.5217, 3.3770),
        (6.5232, 3.3781),
        (6.5244, 3.3792),
    ]
    .into_iter()
    .filter_map(|(lat, lng)| Coordinate::new(lat, lng).ok())
    .collect()
}

/// In-process stand-in for the tracking server.
async fn demo_server(mut peers: mpsc::UnboundedReceiver<MemoryPeer>, role: Role) {
    while let Some(mut peer) = peers.recv().await {
        tokio::spawn(async move {
            if let Some(identify) = peer.recv().await {
                info!(data = %identify.data, "Demo server: client identified");
            }
            peer.send(
                "announcement",
                json!({ "text": "Connected to the demo tracking server" }),
            );

            if role == Role::Driver {
                tokio::time::sleep(DEMO_JOB_DELAY).await;
                peer.send(
                    EVENT_JOB_ASSIGNMENT,
                    json!({
                        "pickup": { "latitude": 6.5244, "longitude": 3.3792, "address": "Yaba" },
                        "destination": { "latitude": 6.6018, "longitude": 3.3515, "address": "Ikeja" }
                    }),
                );
            }

            while let Some(envelope) = peer.recv().await {
                debug!(event = %envelope.event, "Demo server received");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_path_is_valid() {
        let path = demo_path();
        assert_eq!(path.len(), 10);
    }

    #[test]
    fn test_read_path_missing_file() {
        let err = read_path("/nonexistent/ridetrack/path.txt").unwrap_err();
        assert!(matches!(err, CliError::FileRead { .. }));
    }

    #[test]
    fn test_read_path_rejects_empty_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("path.txt");
        std::fs::write(&file, "# nothing here\n").unwrap();

        let err = read_path(file.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_read_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("path.txt");
        std::fs::write(&file, "6.5095,3.3711\n6.5110, 3.3718\n").unwrap();

        let path = read_path(file.to_str().unwrap()).unwrap();
        assert_eq!(path.len(), 2);
    }
}
