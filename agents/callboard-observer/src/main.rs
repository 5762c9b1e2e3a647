use anyhow::Result;
use clap::Parser;
use tokio::sync::{mpsc, watch};
use tracing::info;
use tracing_subscriber::EnvFilter;

use callboard_observer::{ConnectionState, DashboardState, ObserverClient};

#[derive(Debug, Parser)]
#[command(
    name = "callboard-observer",
    about = "Terminal observer for the Callboard dashboard stream"
)]
struct Args {
    /// Dashboard WebSocket URL.
    #[arg(long, default_value = "ws://localhost:3001/ws/dashboard")]
    url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let (events_tx, mut events_rx) = mpsc::channel(64);
    let (status_tx, mut status_rx) = watch::channel(ConnectionState::Connecting);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let client = ObserverClient::new(args.url, events_tx, status_tx, shutdown_rx);
    let client_task = tokio::spawn(client.run());

    let mut state = DashboardState::default();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                let _ = shutdown_tx.send(true);
                break;
            }
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = status_rx.borrow_and_update().clone();
                info!(status = %status.status_text(), "Connection status");
                if status == ConnectionState::Failed {
                    break;
                }
            }
            event = events_rx.recv() => match event {
                Some(event) => {
                    let kind = event.type_name();
                    state.apply(event);
                    info!(
                        event = kind,
                        transcripts = state.transcripts.len(),
                        recommendations =
                            state.ai_recommendations.len() + state.backend_recommendations.len(),
                        tasks_completed = state
                            .task_list
                            .as_ref()
                            .map(|t| t.completed_count)
                            .unwrap_or(0),
                        "Dashboard state updated"
                    );
                }
                None => break,
            },
        }
    }

    let _ = client_task.await;
    Ok(())
}
