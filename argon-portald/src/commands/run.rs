//! Run command - serve the portal socket

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::{info, warn};

use argon_core::backend::NullInjector;
use argon_core::config::ConfigFile;
use argon_core::ipc::IpcServer;
use argon_core::picker::AcceptFirstPicker;
use argon_core::{PortalService, SessionRegistry, StaticBackend};

/// Arguments for the run command
#[derive(Args)]
pub struct RunArgs {
    /// Socket path override
    #[arg(long)]
    pub socket: Option<PathBuf>,

    /// Config file override
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Serve the portal socket until a signal or a Stop request arrives
pub async fn run(args: RunArgs) -> Result<()> {
    let config = match args.config {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    let sources = config.descriptors()?;
    info!(sources = sources.len(), "serving development source table");

    let registry = Arc::new(SessionRegistry::new());
    let backend = Arc::new(StaticBackend::new(sources));
    let picker = Arc::new(AcceptFirstPicker);
    let service = Arc::new(
        PortalService::new(registry, backend, picker).with_input(Arc::new(NullInjector)),
    );

    let socket = args.socket.or_else(|| config.service.socket_path.clone());
    let mut server = match socket {
        Some(path) => IpcServer::with_socket_path(service.clone(), path),
        None => IpcServer::new(service.clone()),
    };
    server.start().await?;

    // Shut down cleanly on SIGINT/SIGTERM
    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        let mut term =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(term) => term,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("received SIGINT, shutting down"),
            _ = term.recv() => info!("received SIGTERM, shutting down"),
        }
        let _ = shutdown.send(());
    });

    server.serve().await?;

    let closed = service.close_all().await;
    if closed > 0 {
        info!(closed, "closed remaining sessions");
    }

    Ok(())
}
