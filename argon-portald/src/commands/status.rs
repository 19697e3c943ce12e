//! Status command - show status of the running daemon

use anyhow::Result;

use argon_core::ipc::IpcClient;

/// Show status of the running daemon
pub async fn status() -> Result<()> {
    let mut client = match IpcClient::connect().await {
        Ok(client) => client,
        Err(_) => {
            println!("Argon daemon is not running.");
            return Ok(());
        }
    };

    let status = client.status().await?;

    println!("Argon - Status\n");
    println!("  PID:             {}", status.pid);
    println!("  Uptime:          {:.0}s", status.uptime_seconds);
    println!(
        "  Backend:         {}",
        if status.backend_available {
            "available"
        } else {
            "unavailable"
        }
    );
    println!("  Live sessions:   {}", status.active_sessions);

    Ok(())
}
