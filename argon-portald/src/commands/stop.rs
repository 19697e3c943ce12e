//! Stop command - stop the running daemon

use anyhow::Result;

use argon_core::ipc::IpcClient;

/// Stop the running daemon
pub async fn stop() -> Result<()> {
    let mut client = match IpcClient::connect().await {
        Ok(client) => client,
        Err(_) => {
            println!("Argon daemon is not running.");
            return Ok(());
        }
    };

    client.stop().await?;
    println!("Daemon is stopping.");

    Ok(())
}
