//! Sessions command - list live sessions

use anyhow::Result;

use argon_core::ipc::IpcClient;

/// List live sessions on the running daemon
pub async fn sessions() -> Result<()> {
    let mut client = match IpcClient::connect().await {
        Ok(client) => client,
        Err(_) => {
            println!("Argon daemon is not running.");
            return Ok(());
        }
    };

    let rows = client.sessions().await?;
    if rows.is_empty() {
        println!("No live sessions.");
        return Ok(());
    }

    println!("Live sessions:\n");
    for row in rows {
        println!(
            "  {} [{}] {} - {} ({} stream{})",
            row.handle,
            row.kind,
            row.app_id,
            row.state,
            row.streams,
            if row.streams == 1 { "" } else { "s" }
        );
    }

    Ok(())
}
