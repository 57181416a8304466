//! `cadence serve` — start the Cadence HTTP backend server.

use super::Context;

pub async fn run(ctx: &Context, host: String, port: u16) -> Result<(), String> {
    let config = cadence_server::ServerConfig {
        host: host.clone(),
        port,
        registry_path: ctx.registry.clone(),
        config_dir: ctx.config_dir.clone(),
        policy_path: ctx.policy.clone(),
    };

    println!("Starting Cadence server on {}:{}...", host, port);

    let addr = cadence_server::start_server(config).await?;
    println!("Cadence server listening on http://{}", addr);

    // Keep the process running until interrupted
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Failed to listen for Ctrl+C: {}", e))?;

    println!("\nShutting down...");
    Ok(())
}
