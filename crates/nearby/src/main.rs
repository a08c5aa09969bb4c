//! # nearby
//!
//! Presence server binary: loads settings, initializes logging and
//! metrics, and serves HTTP + WebSocket until Ctrl-C or SIGTERM.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use nearby_core::{LogFormat, init_subscriber};
use nearby_server::config::ServerConfig;
use nearby_server::server::NearbyServer;
use nearby_settings::NearbySettings;

/// Real-time presence and proximity messaging server.
#[derive(Parser, Debug)]
#[command(
    name = "nearby",
    version,
    about = "Real-time presence and proximity messaging server"
)]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings and `PORT`).
    #[arg(long)]
    port: Option<u16>,

    /// Settings file (default `~/.nearby/settings.json`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter when `RUST_LOG` is unset (overrides settings).
    #[arg(long)]
    log_level: Option<String>,

    /// Directory of static assets (overrides settings).
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

impl Cli {
    /// Apply command-line overrides on top of loaded settings.
    fn server_config(&self, settings: &NearbySettings) -> ServerConfig {
        let mut config = ServerConfig::from_settings(settings);
        if let Some(host) = &self.host {
            config.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(dir) = &self.static_dir {
            config.static_dir = Some(dir.clone());
        }
        config
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<NearbySettings> {
    let path = path.cloned().unwrap_or_else(nearby_settings::settings_path);
    nearby_settings::load_settings_from_path(&path)
        .with_context(|| format!("Failed to load {}", path.display()))
}

/// Resolve when the process receives Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut term = signal(SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res.context("Failed to listen for ctrl-c")?,
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for ctrl-c")?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Best effort: a missing .env is normal.
    let _ = dotenvy::dotenv();

    let args = Cli::parse();
    let settings = load_settings(args.config.as_ref())?;

    let level = args.log_level.as_deref().unwrap_or(&settings.logging.level);
    let format = LogFormat::parse(&settings.logging.format).unwrap_or_default();
    init_subscriber(level, format);

    let metrics_handle = nearby_server::metrics::install_recorder()
        .context("Failed to install metrics recorder")?;

    let config = args.server_config(&settings);
    if let Some(dir) = &config.static_dir
        && !dir.is_dir()
    {
        tracing::warn!(dir = %dir.display(), "static directory not found, fallback will 404");
    }

    let server = NearbyServer::new(config, metrics_handle);
    let (addr, handle) = server.listen().await.context("Failed to bind server")?;
    tracing::info!(
        %addr,
        scan_radius_m = server.config().default_radius_m,
        "nearby listening"
    );

    shutdown_signal().await?;

    tracing::info!("Shutting down...");
    server
        .shutdown()
        .graceful_shutdown(vec![handle], None)
        .await;
    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_overrides() {
        let cli = Cli::parse_from([
            "nearby",
            "--host",
            "127.0.0.1",
            "--port",
            "0",
            "--log-level",
            "debug",
            "--static-dir",
            "web",
        ]);
        assert_eq!(cli.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(cli.port, Some(0));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.static_dir, Some(PathBuf::from("web")));
    }

    #[test]
    fn cli_overrides_win_over_settings() {
        let mut settings = NearbySettings::default();
        settings.server.port = 7000;
        settings.server.host = "10.0.0.1".into();

        let cli = Cli::parse_from(["nearby", "--port", "8000"]);
        let config = cli.server_config(&settings);
        assert_eq!(config.port, 8000);
        assert_eq!(config.host, "10.0.0.1");
        assert_eq!(config.static_dir, Some(PathBuf::from("public")));
    }

    #[test]
    fn load_settings_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"server": {"port": 6123}}"#).unwrap();
        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.server.port, 6123);
    }

    #[test]
    fn load_settings_reports_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{oops").unwrap();
        let err = load_settings(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("settings.json"));
    }

    #[tokio::test]
    async fn server_graceful_shutdown() {
        let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
            .build_recorder()
            .handle();
        let server = NearbyServer::new(ServerConfig::default(), handle);
        let (_, task) = server.listen().await.unwrap();

        tokio::time::timeout(
            std::time::Duration::from_secs(5),
            server.shutdown().graceful_shutdown(vec![task], None),
        )
        .await
        .expect("shutdown timed out");
    }
}
