//! envcfg CLI: load, inspect and serve with environment-driven settings.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use envcfg::config::{self, DotenvFile, Environment, FieldKind, ProcessEnv};
use envcfg::shutdown::{Server, ShutdownConfig, run_with_graceful_shutdown};
use envcfg::telemetry::{TelemetryConfig, init_telemetry};
use serde::Serialize;
use tokio::io::AsyncWriteExt as _;
use tokio::net::TcpListener;
use tokio::sync::Notify;

envcfg::env_record! {
    #[derive(Debug, Default, Serialize)]
    pub struct Settings {
        /// Address the health listener binds to.
        #[env("ENVCFG_LISTEN_ADDR", default = "127.0.0.1:8080")]
        pub listen_addr: String,
        /// Grace period for `serve` shutdown, in seconds.
        #[env("ENVCFG_SHUTDOWN_TIMEOUT_SECS", default = "30")]
        pub shutdown_timeout_secs: i64,
        #[env("ENVCFG_LOG_LEVEL", default = "info")]
        pub log_level: String,
        #[env("ENVCFG_JSON_LOGS", default = "false")]
        pub json_logs: bool,
    }
}

#[derive(Parser)]
#[command(name = "envcfg", about = "Typed configuration from the environment")]
struct Cli {
    /// Dotenv file layered under the process environment
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load settings and report every problem
    Check {
        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },
    /// List the environment keys settings are read from
    Keys,
    /// Run a TCP health listener until SIGINT/SIGTERM
    Serve,
}

#[derive(Debug, Serialize)]
struct Report {
    ok: bool,
    settings: Option<Settings>,
    errors: Vec<ReportError>,
}

#[derive(Debug, Serialize)]
struct ReportError {
    field: Option<String>,
    message: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file = match &cli.env_file {
        Some(path) => DotenvFile::from_path(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => DotenvFile::default(),
    };
    let env = ProcessEnv.or(file);

    match cli.command {
        Command::Check { json } => cmd_check(&env, json),
        Command::Keys => cmd_keys(),
        Command::Serve => cmd_serve(&env).await,
    }
}

fn build_report(env: &impl Environment) -> Report {
    let mut settings = Settings::default();
    match config::parse_from(env, &mut settings) {
        Ok(()) => Report {
            ok: true,
            settings: Some(settings),
            errors: Vec::new(),
        },
        Err(errors) => Report {
            ok: false,
            settings: None,
            errors: errors
                .iter()
                .map(|e| ReportError {
                    field: e.field().map(str::to_string),
                    message: e.to_string(),
                })
                .collect(),
        },
    }
}

fn cmd_check(env: &impl Environment, json: bool) -> anyhow::Result<()> {
    let report = build_report(env);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if let Some(settings) = &report.settings {
        println!("{settings:#?}");
    } else {
        for error in &report.errors {
            eprintln!("{}", error.message);
        }
    }

    if !report.ok {
        anyhow::bail!("configuration has {} error(s)", report.errors.len());
    }
    Ok(())
}

fn cmd_keys() -> anyhow::Result<()> {
    println!("{:<36}  {:<8}  {:<24}  FIELD", "KEY", "TYPE", "DEFAULT");
    println!("{}", "-".repeat(90));
    for (path, field) in config::describe::<Settings>() {
        let kind = match field.kind {
            FieldKind::Text => "text".to_string(),
            FieldKind::Bool => "bool".to_string(),
            FieldKind::Int { bits } => format!("i{bits}"),
            FieldKind::Record => "record".to_string(),
            FieldKind::Unsupported => field.type_name.to_string(),
        };
        println!(
            "{:<36}  {:<8}  {:<24}  {}",
            field.key().unwrap_or("-"),
            kind,
            field.default_value().unwrap_or("(required)"),
            path
        );
    }
    Ok(())
}

async fn cmd_serve(env: &impl Environment) -> anyhow::Result<()> {
    let settings: Settings = config::from_env_with(env)?;

    init_telemetry(TelemetryConfig {
        default_level: settings.log_level.clone(),
        json: settings.json_logs,
    })?;

    let timeout = u64::try_from(settings.shutdown_timeout_secs)
        .context("ENVCFG_SHUTDOWN_TIMEOUT_SECS must not be negative")?;

    let listener = TcpListener::bind(&settings.listen_addr)
        .await
        .with_context(|| format!("binding {}", settings.listen_addr))?;
    let server = HealthServer {
        listener,
        stop: Notify::new(),
    };

    let config = ShutdownConfig {
        timeout: Duration::from_secs(timeout),
        ..ShutdownConfig::default()
    };
    run_with_graceful_shutdown(&server, &config).await?;
    Ok(())
}

/// Answers `ok` to every connection.
struct HealthServer {
    listener: TcpListener,
    stop: Notify,
}

impl Server for HealthServer {
    fn addr(&self) -> String {
        self.listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string())
    }

    async fn serve(&self) -> io::Result<()> {
        loop {
            tokio::select! {
                _ = self.stop.notified() => return Ok(()),
                accepted = self.listener.accept() => {
                    let (mut stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) if is_connection_error(&e) => {
                            tracing::debug!(error = %e, "connection dropped before accept");
                            continue;
                        }
                        Err(e) => {
                            // Usually fd exhaustion; back off instead of spinning.
                            tracing::warn!(error = %e, "accept failed");
                            tokio::time::sleep(Duration::from_secs(1)).await;
                            continue;
                        }
                    };
                    tokio::spawn(async move {
                        if let Err(e) = stream.write_all(b"ok\n").await {
                            tracing::debug!(%peer, error = %e, "health reply failed");
                        }
                    });
                }
            }
        }
    }

    async fn shutdown(&self) -> io::Result<()> {
        self.stop.notify_one();
        Ok(())
    }
}

fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn report_for_valid_environment() {
        let report = build_report(&env(&[("ENVCFG_LISTEN_ADDR", "0.0.0.0:9000")]));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["settings"]["listen_addr"], "0.0.0.0:9000");
        assert_eq!(json["settings"]["shutdown_timeout_secs"], 30);
        assert_eq!(json["errors"], serde_json::json!([]));
    }

    #[test]
    fn report_lists_field_errors() {
        let report = build_report(&env(&[
            ("ENVCFG_SHUTDOWN_TIMEOUT_SECS", "soon"),
            ("ENVCFG_JSON_LOGS", "maybe"),
        ]));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["ok"], false);
        assert!(json["settings"].is_null());
        assert_eq!(json["errors"][0]["field"], "shutdown_timeout_secs");
        assert_eq!(json["errors"][1]["field"], "json_logs");
        assert!(
            json["errors"][0]["message"]
                .as_str()
                .unwrap()
                .contains("shutdown_timeout_secs")
        );
    }

    #[test]
    fn check_fails_on_invalid_settings() {
        let bad = env(&[("ENVCFG_SHUTDOWN_TIMEOUT_SECS", "soon")]);
        assert!(cmd_check(&bad, true).is_err());
        assert!(cmd_check(&bad, false).is_err());
        assert!(cmd_check(&env(&[]), true).is_ok());
    }

    #[test]
    fn transient_accept_errors_are_recognized() {
        let reset = io::Error::from(io::ErrorKind::ConnectionReset);
        assert!(is_connection_error(&reset));
        let other = io::Error::other("too many open files");
        assert!(!is_connection_error(&other));
    }

    #[tokio::test]
    async fn health_server_answers_and_stops() {
        let server = HealthServer {
            listener: TcpListener::bind("127.0.0.1:0").await.unwrap(),
            stop: Notify::new(),
        };
        let addr = server.listener.local_addr().unwrap();

        let client = async {
            use tokio::io::AsyncReadExt as _;
            let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
            let mut reply = String::new();
            stream.read_to_string(&mut reply).await.unwrap();
            server.shutdown().await.unwrap();
            reply
        };
        let (served, reply) = tokio::join!(server.serve(), client);
        served.unwrap();
        assert_eq!(reply, "ok\n");
    }
}
