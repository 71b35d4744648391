//! Graceful shutdown for network services.
//!
//! Runs a [`Server`] until it fails or a termination signal arrives, then
//! asks it to shut down and waits for it to drain, bounded by a timeout.
//! Independent of the configuration loader.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::error::{Error, Result};

/// Grace period used when none is configured.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Termination signals the helper can wait on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
    Hangup,
    Quit,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
            Signal::Hangup => "SIGHUP",
            Signal::Quit => "SIGQUIT",
        };
        write!(f, "{s}")
    }
}

/// Configuration for [`run_with_graceful_shutdown`].
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// How long shutdown may take. Zero means [`DEFAULT_SHUTDOWN_TIMEOUT`].
    pub timeout: Duration,
    /// Signals that trigger shutdown. Empty means interrupt and terminate.
    pub signals: Vec<Signal>,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            signals: vec![Signal::Interrupt, Signal::Terminate],
        }
    }
}

impl ShutdownConfig {
    fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_SHUTDOWN_TIMEOUT
        } else {
            self.timeout
        }
    }

    fn effective_signals(&self) -> Vec<Signal> {
        if self.signals.is_empty() {
            ShutdownConfig::default().signals
        } else {
            self.signals.clone()
        }
    }
}

/// A running network listener.
pub trait Server {
    /// Address reported in logs.
    fn addr(&self) -> String;

    /// Accept connections until stopped. Resolves `Ok` once a requested
    /// shutdown has completed, `Err` if the listener fails.
    fn serve(&self) -> impl Future<Output = std::io::Result<()>> + Send;

    /// Ask the listener to stop and wait for in-flight work.
    fn shutdown(&self) -> impl Future<Output = std::io::Result<()>> + Send;
}

/// Serve until the listener fails or one of the configured signals arrives.
///
/// On a signal, shutdown is driven to completion within the configured
/// timeout. Listener failures before any signal are returned as
/// [`Error::Listen`].
pub async fn run_with_graceful_shutdown<S: Server>(
    server: &S,
    config: &ShutdownConfig,
) -> Result<()> {
    let trigger = wait_for_signal(&config.effective_signals())?;
    run_until(server, config, trigger).await
}

/// Same as [`run_with_graceful_shutdown`], with an arbitrary trigger in place
/// of OS signals.
pub async fn run_until<S, T>(server: &S, config: &ShutdownConfig, trigger: T) -> Result<()>
where
    S: Server,
    T: Future<Output = Signal>,
{
    let timeout = config.effective_timeout();
    info!(addr = %server.addr(), "starting server");

    let serve = server.serve();
    tokio::pin!(serve);
    tokio::pin!(trigger);

    tokio::select! {
        result = &mut serve => {
            return match result {
                Ok(()) => {
                    info!("server stopped on its own");
                    Ok(())
                }
                Err(e) => {
                    error!(error = %e, "server failed");
                    Err(Error::Listen(e))
                }
            };
        }
        signal = &mut trigger => {
            info!(%signal, "received shutdown signal");
        }
    }

    info!(?timeout, "shutting down server");
    let drain = async {
        let (shutdown, served) = tokio::join!(server.shutdown(), &mut serve);
        if let Err(e) = served {
            warn!(error = %e, "listener reported an error while draining");
        }
        shutdown.map_err(Error::Shutdown)
    };

    match tokio::time::timeout(timeout, drain).await {
        Ok(result) => {
            if result.is_ok() {
                info!("server shut down");
            }
            result
        }
        Err(_) => {
            warn!(?timeout, "shutdown timed out");
            Err(Error::ShutdownTimeout(timeout))
        }
    }
}

/// Register handlers for `signals` and return a future resolving to the
/// first one received.
///
/// Registration happens before this returns, so signals arriving between
/// the call and the first poll are not lost. Must run inside a tokio
/// runtime.
#[cfg(unix)]
pub fn wait_for_signal(signals: &[Signal]) -> Result<impl Future<Output = Signal> + use<>> {
    use std::task::Poll;
    use tokio::signal::unix::{SignalKind, signal};

    let mut streams = Vec::with_capacity(signals.len());
    for &sig in signals {
        let kind = match sig {
            Signal::Interrupt => SignalKind::interrupt(),
            Signal::Terminate => SignalKind::terminate(),
            Signal::Hangup => SignalKind::hangup(),
            Signal::Quit => SignalKind::quit(),
        };
        streams.push((sig, signal(kind).map_err(Error::Signal)?));
    }

    Ok(std::future::poll_fn(move |cx| {
        for (sig, stream) in streams.iter_mut() {
            if let Poll::Ready(Some(())) = stream.poll_recv(cx) {
                return Poll::Ready(*sig);
            }
        }
        Poll::Pending
    }))
}

/// Register handlers for `signals` and return a future resolving to the
/// first one received. Only [`Signal::Interrupt`] is available here.
#[cfg(not(unix))]
pub fn wait_for_signal(signals: &[Signal]) -> Result<impl Future<Output = Signal> + use<>> {
    if let Some(sig) = signals.iter().find(|s| **s != Signal::Interrupt) {
        return Err(Error::Signal(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            format!("{sig} is not supported on this platform"),
        )));
    }
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "ctrl-c handler failed");
            std::future::pending::<()>().await;
        }
        Signal::Interrupt
    })
}
