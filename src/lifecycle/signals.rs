//! OS signal handling.
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Signals are translated to values on a channel so the coordinator can
//!   multiplex them against the server's error channel
//! - Only the first signal matters; later ones arrive after shutdown has
//!   already begun and are ignored

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

/// Termination notifications this process reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermSignal {
    /// SIGINT. Conventional exit code 130.
    Interrupt,
    /// SIGTERM. Conventional exit code 0.
    Terminate,
}

impl TermSignal {
    pub fn exit_code(self) -> i32 {
        match self {
            TermSignal::Interrupt => 130,
            TermSignal::Terminate => 0,
        }
    }
}

impl std::fmt::Display for TermSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TermSignal::Interrupt => write!(f, "SIGINT"),
            TermSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Register SIGINT/SIGTERM handlers and forward the first one received.
pub fn listen() -> std::io::Result<mpsc::Receiver<TermSignal>> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        let received = tokio::select! {
            _ = interrupt.recv() => TermSignal::Interrupt,
            _ = terminate.recv() => TermSignal::Terminate,
        };
        let _ = tx.send(received).await;
    });

    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_convention() {
        assert_eq!(TermSignal::Interrupt.exit_code(), 130);
        assert_eq!(TermSignal::Terminate.exit_code(), 0);
    }
}
