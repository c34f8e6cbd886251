//! # Logging Setup
//!
//! Inizializzazione di `tracing` per le applicazioni che incorporano la libreria.
//! `RUST_LOG` ha la precedenza sul livello scelto con `verbose`.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is not set
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Install a global fmt subscriber filtered by `RUST_LOG` (INFO, or DEBUG when `verbose`)
pub fn init_tracing(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbose)))?;

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "info");
        assert_eq!(default_directive(true), "debug");
        assert!(EnvFilter::try_new(default_directive(true)).is_ok());
    }

    #[test]
    fn test_init_tracing_only_once() {
        let _ = init_tracing(false);
        assert!(init_tracing(true).is_err());
    }
}
