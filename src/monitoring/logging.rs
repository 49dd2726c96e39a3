// DANS : src/monitoring/logging.rs
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Logs JSON sur la sortie standard, filtrés par `RUST_LOG` ("info" par défaut).
/// Les spans `run_protocol` sont émis à leur fermeture, avec leur durée.
pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // `try_init` : un second appel (tests, binaires multiples) n'est pas une erreur.
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .try_init();
}
