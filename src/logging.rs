//! Log subscriber construction.
//!
//! Nothing here installs a global subscriber. [`build_dispatch`] returns a
//! [`Dispatch`] that the binary scopes with
//! `tracing::dispatcher::with_default` and hands to the indexer, which
//! installs it on every worker thread.

use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

/// Build the dispatch used for a run.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects `debug` for this
/// crate and `info` without it. Output goes to stderr.
pub fn build_dispatch(verbose: bool) -> Dispatch {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();
    Dispatch::new(subscriber)
}

fn default_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("warn,codectx=debug")
    } else {
        EnvFilter::new("warn,codectx=info")
    }
}
