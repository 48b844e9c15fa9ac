//! ssh-key-setup - Entry point
//!
//! Parses the positional arguments, probes key-based login, and either
//! provisions the given public key or reports the remote working directory.

use clap::{CommandFactory, Parser};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ssh_key_setup::config::{Args, Config};
use ssh_key_setup::provision::{default_steps, provisioning_steps};
use ssh_key_setup::{LoginProber, RunOutcome, Runner, SshConnector};

#[tokio::main]
async fn main() {
    // Logs and progress go to stderr
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        // --help / --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", Args::command().render_usage());
            std::process::exit(1);
        }
    };

    info!(
        "ssh-key-setup v{} targeting {}",
        env!("CARGO_PKG_VERSION"),
        config.target
    );

    let runner = Runner::new(SshConnector::new());
    let credentials = config.credentials();

    let Some(ref key) = config.public_key else {
        let outcome = runner
            .run(&config.target, &credentials, &default_steps())
            .await;
        report(&outcome);
        return;
    };

    let prober = LoginProber::new();
    if prober.probe(&config.target).await {
        info!(
            "✓ Key-based login already works for {}",
            config.target.destination()
        );
        return;
    }

    info!(
        "Key-based login not available, installing {} ({})",
        key.path().display(),
        key.fingerprint()
    );

    let outcome = runner
        .run(&config.target, &credentials, &provisioning_steps(key))
        .await;
    report(&outcome);
    if !outcome.is_success() {
        return;
    }

    if prober.probe(&config.target).await {
        info!(
            "✓ Key-based login confirmed for {}",
            config.target.destination()
        );
    } else {
        warn!(
            "Public key installed, but key-based login for {} could not be confirmed. \
             Make sure the matching private key is available to your ssh client.",
            config.target.destination()
        );
    }
}

fn report(outcome: &RunOutcome) {
    match &outcome.failure {
        None => info!("Done ({} step(s) completed)", outcome.completed_steps),
        Some(failure) => {
            error!("Stopped after {} step(s)", outcome.completed_steps);
            if let Some(hint) = failure.kind.hint() {
                error!("{}", hint);
            }
        }
    }
}
