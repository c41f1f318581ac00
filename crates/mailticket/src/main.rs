//! mailticket - one pass over the support inbox.
//!
//! Reads `EMAIL`, `EMAIL_PASSWORD`, `WEBHOOK_URL`, `IMAP_SERVER` and the
//! optional `IMAP_PORT` from the environment, turns every unread message
//! into a helpdesk ticket and marks it read once the ticket exists.
//!
//! Exit status: 0 when the run completed (even if some messages were left
//! unread), 2 for missing configuration, 1 when the mailbox could not be
//! opened.

use std::process::ExitCode;

use anyhow::Context;
use mailticket_core::{Config, ProcessingLoop, RunReport};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mailticket=info,mailticket_core=info,mailticket_imap=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting mailticket");

    match run().await {
        Ok(report) => {
            summarize(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

async fn run() -> anyhow::Result<RunReport> {
    let config = Config::from_env()
        .map_err(mailticket_core::Error::from)
        .context("cannot start")?;
    info!(
        server = %config.imap_server,
        port = config.imap_port,
        account = %config.email,
        "configuration loaded"
    );

    ProcessingLoop::run_once(&config)
        .await
        .context("run aborted")
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<mailticket_core::Error>()
        .map_or(1, mailticket_core::Error::exit_code)
}

fn summarize(report: &RunReport) {
    for (id, err) in &report.left_unread {
        warn!(message = %id, stage = %err.stage(), "left unread: {err}");
    }
    info!(
        processed = report.total(),
        acknowledged = report.acknowledged.len(),
        left_unread = report.left_unread.len(),
        "run complete"
    );
}
