//! Periodic load reporting from a backend to the dispatch service.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::backend::in_flight::InFlight;
use crate::client::{ClientError, DispatchClient};

/// What a single report attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The dispatcher accepted the load value.
    Reported(u64),
    /// The dispatcher did not know us; we registered again.
    Reregistered,
}

pub struct LoadReporter {
    client: DispatchClient,
    address: String,
    in_flight: InFlight,
    interval: Duration,
}

impl LoadReporter {
    pub fn new(
        client: DispatchClient,
        address: impl Into<String>,
        in_flight: InFlight,
        interval: Duration,
    ) -> Self {
        Self {
            client,
            address: address.into(),
            in_flight,
            interval,
        }
    }

    /// Report every interval until shutdown. Failures are logged and the
    /// loop carries on.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            address = %self.address,
            dispatcher = %self.client.base(),
            interval_secs = self.interval.as_secs(),
            "Load reporter starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.report_once().await {
                        tracing::warn!(address = %self.address, error = %e, "Failed to report load");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Load reporter received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    pub async fn report_once(&self) -> Result<ReportOutcome, ClientError> {
        let load = self.in_flight.current();
        if self.client.report_load(&self.address, load).await? {
            tracing::debug!(address = %self.address, load, "Reported load");
            return Ok(ReportOutcome::Reported(load));
        }

        tracing::warn!(address = %self.address, "Dispatcher does not know this server, registering again");
        self.client.register(&self.address).await?;
        Ok(ReportOutcome::Reregistered)
    }
}
