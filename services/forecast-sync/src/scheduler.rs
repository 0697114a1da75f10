//! Periodic driver: one cycle per kind on startup, then each kind on its own
//! interval until cancelled.

use std::time::Duration;

use chrono::Utc;
use forecast_common::SourceKind;
use futures::future::join_all;
use ingestion::{CycleOutcome, ResilienceOrchestrator};
use metrics::gauge;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How often each kind is refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindSchedule {
    pub kind: SourceKind,
    pub interval: Duration,
}

pub struct Scheduler {
    orchestrator: ResilienceOrchestrator,
    schedules: Vec<KindSchedule>,
}

impl Scheduler {
    pub fn new(orchestrator: ResilienceOrchestrator, schedules: Vec<KindSchedule>) -> Self {
        Self {
            orchestrator,
            schedules,
        }
    }

    /// Run one cycle per kind concurrently.
    pub async fn run_once(&self) -> Vec<(SourceKind, CycleOutcome)> {
        let cycles = self.schedules.iter().map(|s| {
            let orchestrator = &self.orchestrator;
            async move {
                let outcome = orchestrator.run_cycle(s.kind).await;
                record_outcome(s.kind, &outcome);
                (s.kind, outcome)
            }
        });
        join_all(cycles).await
    }

    /// Run every kind on its interval until `cancel` fires.
    ///
    /// The first cycle of each kind starts immediately. A cycle already in
    /// progress when `cancel` fires runs to completion.
    pub async fn run_until_cancelled(&self, cancel: CancellationToken) {
        let handles: Vec<_> = self
            .schedules
            .iter()
            .map(|schedule| {
                let orchestrator = self.orchestrator.clone();
                let cancel = cancel.clone();
                let schedule = *schedule;
                tokio::spawn(async move { drive(orchestrator, schedule, cancel).await })
            })
            .collect();

        for result in join_all(handles).await {
            if let Err(e) = result {
                error!(error = %e, "Scheduler task panicked");
            }
        }
        info!("Scheduler stopped");
    }
}

async fn drive(orchestrator: ResilienceOrchestrator, schedule: KindSchedule, cancel: CancellationToken) {
    let KindSchedule { kind, interval } = schedule;
    info!(kind = %kind, interval_secs = interval.as_secs(), "Starting schedule");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let outcome = orchestrator.run_cycle(kind).await;
        record_outcome(kind, &outcome);
    }

    info!(kind = %kind, "Schedule cancelled");
}

fn record_outcome(kind: SourceKind, outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::Success { .. } => {
            gauge!("forecast_last_success_timestamp_seconds", "kind" => kind.as_str())
                .set(Utc::now().timestamp() as f64);
        }
        CycleOutcome::DegradedSuccess(degradation) => {
            warn!(kind = %kind, degradation = ?degradation, "Cycle degraded");
        }
        CycleOutcome::TotalFailure { reason } => {
            error!(kind = %kind, reason = ?reason, "Cycle published nothing");
        }
    }
}

/// True when no kind published anything.
pub fn all_failed(outcomes: &[(SourceKind, CycleOutcome)]) -> bool {
    !outcomes.is_empty() && outcomes.iter().all(|(_, o)| !o.published())
}
