//! Fixed-interval polling of the working city set.
//!
//! Cycles never overlap: the timer loop awaits each cycle before waiting for
//! the next tick, ticks missed meanwhile are skipped, and [`PollingScheduler::run_cycle`]
//! holds an async lock so a direct caller cannot race the timer either.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    error::Result,
    model::{CityName, PollCycle},
    provider::WeatherProvider,
    sink::ObservationSink,
};

/// Shortest period the timer accepts; `interval` panics on zero.
pub const MIN_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Summary of one finished cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub number: u64,
    pub started_at: DateTime<Utc>,
    pub observed: usize,
    pub skipped: Vec<CityName>,
    pub persisted: bool,
}

#[derive(Debug)]
struct Shared {
    provider: Arc<dyn WeatherProvider>,
    sink: Arc<dyn ObservationSink>,
    cities: Vec<CityName>,
    period: Duration,
    executions: AtomicU64,
    state: Mutex<SchedulerState>,
    cycle_lock: tokio::sync::Mutex<()>,
}

#[derive(Debug, Clone)]
pub struct PollingScheduler {
    shared: Arc<Shared>,
}

impl PollingScheduler {
    /// `cities` is the validated working set; it never changes afterwards.
    /// A `period` below [`MIN_PERIOD`] is raised to it.
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        sink: Arc<dyn ObservationSink>,
        cities: Vec<CityName>,
        period: Duration,
    ) -> Self {
        if period < MIN_PERIOD {
            warn!(?period, min = ?MIN_PERIOD, "polling period too short, using the minimum");
        }
        let period = period.max(MIN_PERIOD);

        Self {
            shared: Arc::new(Shared {
                provider,
                sink,
                cities,
                period,
                executions: AtomicU64::new(0),
                state: Mutex::new(SchedulerState::Idle),
                cycle_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn cities(&self) -> &[CityName] {
        &self.shared.cities
    }

    pub fn period(&self) -> Duration {
        self.shared.period
    }

    /// Number of cycles started so far.
    pub fn executions(&self) -> u64 {
        self.shared.executions.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> SchedulerState {
        *self.shared.state.lock()
    }

    fn set_state(&self, next: SchedulerState) {
        let mut state = self.shared.state.lock();
        if *state != SchedulerState::Stopped {
            *state = next;
        }
    }

    /// Fetch every city once and persist whatever arrived.
    ///
    /// A sink failure is logged and returned; the cycle's observations are
    /// not retried.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let _guard = self.shared.cycle_lock.lock().await;
        self.set_state(SchedulerState::Running);

        let result = self.collect_and_persist().await;

        self.set_state(SchedulerState::Idle);
        result
    }

    async fn collect_and_persist(&self) -> Result<CycleReport> {
        let number = self.shared.executions.fetch_add(1, Ordering::Relaxed) + 1;
        let mut cycle = PollCycle { number, started_at: Utc::now(), observations: Vec::new() };
        let mut skipped = Vec::new();

        for city in &self.shared.cities {
            match self.shared.provider.fetch_weather(city).await {
                Some(obs) => {
                    info!(
                        city = %obs.city,
                        temperature = obs.temperature_c,
                        precipitation = obs.precipitation_pct,
                        wind_speed = obs.wind_speed_kph,
                        summary = %obs.summary,
                        "observation"
                    );
                    cycle.observations.push(obs);
                }
                None => {
                    warn!(
                        city = %city,
                        cycle = number,
                        "no weather data, skipping city this cycle"
                    );
                    skipped.push(city.clone());
                }
            }
        }

        let persisted = !cycle.is_empty();
        if persisted {
            if let Err(err) = self.shared.sink.add_range(&cycle.observations).await {
                error!(cycle = number, error = %err, "failed to persist cycle");
                return Err(err);
            }
        }

        info!(
            cycle = number,
            observed = cycle.observations.len(),
            skipped = skipped.len(),
            "cycle finished"
        );

        Ok(CycleReport {
            number,
            started_at: cycle.started_at,
            observed: cycle.observations.len(),
            skipped,
            persisted,
        })
    }

    /// Spawn the timer task. The first cycle runs immediately.
    pub fn start(&self) -> SchedulerHandle {
        let cancel = CancellationToken::new();
        let scheduler = self.clone();
        let stop = cancel.clone();

        info!(
            cities = self.shared.cities.len(),
            period_secs = self.shared.period.as_secs(),
            "scheduler started"
        );

        let task = tokio::spawn(async move {
            let mut ticker = interval(scheduler.shared.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    () = stop.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                // Not raced against `stop`: an in-flight cycle always completes.
                if let Err(err) = scheduler.run_cycle().await {
                    error!(error = %err, "poll cycle failed");
                }
            }

            *scheduler.shared.state.lock() = SchedulerState::Stopped;
            info!(executions = scheduler.executions(), "scheduler stopped");
        });

        SchedulerHandle { scheduler: self.clone(), cancel, task }
    }
}

/// Running timer task returned by [`PollingScheduler::start`].
#[derive(Debug)]
pub struct SchedulerHandle {
    scheduler: PollingScheduler,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn scheduler(&self) -> &PollingScheduler {
        &self.scheduler
    }

    /// Prevent new cycles and wait for the in-flight one to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(err) = self.task.await {
            error!(error = %err, "scheduler task ended abnormally");
        }
    }
}
