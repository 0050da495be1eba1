use crate::{FleetEvent, FleetMonitor, PollData, PollPipeline, Result, SyncError};
use fcat_fleet::{AlertThresholds, DEFAULT_OVERRIDE_THRESHOLD};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub interval: Duration,
    /// Upper bound on a single poll; overruns become transient failures.
    pub deadline: Duration,
    pub channels: Vec<String>,
    pub override_threshold: f64,
    pub alert_thresholds: AlertThresholds,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            deadline: Duration::from_secs(45),
            channels: Vec::new(),
            override_threshold: DEFAULT_OVERRIDE_THRESHOLD,
            alert_thresholds: AlertThresholds::default(),
        }
    }
}

/// Countdown state published once per second and around every poll.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshProgress {
    pub polling: bool,
    pub interval_secs: u64,
    pub seconds_remaining: u64,
    #[serde(skip)]
    pub last_success: Option<SystemTime>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    pub skipped_ticks: u64,
}

impl RefreshProgress {
    fn initial(interval: Duration) -> Self {
        Self {
            polling: false,
            interval_secs: interval.as_secs(),
            seconds_remaining: 0,
            last_success: None,
            last_error: None,
            consecutive_failures: 0,
            skipped_ticks: 0,
        }
    }

    /// Elapsed share of the current interval, 0.0 to 1.0.
    #[must_use]
    pub fn fraction_elapsed(&self) -> f64 {
        if self.interval_secs == 0 {
            return 1.0;
        }
        let remaining = self.seconds_remaining.min(self.interval_secs) as f64;
        1.0 - remaining / self.interval_secs as f64
    }
}

enum SchedulerCommand {
    RefreshNow,
    SetChannels(Vec<String>),
    Shutdown,
}

/// Drives the poll pipeline on a fixed interval.
///
/// At most one poll runs at a time; ticks that arrive while a poll is in
/// flight are dropped, not queued.
#[derive(Clone)]
pub struct RefreshScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    command_tx: mpsc::Sender<SchedulerCommand>,
    event_tx: broadcast::Sender<FleetEvent>,
    progress_tx: watch::Sender<RefreshProgress>,
    _progress_guard: watch::Receiver<RefreshProgress>,
}

impl RefreshScheduler {
    /// Spawns the coordinator. The first poll starts immediately.
    #[must_use]
    pub fn start(pipeline: Arc<PollPipeline>, config: SchedulerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (event_tx, _) = broadcast::channel(32);
        let (progress_tx, progress_rx) = watch::channel(RefreshProgress::initial(config.interval));

        spawn_refresh_loop(
            pipeline,
            config,
            command_rx,
            event_tx.clone(),
            progress_tx.clone(),
        );

        Self {
            inner: Arc::new(SchedulerInner {
                command_tx,
                event_tx,
                progress_tx,
                _progress_guard: progress_rx,
            }),
        }
    }

    /// Polls now unless a poll is already running.
    pub async fn refresh_now(&self) -> Result<()> {
        self.send(SchedulerCommand::RefreshNow).await
    }

    /// Replaces the boost channels; the next snapshot rebuilds the hierarchy.
    pub async fn set_channels(&self, channels: Vec<String>) -> Result<()> {
        self.send(SchedulerCommand::SetChannels(channels)).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(SchedulerCommand::Shutdown).await
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<FleetEvent> {
        self.inner.event_tx.subscribe()
    }

    #[must_use]
    pub fn progress(&self) -> watch::Receiver<RefreshProgress> {
        self.inner.progress_tx.subscribe()
    }

    async fn send(&self, command: SchedulerCommand) -> Result<()> {
        self.inner
            .command_tx
            .send(command)
            .await
            .map_err(|_| SyncError::Closed)
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            let _ = self.inner.command_tx.try_send(SchedulerCommand::Shutdown);
        }
    }
}

type PollOutcome = (Result<PollData>, Duration);

fn spawn_poll(
    pipeline: &Arc<PollPipeline>,
    channels: &[String],
    deadline: Duration,
) -> JoinHandle<PollOutcome> {
    let pipeline = Arc::clone(pipeline);
    let channels = channels.to_vec();
    tokio::spawn(async move {
        let started = Instant::now();
        let result = match time::timeout(deadline, pipeline.run(&channels)).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::Deadline(deadline)),
        };
        (result, started.elapsed())
    })
}

fn spawn_refresh_loop(
    pipeline: Arc<PollPipeline>,
    config: SchedulerConfig,
    mut command_rx: mpsc::Receiver<SchedulerCommand>,
    event_tx: broadcast::Sender<FleetEvent>,
    progress_tx: watch::Sender<RefreshProgress>,
) {
    tokio::spawn(async move {
        let mut monitor = FleetMonitor::new(config.override_threshold, config.alert_thresholds);
        let mut channels = config.channels.clone();
        let mut progress = RefreshProgress::initial(config.interval);
        let mut in_flight: Option<JoinHandle<PollOutcome>> = None;

        let mut ticker = time::interval(config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut countdown = time::interval(COUNTDOWN_STEP);
        countdown.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut next_due = Instant::now();

        loop {
            let mut start_poll = false;
            let mut finished = None;

            tokio::select! {
                _ = ticker.tick() => {
                    next_due = Instant::now() + config.interval;
                    start_poll = true;
                }
                _ = countdown.tick() => {}
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(SchedulerCommand::RefreshNow) => {
                            ticker.reset();
                            next_due = Instant::now() + config.interval;
                            start_poll = true;
                        }
                        Some(SchedulerCommand::SetChannels(updated)) => {
                            info!("Boost channels changed; rebuilding hierarchy on next poll");
                            channels = updated;
                            monitor.request_rebuild();
                            start_poll = true;
                        }
                        Some(SchedulerCommand::Shutdown) | None => break,
                    }
                }
                joined = async {
                    match in_flight.as_mut() {
                        Some(handle) => handle.await,
                        None => std::future::pending().await,
                    }
                }, if in_flight.is_some() => {
                    in_flight = None;
                    progress.polling = false;
                    finished = Some(match joined {
                        Ok((Ok(data), elapsed)) => {
                            let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
                            let update = monitor.apply(data, duration_ms);
                            progress.last_success = Some(update.completed_at);
                            progress.last_error = None;
                            progress.consecutive_failures = 0;
                            debug!(
                                "Poll finished in {duration_ms}ms: {} members, {} changes",
                                update.members.len(),
                                update.changes.mutations.len()
                            );
                            FleetEvent::Updated(Box::new(update))
                        }
                        Ok((Err(err), _)) => failure(&mut progress, &err),
                        Err(join_err) => failure(&mut progress, &SyncError::from(join_err)),
                    });
                }
            }

            if start_poll {
                if in_flight.is_some() {
                    progress.skipped_ticks += 1;
                    debug!("Poll still running; skipping refresh");
                } else {
                    progress.polling = true;
                    in_flight = Some(spawn_poll(&pipeline, &channels, config.deadline));
                }
            }

            progress.seconds_remaining = next_due
                .saturating_duration_since(Instant::now())
                .as_secs();
            let _ = progress_tx.send(progress.clone());
            if let Some(event) = finished {
                let _ = event_tx.send(event);
            }
        }

        if let Some(handle) = in_flight.take() {
            handle.abort();
        }
        debug!("Refresh scheduler stopped");
    });
}

fn failure(progress: &mut RefreshProgress, err: &SyncError) -> FleetEvent {
    if err.is_transient() {
        warn!("Poll failed, retrying next cycle: {err}");
    } else {
        error!("Poll failed: {err}");
    }
    progress.last_error = Some(err.to_string());
    progress.consecutive_failures += 1;
    FleetEvent::Failed {
        message: err.to_string(),
        transient: err.is_transient(),
    }
}
