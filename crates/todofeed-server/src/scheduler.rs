//! Background scheduler for periodic feed syncs.
//!
//! Runs the sync function on a configurable interval with jitter, backs
//! off exponentially on consecutive failures, and applies a cooldown to
//! manual refreshes so a misbehaving caller cannot hammer the note API.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Base interval between syncs.
    pub sync_interval: Duration,
    /// Maximum jitter added to the interval, as a fraction 0.0-1.0.
    pub jitter_fraction: f64,
    /// Cooldown applied after a manual refresh.
    pub refresh_cooldown: Duration,
    /// Initial backoff duration on error.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub backoff_multiplier: f64,
    /// Consecutive failures after which syncs are suspended.
    pub max_consecutive_failures: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sync_interval: Duration::from_secs(1800),
            jitter_fraction: 0.1,
            refresh_cooldown: Duration::from_secs(30),
            initial_backoff: Duration::from_secs(5),
            max_backoff: Duration::from_secs(600),
            backoff_multiplier: 2.0,
            max_consecutive_failures: 10,
        }
    }
}

impl SchedulerConfig {
    /// Creates a config with the given sync interval.
    pub fn new(sync_interval: Duration) -> Self {
        Self {
            sync_interval,
            ..Default::default()
        }
    }

    /// Builder: set jitter fraction.
    #[must_use]
    pub fn with_jitter(mut self, fraction: f64) -> Self {
        self.jitter_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    /// Builder: set refresh cooldown.
    #[must_use]
    pub fn with_refresh_cooldown(mut self, cooldown: Duration) -> Self {
        self.refresh_cooldown = cooldown;
        self
    }

    /// Builder: set backoff parameters.
    #[must_use]
    pub fn with_backoff(mut self, initial: Duration, max: Duration, multiplier: f64) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self.backoff_multiplier = multiplier;
        self
    }

    /// The next sync delay with jitter applied.
    pub fn next_sync_delay(&self) -> Duration {
        let base = self.sync_interval.as_secs_f64();
        let jitter = rand_jitter(base * self.jitter_fraction);
        Duration::from_secs_f64(base + jitter)
    }

    /// The backoff delay for the given failure streak.
    pub fn backoff_delay(&self, consecutive_failures: u32) -> Duration {
        if consecutive_failures == 0 {
            return Duration::ZERO;
        }
        let base = self.initial_backoff.as_secs_f64();
        let delay = base * self.backoff_multiplier.powi(consecutive_failures as i32 - 1);
        Duration::from_secs_f64(delay.min(self.max_backoff.as_secs_f64()))
    }
}

/// Clock-derived jitter in [-range, range]. Good enough for spreading
/// sync times; no need for a real RNG here.
fn rand_jitter(range: f64) -> f64 {
    use std::time::SystemTime;

    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();

    let fraction = f64::from(nanos) / 1_000_000_000.0;
    (fraction * 2.0 - 1.0) * range
}

/// Commands accepted by a running scheduler.
#[derive(Debug, Clone)]
pub enum SchedulerCommand {
    /// Trigger an immediate sync.
    SyncNow,
    /// Trigger a sync, bypassing cooldown if force is true.
    Refresh { force: bool },
    /// Stop the scheduler.
    Stop,
}

/// Observable scheduler state.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    /// Number of consecutive sync failures.
    pub consecutive_failures: u32,
    /// Last successful sync time.
    pub last_sync: Option<DateTime<Utc>>,
    /// Last sync attempt time.
    pub last_attempt: Option<DateTime<Utc>>,
    /// Last error message.
    pub last_error: Option<String>,
    /// Last manual refresh time, for cooldown.
    pub last_refresh: Option<Instant>,
}

impl SchedulerState {
    /// Records a successful sync.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.last_sync = Some(Utc::now());
        self.last_attempt = self.last_sync;
        self.last_error = None;
    }

    /// Records a failed sync.
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.consecutive_failures += 1;
        self.last_attempt = Some(Utc::now());
        self.last_error = Some(error.into());
    }

    /// Records a manual refresh.
    pub fn record_refresh(&mut self) {
        self.last_refresh = Some(Instant::now());
    }

    /// True while the refresh cooldown is active.
    pub fn in_cooldown(&self, cooldown: Duration) -> bool {
        self.last_refresh
            .is_some_and(|last| last.elapsed() < cooldown)
    }
}

/// Shared scheduler state.
pub type SharedSchedulerState = Arc<RwLock<SchedulerState>>;

/// The scheduler drives the periodic sync loop.
pub struct Scheduler {
    config: SchedulerConfig,
    state: SharedSchedulerState,
    command_tx: mpsc::Sender<SchedulerCommand>,
    command_rx: Option<mpsc::Receiver<SchedulerCommand>>,
}

impl Scheduler {
    /// Creates a scheduler with the given configuration.
    pub fn new(config: SchedulerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        Self {
            config,
            state: Arc::new(RwLock::new(SchedulerState::default())),
            command_tx,
            command_rx: Some(command_rx),
        }
    }

    /// Returns a handle for sending commands to the scheduler.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            command_tx: self.command_tx.clone(),
            state: self.state.clone(),
        }
    }

    /// Returns the shared state.
    pub fn state(&self) -> SharedSchedulerState {
        self.state.clone()
    }

    /// Runs the scheduler loop until stopped, calling `sync_fn` for each
    /// sync. The function returns Ok on success or an error message.
    pub async fn run<F, Fut>(mut self, sync_fn: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), String>> + Send,
    {
        let mut command_rx = self.command_rx.take().expect("run called twice");

        info!(
            interval_secs = self.config.sync_interval.as_secs(),
            "scheduler started"
        );

        // Sync once on startup before entering the interval loop.
        self.do_sync(&sync_fn).await;

        loop {
            let delay = self.next_delay().await;
            debug!(delay_secs = delay.as_secs(), "next sync scheduled");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    self.do_sync(&sync_fn).await;
                }
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(SchedulerCommand::SyncNow) => {
                            debug!("sync requested");
                            self.do_sync(&sync_fn).await;
                        }
                        Some(SchedulerCommand::Refresh { force }) => {
                            let in_cooldown = self
                                .state
                                .read()
                                .await
                                .in_cooldown(self.config.refresh_cooldown);
                            if force || !in_cooldown {
                                self.state.write().await.record_refresh();
                                self.do_sync(&sync_fn).await;
                            } else {
                                debug!("refresh skipped, cooldown active");
                            }
                        }
                        Some(SchedulerCommand::Stop) | None => {
                            info!("scheduler stopping");
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn next_delay(&self) -> Duration {
        let state = self.state.read().await;

        if state.consecutive_failures > 0 {
            let backoff = self.config.backoff_delay(state.consecutive_failures);
            debug!(
                failures = state.consecutive_failures,
                backoff_secs = backoff.as_secs(),
                "backing off"
            );
            return backoff;
        }

        if state.in_cooldown(self.config.refresh_cooldown)
            && let Some(last_refresh) = state.last_refresh
        {
            let remaining = self.config.refresh_cooldown - last_refresh.elapsed();
            return remaining.max(self.config.next_sync_delay());
        }

        self.config.next_sync_delay()
    }

    async fn do_sync<F, Fut>(&self, sync_fn: &F)
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<(), String>>,
    {
        let failures = self.state.read().await.consecutive_failures;
        if failures >= self.config.max_consecutive_failures {
            error!(
                failures,
                max = self.config.max_consecutive_failures,
                "failure limit reached, sync suspended"
            );
            return;
        }

        match sync_fn().await {
            Ok(()) => {
                info!("sync completed");
                self.state.write().await.record_success();
            }
            Err(e) => {
                warn!(error = %e, "sync failed");
                self.state.write().await.record_failure(e);
            }
        }
    }
}

/// Handle for controlling a running scheduler.
#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
    state: SharedSchedulerState,
}

impl SchedulerHandle {
    /// Triggers an immediate sync.
    pub async fn sync_now(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::SyncNow).await
    }

    /// Triggers a refresh, respecting cooldown unless forced.
    pub async fn refresh(
        &self,
        force: bool,
    ) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx
            .send(SchedulerCommand::Refresh { force })
            .await
    }

    /// Stops the scheduler.
    pub async fn stop(&self) -> Result<(), mpsc::error::SendError<SchedulerCommand>> {
        self.command_tx.send(SchedulerCommand::Stop).await
    }

    /// Returns a snapshot of the scheduler state.
    pub async fn state(&self) -> SchedulerState {
        self.state.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn config_default() {
        let config = SchedulerConfig::default();
        assert_eq!(config.sync_interval, Duration::from_secs(1800));
        assert!(config.jitter_fraction > 0.0);
    }

    #[test]
    fn next_sync_delay_stays_within_jitter() {
        let config = SchedulerConfig::new(Duration::from_secs(60)).with_jitter(0.1);

        let delay = config.next_sync_delay();
        assert!(delay.as_secs_f64() >= 54.0);
        assert!(delay.as_secs_f64() <= 66.0);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let config = SchedulerConfig::default().with_backoff(
            Duration::from_secs(5),
            Duration::from_secs(600),
            2.0,
        );

        assert_eq!(config.backoff_delay(0), Duration::ZERO);
        assert_eq!(config.backoff_delay(1), Duration::from_secs(5));
        assert_eq!(config.backoff_delay(2), Duration::from_secs(10));
        assert_eq!(config.backoff_delay(3), Duration::from_secs(20));
        assert_eq!(config.backoff_delay(12), Duration::from_secs(600));
    }

    #[test]
    fn state_success_clears_failures() {
        let mut state = SchedulerState::default();
        state.consecutive_failures = 5;

        state.record_success();

        assert_eq!(state.consecutive_failures, 0);
        assert!(state.last_sync.is_some());
        assert!(state.last_error.is_none());
    }

    #[test]
    fn state_failure_accumulates() {
        let mut state = SchedulerState::default();

        state.record_failure("fetch failed");

        assert_eq!(state.consecutive_failures, 1);
        assert!(state.last_attempt.is_some());
        assert_eq!(state.last_error, Some("fetch failed".to_string()));
    }

    #[test]
    fn cooldown_expires() {
        let mut state = SchedulerState::default();
        let cooldown = Duration::from_millis(50);

        assert!(!state.in_cooldown(cooldown));
        state.record_refresh();
        assert!(state.in_cooldown(cooldown));

        std::thread::sleep(Duration::from_millis(60));
        assert!(!state.in_cooldown(cooldown));
    }

    #[tokio::test]
    async fn scheduler_runs_and_stops() {
        let scheduler = Scheduler::new(SchedulerConfig::new(Duration::from_secs(60)));
        let handle = scheduler.handle();

        let sync_count = Arc::new(AtomicU32::new(0));
        let sync_count_clone = sync_count.clone();

        let task = tokio::spawn(async move {
            scheduler
                .run(move || {
                    let count = sync_count_clone.clone();
                    async move {
                        count.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                })
                .await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sync_count.load(Ordering::SeqCst) >= 1);

        handle.sync_now().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sync_count.load(Ordering::SeqCst) >= 2);

        handle.stop().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn scheduler_recovers_after_failures() {
        let config = SchedulerConfig::new(Duration::from_secs(1)).with_backoff(
            Duration::from_millis(10),
            Duration::from_millis(100),
            2.0,
        );

        let scheduler = Scheduler::new(config);
        let handle = scheduler.handle();

        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let task = tokio::spawn(async move {
            scheduler
                .run(move || {
                    let count = attempts_clone.clone();
                    async move {
                        let n = count.fetch_add(1, Ordering::SeqCst);
                        if n < 3 { Err(format!("failure {n}")) } else { Ok(()) }
                    }
                })
                .await;
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(attempts.load(Ordering::SeqCst) >= 3);

        handle.stop().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn refresh_respects_cooldown() {
        let config = SchedulerConfig::new(Duration::from_secs(60))
            .with_refresh_cooldown(Duration::from_secs(60));
        let scheduler = Scheduler::new(config);
        let handle = scheduler.handle();

        let sync_count = Arc::new(AtomicU32::new(0));
        let sync_count_clone = sync_count.clone();

        let task = tokio::spawn(async move {
            scheduler
                .run(move || {
                    let count = sync_count_clone.clone();
                    async move {
                        count.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                })
                .await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        let after_start = sync_count.load(Ordering::SeqCst);

        // First refresh runs, second lands in cooldown, forced one runs.
        handle.refresh(false).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sync_count.load(Ordering::SeqCst), after_start + 1);

        handle.refresh(false).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sync_count.load(Ordering::SeqCst), after_start + 1);

        handle.refresh(true).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sync_count.load(Ordering::SeqCst), after_start + 2);

        handle.stop().await.unwrap();
        task.await.unwrap();
    }
}
