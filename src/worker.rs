//! Per-account worker
//!
//! One worker owns one account's lifecycle: a stable browser identity, a
//! cookie store, and an HTTP transport, plus the session exchange and the
//! keep-alive ping loop built on top of them. Workers share nothing with each
//! other; one account's failure never reaches another worker or the caller.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::cookie::Jar;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::{AccountSession, SessionClient, SessionError};
use crate::ping::PingSender;
use crate::proxy::{ProxyChecker, ProxyConfig, ProxyError};
use crate::stats::KeeperStats;
use crate::AppConfig;

/// Worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Authenticating,
    Active,
    Stopped,
}

/// Worker construction error types
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("failed to build HTTP transport: {0}")]
    Transport(String),

    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

/// The per-account runtime unit managing one session and its ping timer.
pub struct Worker {
    token: String,
    proxy: Option<ProxyConfig>,
    /// Stable identity reported as `browser_id` in every ping
    browser_id: Uuid,
    browser_id_str: String,
    session_client: SessionClient,
    ping_sender: PingSender,
    checker: ProxyChecker,
    retry_interval: Duration,
    state: Mutex<WorkerState>,
    ping_task: Mutex<Option<JoinHandle<()>>>,
    shutdown: CancellationToken,
    stats: Arc<KeeperStats>,
}

impl Worker {
    /// Build a worker and its transport.
    ///
    /// The cookie jar is installed on the transport here, once, so session
    /// cookies persist from the exchange into every subsequent ping. The
    /// proxy, when present, is translated here as well; both calls route the
    /// same way.
    pub fn new(
        config: &AppConfig,
        token: String,
        proxy: Option<ProxyConfig>,
        shutdown: CancellationToken,
        stats: Arc<KeeperStats>,
    ) -> Result<Self, WorkerError> {
        let jar = Arc::new(Jar::default());

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .cookie_provider(jar)
            .user_agent(config.user_agent.as_str());

        if let Some(proxy) = &proxy {
            builder = builder.proxy(proxy.to_reqwest()?);
        }

        let client = builder
            .build()
            .map_err(|e| WorkerError::Transport(e.to_string()))?;

        let browser_id = Uuid::new_v4();

        Ok(Self {
            token,
            proxy,
            browser_id,
            browser_id_str: browser_id.to_string(),
            session_client: SessionClient::new(client.clone(), config.session_url.clone()),
            ping_sender: PingSender::new(client, config.ping_url.clone()),
            checker: ProxyChecker::new(
                config.ip_check_url.clone(),
                Duration::from_secs(config.request_timeout_secs),
            ),
            retry_interval: Duration::from_millis(config.retry_interval),
            state: Mutex::new(WorkerState::Idle),
            ping_task: Mutex::new(None),
            shutdown,
            stats,
        })
    }

    /// The worker's stable browser identity
    pub fn browser_id(&self) -> Uuid {
        self.browser_id
    }

    /// Current lifecycle state
    pub fn state(&self) -> WorkerState {
        *self.state.lock()
    }

    /// Whether a ping loop is currently armed and running
    pub fn is_active(&self) -> bool {
        self.ping_task
            .lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    fn proxy_label(&self) -> &str {
        self.proxy
            .as_ref()
            .map(|p| p.host.as_str())
            .unwrap_or("direct")
    }

    /// Authenticate and arm the ping loop. Fire and forget.
    ///
    /// Every failure is caught here, logged, and the worker left Stopped;
    /// authentication failures are not retried (they are not transient the
    /// way a single ping miss is).
    pub async fn connect(self: Arc<Self>) {
        if let Err(e) = Self::try_connect(&self).await {
            error!(
                browser_id = %self.browser_id_str,
                proxy = self.proxy_label(),
                error = %e,
                "Connection error"
            );
            *self.state.lock() = WorkerState::Stopped;
        }
    }

    async fn try_connect(this: &Arc<Self>) -> Result<(), SessionError> {
        *this.state.lock() = WorkerState::Authenticating;

        if let Some(proxy) = &this.proxy {
            match this.checker.check(proxy).await {
                Ok(ip) => info!(proxy = %proxy.url(), exit_ip = %ip, "Proxy verified"),
                Err(e) => warn!(error = %e, "Proxy check failed - connection may fail"),
            }
        }

        let session = this.session_client.get_session(&this.token).await?;

        info!(
            uid = %session.uid,
            name = %session.name,
            proxy = this.proxy_label(),
            "Connected to session"
        );
        this.stats.record_session();

        *this.state.lock() = WorkerState::Active;
        Self::arm_ping_loop(this, session);
        Ok(())
    }

    /// Arm the ping loop, replacing any previously armed one.
    ///
    /// A second `connect()` on an Active worker lands here and aborts the
    /// old task first, so one worker never drives two timers.
    pub(crate) fn arm_ping_loop(this: &Arc<Self>, session: AccountSession) {
        let mut slot = this.ping_task.lock();
        if let Some(previous) = slot.take() {
            warn!(uid = %session.uid, "Replacing an already armed ping loop");
            previous.abort();
        }

        let worker = Arc::clone(this);
        *slot = Some(tokio::spawn(async move {
            let uid = session.uid.clone();
            let result =
                std::panic::AssertUnwindSafe(worker.run_ping_loop(session));

            use futures::FutureExt;
            if let Err(panic_info) = result.catch_unwind().await {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };

                error!(uid = %uid, panic = %panic_msg, "Ping loop panicked");
                worker.stats.remove_worker();
                *worker.state.lock() = WorkerState::Stopped;
            }
        }));
    }

    /// Drive the fixed-interval ping timer until cancelled.
    ///
    /// The first tick fires one full interval after activation. Delayed tick
    /// behavior serializes sends per worker: a slow ping pushes the next tick
    /// out instead of stacking in-flight requests.
    async fn run_ping_loop(&self, session: AccountSession) {
        self.stats.add_worker();

        let mut interval = time::interval_at(
            Instant::now() + self.retry_interval,
            self.retry_interval,
        );
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = interval.tick() => {
                    match self
                        .ping_sender
                        .send(&session, &self.token, &self.browser_id_str)
                        .await
                    {
                        Ok(outcome) => {
                            self.stats.record_ping();
                            info!(
                                uid = %session.uid,
                                browser_id = %self.browser_id_str,
                                ip = self.proxy_label(),
                                ip_score = outcome.ip_score,
                                response = %outcome.payload,
                                "Ping sent"
                            );
                        }
                        Err(e) => {
                            // A single failed tick never stops the loop; the
                            // timer itself is the retry mechanism.
                            self.stats.record_ping_failure();
                            error!(uid = %session.uid, error = %e, "Ping error");
                        }
                    }
                }
            }
        }

        self.stats.remove_worker();
        *self.state.lock() = WorkerState::Stopped;
        info!(uid = %session.uid, "Ping loop stopped");
    }

    /// Cancel the worker's timer, if any. Idempotent; safe to call on a
    /// worker that never connected.
    pub fn stop(&self) {
        if let Some(handle) = self.ping_task.lock().take() {
            handle.abort();
        }
        *self.state.lock() = WorkerState::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::ShutdownCoordinator;

    fn test_config() -> AppConfig {
        AppConfig {
            // Interval long enough that no tick fires during a test
            retry_interval: 60_000,
            ..AppConfig::default()
        }
    }

    fn build_worker(coordinator: &ShutdownCoordinator) -> Arc<Worker> {
        Arc::new(
            Worker::new(
                &test_config(),
                "token".to_string(),
                None,
                coordinator.register(),
                Arc::new(KeeperStats::new()),
            )
            .unwrap(),
        )
    }

    fn session(uid: &str) -> AccountSession {
        serde_json::from_value(serde_json::json!({ "uid": uid, "name": "t" })).unwrap()
    }

    #[tokio::test]
    async fn test_browser_id_is_stable_and_distinct() {
        let coordinator = ShutdownCoordinator::new();
        let first = build_worker(&coordinator);
        let second = build_worker(&coordinator);

        assert_eq!(first.browser_id(), first.browser_id());
        assert_ne!(first.browser_id(), second.browser_id());
    }

    #[tokio::test]
    async fn test_stop_without_connect_is_harmless() {
        let coordinator = ShutdownCoordinator::new();
        let worker = build_worker(&coordinator);

        assert_eq!(worker.state(), WorkerState::Idle);
        worker.stop();
        worker.stop();
        assert_eq!(worker.state(), WorkerState::Stopped);
        assert!(!worker.is_active());
    }

    #[tokio::test]
    async fn test_rearming_keeps_a_single_timer() {
        let coordinator = ShutdownCoordinator::new();
        let worker = build_worker(&coordinator);

        Worker::arm_ping_loop(&worker, session("u-1"));
        Worker::arm_ping_loop(&worker, session("u-1"));
        assert!(worker.is_active());

        coordinator.trigger();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!worker.is_active());
        assert_eq!(worker.state(), WorkerState::Stopped);
    }

    #[tokio::test]
    async fn test_shutdown_token_stops_the_loop() {
        let coordinator = ShutdownCoordinator::new();
        let worker = build_worker(&coordinator);

        Worker::arm_ping_loop(&worker, session("u-2"));
        assert!(worker.is_active());

        coordinator.trigger();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!worker.is_active());
    }
}
