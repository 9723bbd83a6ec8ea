//! Main application orchestration.
//!
//! Coordinates:
//! - Telegram long polling for inbound commands and PnL messages
//! - Trigger fires from the registry
//! - Periodic metrics snapshot output

use crate::commands::{execute, Command};
use crate::config::AppConfig;
use crate::error::AppResult;
use crate::service::{SummaryOptions, SummaryService};
use pnl_notify::TelegramClient;
use pnl_persistence::{JsonLinesLedger, JsonSettingsStore};
use pnl_scheduler::{SystemClock, TriggerFired, TriggerRegistry};
use pnl_telemetry::Metrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Metrics snapshot output interval (1 hour).
const STATS_INTERVAL: Duration = Duration::from_secs(3600);

/// Delay before polling again after a failed `getUpdates`.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Main application.
pub struct Application {
    config: AppConfig,
    service: SummaryService,
    telegram: Arc<TelegramClient>,
    fire_rx: mpsc::Receiver<TriggerFired>,
}

impl Application {
    /// Create a new application.
    ///
    /// Must run inside a tokio runtime: the trigger registry binds to it and
    /// fails with `SchedulingUnavailable` otherwise.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        let default_timezone = config.default_timezone()?;

        let ledger = Arc::new(JsonLinesLedger::open(&config.persistence.ledger_path)?);
        let settings = Arc::new(JsonSettingsStore::open(&config.persistence.settings_path)?);
        let telegram = Arc::new(TelegramClient::new(
            config.telegram.api_url.clone(),
            config.telegram.bot_token.clone(),
            Duration::from_secs(config.telegram.request_timeout_secs),
        )?);

        let (fire_tx, fire_rx) = mpsc::channel::<TriggerFired>(16);
        let registry = Arc::new(TriggerRegistry::new(Arc::new(SystemClock), fire_tx)?);

        let service = SummaryService::new(
            ledger,
            settings,
            telegram.clone(),
            registry,
            Arc::new(SystemClock),
            SummaryOptions {
                destination: config.telegram.chat_id.clone(),
                default_timezone,
            },
        );

        Ok(Self {
            config,
            service,
            telegram,
            fire_rx,
        })
    }

    /// Run until ctrl-c.
    pub async fn run(mut self) -> AppResult<()> {
        if let Some((role, fire_at)) = self.service.restore()? {
            info!(role = %role, first_fire = %fire_at, "Trigger restored from settings");
        }

        let (message_tx, mut message_rx) = mpsc::channel::<String>(64);
        let poller = self.spawn_poller(message_tx);

        info!("Entering main event loop");
        let mut stats_interval = tokio::time::interval(STATS_INTERVAL);
        // First tick completes immediately
        stats_interval.tick().await;

        loop {
            tokio::select! {
                Some(event) = self.fire_rx.recv() => {
                    self.handle_fire(event).await;
                }

                Some(text) = message_rx.recv() => {
                    self.handle_message(&text).await;
                }

                _ = stats_interval.tick() => {
                    info!(metrics = ?Metrics::snapshot(), "Periodic statistics");
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        poller.abort();
        self.service.registry().shutdown();
        info!(metrics = ?Metrics::snapshot(), "Final statistics");

        Ok(())
    }

    async fn handle_fire(&self, event: TriggerFired) {
        if !self.service.registry().is_current(&event) {
            debug!(
                role = %event.role,
                generation = event.generation,
                "Dropping fire from a replaced trigger"
            );
            return;
        }

        match self.service.on_trigger_fired(event.role).await {
            Ok(outcome) => info!(
                role = %event.role,
                scheduled_for = %event.scheduled_for,
                ?outcome,
                "Trigger handled"
            ),
            Err(e) => error!(role = %event.role, error = %e, "Trigger handling failed"),
        }
    }

    async fn handle_message(&self, text: &str) {
        let Some(command) = Command::parse(text) else {
            return;
        };
        debug!(?command, "Command received");

        if let Some(reply) = execute(&self.service, command).await {
            if let Err(e) = self
                .telegram
                .send_message(&self.config.telegram.chat_id, &reply)
                .await
            {
                warn!(error = %e, "Failed to send reply");
            }
        }
    }

    /// Long-poll `getUpdates` and forward text from the configured chat.
    fn spawn_poller(&self, message_tx: mpsc::Sender<String>) -> JoinHandle<()> {
        let telegram = self.telegram.clone();
        let chat_id = self.config.telegram.chat_id.trim().to_string();
        let poll_timeout = self.config.telegram.poll_timeout_secs;

        tokio::spawn(async move {
            let mut offset: Option<i64> = None;
            loop {
                let updates = match telegram.get_updates(offset, poll_timeout).await {
                    Ok(updates) => updates,
                    Err(e) => {
                        warn!(error = %e, "getUpdates failed, retrying");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                        continue;
                    }
                };

                for update in updates {
                    offset = Some(update.update_id + 1);
                    let Some((chat, text)) = update.text_message() else {
                        continue;
                    };
                    if chat.to_string() != chat_id {
                        debug!(chat, "Ignoring message from another chat");
                        continue;
                    }
                    if message_tx.send(text.to_string()).await.is_err() {
                        return;
                    }
                }
            }
        })
    }
}
