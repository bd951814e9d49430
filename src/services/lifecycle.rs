//! Event lifecycle background operations
//!
//! The stored status of a live event drifts from reality between reads: the
//! clock moves while the row does not. The sweeper converges them by
//! bulk-completing expired events, so listing exclusion and review
//! eligibility can keep filtering on the stored value. Reminder dispatch
//! shares the schedule: it scans the lookahead window and notifies current
//! participants of upcoming events.
//!
//! Both operations are idempotent single passes; the worker below owns the
//! actual scheduling.

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::database::repositories::{EventRepository, ParticipantRepository, UserRepository};
use crate::services::notification::NotificationService;
use crate::utils::errors::Result;
use crate::utils::logging::log_sweep_result;

/// Lifecycle service exposing one-shot sweep and reminder passes
#[derive(Clone)]
pub struct LifecycleService {
    events: EventRepository,
    participants: ParticipantRepository,
    users: UserRepository,
    notifications: NotificationService,
    reminder_lookahead: Duration,
}

impl LifecycleService {
    /// Create a new LifecycleService instance
    pub fn new(
        events: EventRepository,
        participants: ParticipantRepository,
        users: UserRepository,
        notifications: NotificationService,
        reminder_lookahead: Duration,
    ) -> Self {
        Self {
            events,
            participants,
            users,
            notifications,
            reminder_lookahead,
        }
    }

    /// Transition all expired live events to completed in storage.
    ///
    /// Terminal rows are never touched. Safe to run concurrently with
    /// joins/leaves: a join racing the sweep on a just-expired event may land
    /// either way, which is accepted — stored state converges on the next
    /// pass. Returns the number of events swept.
    pub async fn sweep_expired_events(&self, now: DateTime<Utc>) -> Result<u64> {
        let started = std::time::Instant::now();
        let swept = self.events.complete_expired(now).await?;

        log_sweep_result(swept, started.elapsed().as_millis() as u64);
        Ok(swept)
    }

    /// Send reminders for stored-open events inside the lookahead window.
    ///
    /// Every current participant of a matching event is notified once per
    /// invocation; there is no cross-run dedup, so an event sitting in the
    /// window across two runs reminds its participants twice. Individual
    /// delivery failures are isolated and logged. Returns the number of
    /// reminders sent.
    pub async fn dispatch_reminders(&self, now: DateTime<Utc>) -> Result<u64> {
        let events = self
            .events
            .get_upcoming_open_events(now, self.reminder_lookahead)
            .await?;

        if events.is_empty() {
            debug!("No upcoming events in the reminder window");
            return Ok(0);
        }

        info!(count = events.len(), "Dispatching event reminders");

        let mut sent = 0;
        for event in &events {
            let participants = match self.participants.get_event_participants(event.id).await {
                Ok(participants) => participants,
                Err(e) => {
                    warn!(event_id = event.id, error = %e, "Skipping reminders, participant lookup failed");
                    continue;
                }
            };

            if participants.is_empty() {
                continue;
            }

            let user_ids: Vec<i64> = participants.iter().map(|p| p.user_id).collect();
            let users = match self.users.find_by_ids(&user_ids).await {
                Ok(users) => users,
                Err(e) => {
                    warn!(event_id = event.id, error = %e, "Skipping reminders, user lookup failed");
                    continue;
                }
            };

            sent += self.notifications.send_event_reminder(&users, event).await;
        }

        info!(sent = sent, "Reminder dispatch completed");
        Ok(sent)
    }
}

/// Scheduled worker driving the lifecycle passes.
///
/// The worker owns only the cadence; each tick calls the idempotent one-shot
/// operations above. A failed pass is logged and retried on the next tick,
/// never fatal to the process. Ticks that overlap their interval are skipped.
pub struct LifecycleWorker {
    service: LifecycleService,
    config: SchedulerConfig,
    cancel_token: CancellationToken,
}

impl LifecycleWorker {
    pub fn new(
        service: LifecycleService,
        config: SchedulerConfig,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            service,
            config,
            cancel_token,
        }
    }

    pub async fn run(&self) {
        info!(
            sweep_interval_seconds = self.config.sweep_interval_seconds,
            reminder_interval_seconds = self.config.reminder_interval_seconds,
            "Starting lifecycle worker"
        );

        // Catch events that expired while the process was down
        if self.config.sweep_on_start {
            self.run_sweep().await;
        }

        let mut sweep_tick =
            tokio::time::interval(StdDuration::from_secs(self.config.sweep_interval_seconds));
        let mut reminder_tick =
            tokio::time::interval(StdDuration::from_secs(self.config.reminder_interval_seconds));
        sweep_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        reminder_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Intervals fire immediately; consume the first tick of each so the
        // loop starts with a full period
        sweep_tick.tick().await;
        reminder_tick.tick().await;

        loop {
            tokio::select! {
                _ = sweep_tick.tick() => {
                    self.run_sweep().await;
                }
                _ = reminder_tick.tick() => {
                    self.run_reminders().await;
                }
                _ = self.cancel_token.cancelled() => {
                    info!("Lifecycle worker received cancellation");
                    break;
                }
            }
        }
    }

    async fn run_sweep(&self) {
        if let Err(e) = self.service.sweep_expired_events(Utc::now()).await {
            error!(error = %e, "Lifecycle sweep failed, will retry on next tick");
        }
    }

    async fn run_reminders(&self) {
        if let Err(e) = self.service.dispatch_reminders(Utc::now()).await {
            error!(error = %e, "Reminder dispatch failed, will retry on next tick");
        }
    }
}
