//! Daily digest scheduling
//!
//! Fires the digest job on a cron schedule (evaluated in UTC) until told to
//! stop. The same job backs the one-shot `digest` command.

use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::error::{LearningError, Result};
use crate::notify::PushNotifier;
use crate::service::LearningLog;
use crate::summary::{build_daily_summary, format_summary_message};

/// Parse and validate a cron expression
pub fn parse_cron(expr: &str) -> Result<Schedule> {
    Schedule::from_str(expr)
        .map_err(|e| LearningError::validation(format!("Invalid cron expression '{}': {}", expr, e)))
}

/// What one digest run did
#[derive(Debug, Clone, PartialEq)]
pub enum DigestOutcome {
    /// Message pushed to the recipient
    Sent { recipient: String, message: String },
    /// Message built but not pushed
    DryRun { message: String },
}

impl DigestOutcome {
    pub fn message(&self) -> &str {
        match self {
            DigestOutcome::Sent { message, .. } | DigestOutcome::DryRun { message } => message,
        }
    }
}

/// Build the summary for one user and push it
#[derive(Clone)]
pub struct DigestJob {
    log: LearningLog,
    notifier: Option<Arc<dyn PushNotifier>>,
    recipient: Option<String>,
    user_id: String,
    utc_offset_hours: i32,
}

impl DigestJob {
    pub fn new(log: LearningLog, user_id: impl Into<String>, utc_offset_hours: i32) -> Self {
        Self {
            log,
            notifier: None,
            recipient: None,
            user_id: user_id.into(),
            utc_offset_hours,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn PushNotifier>, recipient: Option<String>) -> Self {
        self.notifier = Some(notifier);
        self.recipient = recipient;
        self
    }

    /// Build today's message, and push it unless `dry_run`
    pub async fn run(&self, dry_run: bool) -> Result<DigestOutcome> {
        self.run_at(Utc::now(), dry_run).await
    }

    pub async fn run_at(&self, now: DateTime<Utc>, dry_run: bool) -> Result<DigestOutcome> {
        let store = self.log.store();
        let phrases = store.fetch_phrases(&self.user_id).await?;
        let corrections = store.fetch_corrections(&self.user_id).await?;

        let summary = build_daily_summary(&phrases, &corrections, now, self.utc_offset_hours);
        debug!(
            "Digest for {} on {}: {} phrases, {} corrections",
            self.user_id,
            summary.date,
            summary.today_phrases.len(),
            summary.today_corrections.len()
        );
        let message = format_summary_message(&summary);

        if dry_run {
            return Ok(DigestOutcome::DryRun { message });
        }

        let notifier = match &self.notifier {
            Some(n) if n.is_configured() => n,
            _ => return Err(LearningError::Notification("Push channel is not configured".to_string())),
        };
        let recipient = self
            .recipient
            .clone()
            .ok_or_else(|| LearningError::Notification("No digest recipient configured".to_string()))?;

        if let Err(e) = notifier.push_text(&recipient, &message).await {
            error!("Digest delivery via {} failed: {}", notifier.name(), e);
            return Err(e);
        }

        info!("Digest delivered via {} to {}", notifier.name(), recipient);
        Ok(DigestOutcome::Sent { recipient, message })
    }
}

/// Runs a [`DigestJob`] at every cron fire time
pub struct DigestScheduler {
    schedule: Schedule,
    job: DigestJob,
}

impl DigestScheduler {
    pub fn new(cron_expr: &str, job: DigestJob) -> Result<Self> {
        Ok(Self {
            schedule: parse_cron(cron_expr)?,
            job,
        })
    }

    /// First fire time strictly after `after`
    pub fn next_run_after(&self, after: &DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(after).next()
    }

    /// Loop until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// Failed runs are logged and the loop moves on to the next fire time.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("Digest scheduler started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let now = Utc::now();
            let Some(next) = self.next_run_after(&now) else {
                warn!("Digest schedule has no upcoming fire time");
                break;
            };
            let wait = (next - now).to_std().unwrap_or_default();
            debug!("Next digest at {} (in {}s)", next, wait.as_secs());

            tokio::select! {
                _ = sleep(wait) => {
                    match self.job.run(false).await {
                        Ok(_) => info!("Scheduled digest completed"),
                        Err(e) => warn!("Scheduled digest failed: {}", e),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Digest scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MockPushNotifier;
    use crate::store::SqliteRecordStore;
    use crate::types::NewPhrase;
    use chrono::TimeZone;
    use std::time::Duration;

    fn sqlite_log() -> LearningLog {
        LearningLog::new(Arc::new(SqliteRecordStore::in_memory().unwrap()))
    }

    #[test]
    fn test_parse_cron() {
        assert!(parse_cron("0 0 12 * * *").is_ok());

        let err = parse_cron("not a cron").unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().starts_with("Invalid cron expression 'not a cron'"));
    }

    #[test]
    fn test_next_run_after() {
        let scheduler = DigestScheduler::new("0 0 12 * * *", DigestJob::new(sqlite_log(), "u", 9)).unwrap();

        let before_noon = Utc.with_ymd_and_hms(2026, 3, 10, 11, 59, 0).unwrap();
        assert_eq!(
            scheduler.next_run_after(&before_noon),
            Some(Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap())
        );

        let after_noon = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(
            scheduler.next_run_after(&after_noon),
            Some(Utc.with_ymd_and_hms(2026, 3, 11, 12, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_dry_run_does_not_push() {
        let log = sqlite_log();
        log.save_phrase(
            "u",
            &NewPhrase {
                english: "break the ice".to_string(),
                japanese: "打ち解ける".to_string(),
                context: String::new(),
            },
        )
        .await
        .unwrap();

        let mut notifier = MockPushNotifier::new();
        notifier.expect_push_text().never();
        let job = DigestJob::new(log, "u", 0).with_notifier(Arc::new(notifier), Some("U1".to_string()));

        let outcome = job.run(true).await.unwrap();
        assert!(matches!(outcome, DigestOutcome::DryRun { .. }));
        assert!(outcome.message().contains("• break the ice"));
    }

    #[tokio::test]
    async fn test_run_pushes_to_recipient() {
        let mut notifier = MockPushNotifier::new();
        notifier.expect_is_configured().return_const(true);
        notifier.expect_name().return_const("mock");
        notifier
            .expect_push_text()
            .withf(|to, text| to == "U1" && text.contains("No learning records today."))
            .times(1)
            .returning(|_, _| Ok(()));

        let job = DigestJob::new(sqlite_log(), "u", 9).with_notifier(Arc::new(notifier), Some("U1".to_string()));
        let outcome = job.run(false).await.unwrap();
        assert!(matches!(outcome, DigestOutcome::Sent { ref recipient, .. } if recipient == "U1"));
    }

    #[tokio::test]
    async fn test_delivery_failure_is_reported() {
        let mut notifier = MockPushNotifier::new();
        notifier.expect_is_configured().return_const(true);
        notifier.expect_name().return_const("mock");
        notifier
            .expect_push_text()
            .times(1)
            .returning(|_, _| Err(LearningError::Notification("rejected".to_string())));

        let job = DigestJob::new(sqlite_log(), "u", 9).with_notifier(Arc::new(notifier), Some("U1".to_string()));
        let err = job.run(false).await.unwrap_err();
        assert!(matches!(err, LearningError::Notification(_)));
    }

    #[tokio::test]
    async fn test_unconfigured_push_fails() {
        let job = DigestJob::new(sqlite_log(), "u", 9);
        assert!(job.run(false).await.is_err());

        let mut notifier = MockPushNotifier::new();
        notifier.expect_is_configured().return_const(true);
        notifier.expect_push_text().never();
        let job = DigestJob::new(sqlite_log(), "u", 9).with_notifier(Arc::new(notifier), None);
        let err = job.run(false).await.unwrap_err();
        assert_eq!(err.to_string(), "Notification failed: No digest recipient configured");
    }

    #[tokio::test]
    async fn test_scheduler_stops_on_shutdown() {
        let scheduler = DigestScheduler::new("0 0 12 * * *", DigestJob::new(sqlite_log(), "u", 9)).unwrap();
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { scheduler.run(rx).await });
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
    }
}
