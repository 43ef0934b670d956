//! Daily late loan notifier

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use tokio::task::JoinHandle;

use crate::{config::SchedulerConfig, error::AppResult};

use super::{email::EmailSender, loans::LoansService};

pub const LATE_LOANS_SUBJECT: &str = "Book loan overdue";

#[derive(Clone)]
pub struct LateLoanNotifier {
    loans: LoansService,
    mailer: Arc<dyn EmailSender>,
    config: SchedulerConfig,
}

impl LateLoanNotifier {
    pub fn new(loans: LoansService, mailer: Arc<dyn EmailSender>, config: SchedulerConfig) -> Self {
        Self {
            loans,
            mailer,
            config,
        }
    }

    /// Mail every customer with a late loan. Returns the number of recipients.
    pub async fn send_mail_to_late_loans(&self) -> AppResult<usize> {
        let late_loans = self.loans.get_all_late_loans().await?;

        let mut recipients: Vec<String> = late_loans
            .into_iter()
            .filter_map(|loan| loan.customer_email)
            .filter(|email| !email.trim().is_empty())
            .collect();
        recipients.sort();
        recipients.dedup();

        if recipients.is_empty() {
            tracing::info!("No late loans to notify");
            return Ok(0);
        }

        self.mailer
            .send_mails(&recipients, LATE_LOANS_SUBJECT, &self.config.late_loans_message)
            .await?;

        Ok(recipients.len())
    }

    /// Run the notifier once a day at the configured time, forever
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let wait = until_next_run(Utc::now(), self.config.run_at);
                tracing::debug!("Next late loan run in {}s", wait.as_secs());
                tokio::time::sleep(wait).await;

                match self.send_mail_to_late_loans().await {
                    Ok(count) => tracing::info!("Late loan run notified {} customer(s)", count),
                    Err(e) => tracing::error!("Late loan run failed: {}", e),
                }
            }
        })
    }
}

/// Time left until the next occurrence of `run_at` (UTC), strictly in the future
pub fn until_next_run(now: DateTime<Utc>, run_at: NaiveTime) -> std::time::Duration {
    let mut next = now.date_naive().and_time(run_at).and_utc();
    if next <= now {
        next += Duration::days(1);
    }
    (next - now).to_std().unwrap_or_default()
}
