//! Cron scheduler — one background tick-loop task per upserted job, backing
//! the `Cron`/`CronCancel` directives (spec §4.3, §4.1 "Scheduler").

use dashmap::DashMap;
use jido_core::{cron_expr, CronScheduler, CronTask};
use std::str::FromStr;
use std::sync::Arc;

struct Job {
    handle: tokio::task::JoinHandle<()>,
}

/// Drives cron jobs with `tokio::time::sleep` between computed tick times,
/// the same `tokio::time`-based delay idiom the teacher uses for scheduled
/// work (`agenticlaw-agent`), generalized from a one-shot delay to a
/// recurring one driven by a parsed `cron::Schedule`.
///
/// Ticks are computed in UTC. A non-UTC `timezone` is accepted (the wire
/// format allows it) but scheduled as if it were UTC — the teacher's stack
/// has no IANA timezone database crate, and the spec does not require exact
/// wall-clock-in-timezone accuracy, only that the expression's cadence is
/// honored.
#[derive(Default)]
pub struct TokioCronScheduler {
    jobs: DashMap<String, Job>,
}

impl TokioCronScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CronScheduler for TokioCronScheduler {
    fn upsert_job(
        &self,
        name: String,
        expression: String,
        timezone: Option<String>,
        task: CronTask,
    ) -> jido_core::Result<()> {
        let normalized = cron_expr::normalize(&expression)
            .map_err(|e| jido_core::Error::Config(format!("invalid cron expression: {e}")))?;
        let schedule = cron::Schedule::from_str(&normalized)
            .map_err(|e| jido_core::Error::Config(format!("invalid cron expression: {e}")))?;

        if let Some(tz) = &timezone {
            if !tz.eq_ignore_ascii_case("UTC") {
                tracing::warn!(job = %name, timezone = %tz, "non-UTC cron timezone scheduled as UTC");
            }
        }

        let job_name = name.clone();
        let handle = tokio::spawn(async move {
            loop {
                let now = chrono::Utc::now();
                let Some(next) = schedule.upcoming(chrono::Utc).take(1).next() else {
                    tracing::warn!(job = %job_name, "cron schedule has no further ticks");
                    break;
                };
                let delay = (next - now).to_std().unwrap_or(std::time::Duration::ZERO);
                tokio::time::sleep(delay).await;
                task().await;
            }
        });

        self.jobs.insert(name, Job { handle });
        Ok(())
    }

    fn delete_job(&self, name: &str) {
        if let Some((_, job)) = self.jobs.remove(name) {
            job.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn upsert_replaces_the_previous_job() {
        let scheduler = TokioCronScheduler::new();
        let ticks = Arc::new(AtomicUsize::new(0));

        let t1 = ticks.clone();
        scheduler
            .upsert_job(
                "hb".into(),
                "* * * * *".into(),
                None,
                Arc::new(move || {
                    let t1 = t1.clone();
                    Box::pin(async move {
                        t1.fetch_add(1, Ordering::SeqCst);
                    })
                }),
            )
            .unwrap();
        assert_eq!(scheduler.jobs.len(), 1);

        let t2 = ticks.clone();
        scheduler
            .upsert_job(
                "hb".into(),
                "* * * * *".into(),
                None,
                Arc::new(move || {
                    let t2 = t2.clone();
                    Box::pin(async move {
                        t2.fetch_add(10, Ordering::SeqCst);
                    })
                }),
            )
            .unwrap();
        assert_eq!(scheduler.jobs.len(), 1);
    }

    /// Deterministic cron test: rather than a hand-rolled injectable clock,
    /// this leans on `tokio::time`'s own paused/auto-advancing virtual clock
    /// (spec §9's "the scheduler is an injectable collaborator to make
    /// cron-driven tests deterministic" — here the injection point is the
    /// runtime's timer, since every tick wait is a plain `tokio::time::sleep`).
    #[tokio::test(start_paused = true)]
    async fn ticks_fire_repeatedly_as_the_paused_clock_advances() {
        let scheduler = TokioCronScheduler::new();
        let ticks = Arc::new(AtomicUsize::new(0));

        let t = ticks.clone();
        scheduler
            .upsert_job(
                "heartbeat".into(),
                "* * * * * *".into(),
                None,
                Arc::new(move || {
                    let t = t.clone();
                    Box::pin(async move {
                        t.fetch_add(1, Ordering::SeqCst);
                    })
                }),
            )
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_secs(3)).await;
        assert!(ticks.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn an_at_nickname_is_accepted() {
        let scheduler = TokioCronScheduler::new();
        let result = scheduler.upsert_job(
            "midnight-job".into(),
            "@daily".into(),
            None,
            Arc::new(|| Box::pin(async {})),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn invalid_expression_is_rejected() {
        let scheduler = TokioCronScheduler::new();
        let result = scheduler.upsert_job(
            "bad".into(),
            "not a cron expr".into(),
            None,
            Arc::new(|| Box::pin(async {})),
        );
        assert!(result.is_err());
    }

    #[test]
    fn delete_of_unknown_job_is_a_no_op() {
        let scheduler = TokioCronScheduler::new();
        scheduler.delete_job("never-registered");
    }
}
