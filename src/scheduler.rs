//! Once-a-day scheduling of the charge cycle
//!
//! A single background task sleeps until the next firing time, runs the
//! cycle to completion and goes back to sleep. Stopping only prevents
//! future firings; a cycle already in flight finishes normally.

use crate::error::ChargerError;
use crate::metrics;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Work fired by the scheduler
#[async_trait]
pub trait ScheduledTask: Send + Sync + 'static {
    async fn run(&self);
}

/// Fixed UTC time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    time: NaiveTime,
}

impl DailySchedule {
    pub fn new(time: NaiveTime) -> Self {
        Self { time }
    }

    /// First firing strictly after `now`
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = Utc.from_utc_datetime(&now.date_naive().and_time(self.time));
        if today > now {
            today
        } else {
            today + ChronoDuration::days(1)
        }
    }
}

impl Default for DailySchedule {
    /// 00:00:02 UTC
    fn default() -> Self {
        Self::new(NaiveTime::from_hms_opt(0, 0, 2).unwrap_or_default())
    }
}

impl FromStr for DailySchedule {
    type Err = ChargerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M:%S")
            .map(Self::new)
            .map_err(|e| ChargerError::Config(format!("expected HH:MM:SS, got {:?}: {}", s, e)))
    }
}

impl fmt::Display for DailySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.time.format("%H:%M:%S"))
    }
}

struct Running {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Starts and stops the daily schedule
pub struct Scheduler {
    schedule: DailySchedule,
    task: Arc<dyn ScheduledTask>,
    running: Mutex<Option<Running>>,
}

impl Scheduler {
    pub fn new(schedule: DailySchedule, task: Arc<dyn ScheduledTask>) -> Self {
        Self {
            schedule,
            task,
            running: Mutex::new(None),
        }
    }

    pub fn schedule(&self) -> DailySchedule {
        self.schedule
    }

    /// Begin firing daily. Returns `false` if the schedule was already active.
    pub async fn start(&self) -> bool {
        let mut running = self.running.lock().await;
        if let Some(current) = running.as_ref() {
            if !current.handle.is_finished() {
                debug!("Schedule already active");
                return false;
            }
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(run_daily(self.schedule, self.task.clone(), stop_rx));
        *running = Some(Running { stop_tx, handle });

        metrics::record_scheduler_active(true);
        info!("Cron job started, firing daily at {} UTC", self.schedule);
        true
    }

    /// Halt future firings. Returns `false` if nothing was scheduled.
    pub async fn stop(&self) -> bool {
        let stopped = match self.running.lock().await.take() {
            Some(current) => {
                // The loop may already have exited; nothing to signal then
                let _ = current.stop_tx.send(());
                true
            }
            None => false,
        };

        metrics::record_scheduler_active(false);
        if stopped {
            info!("Cron job stopped");
        }
        stopped
    }

    pub async fn is_active(&self) -> bool {
        self.running
            .lock()
            .await
            .as_ref()
            .map(|r| !r.handle.is_finished())
            .unwrap_or(false)
    }
}

async fn run_daily(
    schedule: DailySchedule,
    task: Arc<dyn ScheduledTask>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut last_fired = None;
    loop {
        let now = Utc::now();
        let next = next_firing(schedule, now, last_fired);
        let wait = (next - now).to_std().unwrap_or_default();
        debug!("Next charge cycle at {}", next);

        tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            _ = tokio::time::sleep(wait) => {
                last_fired = Some(next);
                task.run().await;
            }
        }
    }
}

/// Next slot after `now`, never the slot that already fired. The timer can
/// wake before the wall clock reaches the slot.
fn next_firing(
    schedule: DailySchedule,
    now: DateTime<Utc>,
    last_fired: Option<DateTime<Utc>>,
) -> DateTime<Utc> {
    match last_fired {
        Some(slot) if slot >= now => schedule.next_after(slot),
        _ => schedule.next_after(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Counter(AtomicUsize);

    #[async_trait]
    impl ScheduledTask for Counter {
        async fn run(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_next_firing() {
        let schedule = DailySchedule::default();
        assert_eq!(schedule.to_string(), "00:00:02");

        assert_eq!(schedule.next_after(at(0, 0, 1)), at(0, 0, 2));
        assert_eq!(
            schedule.next_after(at(0, 0, 2)) - at(0, 0, 2),
            ChronoDuration::days(1)
        );
        assert_eq!(
            schedule.next_after(at(12, 0, 0)) - at(12, 0, 0),
            ChronoDuration::seconds(12 * 3600 + 2)
        );
        assert_eq!(
            schedule.next_after(at(23, 59, 59)),
            Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 2).unwrap()
        );
    }

    #[test]
    fn test_parse() {
        let schedule: DailySchedule = "06:30:00".parse().unwrap();
        assert_eq!(schedule.to_string(), "06:30:00");
        assert!("6pm".parse::<DailySchedule>().is_err());
        assert!("24:00:00".parse::<DailySchedule>().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let scheduler = Scheduler::new(DailySchedule::default(), counter);

        assert!(!scheduler.is_active().await);
        assert!(scheduler.start().await);
        assert!(!scheduler.start().await);
        assert!(scheduler.is_active().await);

        assert!(scheduler.stop().await);
        assert!(!scheduler.stop().await);
        assert!(!scheduler.is_active().await);
    }

    #[test]
    fn test_fired_slot_is_not_repeated() {
        let schedule = DailySchedule::default();
        let slot = at(0, 0, 2);

        // Woke 5 ms early by the wall clock
        let early = slot - ChronoDuration::milliseconds(5);
        assert_eq!(next_firing(schedule, early, None), slot);
        assert_eq!(
            next_firing(schedule, early, Some(slot)),
            slot + ChronoDuration::days(1)
        );
        assert_eq!(
            next_firing(schedule, at(0, 0, 3), Some(slot)),
            slot + ChronoDuration::days(1)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_when_timer_outruns_wall_clock() {
        // Paused time: sleeps complete instantly while Utc::now() barely moves
        let soon = (Utc::now() + ChronoDuration::seconds(3)).time();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let scheduler = Scheduler::new(DailySchedule::new(soon), counter.clone());

        scheduler.start().await;
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        scheduler.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_until_stopped() {
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let scheduler = Scheduler::new(DailySchedule::default(), counter.clone());

        scheduler.start().await;
        tokio::time::sleep(Duration::from_secs(86_401)).await;
        let fired = counter.0.load(Ordering::SeqCst);
        assert!(fired >= 1);

        scheduler.stop().await;
        tokio::time::sleep(Duration::from_secs(3 * 86_400)).await;
        assert_eq!(counter.0.load(Ordering::SeqCst), fired);
        assert!(!scheduler.is_active().await);
    }
}
