use tokio::time::{sleep_until, Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimerId(usize);

#[derive(Debug)]
struct Timer {
    id: TimerId,
    deadline: Instant,
    period: Option<Duration>,
}

/// Cooperative timer queue for a single wait loop.
///
/// `next` resolves to the due timer with the earliest deadline, ties going to
/// the timer registered first. Periodic timers run at a fixed rate from the
/// moment they were added; periods missed while the caller was busy collapse
/// into a single firing.
#[derive(Debug, Default)]
pub struct Scheduler {
    timers: Vec<Timer>,
    registered: usize,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&mut self, delay: Duration, period: Option<Duration>) -> TimerId {
        let id = TimerId(self.registered);
        self.registered += 1;
        self.timers.push(Timer {
            id,
            deadline: Instant::now() + delay,
            period,
        });
        id
    }

    /// Fires once after `delay`.
    pub fn add_timer(&mut self, delay: Duration) -> TimerId {
        self.register(delay, None)
    }

    /// Fires every `period`, first after one full period.
    pub fn add_periodic_timer(&mut self, period: Duration) -> TimerId {
        self.register(period, Some(period))
    }

    pub fn cancel(&mut self, id: TimerId) {
        self.timers.retain(|timer| timer.id != id);
    }

    /// Clears every timer; `next` returns `None` afterwards.
    pub fn stop(&mut self) {
        self.timers.clear();
    }

    pub fn is_stopped(&self) -> bool {
        self.timers.is_empty()
    }

    pub async fn next(&mut self) -> Option<TimerId> {
        let now = Instant::now();
        for timer in &mut self.timers {
            if let Some(period) = timer.period {
                while timer.deadline + period <= now {
                    timer.deadline += period;
                }
            }
        }

        let index = self
            .timers
            .iter()
            .enumerate()
            .min_by_key(|(_, timer)| (timer.deadline, timer.id))
            .map(|(index, _)| index)?;

        sleep_until(self.timers[index].deadline).await;

        let timer = &mut self.timers[index];
        let id = timer.id;
        match timer.period {
            Some(period) => timer.deadline += period,
            None => {
                self.timers.remove(index);
            }
        }
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ties_follow_registration_order() {
        let mut scheduler = Scheduler::new();
        let start = Instant::now();
        let periodic = scheduler.add_periodic_timer(Duration::from_secs(5));
        let once = scheduler.add_timer(Duration::from_secs(10));

        // Test
        let first = scheduler.next().await;
        let second = scheduler.next().await;
        let third = scheduler.next().await;

        // Validate
        assert_eq!(first, Some(periodic));
        assert_eq!(second, Some(periodic));
        assert_eq!(third, Some(once));
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missed_periods_collapse_into_one_tick() {
        let mut scheduler = Scheduler::new();
        let start = Instant::now();
        let periodic = scheduler.add_periodic_timer(Duration::from_secs(5));

        // Test
        tokio::time::sleep(Duration::from_secs(12)).await;
        let late = scheduler.next().await;
        let late_at = start.elapsed();
        let on_time = scheduler.next().await;

        // Validate
        assert_eq!(late, Some(periodic));
        assert_eq!(late_at, Duration::from_secs(12));
        assert_eq!(on_time, Some(periodic));
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_clears_all_timers() {
        let mut scheduler = Scheduler::new();
        let once = scheduler.add_timer(Duration::from_millis(100));
        scheduler.add_periodic_timer(Duration::from_secs(5));

        // Test
        assert_eq!(scheduler.next().await, Some(once));
        scheduler.stop();

        // Validate
        assert!(scheduler.is_stopped());
        assert_eq!(scheduler.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_removes_single_timer() {
        let mut scheduler = Scheduler::new();
        let first = scheduler.add_timer(Duration::from_secs(1));
        let second = scheduler.add_timer(Duration::from_secs(2));

        // Test
        scheduler.cancel(first);

        // Validate
        assert_eq!(scheduler.next().await, Some(second));
        assert_eq!(scheduler.next().await, None);
    }
}
