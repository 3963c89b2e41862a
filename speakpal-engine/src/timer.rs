use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Call-duration ticker bound to one session. Stops when dropped.
#[derive(Debug)]
pub struct ElapsedTimer {
    handle: JoinHandle<()>,
}

impl ElapsedTimer {
    /// Spawn on the current tokio runtime; `on_tick` receives the time since spawn.
    pub fn spawn<F>(tick: Duration, mut on_tick: F) -> Self
    where
        F: FnMut(Duration) + Send + 'static,
    {
        let tick = tick.max(Duration::from_millis(10));
        let handle = tokio::spawn(async move {
            let started = Instant::now();
            let mut interval = tokio::time::interval_at(started + tick, tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                on_tick(started.elapsed());
            }
        });
        Self { handle }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for ElapsedTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test(start_paused = true)]
    async fn ticks_until_stopped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_tick = seen.clone();
        let timer = ElapsedTimer::spawn(Duration::from_secs(1), move |elapsed| {
            seen_tick.lock().unwrap().push(elapsed.as_secs());
        });

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        timer.stop();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_ticks() {
        let count = Arc::new(Mutex::new(0u32));
        let count_tick = count.clone();
        let timer = ElapsedTimer::spawn(Duration::from_secs(1), move |_| {
            *count_tick.lock().unwrap() += 1;
        });

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        drop(timer);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(*count.lock().unwrap(), 1);
    }
}
