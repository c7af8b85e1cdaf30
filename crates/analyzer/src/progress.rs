use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Shape of the synthetic progress curve shown while the backend works.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressCurve {
    pub tick: Duration,
    /// Asymptote, always below 100.
    pub ceiling: f64,
    /// Fraction of the remaining distance covered per tick.
    pub rate: f64,
}

impl Default for ProgressCurve {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(300),
            ceiling: 90.0,
            rate: 0.15,
        }
    }
}

impl ProgressCurve {
    pub fn next(&self, current: f64) -> f64 {
        if current >= self.ceiling {
            return current;
        }
        (current + (self.ceiling - current) * self.rate).min(self.ceiling)
    }
}

/// Owns the task that advances the progress value; the task dies with the guard.
pub struct ProgressTicker {
    handle: JoinHandle<()>,
}

impl ProgressTicker {
    /// Starts ticking. The task also stops by itself once `epoch` moves away from
    /// `started_at`, which is how a clear cuts off a ticker it does not own.
    pub fn start(
        progress: Arc<watch::Sender<f64>>,
        curve: ProgressCurve,
        epoch: Arc<AtomicU64>,
        started_at: u64,
    ) -> Self {
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(curve.tick).await;
                let advanced = progress.send_if_modified(|p| {
                    if epoch.load(Ordering::SeqCst) != started_at {
                        return false;
                    }
                    *p = curve.next(*p);
                    true
                });
                if !advanced {
                    debug!("Progress ticker outlived its analysis, stopping");
                    break;
                }
            }
        });
        Self { handle }
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_approaches_but_never_passes_ceiling() {
        let curve = ProgressCurve::default();
        let mut p = 0.0;
        for _ in 0..1_000 {
            let next = curve.next(p);
            assert!(next >= p);
            assert!(next <= curve.ceiling);
            p = next;
        }
        assert!(p > 89.0);
        assert!(p < 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_advances_and_stops_on_drop() {
        let (tx, rx) = watch::channel(0.0);
        let tx = Arc::new(tx);
        let epoch = Arc::new(AtomicU64::new(0));

        let ticker = ProgressTicker::start(tx.clone(), ProgressCurve::default(), epoch, 0);
        tokio::time::sleep(Duration::from_millis(950)).await;
        let advanced = *rx.borrow();
        assert!(advanced > 0.0);
        assert!(advanced < 90.0);

        ticker.stop();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(*rx.borrow(), advanced);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_stops_when_epoch_moves() {
        let (tx, rx) = watch::channel(0.0);
        let epoch = Arc::new(AtomicU64::new(3));

        let _ticker = ProgressTicker::start(Arc::new(tx), ProgressCurve::default(), epoch.clone(), 3);
        epoch.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(*rx.borrow(), 0.0);
    }
}
