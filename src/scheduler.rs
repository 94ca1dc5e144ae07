//! Cooperative cycle loop shared by both controllers.
//!
//! One cycle at a time: run, tally, sleep. The loop stops when the
//! cancellation token fires (checked before each cycle and during the sleep)
//! or when a controller reports a fatal error.

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// What one cycle accomplished and how long to wait before the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub successes: u64,
    pub next_wait: Duration,
    /// Set when the cycle's work counts but the run must not continue.
    pub halt: Option<String>,
}

impl CycleReport {
    pub fn new(successes: u64, next_wait: Duration) -> Self {
        Self { successes, next_wait, halt: None }
    }

    pub fn halted(mut self, reason: String) -> Self {
        self.halt = Some(reason);
        self
    }
}

#[async_trait]
pub trait Controller: Send {
    /// Shown in log lines and the summary.
    fn name(&self) -> &'static str;

    /// Label for the success counter ("engagements", "posts created").
    fn success_label(&self) -> &'static str;

    /// Run cycle number `cycle` (1-based). Ordinary failures are absorbed by
    /// the controller; an `Err` or a halted report stops the run.
    async fn run_cycle(&mut self, cycle: u64) -> Result<CycleReport>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub controller: &'static str,
    pub success_label: &'static str,
    pub cycles: u64,
    pub successes: u64,
    pub stop: StopReason,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} finished. Total {}: {}, total cycles: {}",
            self.controller, self.success_label, self.successes, self.cycles
        )?;
        if let StopReason::Failed(reason) = &self.stop {
            write!(f, " (stopped: {})", reason)?;
        }
        Ok(())
    }
}

pub async fn run<C: Controller + ?Sized>(controller: &mut C, cancel: &CancellationToken) -> RunSummary {
    let mut cycles = 0u64;
    let mut successes = 0u64;

    let stop = loop {
        if cancel.is_cancelled() {
            break StopReason::Cancelled;
        }

        cycles += 1;
        tracing::info!(
            controller = controller.name(),
            cycle = cycles,
            at = %chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            "starting cycle"
        );

        let report = match controller.run_cycle(cycles).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(controller = controller.name(), error = %e, "cycle failed, stopping");
                break StopReason::Failed(format!("{:#}", e));
            }
        };
        successes += report.successes;
        tracing::info!(
            controller = controller.name(),
            cycle = cycles,
            cycle_successes = report.successes,
            total = successes,
            "cycle done"
        );

        if let Some(reason) = report.halt {
            tracing::error!(controller = controller.name(), reason = %reason, "stopping run");
            break StopReason::Failed(reason);
        }

        tracing::info!(wait_s = report.next_wait.as_secs_f64(), "waiting until next cycle");
        tokio::select! {
            _ = tokio::time::sleep(report.next_wait) => {}
            _ = cancel.cancelled() => break StopReason::Cancelled,
        }
    };

    RunSummary {
        controller: controller.name(),
        success_label: controller.success_label(),
        cycles,
        successes,
        stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counting {
        succeed_per_cycle: u64,
        cancel_after: u64,
        fail_at: Option<u64>,
        cancel: CancellationToken,
        seen: Vec<u64>,
    }

    #[async_trait]
    impl Controller for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }
        fn success_label(&self) -> &'static str {
            "things"
        }
        async fn run_cycle(&mut self, cycle: u64) -> Result<CycleReport> {
            self.seen.push(cycle);
            if self.fail_at == Some(cycle) {
                anyhow::bail!("boom");
            }
            if cycle == self.cancel_after {
                self.cancel.cancel();
            }
            Ok(CycleReport::new(self.succeed_per_cycle, Duration::ZERO))
        }
    }

    fn counting(cancel: &CancellationToken, cancel_after: u64, fail_at: Option<u64>) -> Counting {
        Counting {
            succeed_per_cycle: 2,
            cancel_after,
            fail_at,
            cancel: cancel.clone(),
            seen: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_runs_until_cancelled_and_tallies() {
        let cancel = CancellationToken::new();
        let mut c = counting(&cancel, 4, None);
        let summary = run(&mut c, &cancel).await;
        assert_eq!(c.seen, vec![1, 2, 3, 4]);
        assert_eq!(summary.cycles, 4);
        assert_eq!(summary.successes, 8);
        assert_eq!(summary.stop, StopReason::Cancelled);
        assert!(summary.to_string().contains("Total things: 8"));
    }

    #[tokio::test]
    async fn test_already_cancelled_runs_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut c = counting(&cancel, 100, None);
        let summary = run(&mut c, &cancel).await;
        assert!(c.seen.is_empty());
        assert_eq!(summary.cycles, 0);
    }

    #[tokio::test]
    async fn test_fatal_cycle_error_stops_run() {
        let cancel = CancellationToken::new();
        let mut c = counting(&cancel, 100, Some(3));
        let summary = run(&mut c, &cancel).await;
        assert_eq!(summary.cycles, 3);
        assert_eq!(summary.successes, 4);
        assert!(matches!(summary.stop, StopReason::Failed(ref m) if m.contains("boom")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_wakes_long_sleep() {
        struct Sleepy;
        #[async_trait]
        impl Controller for Sleepy {
            fn name(&self) -> &'static str {
                "sleepy"
            }
            fn success_label(&self) -> &'static str {
                "naps"
            }
            async fn run_cycle(&mut self, _cycle: u64) -> Result<CycleReport> {
                Ok(CycleReport::new(0, Duration::from_secs(3600)))
            }
        }

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            trigger.cancel();
        });
        let summary = run(&mut Sleepy, &cancel).await;
        assert_eq!(summary.cycles, 1);
        assert_eq!(summary.stop, StopReason::Cancelled);
    }
}
