//! Arrival watcher
//!
//! Polls the object store until the trigger object exists or the watch
//! timeout elapses. Checks are read-only.

use flightflow_core::PipelineError;
use flightflow_core::domain::pipeline::WaitMode;
use flightflow_core::domain::trigger::TriggerCondition;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OwnedSemaphorePermit;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::repository::ObjectRepository;
use crate::service::WorkerSlots;

/// Deadline offset used when the watch timeout does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Waits for the trigger object to land
#[derive(Clone)]
pub struct ArrivalWatcher {
    objects: Arc<dyn ObjectRepository>,
    slots: WorkerSlots,
    poll_interval: Duration,
    timeout: Duration,
    mode: WaitMode,
}

impl ArrivalWatcher {
    /// Creates a new watcher
    ///
    /// # Arguments
    /// * `objects` - Object store repository
    /// * `slots` - Worker slots shared with other runs
    /// * `poll_interval` - Time between checks
    /// * `timeout` - Total time to wait before giving up
    /// * `mode` - Whether to hold the worker slot between checks
    pub fn new(
        objects: Arc<dyn ObjectRepository>,
        slots: WorkerSlots,
        poll_interval: Duration,
        timeout: Duration,
        mode: WaitMode,
    ) -> Self {
        Self {
            objects,
            slots,
            poll_interval,
            timeout,
            mode,
        }
    }

    /// Blocks until the object exists
    ///
    /// Checks once immediately, then every poll interval. The final sleep is
    /// clipped so the last check lands on the deadline.
    ///
    /// # Returns
    /// The number of checks issued, or `TriggerTimeout` when the deadline
    /// passes first, including while waiting for a worker slot.
    /// Cancellation aborts the wait immediately.
    pub async fn wait(
        &self,
        trigger: &TriggerCondition,
        cancel: &CancellationToken,
    ) -> Result<u32, PipelineError> {
        info!(
            "Waiting for {} (interval: {:?}, timeout: {:?}, mode: {})",
            trigger, self.poll_interval, self.timeout, self.mode
        );

        let now = Instant::now();
        let deadline = now
            .checked_add(self.timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);

        // Poke mode keeps the slot until this function returns
        let _held = match self.mode {
            WaitMode::Poke => Some(self.acquire_slot(trigger, deadline, 0, cancel).await?),
            WaitMode::Reschedule => None,
        };

        let mut checks = 0;

        loop {
            let found = self.check(trigger, deadline, checks, cancel).await?;
            checks += 1;

            if found {
                info!("Found {} after {} check(s)", trigger, checks);
                return Ok(checks);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(self.timed_out(trigger, checks));
            }

            let pause = self.poll_interval.min(deadline - now);
            debug!("{} not present yet, next check in {:?}", trigger, pause);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                _ = time::sleep(pause) => {}
            }
        }
    }

    /// Issues a single existence check
    ///
    /// Transient failures count as "not present yet"; anything else fails the wait.
    async fn check(
        &self,
        trigger: &TriggerCondition,
        deadline: Instant,
        checks: u32,
        cancel: &CancellationToken,
    ) -> Result<bool, PipelineError> {
        let _permit = match self.mode {
            WaitMode::Reschedule => Some(self.acquire_slot(trigger, deadline, checks, cancel).await?),
            WaitMode::Poke => None,
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            result = self.objects.exists(trigger) => result,
        };

        match result {
            Ok(found) => Ok(found),
            Err(e) if e.is_transient() => {
                warn!("Transient error checking {}: {}", trigger, e);
                Ok(false)
            }
            Err(e) => Err(PipelineError::ServiceUnavailable(format!(
                "object store check for {} failed: {}",
                trigger, e
            ))),
        }
    }

    /// Waits for a worker slot, giving up at the watch deadline
    async fn acquire_slot(
        &self,
        trigger: &TriggerCondition,
        deadline: Instant,
        checks: u32,
        cancel: &CancellationToken,
    ) -> Result<OwnedSemaphorePermit, PipelineError> {
        match time::timeout_at(deadline, self.slots.acquire(cancel)).await {
            Ok(permit) => permit,
            Err(_) => {
                debug!("No worker slot free before the deadline for {}", trigger);
                Err(self.timed_out(trigger, checks))
            }
        }
    }

    fn timed_out(&self, trigger: &TriggerCondition, checks: u32) -> PipelineError {
        warn!("Gave up waiting for {} after {} check(s)", trigger, checks);
        PipelineError::TriggerTimeout {
            object: trigger.to_string(),
            timeout_secs: self.timeout.as_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeObjects;
    use flightflow_client::ClientError;

    fn trigger() -> TriggerCondition {
        TriggerCondition {
            bucket: "b".to_string(),
            object: "airflow-project/source-dev/flight_booking.csv".to_string(),
        }
    }

    /// Paused-clock timers may round up to the next millisecond
    fn assert_elapsed(started: Instant, secs: u64) {
        let elapsed = started.elapsed();
        let expected = Duration::from_secs(secs);
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(100),
            "elapsed {:?}, expected {:?}",
            elapsed,
            expected
        );
    }

    fn watcher(objects: Arc<FakeObjects>, slots: WorkerSlots, mode: WaitMode) -> ArrivalWatcher {
        ArrivalWatcher::new(
            objects,
            slots,
            Duration::from_secs(30),
            Duration::from_secs(300),
            mode,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_present_immediately() {
        let objects = Arc::new(FakeObjects::present());
        let watcher = watcher(objects.clone(), WorkerSlots::new(1), WaitMode::Poke);

        let started = Instant::now();
        let checks = watcher.wait(&trigger(), &CancellationToken::new()).await.unwrap();

        assert_eq!(checks, 1);
        assert_eq!(objects.checks(), 1);
        assert_elapsed(started, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_appears_on_later_check() {
        let objects = Arc::new(FakeObjects::appears_after(3));
        let watcher = watcher(objects.clone(), WorkerSlots::new(1), WaitMode::Poke);

        let started = Instant::now();
        let checks = watcher.wait(&trigger(), &CancellationToken::new()).await.unwrap();

        assert_eq!(checks, 4);
        assert_elapsed(started, 90);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_in_both_modes() {
        for mode in [WaitMode::Poke, WaitMode::Reschedule] {
            let objects = Arc::new(FakeObjects::absent());
            let watcher = watcher(objects.clone(), WorkerSlots::new(1), mode);

            let started = Instant::now();
            let err = watcher
                .wait(&trigger(), &CancellationToken::new())
                .await
                .unwrap_err();

            assert!(matches!(err, PipelineError::TriggerTimeout { timeout_secs: 300, .. }));
            // t = 0, 30, ..., 300
            assert_eq!(objects.checks(), 11);
            assert_elapsed(started, 300);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_sleep_is_clipped_to_deadline() {
        let objects = Arc::new(FakeObjects::absent());
        let watcher = ArrivalWatcher::new(
            objects.clone(),
            WorkerSlots::new(1),
            Duration::from_secs(40),
            Duration::from_secs(100),
            WaitMode::Poke,
        );

        let started = Instant::now();
        assert!(watcher.wait(&trigger(), &CancellationToken::new()).await.is_err());

        // t = 0, 40, 80, 100
        assert_eq!(objects.checks(), 4);
        assert_elapsed(started, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poke_holds_slot_and_reschedule_releases_it() {
        let slots = WorkerSlots::new(1);

        let poke = watcher(Arc::new(FakeObjects::absent()), slots.clone(), WaitMode::Poke);
        let cancel = CancellationToken::new();
        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { poke.wait(&trigger(), &cancel).await })
        };

        time::sleep(Duration::from_secs(45)).await;
        assert_eq!(slots.available(), 0);
        cancel.cancel();
        assert_eq!(handle.await.unwrap().unwrap_err(), PipelineError::Cancelled);
        assert_eq!(slots.available(), 1);

        let reschedule = watcher(
            Arc::new(FakeObjects::absent()),
            slots.clone(),
            WaitMode::Reschedule,
        );
        let cancel = CancellationToken::new();
        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { reschedule.wait(&trigger(), &cancel).await })
        };

        time::sleep(Duration::from_secs(45)).await;
        assert_eq!(slots.available(), 1);
        cancel.cancel();
        assert_eq!(handle.await.unwrap().unwrap_err(), PipelineError::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_timeout() {
        let objects = Arc::new(FakeObjects::appears_after(1));
        let watcher = ArrivalWatcher::new(
            objects.clone(),
            WorkerSlots::new(1),
            Duration::from_secs(30),
            Duration::from_secs(u64::MAX),
            WaitMode::Poke,
        );

        let checks = watcher.wait(&trigger(), &CancellationToken::new()).await.unwrap();
        assert_eq!(checks, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slot_wait_is_bounded_by_timeout() {
        for mode in [WaitMode::Poke, WaitMode::Reschedule] {
            let slots = WorkerSlots::new(1);
            let _busy = slots.acquire(&CancellationToken::new()).await.unwrap();

            let objects = Arc::new(FakeObjects::present());
            let watcher = watcher(objects.clone(), slots.clone(), mode);

            let started = Instant::now();
            let err = watcher
                .wait(&trigger(), &CancellationToken::new())
                .await
                .unwrap_err();

            assert!(matches!(err, PipelineError::TriggerTimeout { timeout_secs: 300, .. }));
            assert_eq!(objects.checks(), 0);
            assert_elapsed(started, 300);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_aborts_wait_immediately() {
        let objects = Arc::new(FakeObjects::absent());
        let watcher = watcher(objects.clone(), WorkerSlots::new(1), WaitMode::Poke);
        let cancel = CancellationToken::new();

        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { watcher.wait(&trigger(), &cancel).await })
        };

        time::sleep(Duration::from_secs(10)).await;
        let cancelled_at = Instant::now();
        cancel.cancel();

        assert_eq!(handle.await.unwrap().unwrap_err(), PipelineError::Cancelled);
        assert_elapsed(cancelled_at, 0);
        assert_eq!(objects.checks(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_keep_polling() {
        let objects = Arc::new(FakeObjects::scripted(
            vec![Err(ClientError::api_error(503, "backend unavailable"))],
            true,
        ));
        let watcher = watcher(objects.clone(), WorkerSlots::new(1), WaitMode::Reschedule);

        let checks = watcher.wait(&trigger(), &CancellationToken::new()).await.unwrap();
        assert_eq!(checks, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_error_fails_wait() {
        let objects = Arc::new(FakeObjects::scripted(
            vec![Err(ClientError::api_error(403, "forbidden"))],
            true,
        ));
        let watcher = watcher(objects.clone(), WorkerSlots::new(1), WaitMode::Poke);

        let err = watcher
            .wait(&trigger(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ServiceUnavailable(_)));
        assert_eq!(objects.checks(), 1);
    }
}
