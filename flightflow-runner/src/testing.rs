//! In-memory repository fakes for unit tests

use async_trait::async_trait;
use flightflow_client::{Batch, ClientError, Operation, Result};
use flightflow_core::domain::batch::BatchId;
use flightflow_core::domain::job::{BatchState, JobSpecification};
use flightflow_core::domain::trigger::TriggerCondition;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::repository::{BatchRepository, ObjectRepository};

/// Object store answering from a script, then with a fixed answer
pub struct FakeObjects {
    script: Mutex<VecDeque<Result<bool>>>,
    fallback: bool,
    checks: AtomicU32,
}

impl FakeObjects {
    pub fn present() -> Self {
        Self::scripted(Vec::new(), true)
    }

    pub fn absent() -> Self {
        Self::scripted(Vec::new(), false)
    }

    /// Absent for the first `misses` checks, present afterwards
    pub fn appears_after(misses: usize) -> Self {
        Self::scripted((0..misses).map(|_| Ok(false)).collect(), true)
    }

    pub fn scripted(script: Vec<Result<bool>>, fallback: bool) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            checks: AtomicU32::new(0),
        }
    }

    pub fn checks(&self) -> u32 {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectRepository for FakeObjects {
    async fn exists(&self, _trigger: &TriggerCondition) -> Result<bool> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or(Ok(self.fallback))
    }
}

/// Batch service recording submissions and replaying scripted states
pub struct FakeBatches {
    create_script: Mutex<VecDeque<Result<()>>>,
    state_script: Mutex<VecDeque<Result<BatchState>>>,
    fallback_state: BatchState,
    submissions: Mutex<Vec<(BatchId, JobSpecification)>>,
    lookups: AtomicU32,
}

impl FakeBatches {
    /// Accepts every submission; every batch succeeds on first lookup
    pub fn succeeding() -> Self {
        Self::new(Vec::new(), Vec::new(), BatchState::Succeeded)
    }

    pub fn new(
        create_script: Vec<Result<()>>,
        state_script: Vec<Result<BatchState>>,
        fallback_state: BatchState,
    ) -> Self {
        Self {
            create_script: Mutex::new(create_script.into()),
            state_script: Mutex::new(state_script.into()),
            fallback_state,
            submissions: Mutex::new(Vec::new()),
            lookups: AtomicU32::new(0),
        }
    }

    pub fn submissions(&self) -> Vec<(BatchId, JobSpecification)> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn lookups(&self) -> u32 {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BatchRepository for FakeBatches {
    async fn create(&self, batch_id: &BatchId, spec: &JobSpecification) -> Result<Operation> {
        let scripted = self.create_script.lock().unwrap().pop_front();
        if let Some(Err(e)) = scripted {
            return Err(e);
        }

        let mut submissions = self.submissions.lock().unwrap();
        if submissions.iter().any(|(id, _)| id == batch_id) {
            return Err(ClientError::api_error(409, "ALREADY_EXISTS"));
        }
        submissions.push((batch_id.clone(), spec.clone()));

        Ok(Operation {
            name: format!("projects/test/regions/us-central1/operations/{}", batch_id),
            done: false,
            metadata: None,
            error: None,
        })
    }

    async fn get(&self, batch_id: &BatchId) -> Result<Batch> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let state = self
            .state_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(self.fallback_state))?;

        Ok(Batch {
            name: format!("projects/test/locations/us-central1/batches/{}", batch_id),
            uuid: None,
            state,
            state_message: (state == BatchState::Failed).then(|| "Driver exited with code 1".to_string()),
            create_time: None,
            state_time: None,
        })
    }
}
