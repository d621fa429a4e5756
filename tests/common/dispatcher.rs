//! Operation dispatcher that records what it delivers

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use luxemarket::client::offline::{DispatchError, OperationDispatcher, PendingOperation};

/// Records every delivered operation; product ids in `failing` are refused
#[derive(Debug, Clone, Default)]
pub struct RecordingDispatcher {
    delivered: Arc<Mutex<Vec<PendingOperation>>>,
    failing: Arc<Mutex<HashSet<u64>>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, product_id: u64) {
        self.failing.lock().unwrap().insert(product_id);
    }

    pub fn recover(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn delivered(&self) -> Vec<PendingOperation> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn delivered_ids(&self) -> Vec<String> {
        self.delivered().into_iter().map(|op| op.id).collect()
    }
}

#[async_trait]
impl OperationDispatcher for RecordingDispatcher {
    async fn dispatch(&self, operation: &PendingOperation) -> Result<(), DispatchError> {
        let refused = operation
            .operation
            .target_id()
            .is_some_and(|id| self.failing.lock().unwrap().contains(&id));
        if refused {
            return Err(DispatchError::Transport("connection reset".to_string()));
        }
        self.delivered.lock().unwrap().push(operation.clone());
        Ok(())
    }
}
