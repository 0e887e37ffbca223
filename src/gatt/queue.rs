// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The operation serializer.
//!
//! The radio stack accepts one outstanding operation at a time and
//! confirms each asynchronously. This queue turns overlapping requests
//! into a strictly sequential stream: FIFO order, at most one operation
//! in flight, advanced only by [`CommandQueue::completed`].

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use super::attributes::ServiceDef;
use super::transport::GattTransport;

/// A unit of work submitted to the queue.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Register a service with the host stack.
    AddService(ServiceDef),
    /// Push a characteristic value to one central.
    Notify {
        central: String,
        characteristic: Uuid,
        value: Vec<u8>,
        confirm: bool,
    },
}

impl Operation {
    fn describe(&self) -> String {
        match self {
            Operation::AddService(def) => format!("add service <{}>", def.uuid),
            Operation::Notify {
                central,
                characteristic,
                confirm,
                ..
            } => format!(
                "{} <{}> to {}",
                if *confirm { "indicate" } else { "notify" },
                characteristic,
                central
            ),
        }
    }
}

#[derive(Default)]
struct QueueState {
    operations: VecDeque<Operation>,
    busy: bool,
}

/// FIFO of pending transport operations, executed one at a time.
pub struct CommandQueue {
    state: Mutex<QueueState>,
    transport: Arc<dyn GattTransport>,
}

impl CommandQueue {
    pub fn new(transport: Arc<dyn GattTransport>) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            transport,
        }
    }

    /// Enqueue an operation, dispatching it immediately when nothing is
    /// in flight. Safe to call concurrently from multiple producers.
    pub fn submit(&self, operation: Operation) -> bool {
        self.state.lock().operations.push_back(operation);
        self.next_command();
        true
    }

    /// The current operation has completed; pop it and immediately
    /// attempt to dispatch the new head. Completion and next-dispatch are
    /// one step so the queue can neither starve nor double-dispatch.
    pub fn completed(&self) {
        {
            let mut state = self.state.lock();
            state.operations.pop_front();
            state.busy = false;
        }
        self.next_command();
    }

    /// Number of operations waiting or in flight.
    pub fn len(&self) -> usize {
        self.state.lock().operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().operations.is_empty()
    }

    /// Whether an operation is currently awaiting its completion callback.
    pub fn is_busy(&self) -> bool {
        self.state.lock().busy
    }

    /// Dispatch the head of the queue unless one is already in flight.
    ///
    /// The busy check-and-set happens under the lock; the transport call
    /// does not, so a completion arriving synchronously cannot deadlock.
    /// A dispatch that fails outright is treated as completed: the
    /// operation is dropped and the next one tried, so a single bad
    /// operation never stalls the queue.
    fn next_command(&self) {
        loop {
            let operation = {
                let mut state = self.state.lock();
                if state.busy {
                    return;
                }
                let Some(operation) = state.operations.front().cloned() else {
                    return;
                };
                state.busy = true;
                operation
            };

            debug!("dispatching: {}", operation.describe());
            let result = match &operation {
                Operation::AddService(def) => self.transport.add_service(def),
                Operation::Notify {
                    central,
                    characteristic,
                    value,
                    confirm,
                } => self
                    .transport
                    .notify(central, *characteristic, value, *confirm),
            };

            match result {
                Ok(()) => return,
                Err(err) => {
                    error!("{} failed: {}", operation.describe(), err);
                    let mut state = self.state.lock();
                    state.operations.pop_front();
                    state.busy = false;
                    // Fall through and try the next operation.
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gatt::status::GattStatus;
    use crate::gatt::uuids;
    use parking_lot::Mutex as PlMutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingTransport {
        dispatched: PlMutex<Vec<String>>,
        fail_notifications: AtomicBool,
        notify_calls: AtomicUsize,
    }

    impl GattTransport for RecordingTransport {
        fn add_service(&self, service: &ServiceDef) -> anyhow::Result<()> {
            self.dispatched.lock().push(format!("add:{}", service.uuid));
            Ok(())
        }

        fn notify(
            &self,
            central: &str,
            _characteristic: Uuid,
            _value: &[u8],
            _confirm: bool,
        ) -> anyhow::Result<()> {
            self.notify_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_notifications.load(Ordering::SeqCst) {
                anyhow::bail!("transport rejected notification");
            }
            self.dispatched.lock().push(format!("notify:{}", central));
            Ok(())
        }

        fn respond(&self, _central: &str, _request_id: u32, _status: GattStatus, _value: &[u8]) {}
    }

    fn notify_op(central: &str) -> Operation {
        Operation::Notify {
            central: central.to_string(),
            characteristic: uuids::OBSERVATION_CHARACTERISTIC_UUID,
            value: vec![0x07],
            confirm: false,
        }
    }

    #[test]
    fn test_single_operation_dispatches_immediately() {
        let transport = Arc::new(RecordingTransport::default());
        let queue = CommandQueue::new(transport.clone());

        assert!(queue.submit(notify_op("aa")));
        assert!(queue.is_busy());
        assert_eq!(transport.dispatched.lock().as_slice(), ["notify:aa"]);
    }

    #[test]
    fn test_fifo_order_one_in_flight() {
        let transport = Arc::new(RecordingTransport::default());
        let queue = CommandQueue::new(transport.clone());

        queue.submit(notify_op("aa"));
        queue.submit(notify_op("bb"));
        queue.submit(notify_op("cc"));

        // Only the head was dispatched; the rest wait for completions.
        assert_eq!(transport.dispatched.lock().len(), 1);

        queue.completed();
        queue.completed();
        queue.completed();
        assert_eq!(
            transport.dispatched.lock().as_slice(),
            ["notify:aa", "notify:bb", "notify:cc"]
        );
        assert!(queue.is_empty());
        assert!(!queue.is_busy());
    }

    #[test]
    fn test_failed_dispatch_drains_queue() {
        let transport = Arc::new(RecordingTransport::default());
        transport.fail_notifications.store(true, Ordering::SeqCst);
        let queue = CommandQueue::new(transport.clone());

        for i in 0..5 {
            queue.submit(notify_op(&format!("central-{}", i)));
        }

        // Every dispatch failed synchronously; all operations were
        // force-advanced and the queue is live again.
        assert_eq!(transport.notify_calls.load(Ordering::SeqCst), 5);
        assert!(queue.is_empty());
        assert!(!queue.is_busy());

        transport.fail_notifications.store(false, Ordering::SeqCst);
        queue.submit(notify_op("dd"));
        assert_eq!(transport.dispatched.lock().as_slice(), ["notify:dd"]);
    }

    #[test]
    fn test_completed_dispatches_next_head() {
        let transport = Arc::new(RecordingTransport::default());
        let queue = CommandQueue::new(transport.clone());

        queue.submit(notify_op("aa"));
        queue.submit(notify_op("bb"));
        assert_eq!(queue.len(), 2);

        queue.completed();
        assert_eq!(queue.len(), 1);
        assert!(queue.is_busy());
        assert_eq!(transport.dispatched.lock().as_slice(), ["notify:aa", "notify:bb"]);
    }

    #[test]
    fn test_concurrent_producers() {
        let transport = Arc::new(RecordingTransport::default());
        let queue = Arc::new(CommandQueue::new(transport.clone()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    for j in 0..50 {
                        queue.submit(notify_op(&format!("{}-{}", i, j)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Exactly one dispatch happened; everything else is queued
        // behind the in-flight operation.
        assert_eq!(transport.dispatched.lock().len(), 1);
        assert_eq!(queue.len(), 400);

        for _ in 0..400 {
            queue.completed();
        }
        assert_eq!(transport.dispatched.lock().len(), 400);
        assert!(queue.is_empty());
    }
}
