// Copyright 2025 eraflo
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

/// A thread-safe, unbounded event channel.
///
/// The bus is generic over the event type so the core stays independent of the
/// event enums defined by higher-level crates. Publishing never fails the
/// caller: if the channel is disconnected the event is dropped and logged.
#[derive(Debug)]
pub struct EventBus<T: Clone + Send + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Clone + Send + 'static> EventBus<T> {
    /// Creates a bus with an unbounded channel.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::debug!("EventBus: initialized.");
        Self { sender, receiver }
    }

    /// Sends an event.
    pub fn publish(&self, event: T) {
        log::trace!("EventBus: publishing an event.");
        if let Err(e) = self.sender.send(event) {
            log::error!("EventBus: failed to send event: {e}. Receiver likely disconnected.");
        }
    }

    /// Returns a clone of the sending end, for producers living elsewhere.
    pub fn sender(&self) -> flume::Sender<T> {
        self.sender.clone()
    }

    /// Returns the receiving end, for the owner of the bus.
    pub fn receiver(&self) -> &flume::Receiver<T> {
        &self.receiver
    }

    /// Takes every pending event without blocking.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether no event is pending.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl<T: Clone + Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flume::TryRecvError;
    use std::{thread, time::Duration};

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Threshold { value: u32 },
        Switched,
    }

    #[test]
    fn try_receive_empty() {
        let bus = EventBus::<TestEvent>::new();
        assert!(bus.is_empty());
        assert_eq!(bus.receiver().try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn publish_then_drain_keeps_order() {
        let bus = EventBus::new();
        bus.publish(TestEvent::Threshold { value: 1 });
        bus.publish(TestEvent::Switched);
        bus.publish(TestEvent::Threshold { value: 2 });
        assert_eq!(bus.len(), 3);

        let events = bus.drain();
        assert_eq!(
            events,
            vec![
                TestEvent::Threshold { value: 1 },
                TestEvent::Switched,
                TestEvent::Threshold { value: 2 },
            ]
        );
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn send_from_another_thread() {
        let bus = EventBus::new();
        let sender = bus.sender();
        let handle = thread::spawn(move || {
            sender
                .send(TestEvent::Threshold { value: 7 })
                .expect("send should succeed");
        });
        handle.join().expect("thread should join");

        let received = bus
            .receiver()
            .recv_timeout(Duration::from_millis(100))
            .expect("event should arrive");
        assert_eq!(received, TestEvent::Threshold { value: 7 });
    }
}
