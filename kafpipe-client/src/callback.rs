// Copyright ⓒ 2025 the kafpipe authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Callback capabilities registered against a configuration and owned by
//! the client context once the client is created. Plain function values,
//! no inheritance hierarchy.

use std::{collections::BTreeSet, fmt};

use crate::session::TopicPartition;

pub type EventCallback = Box<dyn Fn(&ClientEvent) + Send + Sync>;
pub type RebalanceCallback = Box<dyn Fn(&RebalanceEvent) + Send + Sync>;
pub type DeliveryCallback = Box<dyn Fn(&DeliveryReport) + Send + Sync>;

/// an error surfaced by the client runtime outside any operation
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ClientEvent {
    pub error: String,
    pub reason: String,
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum RebalanceEvent {
    Assigned(BTreeSet<TopicPartition>),
    Revoked(BTreeSet<TopicPartition>),
    Error(String),
}

/// final outcome of one accepted send, reported exactly once
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DeliveryReport {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub error: Option<String>,
}

impl DeliveryReport {
    pub fn delivered(&self) -> bool {
        self.error.is_none()
    }
}

impl fmt::Display for DeliveryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            None => write!(
                f,
                "delivered to {} [{}] at offset {}",
                self.topic, self.partition, self.offset
            ),
            Some(error) => write!(f, "delivery to {} failed: {}", self.topic, error),
        }
    }
}

#[derive(Default)]
pub struct ConsumerCallbacks {
    pub(crate) event: Option<EventCallback>,
    pub(crate) rebalance: Option<RebalanceCallback>,
}

impl ConsumerCallbacks {
    pub fn event(self, event: EventCallback) -> Self {
        Self {
            event: Some(event),
            ..self
        }
    }

    pub fn rebalance(self, rebalance: RebalanceCallback) -> Self {
        Self {
            rebalance: Some(rebalance),
            ..self
        }
    }

    pub(crate) fn on_event(&self, event: &ClientEvent) {
        if let Some(callback) = &self.event {
            callback(event)
        }
    }

    pub(crate) fn on_rebalance(&self, rebalance: &RebalanceEvent) {
        if let Some(callback) = &self.rebalance {
            callback(rebalance)
        }
    }
}

impl fmt::Debug for ConsumerCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerCallbacks")
            .field("event", &self.event.is_some())
            .field("rebalance", &self.rebalance.is_some())
            .finish()
    }
}

#[derive(Default)]
pub struct ProducerCallbacks {
    pub(crate) event: Option<EventCallback>,
    pub(crate) delivery: Option<DeliveryCallback>,
}

impl ProducerCallbacks {
    pub fn event(self, event: EventCallback) -> Self {
        Self {
            event: Some(event),
            ..self
        }
    }

    pub fn delivery(self, delivery: DeliveryCallback) -> Self {
        Self {
            delivery: Some(delivery),
            ..self
        }
    }

    pub(crate) fn on_event(&self, event: &ClientEvent) {
        if let Some(callback) = &self.event {
            callback(event)
        }
    }
}

impl fmt::Debug for ProducerCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducerCallbacks")
            .field("event", &self.event.is_some())
            .field("delivery", &self.delivery.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    #[test]
    fn delivery_report_formats_outcome() {
        let delivered = DeliveryReport {
            topic: "t1".into(),
            partition: 0,
            offset: 5,
            error: None,
        };
        assert!(delivered.delivered());
        assert_eq!("delivered to t1 [0] at offset 5", delivered.to_string());

        let failed = DeliveryReport {
            topic: "t1".into(),
            error: Some("Message timed out".into()),
            ..DeliveryReport::default()
        };
        assert!(!failed.delivered());
        assert_eq!(
            "delivery to t1 failed: Message timed out",
            failed.to_string()
        );
    }

    #[test]
    fn unregistered_callbacks_are_no_ops() {
        let callbacks = ConsumerCallbacks::default();

        callbacks.on_event(&ClientEvent {
            error: "broker down".into(),
            reason: "all brokers down".into(),
        });
        callbacks.on_rebalance(&RebalanceEvent::Revoked(BTreeSet::new()));
    }

    #[test]
    fn registered_event_callback_sees_each_event_once() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();

        let callbacks = ProducerCallbacks::default()
            .event(Box::new(move |_| _ = counter.fetch_add(1, Ordering::SeqCst)));

        let event = ClientEvent {
            error: "transport".into(),
            reason: "connection refused".into(),
        };

        callbacks.on_event(&event);
        assert_eq!(1, seen.load(Ordering::SeqCst));

        callbacks.on_event(&event);
        assert_eq!(2, seen.load(Ordering::SeqCst));
    }
}
