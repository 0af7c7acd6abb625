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

use std::fmt;

use rdkafka::{
    ClientContext,
    error::KafkaError,
    message::Message as _,
    producer::{DeliveryResult, ProducerContext, ThreadedProducer},
};
use tracing::{info, warn};

use crate::{
    Result,
    callback::{ClientEvent, DeliveryReport, ProducerCallbacks},
    config::ProducerConfig,
};

/// producer whose background poller dispatches delivery reports
pub type LineProducer = ThreadedProducer<DeliveryContext>;

pub struct DeliveryContext {
    callbacks: ProducerCallbacks,
}

impl DeliveryContext {
    pub fn new(callbacks: ProducerCallbacks) -> Self {
        Self { callbacks }
    }

    /// forward one report to the registered callback; the runtime calls
    /// this exactly once per accepted message
    pub fn report(&self, report: &DeliveryReport) {
        match &self.callbacks.delivery {
            Some(delivery) => delivery(report),
            None if report.delivered() => info!(%report),
            None => warn!(%report),
        }
    }
}

impl fmt::Debug for DeliveryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryContext")
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

impl ClientContext for DeliveryContext {
    fn error(&self, error: KafkaError, reason: &str) {
        warn!(%error, reason);
        self.callbacks.on_event(&ClientEvent {
            error: error.to_string(),
            reason: reason.into(),
        });
    }
}

impl ProducerContext for DeliveryContext {
    type DeliveryOpaque = ();

    fn delivery(&self, delivery_result: &DeliveryResult<'_>, _delivery_opaque: ()) {
        let report = match delivery_result {
            Ok(message) => DeliveryReport {
                topic: message.topic().into(),
                partition: message.partition(),
                offset: message.offset(),
                error: None,
            },

            Err((error, message)) => DeliveryReport {
                topic: message.topic().into(),
                partition: message.partition(),
                offset: message.offset(),
                error: Some(error.to_string()),
            },
        };

        self.report(&report);
    }
}

/// create a producer owning its delivery context, failing fast on
/// configuration before any client exists
pub fn connect(config: &ProducerConfig, callbacks: ProducerCallbacks) -> Result<LineProducer> {
    config
        .client_config()?
        .create_with_context(DeliveryContext::new(callbacks))
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    fn report(offset: i64) -> DeliveryReport {
        DeliveryReport {
            topic: "t1".into(),
            partition: 0,
            offset,
            error: None,
        }
    }

    #[test]
    fn each_report_reaches_the_callback_exactly_once() {
        let delivered = Arc::new(AtomicUsize::new(0));
        let counter = delivered.clone();

        let context = DeliveryContext::new(
            ProducerCallbacks::default()
                .delivery(Box::new(move |_| _ = counter.fetch_add(1, Ordering::SeqCst))),
        );

        context.report(&report(0));
        assert_eq!(1, delivered.load(Ordering::SeqCst));

        context.report(&report(1));
        assert_eq!(2, delivered.load(Ordering::SeqCst));
    }

    #[test]
    fn callback_sees_the_failure_reason() {
        let seen = Arc::new(std::sync::Mutex::new(None));
        let sink = seen.clone();

        let context = DeliveryContext::new(ProducerCallbacks::default().delivery(Box::new(
            move |report| *sink.lock().expect("report") = Some(report.clone()),
        )));

        context.report(&DeliveryReport {
            topic: "t1".into(),
            error: Some("Local: Message timed out".into()),
            ..DeliveryReport::default()
        });

        let seen = seen.lock().expect("report");
        let report = seen.as_ref().expect("report");
        assert!(!report.delivered());
        assert_eq!(Some("Local: Message timed out"), report.error.as_deref());
    }

    #[test]
    fn unregistered_callback_logs_instead() {
        let context = DeliveryContext::new(ProducerCallbacks::default());

        context.report(&report(0));
    }
}
