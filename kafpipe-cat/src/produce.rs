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

use std::{marker::PhantomData, time::Duration};

use futures::StreamExt;
use kafpipe_client::{
    DeliveryReport, FlushPolicy, LineProducer, ProducerCallbacks, ProducerConfig,
};
use rdkafka::producer::{BaseRecord, Producer as _};
use tokio::io;
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{debug, warn};
use url::Url;

use crate::Result;

const QUIT: &str = "exit";

const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_millis(5_000);

#[derive(Clone, Debug)]
pub struct Builder<B, T> {
    broker: B,
    topic: T,
    key: Option<String>,
    flush: FlushPolicy,
    flush_timeout: Duration,
}

pub(crate) type PhantomBuilder = Builder<PhantomData<Url>, PhantomData<String>>;

impl Default for PhantomBuilder {
    fn default() -> Self {
        Self {
            broker: PhantomData,
            topic: PhantomData,
            key: None,
            flush: FlushPolicy::default(),
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
        }
    }
}

impl<B, T> Builder<B, T> {
    pub fn broker(self, broker: impl Into<Url>) -> Builder<Url, T> {
        Builder {
            broker: broker.into(),
            topic: self.topic,
            key: self.key,
            flush: self.flush,
            flush_timeout: self.flush_timeout,
        }
    }

    pub fn topic(self, topic: impl Into<String>) -> Builder<B, String> {
        Builder {
            broker: self.broker,
            topic: topic.into(),
            key: self.key,
            flush: self.flush,
            flush_timeout: self.flush_timeout,
        }
    }

    pub fn key(self, key: Option<String>) -> Self {
        Self { key, ..self }
    }

    pub fn flush(self, flush: FlushPolicy) -> Self {
        Self { flush, ..self }
    }

    pub fn flush_timeout(self, flush_timeout: Duration) -> Self {
        Self {
            flush_timeout,
            ..self
        }
    }
}

impl Builder<Url, String> {
    pub fn build(self) -> super::Cat {
        super::Cat::Produce(Box::new(Configuration {
            broker: self.broker,
            topic: self.topic,
            key: self.key,
            flush: self.flush,
            flush_timeout: self.flush_timeout,
        }))
    }
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Configuration {
    pub broker: Url,
    pub topic: String,
    pub key: Option<String>,
    pub flush: FlushPolicy,
    pub flush_timeout: Duration,
}

/// one line of standard input
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Input<'a> {
    Quit,
    Blank,
    Publish(&'a str),
}

impl<'a> From<&'a str> for Input<'a> {
    fn from(line: &'a str) -> Self {
        if line == QUIT {
            Self::Quit
        } else if line.trim().is_empty() {
            Self::Blank
        } else {
            Self::Publish(line)
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Produce {
    configuration: Configuration,
}

impl From<Configuration> for Produce {
    fn from(configuration: Configuration) -> Self {
        Self { configuration }
    }
}

impl Produce {
    pub(crate) async fn main(self) -> Result<()> {
        let configuration = self.configuration;
        debug!(?configuration);

        let producer = kafpipe_client::producer::connect(
            &ProducerConfig::new(configuration.broker.clone()),
            ProducerCallbacks::default().delivery(Box::new(report)),
        )?;

        let stdin = io::stdin();
        let mut reader = FramedRead::new(stdin, LinesCodec::new());

        while let Some(line) = reader.next().await.transpose()? {
            match Input::from(line.as_str()) {
                Input::Quit => break,

                Input::Blank => continue,

                Input::Publish(payload) => {
                    let record = BaseRecord::<str, str>::to(&configuration.topic).payload(payload);
                    let record = if let Some(ref key) = configuration.key {
                        record.key(key)
                    } else {
                        record
                    };

                    // enqueue only; the delivery callback carries the outcome
                    if let Err((error, _)) = producer.send(record) {
                        warn!(%error, "send rejected");
                        eprintln!("send rejected: {error}");
                        continue;
                    }

                    debug!(topic = %configuration.topic, %payload, "queued");

                    if configuration.flush == FlushPolicy::EverySend {
                        flush(&producer, configuration.flush_timeout);
                    }
                }
            }
        }

        // bounded wait; anything still unflushed afterwards is lost
        flush(&producer, configuration.flush_timeout);

        Ok(())
    }
}

fn flush(producer: &LineProducer, budget: Duration) {
    if let Err(error) = producer.flush(budget) {
        warn!(%error, "flush");
    }
}

fn report(report: &DeliveryReport) {
    if report.delivered() {
        println!("{report}");
    } else {
        eprintln!("{report}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_token_terminates() {
        assert_eq!(Input::Quit, Input::from("exit"));
    }

    #[test]
    fn quit_token_is_literal() {
        assert_eq!(Input::Publish("exit now"), Input::from("exit now"));
        assert_eq!(Input::Publish(" exit"), Input::from(" exit"));
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(Input::Blank, Input::from(""));
        assert_eq!(Input::Blank, Input::from("   "));
    }

    #[test]
    fn anything_else_is_published() {
        assert_eq!(Input::Publish("hello"), Input::from("hello"));
    }

    #[test]
    fn flush_defaults_to_a_bounded_wait_at_close() {
        let broker = Url::parse("tcp://localhost:9092").expect("broker url");

        let crate::Cat::Produce(configuration) =
            crate::Cat::produce().broker(broker).topic("t1").build()
        else {
            panic!("produce configuration")
        };

        assert_eq!(FlushPolicy::OnClose, configuration.flush);
        assert_eq!(DEFAULT_FLUSH_TIMEOUT, configuration.flush_timeout);
        assert_eq!(None, configuration.key);
    }
}
