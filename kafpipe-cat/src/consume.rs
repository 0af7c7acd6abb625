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

use futures::SinkExt;
use kafpipe_client::{
    Assignor, CLIENT_ID, ConsumerCallbacks, ConsumerConfig, OffsetReset, SharedSession,
};
use rdkafka::{
    consumer::Consumer as _,
    message::{BorrowedMessage, Message as _},
};
use serde::{Deserialize, Serialize};
use tokio::{
    io::stdout,
    signal::unix::{SignalKind, signal},
    time::timeout,
};
use tokio_util::codec::{FramedWrite, LinesCodec};
use tracing::{debug, info, warn};
use url::Url;

use crate::Result;

const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(1_000);

#[derive(Clone, Debug)]
pub struct Builder<B, T, G> {
    broker: B,
    topics: T,
    group: G,
    assignor: Assignor,
    offset_reset: OffsetReset,
    poll_timeout: Duration,
}

pub(crate) type PhantomBuilder =
    Builder<PhantomData<Url>, PhantomData<Vec<String>>, PhantomData<String>>;

impl Default for PhantomBuilder {
    fn default() -> Self {
        Self {
            broker: PhantomData,
            topics: PhantomData,
            group: PhantomData,
            assignor: Assignor::default(),
            offset_reset: OffsetReset::default(),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

impl<B, T, G> Builder<B, T, G> {
    pub fn broker(self, broker: impl Into<Url>) -> Builder<Url, T, G> {
        Builder {
            broker: broker.into(),
            topics: self.topics,
            group: self.group,
            assignor: self.assignor,
            offset_reset: self.offset_reset,
            poll_timeout: self.poll_timeout,
        }
    }

    pub fn topics(self, topics: Vec<String>) -> Builder<B, Vec<String>, G> {
        Builder {
            broker: self.broker,
            topics,
            group: self.group,
            assignor: self.assignor,
            offset_reset: self.offset_reset,
            poll_timeout: self.poll_timeout,
        }
    }

    pub fn group(self, group: impl Into<String>) -> Builder<B, T, String> {
        Builder {
            broker: self.broker,
            topics: self.topics,
            group: group.into(),
            assignor: self.assignor,
            offset_reset: self.offset_reset,
            poll_timeout: self.poll_timeout,
        }
    }

    pub fn assignor(self, assignor: Assignor) -> Self {
        Self { assignor, ..self }
    }

    pub fn offset_reset(self, offset_reset: OffsetReset) -> Self {
        Self {
            offset_reset,
            ..self
        }
    }

    pub fn poll_timeout(self, poll_timeout: Duration) -> Self {
        Self {
            poll_timeout,
            ..self
        }
    }
}

impl Builder<Url, Vec<String>, String> {
    pub fn build(self) -> super::Cat {
        super::Cat::Consume(Box::new(Configuration {
            broker: self.broker,
            topics: self.topics,
            group: self.group,
            assignor: self.assignor,
            offset_reset: self.offset_reset,
            poll_timeout: self.poll_timeout,
        }))
    }
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Configuration {
    pub broker: Url,
    pub topics: Vec<String>,
    pub group: String,
    pub assignor: Assignor,
    pub offset_reset: OffsetReset,
    pub poll_timeout: Duration,
}

/// one record as written to the observation sink
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ConsumedRecord {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<String>,
    pub payload: String,
}

impl From<&BorrowedMessage<'_>> for ConsumedRecord {
    fn from(message: &BorrowedMessage<'_>) -> Self {
        Self {
            topic: message.topic().into(),
            partition: message.partition(),
            offset: message.offset(),
            key: message
                .key()
                .map(|key| String::from_utf8_lossy(key).into_owned()),
            payload: message
                .payload()
                .map(|payload| String::from_utf8_lossy(payload).into_owned())
                .unwrap_or_default(),
        }
    }
}

/// a record is only observable while its partition is held
fn admitted(session: &SharedSession, record: &ConsumedRecord) -> bool {
    session.owns(&record.topic, record.partition)
}

#[derive(Clone, Debug)]
pub(crate) struct Consume {
    configuration: Configuration,
}

impl From<Configuration> for Consume {
    fn from(configuration: Configuration) -> Self {
        Self { configuration }
    }
}

impl Consume {
    pub(crate) async fn main(self) -> Result<()> {
        let configuration = self.configuration;
        debug!(?configuration);

        let config = ConsumerConfig::new(configuration.broker.clone())
            .group(configuration.group.clone())
            .topics(configuration.topics.clone())
            .assignor(configuration.assignor)
            .offset_reset(configuration.offset_reset);

        let (consumer, session) =
            kafpipe_client::consumer::subscribe(&config, ConsumerCallbacks::default())?;
        info!(
            client = CLIENT_ID,
            group = %configuration.group,
            topics = ?configuration.topics,
            "created consumer"
        );

        let mut sink = FramedWrite::new(stdout(), LinesCodec::new());

        let mut interrupt_signal = signal(SignalKind::interrupt())?;
        let mut terminate_signal = signal(SignalKind::terminate())?;

        loop {
            tokio::select! {
                interrupt = interrupt_signal.recv() => {
                    debug!(?interrupt);
                    break;
                }

                terminate = terminate_signal.recv() => {
                    debug!(?terminate);
                    break;
                }

                polled = timeout(configuration.poll_timeout, consumer.recv()) => match polled {
                    Err(_elapsed) => {
                        if session.with(|session| session.note_timeout()) {
                            info!(poll_timeout = ?configuration.poll_timeout, "no messages");
                        }
                    }

                    // recoverable; the loop continues
                    Ok(Err(error)) => warn!(%error, "consume"),

                    Ok(Ok(message)) => {
                        session.with(|session| session.note_activity());

                        let record = ConsumedRecord::from(&message);
                        if admitted(&session, &record) {
                            sink.send(serde_json::to_string(&record)?).await?;
                        } else {
                            debug!(
                                topic = %record.topic,
                                partition = record.partition,
                                "dropped record for unowned partition"
                            );
                        }
                    }
                }
            }
        }

        // leave the group cleanly before the connection closes
        consumer.unsubscribe();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use kafpipe_client::TopicPartition;
    use serde_json::json;

    use crate::Error;

    use super::*;

    const T1: &str = "t1";

    fn record(partition: i32) -> ConsumedRecord {
        ConsumedRecord {
            topic: T1.into(),
            partition,
            offset: 0,
            key: Some("k1".into()),
            payload: "hello".into(),
        }
    }

    #[test]
    fn record_serialises_for_the_sink() -> Result<(), Error> {
        let record = record(0);

        assert_eq!(
            json!({
                "topic": "t1",
                "partition": 0,
                "offset": 0,
                "key": "k1",
                "payload": "hello",
            }),
            serde_json::to_value(&record)?
        );

        Ok(())
    }

    #[test]
    fn absent_key_serialises_as_null() -> Result<(), Error> {
        let record = ConsumedRecord {
            key: None,
            ..record(0)
        };

        assert_eq!(
            json!(null),
            serde_json::to_value(&record)?
                .get("key")
                .cloned()
                .expect("key")
        );

        Ok(())
    }

    #[test]
    fn owned_partition_is_admitted() {
        let session = SharedSession::default();
        session.with(|session| session.assign([TopicPartition::new(T1, 0)]));

        assert!(admitted(&session, &record(0)));
        assert!(!admitted(&session, &record(1)));
    }

    #[test]
    fn revoked_partition_is_dropped() {
        let session = SharedSession::default();
        session.with(|session| session.assign([TopicPartition::new(T1, 0)]));
        assert!(admitted(&session, &record(0)));

        _ = session.with(|session| session.revoke([TopicPartition::new(T1, 0)]));

        assert!(!admitted(&session, &record(0)));
    }
}
