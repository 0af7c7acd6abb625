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

//! Kafpipe Client
//!
//! Typed configuration, callback capabilities and the consumer session
//! state machine, layered over the rdkafka client runtime. Every setting
//! is validated before a client is created: configuration is fail-fast,
//! never best-effort.

use std::{fmt, io, result, sync::Arc};

use rdkafka::error::KafkaError;
use url::Url;

mod callback;
mod config;
pub mod consumer;
pub mod producer;
mod session;

pub use callback::{
    ClientEvent, ConsumerCallbacks, DeliveryCallback, DeliveryReport, EventCallback,
    ProducerCallbacks, RebalanceCallback, RebalanceEvent,
};
pub use config::{Assignor, CLIENT_ID, ConsumerConfig, FlushPolicy, OffsetReset, ProducerConfig};
pub use consumer::{GroupContext, GroupStream};
pub use producer::{DeliveryContext, LineProducer};
pub use session::{Session, SessionState, SharedSession, TopicPartition};

pub type Result<T, E = Error> = result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    EmptyGroupId,
    Io(Arc<io::Error>),
    Kafka(#[from] KafkaError),
    NoBrokerEndpoint(Url),
    NoTopics,
    UnknownAssignor(String),
    UnknownOffsetReset(String),
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
