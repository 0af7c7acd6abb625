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

use std::str::FromStr;

use rdkafka::ClientConfig;
use url::Url;

use crate::{Error, Result};

/// client.id presented to the broker by every client this crate creates
pub const CLIENT_ID: &str = env!("CARGO_PKG_NAME");

/// partition assignment strategy used by the group coordinator
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Assignor {
    Range,
    #[default]
    RoundRobin,
    CooperativeSticky,
}

impl Assignor {
    const COOPERATIVE_STICKY: &str = "cooperative-sticky";
    const RANGE: &str = "range";
    const ROUND_ROBIN: &str = "roundrobin";
}

impl AsRef<str> for Assignor {
    fn as_ref(&self) -> &str {
        match self {
            Self::CooperativeSticky => Self::COOPERATIVE_STICKY,
            Self::Range => Self::RANGE,
            Self::RoundRobin => Self::ROUND_ROBIN,
        }
    }
}

impl FromStr for Assignor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::COOPERATIVE_STICKY => Ok(Self::CooperativeSticky),
            Self::RANGE => Ok(Self::Range),
            Self::ROUND_ROBIN => Ok(Self::RoundRobin),
            otherwise => Err(Error::UnknownAssignor(otherwise.into())),
        }
    }
}

/// where to begin fetching when a partition has no committed offset
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum OffsetReset {
    Earliest,
    #[default]
    Latest,
}

impl OffsetReset {
    const EARLIEST: &str = "earliest";
    const LATEST: &str = "latest";
}

impl AsRef<str> for OffsetReset {
    fn as_ref(&self) -> &str {
        match self {
            Self::Earliest => Self::EARLIEST,
            Self::Latest => Self::LATEST,
        }
    }
}

impl FromStr for OffsetReset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::EARLIEST => Ok(Self::Earliest),
            Self::LATEST => Ok(Self::Latest),
            otherwise => Err(Error::UnknownOffsetReset(otherwise.into())),
        }
    }
}

/// when the producer waits for its send buffer to drain
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum FlushPolicy {
    EverySend,
    #[default]
    OnClose,
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ConsumerConfig {
    broker: Url,
    group: String,
    topics: Vec<String>,
    assignor: Assignor,
    offset_reset: OffsetReset,
}

impl ConsumerConfig {
    pub fn new(broker: Url) -> Self {
        Self {
            broker,
            group: String::default(),
            topics: Vec::default(),
            assignor: Assignor::default(),
            offset_reset: OffsetReset::default(),
        }
    }

    pub fn group(self, group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            ..self
        }
    }

    pub fn topics(self, topics: Vec<String>) -> Self {
        Self { topics, ..self }
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

    pub fn subscription(&self) -> &[String] {
        &self.topics
    }

    /// materialise the client settings, validating every one first
    pub fn client_config(&self) -> Result<ClientConfig> {
        let servers = bootstrap_servers(&self.broker)?;

        if self.group.is_empty() {
            return Err(Error::EmptyGroupId);
        }

        if self.topics.is_empty() {
            return Err(Error::NoTopics);
        }

        let mut config = ClientConfig::new();
        _ = config
            .set("bootstrap.servers", servers)
            .set("group.id", self.group.as_str())
            .set("partition.assignment.strategy", self.assignor.as_ref())
            .set("auto.offset.reset", self.offset_reset.as_ref())
            .set("client.id", CLIENT_ID);

        Ok(config)
    }
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ProducerConfig {
    broker: Url,
}

impl ProducerConfig {
    pub fn new(broker: Url) -> Self {
        Self { broker }
    }

    pub fn client_config(&self) -> Result<ClientConfig> {
        let servers = bootstrap_servers(&self.broker)?;

        let mut config = ClientConfig::new();
        _ = config
            .set("bootstrap.servers", servers)
            .set("client.id", CLIENT_ID);

        Ok(config)
    }
}

fn bootstrap_servers(broker: &Url) -> Result<String> {
    broker
        .host_str()
        .zip(broker.port())
        .map(|(host, port)| format!("{host}:{port}"))
        .ok_or_else(|| Error::NoBrokerEndpoint(broker.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broker() -> Url {
        Url::parse("tcp://localhost:9092").expect("broker url")
    }

    #[test]
    fn consumer_settings_materialise() -> Result<(), Error> {
        let config = ConsumerConfig::new(broker())
            .group("g1")
            .topics(vec!["t1".into()])
            .assignor(Assignor::RoundRobin)
            .offset_reset(OffsetReset::Latest)
            .client_config()?;

        assert_eq!(Some("localhost:9092"), config.get("bootstrap.servers"));
        assert_eq!(Some("g1"), config.get("group.id"));
        assert_eq!(
            Some("roundrobin"),
            config.get("partition.assignment.strategy")
        );
        assert_eq!(Some("latest"), config.get("auto.offset.reset"));
        assert_eq!(Some(CLIENT_ID), config.get("client.id"));

        Ok(())
    }

    #[test]
    fn empty_group_is_rejected() {
        let config = ConsumerConfig::new(broker()).topics(vec!["t1".into()]);

        assert!(matches!(config.client_config(), Err(Error::EmptyGroupId)));
    }

    #[test]
    fn subscription_is_required() {
        let config = ConsumerConfig::new(broker()).group("g1");

        assert!(matches!(config.client_config(), Err(Error::NoTopics)));
    }

    #[test]
    fn broker_without_port_is_rejected() {
        let broker = Url::parse("tcp://localhost").expect("broker url");
        let config = ConsumerConfig::new(broker)
            .group("g1")
            .topics(vec!["t1".into()]);

        assert!(matches!(
            config.client_config(),
            Err(Error::NoBrokerEndpoint(_))
        ));
    }

    #[test]
    fn producer_settings_materialise() -> Result<(), Error> {
        let config = ProducerConfig::new(broker()).client_config()?;

        assert_eq!(Some("localhost:9092"), config.get("bootstrap.servers"));
        assert_eq!(Some(CLIENT_ID), config.get("client.id"));

        Ok(())
    }

    #[test]
    fn assignor_names() -> Result<(), Error> {
        assert_eq!(Assignor::Range, Assignor::from_str("range")?);
        assert_eq!(Assignor::RoundRobin, Assignor::from_str("roundrobin")?);
        assert_eq!(
            Assignor::CooperativeSticky,
            Assignor::from_str("cooperative-sticky")?
        );
        assert_eq!("roundrobin", Assignor::default().as_ref());
        assert!(matches!(
            Assignor::from_str("sticky"),
            Err(Error::UnknownAssignor(_))
        ));

        Ok(())
    }

    #[test]
    fn offset_reset_names() -> Result<(), Error> {
        assert_eq!(OffsetReset::Earliest, OffsetReset::from_str("earliest")?);
        assert_eq!(OffsetReset::Latest, OffsetReset::from_str("latest")?);
        assert!(matches!(
            OffsetReset::from_str("none"),
            Err(Error::UnknownOffsetReset(_))
        ));

        Ok(())
    }
}
