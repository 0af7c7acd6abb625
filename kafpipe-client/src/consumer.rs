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

use std::{collections::BTreeSet, fmt};

use rdkafka::{
    ClientContext, TopicPartitionList,
    consumer::{Consumer as _, ConsumerContext, Rebalance, StreamConsumer},
    error::{KafkaError, KafkaResult},
};
use tracing::{debug, warn};

use crate::{
    Result,
    callback::{ClientEvent, ConsumerCallbacks, RebalanceEvent},
    config::ConsumerConfig,
    session::{SharedSession, TopicPartition},
};

/// group consumer whose rebalance notifications drive the session
pub type GroupStream = StreamConsumer<GroupContext>;

pub struct GroupContext {
    session: SharedSession,
    callbacks: ConsumerCallbacks,
}

impl GroupContext {
    pub fn new(session: SharedSession, callbacks: ConsumerCallbacks) -> Self {
        Self { session, callbacks }
    }

    fn partitions(assignment: &TopicPartitionList) -> BTreeSet<TopicPartition> {
        assignment
            .elements()
            .iter()
            .map(|element| TopicPartition::new(element.topic(), element.partition()))
            .collect()
    }
}

impl fmt::Debug for GroupContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupContext")
            .field("session", &self.session)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

impl ClientContext for GroupContext {
    fn error(&self, error: KafkaError, reason: &str) {
        warn!(%error, reason);
        self.callbacks.on_event(&ClientEvent {
            error: error.to_string(),
            reason: reason.into(),
        });
    }
}

impl ConsumerContext for GroupContext {
    fn pre_rebalance(&self, rebalance: &Rebalance<'_>) {
        match rebalance {
            Rebalance::Assign(assignment) => debug!(assigning = assignment.count()),

            // ownership ends before the runtime revokes, so in-flight
            // messages from these partitions are dropped, not processed;
            // the cooperative protocol lists only the removed partitions
            Rebalance::Revoke(assignment) => {
                debug!(revoking = assignment.count());
                let revoking = Self::partitions(assignment);
                let revoked = self.session.with(|session| session.revoke(revoking));
                self.callbacks.on_rebalance(&RebalanceEvent::Revoked(revoked));
            }

            // terminal for this rebalance attempt only, membership unaffected
            Rebalance::Error(error) => {
                warn!(%error, "rebalance");
                self.callbacks
                    .on_rebalance(&RebalanceEvent::Error(error.to_string()));
            }
        }
    }

    fn post_rebalance(&self, rebalance: &Rebalance<'_>) {
        if let Rebalance::Assign(assignment) = rebalance {
            let assigned = Self::partitions(assignment);
            debug!(?assigned);

            self.session
                .with(|session| session.assign(assigned.clone()));
            self.callbacks
                .on_rebalance(&RebalanceEvent::Assigned(assigned));
        }
    }

    fn commit_callback(&self, result: KafkaResult<()>, offsets: &TopicPartitionList) {
        debug!(?result, ?offsets);
    }
}

/// Create the consumer, hand its context the callbacks and session, and
/// subscribe. Any configuration error fails here, before a client exists.
pub fn subscribe(
    config: &ConsumerConfig,
    callbacks: ConsumerCallbacks,
) -> Result<(GroupStream, SharedSession)> {
    let session = SharedSession::default();
    let context = GroupContext::new(session.clone(), callbacks);

    let consumer: GroupStream = config.client_config()?.create_with_context(context)?;

    let subscription: Vec<&str> = config.subscription().iter().map(String::as_str).collect();
    consumer.subscribe(&subscription)?;

    Ok((consumer, session))
}
