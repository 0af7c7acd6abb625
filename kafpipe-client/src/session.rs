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

use std::{
    collections::BTreeSet,
    fmt, mem,
    sync::{Arc, Mutex, PoisonError},
};

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: i32,
}

impl TopicPartition {
    pub fn new(topic: impl Into<String>, partition: i32) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.topic, self.partition)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum SessionState {
    #[default]
    Unassigned,
    Assigned,
}

/// Group membership state for one consumer instance.
///
/// The held partition set changes only on rebalance notifications: an
/// assign adds the listed partitions, a revoke removes them. Eager
/// protocols list the whole set both ways; the cooperative protocol
/// lists only the delta, leaving retained partitions held.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Session {
    assignment: BTreeSet<TopicPartition>,
    state: SessionState,
    idle: bool,
}

impl Session {
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn assignment(&self) -> &BTreeSet<TopicPartition> {
        &self.assignment
    }

    pub fn assign(&mut self, partitions: impl IntoIterator<Item = TopicPartition>) {
        self.assignment.extend(partitions);
        self.state = if self.assignment.is_empty() {
            SessionState::Unassigned
        } else {
            SessionState::Assigned
        };
        self.idle = false;
    }

    pub fn revoke(
        &mut self,
        partitions: impl IntoIterator<Item = TopicPartition>,
    ) -> BTreeSet<TopicPartition> {
        let revoked = partitions
            .into_iter()
            .filter(|partition| self.assignment.remove(partition))
            .collect();

        if self.assignment.is_empty() {
            self.state = SessionState::Unassigned;
        }
        self.idle = false;

        revoked
    }

    pub fn owns(&self, topic: &str, partition: i32) -> bool {
        self.assignment
            .iter()
            .any(|held| held.topic == topic && held.partition == partition)
    }

    /// true only for the first timeout since the last activity, so
    /// repeated empty polls collapse into a single notice
    pub fn note_timeout(&mut self) -> bool {
        !mem::replace(&mut self.idle, true)
    }

    pub fn note_activity(&mut self) {
        self.idle = false;
    }
}

/// Session shared with the client runtime's callback context.
///
/// All callback-driven mutation is serialised behind the lock; a poisoned
/// lock yields the inner state rather than propagating the panic.
#[derive(Clone, Debug, Default)]
pub struct SharedSession(Arc<Mutex<Session>>);

impl SharedSession {
    pub fn with<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut Session) -> T,
    {
        let mut session = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut session)
    }

    pub fn owns(&self, topic: &str, partition: i32) -> bool {
        self.with(|session| session.owns(topic, partition))
    }

    pub fn snapshot(&self) -> Session {
        self.with(|session| session.clone())
    }
}
