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

use std::{process, time::Duration};

use clap::{Parser, Subcommand};
use kafpipe_cat::Cat;
use kafpipe_client::{Assignor, FlushPolicy, OffsetReset};
use tracing::debug;
use url::Url;

use crate::Result;

const DEFAULT_BROKER: &str = "tcp://localhost:9092";

#[derive(Clone, Debug, Parser)]
#[command(name = "kafpipe", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Publish one message per line of standard input to a topic
    Produce {
        #[arg(long, env = "BROKER", default_value = DEFAULT_BROKER)]
        broker: Url,

        #[arg(long)]
        topic: String,

        /// Key applied to every produced message
        #[arg(long)]
        key: Option<String>,

        /// Flush the send buffer after every send rather than at close
        #[arg(long)]
        flush_every_send: bool,

        /// Bounded wait for outstanding deliveries when flushing, in milliseconds
        #[arg(long, default_value = "5000")]
        flush_timeout_ms: u64,
    },

    /// Join a consumer group and print records as JSON lines
    Consume {
        #[arg(long, env = "BROKER", default_value = DEFAULT_BROKER)]
        broker: Url,

        /// Topic to subscribe to, repeatable
        #[arg(long, required = true)]
        topic: Vec<String>,

        #[arg(long, env = "GROUP", default_value = "kafpipe")]
        group: String,

        /// Partition assignment strategy: range, roundrobin or cooperative-sticky
        #[arg(long, default_value = "roundrobin")]
        assignor: Assignor,

        /// Where to begin without a committed offset: earliest or latest
        #[arg(long, default_value = "latest")]
        offset_reset: OffsetReset,

        #[arg(long, default_value = "1000")]
        poll_timeout_ms: u64,
    },
}

impl From<Command> for Cat {
    fn from(value: Command) -> Self {
        match value {
            Command::Produce {
                broker,
                topic,
                key,
                flush_every_send,
                flush_timeout_ms,
            } => Cat::produce()
                .broker(broker)
                .topic(topic)
                .key(key)
                .flush(if flush_every_send {
                    FlushPolicy::EverySend
                } else {
                    FlushPolicy::OnClose
                })
                .flush_timeout(Duration::from_millis(flush_timeout_ms))
                .build(),

            Command::Consume {
                broker,
                topic,
                group,
                assignor,
                offset_reset,
                poll_timeout_ms,
            } => Cat::consume()
                .broker(broker)
                .topics(topic)
                .group(group)
                .assignor(assignor)
                .offset_reset(offset_reset)
                .poll_timeout(Duration::from_millis(poll_timeout_ms))
                .build(),
        }
    }
}

impl Cli {
    pub async fn main() -> Result<()> {
        debug!(pid = process::id());

        let cli = Cli::parse();

        Cat::from(cli.command).main().await.map_err(Into::into)
    }
}
