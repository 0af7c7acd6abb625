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

use std::{fmt, result};

mod cli;

pub use cli::Cli;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    Cat(Box<kafpipe_cat::Error>),
}

impl From<kafpipe_cat::Error> for Error {
    fn from(value: kafpipe_cat::Error) -> Self {
        Self::Cat(Box::new(value))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

pub type Result<T, E = Error> = result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cat_errors_surface_through_the_cli() {
        let error = Error::from(kafpipe_cat::Error::from(
            kafpipe_client::Error::NoTopics,
        ));

        assert!(matches!(&error, Error::Cat(cat)
            if matches!(**cat, kafpipe_cat::Error::Client(_))));
        assert!(error.to_string().contains("NoTopics"));
    }
}
