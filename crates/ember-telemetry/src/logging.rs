// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! `env_logger` bootstrap. `RUST_LOG` always wins over the default filter.

use env_logger::{Builder, Env};
use log::SetLoggerError;

fn builder(default_filter: &str) -> Builder {
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter));
    builder.format_timestamp_millis();
    builder
}

/// Installs the global logger.
///
/// # Panics
/// Panics if a logger was already installed. Binaries call this once at startup.
pub fn init(default_filter: &str) {
    builder(default_filter).init();
}

/// Installs the global logger unless one is already installed.
pub fn try_init(default_filter: &str) -> Result<(), SetLoggerError> {
    builder(default_filter).try_init()
}

/// Installs a logger that writes through the test harness' captured output.
pub fn init_for_tests() {
    let _ = builder("debug").is_test(true).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_installation_is_refused_without_panicking() {
        init_for_tests();
        assert!(try_init("info").is_err());
        log::debug!("logger is installed");
    }
}
