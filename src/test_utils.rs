// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Common test utilities shared by this crate's test modules.

use std::sync::Once;

use simplelog::{Config, LevelFilter, SimpleLogger};

static LOGGER_INIT: Once = Once::new();

/// Installs a process-wide logger at `Debug` level, once, so `RUST_LOG`-free
/// test runs still surface `log::debug!`/`log::trace!` output when run with
/// `--nocapture`. Safe to call from every test; later calls are no-ops.
pub fn init_logger() {
    LOGGER_INIT.call_once(|| {
        let _ = SimpleLogger::init(LevelFilter::Debug, Config::default());
    });
}
