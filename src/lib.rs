// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod analytics;
pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod currency;
pub mod dashboard;
pub mod db;
pub mod errors;
pub mod ledger;
pub mod models;
pub mod performance;
pub mod store;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Installs the stderr log subscriber; `RUST_LOG` overrides the default
/// `adledger=info` filter.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("adledger=info"));
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    });
}
