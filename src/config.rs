// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! `cachectl`'s configuration surface (§6.2): parsed from the command
//! line, with every tunable also readable from the environment so the
//! binary can be driven entirely by a process supervisor's env block.

use std::time::Duration;

use clap::Parser;

use crate::error::{Error, ErrorKind, Result};

const DEFAULT_WATERMARK_LOW: u8 = 50;
const DEFAULT_WATERMARK_HIGH: u8 = 90;
const DEFAULT_EXPIRES_TIME: f64 = 1800.0;
const DEFAULT_EXPIRE_INTERVAL: u64 = 1200;
const DEFAULT_EVICT_INTERVAL: u64 = 600;

/// Tiered object-storage cache controller.
#[derive(Parser, Debug, Clone)]
#[command(name = "cachectl", version, about)]
pub struct Config {
    /// Hot (cache) storage URI, e.g. `memory://` or `fs:///var/cache/hot`.
    #[arg(long, env = "CACHECTL_HOT_STORAGE")]
    pub hot_storage: String,

    /// Cold storage URI, e.g. `fs:///var/lib/cold`.
    #[arg(long, env = "CACHECTL_COLD_STORAGE")]
    pub cold_storage: String,

    /// Start evicting once hot usage reaches this percent and evict down
    /// to it. Must be an integer in [0, 100].
    #[arg(long, env = "CACHECTL_WATERMARK_LOW", default_value_t = DEFAULT_WATERMARK_LOW)]
    pub watermark_low: u8,

    /// Begin an eviction pass once hot usage reaches this percent. Must be
    /// an integer in [0, 100].
    #[arg(long, env = "CACHECTL_WATERMARK_HIGH", default_value_t = DEFAULT_WATERMARK_HIGH)]
    pub watermark_high: u8,

    /// Maximum seconds an object may stay in the hot tier before
    /// cache-expiration writes it back, absent an explicit
    /// `ExpireFromCache` deadline.
    #[arg(long, env = "CACHECTL_EXPIRES_TIME", default_value_t = DEFAULT_EXPIRES_TIME)]
    pub expires_time: f64,

    /// Seconds between cache-expiration passes.
    #[arg(long, env = "CACHECTL_EXPIRE_INTERVAL", default_value_t = DEFAULT_EXPIRE_INTERVAL)]
    pub expire_interval: u64,

    /// Seconds between eviction passes.
    #[arg(long, env = "CACHECTL_EVICT_INTERVAL", default_value_t = DEFAULT_EVICT_INTERVAL)]
    pub evict_interval: u64,
}

impl Config {
    /// Validate the watermark percentages and that low doesn't exceed high.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("watermark_low", self.watermark_low),
            ("watermark_high", self.watermark_high),
        ] {
            if value > 100 {
                return Err(Error::new(
                    ErrorKind::InvalidArgs,
                    format!("{name} must be between 0 and 100, got {value}"),
                ));
            }
        }
        if self.watermark_low > self.watermark_high {
            return Err(Error::new(
                ErrorKind::InvalidArgs,
                format!(
                    "watermark_low ({}) must not exceed watermark_high ({})",
                    self.watermark_low, self.watermark_high
                ),
            ));
        }
        if self.expires_time < 0.0 {
            return Err(Error::new(ErrorKind::InvalidArgs, "expires_time must not be negative"));
        }
        Ok(())
    }

    /// `watermark_low` as a percentage for the eviction controller's
    /// floating-point fill-ratio arithmetic.
    pub fn watermark_low_pct(&self) -> f64 {
        self.watermark_low as f64
    }

    /// `watermark_high` as a percentage for the eviction controller's
    /// floating-point fill-ratio arithmetic.
    pub fn watermark_high_pct(&self) -> f64 {
        self.watermark_high as f64
    }

    pub fn expire_interval_duration(&self) -> Duration {
        Duration::from_secs(self.expire_interval)
    }

    pub fn evict_interval_duration(&self) -> Duration {
        Duration::from_secs(self.evict_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            hot_storage: "memory://".into(),
            cold_storage: "memory://".into(),
            watermark_low: DEFAULT_WATERMARK_LOW,
            watermark_high: DEFAULT_WATERMARK_HIGH,
            expires_time: DEFAULT_EXPIRES_TIME,
            expire_interval: DEFAULT_EXPIRE_INTERVAL,
            evict_interval: DEFAULT_EVICT_INTERVAL,
        }
    }

    #[test]
    fn defaults_validate() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_watermark() {
        let mut c = base();
        c.watermark_high = 150;
        assert_eq!(c.validate().unwrap_err().kind(), ErrorKind::InvalidArgs);
    }

    #[test]
    fn rejects_low_above_high() {
        let mut c = base();
        c.watermark_low = 95;
        c.watermark_high = 90;
        assert_eq!(c.validate().unwrap_err().kind(), ErrorKind::InvalidArgs);
    }
}
