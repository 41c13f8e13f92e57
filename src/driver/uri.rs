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

//! URI-scheme dispatch: turns a `scheme://location` string (as passed to
//! `--hot_storage`/`--cold_storage`, §6.1/§6.2) into a boxed [`Driver`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::driver::fs::FsDriver;
use crate::driver::memory::MemoryDriver;
use crate::error::{Error, ErrorKind, Result};
use crate::Driver;

/// The backends this build knows how to construct. Cloud backends (S3, GCS,
/// ...) are out of scope here (§2 Non-goals) but would be added as new
/// variants the same way the teacher's own `Scheme` enum grows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    Memory,
    Fs,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Scheme::Memory => "memory",
            Scheme::Fs => "fs",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "memory" => Ok(Scheme::Memory),
            "fs" => Ok(Scheme::Fs),
            other => Err(Error::new(
                ErrorKind::InvalidArgs,
                format!("unknown storage scheme '{other}'"),
            )),
        }
    }
}

/// Split a `scheme://location` URI into its two halves.
fn split_uri(uri: &str) -> Result<(&str, &str)> {
    uri.split_once("://").ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidArgs,
            format!("storage URI '{uri}' is missing a 'scheme://' prefix"),
        )
    })
}

/// Build a [`Driver`] from a `--hot_storage`/`--cold_storage`-style URI.
///
/// `memory://` ignores its location and returns a fresh, empty in-memory
/// store. `fs:///absolute/path` (or a relative path) roots a filesystem
/// store at that directory, creating it if necessary.
pub async fn build_driver(uri: &str) -> Result<Arc<dyn Driver>> {
    let (scheme, location) = split_uri(uri)?;
    match scheme.parse::<Scheme>()? {
        Scheme::Memory => Ok(Arc::new(MemoryDriver::default())),
        Scheme::Fs => {
            let root = if location.is_empty() { "." } else { location };
            Ok(Arc::new(FsDriver::new(root).await?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_schemes() {
        assert_eq!("memory".parse::<Scheme>().unwrap(), Scheme::Memory);
        assert_eq!("fs".parse::<Scheme>().unwrap(), Scheme::Fs);
        assert!("s3".parse::<Scheme>().is_err());
    }

    #[tokio::test]
    async fn builds_memory_driver() {
        let driver = build_driver("memory://").await.unwrap();
        driver.create_bucket("b").await.unwrap();
        assert_eq!(driver.list_buckets().await.unwrap(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn builds_fs_driver() {
        let dir = tempfile::tempdir().unwrap();
        let uri = format!("fs://{}", dir.path().display());
        let driver = build_driver(&uri).await.unwrap();
        driver.create_bucket("b").await.unwrap();
        assert_eq!(driver.list_buckets().await.unwrap(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn rejects_missing_scheme_separator() {
        assert!(build_driver("not-a-uri").await.is_err());
    }
}
