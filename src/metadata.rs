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

//! The data model shared by every [`crate::Driver`]: object/bucket info,
//! paginated list results, chunked reads, and the reserved metadata names
//! the cache adapter and controllers use to communicate through the cold
//! store.

use bytes::Bytes;

use crate::error::{Error, ErrorKind, Result};

/// Time the hot copy was last populated. Set by the cache adapter, read by
/// the eviction and cache-expiration controllers.
pub const META_CACHED_AT: &str = "CachedAt";
/// Absolute deadline after which a hot copy must be written back to cold.
/// Set by the user, read by the cache-expiration controller.
pub const META_EXPIRE_FROM_CACHE: &str = "ExpireFromCache";
/// Absolute deadline after which a cold object is deleted.
/// Set by the user, read by the object-expiration controller.
pub const META_EXPIRES_AT: &str = "ExpiresAt";
/// Seconds past last-modification after which an object is frozen
/// read-only. Set by the user, read by the read-only-after controller.
pub const META_READ_ONLY_AFTER: &str = "ReadOnlyAfter";

/// Encode a wall-clock timestamp as the reserved 8-byte little-endian
/// IEEE-754 double every timestamp-valued metadata entry uses.
pub fn encode_f64(value: f64) -> Bytes {
    Bytes::copy_from_slice(&value.to_le_bytes())
}

/// Decode a reserved timestamp metadata value. Per §7 item 5, a value that
/// is not exactly 8 bytes is a metadata parse error the caller should treat
/// as "skip this object", not a hard failure.
pub fn decode_f64(bytes: &[u8]) -> Result<f64> {
    let arr: [u8; 8] = bytes.try_into().map_err(|_| {
        Error::new(
            ErrorKind::InvalidArgs,
            format!("expected 8-byte timestamp metadata, got {} bytes", bytes.len()),
        )
    })?;
    Ok(f64::from_le_bytes(arr))
}

/// Bucket statistics, only populated when `info_bucket` is called with
/// `include_stats = true`.
#[derive(Clone, Debug, PartialEq)]
pub struct BucketStats {
    pub size: u64,
    pub count: u64,
    pub last_access: f64,
    pub last_modification: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BucketInfo {
    pub creation: f64,
    pub stats: Option<BucketStats>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObjectInfo {
    pub is_bad: bool,
    pub size: u64,
    pub creation: f64,
    pub last_access: f64,
    pub last_modification: f64,
    pub last_change: f64,
    pub read_only: bool,
}

/// A chunk of bytes returned by `read_object`/`read_object_metadata`. As
/// long as `done` is `false` there is more data to fetch; the caller
/// re-invokes with the offset advanced by `data.len()`.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadChunk {
    pub data: Bytes,
    pub done: bool,
}

/// A page of a lazily-paginated list call. As long as `done` is `false`
/// there are more pages; the caller re-invokes with `offset = next_offset`.
#[derive(Clone, Debug, PartialEq)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub done: bool,
    pub next_offset: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PartInfo {
    pub part_number: u32,
    pub size: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StorageInfo {
    pub total_space: u64,
    pub used_space: u64,
}
