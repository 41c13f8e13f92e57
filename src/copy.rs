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

//! Streaming copy between two [`Driver`]s, and the writeback-then-evict
//! primitive shared by the eviction and cache-expiration controllers
//! (§4.5/§4.6).

use log::debug;

use crate::error::{ErrorKind, Result};
use crate::metadata::META_CACHED_AT;
use crate::Driver;

/// Bounded chunk size for streaming a single object between tiers. Chosen to
/// bound per-object memory use regardless of object size, the same
/// trade-off the teacher's `WholeCacheReader` makes at the whole-object
/// granularity but which a cold-tier writeback cannot afford for large
/// objects.
pub const COPY_CHUNK_SIZE: u64 = 8 * 1024 * 1024;

/// Copy `bucket/object` from `src` to `dst`, a chunk at a time, overwriting
/// whatever is already at the destination. Returns the total number of
/// bytes copied.
pub async fn stream_copy(
    src: &dyn Driver,
    dst: &dyn Driver,
    bucket: &str,
    object: &str,
) -> Result<u64> {
    match dst.create_bucket(bucket).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::Exists => {}
        Err(e) => return Err(e),
    }

    let mut offset = 0u64;
    let mut total = 0u64;
    loop {
        let chunk = src.read_object(bucket, object, offset, COPY_CHUNK_SIZE).await?;
        let len = chunk.data.len() as u64;
        if len > 0 {
            dst.write_object(bucket, object, chunk.data, offset).await?;
            offset += len;
            total += len;
        }
        if chunk.done {
            break;
        }
    }
    Ok(total)
}

/// Stream `bucket/object` from `hot` to `cold`, clear the named cache
/// metadata entries on the cold copy, then delete the hot copy. Used by
/// eviction (clearing `CachedAt` and `ExpireFromCache`) and cache-expiration
/// (clearing only `CachedAt`, or both — see §4.5/§4.6).
///
/// Deleting a metadata entry that is already absent is not an error: the
/// entry may simply never have been set.
pub async fn writeback_and_evict(
    hot: &dyn Driver,
    cold: &dyn Driver,
    bucket: &str,
    object: &str,
    metadata_names_to_clear: &[&str],
) -> Result<()> {
    let copied = stream_copy(hot, cold, bucket, object).await?;
    debug!("wrote back {copied} bytes for {bucket}/{object} before evicting from hot tier");

    for name in metadata_names_to_clear {
        match cold.delete_object_metadata(bucket, object, name).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotExists => {}
            Err(e) => return Err(e),
        }
    }

    hot.delete_object(bucket, object).await
}

/// Stamp the cold copy of `bucket/object` with the current time as
/// `CachedAt`, recording when it was last pulled into the hot tier. Used by
/// the cache adapter immediately after a successful populate (§4.3).
pub async fn stamp_cached_at(cold: &dyn Driver, bucket: &str, object: &str, at: f64) -> Result<()> {
    cold.create_object_metadata(bucket, object, META_CACHED_AT, crate::metadata::encode_f64(at))
        .await
}
