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

//! [`CacheAdapter`]: a [`Driver`] that sits in front of a cold object store,
//! populating a hot tier on read miss and writing through it on write
//! (§4.3). Every call the hot tier cannot usefully answer (because the
//! object is absent, or because the hot tier itself is unusable) is
//! transparently satisfied from cold.
//!
//! This is the layering equivalent of the teacher's `ContentCacheLayer`:
//! both wrap an inner store with an outer one and populate the outer store
//! lazily on miss. The difference is direction and durability — the
//! teacher's content cache is a local read accelerator for a remote store
//! it never writes back to; this adapter's hot tier is itself a complete,
//! writable store that the background controllers periodically drain back
//! to cold.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use log::{debug, warn};

use crate::clock::now;
use crate::copy::{stamp_cached_at, COPY_CHUNK_SIZE};
use crate::error::{ErrorKind, Result};
use crate::metadata::{BucketInfo, ListPage, ObjectInfo, PartInfo, ReadChunk, StorageInfo};
use crate::Driver;

/// Write-through, read-through cache in front of a cold object store.
///
/// `user_id` is carried for API parity with the original system's
/// multi-tenant backends (ACL checks on every call); none of the reference
/// drivers in this crate enforce it, but a backend that does can read it
/// off every `Driver` call this adapter makes by embedding it in its own
/// construction instead — we do not thread it through `Driver` itself
/// because not every operation in the original system took it, and
/// `Driver` here must stay one object-safe trait for every backend (§7
/// Open Question, decided in DESIGN.md).
#[derive(Debug)]
pub struct CacheAdapter {
    hot: Arc<dyn Driver>,
    cold: Arc<dyn Driver>,
}

impl CacheAdapter {
    pub fn new(hot: Arc<dyn Driver>, cold: Arc<dyn Driver>) -> Self {
        Self { hot, cold }
    }

    pub fn hot(&self) -> &Arc<dyn Driver> {
        &self.hot
    }

    pub fn cold(&self) -> &Arc<dyn Driver> {
        &self.cold
    }

    /// Pull the whole object from cold into hot, stamp `CachedAt` on the
    /// cold copy, and return the bytes that were populated.
    async fn populate(&self, bucket: &str, object: &str) -> Result<Bytes> {
        match self.hot.create_bucket(bucket).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::Exists => {}
            Err(e) => return Err(e),
        }

        let mut offset = 0u64;
        let mut data = BytesMut::new();
        loop {
            let chunk = self.cold.read_object(bucket, object, offset, COPY_CHUNK_SIZE).await?;
            offset += chunk.data.len() as u64;
            data.extend_from_slice(&chunk.data);
            if chunk.done {
                break;
            }
        }
        let data = data.freeze();

        self.hot.write_object(bucket, object, data.clone(), 0).await?;
        stamp_cached_at(self.cold.as_ref(), bucket, object, now()).await?;
        debug!("populated {bucket}/{object} into hot tier ({} bytes)", data.len());

        Ok(data)
    }
}

#[async_trait]
impl Driver for CacheAdapter {
    // -- Buckets: always authoritative on cold (§4.3) --------------------
    async fn list_buckets(&self) -> Result<Vec<String>> {
        self.cold.list_buckets().await
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        self.cold.create_bucket(bucket).await
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.cold.delete_bucket(bucket).await
    }

    async fn purge_bucket(&self, bucket: &str) -> Result<()> {
        self.cold.purge_bucket(bucket).await
    }

    async fn info_bucket(&self, bucket: &str, include_stats: bool) -> Result<BucketInfo> {
        self.cold.info_bucket(bucket, include_stats).await
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        offset: u64,
        count: u64,
    ) -> Result<ListPage<String>> {
        self.cold.list_objects(bucket, prefix, offset, count).await
    }

    async fn list_objects_with_metadata(
        &self,
        bucket: &str,
        metadata_name: &str,
        offset: u64,
    ) -> Result<ListPage<String>> {
        self.cold.list_objects_with_metadata(bucket, metadata_name, offset).await
    }

    async fn info_object(&self, bucket: &str, object: &str) -> Result<ObjectInfo> {
        self.cold.info_object(bucket, object).await
    }

    async fn create_object(&self, bucket: &str, object: &str, data: Bytes) -> Result<()> {
        self.cold.create_object(bucket, object, data).await
    }

    /// Write-through (§4.3): an offset-0 write goes straight to hot (no need
    /// to fetch a copy that is about to be overwritten from its first
    /// byte). A nonzero-offset write must first make sure hot holds the
    /// rest of the object, populating from cold if it doesn't. If the hot
    /// tier itself is unusable, fall back to writing cold directly.
    async fn write_object(&self, bucket: &str, object: &str, data: Bytes, offset: u64) -> Result<()> {
        let hot_result = async {
            if offset == 0 {
                match self.hot.create_bucket(bucket).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::Exists => {}
                    Err(e) => return Err(e),
                }
            } else {
                match self.hot.info_object(bucket, object).await {
                    Ok(_) => {}
                    Err(e) if e.kind() == ErrorKind::NotExists => {
                        self.populate(bucket, object).await?;
                    }
                    Err(e) => return Err(e),
                }
            }
            self.hot.write_object(bucket, object, data.clone(), offset).await
        }
        .await;

        match hot_result {
            Ok(()) => Ok(()),
            Err(e) if e.is_hot_tier_unusable() => {
                warn!("hot tier unusable for write_object({bucket}/{object}), falling back to cold: {e}");
                self.cold.write_object(bucket, object, data, offset).await
            }
            Err(e) => Err(e),
        }
    }

    /// Read-through (§4.3): try hot first. A hot miss populates from cold
    /// and serves the freshly-populated bytes directly (no second round
    /// trip through the hot tier). A hot tier that is unusable falls back
    /// to reading cold, without attempting to populate.
    async fn read_object(&self, bucket: &str, object: &str, offset: u64, size: u64) -> Result<ReadChunk> {
        match self.hot.read_object(bucket, object, offset, size).await {
            Ok(chunk) => Ok(chunk),
            Err(e) if e.kind() == ErrorKind::NotExists => {
                let data = self.populate(bucket, object).await?;
                Ok(slice_populated(&data, offset, size))
            }
            Err(e) if e.is_hot_tier_unusable() => {
                warn!("hot tier unusable for read_object({bucket}/{object}), falling back to cold: {e}");
                self.cold.read_object(bucket, object, offset, size).await
            }
            Err(e) => Err(e),
        }
    }

    /// Same structure as `read_object` (§4.3): a hot miss populates first,
    /// then the file read is reissued against hot; a hot tier that is
    /// unusable falls back to reading straight from cold.
    async fn read_object_to_file(
        &self,
        bucket: &str,
        object: &str,
        offset: u64,
        size: u64,
        dest: &std::path::Path,
    ) -> Result<()> {
        match self.hot.read_object_to_file(bucket, object, offset, size, dest).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotExists => {
                self.populate(bucket, object).await?;
                self.hot.read_object_to_file(bucket, object, offset, size, dest).await
            }
            Err(e) if e.is_hot_tier_unusable() => {
                warn!("hot tier unusable for read_object_to_file({bucket}/{object}), falling back to cold: {e}");
                self.cold.read_object_to_file(bucket, object, offset, size, dest).await
            }
            Err(e) => Err(e),
        }
    }

    async fn delete_object(&self, bucket: &str, object: &str) -> Result<()> {
        let _ = self.hot.delete_object(bucket, object).await;
        self.cold.delete_object(bucket, object).await
    }

    async fn truncate_object(&self, bucket: &str, object: &str, size: u64) -> Result<()> {
        let _ = self.hot.truncate_object(bucket, object, size).await;
        self.cold.truncate_object(bucket, object, size).await
    }

    async fn copy_object(&self, bucket: &str, src: &str, dst: &str, no_overwrite: bool) -> Result<()> {
        self.cold.copy_object(bucket, src, dst, no_overwrite).await
    }

    async fn move_object(&self, bucket: &str, src: &str, dst: &str, no_overwrite: bool) -> Result<()> {
        self.cold.move_object(bucket, src, dst, no_overwrite).await
    }

    async fn exchange_object(&self, bucket: &str, src: &str, dst: &str) -> Result<()> {
        self.cold.exchange_object(bucket, src, dst).await
    }

    async fn touch_object(
        &self,
        bucket: &str,
        object: &str,
        last_access: Option<f64>,
        last_modification: Option<f64>,
    ) -> Result<()> {
        self.cold.touch_object(bucket, object, last_access, last_modification).await
    }

    async fn set_object_permissions(&self, bucket: &str, object: &str, mode: u32) -> Result<()> {
        self.cold.set_object_permissions(bucket, object, mode).await
    }

    async fn make_object_read_only(&self, bucket: &str, object: &str) -> Result<()> {
        self.cold.make_object_read_only(bucket, object).await
    }

    async fn set_object_owner(&self, bucket: &str, object: &str, uid: u32, gid: u32) -> Result<()> {
        self.cold.set_object_owner(bucket, object, uid, gid).await
    }

    async fn create_object_metadata(
        &self,
        bucket: &str,
        object: &str,
        name: &str,
        value: Bytes,
    ) -> Result<()> {
        self.cold.create_object_metadata(bucket, object, name, value).await
    }

    async fn read_object_metadata(&self, bucket: &str, object: &str, name: &str) -> Result<ReadChunk> {
        self.cold.read_object_metadata(bucket, object, name).await
    }

    async fn delete_object_metadata(&self, bucket: &str, object: &str, name: &str) -> Result<()> {
        self.cold.delete_object_metadata(bucket, object, name).await
    }

    async fn list_multiparts(&self, bucket: &str, offset: u64, count: u64) -> Result<ListPage<String>> {
        self.cold.list_multiparts(bucket, offset, count).await
    }

    async fn create_multipart(&self, bucket: &str, object: &str) -> Result<String> {
        self.cold.create_multipart(bucket, object).await
    }

    async fn complete_multipart(&self, multipart_id: &str) -> Result<()> {
        self.cold.complete_multipart(multipart_id).await
    }

    async fn abort_multipart(&self, multipart_id: &str) -> Result<()> {
        self.cold.abort_multipart(multipart_id).await
    }

    async fn list_parts(&self, multipart_id: &str) -> Result<Vec<PartInfo>> {
        self.cold.list_parts(multipart_id).await
    }

    async fn create_part(&self, multipart_id: &str, part_number: u32, data: Bytes) -> Result<()> {
        self.cold.create_part(multipart_id, part_number, data).await
    }

    async fn create_part_copy(
        &self,
        object: &str,
        offset: u64,
        size: u64,
        multipart_id: &str,
        part_number: u32,
    ) -> Result<()> {
        self.cold.create_part_copy(object, offset, size, multipart_id, part_number).await
    }

    async fn info_storage(&self) -> Result<StorageInfo> {
        self.cold.info_storage().await
    }
}

/// `populate` always fetches the entire object starting at 0; slice out
/// the window the original caller actually asked for.
fn slice_populated(data: &Bytes, offset: u64, size: u64) -> ReadChunk {
    let offset = offset as usize;
    if offset >= data.len() {
        return ReadChunk { data: Bytes::new(), done: true };
    }
    let want = if size == 0 { data.len() - offset } else { (size as usize).min(data.len() - offset) };
    let end = offset + want;
    ReadChunk {
        data: data.slice(offset..end),
        done: end >= data.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::memory::MemoryDriver;

    fn adapter() -> CacheAdapter {
        CacheAdapter::new(Arc::new(MemoryDriver::default()), Arc::new(MemoryDriver::default()))
    }

    #[tokio::test]
    async fn write_then_read_round_trips_through_cold() {
        let a = adapter();
        a.create_bucket("b").await.unwrap();
        a.write_object("b", "o", Bytes::from_static(b"hello"), 0).await.unwrap();

        let chunk = a.read_object("b", "o", 0, 0).await.unwrap();
        assert_eq!(chunk.data, Bytes::from_static(b"hello"));

        // The write-through offset-0 path never touches cold directly.
        assert!(a.cold().info_object("b", "o").await.is_err());
        assert!(a.hot().info_object("b", "o").await.is_ok());
    }

    #[tokio::test]
    async fn read_miss_populates_hot_and_stamps_cached_at() {
        let a = adapter();
        a.cold().create_bucket("b").await.unwrap();
        a.cold().create_object("b", "o", Bytes::from_static(b"cold-data")).await.unwrap();

        let chunk = a.read_object("b", "o", 0, 0).await.unwrap();
        assert_eq!(chunk.data, Bytes::from_static(b"cold-data"));
        assert!(a.hot().info_object("b", "o").await.is_ok());

        let stamped = a.cold().read_object_metadata("b", "o", crate::metadata::META_CACHED_AT).await.unwrap();
        assert_eq!(stamped.data.len(), 8);
    }

    #[tokio::test]
    async fn offset_write_on_absent_hot_object_populates_first() {
        let a = adapter();
        a.cold().create_bucket("b").await.unwrap();
        a.cold().create_object("b", "o", Bytes::from_static(b"0123456789")).await.unwrap();

        a.write_object("b", "o", Bytes::from_static(b"XX"), 3).await.unwrap();

        let chunk = a.hot().read_object("b", "o", 0, 0).await.unwrap();
        assert_eq!(chunk.data, Bytes::from_static(b"012XX56789"));
    }

    #[tokio::test]
    async fn read_object_to_file_populates_hot_on_miss() {
        let a = adapter();
        a.cold().create_bucket("b").await.unwrap();
        a.cold().create_object("b", "o", Bytes::from_static(b"cold-data")).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");
        a.read_object_to_file("b", "o", 0, 0, &dest).await.unwrap();

        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"cold-data");
        assert!(a.hot().info_object("b", "o").await.is_ok());
    }

    #[tokio::test]
    async fn read_slices_populated_window() {
        let a = adapter();
        a.cold().create_bucket("b").await.unwrap();
        a.cold().create_object("b", "o", Bytes::from_static(b"0123456789")).await.unwrap();

        let chunk = a.read_object("b", "o", 2, 3).await.unwrap();
        assert_eq!(chunk.data, Bytes::from_static(b"234"));
        assert!(!chunk.done);
    }
}
