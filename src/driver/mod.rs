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

//! The [`Driver`] trait: the capability set a single object store backend
//! must provide. The cache adapter and controllers are written entirely
//! against this trait and never know which concrete backend they are
//! talking to.

pub mod fs;
pub mod memory;
pub mod uri;

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncWriteExt;

use crate::copy::COPY_CHUNK_SIZE;
use crate::error::{Error, Result};
use crate::metadata::{BucketInfo, ListPage, ObjectInfo, PartInfo, ReadChunk, StorageInfo};

pub use uri::build_driver;

/// Capability set implemented by a single object store backend.
///
/// All operations mirror §4.1 of the design. Reads and metadata reads are
/// chunked: a caller iterates, advancing `offset` by the length of the
/// returned data, until `done` is `true`.
#[async_trait]
pub trait Driver: Send + Sync + std::fmt::Debug {
    // -- Buckets --------------------------------------------------------
    async fn list_buckets(&self) -> Result<Vec<String>>;
    async fn create_bucket(&self, bucket: &str) -> Result<()>;
    async fn delete_bucket(&self, bucket: &str) -> Result<()>;
    async fn purge_bucket(&self, bucket: &str) -> Result<()>;
    async fn info_bucket(&self, bucket: &str, include_stats: bool) -> Result<BucketInfo>;

    // -- Object listing ---------------------------------------------------
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        offset: u64,
        count: u64,
    ) -> Result<ListPage<String>>;

    async fn list_objects_with_metadata(
        &self,
        bucket: &str,
        metadata_name: &str,
        offset: u64,
    ) -> Result<ListPage<String>>;

    // -- Objects ----------------------------------------------------------
    async fn info_object(&self, bucket: &str, object: &str) -> Result<ObjectInfo>;
    async fn create_object(&self, bucket: &str, object: &str, data: Bytes) -> Result<()>;
    async fn write_object(&self, bucket: &str, object: &str, data: Bytes, offset: u64) -> Result<()>;
    async fn read_object(&self, bucket: &str, object: &str, offset: u64, size: u64) -> Result<ReadChunk>;

    /// Same contract as `read_object`, except the bytes are written to a
    /// local file at `dest` instead of being returned (§4.3). The default
    /// implementation loops over `read_object` itself, so a backend only
    /// needs to override this when it has a cheaper path (e.g. a plain
    /// filesystem backend that can rename/copy directly). The first chunk
    /// is read before `dest` is created, so a `NotExists` on a missing
    /// object never leaves a truncated file behind.
    async fn read_object_to_file(
        &self,
        bucket: &str,
        object: &str,
        offset: u64,
        size: u64,
        dest: &Path,
    ) -> Result<()> {
        let want = |read_so_far: u64| if size == 0 { COPY_CHUNK_SIZE } else { size.saturating_sub(read_so_far) };

        let first = self.read_object(bucket, object, offset, want(0)).await?;
        let mut file = tokio::fs::File::create(dest).await.map_err(Error::from)?;
        file.write_all(&first.data).await.map_err(Error::from)?;

        let mut read_so_far = first.data.len() as u64;
        let mut done = first.done;
        while !done {
            let chunk_size = want(read_so_far);
            if chunk_size == 0 {
                break;
            }
            let chunk = self.read_object(bucket, object, offset + read_so_far, chunk_size).await?;
            file.write_all(&chunk.data).await.map_err(Error::from)?;
            read_so_far += chunk.data.len() as u64;
            done = chunk.done;
        }
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, object: &str) -> Result<()>;
    async fn truncate_object(&self, bucket: &str, object: &str, size: u64) -> Result<()>;

    async fn copy_object(&self, bucket: &str, src: &str, dst: &str, no_overwrite: bool) -> Result<()>;
    async fn move_object(&self, bucket: &str, src: &str, dst: &str, no_overwrite: bool) -> Result<()>;
    async fn exchange_object(&self, bucket: &str, src: &str, dst: &str) -> Result<()>;

    // -- Object attribute setters (filesystem-like use, §4.1) ------------
    async fn touch_object(
        &self,
        bucket: &str,
        object: &str,
        last_access: Option<f64>,
        last_modification: Option<f64>,
    ) -> Result<()>;
    async fn set_object_permissions(&self, bucket: &str, object: &str, mode: u32) -> Result<()>;
    async fn make_object_read_only(&self, bucket: &str, object: &str) -> Result<()>;
    async fn set_object_owner(&self, bucket: &str, object: &str, uid: u32, gid: u32) -> Result<()>;

    // -- Metadata ---------------------------------------------------------
    async fn create_object_metadata(
        &self,
        bucket: &str,
        object: &str,
        name: &str,
        value: Bytes,
    ) -> Result<()>;
    async fn read_object_metadata(&self, bucket: &str, object: &str, name: &str) -> Result<ReadChunk>;
    async fn delete_object_metadata(&self, bucket: &str, object: &str, name: &str) -> Result<()>;

    // -- Multipart ----------------------------------------------------------
    async fn list_multiparts(&self, bucket: &str, offset: u64, count: u64) -> Result<ListPage<String>>;
    async fn create_multipart(&self, bucket: &str, object: &str) -> Result<String>;
    async fn complete_multipart(&self, multipart_id: &str) -> Result<()>;
    async fn abort_multipart(&self, multipart_id: &str) -> Result<()>;
    async fn list_parts(&self, multipart_id: &str) -> Result<Vec<PartInfo>>;
    async fn create_part(&self, multipart_id: &str, part_number: u32, data: Bytes) -> Result<()>;
    async fn create_part_copy(
        &self,
        object: &str,
        offset: u64,
        size: u64,
        multipart_id: &str,
        part_number: u32,
    ) -> Result<()>;

    // -- Storage ------------------------------------------------------------
    async fn info_storage(&self) -> Result<StorageInfo>;
}

/// Any `Arc<T: Driver>` is itself a `Driver`, so the cache adapter and
/// controllers can be handed a shared handle directly.
#[async_trait]
impl<T: Driver + ?Sized> Driver for std::sync::Arc<T> {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        self.as_ref().list_buckets().await
    }
    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        self.as_ref().create_bucket(bucket).await
    }
    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.as_ref().delete_bucket(bucket).await
    }
    async fn purge_bucket(&self, bucket: &str) -> Result<()> {
        self.as_ref().purge_bucket(bucket).await
    }
    async fn info_bucket(&self, bucket: &str, include_stats: bool) -> Result<BucketInfo> {
        self.as_ref().info_bucket(bucket, include_stats).await
    }
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        offset: u64,
        count: u64,
    ) -> Result<ListPage<String>> {
        self.as_ref().list_objects(bucket, prefix, offset, count).await
    }
    async fn list_objects_with_metadata(
        &self,
        bucket: &str,
        metadata_name: &str,
        offset: u64,
    ) -> Result<ListPage<String>> {
        self.as_ref()
            .list_objects_with_metadata(bucket, metadata_name, offset)
            .await
    }
    async fn info_object(&self, bucket: &str, object: &str) -> Result<ObjectInfo> {
        self.as_ref().info_object(bucket, object).await
    }
    async fn create_object(&self, bucket: &str, object: &str, data: Bytes) -> Result<()> {
        self.as_ref().create_object(bucket, object, data).await
    }
    async fn write_object(&self, bucket: &str, object: &str, data: Bytes, offset: u64) -> Result<()> {
        self.as_ref().write_object(bucket, object, data, offset).await
    }
    async fn read_object(&self, bucket: &str, object: &str, offset: u64, size: u64) -> Result<ReadChunk> {
        self.as_ref().read_object(bucket, object, offset, size).await
    }
    async fn read_object_to_file(
        &self,
        bucket: &str,
        object: &str,
        offset: u64,
        size: u64,
        dest: &Path,
    ) -> Result<()> {
        self.as_ref().read_object_to_file(bucket, object, offset, size, dest).await
    }
    async fn delete_object(&self, bucket: &str, object: &str) -> Result<()> {
        self.as_ref().delete_object(bucket, object).await
    }
    async fn truncate_object(&self, bucket: &str, object: &str, size: u64) -> Result<()> {
        self.as_ref().truncate_object(bucket, object, size).await
    }
    async fn copy_object(&self, bucket: &str, src: &str, dst: &str, no_overwrite: bool) -> Result<()> {
        self.as_ref().copy_object(bucket, src, dst, no_overwrite).await
    }
    async fn move_object(&self, bucket: &str, src: &str, dst: &str, no_overwrite: bool) -> Result<()> {
        self.as_ref().move_object(bucket, src, dst, no_overwrite).await
    }
    async fn exchange_object(&self, bucket: &str, src: &str, dst: &str) -> Result<()> {
        self.as_ref().exchange_object(bucket, src, dst).await
    }
    async fn touch_object(
        &self,
        bucket: &str,
        object: &str,
        last_access: Option<f64>,
        last_modification: Option<f64>,
    ) -> Result<()> {
        self.as_ref()
            .touch_object(bucket, object, last_access, last_modification)
            .await
    }
    async fn set_object_permissions(&self, bucket: &str, object: &str, mode: u32) -> Result<()> {
        self.as_ref().set_object_permissions(bucket, object, mode).await
    }
    async fn make_object_read_only(&self, bucket: &str, object: &str) -> Result<()> {
        self.as_ref().make_object_read_only(bucket, object).await
    }
    async fn set_object_owner(&self, bucket: &str, object: &str, uid: u32, gid: u32) -> Result<()> {
        self.as_ref().set_object_owner(bucket, object, uid, gid).await
    }
    async fn create_object_metadata(
        &self,
        bucket: &str,
        object: &str,
        name: &str,
        value: Bytes,
    ) -> Result<()> {
        self.as_ref()
            .create_object_metadata(bucket, object, name, value)
            .await
    }
    async fn read_object_metadata(&self, bucket: &str, object: &str, name: &str) -> Result<ReadChunk> {
        self.as_ref().read_object_metadata(bucket, object, name).await
    }
    async fn delete_object_metadata(&self, bucket: &str, object: &str, name: &str) -> Result<()> {
        self.as_ref().delete_object_metadata(bucket, object, name).await
    }
    async fn list_multiparts(&self, bucket: &str, offset: u64, count: u64) -> Result<ListPage<String>> {
        self.as_ref().list_multiparts(bucket, offset, count).await
    }
    async fn create_multipart(&self, bucket: &str, object: &str) -> Result<String> {
        self.as_ref().create_multipart(bucket, object).await
    }
    async fn complete_multipart(&self, multipart_id: &str) -> Result<()> {
        self.as_ref().complete_multipart(multipart_id).await
    }
    async fn abort_multipart(&self, multipart_id: &str) -> Result<()> {
        self.as_ref().abort_multipart(multipart_id).await
    }
    async fn list_parts(&self, multipart_id: &str) -> Result<Vec<PartInfo>> {
        self.as_ref().list_parts(multipart_id).await
    }
    async fn create_part(&self, multipart_id: &str, part_number: u32, data: Bytes) -> Result<()> {
        self.as_ref().create_part(multipart_id, part_number, data).await
    }
    async fn create_part_copy(
        &self,
        object: &str,
        offset: u64,
        size: u64,
        multipart_id: &str,
        part_number: u32,
    ) -> Result<()> {
        self.as_ref()
            .create_part_copy(object, offset, size, multipart_id, part_number)
            .await
    }
    async fn info_storage(&self) -> Result<StorageInfo> {
        self.as_ref().info_storage().await
    }
}
