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

//! An in-process reference [`Driver`] backed by `HashMap`s behind a single
//! mutex. Used as the `memory://` scheme and as the fast backend for unit
//! tests of the cache adapter and controllers.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::clock::now;
use crate::error::{Error, ErrorKind, Result};
use crate::metadata::{BucketInfo, BucketStats, ListPage, ObjectInfo, PartInfo, ReadChunk, StorageInfo};
use crate::path::{validate_bucket_name, validate_object_name};
use crate::Driver;

#[derive(Clone, Debug, Default)]
struct ObjectRecord {
    data: Bytes,
    creation: f64,
    last_access: f64,
    last_modification: f64,
    last_change: f64,
    read_only: bool,
    metadata: HashMap<String, Bytes>,
}

#[derive(Clone, Debug)]
struct BucketRecord {
    creation: f64,
    objects: HashMap<String, ObjectRecord>,
}

#[derive(Clone, Debug)]
struct MultipartRecord {
    bucket: String,
    object: String,
    parts: BTreeMap<u32, Bytes>,
}

#[derive(Debug, Default)]
struct State {
    buckets: HashMap<String, BucketRecord>,
    multiparts: HashMap<String, MultipartRecord>,
}

/// In-memory `Driver`. `total_space` bounds what `info_storage` reports;
/// it does not reject writes once exceeded (enforcing that is the
/// eviction controller's job, not the driver's).
#[derive(Debug)]
pub struct MemoryDriver {
    state: Mutex<State>,
    total_space: u64,
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new(u64::MAX)
    }
}

impl MemoryDriver {
    pub fn new(total_space: u64) -> Self {
        Self {
            state: Mutex::new(State::default()),
            total_space,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("memory driver mutex poisoned")
    }

    fn not_exists(what: &str) -> Error {
        Error::new(ErrorKind::NotExists, format!("{what} does not exist"))
    }
}

#[async_trait]
impl Driver for MemoryDriver {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.lock().buckets.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        validate_bucket_name(bucket)?;
        let mut state = self.lock();
        if state.buckets.contains_key(bucket) {
            return Err(Error::new(ErrorKind::Exists, format!("bucket '{bucket}' exists")));
        }
        state.buckets.insert(
            bucket.to_string(),
            BucketRecord {
                creation: now(),
                objects: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        let mut state = self.lock();
        match state.buckets.get(bucket) {
            None => Err(Self::not_exists(&format!("bucket '{bucket}'"))),
            Some(b) if !b.objects.is_empty() => {
                Err(Error::new(ErrorKind::InvalidArgs, format!("bucket '{bucket}' not empty")))
            }
            Some(_) => {
                state.buckets.remove(bucket);
                Ok(())
            }
        }
    }

    async fn purge_bucket(&self, bucket: &str) -> Result<()> {
        let mut state = self.lock();
        let b = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::not_exists(&format!("bucket '{bucket}'")))?;
        b.objects.clear();
        Ok(())
    }

    async fn info_bucket(&self, bucket: &str, include_stats: bool) -> Result<BucketInfo> {
        let state = self.lock();
        let b = state
            .buckets
            .get(bucket)
            .ok_or_else(|| Self::not_exists(&format!("bucket '{bucket}'")))?;

        let stats = if include_stats {
            let mut size = 0u64;
            let mut last_access = 0f64;
            let mut last_modification = 0f64;
            for o in b.objects.values() {
                size += o.data.len() as u64;
                last_access = last_access.max(o.last_access);
                last_modification = last_modification.max(o.last_modification);
            }
            Some(BucketStats {
                size,
                count: b.objects.len() as u64,
                last_access,
                last_modification,
            })
        } else {
            None
        };

        Ok(BucketInfo {
            creation: b.creation,
            stats,
        })
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        offset: u64,
        count: u64,
    ) -> Result<ListPage<String>> {
        let state = self.lock();
        let b = state
            .buckets
            .get(bucket)
            .ok_or_else(|| Self::not_exists(&format!("bucket '{bucket}'")))?;

        let mut names: Vec<String> = b
            .objects
            .keys()
            .filter(|n| n.starts_with(prefix))
            .cloned()
            .collect();
        names.sort();

        paginate(names, offset, count)
    }

    async fn list_objects_with_metadata(
        &self,
        bucket: &str,
        metadata_name: &str,
        offset: u64,
    ) -> Result<ListPage<String>> {
        let state = self.lock();
        let b = state
            .buckets
            .get(bucket)
            .ok_or_else(|| Self::not_exists(&format!("bucket '{bucket}'")))?;

        let mut names: Vec<String> = b
            .objects
            .iter()
            .filter(|(_, o)| o.metadata.contains_key(metadata_name))
            .map(|(n, _)| n.clone())
            .collect();
        names.sort();

        paginate(names, offset, u64::MAX)
    }

    async fn info_object(&self, bucket: &str, object: &str) -> Result<ObjectInfo> {
        let state = self.lock();
        let o = object_ref(&state, bucket, object)?;
        Ok(ObjectInfo {
            is_bad: false,
            size: o.data.len() as u64,
            creation: o.creation,
            last_access: o.last_access,
            last_modification: o.last_modification,
            last_change: o.last_change,
            read_only: o.read_only,
        })
    }

    async fn create_object(&self, bucket: &str, object: &str, data: Bytes) -> Result<()> {
        validate_object_name(object)?;
        let mut state = self.lock();
        let b = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::not_exists(&format!("bucket '{bucket}'")))?;
        if b.objects.contains_key(object) {
            return Err(Error::new(ErrorKind::Exists, format!("object '{object}' exists")));
        }
        let t = now();
        b.objects.insert(
            object.to_string(),
            ObjectRecord {
                data,
                creation: t,
                last_access: t,
                last_modification: t,
                last_change: t,
                read_only: false,
                metadata: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn write_object(&self, bucket: &str, object: &str, data: Bytes, offset: u64) -> Result<()> {
        validate_object_name(object)?;
        let mut state = self.lock();
        let b = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::not_exists(&format!("bucket '{bucket}'")))?;

        let entry = b.objects.entry(object.to_string()).or_insert_with(|| {
            let t = now();
            ObjectRecord {
                data: Bytes::new(),
                creation: t,
                last_access: t,
                last_modification: t,
                last_change: t,
                read_only: false,
                metadata: HashMap::new(),
            }
        });

        if entry.read_only {
            return Err(Error::new(ErrorKind::Permissions, format!("object '{object}' is read-only")));
        }

        let offset = offset as usize;
        let mut buf = entry.data.to_vec();
        if buf.len() < offset + data.len() {
            buf.resize(offset + data.len(), 0);
        }
        buf[offset..offset + data.len()].copy_from_slice(&data);
        entry.data = Bytes::from(buf);
        entry.last_modification = now();
        entry.last_change = entry.last_modification;
        Ok(())
    }

    async fn read_object(&self, bucket: &str, object: &str, offset: u64, size: u64) -> Result<ReadChunk> {
        let mut state = self.lock();
        let b = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::not_exists(&format!("bucket '{bucket}'")))?;
        let o = b
            .objects
            .get_mut(object)
            .ok_or_else(|| Self::not_exists(&format!("object '{object}'")))?;

        o.last_access = now();

        let offset = offset as usize;
        let total = o.data.len();
        if offset >= total {
            return Ok(ReadChunk {
                data: Bytes::new(),
                done: true,
            });
        }

        let end = if size == 0 {
            total
        } else {
            total.min(offset + size as usize)
        };

        Ok(ReadChunk {
            data: o.data.slice(offset..end),
            done: end >= total,
        })
    }

    async fn delete_object(&self, bucket: &str, object: &str) -> Result<()> {
        let mut state = self.lock();
        if let Some(b) = state.buckets.get_mut(bucket) {
            b.objects.remove(object);
        }
        Ok(())
    }

    async fn truncate_object(&self, bucket: &str, object: &str, size: u64) -> Result<()> {
        let mut state = self.lock();
        let o = object_mut(&mut state, bucket, object)?;
        let mut buf = o.data.to_vec();
        buf.resize(size as usize, 0);
        o.data = Bytes::from(buf);
        o.last_modification = now();
        Ok(())
    }

    async fn copy_object(&self, bucket: &str, src: &str, dst: &str, no_overwrite: bool) -> Result<()> {
        let mut state = self.lock();
        let data = object_ref(&state, bucket, src)?.data.clone();
        let b = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::not_exists(&format!("bucket '{bucket}'")))?;
        if no_overwrite && b.objects.contains_key(dst) {
            return Err(Error::new(ErrorKind::Exists, format!("object '{dst}' exists")));
        }
        let t = now();
        b.objects.insert(
            dst.to_string(),
            ObjectRecord {
                data,
                creation: t,
                last_access: t,
                last_modification: t,
                last_change: t,
                read_only: false,
                metadata: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn move_object(&self, bucket: &str, src: &str, dst: &str, no_overwrite: bool) -> Result<()> {
        self.copy_object(bucket, src, dst, no_overwrite).await?;
        let mut state = self.lock();
        if let Some(b) = state.buckets.get_mut(bucket) {
            b.objects.remove(src);
        }
        Ok(())
    }

    async fn exchange_object(&self, bucket: &str, src: &str, dst: &str) -> Result<()> {
        let mut state = self.lock();
        let b = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::not_exists(&format!("bucket '{bucket}'")))?;
        let src_rec = b
            .objects
            .remove(src)
            .ok_or_else(|| Self::not_exists(&format!("object '{src}'")))?;
        let dst_rec = b
            .objects
            .remove(dst)
            .ok_or_else(|| Self::not_exists(&format!("object '{dst}'")))?;
        b.objects.insert(src.to_string(), dst_rec);
        b.objects.insert(dst.to_string(), src_rec);
        Ok(())
    }

    async fn touch_object(
        &self,
        bucket: &str,
        object: &str,
        last_access: Option<f64>,
        last_modification: Option<f64>,
    ) -> Result<()> {
        let mut state = self.lock();
        let o = object_mut(&mut state, bucket, object)?;
        if let Some(v) = last_access {
            o.last_access = v;
        }
        if let Some(v) = last_modification {
            o.last_modification = v;
        }
        Ok(())
    }

    async fn set_object_permissions(&self, _bucket: &str, _object: &str, _mode: u32) -> Result<()> {
        Ok(())
    }

    async fn make_object_read_only(&self, bucket: &str, object: &str) -> Result<()> {
        let mut state = self.lock();
        let o = object_mut(&mut state, bucket, object)?;
        o.read_only = true;
        Ok(())
    }

    async fn set_object_owner(&self, _bucket: &str, _object: &str, _uid: u32, _gid: u32) -> Result<()> {
        Ok(())
    }

    async fn create_object_metadata(
        &self,
        bucket: &str,
        object: &str,
        name: &str,
        value: Bytes,
    ) -> Result<()> {
        let mut state = self.lock();
        let o = object_mut(&mut state, bucket, object)?;
        o.metadata.insert(name.to_string(), value);
        Ok(())
    }

    async fn read_object_metadata(&self, bucket: &str, object: &str, name: &str) -> Result<ReadChunk> {
        let state = self.lock();
        let o = object_ref(&state, bucket, object)?;
        match o.metadata.get(name) {
            Some(v) => Ok(ReadChunk {
                data: v.clone(),
                done: true,
            }),
            None => Err(Self::not_exists(&format!("metadata '{name}' on object '{object}'"))),
        }
    }

    async fn delete_object_metadata(&self, bucket: &str, object: &str, name: &str) -> Result<()> {
        let mut state = self.lock();
        let o = object_mut(&mut state, bucket, object)?;
        o.metadata.remove(name);
        Ok(())
    }

    async fn list_multiparts(&self, bucket: &str, offset: u64, count: u64) -> Result<ListPage<String>> {
        let state = self.lock();
        let mut ids: Vec<String> = state
            .multiparts
            .iter()
            .filter(|(_, m)| m.bucket == bucket)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        paginate(ids, offset, count)
    }

    async fn create_multipart(&self, bucket: &str, object: &str) -> Result<String> {
        let mut state = self.lock();
        if !state.buckets.contains_key(bucket) {
            return Err(Self::not_exists(&format!("bucket '{bucket}'")));
        }
        let id = Uuid::new_v4().to_string();
        state.multiparts.insert(
            id.clone(),
            MultipartRecord {
                bucket: bucket.to_string(),
                object: object.to_string(),
                parts: BTreeMap::new(),
            },
        );
        Ok(id)
    }

    async fn complete_multipart(&self, multipart_id: &str) -> Result<()> {
        let mut state = self.lock();
        let m = state
            .multiparts
            .remove(multipart_id)
            .ok_or_else(|| Self::not_exists(&format!("multipart '{multipart_id}'")))?;

        let mut buf = Vec::new();
        for part in m.parts.values() {
            buf.extend_from_slice(part);
        }

        let b = state
            .buckets
            .get_mut(&m.bucket)
            .ok_or_else(|| Self::not_exists(&format!("bucket '{}'", m.bucket)))?;
        let t = now();
        b.objects.insert(
            m.object,
            ObjectRecord {
                data: Bytes::from(buf),
                creation: t,
                last_access: t,
                last_modification: t,
                last_change: t,
                read_only: false,
                metadata: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn abort_multipart(&self, multipart_id: &str) -> Result<()> {
        let mut state = self.lock();
        state.multiparts.remove(multipart_id);
        Ok(())
    }

    async fn list_parts(&self, multipart_id: &str) -> Result<Vec<PartInfo>> {
        let state = self.lock();
        let m = state
            .multiparts
            .get(multipart_id)
            .ok_or_else(|| Self::not_exists(&format!("multipart '{multipart_id}'")))?;
        Ok(m.parts
            .iter()
            .map(|(n, b)| PartInfo {
                part_number: *n,
                size: b.len() as u64,
            })
            .collect())
    }

    async fn create_part(&self, multipart_id: &str, part_number: u32, data: Bytes) -> Result<()> {
        let mut state = self.lock();
        let m = state
            .multiparts
            .get_mut(multipart_id)
            .ok_or_else(|| Self::not_exists(&format!("multipart '{multipart_id}'")))?;
        m.parts.insert(part_number, data);
        Ok(())
    }

    async fn create_part_copy(
        &self,
        object: &str,
        offset: u64,
        size: u64,
        multipart_id: &str,
        part_number: u32,
    ) -> Result<()> {
        let mut state = self.lock();
        let bucket = state
            .multiparts
            .get(multipart_id)
            .ok_or_else(|| Self::not_exists(&format!("multipart '{multipart_id}'")))?
            .bucket
            .clone();
        let data = {
            let o = object_ref(&state, &bucket, object)?;
            let start = (offset as usize).min(o.data.len());
            let end = if size == 0 {
                o.data.len()
            } else {
                o.data.len().min(start + size as usize)
            };
            o.data.slice(start..end)
        };
        let m = state.multiparts.get_mut(multipart_id).expect("checked above");
        m.parts.insert(part_number, data);
        Ok(())
    }

    async fn info_storage(&self) -> Result<StorageInfo> {
        let state = self.lock();
        let used: u64 = state
            .buckets
            .values()
            .flat_map(|b| b.objects.values())
            .map(|o| o.data.len() as u64)
            .sum();
        Ok(StorageInfo {
            total_space: self.total_space,
            used_space: used,
        })
    }
}

fn paginate(items: Vec<String>, offset: u64, count: u64) -> Result<ListPage<String>> {
    let offset = offset as usize;
    if offset >= items.len() {
        return Ok(ListPage {
            items: Vec::new(),
            done: true,
            next_offset: offset as u64,
        });
    }
    let count = if count == 0 { items.len() as u64 } else { count };
    let end = items.len().min(offset + count as usize);
    let done = end >= items.len();
    Ok(ListPage {
        items: items[offset..end].to_vec(),
        done,
        next_offset: end as u64,
    })
}

fn object_ref<'a>(state: &'a State, bucket: &str, object: &str) -> Result<&'a ObjectRecord> {
    state
        .buckets
        .get(bucket)
        .ok_or_else(|| MemoryDriver::not_exists(&format!("bucket '{bucket}'")))?
        .objects
        .get(object)
        .ok_or_else(|| MemoryDriver::not_exists(&format!("object '{object}'")))
}

fn object_mut<'a>(state: &'a mut State, bucket: &str, object: &str) -> Result<&'a mut ObjectRecord> {
    state
        .buckets
        .get_mut(bucket)
        .ok_or_else(|| MemoryDriver::not_exists(&format!("bucket '{bucket}'")))?
        .objects
        .get_mut(object)
        .ok_or_else(|| MemoryDriver::not_exists(&format!("object '{object}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let d = MemoryDriver::default();
        d.create_bucket("b").await.unwrap();
        d.write_object("b", "o", Bytes::from_static(b"hello"), 0).await.unwrap();
        let chunk = d.read_object("b", "o", 0, 0).await.unwrap();
        assert_eq!(chunk.data, Bytes::from_static(b"hello"));
        assert!(chunk.done);
    }

    #[tokio::test]
    async fn write_at_offset_extends_object() {
        let d = MemoryDriver::default();
        d.create_bucket("b").await.unwrap();
        d.write_object("b", "o", Bytes::from_static(b"hello"), 0).await.unwrap();
        d.write_object("b", "o", Bytes::from_static(b"!!"), 5).await.unwrap();
        let chunk = d.read_object("b", "o", 0, 0).await.unwrap();
        assert_eq!(chunk.data, Bytes::from_static(b"hello!!"));
    }

    #[tokio::test]
    async fn read_missing_object_is_not_exists() {
        let d = MemoryDriver::default();
        d.create_bucket("b").await.unwrap();
        let err = d.read_object("b", "missing", 0, 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotExists);
    }

    #[tokio::test]
    async fn multipart_complete_concatenates_parts_in_order() {
        let d = MemoryDriver::default();
        d.create_bucket("b").await.unwrap();
        let id = d.create_multipart("b", "o").await.unwrap();
        d.create_part(&id, 2, Bytes::from_static(b"world")).await.unwrap();
        d.create_part(&id, 1, Bytes::from_static(b"hello ")).await.unwrap();
        d.complete_multipart(&id).await.unwrap();
        let chunk = d.read_object("b", "o", 0, 0).await.unwrap();
        assert_eq!(chunk.data, Bytes::from_static(b"hello world"));
    }
}
