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

//! A tiered object-storage cache adapter and lifecycle controller runtime.
//!
//! [`cache::CacheAdapter`] wraps a hot [`Driver`] and a cold [`Driver`]
//! behind the single `Driver` trait, populating the hot tier on read miss
//! and writing through it on write. Four background controllers keep the
//! hot tier bounded and honor object lifecycle metadata: [`controllers::EvictionController`]
//! (watermark-gated LRU), [`controllers::CacheExpirationController`]
//! (TTL/per-object deadline), [`controllers::ObjectExpirationController`]
//! (absolute deletion deadline), and [`controllers::ReadOnlyAfterController`]
//! (freeze after an age threshold). [`scheduler::JobScheduler`] runs them
//! on independent intervals; [`lock::StorageLock`] keeps eviction and
//! cache-expiration from racing on the same hot object.

pub mod cache;
pub mod clock;
pub mod config;
pub mod controllers;
pub mod copy;
pub mod driver;
pub mod error;
pub mod lock;
pub mod metadata;
pub mod path;
pub mod scheduler;

pub use cache::CacheAdapter;
pub use config::Config;
pub use driver::Driver;
pub use error::{Error, ErrorKind, Result};
pub use lock::StorageLock;
pub use scheduler::JobScheduler;
