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

//! The four background lifecycle controllers (§4.5-§4.8). Each one walks
//! the relevant tier in a single pass and is meant to be driven by a
//! [`crate::scheduler::JobScheduler`] on its own interval; none of them
//! loop internally.

pub mod cache_expiration;
pub mod eviction;
pub mod object_expiration;
pub mod read_only_after;

pub use cache_expiration::CacheExpirationController;
pub use eviction::EvictionController;
pub use object_expiration::ObjectExpirationController;
pub use read_only_after::ReadOnlyAfterController;
