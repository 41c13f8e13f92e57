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

//! Bucket/object name validation shared by every driver.

use crate::error::{Error, ErrorKind, Result};

/// Typical maximum bucket name length (§3: "typical ~64 bytes").
pub const BUCKET_NAME_MAX: usize = 64;
/// Typical maximum object name length.
pub const OBJECT_NAME_MAX: usize = 256;

pub fn validate_bucket_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::new(ErrorKind::InvalidArgs, "bucket name must not be empty"));
    }
    if name.len() > BUCKET_NAME_MAX {
        return Err(Error::new(
            ErrorKind::NameTooLong,
            format!("bucket name '{name}' exceeds {BUCKET_NAME_MAX} bytes"),
        ));
    }
    Ok(())
}

pub fn validate_object_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::new(ErrorKind::InvalidArgs, "object name must not be empty"));
    }
    if name.len() > OBJECT_NAME_MAX {
        return Err(Error::new(
            ErrorKind::NameTooLong,
            format!("object name '{name}' exceeds {OBJECT_NAME_MAX} bytes"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_names() {
        assert_eq!(validate_bucket_name("").unwrap_err().kind(), ErrorKind::InvalidArgs);
        assert_eq!(validate_object_name("").unwrap_err().kind(), ErrorKind::InvalidArgs);
    }

    #[test]
    fn rejects_overlong_names() {
        let long = "a".repeat(BUCKET_NAME_MAX + 1);
        assert_eq!(validate_bucket_name(&long).unwrap_err().kind(), ErrorKind::NameTooLong);
    }

    #[test]
    fn accepts_reasonable_names() {
        assert!(validate_bucket_name("b1").is_ok());
        assert!(validate_object_name("o1").is_ok());
    }
}
