// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


// Re-exports
pub use nada_access as domain;

mod inmem_access_repository;
mod inmem_access_request_repository;

pub use inmem_access_repository::*;
pub use inmem_access_request_repository::*;
