// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


// Re-exports
pub use nada_datasets as domain;

mod inmem_dataset_repository;
mod inmem_joinable_view_repository;

pub use inmem_dataset_repository::*;
pub use inmem_joinable_view_repository::*;
