// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


// Re-exports
pub use nada_integrations as domain;

mod inmem_integration_metadata_repository;
mod inmem_third_party_mapping_repository;
mod inmem_workflow_repository;

pub use inmem_integration_metadata_repository::*;
pub use inmem_third_party_mapping_repository::*;
pub use inmem_workflow_repository::*;
