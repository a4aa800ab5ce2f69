// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


mod call_counter;
mod inmem_bi_tool;
mod inmem_cloud_resource_manager;
mod inmem_kms;
mod inmem_service_accounts;
mod inmem_warehouse;

pub use inmem_bi_tool::*;
pub use inmem_cloud_resource_manager::*;
pub use inmem_kms::*;
pub use inmem_service_accounts::*;
pub use inmem_warehouse::*;
