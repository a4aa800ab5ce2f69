// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


mod bi_tool_api;
mod cloud_resource_manager_api;
mod kms_api;
mod service_account_api;
mod warehouse_api;

pub use bi_tool_api::*;
pub use cloud_resource_manager_api::*;
pub use kms_api::*;
pub use service_account_api::*;
pub use warehouse_api::*;
