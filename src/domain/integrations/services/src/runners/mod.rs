// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


mod bi_tool_table_visibility_runner;
mod iam_policy_drift_runner;
mod mapping_queue_producer;
mod warehouse_missing_tables_runner;

pub use bi_tool_table_visibility_runner::*;
pub use iam_policy_drift_runner::*;
pub use mapping_queue_producer::*;
pub use warehouse_missing_tables_runner::*;
