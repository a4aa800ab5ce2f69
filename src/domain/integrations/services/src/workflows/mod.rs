// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


mod create_open_workflow;
mod create_restricted_workflow;
mod delete_open_workflow;
mod delete_restricted_workflow;
mod integration_steps;
mod open_restricted_workflow;

pub use create_open_workflow::*;
pub use create_restricted_workflow::*;
pub use delete_open_workflow::*;
pub use delete_restricted_workflow::*;
pub use integration_steps::*;
pub use open_restricted_workflow::*;
