// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


mod integration_metadata;
mod integrations_config;
mod job;
mod mapping;
mod restricted_service_account;
mod step_error;
mod workflow;

pub use integration_metadata::*;
pub use integrations_config::*;
pub use job::*;
pub use mapping::*;
pub use restricted_service_account::*;
pub use step_error::*;
pub use workflow::*;
