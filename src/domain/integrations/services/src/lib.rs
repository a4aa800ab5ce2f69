// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


mod dependencies;
mod integration_service_impl;
mod mapping_queue_impl;
mod runners;
mod workflow_definition;
mod workflows;

pub use dependencies::*;
pub use integration_service_impl::*;
pub use mapping_queue_impl::*;
pub use runners::*;
pub use workflow_definition::*;
pub use workflows::*;
