// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


mod access_service_impl;
mod dependencies;
mod runners;

pub use access_service_impl::*;
pub use dependencies::*;
pub use runners::*;
