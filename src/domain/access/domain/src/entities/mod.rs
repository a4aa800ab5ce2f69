// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


mod access;
mod access_request;
mod platform;
mod subject;

pub use access::*;
pub use access_request::*;
pub use platform::*;
pub use subject::*;
