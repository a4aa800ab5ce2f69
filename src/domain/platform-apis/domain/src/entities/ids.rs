// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::fmt;

use serde::{Deserialize, Serialize};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

macro_rules! bi_tool_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            pub const fn as_i64(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

bi_tool_id!(DatabaseID);
bi_tool_id!(TableID);
bi_tool_id!(FieldID);
bi_tool_id!(CollectionID);
bi_tool_id!(UserID);
bi_tool_id!(MembershipID);
bi_tool_id!(
    /// `0` is reserved as the marker of an open (world-readable) integration
    PermissionGroupID
);

impl PermissionGroupID {
    /// Sentinel stored in integration metadata of open integrations
    pub const OPEN: Self = Self(0);

    /// Built-in group every BI-tool user belongs to
    pub const ALL_USERS: Self = Self(1);

    pub fn is_open_sentinel(self) -> bool {
        self == Self::OPEN
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
