// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use nada_datasets::DatasetID;
use serde::{Deserialize, Serialize};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// External service a dataset can be mapped into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThirdPartyService {
    #[serde(rename = "metabase")]
    BiTool,
}

/// Desired mapping of a dataset, as requested by its owners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThirdPartyMapping {
    pub dataset_id: DatasetID,
    pub services: Vec<ThirdPartyService>,
}

impl ThirdPartyMapping {
    pub fn wants_bi_tool(&self) -> bool {
        self.services.contains(&ThirdPartyService::BiTool)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Work item of the mapping queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRequest {
    pub dataset_id: DatasetID,
    pub services: Vec<ThirdPartyService>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
