// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use thiserror::Error;

use crate::MappingRequest;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Bounded queue of datasets whose third-party mapping must be reconciled.
/// Items are consumed one at a time by a single worker.
#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait MappingQueue: Send + Sync {
    /// Waits for capacity when the queue is full
    async fn enqueue(&self, request: MappingRequest) -> Result<(), EnqueueMappingError>;

    /// Fails immediately when the queue is full
    fn try_enqueue(&self, request: MappingRequest) -> Result<(), EnqueueMappingError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Error)]
pub enum EnqueueMappingError {
    #[error("Mapping queue is full")]
    Full,

    #[error("Mapping queue is closed")]
    Closed,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
