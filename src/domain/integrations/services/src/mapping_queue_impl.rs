// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::sync::Arc;

use async_utils::{BackgroundAgent, CancellationToken};
use dill::*;
use internal_error::{InternalError, ResultIntoInternal};
use nada_integrations::*;
use tokio::sync::mpsc;
use tracing::Instrument as _;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Bounded queue of mapping requests with a single consumer that processes
/// one dataset at a time
pub struct MappingQueueImpl {
    integration_service: Arc<dyn IntegrationService>,
    config: Arc<MappingQueueConfig>,
    sender: mpsc::Sender<MappingRequest>,
    receiver: tokio::sync::Mutex<mpsc::Receiver<MappingRequest>>,
}

#[component(pub)]
#[interface(dyn MappingQueue)]
#[interface(dyn BackgroundAgent)]
#[scope(Singleton)]
impl MappingQueueImpl {
    pub fn new(
        integration_service: Arc<dyn IntegrationService>,
        config: Arc<MappingQueueConfig>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(config.capacity.max(1));

        Self {
            integration_service,
            config,
            sender,
            receiver: tokio::sync::Mutex::new(receiver),
        }
    }

    async fn process(&self, request: MappingRequest) {
        let MappingRequest {
            dataset_id,
            services,
        } = request;

        let span = observability::tracing::root_span!(
            "MappingQueue::process",
            %dataset_id,
            ?services
        );

        async move {
            let result = tokio::time::timeout(
                self.config.item_deadline,
                self.integration_service.map_dataset(dataset_id, services),
            )
            .await;

            match result {
                Err(_) => tracing::error!(
                    deadline = ?self.config.item_deadline,
                    "Mapping dataset did not finish before the deadline"
                ),
                Ok(Err(e)) => tracing::error!(
                    error = ?e,
                    error_msg = %e,
                    "Mapping dataset failed"
                ),
                Ok(Ok(statuses)) => {
                    for status in statuses.iter().filter(|s| s.has_failed) {
                        tracing::warn!(
                            workflow_kind = %status.workflow.kind,
                            attempt = status.workflow.attempt,
                            errors = ?status.errors(),
                            "Integration workflow failed"
                        );
                    }
                }
            }
        }
        .instrument(span)
        .await;
    }
}

#[async_trait::async_trait]
impl MappingQueue for MappingQueueImpl {
    async fn enqueue(&self, request: MappingRequest) -> Result<(), EnqueueMappingError> {
        self.sender
            .send(request)
            .await
            .map_err(|_| EnqueueMappingError::Closed)
    }

    fn try_enqueue(&self, request: MappingRequest) -> Result<(), EnqueueMappingError> {
        self.sender.try_send(request).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueMappingError::Full,
            mpsc::error::TrySendError::Closed(_) => EnqueueMappingError::Closed,
        })
    }
}

#[async_trait::async_trait]
impl BackgroundAgent for MappingQueueImpl {
    fn agent_name(&self) -> &'static str {
        "mapping-queue-worker"
    }

    async fn run(&self, shutdown: CancellationToken) -> Result<(), InternalError> {
        let mut receiver = self
            .receiver
            .try_lock()
            .context_int_err("mapping queue worker is already running")?;

        tracing::info!(
            capacity = self.config.capacity,
            item_deadline = ?self.config.item_deadline,
            "Starting mapping queue worker"
        );

        loop {
            let request = tokio::select! {
                () = shutdown.cancelled() => break,
                request = receiver.recv() => match request {
                    Some(request) => request,
                    None => break,
                },
            };

            tokio::select! {
                () = shutdown.cancelled() => {
                    tracing::info!("Shutdown requested, abandoning the dataset being mapped");
                    break;
                }
                () = self.process(request) => {}
            }
        }

        tracing::info!("Mapping queue worker stopped");
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
