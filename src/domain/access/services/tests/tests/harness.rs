// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::sync::Arc;

use chrono::{TimeZone, Utc};
use dill::{Catalog, CatalogBuilder};
use nada_access::*;
use nada_access_inmem::{InMemoryAccessRepository, InMemoryAccessRequestRepository};
use nada_datasets::{
    Dataset,
    DatasetID,
    DatasetRepository,
    JoinableView,
    JoinableViewID,
    JoinableViewRepository,
    JoinableViewTable,
};
use nada_datasets_inmem::{InMemoryDatasetRepository, InMemoryJoinableViewRepository};
use nada_integrations::*;
use nada_integrations_inmem::{
    InMemoryIntegrationMetadataRepository,
    InMemoryThirdPartyMappingRepository,
    InMemoryWorkflowRepository,
};
use nada_platform_apis::*;
use nada_platform_apis_inmem::*;
use time_source::{FakeSystemTimeSource, SystemTimeSource};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub(crate) const JANE: &str = "jane.doe@nav.no";
pub(crate) const OLA: &str = "ola.nordmann@nav.no";
pub(crate) const APPROVER: &str = "team-lead@nav.no";

pub(crate) struct AccessHarness {
    pub catalog: Catalog,
    pub time_source: FakeSystemTimeSource,
    pub config: Arc<IntegrationsConfig>,
    pub warehouse: Arc<InMemoryWarehouse>,
    pub bi_tool: Arc<InMemoryBiTool>,
    pub access_service: Arc<dyn AccessService>,
    pub access_repo: Arc<dyn AccessRepository>,
    pub access_request_repo: Arc<dyn AccessRequestRepository>,
    pub integration_service: Arc<dyn IntegrationService>,
    pub metadata_repo: Arc<dyn IntegrationMetadataRepository>,
    dataset_repo: Arc<dyn DatasetRepository>,
    joinable_view_repo: Arc<dyn JoinableViewRepository>,
}

impl AccessHarness {
    pub fn new() -> Self {
        let time_source =
            FakeSystemTimeSource::new(Utc.with_ymd_and_hms(2050, 1, 1, 12, 0, 0).unwrap());

        let catalog = {
            let mut b = CatalogBuilder::new();

            b.add_value(time_source.clone())
                .bind::<dyn SystemTimeSource, FakeSystemTimeSource>()
                .add_value(IntegrationsConfig::sample())
                .add_value(MappingQueueConfig::default())
                .add::<InMemoryDatasetRepository>()
                .add::<InMemoryJoinableViewRepository>()
                .add::<InMemoryAccessRepository>()
                .add::<InMemoryAccessRequestRepository>()
                .add::<InMemoryIntegrationMetadataRepository>()
                .add::<InMemoryThirdPartyMappingRepository>()
                .add::<InMemoryWorkflowRepository>()
                .add::<InMemoryWarehouse>()
                .add::<InMemoryBiTool>()
                .add::<InMemoryServiceAccounts>()
                .add::<InMemoryCloudResourceManager>()
                .add::<InMemoryKms>();

            nada_integrations_services::register_dependencies(&mut b);
            nada_access_services::register_dependencies(&mut b);

            b.build()
        };

        Self {
            time_source,
            config: catalog.get_one().unwrap(),
            warehouse: catalog.get_one().unwrap(),
            bi_tool: catalog.get_one().unwrap(),
            access_service: catalog.get_one().unwrap(),
            access_repo: catalog.get_one().unwrap(),
            access_request_repo: catalog.get_one().unwrap(),
            integration_service: catalog.get_one().unwrap(),
            metadata_repo: catalog.get_one().unwrap(),
            dataset_repo: catalog.get_one().unwrap(),
            joinable_view_repo: catalog.get_one().unwrap(),
            catalog,
        }
    }

    pub async fn add_dataset(&self, name: &str, table: &str) -> Dataset {
        self.save_dataset(Dataset::test(name, table)).await
    }

    /// Registers the dataset in the catalogue and creates its table
    pub async fn save_dataset(&self, dataset: Dataset) -> Dataset {
        self.dataset_repo.save_dataset(&dataset).await.unwrap();
        self.warehouse
            .add_table(orders_like_table(dataset.datasource.table_ref()));
        dataset
    }

    /// Creates a joinable view owned by the email covering the given datasets,
    /// with one pseudonymised view per dataset
    pub async fn add_joinable_view(
        &self,
        owner: &str,
        datasets: &[&Dataset],
        expires: Option<chrono::DateTime<Utc>>,
    ) -> JoinableView {
        let id = JoinableViewID::new_random();
        let views = datasets
            .iter()
            .map(|d| {
                let view = TableRef::new(
                    "nada-prod",
                    "markedsplassen_joinable_views",
                    format!("{}_{}", d.datasource.table, id.to_string().replace('-', "")),
                );
                self.warehouse.add_table(orders_like_table(view.clone()));
                JoinableViewTable {
                    dataset_id: d.id,
                    view,
                }
            })
            .collect();

        let joinable_view = JoinableView {
            id,
            name: format!("joinable-{id}"),
            owner: owner.to_string(),
            created: self.time_source.now(),
            expires,
            deleted: None,
            views,
        };
        self.joinable_view_repo
            .save_joinable_view(&joinable_view)
            .await
            .unwrap();
        joinable_view
    }

    /// Provisions a restricted BI-tool integration for a fresh dataset
    pub async fn restricted(&self, name: &str, table: &str) -> (Dataset, PermissionGroupID) {
        let dataset = self.add_dataset(name, table).await;
        let status = self
            .integration_service
            .run_workflow(dataset.id, WorkflowKind::CreateRestricted)
            .await
            .unwrap();
        assert!(status.workflow.is_finished(), "{:?}", status.errors());

        let group_id = self
            .metadata(dataset.id)
            .await
            .unwrap()
            .permission_group_id()
            .unwrap();
        (dataset, group_id)
    }

    pub async fn metadata(&self, dataset_id: DatasetID) -> Option<IntegrationMetadata> {
        self.metadata_repo.find_metadata(dataset_id).await.unwrap()
    }

    pub async fn grant(
        &self,
        dataset_id: DatasetID,
        subject: Subject,
        platform: Platform,
    ) -> Result<Access, GrantAccessError> {
        self.access_service
            .grant_access(GrantAccess {
                dataset_id,
                subject,
                owner: None,
                platform,
                expires: None,
                granter: APPROVER.to_string(),
            })
            .await
    }

    pub async fn active_accesses(&self, dataset_id: DatasetID) -> Vec<Access> {
        self.access_repo
            .list_active_accesses(dataset_id)
            .await
            .unwrap()
    }

    pub fn shared_member(&self) -> String {
        service_account_member(&self.config.shared_service_account_email)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub(crate) fn orders_like_table(table_ref: TableRef) -> WarehouseTable {
    let column = |name: &str, field_type: &str| WarehouseColumn {
        name: name.to_string(),
        field_type: field_type.to_string(),
        description: None,
    };

    WarehouseTable {
        table_ref,
        table_type: WarehouseTableType::Table,
        schema: vec![
            column("id", "INTEGER"),
            column("customer_name", "STRING"),
            column("created_at", "TIMESTAMP"),
        ],
    }
}

pub(crate) fn user_member(email: &str) -> String {
    Subject::user(email).warehouse_member()
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
