// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::collections::BTreeMap;
use std::sync::Arc;

use assert_matches::assert_matches;
use nada_platform_apis::*;
use nada_platform_apis_inmem::{InMemoryBiTool, InMemoryWarehouse};
use pretty_assertions::assert_eq;
use secrecy::SecretString;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

struct BiToolHarness {
    warehouse: Arc<InMemoryWarehouse>,
    bi_tool: InMemoryBiTool,
}

impl BiToolHarness {
    fn new() -> Self {
        let warehouse = Arc::new(InMemoryWarehouse::new());
        for table in ["orders", "customers"] {
            warehouse.add_table(WarehouseTable {
                table_ref: TableRef::new("team-a-prod", "sales", table),
                table_type: WarehouseTableType::Table,
                schema: vec![
                    WarehouseColumn {
                        name: "id".to_string(),
                        field_type: "INTEGER".to_string(),
                        description: None,
                    },
                    WarehouseColumn {
                        name: "created_at".to_string(),
                        field_type: "TIMESTAMP".to_string(),
                        description: None,
                    },
                ],
            });
        }

        let bi_tool = InMemoryBiTool::new(warehouse.clone());
        Self { warehouse, bi_tool }
    }

    async fn create_database(&self) -> BiToolDatabase {
        self.bi_tool
            .create_database(NewBiToolDatabase {
                name: "orders".to_string(),
                project_id: "team-a-prod".to_string(),
                dataset: "sales".to_string(),
                service_account_email: "sa@nada-prod.iam.gserviceaccount.com".to_string(),
                service_account_key: SecretString::from("{}"),
            })
            .await
            .unwrap()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_database_discovers_dataset_tables() {
    let harness = BiToolHarness::new();
    let database = harness.create_database().await;

    let tables = harness.bi_tool.list_tables(database.id).await.unwrap();
    let mut names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["customers", "orders"]);
    assert!(tables.iter().all(|t| t.fields.len() == 2));
    assert!(
        tables
            .iter()
            .all(|t| t.visibility == TableVisibility::Visible)
    );

    assert_eq!(
        harness.bi_tool.data_access(database.id),
        BTreeMap::from([(PermissionGroupID::ALL_USERS, DataAccess::Unrestricted)])
    );
    assert_eq!(harness.warehouse.mutation_count(), 0);
}

#[test_log::test(tokio::test)]
async fn test_fields_appear_after_deferred_sync() {
    let harness = BiToolHarness::new();
    harness.bi_tool.set_auto_sync(false);
    let database = harness.create_database().await;

    let tables = harness.bi_tool.list_tables(database.id).await.unwrap();
    assert!(tables.iter().all(|t| t.fields.is_empty()));

    harness.bi_tool.sync_database(database.id).await.unwrap();

    let tables = harness.bi_tool.list_tables(database.id).await.unwrap();
    assert!(tables.iter().all(|t| t.fields.len() == 2));
}

#[test_log::test(tokio::test)]
async fn test_restrict_and_open_permission_graph() {
    let harness = BiToolHarness::new();
    let database = harness.create_database().await;
    let group = harness
        .bi_tool
        .create_permission_group("team-a-orders")
        .await
        .unwrap();

    harness
        .bi_tool
        .restrict_database_access(database.id, group.id)
        .await
        .unwrap();
    assert_eq!(
        harness.bi_tool.data_access(database.id),
        BTreeMap::from([
            (PermissionGroupID::ALL_USERS, DataAccess::NoSelfService),
            (group.id, DataAccess::Unrestricted),
        ])
    );

    harness
        .bi_tool
        .open_database_access(database.id)
        .await
        .unwrap();
    assert_eq!(
        harness.bi_tool.data_access(database.id),
        BTreeMap::from([(PermissionGroupID::ALL_USERS, DataAccess::Unrestricted)])
    );
}

#[test_log::test(tokio::test)]
async fn test_group_membership_by_email() {
    let harness = BiToolHarness::new();
    let group = harness
        .bi_tool
        .create_permission_group("team-a-orders")
        .await
        .unwrap();

    assert!(
        harness
            .bi_tool
            .add_member_by_email(group.id, "Alice@Example.com")
            .await
            .unwrap()
    );
    assert!(
        !harness
            .bi_tool
            .add_member_by_email(group.id, "alice@example.com")
            .await
            .unwrap()
    );
    assert_eq!(
        harness.bi_tool.group_member_emails(group.id),
        vec!["alice@example.com".to_string()]
    );
    assert_eq!(harness.bi_tool.call_count("create_user"), 1);

    assert!(
        harness
            .bi_tool
            .remove_member_by_email(group.id, "alice@example.com")
            .await
            .unwrap()
    );
    assert!(
        !harness
            .bi_tool
            .remove_member_by_email(group.id, "alice@example.com")
            .await
            .unwrap()
    );
    assert!(harness.bi_tool.group_member_emails(group.id).is_empty());
}

#[test_log::test(tokio::test)]
async fn test_group_names_are_unique() {
    let harness = BiToolHarness::new();
    harness
        .bi_tool
        .create_permission_group("team-a-orders")
        .await
        .unwrap();

    assert_matches!(
        harness
            .bi_tool
            .create_permission_group("team-a-orders")
            .await,
        Err(ApiError::Internal(_))
    );
}

#[test_log::test(tokio::test)]
async fn test_deleting_missing_resources_is_not_found() {
    let harness = BiToolHarness::new();

    assert_matches!(
        harness
            .bi_tool
            .delete_database(DatabaseID::new(4242))
            .await,
        Err(e) if e.is_not_found()
    );
    assert_matches!(
        harness
            .bi_tool
            .delete_permission_group(PermissionGroupID::new(4242))
            .await,
        Err(e) if e.is_not_found()
    );
    assert_matches!(
        harness
            .bi_tool
            .archive_collection(CollectionID::new(4242))
            .await,
        Err(e) if e.is_not_found()
    );
}

#[test_log::test(tokio::test)]
async fn test_delete_database_drops_tables() {
    let harness = BiToolHarness::new();
    let database = harness.create_database().await;

    harness.bi_tool.delete_database(database.id).await.unwrap();

    assert!(harness.bi_tool.databases().is_empty());
    assert!(harness.bi_tool.tables(database.id).is_empty());
    assert_matches!(
        harness.bi_tool.get_database(database.id).await,
        Err(ApiError::NotFound(_))
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
