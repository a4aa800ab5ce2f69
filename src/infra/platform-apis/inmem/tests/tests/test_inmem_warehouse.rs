// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use assert_matches::assert_matches;
use nada_platform_apis::*;
use nada_platform_apis_inmem::InMemoryWarehouse;
use pretty_assertions::assert_eq;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn orders_table() -> WarehouseTable {
    WarehouseTable {
        table_ref: TableRef::new("team-a-prod", "sales", "orders"),
        table_type: WarehouseTableType::Table,
        schema: vec![WarehouseColumn {
            name: "id".to_string(),
            field_type: "INTEGER".to_string(),
            description: None,
        }],
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_grant_and_revoke_reader() {
    let warehouse = InMemoryWarehouse::new();
    let table = orders_table();
    warehouse.add_table(table.clone());

    let member = "user:alice@example.com";
    warehouse.grant(&table.table_ref, member).await.unwrap();
    warehouse.grant(&table.table_ref, member).await.unwrap();
    assert!(warehouse.has_reader(&table.table_ref, member));

    warehouse.revoke(&table.table_ref, member).await.unwrap();
    assert!(!warehouse.has_reader(&table.table_ref, member));
    assert_eq!(warehouse.call_count("grant"), 2);
    assert_eq!(warehouse.mutation_count(), 3);
}

#[test_log::test(tokio::test)]
async fn test_unknown_table_is_not_found() {
    let warehouse = InMemoryWarehouse::new();
    let table = TableRef::new("team-a-prod", "sales", "missing");

    assert_matches!(
        warehouse.grant(&table, "user:alice@example.com").await,
        Err(ApiError::NotFound(_))
    );
    assert_matches!(
        warehouse.revoke(&table, "user:alice@example.com").await,
        Err(ApiError::NotFound(_))
    );
    assert_matches!(warehouse.get_table(&table).await, Err(e) if e.is_not_found());
}

#[test_log::test(tokio::test)]
async fn test_policy_roundtrip_removes_member() {
    let warehouse = InMemoryWarehouse::new();
    let table = orders_table();
    warehouse.add_table(table.clone());

    warehouse
        .grant(&table.table_ref, "serviceAccount:sa@p.iam.gserviceaccount.com")
        .await
        .unwrap();
    warehouse
        .grant(&table.table_ref, "group:team@example.com")
        .await
        .unwrap();

    let mut policy = warehouse.get_table_policy(&table.table_ref).await.unwrap();
    assert!(policy.remove_member("serviceAccount:sa@p.iam.gserviceaccount.com"));
    warehouse
        .update_table_policy(&table.table_ref, policy)
        .await
        .unwrap();

    assert_eq!(
        warehouse.members(&table.table_ref).into_iter().collect::<Vec<_>>(),
        vec!["group:team@example.com".to_string()]
    );
}

#[test_log::test(tokio::test)]
async fn test_list_tables_filters_by_dataset() {
    let warehouse = InMemoryWarehouse::new();
    warehouse.add_table(orders_table());

    let mut other = orders_table();
    other.table_ref = TableRef::new("team-a-prod", "marketing", "orders");
    warehouse.add_table(other);

    let tables = warehouse.list_tables("team-a-prod", "sales").await.unwrap();
    assert_eq!(tables, vec![orders_table()]);

    warehouse.drop_table(&orders_table().table_ref);
    let tables = warehouse.list_tables("team-a-prod", "sales").await.unwrap();
    assert!(tables.is_empty());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
