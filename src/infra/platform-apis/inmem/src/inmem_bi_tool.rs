// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use dill::*;
use internal_error::ErrorIntoInternal;
use nada_platform_apis::*;

use crate::call_counter::CallCounter;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Emulates the BI tool. Registering a database discovers the tables of the
/// warehouse dataset; their field lists stay empty until the database is
/// synced, which happens immediately unless auto-sync is disabled.
pub struct InMemoryBiTool {
    warehouse: Arc<dyn WarehouseApi>,
    state: Arc<Mutex<State>>,
}

struct State {
    next_id: i64,
    auto_sync: bool,
    users: BTreeMap<UserID, BiToolUser>,
    groups: BTreeMap<PermissionGroupID, PermissionGroup>,
    members: BTreeMap<MembershipID, (PermissionGroupID, UserID)>,
    collections: BTreeMap<CollectionID, Collection>,
    collection_access: HashMap<(CollectionID, PermissionGroupID), CollectionAccess>,
    databases: BTreeMap<DatabaseID, BiToolDatabase>,
    tables: BTreeMap<TableID, BiToolTable>,
    data_access: HashMap<DatabaseID, BTreeMap<PermissionGroupID, DataAccess>>,
    calls: CallCounter,
}

impl State {
    fn new() -> Self {
        let mut groups = BTreeMap::new();
        groups.insert(
            PermissionGroupID::ALL_USERS,
            PermissionGroup {
                id: PermissionGroupID::ALL_USERS,
                name: "All Users".to_string(),
            },
        );

        Self {
            next_id: 100,
            auto_sync: true,
            users: BTreeMap::new(),
            groups,
            members: BTreeMap::new(),
            collections: BTreeMap::new(),
            collection_access: HashMap::new(),
            databases: BTreeMap::new(),
            tables: BTreeMap::new(),
            data_access: HashMap::new(),
            calls: CallCounter::default(),
        }
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn require_group(&self, group_id: PermissionGroupID) -> Result<(), ApiError> {
        if self.groups.contains_key(&group_id) {
            Ok(())
        } else {
            Err(ApiError::not_found("permission group", group_id))
        }
    }

    fn require_database(&self, database_id: DatabaseID) -> Result<(), ApiError> {
        if self.databases.contains_key(&database_id) {
            Ok(())
        } else {
            Err(ApiError::not_found("database", database_id))
        }
    }

    fn register_tables(&mut self, database_id: DatabaseID, tables: Vec<WarehouseTable>) {
        for table in tables {
            let table_id = TableID::new(self.next_id());
            self.tables.insert(
                table_id,
                BiToolTable {
                    id: table_id,
                    database_id,
                    name: table.table_ref.table,
                    visibility: TableVisibility::Visible,
                    fields: Vec::new(),
                },
            );
        }
    }

    fn sync_fields(&mut self, database_id: DatabaseID, tables: &[WarehouseTable]) {
        let table_ids: Vec<_> = self
            .tables
            .values()
            .filter(|t| t.database_id == database_id && t.fields.is_empty())
            .map(|t| t.id)
            .collect();

        for table_id in table_ids {
            let Some(source) = tables
                .iter()
                .find(|wt| self.tables[&table_id].name == wt.table_ref.table)
            else {
                continue;
            };

            let fields: Vec<_> = source
                .schema
                .iter()
                .map(|column| BiToolField {
                    id: FieldID::new(self.next_id()),
                    name: column.name.clone(),
                    database_type: column.field_type.clone(),
                    semantic_type: None,
                })
                .collect();

            if let Some(table) = self.tables.get_mut(&table_id) {
                table.fields = fields;
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[component(pub)]
#[interface(dyn BiToolApi)]
#[scope(Singleton)]
impl InMemoryBiTool {
    pub fn new(warehouse: Arc<dyn WarehouseApi>) -> Self {
        Self {
            warehouse,
            state: Arc::new(Mutex::new(State::new())),
        }
    }

    pub fn set_auto_sync(&self, auto_sync: bool) {
        self.state.lock().unwrap().auto_sync = auto_sync;
    }

    /// Completes the metadata sync of a database registered while auto-sync
    /// was disabled
    pub async fn sync_database(&self, database_id: DatabaseID) -> Result<(), ApiError> {
        let (project_id, dataset) = {
            let state = self.state.lock().unwrap();
            let database = state
                .databases
                .get(&database_id)
                .ok_or_else(|| ApiError::not_found("database", database_id))?;
            (database.project_id.clone(), database.dataset.clone())
        };

        let tables = self.warehouse.list_tables(&project_id, &dataset).await?;

        self.state
            .lock()
            .unwrap()
            .sync_fields(database_id, &tables);
        Ok(())
    }

    pub fn databases(&self) -> Vec<BiToolDatabase> {
        self.state
            .lock()
            .unwrap()
            .databases
            .values()
            .cloned()
            .collect()
    }

    pub fn database(&self, database_id: DatabaseID) -> Option<BiToolDatabase> {
        self.state
            .lock()
            .unwrap()
            .databases
            .get(&database_id)
            .cloned()
    }

    pub fn tables(&self, database_id: DatabaseID) -> Vec<BiToolTable> {
        self.state
            .lock()
            .unwrap()
            .tables
            .values()
            .filter(|t| t.database_id == database_id)
            .cloned()
            .collect()
    }

    pub fn groups(&self) -> Vec<PermissionGroup> {
        self.state
            .lock()
            .unwrap()
            .groups
            .values()
            .cloned()
            .collect()
    }

    pub fn group_member_emails(&self, group_id: PermissionGroupID) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .members
            .values()
            .filter(|(g, _)| *g == group_id)
            .filter_map(|(_, user_id)| state.users.get(user_id))
            .map(|u| u.email.clone())
            .collect()
    }

    pub fn collection(&self, collection_id: CollectionID) -> Option<Collection> {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(&collection_id)
            .cloned()
    }

    pub fn collection_access(
        &self,
        collection_id: CollectionID,
        group_id: PermissionGroupID,
    ) -> Option<CollectionAccess> {
        self.state
            .lock()
            .unwrap()
            .collection_access
            .get(&(collection_id, group_id))
            .copied()
    }

    pub fn data_access(&self, database_id: DatabaseID) -> BTreeMap<PermissionGroupID, DataAccess> {
        self.state
            .lock()
            .unwrap()
            .data_access
            .get(&database_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state.lock().unwrap().calls.count(method)
    }

    pub fn mutation_count(&self) -> usize {
        self.state.lock().unwrap().calls.total()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl BiToolApi for InMemoryBiTool {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<BiToolUser>, ApiError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_user(&self, email: &str) -> Result<BiToolUser, ApiError> {
        let mut state = self.state.lock().unwrap();
        if state
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(email))
        {
            return Err(format!("User {email} already exists").int_err().into());
        }
        state.calls.record("create_user");

        let user = BiToolUser {
            id: UserID::new(state.next_id()),
            email: email.to_lowercase(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_permission_groups(&self) -> Result<Vec<PermissionGroup>, ApiError> {
        Ok(self.groups())
    }

    async fn create_permission_group(&self, name: &str) -> Result<PermissionGroup, ApiError> {
        let mut state = self.state.lock().unwrap();
        if state.groups.values().any(|g| g.name == name) {
            return Err(format!("Group {name} already exists").int_err().into());
        }
        state.calls.record("create_permission_group");

        let group = PermissionGroup {
            id: PermissionGroupID::new(state.next_id()),
            name: name.to_string(),
        };
        state.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn delete_permission_group(&self, group_id: PermissionGroupID) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.require_group(group_id)?;
        state.calls.record("delete_permission_group");

        state.groups.remove(&group_id);
        state.members.retain(|_, (g, _)| *g != group_id);
        state.collection_access.retain(|(_, g), _| *g != group_id);
        for access in state.data_access.values_mut() {
            access.remove(&group_id);
        }
        Ok(())
    }

    async fn list_permission_group_members(
        &self,
        group_id: PermissionGroupID,
    ) -> Result<Vec<PermissionGroupMember>, ApiError> {
        let state = self.state.lock().unwrap();
        state.require_group(group_id)?;

        Ok(state
            .members
            .iter()
            .filter(|(_, (g, _))| *g == group_id)
            .filter_map(|(membership_id, (_, user_id))| {
                state.users.get(user_id).map(|u| PermissionGroupMember {
                    membership_id: *membership_id,
                    user_id: *user_id,
                    email: u.email.clone(),
                })
            })
            .collect())
    }

    async fn add_permission_group_member(
        &self,
        group_id: PermissionGroupID,
        user_id: UserID,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.require_group(group_id)?;
        if !state.users.contains_key(&user_id) {
            return Err(ApiError::not_found("user", user_id));
        }
        state.calls.record("add_permission_group_member");

        if !state
            .members
            .values()
            .any(|(g, u)| *g == group_id && *u == user_id)
        {
            let membership_id = MembershipID::new(state.next_id());
            state.members.insert(membership_id, (group_id, user_id));
        }
        Ok(())
    }

    async fn remove_permission_group_member(
        &self,
        membership_id: MembershipID,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        if state.members.remove(&membership_id).is_none() {
            return Err(ApiError::not_found("membership", membership_id));
        }
        state.calls.record("remove_permission_group_member");
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .collections
            .values()
            .cloned()
            .collect())
    }

    async fn create_collection(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Collection, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.record("create_collection");

        let collection = Collection {
            id: CollectionID::new(state.next_id()),
            name: name.to_string(),
            description: description.to_string(),
            archived: false,
        };
        state.collections.insert(collection.id, collection.clone());
        Ok(collection)
    }

    async fn archive_collection(&self, collection_id: CollectionID) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let collection = state
            .collections
            .get_mut(&collection_id)
            .ok_or_else(|| ApiError::not_found("collection", collection_id))?;
        collection.archived = true;
        state.calls.record("archive_collection");
        Ok(())
    }

    async fn set_collection_access(
        &self,
        collection_id: CollectionID,
        group_id: PermissionGroupID,
        access: CollectionAccess,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.require_group(group_id)?;
        if !state.collections.contains_key(&collection_id) {
            return Err(ApiError::not_found("collection", collection_id));
        }
        state.calls.record("set_collection_access");

        state
            .collection_access
            .insert((collection_id, group_id), access);
        Ok(())
    }

    async fn list_databases(&self) -> Result<Vec<BiToolDatabase>, ApiError> {
        Ok(self.databases())
    }

    async fn create_database(
        &self,
        request: NewBiToolDatabase,
    ) -> Result<BiToolDatabase, ApiError> {
        let tables = self
            .warehouse
            .list_tables(&request.project_id, &request.dataset)
            .await?;

        let mut state = self.state.lock().unwrap();
        state.calls.record("create_database");

        let database = BiToolDatabase {
            id: DatabaseID::new(state.next_id()),
            name: request.name,
            project_id: request.project_id,
            dataset: request.dataset,
            service_account_email: request.service_account_email,
        };
        state.databases.insert(database.id, database.clone());

        // Newly registered databases are visible to everyone until restricted
        state.data_access.insert(
            database.id,
            BTreeMap::from([(PermissionGroupID::ALL_USERS, DataAccess::Unrestricted)]),
        );

        state.register_tables(database.id, tables.clone());
        if state.auto_sync {
            state.sync_fields(database.id, &tables);
        }

        Ok(database)
    }

    async fn get_database(&self, database_id: DatabaseID) -> Result<BiToolDatabase, ApiError> {
        self.database(database_id)
            .ok_or_else(|| ApiError::not_found("database", database_id))
    }

    async fn update_database_credential(
        &self,
        database_id: DatabaseID,
        service_account_email: &str,
        _service_account_key: secrecy::SecretString,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let database = state
            .databases
            .get_mut(&database_id)
            .ok_or_else(|| ApiError::not_found("database", database_id))?;
        database.service_account_email = service_account_email.to_string();
        state.calls.record("update_database_credential");
        Ok(())
    }

    async fn delete_database(&self, database_id: DatabaseID) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.require_database(database_id)?;
        state.calls.record("delete_database");

        state.databases.remove(&database_id);
        state.tables.retain(|_, t| t.database_id != database_id);
        state.data_access.remove(&database_id);
        Ok(())
    }

    async fn list_tables(&self, database_id: DatabaseID) -> Result<Vec<BiToolTable>, ApiError> {
        self.state.lock().unwrap().require_database(database_id)?;
        Ok(self.tables(database_id))
    }

    async fn set_tables_visibility(
        &self,
        table_ids: &[TableID],
        visibility: TableVisibility,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        if let Some(missing) = table_ids.iter().find(|id| !state.tables.contains_key(id)) {
            return Err(ApiError::not_found("table", missing));
        }
        state.calls.record("set_tables_visibility");

        for table_id in table_ids {
            if let Some(table) = state.tables.get_mut(table_id) {
                table.visibility = visibility;
            }
        }
        Ok(())
    }

    async fn set_field_semantic_type(
        &self,
        field_id: FieldID,
        semantic_type: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let field = state
            .tables
            .values_mut()
            .flat_map(|t| t.fields.iter_mut())
            .find(|f| f.id == field_id)
            .ok_or_else(|| ApiError::not_found("field", field_id))?;
        field.semantic_type = Some(semantic_type.to_string());
        state.calls.record("set_field_semantic_type");
        Ok(())
    }

    async fn restrict_database_access(
        &self,
        database_id: DatabaseID,
        group_id: PermissionGroupID,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.require_database(database_id)?;
        state.require_group(group_id)?;
        state.calls.record("restrict_database_access");

        state.data_access.insert(
            database_id,
            BTreeMap::from([
                (PermissionGroupID::ALL_USERS, DataAccess::NoSelfService),
                (group_id, DataAccess::Unrestricted),
            ]),
        );
        Ok(())
    }

    async fn open_database_access(&self, database_id: DatabaseID) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.require_database(database_id)?;
        state.calls.record("open_database_access");

        state.data_access.insert(
            database_id,
            BTreeMap::from([(PermissionGroupID::ALL_USERS, DataAccess::Unrestricted)]),
        );
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
