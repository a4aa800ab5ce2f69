// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use crate::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait BiToolApi: Send + Sync {
    // Users

    async fn find_user_by_email(&self, email: &str) -> Result<Option<BiToolUser>, ApiError>;

    async fn create_user(&self, email: &str) -> Result<BiToolUser, ApiError>;

    // Permission groups

    async fn list_permission_groups(&self) -> Result<Vec<PermissionGroup>, ApiError>;

    async fn create_permission_group(&self, name: &str) -> Result<PermissionGroup, ApiError>;

    async fn delete_permission_group(&self, group_id: PermissionGroupID) -> Result<(), ApiError>;

    async fn list_permission_group_members(
        &self,
        group_id: PermissionGroupID,
    ) -> Result<Vec<PermissionGroupMember>, ApiError>;

    async fn add_permission_group_member(
        &self,
        group_id: PermissionGroupID,
        user_id: UserID,
    ) -> Result<(), ApiError>;

    async fn remove_permission_group_member(
        &self,
        membership_id: MembershipID,
    ) -> Result<(), ApiError>;

    // Collections

    /// Includes archived collections
    async fn list_collections(&self) -> Result<Vec<Collection>, ApiError>;

    async fn create_collection(&self, name: &str, description: &str)
    -> Result<Collection, ApiError>;

    async fn archive_collection(&self, collection_id: CollectionID) -> Result<(), ApiError>;

    /// Collection graph update for a single group
    async fn set_collection_access(
        &self,
        collection_id: CollectionID,
        group_id: PermissionGroupID,
        access: CollectionAccess,
    ) -> Result<(), ApiError>;

    // Databases

    async fn list_databases(&self) -> Result<Vec<BiToolDatabase>, ApiError>;

    async fn create_database(&self, request: NewBiToolDatabase)
    -> Result<BiToolDatabase, ApiError>;

    async fn get_database(&self, database_id: DatabaseID) -> Result<BiToolDatabase, ApiError>;

    async fn update_database_credential(
        &self,
        database_id: DatabaseID,
        service_account_email: &str,
        service_account_key: secrecy::SecretString,
    ) -> Result<(), ApiError>;

    async fn delete_database(&self, database_id: DatabaseID) -> Result<(), ApiError>;

    // Tables

    async fn list_tables(&self, database_id: DatabaseID) -> Result<Vec<BiToolTable>, ApiError>;

    async fn set_tables_visibility(
        &self,
        table_ids: &[TableID],
        visibility: TableVisibility,
    ) -> Result<(), ApiError>;

    async fn set_field_semantic_type(
        &self,
        field_id: FieldID,
        semantic_type: &str,
    ) -> Result<(), ApiError>;

    // Permission graph

    /// Grants the group unrestricted access and revokes it from all users
    async fn restrict_database_access(
        &self,
        database_id: DatabaseID,
        group_id: PermissionGroupID,
    ) -> Result<(), ApiError>;

    /// Grants all users unrestricted access
    async fn open_database_access(&self, database_id: DatabaseID) -> Result<(), ApiError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Membership helpers shared by provisioning and the access engine
#[async_trait::async_trait]
pub trait BiToolApiExt {
    /// Adds the user with this email to the group, creating the user if the BI
    /// tool does not know it yet. Returns `false` if already a member.
    async fn add_member_by_email(
        &self,
        group_id: PermissionGroupID,
        email: &str,
    ) -> Result<bool, ApiError>;

    /// Returns `false` if the email was not a member
    async fn remove_member_by_email(
        &self,
        group_id: PermissionGroupID,
        email: &str,
    ) -> Result<bool, ApiError>;
}

#[async_trait::async_trait]
impl<T: BiToolApi + ?Sized> BiToolApiExt for T {
    async fn add_member_by_email(
        &self,
        group_id: PermissionGroupID,
        email: &str,
    ) -> Result<bool, ApiError> {
        let members = self.list_permission_group_members(group_id).await?;
        if members.iter().any(|m| m.email.eq_ignore_ascii_case(email)) {
            return Ok(false);
        }

        let user = match self.find_user_by_email(email).await? {
            Some(user) => user,
            None => self.create_user(email).await?,
        };

        self.add_permission_group_member(group_id, user.id).await?;
        Ok(true)
    }

    async fn remove_member_by_email(
        &self,
        group_id: PermissionGroupID,
        email: &str,
    ) -> Result<bool, ApiError> {
        let members = self.list_permission_group_members(group_id).await?;
        let Some(member) = members
            .into_iter()
            .find(|m| m.email.eq_ignore_ascii_case(email))
        else {
            return Ok(false);
        };

        self.remove_permission_group_member(member.membership_id)
            .await?;
        Ok(true)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
