// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Group that stands for every authenticated user of the organisation
pub const ALL_USERS_GROUP_EMAIL: &str = "all-users@nav.no";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubjectType {
    User,
    Group,
    ServiceAccount,
}

impl SubjectType {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::ServiceAccount => "serviceAccount",
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Principal access is granted to. Formats as the warehouse member string,
/// e.g. `user:jane@nav.no`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Subject {
    pub subject_type: SubjectType,
    pub email: String,
}

impl Subject {
    pub fn new(subject_type: SubjectType, email: impl Into<String>) -> Self {
        Self {
            subject_type,
            email: email.into().to_lowercase(),
        }
    }

    pub fn user(email: impl Into<String>) -> Self {
        Self::new(SubjectType::User, email)
    }

    pub fn group(email: impl Into<String>) -> Self {
        Self::new(SubjectType::Group, email)
    }

    pub fn service_account(email: impl Into<String>) -> Self {
        Self::new(SubjectType::ServiceAccount, email)
    }

    pub fn all_users() -> Self {
        Self::group(ALL_USERS_GROUP_EMAIL)
    }

    pub fn is_all_users(&self) -> bool {
        self.subject_type == SubjectType::Group && self.email == ALL_USERS_GROUP_EMAIL
    }

    pub fn is_user(&self) -> bool {
        self.subject_type == SubjectType::User
    }

    /// Member string understood by the warehouse IAM
    pub fn warehouse_member(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.subject_type.prefix(), self.email)
    }
}

impl FromStr for Subject {
    type Err = InvalidSubjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidSubjectError {
            value: s.to_string(),
        };

        let (prefix, email) = s.split_once(':').ok_or_else(invalid)?;
        let subject_type = match prefix {
            "user" => SubjectType::User,
            "group" => SubjectType::Group,
            "serviceAccount" => SubjectType::ServiceAccount,
            _ => return Err(invalid()),
        };

        if email.is_empty() || !email.contains('@') {
            return Err(invalid());
        }

        Ok(Self::new(subject_type, email))
    }
}

impl TryFrom<String> for Subject {
    type Error = InvalidSubjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Subject> for String {
    fn from(value: Subject) -> Self {
        value.to_string()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Error)]
#[error("Invalid subject '{value}', expected '<user|group|serviceAccount>:<email>'")]
pub struct InvalidSubjectError {
    pub value: String,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
