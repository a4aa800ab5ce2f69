// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use dill::CatalogBuilder;

use crate::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub fn register_dependencies(catalog_builder: &mut CatalogBuilder) {
    catalog_builder.add::<IntegrationServiceImpl>();
    catalog_builder.add::<IntegrationSteps>();
    catalog_builder.add::<MappingQueueImpl>();

    catalog_builder.add::<CreateRestrictedWorkflow>();
    catalog_builder.add::<CreateOpenWorkflow>();
    catalog_builder.add::<DeleteRestrictedWorkflow>();
    catalog_builder.add::<DeleteOpenWorkflow>();
    catalog_builder.add::<OpenRestrictedWorkflow>();

    catalog_builder.add::<MappingQueueProducer>();
    catalog_builder.add::<BiToolTableVisibilityRunner>();
    catalog_builder.add::<WarehouseMissingTablesRunner>();
    catalog_builder.add::<IamPolicyDriftRunner>();
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
