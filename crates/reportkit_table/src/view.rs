//! Per-report session: one definition, a shared merge-region cache, and a
//! full recomputation of the derived table on every row refresh.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::aggregate::build_aggregate_row_with_report;
use crate::conf::derive_default_aggregate_policy;
use crate::definition::SpecReportDefinition;
use crate::error::TableError;
use crate::header::build_header_plan;
use crate::merge::MergeRegionCache;
use crate::project::{derive_body_rows_flat, project_double_rows, project_rows};
use crate::spec::{
    SpecAggregatePolicy, SpecBodyRow, SpecHeaderCellPlan, SpecMergeRegion, SpecTableReport,
    TypeAggregateRow, TypeRecord,
};

/// Everything the UI needs to draw one report table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecTableView {
    /// Header merges in lookup order.
    pub merge_regions: Vec<SpecMergeRegion>,
    /// Render plan per header row.
    pub header_plan: Vec<Vec<SpecHeaderCellPlan>>,
    /// Physical body rows.
    pub body: Vec<SpecBodyRow>,
    /// Trailing aggregate row, when the definition has a column spec.
    pub aggregate_row: Option<TypeAggregateRow>,
    /// Non-fatal warnings raised during this render.
    pub report: SpecTableReport,
}

/// Report view session.
pub struct ReportView {
    definition: SpecReportDefinition,
    cache: Arc<MergeRegionCache>,
    policy: SpecAggregatePolicy,
}

impl ReportView {
    /// Bind a validated definition to a merge-region cache.
    pub fn new(
        definition: SpecReportDefinition,
        cache: Arc<MergeRegionCache>,
    ) -> Result<Self, TableError> {
        definition.validate()?;
        Ok(Self {
            definition,
            cache,
            policy: derive_default_aggregate_policy(),
        })
    }

    /// Replace the aggregate policy.
    pub fn with_policy(mut self, policy: SpecAggregatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn definition(&self) -> &SpecReportDefinition {
        &self.definition
    }

    /// Cached merge regions of this view's header.
    pub fn merge_regions(&self) -> Arc<[SpecMergeRegion]> {
        self.cache.get_or_compute(&self.definition.header)
    }

    /// Recompute header plan, body and aggregate row for `rows`.
    pub fn render(&self, rows: &[TypeRecord]) -> SpecTableView {
        let mut report = SpecTableReport::default();
        let regions = self.merge_regions();
        let header_plan = build_header_plan(&self.definition.header, &regions);

        let body = match &self.definition.column_keys_secondary {
            Some(l_keys_secondary) => project_double_rows(
                rows,
                &self.definition.column_keys,
                l_keys_secondary,
                &mut report,
            ),
            None => derive_body_rows_flat(project_rows(rows, &self.definition.column_keys)),
        };

        let aggregate_row = if self.definition.column_spec.is_empty() {
            None
        } else {
            Some(build_aggregate_row_with_report(
                &self.definition.column_spec,
                rows,
                &self.policy,
                &mut report,
            ))
        };

        log::debug!(
            "rendered {:?}: {} record(s), {} body row(s), {} warning(s)",
            self.definition.sheet_name,
            rows.len(),
            body.len(),
            report.warnings.len()
        );

        SpecTableView {
            merge_regions: regions.to_vec(),
            header_plan,
            body,
            aggregate_row,
            report,
        }
    }
}
