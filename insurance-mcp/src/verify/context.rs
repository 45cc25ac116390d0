//! Mutable state threaded through one verification run.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Pass/fail counters. Skipped checks are never counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TestResults {
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
}

impl TestResults {
    pub fn record(&mut self, passed: bool) {
        self.total += 1;
        if passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Percentage of passed checks; 0.0 when nothing ran.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.passed) / f64::from(self.total) * 100.0
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Backend resource types the run can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Policies,
    Claims,
    RiskAssessments,
    Customers,
    Quotes,
    Payments,
    Agents,
    Beneficiaries,
    Documents,
    Renewals,
    Inspections,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 11] = [
        ResourceKind::Policies,
        ResourceKind::Claims,
        ResourceKind::RiskAssessments,
        ResourceKind::Customers,
        ResourceKind::Quotes,
        ResourceKind::Payments,
        ResourceKind::Agents,
        ResourceKind::Beneficiaries,
        ResourceKind::Documents,
        ResourceKind::Renewals,
        ResourceKind::Inspections,
    ];

    /// Collection path on the backend.
    pub fn collection(&self) -> &'static str {
        match self {
            ResourceKind::Policies => "/api/policies",
            ResourceKind::Claims => "/api/claims",
            ResourceKind::RiskAssessments => "/api/risk-assessment",
            ResourceKind::Customers => "/api/customers",
            ResourceKind::Quotes => "/api/quotes",
            ResourceKind::Payments => "/api/payments",
            ResourceKind::Agents => "/api/agents",
            ResourceKind::Beneficiaries => "/api/beneficiaries",
            ResourceKind::Documents => "/api/documents",
            ResourceKind::Renewals => "/api/renewals",
            ResourceKind::Inspections => "/api/inspections",
        }
    }

    /// Singular noun for log lines.
    pub fn noun(&self) -> &'static str {
        match self {
            ResourceKind::Policies => "policy",
            ResourceKind::Claims => "claim",
            ResourceKind::RiskAssessments => "risk assessment",
            ResourceKind::Customers => "customer",
            ResourceKind::Quotes => "quote",
            ResourceKind::Payments => "payment",
            ResourceKind::Agents => "agent",
            ResourceKind::Beneficiaries => "beneficiary",
            ResourceKind::Documents => "document",
            ResourceKind::Renewals => "renewal",
            ResourceKind::Inspections => "inspection",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

/// Identifiers returned by the backend, per kind, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreatedResources {
    ids: BTreeMap<ResourceKind, Vec<String>>,
}

impl CreatedResources {
    pub fn record(&mut self, kind: ResourceKind, id: impl Into<String>) {
        self.ids.entry(kind).or_default().push(id.into());
    }

    pub fn ids(&self, kind: ResourceKind) -> &[String] {
        self.ids.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn total(&self) -> usize {
        self.ids.values().map(Vec::len).sum()
    }
}

/// Everything one run accumulates.
///
/// The four pivots hold the most recent identifier of their kind; later,
/// otherwise unrelated checks read them as input. Each check step takes the
/// context by `&mut`, so the order dependencies between steps are explicit
/// in the call sequence.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub results: TestResults,
    pub created: CreatedResources,
    pub policy_id: Option<String>,
    pub customer_id: Option<String>,
    pub quote_id: Option<String>,
    pub claim_id: Option<String>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }
}
