//! The checklist steps, in the order [`run_steps`] drives them.
//!
//! Every step reads and updates the shared [`RunContext`]. A failed check is
//! only counted; the step carries on with whatever it can still do.

use super::backend::{BackendClient, Response};
use super::context::{ResourceKind, RunContext};
use super::report::Reporter;
use super::VerifyError;
use chrono::{Duration as Days, SecondsFormat, Utc};
use serde_json::{json, Value};
use std::io::Write;

/// Stand-in policy id when the policy step created nothing.
pub const PLACEHOLDER_POLICY_ID: &str = "TEST-POLICY-ID";

type StepResult = Result<(), VerifyError>;

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn days_from_now(days: i64) -> String {
    (Utc::now() + Days::days(days)).to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn status_detail(response: &Response) -> String {
    format!("Status: {}", response.status)
}

fn count_detail(response: &Response) -> String {
    match response.count() {
        Some(n) => format!("Status: {}, Count: {n}", response.status),
        None => format!("Status: {}, Count: n/a", response.status),
    }
}

fn record<W: Write>(
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
    name: &str,
    passed: bool,
    detail: Option<String>,
) -> StepResult {
    ctx.results.record(passed);
    out.check(name, passed, detail.as_deref())?;
    Ok(())
}

/// Create a resource and remember its id when the backend answers 201.
async fn create(
    client: &BackendClient,
    ctx: &mut RunContext,
    kind: ResourceKind,
    body: &Value,
) -> Result<(Response, Option<String>), VerifyError> {
    let response = client.post(kind.collection(), Some(body)).await?;
    let id = if response.is(201) { response.id() } else { None };
    if let Some(id) = &id {
        ctx.created.record(kind, id.clone());
    }
    Ok((response, id))
}

pub async fn check_auth_failure<W: Write>(
    client: &BackendClient,
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
) -> StepResult {
    out.section("Testing Authentication")?;
    let response = client.get_with_key("/api/policies", "invalid-key").await?;
    record(
        ctx,
        out,
        "Auth failure with invalid API key",
        response.is(401),
        Some(status_detail(&response)),
    )
}

pub async fn check_policies<W: Write>(
    client: &BackendClient,
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
) -> StepResult {
    out.section("Testing Policies Endpoints")?;

    let response = client.get("/api/policies").await?;
    record(
        ctx,
        out,
        "GET /api/policies - List all policies",
        response.is(200),
        Some(count_detail(&response)),
    )?;

    let policy = json!({
        "policyNumber": "POL-TEST-001",
        "policyType": "auto",
        "holderName": "John Doe",
        "holderEmail": "john.doe@example.com",
        "premium": 1200.50,
        "coverageAmount": 50000.00,
        "startDate": now(),
        "endDate": days_from_now(365),
        "status": "active",
    });
    let (response, policy_id) = create(client, ctx, ResourceKind::Policies, &policy).await?;
    if policy_id.is_some() {
        ctx.policy_id = policy_id.clone();
    }
    record(
        ctx,
        out,
        "POST /api/policies - Create new policy",
        policy_id.is_some(),
        Some(format!(
            "Status: {}, ID: {}",
            response.status,
            policy_id.as_deref().unwrap_or("None")
        )),
    )?;

    let Some(policy_id) = policy_id else {
        return Ok(());
    };

    let response = client.get(&format!("/api/policies/{policy_id}")).await?;
    record(
        ctx,
        out,
        "GET /api/policies/{id} - Get policy by ID",
        response.is(200) && response.id().as_deref() == Some(policy_id.as_str()),
        Some(status_detail(&response)),
    )?;

    let update = json!({ "premium": 1300.75, "status": "active" });
    let response = client.put(&format!("/api/policies/{policy_id}"), &update).await?;
    record(
        ctx,
        out,
        "PUT /api/policies/{id} - Update policy",
        response.is(200) && response.f64_field("premium") == Some(1300.75),
        Some(status_detail(&response)),
    )?;

    let response = client.get("/api/policies/INVALID-ID").await?;
    record(
        ctx,
        out,
        "GET /api/policies/{id} - 404 for non-existent policy",
        response.is(404),
        Some(status_detail(&response)),
    )
}

/// Policy id for steps that need one, falling back to the placeholder.
fn policy_or_placeholder(ctx: &RunContext, step: &str) -> String {
    match &ctx.policy_id {
        Some(id) => id.clone(),
        None => {
            tracing::warn!(
                step,
                placeholder = PLACEHOLDER_POLICY_ID,
                "no policy was created; using placeholder policy id"
            );
            PLACEHOLDER_POLICY_ID.to_string()
        }
    }
}

fn claim_body(number: &str, policy_id: &str) -> Value {
    json!({
        "claimNumber": number,
        "policyId": policy_id,
        "claimType": "accident",
        "description": "Minor fender bender in parking lot",
        "claimAmount": 2500.00,
        "status": "pending",
        "filedDate": now(),
        "notes": "Driver side door dent",
    })
}

pub async fn check_claims<W: Write>(
    client: &BackendClient,
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
) -> StepResult {
    out.section("Testing Claims Endpoints")?;
    let policy_id = policy_or_placeholder(ctx, "claims");

    let response = client.get("/api/claims").await?;
    record(
        ctx,
        out,
        "GET /api/claims - List all claims",
        response.is(200),
        Some(count_detail(&response)),
    )?;

    let (response, claim_id) =
        create(client, ctx, ResourceKind::Claims, &claim_body("CLM-TEST-001", &policy_id)).await?;
    if claim_id.is_some() {
        ctx.claim_id = claim_id.clone();
    }
    record(
        ctx,
        out,
        "POST /api/claims - Create new claim",
        claim_id.is_some(),
        Some(format!(
            "Status: {}, ID: {}",
            response.status,
            claim_id.as_deref().unwrap_or("None")
        )),
    )?;

    let Some(claim_id) = claim_id else {
        return Ok(());
    };

    let response = client.get(&format!("/api/claims/{claim_id}")).await?;
    record(
        ctx,
        out,
        "GET /api/claims/{id} - Get claim by ID",
        response.is(200) && response.id().as_deref() == Some(claim_id.as_str()),
        Some(status_detail(&response)),
    )?;

    let update = json!({ "status": "processing", "notes": "Claim under review" });
    let response = client.put(&format!("/api/claims/{claim_id}"), &update).await?;
    record(
        ctx,
        out,
        "PUT /api/claims/{id} - Update claim",
        response.is(200),
        Some(status_detail(&response)),
    )?;

    let response = client.post(&format!("/api/claims/{claim_id}/approve"), None).await?;
    record(
        ctx,
        out,
        "POST /api/claims/{id}/approve - Approve claim",
        response.is(200) && response.str_field("status") == Some("approved"),
        Some(status_detail(&response)),
    )?;

    let (_, second_id) =
        create(client, ctx, ResourceKind::Claims, &claim_body("CLM-TEST-002", &policy_id)).await?;
    if let Some(second_id) = second_id {
        let response = client.post(&format!("/api/claims/{second_id}/reject"), None).await?;
        record(
            ctx,
            out,
            "POST /api/claims/{id}/reject - Reject claim",
            response.is(200) && response.str_field("status") == Some("rejected"),
            Some(status_detail(&response)),
        )?;
    }
    Ok(())
}

pub async fn check_risk_assessment<W: Write>(
    client: &BackendClient,
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
) -> StepResult {
    out.section("Testing Risk Assessment Endpoints")?;
    let policy_id = policy_or_placeholder(ctx, "risk assessment");

    let assessment = json!({
        "policyId": policy_id,
        "riskScore": 65,
        "riskLevel": "medium",
        "factors": [
            "Age of driver: 25",
            "Clean driving record",
            "Urban area",
            "High coverage amount",
        ],
        "assessmentDate": now(),
        "assessedBy": "AI Risk Engine v2.1",
        "notes": "Standard risk profile for urban driver",
    });
    let (response, assessment_id) =
        create(client, ctx, ResourceKind::RiskAssessments, &assessment).await?;
    record(
        ctx,
        out,
        "POST /api/risk-assessment - Create risk assessment",
        assessment_id.is_some(),
        Some(format!(
            "Status: {}, ID: {}",
            response.status,
            assessment_id.as_deref().unwrap_or("None")
        )),
    )?;

    let response = client.get(&format!("/api/risk-assessment/{policy_id}")).await?;
    record(
        ctx,
        out,
        "GET /api/risk-assessment/{policyId} - Get risk assessment by policy",
        response.is(200) && response.str_field("policyId") == Some(policy_id.as_str()),
        Some(status_detail(&response)),
    )?;

    let response = client.get("/api/risk-assessment/INVALID-POLICY-ID").await?;
    record(
        ctx,
        out,
        "GET /api/risk-assessment/{policyId} - 404 for non-existent policy",
        response.is(404),
        Some(status_detail(&response)),
    )
}

pub async fn check_validation_errors<W: Write>(
    client: &BackendClient,
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
) -> StepResult {
    out.section("Testing Validation & Error Handling")?;

    let invalid_policy = json!({ "policyNumber": "INVALID", "policyType": "invalid_type" });
    let response = client.post("/api/policies", Some(&invalid_policy)).await?;
    if response.is(201) {
        if let Some(id) = response.id() {
            ctx.created.record(ResourceKind::Policies, id);
        }
    }
    record(
        ctx,
        out,
        "POST /api/policies - Validation error for invalid data",
        response.is(400),
        Some(status_detail(&response)),
    )?;

    let invalid_claim = json!({
        "claimNumber": "CLM-INVALID",
        "policyId": "TEST-ID",
        "claimType": "accident",
        "description": "Test",
        "claimAmount": -100,
        "status": "pending",
        "filedDate": now(),
    });
    let response = client.post("/api/claims", Some(&invalid_claim)).await?;
    if response.is(201) {
        if let Some(id) = response.id() {
            ctx.created.record(ResourceKind::Claims, id);
        }
    }
    record(
        ctx,
        out,
        "POST /api/claims - Validation error for negative amount",
        response.is(400),
        Some(status_detail(&response)),
    )
}

pub async fn check_customers<W: Write>(
    client: &BackendClient,
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
) -> StepResult {
    out.section("Testing Customer Endpoints")?;

    let customer = json!({
        "firstName": "John",
        "lastName": "Doe",
        "email": "john.doe@example.com",
        "phone": "+1-555-0100",
        "dateOfBirth": "1985-05-15",
        "address": {
            "street": "123 Main St",
            "city": "Springfield",
            "state": "IL",
            "zipCode": "62701",
            "country": "USA",
        },
    });
    let (response, customer_id) = create(client, ctx, ResourceKind::Customers, &customer).await?;
    if customer_id.is_some() {
        ctx.customer_id = customer_id;
    }
    record(
        ctx,
        out,
        "POST /api/customers - Create customer",
        response.is(201),
        Some(status_detail(&response)),
    )?;

    let response = client.get("/api/customers").await?;
    let count = response
        .count()
        .map_or_else(|| "Count: n/a".to_string(), |n| format!("Count: {n}"));
    record(ctx, out, "GET /api/customers - List customers", response.is(200), Some(count))?;

    if let Some(customer_id) = ctx.customer_id.clone() {
        let response = client.get(&format!("/api/customers/{customer_id}")).await?;
        record(
            ctx,
            out,
            "GET /api/customers/{id} - Get customer",
            response.is(200),
            None,
        )?;
    }
    Ok(())
}

pub async fn check_quotes<W: Write>(
    client: &BackendClient,
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
) -> StepResult {
    out.section("Testing Quote Endpoints")?;

    let quote = json!({
        "policyType": "auto",
        "coverageAmount": 50000,
        "customerEmail": "john.doe@example.com",
        "customerName": "John Doe",
    });
    let (response, quote_id) = create(client, ctx, ResourceKind::Quotes, &quote).await?;
    if quote_id.is_some() {
        ctx.quote_id = quote_id;
    }
    record(ctx, out, "POST /api/quotes - Create quote", response.is(201), None)?;

    let response = client.get("/api/quotes").await?;
    record(ctx, out, "GET /api/quotes - List quotes", response.is(200), None)?;

    let Some(quote_id) = ctx.quote_id.clone() else {
        return Ok(());
    };

    let response = client
        .put(&format!("/api/quotes/{quote_id}"), &json!({ "status": "approved" }))
        .await?;
    record(
        ctx,
        out,
        "PUT /api/quotes/{id} - Update quote to approved",
        response.is(200),
        None,
    )?;

    let response = client.post(&format!("/api/quotes/{quote_id}/convert"), None).await?;
    if response.is(200) {
        if let Some(policy_id) = response.id() {
            ctx.created.record(ResourceKind::Policies, policy_id.clone());
            ctx.policy_id = Some(policy_id);
        }
    }
    record(
        ctx,
        out,
        "POST /api/quotes/{id}/convert - Convert to policy",
        response.is(200),
        None,
    )
}

pub async fn check_payments<W: Write>(
    client: &BackendClient,
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
) -> StepResult {
    out.section("Testing Payment Endpoints")?;
    let Some(policy_id) = ctx.policy_id.clone() else {
        out.skip("Skipping payments - no policy ID")?;
        return Ok(());
    };

    let payment = json!({
        "policyId": policy_id,
        "amount": 1200.50,
        "paymentMethod": "credit_card",
    });
    let (response, _) = create(client, ctx, ResourceKind::Payments, &payment).await?;
    record(ctx, out, "POST /api/payments - Create payment", response.is(201), None)?;

    let response = client.get(&format!("/api/payments/policy/{policy_id}")).await?;
    record(
        ctx,
        out,
        "GET /api/payments/policy/{policyId} - Get payments for policy",
        response.is(200),
        None,
    )
}

pub async fn check_agents<W: Write>(
    client: &BackendClient,
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
) -> StepResult {
    out.section("Testing Agent Endpoints")?;

    let agent = json!({
        "firstName": "Jane",
        "lastName": "Smith",
        "email": "jane.smith@insurance.com",
        "phone": "+1-555-0200",
        "licenseNumber": "AG-12345",
        "commissionRate": 5.5,
        "territory": "Northeast",
    });
    let (response, _) = create(client, ctx, ResourceKind::Agents, &agent).await?;
    record(ctx, out, "POST /api/agents - Create agent", response.is(201), None)?;

    let response = client.get("/api/agents").await?;
    record(ctx, out, "GET /api/agents - List agents", response.is(200), None)
}

pub async fn check_beneficiaries<W: Write>(
    client: &BackendClient,
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
) -> StepResult {
    out.section("Testing Beneficiary Endpoints")?;
    let Some(policy_id) = ctx.policy_id.clone() else {
        out.skip("Skipping beneficiaries - no policy ID")?;
        return Ok(());
    };

    let beneficiary = json!({
        "policyId": policy_id,
        "firstName": "Mary",
        "lastName": "Doe",
        "relationship": "spouse",
        "percentage": 100,
    });
    let (response, _) = create(client, ctx, ResourceKind::Beneficiaries, &beneficiary).await?;
    record(
        ctx,
        out,
        "POST /api/beneficiaries - Create beneficiary",
        response.is(201),
        None,
    )?;

    let response = client.get("/api/beneficiaries").await?;
    record(
        ctx,
        out,
        "GET /api/beneficiaries - List beneficiaries",
        response.is(200),
        None,
    )
}

pub async fn check_documents<W: Write>(
    client: &BackendClient,
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
) -> StepResult {
    out.section("Testing Document Endpoints")?;
    let Some(policy_id) = ctx.policy_id.clone() else {
        out.skip("Skipping documents - no policy ID")?;
        return Ok(());
    };

    let document = json!({
        "entityType": "policy",
        "entityId": policy_id,
        "documentType": "policy_document",
        "fileName": "policy_agreement.pdf",
        "fileUrl": "https://example.com/documents/policy_agreement.pdf",
    });
    let (response, _) = create(client, ctx, ResourceKind::Documents, &document).await?;
    record(ctx, out, "POST /api/documents - Upload document", response.is(201), None)?;

    let response = client.get("/api/documents").await?;
    record(ctx, out, "GET /api/documents - List documents", response.is(200), None)
}

pub async fn check_renewals<W: Write>(
    client: &BackendClient,
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
) -> StepResult {
    out.section("Testing Renewal Endpoints")?;
    let Some(policy_id) = ctx.policy_id.clone() else {
        out.skip("Skipping renewals - no policy ID")?;
        return Ok(());
    };

    let renewal = json!({
        "policyId": policy_id,
        "renewalDate": days_from_now(365),
        "newPremium": 1300.00,
        "newCoverageAmount": 55000,
    });
    let (response, renewal_id) = create(client, ctx, ResourceKind::Renewals, &renewal).await?;
    record(ctx, out, "POST /api/renewals - Create renewal", response.is(201), None)?;

    if let Some(renewal_id) = renewal_id {
        let response = client
            .post(&format!("/api/renewals/{renewal_id}/approve"), None)
            .await?;
        record(
            ctx,
            out,
            "POST /api/renewals/{id}/approve - Approve renewal",
            response.is(200),
            None,
        )?;
    }
    Ok(())
}

pub async fn check_fraud_detection<W: Write>(
    client: &BackendClient,
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
) -> StepResult {
    out.section("Testing Fraud Detection Endpoints")?;

    if ctx.claim_id.is_none() {
        if let Some(policy_id) = ctx.policy_id.clone() {
            let claim = json!({
                "claimNumber": "CLM-FRAUD-TEST",
                "policyId": policy_id,
                "claimType": "theft",
                "description": "Vehicle stolen from parking lot",
                "claimAmount": 25000,
                "status": "pending",
                "filedDate": now(),
            });
            let (_, claim_id) = create(client, ctx, ResourceKind::Claims, &claim).await?;
            ctx.claim_id = claim_id;
        }
    }
    let Some(claim_id) = ctx.claim_id.clone() else {
        out.skip("Skipping fraud detection - no claim ID")?;
        return Ok(());
    };

    let response = client
        .post("/api/fraud-detection/analyze", Some(&json!({ "claimId": claim_id })))
        .await?;
    record(
        ctx,
        out,
        "POST /api/fraud-detection/analyze - Analyze claim",
        response.is(200),
        None,
    )?;

    let response = client.get("/api/fraud-detection/reports").await?;
    record(
        ctx,
        out,
        "GET /api/fraud-detection/reports - List fraud reports",
        response.is(200),
        None,
    )
}

pub async fn check_analytics<W: Write>(
    client: &BackendClient,
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
) -> StepResult {
    out.section("Testing Analytics Endpoints")?;

    for (path, what) in [
        ("/api/analytics/claims-summary", "Get claims summary"),
        ("/api/analytics/policies-summary", "Get policies summary"),
        ("/api/analytics/loss-ratio", "Get loss ratio"),
    ] {
        let response = client.get(path).await?;
        record(ctx, out, &format!("GET {path} - {what}"), response.is(200), None)?;
    }
    Ok(())
}

pub async fn check_audit_trail<W: Write>(
    client: &BackendClient,
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
) -> StepResult {
    out.section("Testing Audit Trail Endpoints")?;
    let response = client.get("/api/audit-trail").await?;
    record(ctx, out, "GET /api/audit-trail - List audit logs", response.is(200), None)
}

pub async fn check_notifications<W: Write>(
    client: &BackendClient,
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
) -> StepResult {
    out.section("Testing Notification Endpoints")?;

    let notification = json!({
        "recipientEmail": "customer@example.com",
        "type": "email",
        "subject": "Policy Renewal Reminder",
        "message": "Your policy is up for renewal next month.",
    });
    let response = client.post("/api/notifications", Some(&notification)).await?;
    record(
        ctx,
        out,
        "POST /api/notifications - Send notification",
        response.is(201),
        None,
    )
}

pub async fn check_telematics<W: Write>(
    client: &BackendClient,
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
) -> StepResult {
    out.section("Testing Telematics Endpoints")?;
    let Some(policy_id) = ctx.policy_id.clone() else {
        out.skip("Skipping telematics - no policy ID")?;
        return Ok(());
    };

    let record_body = json!({
        "policyId": policy_id,
        "recordDate": now(),
        "mileage": 15230.5,
        "speed": 65.0,
        "hardBraking": 2,
        "hardAcceleration": 1,
        "nightDriving": 0.15,
    });
    let response = client.post("/api/telematics", Some(&record_body)).await?;
    record(
        ctx,
        out,
        "POST /api/telematics - Upload telematics data",
        response.is(201),
        None,
    )?;

    let response = client.get(&format!("/api/telematics/policy/{policy_id}")).await?;
    record(
        ctx,
        out,
        "GET /api/telematics/policy/{policyId} - Get telematics for policy",
        response.is(200),
        None,
    )
}

pub async fn check_inspections<W: Write>(
    client: &BackendClient,
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
) -> StepResult {
    out.section("Testing Inspection Endpoints")?;
    let Some(policy_id) = ctx.policy_id.clone() else {
        out.skip("Skipping inspections - no policy ID")?;
        return Ok(());
    };

    let inspection = json!({
        "policyId": policy_id,
        "inspectionType": "vehicle",
        "scheduledDate": days_from_now(7),
        "inspector": "Inspector Smith",
    });
    let (response, inspection_id) =
        create(client, ctx, ResourceKind::Inspections, &inspection).await?;
    record(
        ctx,
        out,
        "POST /api/inspections - Schedule inspection",
        response.is(201),
        None,
    )?;

    if let Some(inspection_id) = inspection_id {
        let findings = json!({ "findings": "Vehicle in good condition", "approved": true });
        let response = client
            .post(&format!("/api/inspections/{inspection_id}/complete"), Some(&findings))
            .await?;
        record(
            ctx,
            out,
            "POST /api/inspections/{id}/complete - Complete inspection",
            response.is(200),
            None,
        )?;
    }
    Ok(())
}

pub async fn check_subrogation<W: Write>(
    client: &BackendClient,
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
) -> StepResult {
    out.section("Testing Subrogation Endpoints")?;
    let Some(claim_id) = ctx.claim_id.clone() else {
        out.skip("Skipping subrogation - no claim ID")?;
        return Ok(());
    };

    let case = json!({
        "claimId": claim_id,
        "thirdParty": "Acme Insurance Co.",
        "amountSought": 15000,
        "notes": "Other driver at fault, seeking recovery",
    });
    let response = client.post("/api/subrogation", Some(&case)).await?;
    record(
        ctx,
        out,
        "POST /api/subrogation - Create subrogation case",
        response.is(201),
        None,
    )
}

/// Delete every recorded policy, then every recorded claim.
///
/// Nothing here is counted. A failed delete only prints a warning, so a
/// resource that is already gone does not fail the run. A backend that went
/// away mid-cleanup is reported the same way.
pub async fn cleanup<W: Write>(
    client: &BackendClient,
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
) -> StepResult {
    out.section("Cleaning Up Test Resources")?;

    for kind in [ResourceKind::Policies, ResourceKind::Claims] {
        for id in ctx.created.ids(kind) {
            let path = format!("{}/{id}", kind.collection());
            match client.delete(&path).await {
                Ok(response) if response.is(200) || response.is(204) => {
                    out.info(&format!("Deleted {kind} {id}"))?;
                }
                Ok(response) => {
                    tracing::warn!(%path, status = response.status, "cleanup delete rejected");
                    out.warn(&format!("DELETE {path} returned {}", response.status))?;
                }
                Err(err) => {
                    tracing::warn!(%path, error = %err, "cleanup delete failed");
                    out.warn(&format!("DELETE {path} failed: {err}"))?;
                }
            }
        }
    }
    Ok(())
}

/// Steps 1 through 7, stopping at the first error.
pub async fn run_steps<W: Write>(
    client: &BackendClient,
    ctx: &mut RunContext,
    out: &mut Reporter<W>,
) -> StepResult {
    check_auth_failure(client, ctx, out).await?;
    check_policies(client, ctx, out).await?;
    check_claims(client, ctx, out).await?;
    check_risk_assessment(client, ctx, out).await?;
    check_validation_errors(client, ctx, out).await?;
    check_customers(client, ctx, out).await?;
    check_quotes(client, ctx, out).await?;
    check_payments(client, ctx, out).await?;
    check_agents(client, ctx, out).await?;
    check_beneficiaries(client, ctx, out).await?;
    check_documents(client, ctx, out).await?;
    check_renewals(client, ctx, out).await?;
    check_fraud_detection(client, ctx, out).await?;
    check_analytics(client, ctx, out).await?;
    check_audit_trail(client, ctx, out).await?;
    check_notifications(client, ctx, out).await?;
    check_telematics(client, ctx, out).await?;
    check_inspections(client, ctx, out).await?;
    check_subrogation(client, ctx, out).await?;
    cleanup(client, ctx, out).await
}
