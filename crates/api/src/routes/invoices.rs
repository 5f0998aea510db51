//! Invoice routes.
//!
//! `POST /invoices/calculate` is a stateless preview open to anyone; the
//! remaining routes read and write the caller's own invoices.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use validator::{Validate, ValidationError};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
};
use khata_core::invoice::{
    CustomerInfo, DraftAction, InvoiceDraft, InvoiceRecord, InvoiceTotals, RawLineItem,
    RawTaxRates, TaxMode, calculate, compute_line_total, parse_line_items,
};
use khata_shared::AppError;
use khata_shared::types::money::round_for_display;
use khata_shared::types::{Currency, InvoiceId, Money, PageRequest, PageResponse};

/// Routes that need no authentication.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/invoices/calculate", post(calculate_totals))
}

/// Creates the invoice routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", post(create_invoice).get(list_invoices))
        .route("/invoices/{id}", get(get_invoice).delete(delete_invoice))
}

/// Request body for previewing totals.
#[derive(Debug, Deserialize, Validate)]
pub struct CalculateRequest {
    /// Lines as entered.
    #[serde(default)]
    #[validate(length(max = 500))]
    pub items: Vec<RawLineItem>,
    /// Rates as entered.
    #[serde(default)]
    pub tax_rates: RawTaxRates,
}

/// Rounded totals for display.
///
/// Every figure is rounded to two places on its own from the exact value,
/// so the displayed parts need not add up to the displayed grand total
/// (e.g. 249.98 + 45.00 shown beside 294.97). The grand total is the
/// rounded exact sum; clients must not re-add the rounded parts.
#[derive(Debug, Serialize)]
pub struct CalculateResponse {
    /// Per-line totals, in input order.
    pub line_totals: Vec<Decimal>,
    /// Invoice totals.
    pub totals: InvoiceTotals,
    /// Which GST regime the rates describe.
    pub tax_mode: TaxMode,
}

/// Customer block of a create request.
#[derive(Debug, Deserialize, Validate)]
pub struct CustomerRequest {
    /// Customer or business name.
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// GST identification number. Blank means none.
    #[validate(custom(function = "validate_gstin"))]
    pub gstin: Option<String>,
    /// Billing address.
    #[validate(length(max = 500))]
    pub address: Option<String>,
    /// Contact email.
    #[validate(email)]
    pub email: Option<String>,
}

/// Accepts a blank value or 15 letters and digits, ignoring surrounding whitespace.
fn validate_gstin(gstin: &str) -> Result<(), ValidationError> {
    let gstin = gstin.trim();
    if gstin.is_empty() || (gstin.len() == 15 && gstin.chars().all(|c| c.is_ascii_alphanumeric())) {
        Ok(())
    } else {
        let mut err = ValidationError::new("gstin");
        err.message = Some("GSTIN must be 15 letters and digits".into());
        Err(err)
    }
}

impl From<CustomerRequest> for CustomerInfo {
    fn from(req: CustomerRequest) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        }

        Self {
            name: req.name.trim().to_string(),
            gstin: clean(req.gstin).map(|g| g.to_uppercase()),
            address: clean(req.address),
            email: clean(req.email),
        }
    }
}

/// Request body for saving an invoice.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    /// Human-facing invoice number.
    #[validate(length(min = 1, max = 64))]
    pub invoice_number: String,
    /// Billed customer.
    #[validate(nested)]
    pub customer: CustomerRequest,
    /// Issue date (YYYY-MM-DD). Defaults to today.
    pub issue_date: Option<NaiveDate>,
    /// Invoice currency. Defaults to INR.
    #[serde(default)]
    pub currency: Currency,
    /// Lines as entered.
    #[validate(length(max = 500))]
    pub items: Vec<RawLineItem>,
    /// Rates as entered.
    #[serde(default)]
    pub tax_rates: RawTaxRates,
    /// Free-form notes.
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// A saved invoice plus its figures formatted for display.
#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    /// The record as stored, at full precision.
    #[serde(flatten)]
    pub record: InvoiceRecord,
    /// Totals rounded to two places.
    pub display_totals: InvoiceTotals,
    /// Grand total with currency, e.g. `INR 295.00`.
    pub grand_total_display: String,
    /// Which GST regime the rates describe.
    pub tax_mode: TaxMode,
}

impl From<InvoiceRecord> for InvoiceResponse {
    fn from(record: InvoiceRecord) -> Self {
        let grand_total = Money::new(record.totals.grand_total(), record.currency);
        Self {
            display_totals: record.totals.rounded(),
            grand_total_display: grand_total.display(),
            tax_mode: record.tax_rates.mode(),
            record,
        }
    }
}

/// POST `/invoices/calculate` - Preview totals for unsaved input.
async fn calculate_totals(
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> ApiResult<Json<CalculateResponse>> {
    let Json(payload) = payload?;
    payload.validate()?;

    let items = parse_line_items(&payload.items)?;
    let rates = payload.tax_rates.parse()?;
    let totals = calculate(&items, &rates)?;

    let line_totals = items
        .iter()
        .map(|item| compute_line_total(item.quantity, item.unit_price).map(round_for_display))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(lines = items.len(), "Calculated invoice preview");

    Ok(Json(CalculateResponse {
        line_totals,
        totals: totals.rounded(),
        tax_mode: rates.mode(),
    }))
}

/// POST `/invoices` - Finalize and save an invoice.
async fn create_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<CreateInvoiceRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    payload.validate()?;

    let items = parse_line_items(&payload.items)?;
    let rates = payload.tax_rates.parse()?;
    if rates.mode() == TaxMode::Mixed {
        warn!(
            owner = %auth.owner_key(),
            invoice_number = %payload.invoice_number,
            "Invoice charges IGST together with CGST/SGST"
        );
    }

    let issue_date = payload.issue_date.unwrap_or_else(|| Utc::now().date_naive());
    let actions = [
        DraftAction::SetInvoiceNumber(payload.invoice_number),
        DraftAction::SetCustomer(payload.customer.into()),
        DraftAction::SetCurrency(payload.currency),
        DraftAction::SetNotes(payload.notes),
        DraftAction::SetTaxRates(rates),
    ]
    .into_iter()
    .chain(items.into_iter().map(DraftAction::AddItem));

    let record = InvoiceDraft::new(issue_date)
        .apply_all(actions)?
        .finalize(InvoiceId::new(), Utc::now())?;

    state.invoices().create(auth.owner_key(), &record).await?;

    info!(
        owner = %auth.owner_key(),
        invoice_id = %record.id,
        invoice_number = %record.invoice_number,
        grand_total = %record.totals.grand_total(),
        "Invoice created"
    );

    Ok((StatusCode::CREATED, Json(InvoiceResponse::from(record))))
}

/// GET `/invoices` - List the caller's invoices in creation order.
async fn list_invoices(
    State(state): State<AppState>,
    auth: AuthUser,
    query: Result<Query<PageRequest>, QueryRejection>,
) -> ApiResult<Json<PageResponse<InvoiceResponse>>> {
    let Query(page) = query?;
    let records = state.invoices().list(auth.owner_key(), page.normalized()).await?;
    Ok(Json(records.map(InvoiceResponse::from)))
}

/// GET `/invoices/{id}` - Fetch one invoice.
async fn get_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<InvoiceResponse>> {
    let id = parse_invoice_id(&id)?;
    let record = state
        .invoices()
        .get(auth.owner_key(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("invoice {id}")))?;
    Ok(Json(record.into()))
}

/// DELETE `/invoices/{id}` - Delete one invoice.
async fn delete_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_invoice_id(&id)?;
    if state.invoices().delete(auth.owner_key(), id).await? {
        info!(owner = %auth.owner_key(), invoice_id = %id, "Invoice deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("invoice {id}")).into())
    }
}

fn parse_invoice_id(raw: &str) -> Result<InvoiceId, ApiError> {
    raw.parse().map_err(|_| {
        ApiError(AppError::Validation {
            code: "INVALID_ID",
            message: format!("'{raw}' is not an invoice id"),
            field: Some("id".to_string()),
        })
    })
}
