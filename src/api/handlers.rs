use super::html::{self, ConvertView};
use super::response::{ApiError, Format, render};
use super::server::AppState;
use crate::core::error::ConversionError;
use crate::core::rates::parse_number;
use axum::Form;
use axum::Json;
use axum::extract::rejection::FormRejection;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

#[derive(Debug, Default, Deserialize)]
pub struct ConvertParams {
    pub amount: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub converted_amount: f64,
}

#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>, format: Format) -> Response {
    match state.service.list_all().await {
        Ok(rates) if rates.is_empty() => ApiError::NoRates.respond(format),
        Ok(rates) => render(format, &rates, |r| html::rates_page(r)),
        Err(e) => {
            error!(error = ?e, "Exchange rates fetch failed");
            ApiError::Internal.respond(format)
        }
    }
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(code): Path<String>,
    format: Format,
) -> Response {
    match state.service.find_by_code(&code).await {
        Ok(Some(rate)) => render(format, &rate, html::rate_page),
        Ok(None) => {
            debug!(code = %code, "Currency not found");
            ApiError::CurrencyNotFound.respond(format)
        }
        Err(e) => {
            error!(error = ?e, code = %code, "Failed to fetch exchange rate");
            ApiError::Internal.respond(format)
        }
    }
}

impl ConvertParams {
    /// Fields present in `self` win over those in `fallback`.
    fn or(self, fallback: ConvertParams) -> ConvertParams {
        ConvertParams {
            amount: self.amount.or(fallback.amount),
            currency: self.currency.or(fallback.currency),
        }
    }
}

#[instrument(skip(state))]
pub async fn convert(
    State(state): State<AppState>,
    Query(params): Query<ConvertParams>,
    format: Format,
) -> Response {
    convert_with(&state, params, format).await
}

/// Form submissions carry the fields in an urlencoded body; query
/// parameters fill in whatever the body leaves out.
#[instrument(skip(state, form))]
pub async fn convert_form(
    State(state): State<AppState>,
    Query(query): Query<ConvertParams>,
    format: Format,
    form: Result<Form<ConvertParams>, FormRejection>,
) -> Response {
    let params = match form {
        Ok(Form(body)) => body.or(query),
        Err(rejection) => {
            debug!(reason = %rejection, "No form body, using query parameters");
            query
        }
    };
    convert_with(&state, params, format).await
}

async fn convert_with(state: &AppState, params: ConvertParams, format: Format) -> Response {
    // A browser opening the page without a selection gets the empty form
    if format == Format::Html && params.currency.is_none() {
        return match currency_codes(state).await {
            Ok(currencies) => Html(html::convert_page(&ConvertView {
                currencies: &currencies,
                ..Default::default()
            }))
            .into_response(),
            Err(e) => {
                error!(error = ?e, "Failed to load currencies for converter");
                ApiError::Internal.respond(format)
            }
        };
    }

    let code = params.currency.unwrap_or_default().trim().to_uppercase();
    let amount = params
        .amount
        .as_deref()
        .and_then(parse_number)
        .unwrap_or(0.0);

    match state.service.convert(&code, amount).await {
        Ok(converted_amount) => match format {
            Format::Json => Json(ConvertResponse { converted_amount }).into_response(),
            Format::Html => match currency_codes(state).await {
                Ok(currencies) => Html(html::convert_page(&ConvertView {
                    currencies: &currencies,
                    selected: Some(code.as_str()),
                    amount: Some(amount),
                    converted: Some(converted_amount),
                    alert: None,
                }))
                .into_response(),
                Err(e) => {
                    error!(error = ?e, "Failed to load currencies for converter");
                    ApiError::Internal.respond(format)
                }
            },
        },
        Err(ConversionError::CurrencyNotFound(_)) => ApiError::CurrencyNotFound.respond(format),
        Err(ConversionError::InvalidAmount(_)) => {
            let currencies = currency_codes(state).await.unwrap_or_else(|e| {
                error!(error = ?e, "Failed to load currencies for converter");
                Vec::new()
            });
            ApiError::InvalidAmount { currencies }.respond(format)
        }
        Err(ConversionError::Internal(e)) => {
            error!(error = ?e, "Currency conversion failed");
            ApiError::Internal.respond(format)
        }
    }
}

async fn currency_codes(state: &AppState) -> anyhow::Result<Vec<String>> {
    Ok(state
        .service
        .list_all()
        .await?
        .into_iter()
        .map(|r| r.code)
        .collect())
}
