//! Content negotiation and error responses

use super::html;
use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use std::convert::Infallible;

pub const NO_RATES_MESSAGE: &str = "No exchange rates are available";
pub const CURRENCY_NOT_FOUND_MESSAGE: &str = "Currency not found";
pub const INVALID_AMOUNT_MESSAGE: &str = "Please enter a valid amount.";
pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong, please try again later.";

/// Response representation requested by the client.
///
/// HTML when the `Accept` header mentions `text/html`, JSON otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Html,
}

impl Format {
    pub fn from_accept(accept: Option<&str>) -> Self {
        match accept {
            Some(value) if value.contains("text/html") => Format::Html,
            _ => Format::Json,
        }
    }
}

impl<S> FromRequestParts<S> for Format
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let accept = parts
            .headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok());
        Ok(Format::from_accept(accept))
    }
}

/// Renders `value` as JSON or through `to_html`.
pub fn render<T: Serialize>(format: Format, value: &T, to_html: impl FnOnce(&T) -> String) -> Response {
    match format {
        Format::Json => (StatusCode::OK, Json(value)).into_response(),
        Format::Html => (StatusCode::OK, Html(to_html(value))).into_response(),
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Failures surfaced to HTTP clients.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    NoRates,
    CurrencyNotFound,
    /// Carries the currency codes needed to re-render the convert form.
    InvalidAmount { currencies: Vec<String> },
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoRates | ApiError::CurrencyNotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidAmount { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ApiError::NoRates => NO_RATES_MESSAGE,
            ApiError::CurrencyNotFound => CURRENCY_NOT_FOUND_MESSAGE,
            ApiError::InvalidAmount { .. } => INVALID_AMOUNT_MESSAGE,
            ApiError::Internal => INTERNAL_ERROR_MESSAGE,
        }
    }

    pub fn respond(self, format: Format) -> Response {
        let status = self.status();
        let message = self.message();
        match (format, self) {
            (Format::Json, _) => (status, Json(ErrorBody { error: message })).into_response(),
            (Format::Html, ApiError::InvalidAmount { currencies }) => {
                let page = html::convert_page(&html::ConvertView {
                    currencies: &currencies,
                    alert: Some(message),
                    ..Default::default()
                });
                (status, Html(page)).into_response()
            }
            (Format::Html, _) => (status, message).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_accept() {
        assert_eq!(Format::from_accept(None), Format::Json);
        assert_eq!(Format::from_accept(Some("*/*")), Format::Json);
        assert_eq!(Format::from_accept(Some("application/json")), Format::Json);
        assert_eq!(
            Format::from_accept(Some("text/html,application/xhtml+xml,*/*;q=0.8")),
            Format::Html
        );
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(ApiError::NoRates.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::CurrencyNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::InvalidAmount { currencies: vec![] }.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ApiError::Internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
