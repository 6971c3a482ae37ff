//! Request extractors that reject with `AppError`.
//!
//! axum's own `Json`, `Path` and `Query` answer bad input with plain-text
//! bodies and a mix of 400/415/422 statuses. These wrappers run the same
//! extraction but turn every rejection into a 400 `invalid_request` with the
//! usual `{error:{code,message}}` body.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Typed path segments, e.g. `{id}` as a `Uuid`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathParam<T>(pub T);

/// Query string parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);
