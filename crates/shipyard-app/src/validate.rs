use axum::extract::{FromRequest, FromRequestParts, Request};
use garde::Validate;
use http::request::Parts;
use std::fmt::{Display, Formatter};
use std::ops::{Deref, DerefMut};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Extractor wrapper, which validates extracted value with `garde`.
///
/// Both failure to extract inner value (malformed JSON, unparsable query
/// parameter) and failed validation are rejected as [`ApiError::InvalidInput`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Valid<E>(pub E);

impl<E> Deref for Valid<E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<E> DerefMut for Valid<E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<E: Display> Display for Valid<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<E> Valid<E> {
    /// Consumes the `Valid` and returns the validated data within.
    pub fn into_inner(self) -> E {
        self.0
    }
}

pub(crate) fn rejected(rejection: impl Display) -> ApiError {
    debug!("Rejected request input: {rejection}");
    ApiError::InvalidInput(rejection.to_string())
}

fn validated<E, T>(inner: E) -> Result<Valid<E>, ApiError>
where
    T: Validate<Context = ()>,
    E: Deref<Target = T>,
{
    inner.deref().validate().map_err(rejected)?;
    Ok(Valid(inner))
}

impl<Extractor, T> FromRequest<AppState> for Valid<Extractor>
where
    T: Validate<Context = ()>,
    Extractor: Deref<Target = T> + FromRequest<AppState>,
    <Extractor as FromRequest<AppState>>::Rejection: Display,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let inner = Extractor::from_request(req, state)
            .await
            .map_err(rejected)?;
        validated(inner)
    }
}

impl<Extractor, T> FromRequestParts<AppState> for Valid<Extractor>
where
    T: Validate<Context = ()>,
    Extractor: Deref<Target = T> + FromRequestParts<AppState>,
    <Extractor as FromRequestParts<AppState>>::Rejection: Display,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let inner = Extractor::from_request_parts(parts, state)
            .await
            .map_err(rejected)?;
        validated(inner)
    }
}
