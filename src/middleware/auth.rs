use std::future::Future;
use std::pin::Pin;

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};

use crate::errors::ApiError;
use crate::models::Merchant;
use crate::AppState;

/// Authenticates every `/api/v1/...` route except the unauthenticated
/// ones (`/api/v1/test/jobs/status`, `/health`) by requiring `X-Api-Key`
/// and `X-Api-Secret` to jointly match a merchant row. Handlers take
/// `AuthenticatedMerchant` as a plain extractor argument, resolving state
/// from `app_data`; the lookup here is a DB round trip, so the extractor
/// returns a boxed future instead of a ready one.
pub struct AuthenticatedMerchant(pub Merchant);

impl FromRequest for AuthenticatedMerchant {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let api_key = header(req, "X-Api-Key");
        let api_secret = header(req, "X-Api-Secret");
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let state =
                state.ok_or_else(|| ApiError::Internal("application state missing".into()))?;

            let (api_key, api_secret) = match (api_key, api_secret) {
                (Some(k), Some(s)) => (k, s),
                _ => {
                    return Err(ApiError::Unauthorized(
                        "missing X-Api-Key/X-Api-Secret".into(),
                    ))
                }
            };

            let merchant = sqlx::query_as::<_, Merchant>(
                "SELECT * FROM merchants WHERE api_key = $1 AND api_secret = $2",
            )
            .bind(&api_key)
            .bind(&api_secret)
            .fetch_optional(&state.db.pool)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("invalid API credentials".into()))?;

            Ok(AuthenticatedMerchant(merchant))
        })
    }
}

fn header(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
}
