//! The error envelope shape and status-code mapping are part of the
//! external contract (spec §6/§7); this locks them down without needing
//! a running server or database.

use actix_web::ResponseError;
use paygate_backend::errors::ApiError;

#[actix_web::test]
async fn bad_request_maps_to_400_with_the_right_code() {
    let err = ApiError::BadRequest("amount must be greater than zero".into());
    let resp = err.error_response();
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn unauthorized_maps_to_401() {
    let err = ApiError::Unauthorized("invalid API credentials".into());
    let resp = err.error_response();
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn not_found_maps_to_404() {
    let err = ApiError::NotFound("order not found".into());
    let resp = err.error_response();
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn internal_errors_never_leak_the_underlying_message() {
    let err = ApiError::Internal("duplicate key value violates unique constraint".into());
    let resp = err.error_response();
    assert_eq!(resp.status(), 500);

    let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let description = json["error"]["description"].as_str().unwrap();
    assert_eq!(description, "An internal error occurred");
    assert_eq!(json["error"]["code"], "INTERNAL_ERROR");
}
