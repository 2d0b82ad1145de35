pub mod auth;

pub use auth::AuthenticatedMerchant;
