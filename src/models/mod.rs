pub mod idempotency;
pub mod merchant;
pub mod order;
pub mod payment;
pub mod refund;
pub mod webhook;

pub use idempotency::*;
pub use merchant::*;
pub use order::*;
pub use payment::*;
pub use refund::*;
pub use webhook::*;
