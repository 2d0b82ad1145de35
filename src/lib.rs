pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod ids;
pub mod middleware;
pub mod models;
pub mod queue;
pub mod services;
pub mod signer;
pub mod workers;

use std::sync::Arc;

use crate::config::Config;
use crate::db::Database;
use crate::queue::Queue;

/// Shared state handed to every API route. Workers build their own
/// equivalent in `workers::WorkerContext` since they don't serve HTTP.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub queue: Arc<Queue>,
    pub config: Arc<Config>,
}
