use std::sync::Arc;

use axum::extract::FromRef;

use crate::{db::DB, metrics::Metrics};

#[derive(FromRef, Clone)]
pub struct AppState {
    pub conn: DB,
    pub metrics: Arc<Metrics>,
}
