use std::sync::Arc;

use crate::auth::session::Sessions;
use crate::auth::Policy;
use crate::config::AppConfig;
use crate::database::Db;
use crate::error::AppError;

/// Explicitly constructed application context threaded through every
/// handler. Holds the connection provider, session signing config, and the
/// authorization policy table; there are no ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Db,
    pub sessions: Sessions,
    pub policy: Arc<Policy>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let db = Db::connect_lazy(&config.database)?;
        let sessions = Sessions::new(config.session.clone());
        Ok(Self {
            config: Arc::new(config),
            db,
            sessions,
            policy: Arc::new(Policy::default()),
        })
    }
}
