//! Typed operations over the API client, one service per endpoint family

pub mod auth;
pub mod catalog;
pub mod loans;
pub mod profile;
pub mod stats;

use std::sync::Arc;

use crate::{
    api::{ApiClient, HttpTransport, ReqwestTransport},
    config::AppConfig,
    error::ClientResult,
    navigation::Navigator,
    session::SessionStore,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub client: ApiClient,
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub profile: profile::ProfileService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services sharing one client
    pub fn new(client: ApiClient) -> Self {
        Self {
            auth: auth::AuthService::new(client.clone()),
            catalog: catalog::CatalogService::new(client.clone()),
            loans: loans::LoansService::new(client.clone()),
            profile: profile::ProfileService::new(client.clone()),
            stats: stats::StatsService::new(client.clone()),
            client,
        }
    }

    /// Wire services over the reqwest transport as configured
    pub fn from_config(
        config: &AppConfig,
        session: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> ClientResult<Self> {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(config.api.timeout())?);
        let client = ApiClient::new(&config.api.resolved_base_url(), transport, session, navigator);
        Ok(Self::new(client))
    }
}
