use std::sync::Arc;

use interfaces_newsapi_articles::index::NewsApiClient;
use reqwest::Client;

use crate::config::Config;
use crate::db::{CredentialStore, InteractionStore};
use crate::services::{
    auth::AuthService,
    news::{AggregationService, NewsSource},
    tokens::TokenIssuer,
    votes::VoteService,
};

pub struct AppState {
    pub auth: AuthService,
    pub news: AggregationService,
    pub votes: VoteService,
}

impl AppState {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        interactions: Arc<dyn InteractionStore>,
        source: Option<Arc<dyn NewsSource>>,
        jwt_secret: &str,
    ) -> Arc<Self> {
        let tokens = Arc::new(TokenIssuer::new(jwt_secret.as_bytes()));

        Arc::new(Self {
            auth: AuthService::new(credentials, tokens),
            news: AggregationService::new(source, Arc::clone(&interactions)),
            votes: VoteService::new(interactions),
        })
    }

    /// Wires the NewsAPI client from config around the given stores.
    pub fn from_config(
        config: &Config,
        credentials: Arc<dyn CredentialStore>,
        interactions: Arc<dyn InteractionStore>,
    ) -> Arc<Self> {
        let source = config.news_api_key.as_ref().map(|key| {
            Arc::new(NewsApiClient::new(Client::new(), config.news_api_base_url.clone(), key.clone()))
                as Arc<dyn NewsSource>
        });

        Self::new(credentials, interactions, source, &config.jwt_secret)
    }
}
