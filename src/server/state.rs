//! Shared application state

use crate::config::AppConfig;
use crate::core::auth::{AuthGate, JwtTokenService, TokenService};
use crate::core::code::CodeGenerator;
use crate::media::{CloudinaryHost, DisabledHost, MediaHost};
use crate::notify::{HttpMailer, LogMailer, Mailer, Notifier};
use crate::storage::Repositories;
use anyhow::{Context, Result};
use chrono::Duration;
use std::sync::Arc;

/// Everything the resources need, built once at startup
///
/// Cheap to clone: every field is reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repositories: Repositories,
    pub gate: Arc<AuthGate>,
    pub codes: Arc<CodeGenerator>,
    pub notifier: Notifier,
    pub media: Arc<dyn MediaHost>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        repositories: Repositories,
        tokens: Arc<dyn TokenService>,
        notifier: Notifier,
        media: Arc<dyn MediaHost>,
    ) -> Self {
        let gate = Arc::new(AuthGate::new(tokens, repositories.admins.clone()));
        let codes = Arc::new(CodeGenerator::new(
            repositories.sequences.clone(),
            config.codes.strategy,
        ));

        Self {
            config: Arc::new(config),
            repositories,
            gate,
            codes,
            notifier,
            media,
        }
    }

    /// Wire the token service, mailer and media host described by `config`
    pub fn from_config(config: AppConfig, repositories: Repositories) -> Result<Self> {
        let tokens = Arc::new(JwtTokenService::new(
            &config.jwt_secret()?,
            Duration::seconds(config.auth.token_ttl_secs),
        ));

        let mailer: Arc<dyn Mailer> = match &config.mail.relay_url {
            Some(url) => Arc::new(
                HttpMailer::new(url.clone(), config.mail.api_key.clone(), config.mail.from.clone())
                    .context("cannot build mail relay client")?,
            ),
            None => {
                tracing::warn!("MAIL_RELAY_URL is not set, emails will only be logged");
                Arc::new(LogMailer)
            }
        };
        let notifier = Notifier::new(mailer, config.mail.admin_email.clone())
            .context("cannot load email templates")?;

        let media: Arc<dyn MediaHost> = match config.cloudinary() {
            Some(cloudinary) => Arc::new(
                CloudinaryHost::new(cloudinary).context("cannot build media host client")?,
            ),
            None => {
                tracing::warn!("Cloudinary credentials are not set, uploads are disabled");
                Arc::new(DisabledHost)
            }
        };

        tracing::info!(
            storage = repositories.backend.name(),
            mailer = notifier.mailer_name(),
            media = media.name(),
            codes = ?config.codes.strategy,
            "application state ready"
        );
        Ok(Self::new(config, repositories, tokens, notifier, media))
    }
}

/// Open the storage described by `config`
///
/// MongoDB when a connection string is configured, in-memory otherwise.
pub async fn open_repositories(config: &AppConfig) -> Result<Repositories> {
    match &config.database.uri {
        None => {
            tracing::warn!("MONGODB_URI is not set, using in-memory storage (data is lost on restart)");
            Ok(Repositories::in_memory())
        }
        #[cfg(feature = "mongodb_backend")]
        Some(uri) => {
            let client = mongodb::Client::with_uri_str(uri)
                .await
                .context("cannot connect to MongoDB")?;
            let database = client.database(&config.database.name);
            let repositories = Repositories::mongodb(database)
                .await
                .context("cannot prepare MongoDB collections")?;
            repositories
                .backend
                .ping()
                .await
                .context("MongoDB does not answer")?;
            tracing::info!(database = %config.database.name, "connected to MongoDB");
            Ok(repositories)
        }
        #[cfg(not(feature = "mongodb_backend"))]
        Some(_) => anyhow::bail!(
            "MONGODB_URI is set but this build has no MongoDB support (enable the mongodb_backend feature)"
        ),
    }
}
