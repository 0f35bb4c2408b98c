//! Client construction and user-data backend selection.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use cinescope_api::supabase::SupabaseClient;
use cinescope_api::tmdb::TmdbClient;
use cinescope_core::SessionContext;
use cinescope_db::SqliteUserStore;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use crate::config::{
    AppConfig, StoreBackend, load_session, resolve_config_path, resolve_data_dir, session_path,
};

/// `User-Agent` sent by every client.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

fn env_secret(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Resolved configuration and directories for one invocation.
#[derive(Debug)]
pub struct AppContext {
    /// Config file location.
    pub config_path: PathBuf,
    /// Session file and local database directory.
    pub data_dir: PathBuf,
    /// File config with environment overrides applied.
    pub config: AppConfig,
    /// Fired on Ctrl-C; pending fetches are abandoned.
    pub shutdown: CancellationToken,
}

/// The selected user-data backend, ready for use.
#[derive(Debug)]
pub enum Backend {
    /// Hosted auth and tables; the user comes from the session.
    Remote(SessionContext<SupabaseClient>),
    /// Local database with its single implicit user.
    Local {
        /// The store.
        store: SqliteUserStore,
        /// Owner of every row.
        user_id: Uuid,
    },
}

impl Backend {
    /// ID of the user whose data is read and written.
    ///
    /// # Errors
    ///
    /// Returns an error when the hosted backend has no signed-in session.
    pub fn user_id(&self) -> Result<Uuid> {
        match self {
            Self::Remote(session) => session
                .require_user()
                .context("not signed in (run `cinescope auth sign-in` first)"),
            Self::Local { user_id, .. } => Ok(*user_id),
        }
    }
}

impl AppContext {
    /// Loads config (file then environment) and resolves directories.
    ///
    /// # Errors
    ///
    /// Returns an error if paths cannot be resolved or the config file is invalid.
    pub fn load(dir: Option<&PathBuf>) -> Result<Self> {
        let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
        let data_dir = resolve_data_dir(dir).context("failed to resolve data directory")?;
        let mut config = AppConfig::load(&config_path).context("failed to load config")?;
        config.apply_env();
        Ok(Self {
            config_path,
            data_dir,
            config,
            shutdown: CancellationToken::new(),
        })
    }

    /// Session file location.
    #[must_use]
    pub fn session_path(&self) -> PathBuf {
        session_path(&self.data_dir)
    }

    /// Builds the metadata client from `TMDB_API_TOKEN` or `TMDB_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns an error if no credential is set or the client fails to build.
    #[instrument(skip_all)]
    pub fn tmdb_client(&self) -> Result<TmdbClient> {
        let mut builder = TmdbClient::builder()
            .user_agent(USER_AGENT)
            .language(self.config.tmdb.language.as_str());

        if let Some(token) = env_secret("TMDB_API_TOKEN") {
            builder = builder.api_token(token);
        } else if let Some(key) = env_secret("TMDB_API_KEY") {
            builder = builder.api_key(key);
        } else {
            bail!("TMDB_API_KEY or TMDB_API_TOKEN environment variable is required");
        }

        if let Some(base) = &self.config.tmdb.base_url {
            let url = Url::parse(base).with_context(|| format!("invalid TMDB base URL: {base}"))?;
            builder = builder.base_url(url);
        }

        builder.build().context("failed to build TMDB client")
    }

    /// Builds the hosted backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL or anon key is missing or invalid.
    #[instrument(skip_all)]
    pub fn supabase_client(&self) -> Result<SupabaseClient> {
        let url = self
            .config
            .supabase
            .url
            .as_deref()
            .context("Supabase URL is not configured (set SUPABASE_URL or [supabase].url)")?;
        let anon_key = self.config.supabase.anon_key.as_deref().context(
            "Supabase anon key is not configured (set SUPABASE_ANON_KEY or [supabase].anon_key)",
        )?;

        SupabaseClient::builder()
            .base_url(Url::parse(url).with_context(|| format!("invalid Supabase URL: {url}"))?)
            .anon_key(anon_key)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build Supabase client")
    }

    /// Session context over the hosted client, restored from the session file.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built or the session file is unreadable.
    pub async fn session_context(&self) -> Result<SessionContext<SupabaseClient>> {
        let client = self.supabase_client()?;
        if let Some(session) =
            load_session(&self.session_path()).context("failed to load saved session")?
        {
            client.restore_session(session);
        }
        Ok(SessionContext::init(client).await)
    }

    /// Opens the configured user-data backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be opened.
    pub async fn open_backend(&mut self) -> Result<Backend> {
        match self.config.store.backend {
            StoreBackend::Supabase => Ok(Backend::Remote(self.session_context().await?)),
            StoreBackend::Local => {
                let store = SqliteUserStore::open(Some(&self.data_dir))
                    .context("failed to open local store")?;
                let user_id = self.local_user_id()?;
                Ok(Backend::Local { store, user_id })
            }
        }
    }

    /// The local user ID, generated and written back on first use.
    fn local_user_id(&mut self) -> Result<Uuid> {
        if let Some(id) = self.config.store.local_user_id {
            return Ok(id);
        }
        let id = Uuid::new_v4();
        // Re-read so environment overrides are not written to disk.
        let mut on_disk = AppConfig::load(&self.config_path).context("failed to load config")?;
        on_disk.store.local_user_id = Some(id);
        on_disk.save(&self.config_path).context("failed to save config")?;
        self.config.store.local_user_id = Some(id);
        tracing::info!(user_id = %id, "created local user");
        Ok(id)
    }
}
