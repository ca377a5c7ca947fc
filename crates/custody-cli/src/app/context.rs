//! Application context for the custody CLI.
//!
//! Bundles CLI arguments with the lazily-loaded config file and master
//! secret, so handlers do not thread them through by hand.

use std::path::PathBuf;
use std::sync::Arc;

use once_cell::unsync::OnceCell;

use custody_core::crypto::MasterSecret;
use custody_core::custody::{Actor, CustodyPolicy, CustodyService};
use custody_core::storage::SqliteStore;

use crate::cli::Cli;
use crate::config::{read_config, CustodyConfig};
use crate::errors::CliError;
use crate::ui::UiContext;

use super::resolver::{missing_config_message, missing_db_message, resolve_config_path, INIT_HINT};

pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<Option<CustodyConfig>>,
    secret: OnceCell<Arc<MasterSecret>>,
    ui: UiContext,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
            secret: OnceCell::new(),
            ui: UiContext::from_env(cli.json, cli.no_color, cli.ascii),
        }
    }

    pub fn cli(&self) -> &Cli {
        self.cli
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    pub fn ui(&self) -> &UiContext {
        &self.ui
    }

    /// The caller as given by `--as` and `--role`.
    pub fn actor(&self) -> Actor {
        Actor::new(self.cli.user.clone(), self.cli.role)
    }

    /// The config file, if one exists at the resolved path.
    pub fn config(&self) -> anyhow::Result<Option<&CustodyConfig>> {
        let config = self.config.get_or_try_init(|| {
            let path = resolve_config_path()?;
            if !path.exists() {
                return Ok::<_, anyhow::Error>(None);
            }
            tracing::debug!(path = %path.display(), "Loading config");
            read_config(&path).map(Some)
        })?;
        Ok(config.as_ref())
    }

    pub fn policy(&self) -> anyhow::Result<CustodyPolicy> {
        Ok(self
            .config()?
            .map(CustodyConfig::policy)
            .unwrap_or_default())
    }

    /// Database path from `--db`/`CUSTODY_DB`, falling back to the config file.
    pub fn db_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = self.cli.db.as_deref() {
            return Ok(PathBuf::from(path));
        }
        match self.config()? {
            Some(config) => Ok(PathBuf::from(&config.database.path)),
            None => {
                let config_path = resolve_config_path()?;
                Err(CliError::not_found(missing_config_message(&config_path), INIT_HINT).into())
            }
        }
    }

    pub fn open_store(&self) -> anyhow::Result<SqliteStore> {
        let path = self.db_path()?;
        if !path.exists() {
            return Err(CliError::not_found(missing_db_message(&path), INIT_HINT).into());
        }
        tracing::debug!(path = %path.display(), "Opening database");
        Ok(SqliteStore::open(&path)?)
    }

    /// The master secret from ENCRYPTION_KEY, loaded once.
    pub fn secret(&self) -> anyhow::Result<Arc<MasterSecret>> {
        let secret = self
            .secret
            .get_or_try_init(|| MasterSecret::from_env().map(Arc::new))?;
        Ok(Arc::clone(secret))
    }

    pub fn service(&self) -> anyhow::Result<CustodyService<SqliteStore>> {
        let secret = self.secret()?;
        let store = self.open_store()?;
        Ok(CustodyService::new(store, secret).with_policy(self.policy()?))
    }
}
