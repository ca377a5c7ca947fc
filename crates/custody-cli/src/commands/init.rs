use std::path::PathBuf;

use custody_core::storage::SqliteStore;

use crate::app::{resolve_config_path, AppContext};
use crate::cli::InitArgs;
use crate::config::{default_db_path, write_config, CustodyConfig};
use crate::errors::CliError;
use crate::ui::{badge, print, receipt, Badge};

pub fn handle_init(ctx: &AppContext, args: &InitArgs) -> anyhow::Result<()> {
    let db_path = match args.path.as_deref().or(ctx.cli().db.as_deref()) {
        Some(path) => PathBuf::from(path),
        None => default_db_path()?,
    };
    let config_path = match args.config_path.as_deref() {
        Some(path) => PathBuf::from(path),
        None => resolve_config_path()?,
    };

    if db_path.exists() {
        return Err(CliError::invalid_input(format!(
            "Database already exists: {}",
            db_path.display()
        ))
        .into());
    }
    if !args.no_config && config_path.exists() {
        return Err(CliError::invalid_input(format!(
            "Config file already exists: {} (use --no-config to keep it)",
            config_path.display()
        ))
        .into());
    }

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create database directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    SqliteStore::create(&db_path)?;
    tracing::info!(path = %db_path.display(), "Created custody database");

    if !args.no_config {
        write_config(&config_path, &CustodyConfig::new(db_path.clone()))?;
    }

    let ui = ctx.ui();
    if ui.mode.is_json() {
        crate::output::print_json(&serde_json::json!({
            "database": db_path,
            "config": (!args.no_config).then_some(&config_path),
        }))?;
        return Ok(());
    }
    if ctx.quiet() {
        return Ok(());
    }

    let mut items = vec![("Database", db_path.display().to_string())];
    if !args.no_config {
        items.push(("Config", config_path.display().to_string()));
    }
    print(ui, &receipt(ui, "Initialized custody database", &items));
    if std::env::var(custody_core::crypto::ENCRYPTION_KEY_ENV).is_err() {
        print(
            ui,
            &badge(
                ui,
                Badge::Warn,
                "ENCRYPTION_KEY is not set; set it before using any other command.",
            ),
        );
    }
    Ok(())
}
