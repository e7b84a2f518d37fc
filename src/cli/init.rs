//! taskkeep init command implementation
//!
//! Creates the data directory, an empty store document and a default
//! `.taskkeep.toml` when they are missing.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::{Config, CONFIG_FILE};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanReport, OutputOptions};
use crate::storage::Storage;
use crate::store::FileStore;

pub struct InitOptions {
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct InitReport {
    root: PathBuf,
    data_dir: PathBuf,
    created: InitCreated,
}

#[derive(Serialize)]
struct InitCreated {
    config: bool,
    store: bool,
}

pub fn run(options: InitOptions) -> Result<()> {
    let root = super::resolve_root(options.root)?;
    std::fs::create_dir_all(&root)?;

    let config_path = root.join(CONFIG_FILE);
    let (config, created_config) = if config_path.exists() {
        (Config::load(&config_path)?, false)
    } else {
        let config = Config::default();
        config.save(&config_path)?;
        (config, true)
    };

    let storage = Storage::for_root(root.clone(), &config.store);
    let created_store = !storage.is_initialized();
    let store = FileStore::init(storage).map_err(|source| Error::store("init store", source))?;
    let data_dir = store.storage().data_dir().to_path_buf();

    tracing::debug!(
        root = %root.display(),
        created_config,
        created_store,
        "init finished"
    );

    let report = InitReport {
        root: root.clone(),
        data_dir: data_dir.clone(),
        created: InitCreated {
            config: created_config,
            store: created_store,
        },
    };

    let mut created_items = Vec::new();
    if created_config {
        created_items.push(CONFIG_FILE.to_string());
    }
    if created_store {
        created_items.push(format!("{}/", config.store.dir.trim()));
    }

    let header = if created_items.is_empty() {
        "taskkeep init: nothing to do"
    } else {
        "taskkeep init: initialized"
    };

    let mut human = HumanReport::new(header);
    human.field("root", root.display().to_string());
    human.field("data dir", data_dir.display().to_string());
    human.field(
        "created",
        if created_items.is_empty() {
            "none".to_string()
        } else {
            created_items.join(", ")
        },
    );
    human.hint("taskkeep housekeep --dry-run");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "init",
        &report,
        &human,
    )
}
