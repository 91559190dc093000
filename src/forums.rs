//! `intel forums`: lists the forums the record store accepts posts for,
//! as an `ID` / `NAME` table.

use anyhow::{Context, Result};
use intel_harness_core::store::RecordStore;

use crate::config::Config;
use crate::http_store::HttpRecordStore;

/// Lists the forums posts can be imported into.
pub async fn list_forums(config: &Config) -> Result<()> {
    let store = HttpRecordStore::from_config(config)?;
    let forums = store
        .list_forums()
        .await
        .with_context(|| format!("Failed to list forums from {}", store.base_url()))?;

    if forums.is_empty() {
        println!("No forums.");
        return Ok(());
    }

    println!("{:<38} NAME", "ID");
    for forum in &forums {
        println!("{:<38} {}", forum.id, forum.name);
    }

    Ok(())
}
