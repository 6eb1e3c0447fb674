//! Clear command - forces the next test run to sign in again

use anyhow::{Context, Result};
use colored::Colorize;

use crate::fs::SessionStore;

pub fn execute(store: &SessionStore) -> Result<()> {
    let removed = store
        .clear()
        .with_context(|| format!("Failed to clear {}", store.path().display()))?;

    if removed {
        println!(
            "{} Removed cached session {}",
            "✓".green().bold(),
            store.path().display()
        );
    } else {
        println!("{} No cached session to remove", "─".dimmed());
    }
    Ok(())
}
