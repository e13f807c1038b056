//! List all managed applications.

use anyhow::Result;

use crate::registry::RegistryStore;

pub fn run() -> Result<()> {
    let store = RegistryStore::user();
    let entries = store.list();

    if entries.is_empty() {
        println!("No integrated applications found.");
        return Ok(());
    }

    println!("{:<30}  Source", "Application");
    println!("{}", "-".repeat(70));
    for entry in entries {
        println!(
            "{:<30}  {}",
            entry.display_name,
            entry.source_path.display()
        );
    }
    Ok(())
}
