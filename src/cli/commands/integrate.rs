//! One-shot integration of a single AppImage.

use std::path::Path;

use anyhow::Result;

use crate::integrate::Integrator;

pub async fn run(path: &Path) -> Result<()> {
    let integrator = Integrator::user();
    let entry = integrator.integrate(path).await?;

    println!("Integrated:   {}", entry.display_name);
    println!("Executable:   {}", entry.source_path.display());
    println!("Desktop file: {}", entry.descriptor_path.display());
    Ok(())
}
