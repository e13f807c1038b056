//! One-shot removal of a desktop entry.

use std::path::Path;

use anyhow::{Result, bail};

use crate::integrate::{Integrator, display_name};

pub fn run(path: &Path) -> Result<()> {
    let integrator = Integrator::user();
    if !integrator.remove(path)? {
        bail!("No matching desktop entry found");
    }
    println!("Removed desktop entry for: {}", display_name(path));
    Ok(())
}
