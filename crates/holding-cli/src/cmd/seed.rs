use anyhow::Context;
use holding_core::config::Config;
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    Config::load(root).context("workspace not initialized; run `holding init` first")?;

    let summary = holding_core::seed::plant(root).context("failed to plant seed data")?;

    println!("Seeded demo office:");
    println!("  administrator: {} / admin", summary.admin_email);
    println!("  consultant:    {} / caio", summary.consultant_email);
    println!("  client:        {} / 123", summary.client_email);
    println!("  project:       {}", summary.project_id);
    Ok(())
}
