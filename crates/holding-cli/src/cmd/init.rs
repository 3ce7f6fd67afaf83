use anyhow::Context;
use holding_core::config::Config;
use holding_core::paths;
use std::path::Path;

pub fn run(root: &Path, workspace_name: Option<&str>) -> anyhow::Result<()> {
    let name = workspace_name
        .map(|n| n.to_string())
        .or_else(|| {
            root.file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "escritorio".to_string());

    println!("Initializing holding workspace in: {}", root.display());

    let dirs = [
        paths::HOLDING_DIR,
        paths::PROJECTS_DIR,
        paths::USERS_DIR,
        paths::UPLOADS_DIR,
        paths::NOTIFICATIONS_DIR,
    ];
    for dir in dirs {
        let p = root.join(dir);
        std::fs::create_dir_all(&p).with_context(|| format!("failed to create {}", p.display()))?;
    }

    let config_path = paths::config_path(root);
    if !config_path.exists() {
        let config = Config::new(&name);
        config.save(root).context("failed to write config.yaml")?;
        println!("  created: .holding/config.yaml");
    } else {
        println!("  exists:  .holding/config.yaml");
    }

    println!("Done. Run `holding seed` for demo data or `holding user create` to start.");
    Ok(())
}
