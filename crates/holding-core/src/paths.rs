use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const HOLDING_DIR: &str = ".holding";
pub const PROJECTS_DIR: &str = ".holding/projects";
pub const USERS_DIR: &str = ".holding/users";
pub const UPLOADS_DIR: &str = ".holding/uploads";
pub const NOTIFICATIONS_DIR: &str = ".holding/notifications";

pub const CONFIG_FILE: &str = ".holding/config.yaml";
pub const MANIFEST_FILE: &str = "manifest.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn holding_dir(root: &Path) -> PathBuf {
    root.join(HOLDING_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn project_dir(root: &Path, id: &str) -> PathBuf {
    root.join(PROJECTS_DIR).join(id)
}

pub fn project_manifest(root: &Path, id: &str) -> PathBuf {
    project_dir(root, id).join(MANIFEST_FILE)
}

pub fn user_path(root: &Path, id: &str) -> PathBuf {
    root.join(USERS_DIR).join(format!("{id}.yaml"))
}

pub fn upload_dir(root: &Path, document_id: &str) -> PathBuf {
    root.join(UPLOADS_DIR).join(document_id)
}

pub fn notifications_path(root: &Path, user_id: &str) -> PathBuf {
    root.join(NOTIFICATIONS_DIR).join(format!("{user_id}.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_manifest_layout() {
        let root = Path::new("/data");
        assert_eq!(
            project_manifest(root, "p1"),
            PathBuf::from("/data/.holding/projects/p1/manifest.yaml")
        );
    }

    #[test]
    fn user_path_layout() {
        let root = Path::new("/data");
        assert_eq!(
            user_path(root, "u1"),
            PathBuf::from("/data/.holding/users/u1.yaml")
        );
    }
}
