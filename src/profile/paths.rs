//! Filesystem conventions for profile and rebind storage.

use chrono::Local;
use std::fs;
use std::path::PathBuf;

/// Compute (and create) the per-application data folder rebind files live in.
pub fn data_dir(app_id: &str) -> Result<PathBuf, String> {
    let base = directories::BaseDirs::new().ok_or("Could not find user data directory")?;
    let dir = base.data_dir().join(app_id);
    fs::create_dir_all(&dir).map_err(|e| e.to_string())?;
    Ok(dir)
}

/// Return `<data dir>/<app_id>/rebinds_<profile>.xml` (does not create it).
pub fn rebind_path(app_id: &str, profile: &str) -> Result<PathBuf, String> {
    Ok(data_dir(app_id)?.join(format!("rebinds_{profile}.xml")))
}

/// Timestamped file name for rebind backups, e.g.
/// `rebinds-default-20260806-14:02.xml`.
pub fn timestamped_rebind_name(profile: &str) -> String {
    format!(
        "rebinds-{profile}-{}.xml",
        Local::now().format("%Y%m%d-%H:%M")
    )
}
