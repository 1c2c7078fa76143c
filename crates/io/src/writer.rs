// Output writing: new derivative files and atomic in-place replacement

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::IoError;

/// What `write_new` does when the target already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Existing {
    Replace,
    Refuse,
}

/// Write a derivative output, creating its directory if needed.
pub fn write_new(path: &Path, content: &str, existing: Existing) -> Result<(), IoError> {
    if existing == Existing::Refuse && path.exists() {
        return Err(IoError::Exists {
            path: path.to_path_buf(),
        });
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| IoError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// `sap2.txt` + `.bak` → `sap2.txt.bak`
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceOptions {
    pub backup_suffix: String,
    pub temp_suffix: String,
}

impl Default for ReplaceOptions {
    fn default() -> Self {
        Self {
            backup_suffix: ".bak".into(),
            temp_suffix: ".tmp".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceOutcome {
    pub target: PathBuf,
    /// `None` when the backup copy failed (the replace still happened).
    pub backup: Option<PathBuf>,
}

/// New content fully written to a sibling temp file, not yet visible at the target.
///
/// Dropping a stage without calling [`StagedReplace::commit`] leaves the
/// target untouched and the temp file behind, which is exactly the state a
/// crash before the rename produces.
#[derive(Debug)]
#[must_use = "the target is only replaced by commit()"]
pub struct StagedReplace {
    target: PathBuf,
    temp: PathBuf,
    backup: Option<PathBuf>,
}

impl StagedReplace {
    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    pub fn backup_path(&self) -> Option<&Path> {
        self.backup.as_deref()
    }

    /// Rename the temp file onto the target. This is the only commit point.
    pub fn commit(self) -> Result<ReplaceOutcome, IoError> {
        if let Err(source) = fs::rename(&self.temp, &self.target) {
            let _ = fs::remove_file(&self.temp);
            return Err(IoError::Rename {
                temp: self.temp,
                target: self.target,
                source,
            });
        }
        tracing::info!(path = %self.target.display(), "replaced file");
        Ok(ReplaceOutcome {
            target: self.target,
            backup: self.backup,
        })
    }

    /// Give up and delete the temp file.
    pub fn abandon(self) {
        if let Err(e) = fs::remove_file(&self.temp) {
            tracing::warn!(path = %self.temp.display(), error = %e, "cannot remove temp file");
        }
    }
}

/// Back up `target`, then write `content` to its temp sibling.
///
/// A failed backup is logged and the stage continues without one.
pub fn stage_replace(
    target: &Path,
    content: &str,
    options: &ReplaceOptions,
) -> Result<StagedReplace, IoError> {
    let backup_path = with_suffix(target, &options.backup_suffix);
    let backup = match fs::copy(target, &backup_path) {
        Ok(_) => Some(backup_path),
        Err(e) => {
            tracing::warn!(
                path = %backup_path.display(),
                error = %e,
                "backup failed, replacing without one"
            );
            None
        }
    };

    let temp = with_suffix(target, &options.temp_suffix);
    if let Err(source) = write_synced(&temp, content) {
        let _ = fs::remove_file(&temp);
        return Err(IoError::Write { path: temp, source });
    }

    Ok(StagedReplace {
        target: target.to_path_buf(),
        temp,
        backup,
    })
}

/// Atomically replace `target` with `content`: backup, temp write, rename.
pub fn replace_in_place(
    target: &Path,
    content: &str,
    options: &ReplaceOptions,
) -> Result<ReplaceOutcome, IoError> {
    stage_replace(target, content, options)?.commit()
}

fn write_synced(path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()
}
