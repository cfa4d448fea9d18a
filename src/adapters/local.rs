use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        Path::new(&self.base_path).join(path)
    }
}

/// 先寫到同目錄的暫存檔再 rename，避免留下寫到一半的輸出
fn write_atomically(target: &Path, data: &[u8]) -> Result<()> {
    let file_name = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| EtlError::InvalidConfigValueError {
            field: "output".to_string(),
            value: target.display().to_string(),
            reason: "Output path has no file name".to_string(),
        })?;
    let temp_path = target.with_file_name(format!(".{}.tmp-{}", file_name, std::process::id()));

    if let Err(e) = fs::write(&temp_path, data) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&temp_path, target) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(path);
        match fs::read(&full_path) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(EtlError::InputNotFound {
                location: full_path.display().to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);

        if let Some(parent) = full_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        write_atomically(&full_path, data)?;
        tracing::debug!("Wrote {} bytes to {}", data.len(), full_path.display());
        Ok(())
    }

    fn describe(&self, path: &str) -> String {
        self.full_path(path).display().to_string()
    }
}
