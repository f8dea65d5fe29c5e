use std::{fs, io::ErrorKind, path::Path};

use anyhow::{Context, Result};

use super::KvStorage;

/// Stores each key as a file beneath `base_path`; `/` in keys becomes a
/// directory separator.
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: &str) -> Self {
        Self {
            base_path: base_path.trim_end_matches('/').to_string(),
        }
    }

    fn full_path(&self, key: &str) -> Result<String> {
        let key = key.trim_start_matches('/');
        check_inside_base(key)?;
        Ok(format!("{}/{}", self.base_path, key))
    }
}

impl KvStorage for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        log::debug!("STORAGE GET: key='{}'", key);
        match fs::read_to_string(self.full_path(key)?) {
            Ok(content) => {
                log::debug!("STORAGE GET RESULT: {} bytes", content.len());
                Ok(Some(content))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("STORAGE GET RESULT: absent");
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("reading key '{}'", key)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        log::debug!("STORAGE SET: key='{}', size={} bytes", key, value.len());
        let full_path = self.full_path(key)?;
        if let Some(parent) = Path::new(&full_path).parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full_path, value).with_context(|| format!("writing key '{}'", key))?;
        log::debug!("STORAGE SET RESULT: success");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        log::debug!("STORAGE DELETE: key='{}'", key);
        match fs::remove_file(self.full_path(key)?) {
            Ok(()) => {
                log::debug!("STORAGE DELETE RESULT: existed=true");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("STORAGE DELETE RESULT: existed=false");
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("deleting key '{}'", key)),
        }
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        log::debug!("STORAGE LIST: prefix='{}'", prefix);
        let prefix = prefix.trim_start_matches('/');
        check_inside_base(prefix)?;
        // Split into the directory to scan and the file name prefix within it
        let (dir, name_prefix) = match prefix.rfind('/') {
            Some(pos) => (&prefix[..pos], &prefix[pos + 1..]),
            None => ("", prefix),
        };
        let full_dir = if dir.is_empty() {
            self.base_path.clone()
        } else {
            format!("{}/{}", self.base_path, dir)
        };
        let path = Path::new(&full_dir);

        if !path.is_dir() {
            log::debug!("STORAGE LIST RESULT: 0 items (path does not exist)");
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().to_string();
            if !file_name.starts_with(name_prefix) {
                continue;
            }
            if dir.is_empty() {
                results.push(file_name);
            } else {
                results.push(format!("{}/{}", dir, file_name));
            }
        }

        results.sort();
        log::debug!("STORAGE LIST RESULT: {} items", results.len());
        Ok(results)
    }
}

// Keys are relative to the base directory and may not climb out of it.
fn check_inside_base(key: &str) -> Result<()> {
    if key.split('/').any(|segment| segment == "..") {
        anyhow::bail!("key '{}' points outside the storage directory", key);
    }
    Ok(())
}
