use std::sync::Arc;

use url::Url;

use super::{InMemoryStorage, KvStorage, LocalStorage, S3Storage, SqliteStorage};
use crate::error::{HistoryError, Result};

/// Opens a storage backend from a URL:
///
/// * `memory://`
/// * `file://path/to/dir`
/// * `sqlite://path/to/history.sqlite` or `sqlite://:memory:`
/// * `s3://access_key:secret_key@endpoint/bucket/prefix?region=us-east-1`
pub fn open_url(url_str: &str) -> Result<Arc<dyn KvStorage>> {
    // Credentials may contain characters the url crate rejects
    if url_str.starts_with("s3://") {
        return open_s3_url(url_str);
    }

    if let Some(rest) = url_str.strip_prefix("sqlite://") {
        if rest.is_empty() {
            return Err(HistoryError::InvalidStorageUrl(
                "sqlite:// URL must include a path".to_string(),
            ));
        }
        let storage = if rest == ":memory:" {
            SqliteStorage::open_memory()?
        } else {
            SqliteStorage::open(rest)?
        };
        return Ok(Arc::new(storage));
    }

    let url = Url::parse(url_str)
        .map_err(|e| HistoryError::InvalidStorageUrl(format!("{}: {}", url_str, e)))?;

    match url.scheme() {
        "memory" => Ok(Arc::new(InMemoryStorage::new())),
        "file" => {
            let path = file_url_path(&url);
            if path.is_empty() {
                return Err(HistoryError::InvalidStorageUrl(
                    "file:// URL must include a path".to_string(),
                ));
            }
            Ok(Arc::new(LocalStorage::new(&path)))
        }
        scheme => Err(HistoryError::InvalidStorageUrl(format!(
            "unsupported scheme: {}. Use memory://, file://, sqlite:// or s3://",
            scheme
        ))),
    }
}

// file://relative/dir parses "relative" as the host; rejoin it with the path
fn file_url_path(url: &Url) -> String {
    let path = url.path();
    match url.host_str() {
        Some(host) if !host.is_empty() => format!("{}{}", host, path.trim_end_matches('/')),
        _ => path.trim_end_matches('/').to_string(),
    }
}

fn open_s3_url(url_str: &str) -> Result<Arc<dyn KvStorage>> {
    let invalid = |msg: &str| HistoryError::InvalidStorageUrl(msg.to_string());

    let after_scheme = &url_str["s3://".len()..];
    let (creds_and_rest, query) = match after_scheme.split_once('?') {
        Some((rest, query)) => (rest, Some(query)),
        None => (after_scheme, None),
    };

    let (creds, rest) = creds_and_rest.rsplit_once('@').ok_or_else(|| {
        invalid(
            "S3 URL must include credentials: s3://access_key:secret_key@endpoint/bucket/prefix",
        )
    })?;
    let (access_key, secret_key) = creds
        .split_once(':')
        .ok_or_else(|| invalid("S3 URL must include access_key:secret_key"))?;

    let parts: Vec<&str> = rest.split('/').filter(|p| !p.is_empty()).collect();
    if parts.len() < 2 {
        return Err(invalid("S3 URL must include endpoint and bucket"));
    }

    let endpoint = format!("https://{}", parts[0]);
    let bucket = parts[1];
    let prefix = parts[2..].join("/");

    let region = query
        .and_then(|q| {
            q.split('&').find_map(|pair| {
                let (k, v) = pair.split_once('=')?;
                (k == "region").then(|| v.to_string())
            })
        })
        .unwrap_or_else(|| "us-east-1".to_string());

    let storage = S3Storage::new(&endpoint, bucket, &region, access_key, secret_key)?
        .with_prefix(&prefix);
    Ok(Arc::new(storage))
}
