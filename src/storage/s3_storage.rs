use anyhow::Result;
use s3::{creds::Credentials, Bucket, Region};

use super::KvStorage;

/// Objects in an S3-compatible bucket. An optional key prefix scopes the
/// storage to a "directory" of the bucket.
pub struct S3Storage {
    bucket: Bucket,
    prefix: String,
}

impl S3Storage {
    pub fn new(
        endpoint: &str,
        bucket_name: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
    ) -> Result<Self> {
        let credentials = Credentials::new(Some(access_key), Some(secret_key), None, None, None)?;
        let region = Region::Custom {
            region: region.to_string(),
            endpoint: endpoint.to_string(),
        };
        let bucket = Bucket::new(bucket_name, region, credentials)?;
        Ok(Self { bucket, prefix: String::new() })
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.trim_matches('/').to_string();
        self
    }

    fn object_path(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", self.prefix, key)
        }
    }

    fn strip_prefix<'a>(&self, path: &'a str) -> &'a str {
        if self.prefix.is_empty() {
            path
        } else {
            path.strip_prefix(&self.prefix)
                .map(|rest| rest.trim_start_matches('/'))
                .unwrap_or(path)
        }
    }
}

impl KvStorage for S3Storage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.object_path(key);
        log::debug!("STORAGE GET: path='{}'", path);
        let response = self.bucket.get_object(&path)?;

        match response.status_code() {
            200 => {}
            404 => {
                log::debug!("STORAGE GET RESULT: absent");
                return Ok(None);
            }
            status => {
                log::error!("STORAGE GET ERROR: S3 returned status {} for path '{}'", status, path);
                return Err(anyhow::anyhow!(
                    "S3 returned error status {} for path: {}",
                    status,
                    path
                ));
            }
        }

        let content = String::from_utf8(response.bytes().to_vec())?;
        log::debug!("STORAGE GET RESULT: {} bytes", content.len());
        Ok(Some(content))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.object_path(key);
        log::debug!("STORAGE SET: path='{}', size={} bytes", path, value.len());
        let response = self.bucket.put_object(&path, value.as_bytes())?;
        if response.status_code() != 200 {
            return Err(anyhow::anyhow!(
                "S3 returned error status {} writing path: {}",
                response.status_code(),
                path
            ));
        }
        log::debug!("STORAGE SET RESULT: success");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.object_path(key);
        log::debug!("STORAGE DELETE: path='{}'", path);
        let status = self.bucket.delete_object(&path)?.status_code();
        if !delete_succeeded(status) {
            return Err(anyhow::anyhow!(
                "S3 returned error status {} deleting path: {}",
                status,
                path
            ));
        }
        log::debug!("STORAGE DELETE RESULT: status={}", status);
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let path = self.object_path(prefix);
        log::debug!("STORAGE LIST: prefix='{}'", path);
        let results = self.bucket.list(path, None)?;
        let mut keys = Vec::new();

        for list_bucket_result in results {
            for object in list_bucket_result.contents {
                keys.push(self.strip_prefix(&object.key).to_string());
            }
        }

        keys.sort();
        log::debug!("STORAGE LIST RESULT: {} items", keys.len());
        Ok(keys)
    }
}

// Deleting a missing object is not an error.
fn delete_succeeded(status: u16) -> bool {
    (200..300).contains(&status) || status == 404
}
