use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use nails::multipart::FilePart;

use super::{extension, public_id_for, MediaError, MediaStore, StoredMedia};
use crate::config::LocalMediaConfig;

/// Keeps media in a directory served under `public_url`.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    dir: PathBuf,
    public_url: String,
}

impl LocalMediaStore {
    pub fn new(config: LocalMediaConfig) -> Self {
        Self {
            dir: config.dir,
            public_url: config.public_url.trim_end_matches('/').to_owned(),
        }
    }

    fn key_of<'a>(&self, url: &'a str) -> Option<&'a str> {
        let key = url.strip_prefix(&self.public_url)?.strip_prefix('/')?;
        if key.is_empty() || key.contains('/') || key.contains("..") {
            return None;
        }
        Some(key)
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(&self, file: &FilePart) -> Result<StoredMedia, MediaError> {
        if file.data.is_empty() {
            return Err(MediaError::EmptyFile(file.file_name.clone()));
        }
        let mut key = public_id_for(&file.file_name);
        if let Some(ext) = extension(&file.file_name) {
            key = format!("{}.{}", key, ext);
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&key), &file.data).await?;
        Ok(StoredMedia {
            url: format!("{}/{}", self.public_url, key),
        })
    }

    async fn delete(&self, url: &str) -> Result<(), MediaError> {
        let key = self
            .key_of(url)
            .ok_or_else(|| MediaError::ForeignUrl(url.to_owned()))?;
        match tokio::fs::remove_file(self.dir.join(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bytes::Bytes;

    fn store(dir: &tempfile::TempDir) -> LocalMediaStore {
        LocalMediaStore::new(LocalMediaConfig {
            dir: dir.path().to_owned(),
            public_url: "http://media.test/files/".to_owned(),
        })
    }

    fn png(data: &'static [u8]) -> FilePart {
        FilePart {
            field_name: "avatar".to_owned(),
            file_name: "me.PNG".to_owned(),
            content_type: Some("image/png".to_owned()),
            data: Bytes::from_static(data),
        }
    }

    #[tokio::test]
    async fn test_upload_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let stored = store.upload(&png(b"PNG")).await.unwrap();
        assert!(stored.url.starts_with("http://media.test/files/image-me-"));
        assert!(stored.url.ends_with(".png"));

        let key = stored.url.rsplit('/').next().unwrap();
        assert_eq!(std::fs::read(dir.path().join(key)).unwrap(), b"PNG");

        store.delete(&stored.url).await.unwrap();
        assert!(!dir.path().join(key).exists());
        // Already gone.
        store.delete(&stored.url).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        assert!(matches!(
            store.upload(&png(b"")).await,
            Err(MediaError::EmptyFile(_))
        ));
        for url in [
            "http://elsewhere.test/files/a.png",
            "http://media.test/files/../secret",
            "http://media.test/files/sub/a.png",
        ] {
            assert!(matches!(
                store.delete(url).await,
                Err(MediaError::ForeignUrl(_))
            ));
        }
    }
}
