//! Remote storage for uploaded images.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use nails::multipart::FilePart;
use rand::RngCore;

pub mod cloudinary;
pub mod local;

pub use self::cloudinary::CloudinaryStore;
pub use self::local::LocalMediaStore;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("empty file `{0}`")]
    EmptyFile(String),
    #[error("not a url of this media store: {0}")]
    ForeignUrl(String),
    #[error("media backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    pub url: String,
}

#[async_trait]
pub trait MediaStore: fmt::Debug + Send + Sync {
    async fn upload(&self, file: &FilePart) -> Result<StoredMedia, MediaError>;
    async fn delete(&self, url: &str) -> Result<(), MediaError>;
}

pub type SharedMediaStore = Arc<dyn MediaStore>;

/// Uploads every file in order. If one fails, the ones already stored are removed again.
pub async fn upload_all(store: &dyn MediaStore, files: &[FilePart]) -> Result<Vec<String>, MediaError> {
    let mut urls = Vec::with_capacity(files.len());
    for file in files {
        match store.upload(file).await {
            Ok(stored) => urls.push(stored.url),
            Err(e) => {
                delete_all_logged(store, &urls).await;
                return Err(e);
            }
        }
    }
    Ok(urls)
}

/// Deletes stored media whose owning rows are gone. Failures only leave orphans, so they are logged.
pub async fn delete_all_logged(store: &dyn MediaStore, urls: &[String]) {
    for url in urls {
        if let Err(e) = store.delete(url).await {
            tracing::warn!(%url, error = %e, "failed to delete media");
        }
    }
}

/// `image-<file stem>-<24 hex chars>`, restricted to characters safe in URLs.
pub fn public_id_for(file_name: &str) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    };
    let stem: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(64)
        .collect();
    let mut uid = [0u8; 12];
    rand::thread_rng().fill_bytes(&mut uid);
    format!("image-{}-{}", stem, hex::encode(uid))
}

/// Lowercase extension of a file name, if it looks like one.
pub fn extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use bytes::Bytes;

    #[test]
    fn test_public_id_for() {
        let id = public_id_for("my pasta.png");
        assert!(id.starts_with("image-my_pasta-"), "{}", id);
        assert_eq!(id.len(), "image-my_pasta-".len() + 24);
        assert_ne!(public_id_for("a.png"), public_id_for("a.png"));
        assert!(public_id_for(".hidden").starts_with("image-_hidden-"));
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("a.PNG").as_deref(), Some("png"));
        assert_eq!(extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension("noext"), None);
        assert_eq!(extension(".bashrc"), None);
        assert_eq!(extension("x.p/ng"), None);
    }

    #[derive(Debug, Default)]
    struct FlakyStore {
        fail_on: Option<String>,
        deleted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MediaStore for FlakyStore {
        async fn upload(&self, file: &FilePart) -> Result<StoredMedia, MediaError> {
            if self.fail_on.as_deref() == Some(file.file_name.as_str()) {
                return Err(MediaError::EmptyFile(file.file_name.clone()));
            }
            Ok(StoredMedia {
                url: format!("mem://{}", file.file_name),
            })
        }
        async fn delete(&self, url: &str) -> Result<(), MediaError> {
            self.deleted.lock().unwrap().push(url.to_owned());
            Ok(())
        }
    }

    fn file(name: &str) -> FilePart {
        FilePart {
            field_name: "images".to_owned(),
            file_name: name.to_owned(),
            content_type: Some("image/png".to_owned()),
            data: Bytes::from_static(b"png"),
        }
    }

    #[tokio::test]
    async fn test_upload_all_rolls_back() {
        let store = FlakyStore {
            fail_on: Some("c.png".to_owned()),
            ..Default::default()
        };
        let files = vec![file("a.png"), file("b.png"), file("c.png")];
        assert!(upload_all(&store, &files).await.is_err());
        assert_eq!(
            *store.deleted.lock().unwrap(),
            vec!["mem://a.png".to_owned(), "mem://b.png".to_owned()]
        );

        let store = FlakyStore::default();
        let urls = upload_all(&store, &files).await.unwrap();
        assert_eq!(urls.len(), 3);
        assert!(store.deleted.lock().unwrap().is_empty());
    }
}
