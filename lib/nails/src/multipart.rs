//! `multipart/form-data` bodies.

use async_trait::async_trait;
use bytes::Bytes;
use hyper::Request;

use crate::error::{ContentTypeError, MultipartError, NailsError};
use crate::request::{content_type, essence, FromBody};

/// An uploaded file part.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field_name: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// A fully buffered multipart form: text fields and file parts in arrival order.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    texts: Vec<(String, String)>,
    files: Vec<FilePart>,
}

impl MultipartForm {
    /// First text value of a field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn texts<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.texts
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn file(&self, name: &str) -> Option<&FilePart> {
        self.files.iter().find(|f| f.field_name == name)
    }

    /// Removes and returns every file part of a field.
    pub fn take_files(&mut self, name: &str) -> Vec<FilePart> {
        let (taken, rest): (Vec<FilePart>, Vec<FilePart>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|f| f.field_name == name);
        self.files = rest;
        taken
    }

    pub fn take_file(&mut self, name: &str) -> Option<FilePart> {
        let index = self.files.iter().position(|f| f.field_name == name)?;
        Some(self.files.remove(index))
    }

    pub async fn parse(body: Bytes, boundary: &str) -> Result<Self, MultipartError> {
        let stream = futures::stream::once(async move { Ok::<_, std::io::Error>(body) });
        let mut multipart = multer::Multipart::new(stream, boundary);
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(MultipartError)? {
            let field_name = field.name().unwrap_or("").to_owned();
            match field.file_name().map(str::to_owned) {
                Some(file_name) => {
                    let content_type = field.content_type().map(|mime| mime.to_string());
                    let data = field.bytes().await.map_err(MultipartError)?;
                    form.files.push(FilePart {
                        field_name,
                        file_name,
                        content_type,
                        data,
                    });
                }
                None => {
                    let value = field.text().await.map_err(MultipartError)?;
                    form.texts.push((field_name, value));
                }
            }
        }
        Ok(form)
    }
}

#[async_trait]
impl FromBody for MultipartForm {
    async fn from_body(req: Request<Bytes>) -> Result<Self, NailsError> {
        let got = content_type(&req).map(str::to_owned);
        let boundary = got
            .as_deref()
            .filter(|ct| essence(ct) == "multipart/form-data")
            .map(multer::parse_boundary);
        let boundary = match boundary {
            Some(boundary) => boundary.map_err(MultipartError)?,
            None => {
                return Err(ContentTypeError {
                    expected: vec!["multipart/form-data".to_owned()],
                    got,
                }
                .into())
            }
        };
        Ok(Self::parse(req.into_body(), &boundary).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use hyper::header::CONTENT_TYPE;

    const BOUNDARY: &str = "X-NAILS-BOUNDARY";

    fn body() -> Bytes {
        let mut body = String::new();
        for (name, value) in [("title", "Pasta"), ("tag_names", "italian"), ("tag_names", "quick")] {
            body.push_str(&format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            ));
        }
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"a.png\"\r\nContent-Type: image/png\r\n\r\nPNGDATA\r\n",
            BOUNDARY
        ));
        body.push_str(&format!("--{}--\r\n", BOUNDARY));
        Bytes::from(body)
    }

    #[tokio::test]
    async fn test_parse_form() {
        let mut form = MultipartForm::parse(body(), BOUNDARY).await.unwrap();
        assert_eq!(form.text("title"), Some("Pasta"));
        assert_eq!(form.texts("tag_names").collect::<Vec<_>>(), vec!["italian", "quick"]);
        assert_eq!(form.text("missing"), None);
        let field = String::from("title");
        let title = form.text(&field);
        drop(field);
        assert_eq!(title, Some("Pasta"));
        assert_eq!(form.file("images").unwrap().file_name, "a.png");

        let files = form.take_files("images");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].content_type.as_deref(), Some("image/png"));
        assert_eq!(&files[0].data[..], b"PNGDATA");
        assert!(form.file("images").is_none());
    }

    #[tokio::test]
    async fn test_from_body_requires_multipart() {
        let req = Request::builder()
            .header(CONTENT_TYPE, "application/json")
            .body(Bytes::from_static(b"{}"))
            .unwrap();
        let err = MultipartForm::from_body(req).await.unwrap_err();
        assert!(matches!(err, NailsError::ContentTypeError(_)));

        let req = Request::builder()
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(body())
            .unwrap();
        let form = MultipartForm::from_body(req).await.unwrap();
        assert_eq!(form.text("title"), Some("Pasta"));
    }
}
