#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use bytes::Bytes;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, TestCustomizer};
use diesel::Connection;
use diesel_migrations::MigrationHarness;
use http_body_util::BodyExt;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::{Method, Request, Response};
use nails::multipart::FilePart;
use nails::Body;

use culinary_review::config::LocalMediaConfig;
use culinary_review::db::{Db, MIGRATIONS};
use culinary_review::media::{LocalMediaStore, SharedMediaStore};
use culinary_review::tokens::TokenKeys;
use culinary_review::AppCtx;

pub const BOUNDARY: &str = "culinary-review-test-boundary";
pub const MEDIA_URL: &str = "http://media.test/files";

pub struct TestApp {
    pub ctx: AppCtx,
    pub media_dir: tempfile::TempDir,
}

fn keys() -> TokenKeys {
    TokenKeys::new("test-secret", Duration::from_secs(3600))
}

fn local_media() -> (SharedMediaStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalMediaStore::new(LocalMediaConfig {
        dir: dir.path().to_owned(),
        public_url: MEDIA_URL.to_owned(),
    });
    (Arc::new(store), dir)
}

/// A context whose pool never reaches a database. Good for paths that are
/// rejected before any query runs.
pub fn offline_app() -> TestApp {
    let db = Db::connect_lazy("postgres://nobody@127.0.0.1:1/nothing", 1);
    let (media, media_dir) = local_media();
    TestApp {
        ctx: AppCtx::from_parts(db, keys(), media),
        media_dir,
    }
}

/// A context on `TEST_DATABASE_URL` whose single connection sits inside a
/// transaction that is never committed. `None` when the variable is unset.
pub fn database_app() -> Option<TestApp> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("TEST_DATABASE_URL is not set; skipping database test");
            return None;
        }
    };
    static MIGRATE: Once = Once::new();
    MIGRATE.call_once(|| {
        let mut conn = PgConnection::establish(&url).unwrap();
        conn.run_pending_migrations(MIGRATIONS).unwrap();
    });
    let pool = Pool::builder()
        .max_size(1)
        .connection_customizer(Box::new(TestCustomizer))
        .build(ConnectionManager::<PgConnection>::new(url))
        .unwrap();
    let (media, media_dir) = local_media();
    Some(TestApp {
        ctx: AppCtx::from_parts(Db::from_pool(pool), keys(), media),
        media_dir,
    })
}

impl TestApp {
    pub async fn send(&self, req: Request<Bytes>) -> (u16, serde_json::Value) {
        let service = culinary_review::build_service(&self.ctx);
        let resp = service.handle(req).await;
        json(resp).await
    }

    pub fn bearer(&self, user_id: i64) -> String {
        format!("Bearer {}", self.ctx.tokens.issue(user_id).unwrap().token)
    }

    /// Number of files currently held by the local media store.
    pub fn stored_files(&self) -> usize {
        std::fs::read_dir(self.media_dir.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

pub async fn json(resp: Response<Body>) -> (u16, serde_json::Value) {
    let status = resp.status().as_u16();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

pub fn request(
    method: Method,
    path: &str,
    token: Option<&str>,
    content_type: Option<&str>,
    body: Bytes,
) -> Request<Bytes> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, token);
    }
    if let Some(content_type) = content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    builder.body(body).unwrap()
}

pub fn empty(method: Method, path: &str, token: Option<&str>) -> Request<Bytes> {
    request(method, path, token, None, Bytes::new())
}

pub fn json_request(
    method: Method,
    path: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Bytes> {
    request(
        method,
        path,
        token,
        Some("application/json"),
        Bytes::from(body.to_string()),
    )
}

pub fn multipart_request(
    method: Method,
    path: &str,
    token: Option<&str>,
    texts: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> Request<Bytes> {
    let mut body = Vec::new();
    for (name, value) in texts {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for (name, file_name, data) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/png\r\n\r\n",
                BOUNDARY, name, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    let content_type = format!("multipart/form-data; boundary={}", BOUNDARY);
    request(method, path, token, Some(&content_type), Bytes::from(body))
}

pub fn png(name: &str) -> FilePart {
    FilePart {
        field_name: "images".to_owned(),
        file_name: name.to_owned(),
        content_type: Some("image/png".to_owned()),
        data: Bytes::from_static(b"\x89PNG fake image"),
    }
}

/// A name no other test uses, so parallel test transactions never contend on unique indexes.
pub fn unique(prefix: &str) -> String {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    format!(
        "{}{}x{}x{}",
        prefix,
        std::process::id(),
        nanos,
        COUNTER.fetch_add(1, Ordering::SeqCst)
    )
}
