//! Application contexts and narrowed views of them.
//!
//! A handler receives the whole application context, but the components it
//! calls should only see what they need. `AsContext<U>` hands out such a view,
//! either borrowed from a field or assembled on the fly.

use std::borrow::Cow;

/// A cheaply clonable bundle of shared resources.
pub trait Context: std::fmt::Debug + Clone {}

pub trait AsContext<U: Context>: Context {
    fn as_context(&self) -> Cow<'_, U>;
}

impl<T: Context> AsContext<T> for T {
    fn as_context(&self) -> Cow<'_, T> {
        Cow::Borrowed(self)
    }
}

/// Turbofish-friendly access to `AsContext`.
pub trait ContextExt: Context {
    fn narrow<U: Context>(&self) -> Cow<'_, U>
    where
        Self: AsContext<U>,
    {
        self.as_context()
    }
}

impl<T: Context> ContextExt for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Keys {
        secret: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Store {
        root: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Uploads {
        store: Store,
        limit: usize,
    }

    #[derive(Debug, Clone)]
    struct App {
        keys: Keys,
        store: Store,
        upload_limit: usize,
    }

    impl Context for Keys {}
    impl Context for Store {}
    impl Context for Uploads {}
    impl Context for App {}

    impl AsContext<Keys> for App {
        fn as_context(&self) -> Cow<'_, Keys> {
            Cow::Borrowed(&self.keys)
        }
    }

    impl AsContext<Uploads> for App {
        fn as_context(&self) -> Cow<'_, Uploads> {
            Cow::Owned(Uploads {
                store: self.store.clone(),
                limit: self.upload_limit,
            })
        }
    }

    fn app() -> App {
        App {
            keys: Keys {
                secret: "s3cret".to_owned(),
            },
            store: Store {
                root: "/tmp/media".to_owned(),
            },
            upload_limit: 3,
        }
    }

    fn secret_len<C: AsContext<Keys>>(ctx: &C) -> usize {
        ctx.as_context().secret.len()
    }

    #[test]
    fn test_borrowed_view() {
        let app = app();
        let keys = app.narrow::<Keys>();
        assert!(matches!(keys, Cow::Borrowed(_)));
        assert_eq!(keys.secret, "s3cret");
        assert_eq!(secret_len(&app), 6);
    }

    #[test]
    fn test_assembled_view() {
        let app = app();
        let uploads = app.narrow::<Uploads>();
        assert!(matches!(uploads, Cow::Owned(_)));
        assert_eq!(uploads.store.root, "/tmp/media");
        assert_eq!(uploads.limit, 3);
    }

    #[test]
    fn test_identity_view() {
        let keys = Keys {
            secret: "k".to_owned(),
        };
        assert_eq!(*keys.narrow::<Keys>(), keys);
        assert_eq!(secret_len(&keys), 1);
    }
}
