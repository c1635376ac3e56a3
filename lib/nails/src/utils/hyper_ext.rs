//! Serving a `Service` over TCP with hyper's HTTP/1 connection driver.

use std::future::Future;
use std::io;

use contextful::Context;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::Service;

/// Accepts connections until `shutdown` resolves, then lets in-flight
/// connections finish their current request before returning.
pub async fn serve<Ctx, F>(listener: TcpListener, service: Service<Ctx>, shutdown: F) -> io::Result<()>
where
    Ctx: Context + Send + Sync + 'static,
    F: Future<Output = ()>,
{
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut connections = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };
                let service = service.clone();
                let mut stop_rx = stop_rx.clone();
                connections.spawn(async move {
                    let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
                    tokio::pin!(conn);
                    let result = tokio::select! {
                        result = conn.as_mut() => result,
                        _ = stop_rx.changed() => {
                            conn.as_mut().graceful_shutdown();
                            conn.await
                        }
                    };
                    if let Err(e) = result {
                        tracing::debug!(%peer, error = %e, "connection closed with error");
                    }
                });
            }
            _ = &mut shutdown => break,
        }
        while connections.try_join_next().is_some() {}
    }

    drop(listener);
    tracing::info!(connections = connections.len(), "shutting down, draining connections");
    let _ = stop_tx.send(true);
    while connections.join_next().await.is_some() {}
    Ok(())
}
