//! Streamable HTTP transport.
//!
//! Every accepted connection is served by hyper's HTTP/1 stack with the rmcp
//! streamable-HTTP service behind it.

use super::InsuranceServer;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(server: InsuranceServer, addr: SocketAddr, stateless: bool) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, stateless, "listening for streamable HTTP");
    serve_until(server, listener, stateless, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// In-flight connections keep running on their own tasks; only the accept
/// loop stops.
pub async fn serve_until<F>(
    server: InsuranceServer,
    listener: TcpListener,
    stateless: bool,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()>,
{
    let service = StreamableHttpService::new(
        move || Ok::<_, std::io::Error>(server.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig {
            stateful_mode: !stateless,
            ..Default::default()
        },
    );

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("shutting down HTTP listener");
                break;
            }
            accept = listener.accept() => {
                let (stream, peer) = match accept {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                        continue;
                    }
                };
                let service = TowerToHyperService::new(service.clone());
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    if let Err(e) = hyper::server::conn::http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        tracing::debug!(%peer, error = %e, "connection closed with error");
                    }
                });
            }
        }
    }
    Ok(())
}
