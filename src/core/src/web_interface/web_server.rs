use std::net::SocketAddr;
use std::sync::Arc;

use log::info;
use tokio::net::TcpListener;

use super::routes::all_routes;
use crate::error_handling::types::WebError;
use crate::recording::RecordingProxy;
use crate::token::TokenIssuer;

/// HTTP front of the token issuer and the recording proxy
pub struct WebServer {
    issuer: Arc<TokenIssuer>,
    proxy: Arc<RecordingProxy>,
    service_name: String,
}

impl WebServer {
    /// Create a new WebServer instance
    pub fn new(issuer: Arc<TokenIssuer>, proxy: Arc<RecordingProxy>, service_name: String) -> Self {
        Self {
            issuer,
            proxy,
            service_name,
        }
    }

    /// Serve on `addr` until Ctrl-C is received
    pub async fn start(&self, addr: SocketAddr) -> Result<(), WebError> {
        // warp panics when it cannot bind, so check the address first. The check
        // is released before warp binds, so a port taken in between still ends
        // in warp's bind panic rather than BindFailed.
        let check = TcpListener::bind(addr)
            .await
            .map_err(|e| WebError::BindFailed(format!("{}: {}", addr, e)))?;
        drop(check);

        let routes = all_routes(
            self.issuer.clone(),
            self.proxy.clone(),
            self.service_name.clone(),
        );

        info!("Listening on {}", addr);
        tokio::select! {
            _ = warp::serve(routes).run(addr) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, stopping web server");
            }
        }

        Ok(())
    }
}
