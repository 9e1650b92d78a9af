use crate::configuration::config::Config;
use crate::error_handling::types::*;
use crate::recording::{HttpRecordingApi, RecordingProxy, RetryPolicy};
use crate::token::{AccessTokenSigner, TokenIssuer};
use crate::web_interface::WebServer;
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;

/// Wires the configuration into the token issuer, the recording proxy and
/// the web server, then runs the server until shutdown.
pub struct Controller {
    pub config: Arc<Config>,
    server: WebServer,
}

impl Controller {
    pub fn new(config: Config) -> Result<Self, ControllerError> {
        info!("Initializing controller");

        let api = HttpRecordingApi::new(
            &config.api_base_url,
            &config.app.app_id,
            &config.customer,
            config.request_timeout,
        )
        .map_err(|e| {
            error!("Unable to build the recording API client: {}", e);
            ControllerError::RecordingError(e)
        })?;

        let retry = RetryPolicy {
            max_retries: config.max_retries,
            initial_backoff: config.retry_backoff,
        };
        let proxy = Arc::new(RecordingProxy::new(
            Arc::new(api),
            config.storage.clone(),
            retry,
        ));

        let issuer = Arc::new(TokenIssuer::new(
            config.app.clone(),
            Arc::new(AccessTokenSigner::new()),
            config.default_expiry_secs,
        ));

        let server = WebServer::new(issuer, proxy, config.service_name.clone());

        Ok(Self {
            config: Arc::new(config),
            server,
        })
    }

    pub fn address(&self) -> SocketAddr {
        SocketAddr::new(self.config.bind_address, self.config.port)
    }

    pub async fn run(&self) -> Result<(), ControllerError> {
        let addr = self.address();
        info!(
            "Starting {} on {} (recording API at {})",
            self.config.service_name, addr, self.config.api_base_url
        );
        self.server.start(addr).await?;
        info!("Controller stopped");
        Ok(())
    }
}
