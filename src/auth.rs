use anyhow::{Context, Result};
use google_gmail1::{hyper, hyper_rustls, oauth2};
use log::info;

use crate::config::Config;

pub type HttpsConnector = hyper_rustls::HttpsConnector<hyper::client::HttpConnector>;
pub type HttpClient = hyper::Client<HttpsConnector>;
pub type Authenticator = oauth2::authenticator::Authenticator<HttpsConnector>;

/// OAuth2 session shared by the Gmail and Sheets clients.
///
/// Tokens are cached in `token_cache_path` and refreshed by the authenticator
/// on demand; first use runs the installed-app consent flow.
#[derive(Clone)]
pub struct Session {
    client: HttpClient,
    auth: Authenticator,
}

impl Session {
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Opening Google OAuth2 session");

        let secret = oauth2::read_application_secret(&config.credentials_path)
            .await
            .with_context(|| format!("Unable to read OAuth2 client credentials file '{}'", config.credentials_path))?;

        let auth = oauth2::InstalledFlowAuthenticator::builder(
            secret,
            oauth2::InstalledFlowReturnMethod::HTTPRedirect,
        )
        .persist_tokens_to_disk(&config.token_cache_path)
        .build()
        .await
        .context("Unable to create OAuth2 authenticator")?;

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_or_http()
            .enable_http1()
            .build();

        let client = hyper::Client::builder().build(connector);

        Ok(Session { client, auth })
    }

    pub fn client(&self) -> HttpClient {
        self.client.clone()
    }

    pub fn authenticator(&self) -> Authenticator {
        self.auth.clone()
    }
}
