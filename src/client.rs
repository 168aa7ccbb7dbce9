//! The client base object exposing the protocol operations.
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::Error;
use crate::flags::{Capabilities, LogonFlags};
use crate::message::{
    GetUserResponse, LogoffResponse, LogonResponse, NamedProp, ResolveNamesResponse,
    ResolveUserResponse, SessionId,
};
use crate::soap::envelope::decode_body;
use crate::soap::request::OperationRequest;
use crate::soap::transport::{HttpTransport, Transport, UnixSocketTransport};
use crate::sso::SsoType;
use crate::tls::ClientAuth;

struct ClientApp {
    name: String,
    version: String,
}

/// The client base object. It owns the transport towards one server and is
/// shared by any number of sessions.
///
/// ```no_run
/// use zarafa_client::{Client, Config, LogonFlags};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), zarafa_client::Error> {
/// let client = Client::new(Config::default())?;
/// let response = client
///     .logon("user1", "secret", LogonFlags::default())
///     .await?;
/// println!("session: {}", response.session_id);
/// # Ok(())
/// # }
/// ```
pub struct Client {
    uri: Url,
    transport: Box<dyn Transport>,
    capabilities: Capabilities,
    client_app: OnceLock<ClientApp>,
    config: Config,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("uri", &self.uri.as_str())
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

impl Client {
    /// Create a client for the server URI in the given configuration.
    pub fn new(config: Config) -> Result<Client, Error> {
        let uri = Url::parse(&config.server_uri)
            .map_err(|err| Error::InvalidUri(format!("{}: {err}", config.server_uri)))?;
        Client::with_uri(uri, config)
    }

    /// Create a client for an explicit URI, overriding the configured one.
    /// The transport is picked by the URI scheme: `http`/`https` use the
    /// pooled HTTP transport, `file` the unix socket transport.
    pub fn with_uri(uri: Url, config: Config) -> Result<Client, Error> {
        let transport: Box<dyn Transport> = match uri.scheme() {
            "http" | "https" => Box::new(HttpTransport::new(uri.clone(), &config)?),
            "file" => Box::new(UnixSocketTransport::new(PathBuf::from(uri.path()), &config)),
            scheme => return Err(Error::UnsupportedScheme(scheme.to_string())),
        };

        Ok(Client {
            uri,
            transport,
            capabilities: Capabilities::DEFAULT,
            client_app: OnceLock::new(),
            config,
        })
    }

    /// Replace the advertised capability set. Only meaningful before the
    /// first logon.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Client {
        self.capabilities = capabilities;
        self
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Set the application name and version sent with logon requests.
    /// May only be set once.
    pub fn set_client_app(&self, name: &str, version: &str) -> Result<(), Error> {
        self.client_app
            .set(ClientApp {
                name: name.to_string(),
                version: version.to_string(),
            })
            .map_err(|_| {
                Error::InvalidUsage("client app identification may only be set once".to_string())
            })
    }

    /// Attach a mutual-TLS client certificate to the transport. Fails with a
    /// usage error unless the transport is HTTPS.
    pub fn set_client_auth(&self, auth: ClientAuth) -> Result<(), Error> {
        self.transport.set_client_auth(auth)
    }

    fn client_app(&self) -> (&str, &str) {
        match self.client_app.get() {
            Some(app) => (&app.name, &app.version),
            None => (env!("CARGO_PKG_NAME"), crate::VERSION),
        }
    }

    async fn roundtrip<T: DeserializeOwned>(&self, payload: String) -> Result<T, Error> {
        let response = self.transport.send(&payload).await?;
        decode_body(&response)
    }

    /// Create a session with the provided credentials.
    ///
    /// A non-success error code in the response is returned as part of the
    /// typed result, not as an `Err`.
    pub async fn logon(
        &self,
        username: &str,
        password: &str,
        flags: LogonFlags,
    ) -> Result<LogonResponse, Error> {
        let (app_name, app_version) = self.client_app();
        let payload = OperationRequest::new("logon")
            .text("szUsername", username)
            .text("szPassword", password)
            .empty("szImpersonateUser")
            .uint("ulCapabilities", self.capabilities.0)
            .uint("ulFlags", flags.0)
            .text("szClientApp", app_name)
            .text("szClientAppVersion", app_version)
            .text("clientVersion", crate::CLIENT_VERSION)
            .finish();

        self.roundtrip(payload).await
    }

    /// Create a session via single sign-on. The opaque credential is
    /// prefixed with the mechanism's type tag and base64 encoded into the
    /// request.
    ///
    /// The operation has no flag field; passing non-empty flags is a usage
    /// error and no request is sent.
    pub async fn sso_logon(
        &self,
        sso_type: SsoType,
        username: &str,
        input: &[u8],
        session_id: SessionId,
        flags: LogonFlags,
    ) -> Result<LogonResponse, Error> {
        if !flags.is_empty() {
            return Err(Error::InvalidUsage(
                "SSO logon carries no flag field, flags must be empty".to_string(),
            ));
        }

        let (app_name, app_version) = self.client_app();
        let credential = BASE64.encode(sso_type.tagged_input(input));
        let payload = OperationRequest::new("ssoLogon")
            .text("szUsername", username)
            .text("lpInput", &credential)
            .empty("szImpersonateUser")
            .uint("ulCapabilities", self.capabilities.0)
            .text("szClientApp", app_name)
            .text("szClientAppVersion", app_version)
            .text("clientVersion", crate::CLIENT_VERSION)
            .uint("ulSessionId", session_id.0)
            .finish();

        self.roundtrip(payload).await
    }

    /// Terminate the provided session on the server.
    pub async fn logoff(&self, session_id: SessionId) -> Result<LogoffResponse, Error> {
        let payload = OperationRequest::new("logoff")
            .uint("ulSessionId", session_id.0)
            .finish();

        self.roundtrip(payload).await
    }

    /// Look up the user ID and entry ID of the provided username.
    pub async fn resolve_username(
        &self,
        username: &str,
        session_id: SessionId,
    ) -> Result<ResolveUserResponse, Error> {
        let payload = OperationRequest::new("resolveUsername")
            .text("lpszUsername", username)
            .uint("ulSessionId", session_id.0)
            .finish();

        self.roundtrip(payload).await
    }

    /// Fetch a user's detail meta data by entry ID. An empty entry ID
    /// returns the data of the session's own user.
    pub async fn get_user(
        &self,
        user_entry_id: &str,
        session_id: SessionId,
    ) -> Result<GetUserResponse, Error> {
        let payload = OperationRequest::new("getUser")
            .text("sUserId", user_entry_id)
            .uint("ulSessionId", session_id.0)
            .finish();

        self.roundtrip(payload).await
    }

    /// Resolve address-book names. Each input row holds the known property
    /// values of one name to resolve; the requested property tags and
    /// per-row flags are passed alongside.
    pub async fn resolve_names(
        &self,
        prop_tags: &[u32],
        rows: &[Vec<NamedProp>],
        row_flags: &[u32],
        flags: u64,
        session_id: SessionId,
    ) -> Result<ResolveNamesResponse, Error> {
        let mut request = OperationRequest::new("abResolveNames")
            .uint("ulSessionId", session_id.0)
            .begin("lpaPropTag");
        for tag in prop_tags {
            request = request.uint("item", u64::from(*tag));
        }

        request = request.end("lpaPropTag").begin("lpsRowSet");
        for row in rows {
            request = request.begin("item");
            for prop in row {
                request = request
                    .begin("item")
                    .uint("ulPropTag", u64::from(prop.prop_tag))
                    .text("lpszA", &prop.value)
                    .end("item");
            }
            request = request.end("item");
        }

        request = request.end("lpsRowSet").begin("lpaFlags");
        for flag in row_flags {
            request = request.uint("item", u64::from(*flag));
        }
        let payload = request.end("lpaFlags").uint("ulFlags", flags).finish();

        self.roundtrip(payload).await
    }
}
