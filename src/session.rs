//! Server sessions with automatic background refresh.
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::client::Client;
use crate::errcode::ErrorCode;
use crate::error::Error;
use crate::flags::LogonFlags;
use crate::internal_prelude::*;
use crate::message::{LogonResponse, SessionId};
use crate::sso::SsoType;

/// Options for session construction.
#[derive(Clone, Debug, Default)]
pub struct SessionOptions {
    /// Interval of the background refresh loop. Falls back to the client
    /// configuration when unset.
    pub refresh_interval: Option<Duration>,
    /// Governing lifetime. When the parent token is cancelled, for instance
    /// on application shutdown, the refresh loop stops and the session goes
    /// inactive without further network calls.
    pub parent: Option<CancellationToken>,
}

/// An authenticated session on the server.
///
/// A successful logon yields an active session whose dedicated background
/// task refreshes it on a fixed interval by issuing a self-lookup. Once a
/// session went inactive it never comes back; create a new one via a fresh
/// logon instead.
///
/// ```no_run
/// use std::sync::Arc;
/// use zarafa_client::{Client, Config, Session};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), zarafa_client::Error> {
/// let client = Arc::new(Client::new(Config::default())?);
/// let session = Session::connect(client, "user1", "secret").await?;
/// assert!(session.is_active());
/// session.destroy().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    server_guid: String,
    active: AtomicBool,
    token: CancellationToken,
    client: Arc<Client>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Log on with username and password and start the refresh loop.
    pub async fn connect(
        client: Arc<Client>,
        username: &str,
        password: &str,
    ) -> Result<Arc<Session>, Error> {
        Session::connect_with(client, username, password, SessionOptions::default()).await
    }

    /// [`Session::connect`] with explicit options.
    pub async fn connect_with(
        client: Arc<Client>,
        username: &str,
        password: &str,
        options: SessionOptions,
    ) -> Result<Arc<Session>, Error> {
        let response = client
            .logon(username, password, LogonFlags::default())
            .await?;
        Session::start(client, response, options).await
    }

    /// Log on via single sign-on and start the refresh loop.
    pub async fn connect_sso(
        client: Arc<Client>,
        sso_type: SsoType,
        username: &str,
        input: &[u8],
    ) -> Result<Arc<Session>, Error> {
        Session::connect_sso_with(client, sso_type, username, input, SessionOptions::default())
            .await
    }

    /// [`Session::connect_sso`] with explicit options.
    pub async fn connect_sso_with(
        client: Arc<Client>,
        sso_type: SsoType,
        username: &str,
        input: &[u8],
        options: SessionOptions,
    ) -> Result<Arc<Session>, Error> {
        let response = client
            .sso_logon(
                sso_type,
                username,
                input,
                SessionId::NONE,
                LogonFlags::default(),
            )
            .await?;
        Session::start(client, response, options).await
    }

    async fn start(
        client: Arc<Client>,
        response: LogonResponse,
        options: SessionOptions,
    ) -> Result<Arc<Session>, Error> {
        let (id, server_guid) = validate_logon(response)?;

        let token = match &options.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        let interval = options
            .refresh_interval
            .unwrap_or_else(|| client.config().session_refresh_interval());

        let session = Arc::new(Session {
            id,
            server_guid,
            active: AtomicBool::new(true),
            token,
            client,
            refresh_task: Mutex::new(None),
        });

        let handle = tokio::spawn(refresh_loop(session.clone(), interval));
        *session.refresh_task.lock().await = Some(handle);
        debug!("Created session {id}");

        Ok(session)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn server_guid(&self) -> &str {
        &self.server_guid
    }

    /// Whether the session is still alive. Stays `false` forever once the
    /// session was destroyed or a refresh failed.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// The session's lifetime token. Cancelled on destruction; clone it to
    /// tie dependent work to the session.
    pub fn lifetime(&self) -> &CancellationToken {
        &self.token
    }

    /// Log off at the server and stop the refresh loop.
    ///
    /// Destroying is idempotent and safe to race: the first caller to flip
    /// the liveness flag performs the logoff call, everyone else returns
    /// immediately.
    pub async fn destroy(&self) -> Result<(), Error> {
        if !self.active.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        self.token.cancel();
        debug!("Destroying session {}", self.id);

        let response = self.client.logoff(self.id).await?;
        if !response.er.is_success() {
            return Err(Error::ServerError(response.er));
        }

        Ok(())
    }

    /// Wait until the session is destroyed and its background task has
    /// stopped.
    pub async fn closed(&self) {
        self.token.cancelled().await;
        let handle = self.refresh_task.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    fn mark_inactive(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// A single refresh round trip: a lightweight self-lookup with this
    /// session's ID.
    async fn refresh(&self) -> Result<(), Error> {
        let response = self.client.resolve_username("SYSTEM", self.id).await?;
        if !response.er.is_success() {
            return Err(Error::ServerError(response.er));
        }

        Ok(())
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Session({})", self.id)
    }
}

fn validate_logon(response: LogonResponse) -> Result<(SessionId, String), Error> {
    if !response.er.is_success() {
        let err = response.er;
        return Err(
            if err == ErrorCode::LOGON_FAILED || err == ErrorCode::NO_ACCESS {
                Error::AuthenticationFailed(err)
            } else {
                Error::ServerError(err)
            },
        );
    }
    if response.session_id.is_none() {
        return Err(Error::InvalidLogonResponse("missing session ID"));
    }
    if response.server_guid.is_empty() {
        return Err(Error::InvalidLogonResponse("missing server GUID"));
    }

    Ok((response.session_id, response.server_guid))
}

/// The dedicated background task of one session.
///
/// Refreshes on every tick while the session is active and exits as soon as
/// the lifetime token is cancelled, aborting an in-flight refresh if there
/// is one. A failed refresh destroys the session; there are no retries.
async fn refresh_loop(session: Arc<Session>, interval: Duration) {
    loop {
        tokio::select! {
            _ = session.token.cancelled() => {
                session.mark_inactive();
                break;
            }
            _ = tokio::time::sleep(interval) => {}
        }

        if !session.is_active() {
            break;
        }

        tokio::select! {
            _ = session.token.cancelled() => {
                session.mark_inactive();
                break;
            }
            result = session.refresh() => {
                if let Err(err) = result {
                    warn!("Session {} refresh failed: {err}", session.id);
                    if let Err(err) = session.destroy().await {
                        debug!("Logoff of session {} after failed refresh returned: {err}", session.id);
                    }
                    break;
                }
            }
        }
    }

    trace!("Refresh loop of session {} stopped", session.id);
}
