//! Request shapes and response decoding of the individual operations.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use zarafa_client::message::NamedProp;
use zarafa_client::{
    Client, Config, EntryId, Error, ErrorCode, LogonFlags, SessionId, SsoType,
};

use crate::helper::ServerState;

fn client_for(uri: String) -> Arc<Client> {
    let config = Config {
        server_uri: uri,
        ..Default::default()
    };
    Arc::new(Client::new(config).expect("Failed to build client"))
}

/// Assert that `needles` appear in `haystack` in the given order.
fn assert_ordered(haystack: &str, needles: &[&str]) {
    let mut offset = 0;
    for needle in needles {
        match haystack[offset..].find(needle) {
            Some(position) => offset += position + needle.len(),
            None => panic!("expected {needle:?} after offset {offset} in {haystack:?}"),
        }
    }
}

#[tokio::test]
async fn logon_request_has_the_fixed_shape() {
    let state = ServerState::new();
    let uri = helper::spawn_http_server(state.clone()).await;
    let client = client_for(uri);

    let response = client
        .logon("bert<&>", "secret", LogonFlags::NO_REGISTER_SESSION)
        .await
        .expect("Logon should succeed");
    assert_eq!(response.er, ErrorCode::NONE);
    assert_eq!(response.session_id, SessionId(helper::SESSION_ID));

    let requests = state.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];

    // The envelope and the element order are fixed; metacharacters in
    // arguments must arrive escaped.
    assert!(request.contains("urn:zarafa"));
    assert_ordered(
        request,
        &[
            "<ns:logon>",
            "<szUsername>bert&lt;&amp;&gt;</szUsername>",
            "<szPassword>secret</szPassword>",
            "<szImpersonateUser/>",
            "<ulCapabilities>848</ulCapabilities>",
            "<ulFlags>2</ulFlags>",
            "<szClientApp>",
            "<szClientAppVersion>",
            "<clientVersion>",
            "</ns:logon>",
        ],
    );
}

#[tokio::test]
async fn client_app_identification_is_set_once() {
    let state = ServerState::new();
    let uri = helper::spawn_http_server(state.clone()).await;
    let client = client_for(uri);

    client
        .set_client_app("test-app", "1.0")
        .expect("First set should succeed");
    let second = client.set_client_app("other", "2.0");
    assert!(matches!(second, Err(Error::InvalidUsage(_))));

    client
        .logon("user1", "pass", LogonFlags::default())
        .await
        .expect("Logon should succeed");

    let requests = state.requests();
    assert!(requests[0].contains("<szClientApp>test-app</szClientApp>"));
    assert!(requests[0].contains("<szClientAppVersion>1.0</szClientAppVersion>"));
}

#[tokio::test]
async fn sso_logon_rejects_flags_without_a_network_call() {
    let state = ServerState::new();
    let uri = helper::spawn_http_server(state.clone()).await;
    let client = client_for(uri);

    let result = client
        .sso_logon(
            SsoType::Kcoidc,
            "user1",
            b"token",
            SessionId::NONE,
            LogonFlags::NO_REGISTER_SESSION,
        )
        .await;

    assert!(matches!(result, Err(Error::InvalidUsage(_))));
    assert!(state.requests().is_empty());
}

#[tokio::test]
async fn sso_logon_sends_the_tagged_credential() {
    let state = ServerState::new();
    let uri = helper::spawn_http_server(state.clone()).await;
    let client = client_for(uri);

    let response = client
        .sso_logon(
            SsoType::Kcoidc,
            "user1",
            b"token",
            SessionId::NONE,
            LogonFlags::default(),
        )
        .await
        .expect("SSO logon should succeed");
    assert_eq!(response.session_id, SessionId(helper::SESSION_ID));

    let requests = state.requests();
    // base64("KCOIDC" + "token")
    assert!(requests[0].contains("<lpInput>S0NPSURDdG9rZW4=</lpInput>"));
    assert_ordered(
        &requests[0],
        &[
            "<ns:ssoLogon>",
            "<szUsername>",
            "<lpInput>",
            "<szImpersonateUser/>",
            "<ulCapabilities>",
            "<szClientApp>",
            "<clientVersion>",
            "<ulSessionId>0</ulSessionId>",
            "</ns:ssoLogon>",
        ],
    );
}

#[tokio::test]
async fn logoff_sends_the_session_id() {
    let state = ServerState::new();
    let uri = helper::spawn_http_server(state.clone()).await;
    let client = client_for(uri);

    let response = client
        .logoff(SessionId(helper::SESSION_ID))
        .await
        .expect("Logoff should succeed");
    assert_eq!(response.er, ErrorCode::NONE);

    let requests = state.requests();
    assert!(requests[0].contains("<ns:logoff><ulSessionId>12345</ulSessionId></ns:logoff>"));
}

#[tokio::test]
async fn resolve_username_yields_a_decodable_entry_id() {
    let state = ServerState::new();
    let uri = helper::spawn_http_server(state.clone()).await;
    let client = client_for(uri);

    let response = client
        .resolve_username("SYSTEM", SessionId(helper::SESSION_ID))
        .await
        .expect("Resolve should succeed");
    assert_eq!(response.er, ErrorCode::NONE);
    assert_eq!(response.user_id, 2);

    let entry_id = EntryId::from_hex(&response.user_entry_id)
        .expect("The returned entry ID should decode");
    assert_eq!(entry_id.id(), 4);
}

#[tokio::test]
async fn get_user_decodes_the_user_payload() {
    let state = ServerState::new();
    let uri = helper::spawn_http_server(state.clone()).await;
    let client = client_for(uri);

    // An empty entry ID addresses the session's own user.
    let response = client
        .get_user("", SessionId(helper::SESSION_ID))
        .await
        .expect("GetUser should succeed");
    let user = response.user.expect("Response should carry a user");
    assert_eq!(user.username, "user1");
    assert_eq!(user.mail_address, "user1@example.net");
    let prop_map = user.prop_map.expect("User should carry a prop map");
    assert_eq!(prop_map.items[0].prop_id, 26490);

    let requests = state.requests();
    assert!(requests[0].contains("<sUserId></sUserId>"));
}

#[tokio::test]
async fn resolve_names_round_trip() {
    let state = ServerState::new();
    let uri = helper::spawn_http_server(state.clone()).await;
    let client = client_for(uri);

    let rows = vec![vec![NamedProp {
        prop_tag: 805_371_935,
        value: "user1".to_string(),
    }]];
    let response = client
        .resolve_names(
            &[805_371_935, 235_274_242],
            &rows,
            &[0],
            0,
            SessionId(helper::SESSION_ID),
        )
        .await
        .expect("ResolveNames should succeed");

    assert_eq!(response.er, ErrorCode::NONE);
    assert_eq!(response.row_set.rows.len(), 1);
    let row = &response.row_set.rows[0];
    assert_eq!(row.props[0].text.as_deref(), Some("user1"));
    assert_eq!(row.props[1].unsigned, Some(2));
    assert_eq!(response.flags.items, vec![0]);

    let requests = state.requests();
    assert_ordered(
        &requests[0],
        &[
            "<ns:abResolveNames>",
            "<ulSessionId>12345</ulSessionId>",
            "<lpaPropTag><item>805371935</item><item>235274242</item></lpaPropTag>",
            "<lpsRowSet><item><item><ulPropTag>805371935</ulPropTag><lpszA>user1</lpszA></item></item></lpsRowSet>",
            "<lpaFlags><item>0</item></lpaFlags>",
            "<ulFlags>0</ulFlags>",
            "</ns:abResolveNames>",
        ],
    );
}

#[tokio::test]
async fn non_success_http_status_is_a_transport_error() {
    let state = ServerState::new();
    state.http_status.store(503, Ordering::SeqCst);
    let uri = helper::spawn_http_server(state.clone()).await;
    let client = client_for(uri);

    let result = client.logon("user1", "pass", LogonFlags::default()).await;
    assert!(matches!(result, Err(Error::UnexpectedStatus(503))));
}

#[tokio::test]
async fn plain_http_transport_rejects_client_auth() {
    let state = ServerState::new();
    let uri = helper::spawn_http_server(state.clone()).await;
    let client = client_for(uri);

    let generated = rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
        .expect("Failed to generate certificate");
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let cert_path = dir.path().join("client.crt");
    let key_path = dir.path().join("client.key");
    std::fs::write(&cert_path, generated.cert.pem()).expect("Failed to write cert");
    std::fs::write(&key_path, generated.key_pair.serialize_pem()).expect("Failed to write key");

    let auth =
        zarafa_client::load_client_auth(&cert_path, &key_path).expect("Pair should load");
    let result = client.set_client_auth(auth);
    assert!(matches!(result, Err(Error::InvalidUsage(_))));
}

#[test]
fn unsupported_scheme_is_rejected() {
    let config = Config {
        server_uri: "ftp://127.0.0.1:21".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        Client::new(config),
        Err(Error::UnsupportedScheme(scheme)) if scheme == "ftp"
    ));

    let config = Config {
        server_uri: "not a uri at all".to_string(),
        ..Default::default()
    };
    assert!(matches!(Client::new(config), Err(Error::InvalidUri(_))));
}
