//! Retry-once behavior of the connection provider.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use keyplane::database::{ConnectParams, ConnectionProvider, DatabaseConnector, DbTarget};
use keyplane::errors::Error;
use keyplane::secrets::{Result as SecretsResult, SecretCache, SecretStore};

struct CountingStore {
    payloads: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl CountingStore {
    fn new(payloads: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            payloads: Mutex::new(payloads.iter().map(|p| p.to_string()).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for CountingStore {
    async fn fetch(&self, _secret_id: &str, _region: &str) -> SecretsResult<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.payloads.lock().unwrap().pop_front())
    }
}

/// Connection handle recording which credentials opened it.
#[derive(Debug)]
struct StubConn {
    user: String,
    password: String,
}

/// Connector stub replaying scripted connect outcomes.
struct StubConnector {
    outcomes: Mutex<VecDeque<Result<(), sqlx::Error>>>,
    attempts: AtomicUsize,
    closes: AtomicUsize,
}

impl StubConnector {
    fn new(outcomes: Vec<Result<(), sqlx::Error>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            attempts: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        }
    }

    fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

fn auth_failure() -> sqlx::Error {
    sqlx::Error::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "password authentication failed",
    ))
}

#[async_trait]
impl DatabaseConnector for StubConnector {
    type Connection = StubConn;

    async fn connect(&self, params: &ConnectParams) -> Result<StubConn, sqlx::Error> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .expect("stub connector exhausted")
            .map(|_| StubConn {
                user: params.user.clone(),
                password: params.password.expose_secret().to_string(),
            })
    }

    async fn close(&self, _conn: StubConn) -> Result<(), sqlx::Error> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn target() -> DbTarget {
    DbTarget {
        host: "db.example.com".to_string(),
        port: 5432,
        database: "appdb".to_string(),
        secret_id: "db/creds".to_string(),
        region: "us-west-2".to_string(),
    }
}

fn provider(
    store: &Arc<CountingStore>,
    connector: StubConnector,
) -> ConnectionProvider<StubConnector> {
    let cache = Arc::new(SecretCache::new(store.clone(), Duration::from_secs(300)));
    ConnectionProvider::new(cache, connector)
}

#[tokio::test]
async fn operational_failure_retries_once_with_fresh_credentials() {
    let store = CountingStore::new(&[
        r#"{"username":"app","password":"stale"}"#,
        r#"{"username":"app","password":"rotated"}"#,
    ]);
    let provider = provider(&store, StubConnector::new(vec![Err(auth_failure()), Ok(())]));

    let conn = provider.connect(&target()).await.unwrap();

    assert_eq!(conn.user, "app");
    assert_eq!(conn.password, "rotated");
    assert_eq!(store.calls(), 2);
}

#[tokio::test]
async fn second_failure_propagates_without_a_third_attempt() {
    let store = CountingStore::new(&[
        r#"{"username":"app","password":"stale"}"#,
        r#"{"username":"app","password":"still-stale"}"#,
    ]);
    let connector = StubConnector::new(vec![Err(auth_failure()), Err(auth_failure())]);
    let provider = provider(&store, connector);

    let err = provider.connect(&target()).await.unwrap_err();

    assert!(matches!(err, Error::Database { .. }));
    assert_eq!(store.calls(), 2);
    assert_eq!(provider.connector().attempts(), 2);
}

#[tokio::test]
async fn non_operational_failure_is_terminal() {
    let store = CountingStore::new(&[r#"{"username":"app","password":"fine"}"#]);
    let provider = provider(&store, StubConnector::new(vec![Err(sqlx::Error::RowNotFound)]));

    let err = provider.connect(&target()).await.unwrap_err();

    assert!(matches!(err, Error::Database { .. }));
    assert_eq!(store.calls(), 1);
    assert_eq!(provider.connector().attempts(), 1);
}

#[tokio::test]
async fn with_connection_closes_on_success() {
    let store = CountingStore::new(&[r#"{"username":"app","password":"fine"}"#]);
    let provider = provider(&store, StubConnector::new(vec![Ok(())]));

    let user = provider
        .with_connection(&target(), |conn| {
            async move { Ok(conn.user.clone()) }.boxed()
        })
        .await
        .unwrap();

    assert_eq!(user, "app");
    assert_eq!(provider.connector().closes(), 1);
}

#[tokio::test]
async fn with_connection_closes_when_the_closure_fails() {
    let store = CountingStore::new(&[r#"{"username":"app","password":"fine"}"#]);
    let provider = provider(&store, StubConnector::new(vec![Ok(())]));

    let result: Result<(), Error> = provider
        .with_connection(&target(), |_conn| {
            async move { Err(Error::internal("query blew up")) }.boxed()
        })
        .await;

    assert!(result.is_err());
    assert_eq!(provider.connector().closes(), 1);
}
