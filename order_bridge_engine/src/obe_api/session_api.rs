use std::{
    fmt::{Debug, Display},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use log::*;

use crate::{
    db::traits::{BridgeDatabase, ConnectionManagement},
    db_types::{ConnectionSession, NewConnectionSession},
    events::OrderListener,
    helpers::Secret,
    obe_api::{driver::AutomationDriver, errors::SessionError, ingestion_api::OrderIngestionApi},
};

/// The externally visible state of the automation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session is active and no order events are being listened for.
    Disconnected,
    /// A connect call is in progress.
    Connecting,
    /// A session is active, but order listening has not been started.
    Connected,
    /// Order events are being listened for.
    Listening,
}

impl Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "Disconnected"),
            SessionState::Connecting => write!(f, "Connecting"),
            SessionState::Connected => write!(f, "Connected"),
            SessionState::Listening => write!(f, "Listening"),
        }
    }
}

/// `SessionManager` owns the lifecycle of the (single) automation session.
///
/// It establishes and tears down sessions through the [`AutomationDriver`], keeps the connection store up to date,
/// holds the in-memory listening flag, and wires the order listener into the ingestion pipeline.
///
/// Only the `active` flag of a session is durable. The listening flag lives and dies with this instance, so a process
/// restart always begins in the "not listening" state.
pub struct SessionManager<B, D> {
    db: B,
    driver: D,
    ingestion: Arc<OrderIngestionApi<B>>,
    listening: AtomicBool,
    connects_in_flight: AtomicUsize,
}

impl<B, D> Debug for SessionManager<B, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionManager(listening: {})", self.is_listening())
    }
}

impl<B: Clone, D> SessionManager<B, D> {
    pub fn new(db: B, driver: D) -> Self {
        let ingestion = Arc::new(OrderIngestionApi::new(db.clone()));
        Self { db, driver, ingestion, listening: AtomicBool::new(false), connects_in_flight: AtomicUsize::new(0) }
    }
}

impl<B, D> SessionManager<B, D> {
    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The ingestion pipeline that the automation driver pushes raw order events into.
    pub fn ingestion(&self) -> Arc<OrderIngestionApi<B>> {
        Arc::clone(&self.ingestion)
    }

    /// Installs the listener for newly ingested orders. Any previously registered listener is replaced.
    pub fn register_order_listener(&self, listener: OrderListener) {
        if self.ingestion.register_listener(listener) {
            debug!("🔌️ Order listener replaced");
        } else {
            debug!("🔌️ Order listener registered");
        }
    }

    /// Moves into the listening state. Returns true if this call made the transition. Calling this while already
    /// listening does nothing.
    pub fn start_listening(&self) -> bool {
        let started = self.listening.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_ok();
        if started {
            info!("🔌️ Started order listening");
        } else {
            trace!("🔌️ Already listening for orders");
        }
        started
    }

    /// Leaves the listening state. Returns true if this call made the transition. Safe to call when already stopped.
    pub fn stop_listening(&self) -> bool {
        let stopped = self.listening.compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire).is_ok();
        if stopped {
            info!("🔌️ Stopped order listening");
        } else {
            trace!("🔌️ Order listening is already stopped");
        }
        stopped
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Acquire)
    }

    /// Teardown hook. Stops listening, whatever the current state is.
    pub fn shutdown(&self) {
        self.stop_listening();
        info!("🔌️ Session manager shut down");
    }
}

impl<B, D> SessionManager<B, D>
where
    B: BridgeDatabase,
    D: AutomationDriver,
{
    /// Logs `principal` into the partner portal and marks its session as the active one.
    ///
    /// The session record is created on the first connect and overwritten on later ones. Any other principal's active
    /// session is deactivated. If the driver rejects the login, [`SessionError::AuthenticationFailure`] is returned
    /// and the stored sessions are left untouched.
    ///
    /// Returns the session token produced by the driver.
    pub async fn connect(&self, principal: &str, credential_proof: &Secret<String>) -> Result<String, SessionError> {
        let _connecting = InFlight::enter(&self.connects_in_flight);
        debug!("🔌️ Connecting {principal}");
        let token = self.driver.establish_session(principal, credential_proof).await.map_err(|e| {
            warn!("🔌️ Login failed for {principal}. {e}");
            SessionError::AuthenticationFailure { principal: principal.to_string(), reason: e.to_string() }
        })?;
        let session =
            self.db.upsert(NewConnectionSession::activated(principal, token.as_str())).await.map_err(db_error)?;
        info!("🔌️ {principal} connected. Session activated at {}", session.activated_at);
        Ok(token)
    }

    /// Marks the session of `principal` as inactive. The record itself is kept.
    ///
    /// Returns [`SessionError::NotFound`] if `principal` has never connected.
    pub async fn disconnect(&self, principal: &str) -> Result<ConnectionSession, SessionError> {
        let session = self
            .db
            .find_by_principal(principal)
            .await
            .map_err(db_error)?
            .ok_or_else(|| SessionError::NotFound(principal.to_string()))?;
        let mut update = NewConnectionSession::from(session);
        update.active = false;
        let session = self.db.upsert(update).await.map_err(db_error)?;
        info!("🔌️ {principal} disconnected");
        Ok(session)
    }

    /// True if any stored session is active. This has no side effects.
    pub async fn is_active(&self) -> Result<bool, SessionError> {
        self.active_session().await.map(|s| s.is_some())
    }

    pub async fn active_session(&self) -> Result<Option<ConnectionSession>, SessionError> {
        self.db.find_active().await.map_err(db_error)
    }

    pub async fn session_for_principal(&self, principal: &str) -> Result<Option<ConnectionSession>, SessionError> {
        self.db.find_by_principal(principal).await.map_err(db_error)
    }

    /// Whether the driver holds a reusable browser session from an earlier login.
    pub fn has_existing_session(&self) -> bool {
        self.driver.has_existing_session()
    }

    pub async fn state(&self) -> Result<SessionState, SessionError> {
        if self.connects_in_flight.load(Ordering::Acquire) > 0 {
            return Ok(SessionState::Connecting);
        }
        if self.is_listening() {
            return Ok(SessionState::Listening);
        }
        match self.is_active().await? {
            true => Ok(SessionState::Connected),
            false => Ok(SessionState::Disconnected),
        }
    }
}

fn db_error<E: std::error::Error>(e: E) -> SessionError {
    error!("🔌️ Connection store error. {e}");
    SessionError::DatabaseError(e.to_string())
}

/// Counts a connect call as in flight for as long as it is alive.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use mockall::{mock, predicate::eq};

    use super::*;
    use crate::{
        db::traits::{InsertOrderResult, OrderManagement},
        db_types::{NewOrder, Order, OrderId},
        obe_api::driver::DriverError,
    };

    #[derive(Debug, Clone, thiserror::Error)]
    #[error("{0}")]
    pub struct MockErr(String);

    mock! {
        pub Driver {}
        impl AutomationDriver for Driver {
            async fn establish_session(&self, principal: &str, proof: &Secret<String>) -> Result<String, DriverError>;
            fn has_existing_session(&self) -> bool;
        }
    }

    mock! {
        pub Store {}
        impl Clone for Store {
            fn clone(&self) -> Self;
        }
        impl OrderManagement for Store {
            type Error = MockErr;
            async fn exists_by_external_id(&self, order_id: &OrderId) -> Result<bool, MockErr>;
            async fn find_by_external_id(&self, order_id: &OrderId) -> Result<Option<Order>, MockErr>;
            async fn insert_if_absent(&self, order_id: &OrderId, order: &NewOrder) -> Result<InsertOrderResult, MockErr>;
            async fn list_all_by_observed_at_desc(&self) -> Result<Vec<Order>, MockErr>;
            async fn count(&self) -> Result<i64, MockErr>;
        }
        impl ConnectionManagement for Store {
            type Error = MockErr;
            async fn find_by_principal(&self, principal: &str) -> Result<Option<ConnectionSession>, MockErr>;
            async fn find_active(&self) -> Result<Option<ConnectionSession>, MockErr>;
            async fn upsert(&self, session: NewConnectionSession) -> Result<ConnectionSession, MockErr>;
        }
        impl BridgeDatabase for Store {
            fn url(&self) -> &str;
        }
    }

    fn session_from(new: NewConnectionSession) -> ConnectionSession {
        ConnectionSession {
            id: 1,
            principal: new.principal,
            session_token: new.session_token,
            active: new.active,
            activated_at: new.activated_at,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn store() -> MockStore {
        let mut db = MockStore::new();
        db.expect_clone().returning(MockStore::new);
        db
    }

    fn password() -> Secret<String> {
        Secret::new("secret".to_string())
    }

    #[tokio::test]
    async fn connect_activates_the_session() {
        let mut driver = MockDriver::new();
        driver.expect_establish_session().returning(|_, _| Ok("session.json".to_string()));
        let mut db = store();
        db.expect_upsert()
            .withf(|s| s.principal == "alice" && s.session_token == "session.json" && s.active)
            .times(1)
            .returning(|s| Ok(session_from(s)));
        let manager = SessionManager::new(db, driver);
        let token = manager.connect("alice", &password()).await.unwrap();
        assert_eq!(token, "session.json");
    }

    #[tokio::test]
    async fn failed_login_leaves_the_store_alone() {
        let mut driver = MockDriver::new();
        driver
            .expect_establish_session()
            .returning(|_, _| Err(DriverError::LoginRejected("bad password".to_string())));
        let mut db = store();
        db.expect_upsert().never();
        let manager = SessionManager::new(db, driver);
        let err = manager.connect("alice", &password()).await.unwrap_err();
        match err {
            SessionError::AuthenticationFailure { principal, reason } => {
                assert_eq!(principal, "alice");
                assert!(reason.contains("bad password"));
            },
            e => panic!("Unexpected error: {e}"),
        }
    }

    #[tokio::test]
    async fn disconnect_unknown_principal() {
        let mut db = store();
        db.expect_find_by_principal().with(eq("unknown")).returning(|_| Ok(None));
        db.expect_upsert().never();
        let manager = SessionManager::new(db, MockDriver::new());
        let err = manager.disconnect("unknown").await.unwrap_err();
        assert_eq!(err, SessionError::NotFound("unknown".to_string()));
    }

    #[tokio::test]
    async fn disconnect_keeps_the_record() {
        let mut db = store();
        db.expect_find_by_principal()
            .returning(|p| Ok(Some(session_from(NewConnectionSession::activated(p, "session.json")))));
        db.expect_upsert()
            .withf(|s| s.principal == "alice" && s.session_token == "session.json" && !s.active)
            .times(1)
            .returning(|s| Ok(session_from(s)));
        let manager = SessionManager::new(db, MockDriver::new());
        let session = manager.disconnect("alice").await.unwrap();
        assert!(!session.active);
        assert_eq!(session.session_token, "session.json");
    }

    #[test]
    fn listening_is_idempotent() {
        let manager = SessionManager::new(store(), MockDriver::new());
        assert!(!manager.is_listening());
        assert!(manager.start_listening());
        assert!(!manager.start_listening());
        assert!(manager.is_listening());
        assert!(manager.stop_listening());
        assert!(!manager.stop_listening());
        assert!(!manager.is_listening());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_listening_transitions_happen_once() {
        let manager = Arc::new(SessionManager::new(store(), MockDriver::new()));
        let barrier = Arc::new(tokio::sync::Barrier::new(32));
        let handles = (0..32)
            .map(|_| {
                let manager = Arc::clone(&manager);
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move {
                    barrier.wait().await;
                    manager.start_listening()
                })
            })
            .collect::<Vec<_>>();
        let mut started = 0;
        for handle in handles {
            if handle.await.expect("Task panicked") {
                started += 1;
            }
        }
        assert_eq!(started, 1);
        assert!(manager.is_listening());

        let barrier = Arc::new(tokio::sync::Barrier::new(32));
        let handles = (0..32)
            .map(|_| {
                let manager = Arc::clone(&manager);
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move {
                    barrier.wait().await;
                    manager.stop_listening()
                })
            })
            .collect::<Vec<_>>();
        let mut stopped = 0;
        for handle in handles {
            if handle.await.expect("Task panicked") {
                stopped += 1;
            }
        }
        assert_eq!(stopped, 1);
        assert!(!manager.is_listening());
    }

    #[test]
    fn shutdown_stops_listening() {
        let manager = SessionManager::new(store(), MockDriver::new());
        manager.shutdown();
        assert!(!manager.is_listening());
        manager.start_listening();
        manager.shutdown();
        assert!(!manager.is_listening());
    }

    #[tokio::test]
    async fn state_transitions() {
        let mut db = store();
        let mut seq = mockall::Sequence::new();
        db.expect_find_active().times(1).in_sequence(&mut seq).returning(|| Ok(None));
        db.expect_find_active()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Some(session_from(NewConnectionSession::activated("alice", "s")))));
        let manager = SessionManager::new(db, MockDriver::new());
        assert_eq!(manager.state().await.unwrap(), SessionState::Disconnected);
        assert_eq!(manager.state().await.unwrap(), SessionState::Connected);
        manager.start_listening();
        assert_eq!(manager.state().await.unwrap(), SessionState::Listening);
    }

    #[test]
    fn existing_session_comes_from_the_driver() {
        let mut driver = MockDriver::new();
        driver.expect_has_existing_session().return_const(true);
        let manager = SessionManager::new(store(), driver);
        assert!(manager.has_existing_session());
    }
}
