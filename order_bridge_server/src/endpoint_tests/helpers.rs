use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use log::debug;
use order_bridge_engine::{
    test_utils::prepare_env::{prepare_test_env, random_db_path, tear_down},
    SessionFileDriver,
    SessionManager,
    SqliteDatabase,
};

use crate::server::{configure_app, BridgeManager};

/// A fresh database and session manager for one test.
pub struct TestServer {
    pub db: SqliteDatabase,
    pub manager: web::Data<BridgeManager>,
}

impl TestServer {
    pub async fn new() -> Self {
        let db = prepare_test_env(&random_db_path()).await;
        let session_file = std::env::temp_dir().join(format!("obs_session_{}.json", rand::random::<u64>()));
        let driver = SessionFileDriver::new(session_file, "https://partners.example.com", true);
        let manager = web::Data::new(SessionManager::new(db.clone(), driver));
        Self { db, manager }
    }

    pub async fn send(&self, req: TestRequest) -> (StatusCode, String) {
        let db = self.db.clone();
        let manager = self.manager.clone();
        let app = App::new().configure(|cfg| configure_app(cfg, db, manager));
        let service = test::init_service(app).await;
        debug!("Making request");
        let res = test::call_service(&service, req.to_request()).await;
        let status = res.status();
        let body = test::read_body(res).await;
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    pub async fn get(&self, path: &str) -> (StatusCode, String) {
        self.send(TestRequest::get().uri(path)).await
    }

    pub async fn post_json(&self, path: &str, body: serde_json::Value) -> (StatusCode, String) {
        self.send(TestRequest::post().uri(path).set_json(body)).await
    }

    pub async fn post_text(&self, path: &str, body: &str) -> (StatusCode, String) {
        self.send(TestRequest::post().uri(path).set_payload(body.to_string())).await
    }

    pub async fn finish(self) {
        self.manager.shutdown();
        tear_down(self.db).await;
    }
}
