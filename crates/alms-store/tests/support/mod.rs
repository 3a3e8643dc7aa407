#![allow(dead_code)]

use std::sync::Arc;

use alms_auth::{MemoryBackend, SessionFile, SessionManager, TokenBackend, TokenVault};
use alms_http::mock::MockTransport;
use alms_http::{BaseAddress, RequestPipeline};
use alms_store::Stores;

pub struct Harness {
    pub transport: Arc<MockTransport>,
    pub cookie: MemoryBackend,
    pub durable: MemoryBackend,
    pub stores: Stores,
}

pub fn harness(token: Option<&str>) -> Harness {
    let (cookie, durable) = match token {
        Some(token) => (MemoryBackend::with_token(token), MemoryBackend::with_token(token)),
        None => (MemoryBackend::new(), MemoryBackend::new()),
    };
    let transport = Arc::new(MockTransport::new());
    let vault = Arc::new(TokenVault::new(vec![
        Arc::new(cookie.clone()) as Arc<dyn TokenBackend>,
        Arc::new(durable.clone()),
    ]));
    let pipeline = Arc::new(RequestPipeline::new(
        transport.clone(),
        BaseAddress::new("http://localhost:5000/api"),
        vault.clone(),
    ));
    let session = Arc::new(SessionManager::new(
        pipeline.clone(),
        vault,
        SessionFile::in_memory(),
    ));
    Harness {
        transport,
        cookie,
        durable,
        stores: Stores::new(pipeline, session),
    }
}
