use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use shared::{
    error::{CoreError, CoreResult},
    protocol::{GraphqlRequest, GraphqlResponse},
};
use tokio::sync::Notify;

use crate::{cache::QueryStore, query_client::QueryClient, transport::GraphqlTransport};

pub(crate) enum Reply {
    Fail(CoreError),
    Body(Value),
}

/// Answers the persons query with `limit` generated records whose ids encode
/// the requested limit, so tests can tell which dispatch a result came from.
pub(crate) struct FakeTransport {
    calls: AtomicUsize,
    variables: Mutex<Vec<Value>>,
    gates: Mutex<HashMap<i64, Arc<Notify>>>,
    replies: Mutex<VecDeque<Reply>>,
    delay: Option<Duration>,
}

impl FakeTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::build(None))
    }

    pub(crate) fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self::build(Some(delay)))
    }

    fn build(delay: Option<Duration>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            variables: Mutex::new(Vec::new()),
            gates: Mutex::new(HashMap::new()),
            replies: Mutex::new(VecDeque::new()),
            delay,
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn seen_variables(&self) -> Vec<Value> {
        self.variables.lock().clone()
    }

    /// Holds every request for `limit` until the returned `Notify` fires once.
    pub(crate) fn gate(&self, limit: i64) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates.lock().insert(limit, Arc::clone(&notify));
        notify
    }

    /// Queues a canned reply used instead of the generated one.
    pub(crate) fn push_reply(&self, reply: Reply) {
        self.replies.lock().push_back(reply);
    }

    pub(crate) fn fail_next(&self, err: CoreError) {
        self.push_reply(Reply::Fail(err));
    }
}

#[async_trait]
impl GraphqlTransport for FakeTransport {
    async fn execute(&self, request: &GraphqlRequest) -> CoreResult<GraphqlResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.variables.lock().push(request.variables.clone());

        let limit = request.variables["limit"].as_i64().unwrap_or(0);
        let gate = self.gates.lock().get(&limit).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self.replies.lock().pop_front();
        let body = match reply {
            Some(Reply::Fail(err)) => return Err(err),
            Some(Reply::Body(body)) => body,
            None => persons_body(limit),
        };
        Ok(serde_json::from_value(body).expect("fake response envelope"))
    }
}

pub(crate) fn person_id(limit: i64, index: i64) -> String {
    format!("p{limit}-{index}")
}

pub(crate) fn persons_body(limit: i64) -> Value {
    let persons: Vec<Value> = (0..limit)
        .map(|index| {
            json!({
                "id": person_id(limit, index),
                "fullName": format!("Member {index}"),
                "type": "POLITICIAN",
                "party": "Independent",
                "yearlyPassiveIncome": 1000.0 * (index + 1) as f64,
                "wealthTaxContribution": 0.0
            })
        })
        .collect();
    json!({ "data": { "persons": persons } })
}

pub(crate) fn client_with(transport: Arc<FakeTransport>) -> Arc<QueryClient> {
    Arc::new(QueryClient::new(
        transport,
        Arc::new(QueryStore::default()),
    ))
}
