use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use futures::{
    future::{BoxFuture, Shared},
    FutureExt,
};
use parking_lot::Mutex;
use serde_json::Value;
use shared::{
    domain::{Person, PersonId},
    error::{CoreError, CoreResult},
    protocol::{GraphqlErrorEntry, GraphqlRequest, PersonsData},
};
use tracing::{debug, info, warn};

use crate::{
    cache::QueryStore,
    query::{PersonsQuery, QueryKey},
    transport::GraphqlTransport,
};

pub type PersonList = Arc<Vec<Person>>;

type SharedFetch = Shared<BoxFuture<'static, CoreResult<PersonList>>>;

struct InFlight {
    ticket: u64,
    epoch: u64,
    fetch: SharedFetch,
}

type InFlightMap = Arc<Mutex<HashMap<QueryKey, InFlight>>>;

/// What the client currently knows about a key. Failures are never recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState {
    Loading,
    Data(PersonList),
}

/// Runs the persons query against one endpoint.
///
/// Concurrent calls for the same key share a single request; successful
/// results overwrite the store entry for that key and failures leave it as it
/// was.
pub struct QueryClient {
    transport: Arc<dyn GraphqlTransport>,
    store: Arc<QueryStore>,
    inflight: InFlightMap,
    next_ticket: AtomicU64,
}

impl QueryClient {
    pub fn new(transport: Arc<dyn GraphqlTransport>, store: Arc<QueryStore>) -> Self {
        Self {
            transport,
            store,
            inflight: Arc::new(Mutex::new(HashMap::new())),
            next_ticket: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<QueryStore> {
        &self.store
    }

    pub fn cached(&self, query: &PersonsQuery) -> CoreResult<Option<PersonList>> {
        Ok(self.store.get(&query.key()?))
    }

    pub fn cached_person(&self, id: &PersonId) -> Option<Person> {
        self.store.find_person(id)
    }

    pub fn state(&self, query: &PersonsQuery) -> CoreResult<Option<QueryState>> {
        let key = query.key()?;
        if let Some(persons) = self.store.get(&key) {
            return Ok(Some(QueryState::Data(persons)));
        }
        if self.inflight.lock().contains_key(&key) {
            return Ok(Some(QueryState::Loading));
        }
        Ok(None)
    }

    pub fn inflight_count(&self) -> usize {
        self.inflight.lock().len()
    }

    /// Cache-first: answers from the store when it can, otherwise fetches.
    pub async fn query(&self, query: &PersonsQuery) -> CoreResult<PersonList> {
        if let Some(persons) = self.cached(query)? {
            debug!(limit = query.limit, "persons query served from cache");
            return Ok(persons);
        }
        self.fetch(query).await
    }

    /// Goes to the network, joining an identical request if one is in flight.
    pub async fn fetch(&self, query: &PersonsQuery) -> CoreResult<PersonList> {
        let fetch = self.start_or_join(query)?;
        fetch.await
    }

    pub fn invalidate(&self, query: &PersonsQuery) -> CoreResult<bool> {
        Ok(self.store.remove(&query.key()?))
    }

    fn start_or_join(&self, query: &PersonsQuery) -> CoreResult<SharedFetch> {
        let key = query.key()?;
        let request = query.request()?;

        let epoch = self.store.epoch();
        let mut inflight = self.inflight.lock();
        // Requests started before the last store clear are never joined.
        if let Some(existing) = inflight.get(&key).filter(|existing| existing.epoch == epoch) {
            debug!(
                operation = key.operation(),
                variables = key.variables(),
                "joining in-flight request"
            );
            return Ok(existing.fetch.clone());
        }

        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        info!(
            operation = key.operation(),
            variables = key.variables(),
            ticket,
            "dispatching graphql query"
        );
        let fetch = run_fetch(
            Arc::clone(&self.transport),
            Arc::clone(&self.store),
            Arc::clone(&self.inflight),
            key.clone(),
            ticket,
            epoch,
            request,
        )
        .boxed()
        .shared();
        inflight.insert(
            key,
            InFlight {
                ticket,
                epoch,
                fetch: fetch.clone(),
            },
        );
        drop(inflight);

        // Drive the request even if every waiter goes away, so the store still fills.
        tokio::spawn(fetch.clone());
        Ok(fetch)
    }
}

async fn run_fetch(
    transport: Arc<dyn GraphqlTransport>,
    store: Arc<QueryStore>,
    inflight: InFlightMap,
    key: QueryKey,
    ticket: u64,
    epoch: u64,
    request: GraphqlRequest,
) -> CoreResult<PersonList> {
    let result = execute_persons(transport.as_ref(), &request).await;

    match &result {
        Ok(persons) => {
            if !store.insert_if_epoch(epoch, key.clone(), Arc::clone(persons)) {
                debug!(ticket, "store was cleared while request was in flight; not caching");
            }
        }
        Err(err) => warn!(ticket, kind = ?err.kind, "graphql query failed: {}", err.message),
    }

    let mut inflight = inflight.lock();
    if inflight
        .get(&key)
        .is_some_and(|current| current.ticket == ticket)
    {
        inflight.remove(&key);
    }

    result
}

async fn execute_persons(
    transport: &dyn GraphqlTransport,
    request: &GraphqlRequest,
) -> CoreResult<PersonList> {
    let response = transport.execute(request).await?;

    if !response.errors.is_empty() {
        let messages: Vec<String> = response.errors.iter().map(describe_error).collect();
        return Err(CoreError::protocol(format!(
            "endpoint reported errors: {}",
            messages.join("; ")
        )));
    }

    let data = response
        .data
        .ok_or_else(|| CoreError::protocol("response carried no data"))?;
    let data: PersonsData = serde_json::from_value(data)
        .map_err(|err| CoreError::protocol(format!("unexpected persons payload: {err}")))?;

    // One bad record fails the whole batch.
    let persons = data
        .persons
        .iter()
        .map(Person::from_wire)
        .collect::<CoreResult<Vec<_>>>()?;

    let mut seen = HashSet::with_capacity(persons.len());
    for person in &persons {
        if !seen.insert(person.id()) {
            return Err(CoreError::malformed_record(format!(
                "person {} appears more than once in one response",
                person.id()
            )));
        }
    }

    Ok(Arc::new(persons))
}

fn describe_error(entry: &GraphqlErrorEntry) -> String {
    match entry.path.as_deref() {
        Some(path) if !path.is_empty() => {
            let path: Vec<String> = path
                .iter()
                .map(|segment| match segment {
                    Value::String(field) => field.clone(),
                    other => other.to_string(),
                })
                .collect();
            format!("{} (at {})", entry.message, path.join("."))
        }
        _ => entry.message.clone(),
    }
}

#[cfg(test)]
#[path = "tests/query_client_tests.rs"]
mod tests;
