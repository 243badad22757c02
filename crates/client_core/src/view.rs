//! List and detail view models on top of [`QueryClient`].
//!
//! Each controller publishes a [`ViewState`] through a `watch` channel. Every
//! dispatch gets a generation number; a result is applied only if its
//! generation is still the latest and the view is still mounted, so the last
//! dispatch wins and late results for an abandoned view are dropped.

use std::sync::Arc;

use parking_lot::Mutex;
use shared::{
    display::PersonCard,
    domain::{Person, PersonId, PersonLink},
    error::{CoreError, CoreResult},
};
use tokio::{sync::watch, task::JoinHandle};
use tracing::debug;

use crate::{
    query::PersonsQuery,
    query_client::{PersonList, QueryClient},
};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Error(CoreError),
    Ready(T),
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&CoreError> {
        match self {
            ViewState::Error(err) => Some(err),
            _ => None,
        }
    }
}

impl<T> From<CoreResult<T>> for ViewState<T> {
    fn from(result: CoreResult<T>) -> Self {
        match result {
            Ok(data) => ViewState::Ready(data),
            Err(err) => ViewState::Error(err),
        }
    }
}

struct DispatchGuard {
    generation: u64,
    mounted: bool,
}

struct ViewSlot<T> {
    state: watch::Sender<ViewState<T>>,
    guard: Mutex<DispatchGuard>,
}

impl<T> ViewSlot<T> {
    fn new() -> Arc<Self> {
        let (state, _) = watch::channel(ViewState::Loading);
        Arc::new(Self {
            state,
            guard: Mutex::new(DispatchGuard {
                generation: 0,
                mounted: true,
            }),
        })
    }

    /// Starts a new dispatch and returns its generation, or `None` once unmounted.
    fn begin(&self) -> Option<u64> {
        let mut guard = self.guard.lock();
        if !guard.mounted {
            return None;
        }
        guard.generation += 1;
        Some(guard.generation)
    }

    fn settle(&self, generation: u64, state: ViewState<T>) -> bool {
        let guard = self.guard.lock();
        if !guard.mounted || guard.generation != generation {
            return false;
        }
        self.state.send_replace(state);
        true
    }

    fn unmount(&self) {
        let mut guard = self.guard.lock();
        guard.mounted = false;
        guard.generation += 1;
    }

    fn is_mounted(&self) -> bool {
        self.guard.lock().mounted
    }
}

impl<T: Clone> ViewSlot<T> {
    fn snapshot(&self) -> ViewState<T> {
        self.state.borrow().clone()
    }
}

/// Controller behind any screen that lists persons.
pub struct PersonListController {
    client: Arc<QueryClient>,
    slot: Arc<ViewSlot<PersonList>>,
    current: Mutex<Option<PersonsQuery>>,
}

impl PersonListController {
    pub fn new(client: Arc<QueryClient>) -> Self {
        Self {
            client,
            slot: ViewSlot::new(),
            current: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ViewState<PersonList> {
        self.slot.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState<PersonList>> {
        self.slot.state.subscribe()
    }

    pub fn current_query(&self) -> Option<PersonsQuery> {
        self.current.lock().clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.slot.is_mounted()
    }

    /// Loads `query` into this view.
    ///
    /// Invalid parameters are rejected before any state change. A cached
    /// result settles the view immediately and `None` is returned; otherwise
    /// the view goes to `Loading` and the spawned fetch is returned. Must be
    /// called inside a tokio runtime.
    pub fn dispatch(&self, query: PersonsQuery) -> CoreResult<Option<JoinHandle<()>>> {
        query.validate()?;
        let Some(generation) = self.slot.begin() else {
            debug!("list view is unmounted; ignoring dispatch");
            return Ok(None);
        };
        *self.current.lock() = Some(query.clone());

        if let Some(persons) = self.client.cached(&query)? {
            self.slot.settle(generation, ViewState::Ready(persons));
            return Ok(None);
        }
        self.slot.settle(generation, ViewState::Loading);

        let client = Arc::clone(&self.client);
        let slot = Arc::clone(&self.slot);
        Ok(Some(tokio::spawn(async move {
            let state = ViewState::from(client.fetch(&query).await);
            if !slot.settle(generation, state) {
                debug!(generation, limit = query.limit, "discarding stale persons result");
            }
        })))
    }

    /// Dispatches the most recent query again.
    pub fn retry(&self) -> CoreResult<Option<JoinHandle<()>>> {
        let query = self
            .current_query()
            .ok_or_else(|| CoreError::invalid_parameters("no query has been dispatched yet"))?;
        self.dispatch(query)
    }

    pub fn link_at(&self, index: usize) -> Option<PersonLink> {
        self.state()
            .ready()
            .and_then(|persons| persons.get(index))
            .map(Person::link)
    }

    pub fn link_for(&self, id: &PersonId) -> Option<PersonLink> {
        self.state()
            .ready()
            .and_then(|persons| persons.iter().find(|person| person.id() == id))
            .map(Person::link)
    }

    /// Display cards for the current result; empty unless the view is ready.
    pub fn cards(&self) -> CoreResult<Vec<PersonCard>> {
        match self.state() {
            ViewState::Ready(persons) => persons.iter().map(PersonCard::try_from).collect(),
            _ => Ok(Vec::new()),
        }
    }

    pub fn unmount(&self) {
        self.slot.unmount();
    }
}

impl Drop for PersonListController {
    fn drop(&mut self) {
        self.slot.unmount();
    }
}

/// Controller behind a single-person screen opened from a list entry.
pub struct PersonDetailController {
    client: Arc<QueryClient>,
    link: PersonLink,
    source: PersonsQuery,
    slot: Arc<ViewSlot<Person>>,
}

impl PersonDetailController {
    /// `source` is the list query the link came from; it is re-run when the
    /// person is no longer cached.
    pub fn open(client: Arc<QueryClient>, link: PersonLink, source: PersonsQuery) -> Self {
        Self {
            client,
            link,
            source,
            slot: ViewSlot::new(),
        }
    }

    pub fn id(&self) -> &PersonId {
        &self.link.id
    }

    /// The resolved display name, or the name handed over by the list until then.
    pub fn title(&self) -> String {
        match self.slot.snapshot() {
            ViewState::Ready(person) => person.display_name(),
            _ => self.link.full_name.clone(),
        }
    }

    pub fn state(&self) -> ViewState<Person> {
        self.slot.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState<Person>> {
        self.slot.state.subscribe()
    }

    pub fn card(&self) -> CoreResult<Option<PersonCard>> {
        match self.slot.snapshot() {
            ViewState::Ready(person) => PersonCard::try_from(&person).map(Some),
            _ => Ok(None),
        }
    }

    pub fn load(&self) -> CoreResult<Option<JoinHandle<()>>> {
        self.source.validate()?;
        let Some(generation) = self.slot.begin() else {
            debug!(id = %self.link.id, "detail view is unmounted; ignoring load");
            return Ok(None);
        };

        if let Some(person) = self.client.cached_person(&self.link.id) {
            self.slot.settle(generation, ViewState::Ready(person));
            return Ok(None);
        }
        self.slot.settle(generation, ViewState::Loading);

        let client = Arc::clone(&self.client);
        let slot = Arc::clone(&self.slot);
        let source = self.source.clone();
        let id = self.link.id.clone();
        Ok(Some(tokio::spawn(async move {
            let result = client.fetch(&source).await.and_then(|persons| {
                persons
                    .iter()
                    .find(|person| person.id() == &id)
                    .cloned()
                    .ok_or_else(|| CoreError::not_found(format!("person {id} is not in the result")))
            });
            if !slot.settle(generation, ViewState::from(result)) {
                debug!(generation, %id, "discarding stale person result");
            }
        })))
    }

    pub fn retry(&self) -> CoreResult<Option<JoinHandle<()>>> {
        self.load()
    }

    pub fn unmount(&self) {
        self.slot.unmount();
    }
}

impl Drop for PersonDetailController {
    fn drop(&mut self) {
        self.slot.unmount();
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
