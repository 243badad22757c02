//! Data layer shared by every front end: fetch persons from the GraphQL
//! endpoint, cache them, and expose loading/error/ready view models.

pub mod cache;
pub mod query;
pub mod query_client;
pub mod search;
pub mod transport;
pub mod view;

pub use cache::{CacheConfig, QueryStore};
pub use query::{PersonsQuery, QueryKey};
pub use query_client::{PersonList, QueryClient, QueryState};
pub use search::{NoopSearchSink, SearchController, SearchSink};
pub use transport::{GraphqlTransport, HttpGraphqlTransport};
pub use view::{PersonDetailController, PersonListController, ViewState};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
