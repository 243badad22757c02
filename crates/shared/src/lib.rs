pub mod display;
pub mod domain;
pub mod error;
pub mod money;
pub mod protocol;

pub use display::PersonCard;
pub use domain::{Avatar, Person, PersonId, PersonLink, PersonType};
pub use error::{CoreError, CoreResult, ErrorKind};
pub use money::format_gbp;

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod domain_tests;
