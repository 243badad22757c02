use std::fmt;

use serde::{Deserialize, Serialize};

/// Net wealth below this line is untaxed under the 1% policy.
pub const WEALTH_TAX_THRESHOLD_GBP: f64 = 2_000_000.0;
pub const WEALTH_TAX_RATE: f64 = 0.01;

/// Hypothetical yearly wealth tax: 1% of net wealth above £2,000,000.
pub fn wealth_tax_for(net_wealth: f64) -> f64 {
    (net_wealth - WEALTH_TAX_THRESHOLD_GBP).max(0.0) * WEALTH_TAX_RATE
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonType {
    Politician,
    Billionaire,
    #[serde(other)]
    Other,
}

impl PersonType {
    /// Enum literal as the GraphQL schema spells it.
    pub fn as_graphql(self) -> &'static str {
        match self {
            PersonType::Politician => "POLITICIAN",
            PersonType::Billionaire => "BILLIONAIRE",
            PersonType::Other => "OTHER",
        }
    }
}

impl fmt::Display for PersonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_graphql())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Avatar {
    Photo(String),
    /// First character of the person's full name.
    Placeholder(char),
}

/// Navigation hand-off between a list entry and its detail view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonLink {
    pub id: PersonId,
    pub full_name: String,
}

/// A politician or billionaire as shown to the user.
///
/// Only built through [`Person::from_wire`] or `TryFrom<PersonRecord>`, so every
/// instance has a non-empty id and name and non-negative money fields. Fields
/// are read through accessors; nothing outside this crate can mutate them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub(crate) id: PersonId,
    pub(crate) full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) person_type: Option<PersonType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) constituency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) party: Option<String>,
    pub(crate) yearly_passive_income: f64,
    pub(crate) wealth_tax_contribution: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) estimated_wealth: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) biography: Option<String>,
}

impl Person {
    pub fn id(&self) -> &PersonId {
        &self.id
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn person_type(&self) -> Option<PersonType> {
        self.person_type
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn constituency(&self) -> Option<&str> {
        self.constituency.as_deref()
    }

    pub fn party(&self) -> Option<&str> {
        self.party.as_deref()
    }

    pub fn yearly_passive_income(&self) -> f64 {
        self.yearly_passive_income
    }

    pub fn wealth_tax_contribution(&self) -> f64 {
        self.wealth_tax_contribution
    }

    pub fn estimated_wealth(&self) -> Option<f64> {
        self.estimated_wealth
    }

    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }

    pub fn biography(&self) -> Option<&str> {
        self.biography.as_deref()
    }

    /// `title + " " + full_name`, or just the name when there is no title.
    pub fn display_name(&self) -> String {
        match &self.title {
            Some(title) => format!("{title} {}", self.full_name),
            None => self.full_name.clone(),
        }
    }

    pub fn subtitle(&self) -> Option<String> {
        match (&self.constituency, &self.party) {
            (Some(constituency), Some(party)) => Some(format!("{constituency} • {party}")),
            (Some(constituency), None) => Some(constituency.clone()),
            (None, Some(party)) => Some(party.clone()),
            (None, None) => None,
        }
    }

    pub fn avatar(&self) -> Avatar {
        match &self.photo_url {
            Some(url) => Avatar::Photo(url.clone()),
            // full_name is non-empty after ingestion.
            None => Avatar::Placeholder(self.full_name.chars().next().unwrap_or('?')),
        }
    }

    pub fn link(&self) -> PersonLink {
        PersonLink {
            id: self.id.clone(),
            full_name: self.full_name.clone(),
        }
    }
}
