use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{wealth_tax_for, Person, PersonId, PersonType},
    error::{CoreError, CoreResult},
};

pub const PERSONS_OPERATION: &str = "GetPersons";

pub const PERSONS_DOCUMENT: &str = "\
query GetPersons($type: PersonType, $limit: Int!, $offset: Int, $party: String) {
  persons(type: $type, limit: $limit, offset: $offset, party: $party) {
    id
    fullName
    type
    title
    constituency
    party
    yearlyPassiveIncome
    wealthTaxContribution
    estimatedWealth
    photoUrl
    biography
  }
}";

/// Largest gap tolerated between a reported and a recomputed wealth tax figure.
const WEALTH_TAX_TOLERANCE_GBP: f64 = 0.01;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
    pub query: &'static str,
    pub operation_name: &'static str,
    pub variables: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<GraphqlErrorEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlErrorEntry {
    pub message: String,
    #[serde(default)]
    pub path: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonsData {
    pub persons: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonsVariables {
    #[serde(rename = "type")]
    pub person_type: PersonType,
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
}

/// GraphQL `ID` arrives as either a string or an integer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Text(String),
    Number(i64),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            WireId::Text(text) => text.trim().to_string(),
            WireId::Number(number) => number.to_string(),
        }
    }
}

/// Raw person as the endpoint sends it. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    pub id: Option<WireId>,
    pub full_name: Option<String>,
    #[serde(rename = "type")]
    pub person_type: Option<PersonType>,
    pub title: Option<String>,
    pub constituency: Option<String>,
    pub party: Option<String>,
    pub yearly_passive_income: Option<f64>,
    pub wealth_tax_contribution: Option<f64>,
    pub estimated_wealth: Option<f64>,
    pub photo_url: Option<String>,
    pub biography: Option<String>,
}

impl TryFrom<PersonRecord> for Person {
    type Error = CoreError;

    fn try_from(record: PersonRecord) -> CoreResult<Self> {
        let id = record
            .id
            .map(WireId::into_string)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CoreError::malformed_record("person record is missing id"))?;
        let full_name = non_blank(record.full_name).ok_or_else(|| {
            CoreError::malformed_record(format!("person {id} is missing fullName"))
        })?;

        let yearly_passive_income = amount(
            &id,
            "yearlyPassiveIncome",
            record.yearly_passive_income.unwrap_or(0.0),
        )?;
        let wealth_tax_contribution = amount(
            &id,
            "wealthTaxContribution",
            record.wealth_tax_contribution.unwrap_or(0.0),
        )?;
        let estimated_wealth = record
            .estimated_wealth
            .map(|value| amount(&id, "estimatedWealth", value))
            .transpose()?;

        // Billionaire net wealth is the estimated valuation, so the figure can be checked here.
        // A zero valuation means the endpoint derived wealth from holdings instead.
        if let (Some(PersonType::Billionaire), Some(wealth)) =
            (record.person_type, estimated_wealth.filter(|wealth| *wealth > 0.0))
        {
            let expected = wealth_tax_for(wealth);
            if (expected - wealth_tax_contribution).abs() > WEALTH_TAX_TOLERANCE_GBP {
                return Err(CoreError::malformed_record(format!(
                    "person {id} reports wealthTaxContribution {wealth_tax_contribution} \
                     but 1% above £2,000,000 of {wealth} is {expected}"
                )));
            }
        }

        Ok(Person {
            id: PersonId::new(id),
            full_name,
            person_type: record.person_type,
            title: non_blank(record.title),
            constituency: non_blank(record.constituency),
            party: non_blank(record.party),
            yearly_passive_income,
            wealth_tax_contribution,
            estimated_wealth,
            photo_url: non_blank(record.photo_url),
            biography: non_blank(record.biography),
        })
    }
}

impl Person {
    /// Validates one untyped wire record into a `Person`.
    pub fn from_wire(value: &Value) -> CoreResult<Self> {
        let record = PersonRecord::deserialize(value)
            .map_err(|err| CoreError::malformed_record(format!("invalid person record: {err}")))?;
        Person::try_from(record)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn amount(id: &str, field: &str, value: f64) -> CoreResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::malformed_record(format!(
            "person {id} has invalid {field}: {value}"
        )));
    }
    Ok(value)
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
