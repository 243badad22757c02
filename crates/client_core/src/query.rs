use std::fmt::Write as _;

use serde_json::Value;
use shared::{
    domain::PersonType,
    error::{CoreError, CoreResult},
    protocol::{GraphqlRequest, PersonsVariables, PERSONS_DOCUMENT, PERSONS_OPERATION},
};

/// Cache and de-duplication identity: operation name plus canonical variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    operation: &'static str,
    variables: String,
}

impl QueryKey {
    pub fn new(operation: &'static str, variables: &Value) -> Self {
        Self {
            operation,
            variables: canonical_json(variables),
        }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn variables(&self) -> &str {
        &self.variables
    }
}

/// Parameters of the `persons` query.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonsQuery {
    pub person_type: PersonType,
    pub limit: i64,
    pub offset: Option<i64>,
    pub party: Option<String>,
}

impl PersonsQuery {
    pub fn new(person_type: PersonType, limit: i64) -> Self {
        Self {
            person_type,
            limit,
            offset: None,
            party: None,
        }
    }

    pub fn politicians(limit: i64) -> Self {
        Self::new(PersonType::Politician, limit)
    }

    pub fn billionaires(limit: i64) -> Self {
        Self::new(PersonType::Billionaire, limit)
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_party(mut self, party: impl Into<String>) -> Self {
        self.party = Some(party.into());
        self
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.limit <= 0 {
            return Err(CoreError::invalid_parameters(format!(
                "limit must be a positive integer, got {}",
                self.limit
            )));
        }
        if let Some(offset) = self.offset {
            if offset < 0 {
                return Err(CoreError::invalid_parameters(format!(
                    "offset must not be negative, got {offset}"
                )));
            }
        }
        if let Some(party) = &self.party {
            if party.trim().is_empty() {
                return Err(CoreError::invalid_parameters("party filter must not be blank"));
            }
        }
        Ok(())
    }

    pub fn variables(&self) -> PersonsVariables {
        PersonsVariables {
            person_type: self.person_type,
            limit: self.limit,
            offset: self.offset,
            party: self.party.as_ref().map(|party| party.trim().to_string()),
        }
    }

    fn variables_json(&self) -> CoreResult<Value> {
        serde_json::to_value(self.variables()).map_err(|err| {
            CoreError::invalid_parameters(format!("failed to encode query variables: {err}"))
        })
    }

    /// Validates and returns the cache key for these parameters.
    pub fn key(&self) -> CoreResult<QueryKey> {
        self.validate()?;
        Ok(QueryKey::new(PERSONS_OPERATION, &self.variables_json()?))
    }

    pub fn request(&self) -> CoreResult<GraphqlRequest> {
        self.validate()?;
        Ok(GraphqlRequest {
            query: PERSONS_DOCUMENT,
            operation_name: PERSONS_OPERATION,
            variables: self.variables_json()?,
        })
    }
}

/// Serializes with object keys sorted at every depth.
fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (index, key) in keys.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                let _ = write!(out, "{}:", Value::String(key.clone()));
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => {
            let _ = write!(out, "{scalar}");
        }
    }
}
