use serde::Serialize;

use crate::{
    domain::{Avatar, Person, PersonId},
    error::CoreError,
    money::format_gbp,
};

/// Display-ready projection of a [`Person`]; every amount is already formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonCard {
    pub id: PersonId,
    pub name: String,
    pub subtitle: Option<String>,
    pub avatar: Avatar,
    pub yearly_passive_income: String,
    pub wealth_tax_contribution: String,
    pub estimated_wealth: Option<String>,
}

impl TryFrom<&Person> for PersonCard {
    type Error = CoreError;

    fn try_from(person: &Person) -> Result<Self, Self::Error> {
        Ok(Self {
            id: person.id().clone(),
            name: person.display_name(),
            subtitle: person.subtitle(),
            avatar: person.avatar(),
            yearly_passive_income: format_gbp(person.yearly_passive_income())?,
            wealth_tax_contribution: format_gbp(person.wealth_tax_contribution())?,
            estimated_wealth: person.estimated_wealth().map(format_gbp).transpose()?,
        })
    }
}

/// Serializable shape for machine-readable output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonCardJson<'a> {
    pub id: &'a str,
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub yearly_passive_income: &'a str,
    pub wealth_tax_contribution: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_wealth: Option<&'a str>,
}

impl PersonCard {
    pub fn as_json(&self) -> PersonCardJson<'_> {
        let (photo_url, placeholder) = match &self.avatar {
            Avatar::Photo(url) => (Some(url.as_str()), None),
            Avatar::Placeholder(glyph) => (None, Some(glyph.to_string())),
        };
        PersonCardJson {
            id: self.id.as_str(),
            name: &self.name,
            subtitle: self.subtitle.as_deref(),
            photo_url,
            placeholder,
            yearly_passive_income: &self.yearly_passive_income,
            wealth_tax_contribution: &self.wealth_tax_contribution,
            estimated_wealth: self.estimated_wealth.as_deref(),
        }
    }
}
