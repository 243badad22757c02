use std::fmt::Write as _;

use shared::{display::PersonCard, domain::Avatar};

pub fn card_line(index: usize, card: &PersonCard) -> String {
    let glyph = match &card.avatar {
        Avatar::Photo(_) => '*',
        Avatar::Placeholder(initial) => *initial,
    };
    let mut line = format!("{:>3}. [{glyph}] {}", index + 1, card.name);
    if let Some(subtitle) = &card.subtitle {
        let _ = write!(line, " ({subtitle})");
    }
    let _ = write!(
        line,
        "  income {}  wealth tax {}",
        card.yearly_passive_income, card.wealth_tax_contribution
    );
    line
}

pub fn card_list(cards: &[PersonCard]) -> String {
    if cards.is_empty() {
        return "no people matched".to_string();
    }
    cards
        .iter()
        .enumerate()
        .map(|(index, card)| card_line(index, card))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn card_detail(card: &PersonCard, biography: Option<&str>) -> String {
    let mut out = card.name.clone();
    if let Some(subtitle) = &card.subtitle {
        let _ = write!(out, "\n{subtitle}");
    }
    match &card.avatar {
        Avatar::Photo(url) => {
            let _ = write!(out, "\nphoto: {url}");
        }
        Avatar::Placeholder(initial) => {
            let _ = write!(out, "\nphoto: none ({initial})");
        }
    }
    let _ = write!(out, "\nyearly passive income: {}", card.yearly_passive_income);
    let _ = write!(out, "\nwealth tax contribution: {}", card.wealth_tax_contribution);
    if let Some(wealth) = &card.estimated_wealth {
        let _ = write!(out, "\nestimated wealth: {wealth}");
    }
    if let Some(biography) = biography {
        let _ = write!(out, "\n\n{biography}");
    }
    out
}

pub fn cards_json(cards: &[PersonCard]) -> serde_json::Result<String> {
    let json: Vec<_> = cards.iter().map(PersonCard::as_json).collect();
    serde_json::to_string_pretty(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::domain::Person;

    fn card(value: serde_json::Value) -> PersonCard {
        let person = Person::from_wire(&value).expect("person");
        PersonCard::try_from(&person).expect("card")
    }

    #[test]
    fn list_line_shows_initial_subtitle_and_amounts() {
        let card = card(json!({
            "id": "1",
            "fullName": "Jane Doe",
            "constituency": "Holborn",
            "party": "Labour",
            "yearlyPassiveIncome": 2500000
        }));
        assert_eq!(
            card_line(0, &card),
            "  1. [J] Jane Doe (Holborn • Labour)  income £2,500,000  wealth tax £0"
        );
    }

    #[test]
    fn empty_list_has_a_message() {
        assert_eq!(card_list(&[]), "no people matched");
    }

    #[test]
    fn detail_includes_photo_and_biography() {
        let card = card(json!({
            "id": "2",
            "fullName": "Sam Rich",
            "photoUrl": "https://img.example.org/sam.jpg"
        }));
        let text = card_detail(&card, Some("Founded a shipping firm."));
        assert!(text.starts_with("Sam Rich\nphoto: https://img.example.org/sam.jpg"));
        assert!(text.ends_with("\n\nFounded a shipping firm."));
        assert!(!text.contains("estimated wealth"));
    }

    #[test]
    fn json_output_uses_camel_case_and_formatted_amounts() {
        let card = card(json!({ "id": 7, "fullName": "Pat Lee" }));
        let parsed: serde_json::Value =
            serde_json::from_str(&cards_json(&[card]).expect("json")).expect("parse");
        assert_eq!(
            parsed,
            json!([{
                "id": "7",
                "name": "Pat Lee",
                "placeholder": "P",
                "yearlyPassiveIncome": "£0",
                "wealthTaxContribution": "£0"
            }])
        );
    }
}
