//! Checking a card against its resolved cardstyle.

use super::Template;
use crate::card::{Card, Value};
use crate::error::ValidationError;

/// Validate `card` against `template`.
///
/// The TCG must match before any required field is looked at. A required
/// path is satisfied by a non-empty typed field, a flat metadata key, or a
/// two-segment nested lookup (`mtg.cmc`).
pub fn validate_card(card: &Card, template: &Template) -> Result<(), ValidationError> {
    if card.tcg != template.tcg {
        return Err(ValidationError::TcgMismatch {
            card: card.tcg.clone(),
            template: template.tcg.clone(),
        });
    }

    match template.required.iter().find(|field| !has_field(card, field)) {
        Some(field) => Err(ValidationError::MissingField {
            field: field.clone(),
        }),
        None => Ok(()),
    }
}

fn has_field(card: &Card, field: &str) -> bool {
    if card.core_field(field).is_some_and(|v| !v.is_empty()) {
        return true;
    }
    card.lookup(field).is_some_and(Value::is_present)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::parse_card;

    fn template(tcg: &str, required: &[&str]) -> Template {
        Template {
            tcg: tcg.into(),
            required: required.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_card() {
        let card = parse_card("---\ncard.title: Bolt\nmtg:\n  cmc: 1\n---\n", None).unwrap();
        let t = template("mtg", &["card.tcg", "card.title", "mtg.cmc"]);
        assert_eq!(validate_card(&card, &t), Ok(()));
    }

    #[test]
    fn test_missing_nested_field() {
        let card = parse_card("---\nmtg:\n  cmc: 1\n---\n", None).unwrap();
        let t = template("mtg", &["mtg.cmc", "mtg.power"]);
        assert_eq!(
            validate_card(&card, &t),
            Err(ValidationError::MissingField {
                field: "mtg.power".into()
            })
        );
    }

    #[test]
    fn test_empty_type_is_missing() {
        let card = parse_card("---\ncard.title: X\n---\nno quote lines", None).unwrap();
        let t = template("mtg", &["card.type"]);
        assert!(matches!(
            validate_card(&card, &t),
            Err(ValidationError::MissingField { .. })
        ));
    }

    #[test]
    fn test_tcg_checked_before_fields() {
        let card = parse_card("---\ncard.tcg: pokemon\n---\n", None).unwrap();
        let t = template("mtg", &["mtg.cmc"]);
        assert_eq!(
            validate_card(&card, &t),
            Err(ValidationError::TcgMismatch {
                card: "pokemon".into(),
                template: "mtg".into()
            })
        );
    }

    #[test]
    fn test_flat_metadata_key() {
        let card = parse_card("---\ncard.artwork: art.png\n---\n", None).unwrap();
        assert_eq!(validate_card(&card, &template("mtg", &["card.artwork"])), Ok(()));
    }
}
