//! # Card Model
//!
//! A [`Card`] is the parsed form of one Markdown source file: typed core
//! fields, the raw body, text derived from the body, and a catch-all
//! metadata bag for TCG- and template-specific fields.
//!
//! ```text
//! ---
//! card.tcg: mtg
//! card.title: Lightning Bolt
//! mtg:
//!   cmc: 1
//! ---
//! > {R}
//! > **Instant**
//! Lightning Bolt deals 3 damage to any target.
//! ---
//! *The sparkmage shrieked.*
//! ```
//!
//! Cards are constructed once by [`parse_file`] / [`parse_card`] and never
//! mutated afterwards.

mod parse;
mod value;

pub use parse::{BodyParts, parse_card, parse_file, split_body};
pub use value::Value;

use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_TCG: &str = "mtg";
pub const DEFAULT_CARDSTYLE: &str = "default";
pub const DEFAULT_RARITY: &str = "common";
pub const DEFAULT_SET: &str = "Unknown";
pub const DEFAULT_ARTIST: &str = "Unknown Artist";

/// A parsed card.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// Trading-card-game namespace (never empty).
    pub tcg: String,
    /// Cardstyle name within the TCG family.
    pub cardstyle: String,
    /// Card title (never empty).
    pub title: String,
    pub card_type: String,
    pub rarity: String,
    pub set: String,
    pub artist: String,
    pub print_this: i64,
    pub print_total: i64,
    /// Everything after the metadata block.
    pub body: String,
    /// Body text minus mana/type lines and the flavor section.
    pub rules_text: String,
    pub flavor_text: String,
    pub mana_cost: String,
    /// The full metadata block, including the keys mirrored into typed fields.
    pub metadata: BTreeMap<String, Value>,
    /// File the card was read from, if any.
    pub source: Option<PathBuf>,
}

impl Default for Card {
    fn default() -> Self {
        Self {
            tcg: DEFAULT_TCG.to_string(),
            cardstyle: DEFAULT_CARDSTYLE.to_string(),
            title: "Untitled".to_string(),
            card_type: String::new(),
            rarity: DEFAULT_RARITY.to_string(),
            set: DEFAULT_SET.to_string(),
            artist: DEFAULT_ARTIST.to_string(),
            print_this: 1,
            print_total: 1,
            body: String::new(),
            rules_text: String::new(),
            flavor_text: String::new(),
            mana_cost: String::new(),
            metadata: BTreeMap::new(),
            source: None,
        }
    }
}

impl Card {
    /// Look up a metadata value by path.
    ///
    /// Tries the flat key first (`card.title` stored literally), then one
    /// level of nesting (`card` → `title`).
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        if let Some(v) = self.metadata.get(path) {
            return Some(v);
        }
        let (section, field) = path.split_once('.')?;
        if field.contains('.') {
            return None;
        }
        self.metadata.get(section)?.as_mapping()?.get(field)
    }

    /// Typed core field addressed by its `card.*` path.
    pub fn core_field(&self, path: &str) -> Option<&str> {
        let value = match path {
            "card.tcg" => &self.tcg,
            "card.cardstyle" => &self.cardstyle,
            "card.title" => &self.title,
            "card.type" => &self.card_type,
            "card.rarity" => &self.rarity,
            "card.set" => &self.set,
            "card.artist" => &self.artist,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// Directory of the source file, used to resolve relative asset paths.
    pub fn base_dir(&self) -> Option<&std::path::Path> {
        self.source.as_deref().and_then(|p| p.parent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_flat_and_nested() {
        let mut card = Card::default();
        card.metadata
            .insert("card.artwork".into(), Value::String("art.png".into()));
        let mut mtg = BTreeMap::new();
        mtg.insert("cmc".into(), Value::Int(3));
        card.metadata.insert("mtg".into(), Value::Mapping(mtg));

        assert_eq!(card.lookup("card.artwork").and_then(Value::as_str), Some("art.png"));
        assert_eq!(card.lookup("mtg.cmc"), Some(&Value::Int(3)));
        assert_eq!(card.lookup("mtg.power"), None);
        assert_eq!(card.lookup("a.b.c"), None);
    }

    #[test]
    fn test_core_field() {
        let card = Card {
            title: "Bolt".into(),
            ..Default::default()
        };
        assert_eq!(card.core_field("card.title"), Some("Bolt"));
        assert_eq!(card.core_field("card.tcg"), Some(DEFAULT_TCG));
        assert_eq!(card.core_field("mtg.cmc"), None);
    }
}
