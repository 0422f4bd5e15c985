//! The flat variable namespace a card is rendered against.
//!
//! Every `{{path}}` in a cardstyle is looked up here. The namespace is built
//! fresh for each render from the card, its metadata and the template, and
//! holds only strings.

use std::collections::HashMap;

use crate::card::{Card, Value};
use crate::cardstyle::Template;

/// Flattened `dotted.path → string` variables for one render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    vars: HashMap<String, String>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the namespace for rendering `card` with `template`.
    ///
    /// Later steps overwrite earlier ones, except template optional fields
    /// which only fill keys the card left unset.
    pub fn build(card: &Card, template: &Template) -> Self {
        let mut ns = Namespace::new();

        ns.insert("card.tcg", &card.tcg);
        ns.insert("card.cardstyle", &card.cardstyle);
        ns.insert("card.title", &card.title);
        ns.insert("card.type", &card.card_type);
        ns.insert("card.rarity", &card.rarity);
        ns.insert("card.set", &card.set);
        ns.insert("card.artist", &card.artist);
        ns.insert("card.print_this", card.print_this.to_string());
        ns.insert("card.print_total", card.print_total.to_string());
        ns.insert("card.rules_text", &card.rules_text);
        ns.insert("card.flavor_text", &card.flavor_text);
        ns.insert("card.mana_cost", &card.mana_cost);

        let text = if card.rules_text.is_empty() {
            &card.body
        } else {
            &card.rules_text
        };
        let (body, mut footer) = split_footer(text);
        if footer.is_empty() && !card.flavor_text.is_empty() {
            footer = card.flavor_text.clone();
        }
        ns.insert("card.body", body);
        ns.insert("card.footer", footer);

        for (key, value) in &card.metadata {
            match value {
                Value::Mapping(inner) => {
                    for (inner_key, inner_value) in inner {
                        ns.inject_metadata(&format!("{}.{}", key, inner_key), inner_value);
                    }
                }
                other => ns.inject_metadata(key, other),
            }
        }

        for (key, value) in &template.style_tokens {
            ns.insert(format!("style_tokens.{}", key), value);
        }

        // Optional fields are defaults: a value set by the card is kept.
        for (key, value) in &template.optional {
            if let Some(s) = Value::from(value.clone()).to_flat_string() {
                ns.vars.entry(key.clone()).or_insert(s);
            }
        }

        let template_dir = template.template_dir.to_string_lossy().replace('\\', "/");
        ns.insert("icon_dir", format!("{}/icons", template_dir));
        ns.insert("template_dir", template_dir);

        ns
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn inject_metadata(&mut self, key: &str, value: &Value) {
        if key == "card.artwork" {
            self.inject_artwork(value);
            return;
        }
        let Some(s) = value.to_flat_string() else {
            return;
        };
        // An empty metadata value never blanks out a typed default.
        if s.is_empty() && self.contains(key) {
            return;
        }
        self.insert(key, s);
    }

    /// `card.artwork` is either a path/URL or `{url, fit}`.
    fn inject_artwork(&mut self, value: &Value) {
        match value {
            Value::Mapping(map) => {
                if let Some(url) = map.get("url").and_then(Value::to_flat_string) {
                    self.insert("card.artwork", url);
                }
                if let Some(fit) = map.get("fit").and_then(Value::to_flat_string) {
                    self.insert("card.artwork.fit", fit);
                }
            }
            other => {
                if let Some(s) = other.to_flat_string() {
                    self.insert("card.artwork", s);
                }
            }
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Namespace {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ns = Namespace::new();
        for (k, v) in iter {
            ns.insert(k, v);
        }
        ns
    }
}

/// Split text at the first `## Footer` line (case-insensitive).
///
/// Returns `(body, footer)`, each with leading and trailing blank lines
/// removed. Without a marker the footer is empty.
pub fn split_footer(text: &str) -> (String, String) {
    let lines: Vec<&str> = text.lines().collect();
    match lines
        .iter()
        .position(|l| l.trim().eq_ignore_ascii_case("## footer"))
    {
        Some(pos) => (trim_blank_lines(&lines[..pos]), trim_blank_lines(&lines[pos + 1..])),
        None => (trim_blank_lines(&lines), String::new()),
    }
}

fn trim_blank_lines(lines: &[&str]) -> String {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(s), Some(e)) => lines[s..=e].join("\n"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::parse_card;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_footer() {
        let (body, footer) = split_footer("line1\nline2\n## Footer\n\nfooter1\n");
        assert_eq!(body, "line1\nline2");
        assert_eq!(footer, "footer1");
    }

    #[test]
    fn test_split_footer_case_insensitive_and_absent() {
        let (body, footer) = split_footer("\n\na\n## FOOTER\nb");
        assert_eq!((body.as_str(), footer.as_str()), ("a", "b"));

        let (body, footer) = split_footer("just text\n\n");
        assert_eq!(body, "just text");
        assert_eq!(footer, "");
    }

    #[test]
    fn test_build_core_and_metadata() {
        let card = parse_card(
            "---\ncard.title: Bolt\ncard.print_this: 2\nmtg:\n  cmc: 3\n  ratio: 0.5\n  colors: [R, G]\nloose: true\n---\nDeals 3 damage.\n## Footer\n*flavor*\n",
            None,
        )
        .unwrap();
        let ns = Namespace::build(&card, &Template::default());
        assert_eq!(ns.get("card.title"), Some("Bolt"));
        assert_eq!(ns.get("card.print_this"), Some("2"));
        assert_eq!(ns.get("card.print_total"), Some("1"));
        assert_eq!(ns.get("card.body"), Some("Deals 3 damage."));
        assert_eq!(ns.get("card.footer"), Some("*flavor*"));
        assert_eq!(ns.get("mtg.cmc"), Some("3"));
        assert_eq!(ns.get("mtg.ratio"), Some("0.5"));
        assert_eq!(ns.get("mtg.colors"), Some("R, G"));
        assert_eq!(ns.get("loose"), Some("true"));
    }

    #[test]
    fn test_flavor_text_becomes_footer() {
        let card = parse_card("---\n---\nRules.\n---\n*Flavor line.*\n", None).unwrap();
        let ns = Namespace::build(&card, &Template::default());
        assert_eq!(ns.get("card.body"), Some("Rules."));
        assert_eq!(ns.get("card.footer"), Some("Flavor line."));
    }

    #[test]
    fn test_artwork_forms() {
        let flat = parse_card("---\ncard.artwork: art/bolt.png\n---\n", None).unwrap();
        let ns = Namespace::build(&flat, &Template::default());
        assert_eq!(ns.get("card.artwork"), Some("art/bolt.png"));
        assert_eq!(ns.get("card.artwork.fit"), None);

        let nested = parse_card(
            "---\ncard:\n  artwork:\n    url: https://example.com/a.jpg\n    fit: fit\n---\n",
            None,
        )
        .unwrap();
        let ns = Namespace::build(&nested, &Template::default());
        assert_eq!(ns.get("card.artwork"), Some("https://example.com/a.jpg"));
        assert_eq!(ns.get("card.artwork.fit"), Some("fit"));
    }

    #[test]
    fn test_template_values() {
        let template = Template::from_yaml(
            "style_tokens: { ink: \"#111111\" }\noptional_fields:\n  mtg.font_size.title: 34\n  mtg.power: \"0\"\n",
            "inline",
        )
        .map(|mut t| {
            t.template_dir = "builtin/mtg".into();
            t
        })
        .unwrap();
        let card = parse_card("---\nmtg:\n  power: 4\n---\n", None).unwrap();
        let ns = Namespace::build(&card, &template);
        assert_eq!(ns.get("style_tokens.ink"), Some("#111111"));
        assert_eq!(ns.get("mtg.font_size.title"), Some("34"));
        assert_eq!(ns.get("mtg.power"), Some("4"));
        assert_eq!(ns.get("template_dir"), Some("builtin/mtg"));
        assert_eq!(ns.get("icon_dir"), Some("builtin/mtg/icons"));
    }

    #[test]
    fn test_empty_metadata_title_keeps_default() {
        let card = parse_card("---\ncard:\n  title: \"\"\n---\n", None).unwrap();
        let ns = Namespace::build(&card, &Template::default());
        assert_eq!(ns.get("card.title"), Some("Untitled"));
    }
}
