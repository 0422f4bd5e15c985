//! Card source parsing: metadata block, core fields, derived body text.

use std::collections::BTreeMap;
use std::path::Path;

use super::value::{Value, yaml_key};
use super::{Card, DEFAULT_ARTIST, DEFAULT_CARDSTYLE, DEFAULT_RARITY, DEFAULT_SET, DEFAULT_TCG};
use crate::error::{CardgenError, Result};

/// Text pieces derived from a card body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyParts {
    pub rules_text: String,
    pub flavor_text: String,
    pub mana_cost: String,
    /// Type line from a leading `> **...**` quote, if any.
    pub type_line: Option<String>,
}

/// Read and parse a card file.
pub fn parse_file(path: &Path) -> Result<Card> {
    let text = std::fs::read_to_string(path)?;
    let card = parse_card(&text, Some(path))?;
    tracing::debug!(path = %path.display(), title = %card.title, tcg = %card.tcg, "parsed card");
    Ok(card)
}

/// Parse card source text. `source` supplies the default title and the
/// directory used for relative assets.
pub fn parse_card(text: &str, source: Option<&Path>) -> Result<Card> {
    let parse_err = |message: String| CardgenError::Parse {
        path: source.map(Path::to_path_buf).unwrap_or_default(),
        message,
    };

    let (block, body) = split_frontmatter(text).map_err(|m| parse_err(m.to_string()))?;
    let metadata = match block {
        Some(block) => parse_metadata(block).map_err(parse_err)?,
        None => BTreeMap::new(),
    };

    let field = |name: &str| -> Option<String> {
        core_value(&metadata, name)
            .and_then(Value::to_flat_string)
            .filter(|s| !s.trim().is_empty())
    };
    let count = |name: &str| -> i64 {
        core_value(&metadata, name)
            .and_then(Value::as_i64)
            .filter(|n| *n > 0)
            .unwrap_or(1)
    };

    let body = body.to_string();
    let parts = split_body(&body);

    let title = field("title")
        .or_else(|| source.and_then(title_from_path))
        .unwrap_or_else(|| "Untitled".to_string());

    Ok(Card {
        tcg: field("tcg").unwrap_or_else(|| DEFAULT_TCG.to_string()),
        cardstyle: field("cardstyle").unwrap_or_else(|| DEFAULT_CARDSTYLE.to_string()),
        title,
        card_type: field("type").or(parts.type_line).unwrap_or_default(),
        rarity: field("rarity").unwrap_or_else(|| DEFAULT_RARITY.to_string()),
        set: field("set").unwrap_or_else(|| DEFAULT_SET.to_string()),
        artist: field("artist").unwrap_or_else(|| DEFAULT_ARTIST.to_string()),
        print_this: count("print_this"),
        print_total: count("print_total"),
        rules_text: parts.rules_text,
        flavor_text: parts.flavor_text,
        mana_cost: parts.mana_cost,
        body,
        metadata,
        source: source.map(Path::to_path_buf),
    })
}

/// Split `---`-delimited metadata from the body.
///
/// A file that does not open with `---` has no metadata block; an opening
/// delimiter without a terminator is an error.
fn split_frontmatter(text: &str) -> std::result::Result<(Option<&str>, &str), &'static str> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some(first_end) = text.find('\n') else {
        return Ok((None, text));
    };
    if text[..first_end].trim_end() != "---" {
        return Ok((None, text));
    }

    let rest = &text[first_end + 1..];
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let block = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok((Some(block), body));
        }
        offset += line.len();
    }
    Err("metadata block is missing its closing '---'")
}

fn parse_metadata(block: &str) -> std::result::Result<BTreeMap<String, Value>, String> {
    if block.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let doc: serde_yaml::Value =
        serde_yaml::from_str(block).map_err(|e| format!("invalid metadata block: {}", e))?;
    match doc {
        serde_yaml::Value::Null => Ok(BTreeMap::new()),
        serde_yaml::Value::Mapping(map) => Ok(map
            .into_iter()
            .filter_map(|(k, v)| yaml_key(k).map(|k| (k, Value::from(v))))
            .collect()),
        _ => Err("metadata block must be a mapping".to_string()),
    }
}

/// Core `card.*` field: flat dotted key first, then the nested `card:` map.
fn core_value<'a>(metadata: &'a BTreeMap<String, Value>, name: &str) -> Option<&'a Value> {
    metadata
        .get(&format!("card.{}", name))
        .or_else(|| metadata.get("card")?.as_mapping()?.get(name))
        .filter(|v| !v.is_null())
}

/// `lightning_bolt.md` → `Lightning Bolt`
fn title_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let title = stem
        .split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    (!title.is_empty()).then_some(title)
}

/// Derive rules text, flavor text, mana cost and type line from a body.
///
/// Leading `>` quote lines are consumed: `> **Type**` gives the type line,
/// any other quote the mana cost. The remainder splits at the first
/// horizontal rule into rules text and a flavor section.
pub fn split_body(body: &str) -> BodyParts {
    let mut parts = BodyParts::default();
    let lines: Vec<&str> = body.lines().collect();

    let mut idx = 0;
    while idx < lines.len() {
        let trimmed = lines[idx].trim();
        if trimmed.is_empty() {
            idx += 1;
            continue;
        }
        let Some(quoted) = trimmed.strip_prefix('>') else {
            break;
        };
        let quoted = quoted.trim();
        if let Some(inner) = quoted
            .strip_prefix("**")
            .and_then(|q| q.strip_suffix("**"))
            .filter(|q| !q.trim().is_empty())
        {
            parts.type_line = Some(inner.trim().to_string());
        } else if !quoted.is_empty() {
            parts.mana_cost = quoted.to_string();
        }
        idx += 1;
    }

    let rest = &lines[idx..];
    match rest.iter().position(|l| is_rule_line(l)) {
        Some(pos) => {
            parts.rules_text = rest[..pos].join("\n").trim().to_string();
            parts.flavor_text = flavor_from_section(&rest[pos + 1..]);
        }
        None => parts.rules_text = rest.join("\n").trim().to_string(),
    }
    parts
}

/// A line made only of three or more `-`, `*` or `_`.
fn is_rule_line(line: &str) -> bool {
    let t = line.trim();
    t.len() >= 3
        && ['-', '*', '_']
            .iter()
            .any(|&c| t.chars().all(|ch| ch == c))
}

fn flavor_from_section(lines: &[&str]) -> String {
    let wrapped: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| l.len() >= 2 && l.starts_with('*') && l.ends_with('*'))
        .map(|l| l.trim_matches('*').trim())
        .filter(|l| !l.is_empty())
        .collect();
    if wrapped.is_empty() {
        lines.join("\n").trim().to_string()
    } else {
        wrapped.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BOLT: &str = "---\ncard.tcg: mtg\ncard.title: Lightning Bolt\nmtg:\n  cmc: 1\n---\n> {R}\n> **Instant**\nLightning Bolt deals 3 damage to any target.\n---\n*The sparkmage shrieked.*\n";

    #[test]
    fn test_parse_flat_keys_and_derived_text() {
        let card = parse_card(BOLT, None).unwrap();
        assert_eq!(card.tcg, "mtg");
        assert_eq!(card.title, "Lightning Bolt");
        assert_eq!(card.card_type, "Instant");
        assert_eq!(card.mana_cost, "{R}");
        assert_eq!(card.rules_text, "Lightning Bolt deals 3 damage to any target.");
        assert_eq!(card.flavor_text, "The sparkmage shrieked.");
        assert_eq!(card.lookup("mtg.cmc"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_parse_nested_card_map() {
        let src = "---\ncard:\n  title: Bolt\n  rarity: rare\n  print_this: 3\n---\nBody";
        let card = parse_card(src, None).unwrap();
        assert_eq!(card.title, "Bolt");
        assert_eq!(card.rarity, "rare");
        assert_eq!(card.print_this, 3);
        assert_eq!(card.print_total, 1);
        assert_eq!(card.body, "Body");
    }

    #[test]
    fn test_defaults_applied() {
        let card = parse_card("---\n---\nJust text\n", Some(Path::new("cards/goblin_guide.md"))).unwrap();
        assert_eq!(card.title, "Goblin Guide");
        assert_eq!(card.tcg, DEFAULT_TCG);
        assert_eq!(card.cardstyle, DEFAULT_CARDSTYLE);
        assert_eq!(card.rarity, "common");
        assert_eq!(card.set, "Unknown");
        assert_eq!(card.artist, "Unknown Artist");
        assert_eq!(card.print_this, 1);
    }

    #[test]
    fn test_empty_title_falls_back() {
        let card = parse_card("---\ncard.title: \"\"\n---\n", Some(Path::new("x/shock.md"))).unwrap();
        assert_eq!(card.title, "Shock");
    }

    #[test]
    fn test_no_metadata_block() {
        let card = parse_card("# Heading\nplain body", None).unwrap();
        assert!(card.metadata.is_empty());
        assert_eq!(card.body, "# Heading\nplain body");
        assert_eq!(card.title, "Untitled");
    }

    #[test]
    fn test_headers_kept_in_body() {
        let card = parse_card("---\ncard.title: X\n---\n# Bolt\nDeals 3.", None).unwrap();
        assert_eq!(card.rules_text, "# Bolt\nDeals 3.");
    }

    #[test]
    fn test_unterminated_block_is_parse_error() {
        let err = parse_card("---\ncard.title: X\nbody", Some(Path::new("a.md"))).unwrap_err();
        assert!(matches!(err, CardgenError::Parse { .. }));
        assert!(err.to_string().contains("a.md"));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let err = parse_card("---\ncard.title: [unclosed\n---\n", None).unwrap_err();
        assert!(matches!(err, CardgenError::Parse { .. }));
    }

    #[test]
    fn test_flavor_section_without_asterisks() {
        let parts = split_body("Rules here.\n***\nPlain flavor.\n");
        assert_eq!(parts.rules_text, "Rules here.");
        assert_eq!(parts.flavor_text, "Plain flavor.");
    }

    #[test]
    fn test_explicit_type_wins_over_quote() {
        let card = parse_card("---\ncard.type: Sorcery\n---\n> **Instant**\nText", None).unwrap();
        assert_eq!(card.card_type, "Sorcery");
    }
}
