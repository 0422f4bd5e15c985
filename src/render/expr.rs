//! `{{path}}` substitution and layer conditions.
//!
//! The template language is deliberately tiny: a placeholder is replaced by
//! its namespace value (or nothing), and a condition is an `&&` list of
//! paths that must all hold a non-empty value other than `null`.

use std::collections::BTreeMap;

use super::vars::Namespace;

/// Replace every `{{key}}` in `text` with its namespace value.
///
/// Single left-to-right pass: substituted values are never scanned again,
/// unknown keys become the empty string, and an opening `{{` without a
/// closing `}}` is kept as-is.
pub fn substitute(text: &str, ns: &Namespace) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        out.push_str(ns.get(after[..end].trim()).unwrap_or(""));
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// Evaluate a layer condition. A blank condition is true.
pub fn evaluate_condition(expr: &str, ns: &Namespace) -> bool {
    let cleaned = expr.replace("{{", "").replace("}}", "");
    if cleaned.trim().is_empty() {
        return true;
    }
    cleaned
        .split("&&")
        .all(|operand| ns.get(operand.trim()).is_some_and(is_truthy))
}

fn is_truthy(value: &str) -> bool {
    !value.is_empty() && value != "null"
}

/// Turn `{{icon}}` into `[icon]` for every declared icon key.
pub fn replace_icons(text: &str, icons: &BTreeMap<String, String>) -> String {
    icons.keys().fold(text.to_string(), |acc, key| {
        let placeholder = format!("{{{{{}}}}}", key);
        if acc.contains(&placeholder) {
            acc.replace(&placeholder, &format!("[{}]", key))
        } else {
            acc
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(pairs: &[(&str, &str)]) -> Namespace {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_substitute_known_and_missing() {
        let vars = ns(&[("card.title", "Bolt"), ("card.set", "M10")]);
        assert_eq!(
            substitute("{{card.title}} ({{card.set}}) {{nope}}!", &vars),
            "Bolt (M10) !"
        );
    }

    #[test]
    fn test_substitute_is_single_pass() {
        let vars = ns(&[("a", "{{b}}"), ("b", "deep")]);
        assert_eq!(substitute("x {{a}} y", &vars), "x {{b}} y");
    }

    #[test]
    fn test_substitute_idempotent() {
        let vars = ns(&[("card.title", "Bolt"), ("mtg.cmc", "1")]);
        for text in ["{{card.title}} costs {{mtg.cmc}}", "no placeholders", "broken {{card.title", "{{}} {{missing}}"] {
            let once = substitute(text, &vars);
            assert_eq!(substitute(&once, &vars), once, "text: {text}");
        }
    }

    #[test]
    fn test_unclosed_placeholder_kept() {
        let vars = ns(&[("a", "1")]);
        assert_eq!(substitute("{{a}} and {{a", &vars), "1 and {{a");
    }

    #[test]
    fn test_condition_truthiness() {
        let vars = ns(&[("a", "1"), ("b", ""), ("n", "null")]);
        assert!(!evaluate_condition("a && b", &vars));
        assert!(evaluate_condition("a", &vars));
        assert!(evaluate_condition("{{a}}", &vars));
        assert!(!evaluate_condition("n", &vars));
        assert!(!evaluate_condition("missing", &vars));
        assert!(!evaluate_condition("a &&", &vars));
    }

    #[test]
    fn test_blank_condition_is_true() {
        assert!(evaluate_condition("", &Namespace::new()));
        assert!(evaluate_condition("   ", &ns(&[("a", "")])));
    }

    #[test]
    fn test_replace_icons() {
        let mut icons = BTreeMap::new();
        icons.insert("T".to_string(), "tap.png".to_string());
        assert_eq!(replace_icons("{{T}}: add {{R}}", &icons), "[T]: add {{R}}");
    }
}
