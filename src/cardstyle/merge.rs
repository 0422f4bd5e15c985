//! Template inheritance merge.
//!
//! `merge(base, extended)` folds one level of an `extends` chain. The
//! resolver applies it bottom-up, so a chain `A <- B <- C` becomes
//! `merge(merge(A, B), C)`.

use std::collections::HashSet;

use super::{FitMode, Layer, LayerOverride, Template};

/// Merge `extended` onto `base`.
///
/// Scalars and metadata come from `extended`. Layers are the base layers
/// (in base order, with `extended.overrides` applied), then extended layers
/// whose names are not already present, then `extended.additional_layers`.
pub fn merge(base: &Template, extended: &Template) -> Template {
    let mut merged = extended.clone();

    if merged.tcg.is_empty() {
        merged.tcg = base.tcg.clone();
    }
    if merged.dimensions.width == 0 {
        merged.dimensions = base.dimensions;
    }
    if merged.background.is_none() {
        merged.background = base.background.clone();
    }

    let mut required = base.required.clone();
    for field in &extended.required {
        if !required.contains(field) {
            required.push(field.clone());
        }
    }
    merged.required = required;

    for (k, v) in &base.optional {
        merged.optional.entry(k.clone()).or_insert_with(|| v.clone());
    }
    for (k, v) in &base.style_tokens {
        merged.style_tokens.entry(k.clone()).or_insert_with(|| v.clone());
    }
    for (k, v) in &base.icons {
        merged.icons.entry(k.clone()).or_insert_with(|| v.clone());
    }

    let mut layers: Vec<Layer> = base
        .layers
        .iter()
        .map(|layer| {
            extended
                .overrides
                .iter()
                .filter(|o| o.layer == layer.name)
                .fold(layer.clone(), |l, o| apply_override(l, o))
        })
        .collect();
    let mut names: HashSet<String> = layers.iter().map(|l| l.name.clone()).collect();
    for layer in &extended.layers {
        if names.insert(layer.name.clone()) {
            layers.push(layer.clone());
        }
    }
    layers.extend(extended.additional_layers.iter().cloned());
    merged.layers = layers;

    merged.extends = None;
    merged.overrides.clear();
    merged.additional_layers.clear();
    merged
}

/// Apply the override-able fields of `o` to `layer`.
pub fn apply_override(mut layer: Layer, o: &LayerOverride) -> Layer {
    for (key, value) in &o.updates {
        let Some(s) = value.as_str() else {
            continue;
        };
        match key.as_str() {
            "source" => layer.source = s.to_string(),
            "content" => layer.content = s.to_string(),
            "condition" => layer.condition = s.to_string(),
            "fit_mode" => layer.fit_mode = Some(FitMode::parse(s)),
            other => tracing::trace!(layer = %layer.name, key = other, "ignoring non-overridable key"),
        }
    }
    layer
}
