//! # Render Tests
//!
//! End-to-end rendering of cards against the embedded MTG cardstyles:
//! parse a card file, resolve its cardstyle, composite, and inspect the
//! resulting image and layer report.

use std::fs;
use std::path::Path;

use cardgen::card::{Card, parse_file};
use cardgen::render::RenderedCard;
use cardgen::{CardRenderer, RenderContext, Resolver, SearchPaths, Template};
use image::{Rgba, RgbaImage};

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

const BOLT: &str = r#"---
card.title: Lightning Bolt
card.artist: Christopher Rush
card.set: M10
mtg:
  power: 3
  toughness: 1
---
> {R}
> **Instant**

Lightning Bolt deals 3 damage to any target.

---
*The sparkmage shrieked, calling on the rage of the storms of his youth.*
"#;

/// Write `text` as `<dir>/<name>` and parse it.
fn write_card(dir: &Path, name: &str, text: &str) -> Card {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    parse_file(&path).unwrap()
}

fn render(card: &Card) -> RenderedCard {
    let resolver = Resolver::new(SearchPaths::embedded_only());
    let template = resolver.resolve(&card.tcg, &card.cardstyle).unwrap();
    CardRenderer::new(&RenderContext::empty())
        .render(card, &template)
        .unwrap()
}

fn write_art(dir: &Path, name: &str, width: u32, height: u32, color: Rgba<u8>) {
    let art = dir.join(name);
    fs::create_dir_all(art.parent().unwrap()).unwrap();
    RgbaImage::from_pixel(width, height, color).save(art).unwrap();
}

fn close_to(actual: &Rgba<u8>, expected: Rgba<u8>) -> bool {
    actual
        .0
        .iter()
        .zip(expected.0.iter())
        .all(|(a, e)| a.abs_diff(*e) <= 3)
}

// Artwork region in cardstyles/mtg/base.yaml: x 57, y 110, 631 x 462.
const ART_CENTER: (u32, u32) = (372, 341);
const ART_TOP: (u32, u32) = (372, 115);

// ============================================================================
// TESTS
// ============================================================================

#[test]
fn test_bolt_renders_every_text_layer() {
    let dir = tempfile::tempdir().unwrap();
    let card = write_card(dir.path(), "lightning_bolt.md", BOLT);
    let out = render(&card);

    assert_eq!(out.image.dimensions(), (745, 1040));
    // title, mana cost, type line, rules, flavor, artist, set info, p/t
    assert_eq!(out.report.text_draws, 8);
    // artwork has no source
    assert_eq!(out.report.skipped, 1);
    assert_eq!(out.report.placeholders, 0);
    assert_eq!(*out.image.get_pixel(1, 1), Rgba([0xf4, 0xef, 0xe6, 255]));
}

#[test]
fn test_minimal_card_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let card = write_card(dir.path(), "llanowar_elves.md", "Just rules text.\n");
    assert_eq!(card.title, "Llanowar Elves");
    let out = render(&card);
    // title, rules, artist, set info
    assert_eq!(out.report.text_draws, 4);
    assert_eq!(out.report.image_draws, 0);
}

#[test]
fn test_missing_artwork_draws_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let card = write_card(
        dir.path(),
        "bolt.md",
        "---\ncard.title: Bolt\ncard.artwork: art/missing.png\n---\nDeal 3.\n",
    );
    let out = render(&card);
    assert_eq!(out.report.placeholders, 1);
    assert_eq!(out.report.image_draws, 0);
    assert_eq!(*out.image.get_pixel(ART_TOP.0, ART_TOP.1), Rgba([200, 200, 200, 255]));
}

#[test]
fn test_artwork_relative_to_card_fills_region() {
    let dir = tempfile::tempdir().unwrap();
    let red = Rgba([220, 30, 30, 255]);
    write_art(dir.path(), "art/bolt.png", 40, 20, red);
    let card = write_card(
        dir.path(),
        "bolt.md",
        "---\ncard.title: Bolt\ncard.artwork: art/bolt.png\n---\nDeal 3.\n",
    );
    let out = render(&card);
    assert_eq!(out.report.image_draws, 1);
    assert!(close_to(out.image.get_pixel(ART_CENTER.0, ART_CENTER.1), red));
    assert!(close_to(out.image.get_pixel(ART_TOP.0, ART_TOP.1), red));
}

#[test]
fn test_fullart_fits_artwork_and_adds_stamp() {
    let dir = tempfile::tempdir().unwrap();
    let blue = Rgba([20, 40, 220, 255]);
    write_art(dir.path(), "wide.png", 100, 10, blue);
    let card = write_card(
        dir.path(),
        "bolt.md",
        "---\ncard.title: Bolt\ncard.cardstyle: fullart\ncard.artwork: wide.png\n---\nDeal 3.\n---\n*Flavor.*\n",
    );
    let out = render(&card);

    let background = Rgba([0x10, 0x10, 0x10, 255]);
    assert_eq!(*out.image.get_pixel(1, 1), background);
    // fit: a wide image leaves the top of the region uncovered
    assert_eq!(*out.image.get_pixel(ART_TOP.0, ART_TOP.1), background);
    assert!(close_to(out.image.get_pixel(ART_CENTER.0, ART_CENTER.1), blue));
    // title, rules, artist, set info, foil stamp; flavor needs mtg.show_flavor
    assert_eq!(out.report.text_draws, 5);
}

#[test]
fn test_card_fit_overrides_layer_fit() {
    let dir = tempfile::tempdir().unwrap();
    let blue = Rgba([20, 40, 220, 255]);
    write_art(dir.path(), "wide.png", 100, 10, blue);
    let card = write_card(
        dir.path(),
        "bolt.md",
        "---\ncard:\n  title: Bolt\n  cardstyle: fullart\n  artwork:\n    url: wide.png\n    fit: stretch\n---\n",
    );
    let out = render(&card);
    assert_eq!(out.report.image_draws, 1);
    assert!(close_to(out.image.get_pixel(ART_TOP.0, ART_TOP.1), blue));
}

#[test]
fn test_flavor_shown_when_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let card = write_card(
        dir.path(),
        "bolt.md",
        "---\ncard.title: Bolt\ncard.cardstyle: fullart\nmtg:\n  show_flavor: true\n---\nDeal 3.\n## Footer\nFlavor.\n",
    );
    let out = render(&card);
    assert_eq!(out.report.text_draws, 6);
}

#[test]
fn test_headed_body_and_footer_on_custom_template() {
    let template = Template::from_yaml(
        r##"
name: Body And Footer
tcg: mtg
dimensions: { width: 400, height: 300 }
background: "#ffffff"
layers:
  - name: body
    type: text
    region: { x: 20, y: 20, width: 360, height: 180 }
    content: "{{card.body}}"
  - name: footer
    type: text
    region: { x: 20, y: 220, width: 360, height: 60 }
    content: "{{card.footer}}"
"##,
        "inline",
    )
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let card = write_card(
        dir.path(),
        "bolt.md",
        "---\ncard.title: Bolt\n---\n# Bolt\nDeals 3 damage.\n## Footer\n*flavor*",
    );

    let out = CardRenderer::new(&RenderContext::empty())
        .render(&card, &template)
        .unwrap();
    assert_eq!(out.report.text_draws, 2);
    assert_eq!(out.report.placeholders, 0);
    assert_eq!(out.report.skipped, 0);
    assert_eq!(out.image.dimensions(), (400, 300));
}
