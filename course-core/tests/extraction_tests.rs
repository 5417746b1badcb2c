use course_core::*;
use rstest::rstest;
use serde_json::json;
use test_case::test_case;

fn extractor() -> Extractor {
    Extractor::new()
        .with_pattern(TextPattern::coordinates().unwrap())
        .with_pattern(TextPattern::dates().unwrap())
        .with_default(DEFAULT_SENTINEL)
}

// ===== Layer Ordering Tests =====

#[test]
fn test_fenced_block_beats_bare_braces() {
    let reply = r#"Najpierw szkic {"answer": "bare"} a potem:
```json
{"answer": "fenced"}
```"#;

    let extracted = extractor().extract(reply).unwrap();
    assert_eq!(extracted.layer(), ExtractionLayer::FencedJson);
    assert_eq!(extracted.json(), Some(&json!({"answer": "fenced"})));
}

#[test]
fn test_braces_used_without_fence() {
    let extracted = extractor()
        .extract(r#"Odpowiedź: {"x": 1, "y": [2, 3]} (koniec)"#)
        .unwrap();
    assert_eq!(extracted.layer(), ExtractionLayer::BracedJson);
}

#[test]
fn test_pattern_runs_before_default() {
    let extracted = extractor().extract("Dron leci na pole (1, 2).").unwrap();
    assert_eq!(extracted.layer(), ExtractionLayer::Pattern);
    assert_eq!(extracted.into_text(), "(1, 2)");
}

#[test]
fn test_default_when_nothing_matches() {
    let extracted = extractor().extract("Nie wiem.").unwrap();
    assert_eq!(extracted, Extracted::Default("znacznik".to_string()));
}

#[test]
fn test_patterns_tried_in_insertion_order() {
    let extractor = Extractor::new()
        .with_pattern(TextPattern::dates().unwrap())
        .with_pattern(TextPattern::coordinates().unwrap());
    let extracted = extractor.extract("(3, 4) dnia 2024-11-12").unwrap();
    match extracted {
        Extracted::Pattern(m) => assert_eq!(m.pattern, "dates"),
        other => panic!("unexpected {:?}", other),
    }
}

// ===== Pattern Tests =====

#[rstest]
#[case("Spotkanie 2024-11-12 rano", "2024-11-12")]
#[case("plik 2024_11_12.txt", "2024_11_12")]
#[case("dnia 12-11-2024", "12-11-2024")]
fn test_date_formats(#[case] text: &str, #[case] expected: &str) {
    let found = TextPattern::dates().unwrap().find(text).unwrap();
    assert_eq!(found.text, expected);
}

#[test_case("Instytut mieści się przy ul. Łojasiewicza w Krakowie", "ul. Łojasiewicza" ; "abbreviated street")]
#[test_case("to jest ulica Marszałkowska", "ulica Marszałkowska" ; "full street")]
#[test_case("aleja Róż 5", "aleja Róż" ; "avenue")]
fn test_street_pattern(text: &str, expected: &str) {
    let found = TextPattern::streets().unwrap().find(text).unwrap();
    assert_eq!(found.text, expected);
}

#[test]
fn test_string_json_flattens_unquoted() {
    let extracted = Extractor::new().extract("```json\n\"Lubawa\"\n```").unwrap();
    assert_eq!(extracted.into_text(), "Lubawa");
}
