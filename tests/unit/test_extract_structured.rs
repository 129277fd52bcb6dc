use adforge::services::structured::{
    extract_json_value, extract_structured, strip_code_fences, try_extract_structured,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize, PartialEq)]
struct AdConcept {
    #[serde(default)]
    headline: String,
    #[serde(default)]
    primary_text: String,
    #[serde(default)]
    hooks: Vec<String>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
struct Persona {
    name: String,
    age: u32,
}

#[test]
fn test_fenced_and_bare_json_decode_identically() {
    let bare = r#"{"headline": "Sleep is back", "primary_text": "Try it", "hooks": ["a", "b"]}"#;
    let fenced = format!("```json\n{bare}\n```");
    let untagged = format!("```\n{bare}\n```");

    let expected: AdConcept = extract_structured(bare);
    assert_eq!(expected.headline, "Sleep is back");
    assert_eq!(extract_structured::<AdConcept>(&fenced), expected);
    assert_eq!(extract_structured::<AdConcept>(&untagged), expected);
}

#[test]
fn test_unparseable_text_never_fails() {
    for raw in ["", "   ", "Sorry, I can't help with that.", "{\"headline\": ", "```json\n```"] {
        let concept: AdConcept = extract_structured(raw);
        assert_eq!(concept, AdConcept::default(), "input {raw:?}");
        assert_eq!(extract_json_value(raw), json!({}), "input {raw:?}");
    }
}

#[test]
fn test_wrong_shape_falls_back_to_default() {
    let persona: Persona = extract_structured(r#"{"name": "Dana", "age": "thirty"}"#);
    assert_eq!(persona, Persona::default());

    let list: Vec<Persona> = extract_structured(r#"{"name": "Dana", "age": 30}"#);
    assert!(list.is_empty());
}

#[test]
fn test_arrays_decode() {
    let personas: Vec<Persona> = extract_structured(
        "```json\n[{\"name\": \"Dana\", \"age\": 34}, {\"name\": \"Sam\", \"age\": 29}]\n```",
    );

    assert_eq!(personas.len(), 2);
    assert_eq!(personas[1], Persona { name: "Sam".to_string(), age: 29 });
}

#[test]
fn test_strict_variant_surfaces_error() {
    assert!(try_extract_structured::<Persona>("not json").is_err());
    assert_eq!(
        try_extract_structured::<Persona>("```json\n{\"name\":\"Ari\",\"age\":41}\n```").unwrap(),
        Persona { name: "Ari".to_string(), age: 41 }
    );
}

#[test]
fn test_fence_stripping_keeps_inner_backticks_content() {
    let raw = "```json\n{\"code\": \"use `inline` ticks\"}\n```";
    assert_eq!(strip_code_fences(raw), "{\"code\": \"use `inline` ticks\"}");
    assert_eq!(extract_json_value(raw), json!({"code": "use `inline` ticks"}));
}

#[test]
fn test_first_of_several_fenced_blocks_wins() {
    let raw = "Option A:\n```json\n{\"headline\": \"First\"}\n```\nOption B:\n```json\n{\"headline\": \"Second\"}\n```";

    let concept: AdConcept = extract_structured(raw);
    assert_eq!(concept.headline, "First");
    assert_eq!(extract_json_value(raw), json!({"headline": "First"}));
}

#[test]
fn test_language_tag_followed_by_content_on_same_line() {
    assert_eq!(extract_json_value("```json {\"a\":1}```"), json!({"a": 1}));

    let persona: Persona = extract_structured("```json {\"name\": \"Ari\", \"age\": 41}\n```");
    assert_eq!(persona, Persona { name: "Ari".to_string(), age: 41 });
}

#[test]
fn test_valid_unfenced_json_with_backticks_in_value() {
    let raw = "{\"headline\": \"run ```npm i``` now\", \"hooks\": []}";

    let concept: AdConcept = extract_structured(raw);
    assert_eq!(concept.headline, "run ```npm i``` now");
    assert_eq!(
        extract_json_value(raw),
        json!({"headline": "run ```npm i``` now", "hooks": []})
    );
}
