use athena::intent::EntityExtractor;
use athena::registry::Candidates;
use serde_json::json;

fn candidates(pairs: &[(&str, &[&str])]) -> Candidates {
    pairs
        .iter()
        .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
        .collect()
}

#[test]
fn test_closed_values_found_or_absent() {
    let extractor = EntityExtractor::new();
    let c = candidates(&[("state", &["on", "off"])]);

    assert_eq!(extractor.extract("turn it on please", &c)["state"], json!("on"));
    assert_eq!(extractor.extract("switch it off", &c)["state"], json!("off"));
    assert!(
        !extractor.extract("make it brighter", &c).contains_key("state"),
        "No candidate present must leave the parameter absent"
    );
}

#[test]
fn test_first_declared_value_wins() {
    let extractor = EntityExtractor::new();
    let text = "turn it on and then off";

    let on_first = candidates(&[("state", &["on", "off"])]);
    let off_first = candidates(&[("state", &["off", "on"])]);

    assert_eq!(extractor.extract(text, &on_first)["state"], json!("on"));
    assert_eq!(extractor.extract(text, &off_first)["state"], json!("off"));
}

#[test]
fn test_multi_word_values_and_case() {
    let extractor = EntityExtractor::new();
    let c = candidates(&[("league", &["premier league", "la liga"])]);

    assert_eq!(
        extractor.extract("Scores from the Premier League today", &c)["league"],
        json!("premier league")
    );
}

#[test]
fn test_open_ended_takes_whole_trimmed_text() {
    let extractor = EntityExtractor::new();
    let c = candidates(&[("title", &[]), ("mode", &["quiet", "loud"])]);

    let found = extractor.extract("  Quarterly planning  ", &c);
    assert_eq!(found["title"], json!("Quarterly planning"));
    assert!(!found.contains_key("mode"));
}

#[test]
fn test_extraction_is_deterministic() {
    let extractor = EntityExtractor::new();
    let c = candidates(&[("color", &["red", "blue"]), ("room", &["kitchen", "bedroom"])]);
    let text = "make the bedroom blue";

    let first = extractor.extract(text, &c);
    for _ in 0..10 {
        assert_eq!(extractor.extract(text, &c), first);
    }
    assert_eq!(first.keys().collect::<Vec<_>>(), vec!["color", "room"]);
}

#[test]
fn test_regex_metacharacters_are_literal() {
    let extractor = EntityExtractor::new();
    let c = candidates(&[("lang", &["c++", "c#"])]);

    // Word boundaries still apply around the literal.
    assert!(extractor.extract("i like cpp", &c).is_empty());
}
