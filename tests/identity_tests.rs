use spyglass::kernel::id::{generate_id, ActivityId};
use std::collections::HashSet;

#[test]
fn test_ten_thousand_ids_are_distinct() {
    let ids: HashSet<ActivityId> = (0..10_000).map(|_| generate_id()).collect();
    assert_eq!(ids.len(), 10_000, "Tight-loop ids must not collide");
}

#[test]
fn test_id_shape_is_clock_plus_suffix() {
    let id = generate_id();
    let raw = id.as_str();

    // Millisecond clock in base 36 is 8 chars until the year 2059
    assert!(raw.len() >= 9, "Expected clock + 8 char suffix, got {}", raw);
    assert!(raw.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
}

#[test]
fn test_same_instant_ids_differ_in_suffix() {
    let a = generate_id();
    let b = generate_id();
    assert_ne!(a, b);

    let suffix = |id: &ActivityId| id.as_str()[id.as_str().len() - 8..].to_string();
    // Clock prefixes may match; the random tails almost surely do not
    assert_ne!(suffix(&a), suffix(&b));
}

#[test]
fn test_id_serializes_as_plain_string() {
    let id = ActivityId::from("lq1abc12345678");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"lq1abc12345678\"");
    assert_eq!(id.to_string(), "lq1abc12345678");
}
