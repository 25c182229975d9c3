use super::*;

#[test]
fn from_amount_normalizes_zero_and_one() {
    assert_eq!(LoopMode::from_amount(0), LoopMode::Infinite);
    assert_eq!(LoopMode::from_amount(1), LoopMode::Once);
    assert_eq!(LoopMode::from_amount(3), LoopMode::Repeat { amount: 3 });
}

#[test]
fn amount_round_trips_through_from_amount() {
    for n in [0u32, 1, 2, 7] {
        assert_eq!(LoopMode::from_amount(n).amount(), n);
    }
    assert!(LoopMode::Infinite.is_infinite());
    assert!(!LoopMode::Once.is_infinite());
}

#[test]
fn serde_uses_snake_case_tags() {
    let s = serde_json::to_string(&LoopMode::Repeat { amount: 2 }).unwrap();
    assert_eq!(s, r#"{"repeat":{"amount":2}}"#);
    let m: LoopMode = serde_json::from_str(r#""once""#).unwrap();
    assert_eq!(m, LoopMode::Once);
}
