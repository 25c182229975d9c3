use super::*;

#[test]
fn defaults_cache_at_normal_speed() {
    let o = PlayerOpts::default();
    assert!(o.renderer.use_cache);
    assert_eq!(o.renderer.playback_speed, 1.0);
    assert_eq!(o.renderer.view_loop_mode, None);
    assert_eq!(o.completion_behavior, CompletionBehavior::Stop);
    assert!(!o.autoplay);
}

#[test]
fn autoplay_is_opt_in() {
    assert!(!PlayerOpts::from_json_str("{}").unwrap().autoplay);
    let o = PlayerOpts::from_json_str(r#"{"autoplay": true}"#).unwrap();
    assert!(o.autoplay);
    assert_eq!(o.renderer, RendererOpts::default());
}

#[test]
fn partial_json_fills_in_defaults() {
    let o = PlayerOpts::from_json_str(
        r#"{"renderer": {"playback_speed": -2.0, "view_loop_mode": {"repeat": {"amount": 3}}},
            "completion_behavior": "pause"}"#,
    )
    .unwrap();
    assert_eq!(o.renderer.playback_speed, -2.0);
    assert!(o.renderer.use_cache);
    assert_eq!(o.renderer.view_loop_mode, Some(LoopMode::Repeat { amount: 3 }));
    assert_eq!(o.completion_behavior, CompletionBehavior::Pause);
}

#[test]
fn malformed_json_is_a_validation_error() {
    let err = PlayerOpts::from_json_str("{ nope").unwrap_err();
    assert!(matches!(err, LoopingError::Validation(_)));
}
