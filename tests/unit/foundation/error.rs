use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        DrillError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        DrillError::evaluation("x")
            .to_string()
            .contains("evaluation error:")
    );
    assert!(
        DrillError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = DrillError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn animation_state_error_reports_dot_and_deficit() {
    let err = AnimationStateError::Underrun {
        dot: DotId::from("A1"),
        beat: 12.0,
        available: 8.0,
    };
    assert_eq!(err.dot().as_str(), "A1");
    assert_eq!(err.deficit(), Some(4.0));
    assert!(err.to_string().contains("A1"));

    let empty = AnimationStateError::NoMovements {
        dot: DotId::from("B2"),
    };
    assert_eq!(empty.deficit(), None);

    let wrapped: DrillError = empty.into();
    assert!(matches!(wrapped, DrillError::AnimationState(_)));
}
