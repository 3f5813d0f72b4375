use super::*;

fn near(a: Coordinate, b: Coordinate) -> bool {
    a.distance(b) < 1e-9
}

#[test]
fn move_advances_in_whole_steps() {
    let m = MoveSegment::new(
        Coordinate::new(0.0, 0.0),
        Angle::NORTH,
        4,
        2,
        StepType::HighStep,
    )
    .unwrap();
    assert_eq!(m.duration(), 8);
    assert_eq!(m.clone().with_duration(7).duration(), 7);
    let seg = MovementSegment::from(m);
    assert_eq!(seg.duration(), 8);
    assert!(near(seg.end(), Coordinate::new(4.0, 0.0)));

    // Mid-step beats hold the previous step's position.
    assert!(near(seg.state_at(1.0).position, Coordinate::new(0.0, 0.0)));
    assert!(near(seg.state_at(3.0).position, Coordinate::new(1.0, 0.0)));
    assert!(near(seg.state_at(8.0).position, Coordinate::new(4.0, 0.0)));
    assert_eq!(seg.state_at(5.0).angle, Angle::NORTH);
}

#[test]
fn move_rejects_zero_beats_per_step() {
    assert!(
        MoveSegment::new(Coordinate::ZERO, Angle::EAST, 1, 0, StepType::HighStep).is_err()
    );
}

#[test]
fn diagonal_move_uses_scaled_step() {
    let m = MoveSegment::new(
        Coordinate::ZERO,
        Angle::new(45.0),
        3,
        1,
        StepType::HighStep,
    )
    .unwrap()
    .with_step_size(std::f64::consts::SQRT_2)
    .unwrap();
    assert!(m.end().distance(Coordinate::new(3.0, 3.0)) < 1e-9);
}

#[test]
fn even_reaches_end_exactly() {
    let seg = MovementSegment::from(EvenSegment::new(
        Coordinate::new(1.0, 1.0),
        Coordinate::new(4.0, 5.0),
        6,
        Angle::EAST,
        StepType::HighStep,
    ));
    assert!(near(seg.state_at(0.0).position, Coordinate::new(1.0, 1.0)));
    assert!(near(seg.state_at(3.0).position, Coordinate::new(2.5, 3.0)));
    assert!(near(seg.state_at(6.0).position, Coordinate::new(4.0, 5.0)));
}

#[test]
fn stop_holds_position_and_facing() {
    let seg = MovementSegment::from(StopSegment::mark_time(
        Coordinate::new(2.0, 3.0),
        4,
        Angle::WEST,
    ));
    let s = seg.state_at(2.5);
    assert_eq!(s.position, Coordinate::new(2.0, 3.0));
    assert_eq!(s.angle, Angle::WEST);
    assert_eq!(seg.start(), seg.end());
}

#[test]
fn gate_turn_quarter_keeps_radius_and_rotates() {
    let arc = ArcSegment::new(
        Coordinate::ZERO,
        Coordinate::new(4.0, 0.0),
        90.0,
        8,
        StepType::HighStep,
    )
    .unwrap();
    let seg = MovementSegment::from(arc);

    let start_bearing = Angle::of_displacement(Coordinate::new(4.0, 0.0) - Coordinate::ZERO).unwrap();
    let mid = seg.state_at(4.0);
    assert!((mid.position.distance(Coordinate::ZERO) - 4.0).abs() < 1e-9);
    let mid_bearing = Angle::of_displacement(mid.position - Coordinate::ZERO).unwrap();
    assert!((mid_bearing.separation(start_bearing) - 45.0).abs() < 1e-9);

    let end = seg.state_at(8.0);
    let end_bearing = Angle::of_displacement(end.position - Coordinate::ZERO).unwrap();
    assert!((end_bearing.separation(start_bearing) - 90.0).abs() < 1e-9);
}

#[test]
fn arc_faces_along_tangent() {
    let arc = ArcSegment::new(
        Coordinate::ZERO,
        Coordinate::new(0.0, 2.0),
        90.0,
        4,
        StepType::HighStep,
    )
    .unwrap();
    // Start bearing is east (0°); a positive sweep travels toward north.
    let s = MovementSegment::from(arc).state_at(0.0);
    assert!(s.angle.separation(Angle::NORTH) < 1e-9);
}

#[test]
fn truncation_shortens_each_variant() {
    let even = MovementSegment::from(EvenSegment::new(
        Coordinate::ZERO,
        Coordinate::new(0.0, 8.0),
        8,
        Angle::EAST,
        StepType::HighStep,
    ));
    let cut = even.truncated(2);
    assert_eq!(cut.duration(), 2);
    assert!(near(cut.end(), Coordinate::new(0.0, 2.0)));

    let arc = MovementSegment::from(
        ArcSegment::new(
            Coordinate::ZERO,
            Coordinate::new(4.0, 0.0),
            90.0,
            8,
            StepType::HighStep,
        )
        .unwrap(),
    );
    let half = arc.truncated(4);
    assert!(near(half.end(), arc.state_at(4.0).position));

    let mv = MovementSegment::from(
        MoveSegment::new(Coordinate::ZERO, Angle::EAST, 4, 2, StepType::HighStep).unwrap(),
    );
    let short = mv.truncated(3);
    assert_eq!(short.duration(), 3);
    assert!(near(short.end(), Coordinate::new(0.0, 1.0)));

    assert_eq!(mv.truncated(20), mv);
}
