use super::*;

fn close(a: Vec2, b: Vec2) -> bool {
    (a - b).hypot() < 1e-9
}

#[test]
fn angle_normalizes_into_range() {
    assert_eq!(Angle::new(360.0).degrees(), 0.0);
    assert_eq!(Angle::new(-90.0).degrees(), 270.0);
    assert_eq!(Angle::new(725.0).degrees(), 5.0);
    assert!(Angle::new(-1e-18).degrees() < 360.0);
}

#[test]
fn cardinal_unit_vectors_follow_field_axes() {
    assert!(close(Angle::EAST.unit_vector(), Vec2::new(0.0, 1.0)));
    assert!(close(Angle::NORTH.unit_vector(), Vec2::new(1.0, 0.0)));
    assert!(close(Angle::WEST.unit_vector(), Vec2::new(0.0, -1.0)));
    assert!(close(Angle::SOUTH.unit_vector(), Vec2::new(-1.0, 0.0)));
}

#[test]
fn bearing_of_displacement_inverts_unit_vector() {
    for deg in [0.0, 45.0, 90.0, 135.0, 200.0, 315.0] {
        let v = Angle::new(deg).unit_vector() * 3.0;
        let back = Angle::of_displacement(v).unwrap();
        assert!(back.separation(Angle::new(deg)) < 1e-9, "{deg}");
    }
    assert!(Angle::of_displacement(Vec2::ZERO).is_none());
}

#[test]
fn angle_serializes_as_plain_number() {
    let json = serde_json::to_string(&Angle::WEST).unwrap();
    assert_eq!(json, "180.0");
    let parsed: Angle = serde_json::from_str("-90").unwrap();
    assert_eq!(parsed, Angle::SOUTH);
}

#[test]
fn dot_id_is_a_transparent_label() {
    let id = DotId::from("A1");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"A1\"");
    assert_eq!(id.to_string(), "A1");
}
