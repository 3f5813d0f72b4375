use super::*;
use crate::foundation::core::{Angle, Coordinate};
use crate::show::dsl::{SheetBuilder, ShowBuilder, even_step, forward_march};
use crate::show::model::DotType;

fn show(first_rules: Vec<crate::ContinuityRule>, a_next: Coordinate, first_beats: u32) -> Show {
    let first = first_rules
        .into_iter()
        .fold(SheetBuilder::new("1", first_beats), |b, r| {
            b.continuity(DotType::Plain, r)
        })
        .dot("A", Coordinate::ZERO, DotType::Plain)
        .unwrap()
        .build()
        .unwrap();
    let second = SheetBuilder::new("2", 4)
        .dot("A", a_next, DotType::Plain)
        .unwrap()
        .build()
        .unwrap();
    let mut show = ShowBuilder::new("check")
        .dot("A")
        .unwrap()
        .sheet(first)
        .sheet(second)
        .build()
        .unwrap();
    show.update_all_movements().unwrap();
    show
}

fn a() -> Vec<DotId> {
    vec![DotId::from("A")]
}

#[test]
fn exact_match_reports_nothing() {
    let report = show(vec![even_step()], Coordinate::new(3.0, 4.0), 8)
        .check_consistency()
        .unwrap();
    assert!(report.is_clean());
}

#[test]
fn end_off_target_is_wrong_position() {
    let report = show(
        vec![forward_march(4, Angle::NORTH)],
        Coordinate::new(4.5, 0.0),
        4,
    )
    .check_consistency()
    .unwrap();
    assert_eq!(report.issues(0).unwrap().wrong_position, a());
    assert!(report.issues(0).unwrap().lacked_movement.is_empty());
}

#[test]
fn running_out_of_beats_is_lacked_movement() {
    let report = show(
        vec![forward_march(2, Angle::NORTH)],
        Coordinate::new(2.0, 0.0),
        8,
    )
    .check_consistency()
    .unwrap();
    assert_eq!(report.issues(0).unwrap().lacked_movement, a());
}

#[test]
fn unassigned_dot_that_must_move_lacked_movement() {
    let report = show(Vec::new(), Coordinate::new(0.0, 2.0), 8)
        .check_consistency()
        .unwrap();
    assert_eq!(report.issues(0).unwrap().lacked_movement, a());
}

#[test]
fn unassigned_dot_that_stays_put_is_skipped() {
    let report = show(Vec::new(), Coordinate::ZERO, 8)
        .check_consistency()
        .unwrap();
    assert!(report.is_clean());
}

#[test]
fn last_sheet_is_checked_against_its_own_length() {
    let mut s = show(vec![even_step()], Coordinate::ZERO, 8);
    s.set_continuities(1, DotType::Plain, vec![forward_march(1, Angle::EAST)])
        .unwrap();
    s.update_movements(1).unwrap();
    let report = s.check_consistency().unwrap();
    assert!(report.issues(0).is_none());
    assert_eq!(report.issues(1).unwrap().lacked_movement, a());
}

#[test]
fn stale_sheets_cannot_be_checked() {
    let mut s = show(vec![even_step()], Coordinate::ZERO, 8);
    s.set_num_beats(0, 4).unwrap();
    assert!(matches!(
        s.check_consistency(),
        Err(DrillError::Evaluation(_))
    ));
}

#[test]
fn report_serializes_for_the_editor() {
    let report = show(Vec::new(), Coordinate::new(0.0, 2.0), 8)
        .check_consistency()
        .unwrap();
    let v = serde_json::to_value(&report).unwrap();
    assert_eq!(v["sheets"]["0"]["lacked_movement"][0], "A");
}
