use super::*;
use crate::continuity::grid::AxisOrder;
use crate::continuity::settings::{Orientation, StepType};
use crate::foundation::core::Angle;
use crate::foundation::error::AnimationStateError;
use crate::show::dsl::{
    SheetBuilder, ShowBuilder, even_step, follow_leader, forward_march, fountain_grid, mark_time,
};

fn two_sheets(rules: Vec<ContinuityRule>, next_a: Coordinate) -> Show {
    let first = rules
        .into_iter()
        .fold(SheetBuilder::new("1", 8), |b, r| b.continuity(DotType::Plain, r))
        .dot("A", Coordinate::ZERO, DotType::Plain)
        .unwrap()
        .build()
        .unwrap();
    let second = SheetBuilder::new("2", 4)
        .dot("A", next_a, DotType::Plain)
        .unwrap()
        .continuity(DotType::Plain, mark_time(None))
        .build()
        .unwrap();
    ShowBuilder::new("test")
        .dot("A")
        .unwrap()
        .sheet(first)
        .sheet(second)
        .build()
        .unwrap()
}

#[test]
fn update_movements_builds_every_dot_timeline() {
    let mut show = two_sheets(
        vec![fountain_grid(AxisOrder::EastWestFirst)],
        Coordinate::new(4.0, 3.0),
    );
    assert!(show.sheet(0).unwrap().timelines().is_none());

    show.update_movements(0).unwrap();
    let t = show.sheet(0).unwrap().timeline(&DotId::from("A")).unwrap();
    assert!(t.is_complete());
    assert_eq!(t.end(), Some(Coordinate::new(4.0, 3.0)));

    let s = show.sheet_state_at(0, &DotId::from("A"), 8.0).unwrap();
    assert_eq!(s.position, Coordinate::new(4.0, 3.0));
}

#[test]
fn queries_before_update_are_evaluation_errors() {
    let show = two_sheets(vec![even_step()], Coordinate::ZERO);
    assert!(matches!(
        show.sheet_state_at(0, &DotId::from("A"), 0.0),
        Err(DrillError::Evaluation(_))
    ));
    assert!(show.sheet(7).is_err());
}

#[test]
fn edits_bump_generation_and_drop_caches() {
    let mut show = two_sheets(vec![even_step()], Coordinate::new(0.0, 4.0));
    show.update_all_movements().unwrap();
    let g0 = show.sheet(0).unwrap().generation();
    let g1 = show.sheet(1).unwrap().generation();

    show.set_dot_position(1, &DotId::from("A"), Coordinate::new(0.0, 6.0))
        .unwrap();
    // Sheet 0 aims at sheet 1, so both are stale.
    assert!(show.sheet(0).unwrap().timelines().is_none());
    assert!(show.sheet(1).unwrap().timelines().is_none());
    assert!(show.sheet(0).unwrap().generation() > g0);
    assert!(show.sheet(1).unwrap().generation() > g1);

    show.update_movements(0).unwrap();
    let end = show.sheet_state_at(0, &DotId::from("A"), 8.0).unwrap();
    assert_eq!(end.position, Coordinate::new(0.0, 6.0));

    let g = show.sheet(0).unwrap().generation();
    show.set_num_beats(0, 6).unwrap();
    assert_eq!(show.sheet(0).unwrap().num_beats(), 6);
    assert!(show.sheet(0).unwrap().generation() > g);

    show.set_continuities(0, DotType::Plain, vec![mark_time(None)])
        .unwrap();
    show.update_movements(0).unwrap();
    let t = show.sheet(0).unwrap().timeline(&DotId::from("A")).unwrap();
    assert_eq!(t.segments()[0].kind(), "Stop");
}

#[test]
fn set_dot_position_rejects_unknown_dot() {
    let mut show = two_sheets(vec![even_step()], Coordinate::ZERO);
    assert!(
        show.set_dot_position(0, &DotId::from("Z"), Coordinate::ZERO)
            .is_err()
    );
}

#[test]
fn defaults_resolve_through_song_and_show() {
    let sheet = SheetBuilder::new("1", 8)
        .song("opener")
        .dot("A", Coordinate::ZERO, DotType::Plain)
        .unwrap()
        .continuity(DotType::Plain, forward_march(2, Angle::NORTH))
        .build()
        .unwrap();
    let mut show = ShowBuilder::new("chain")
        .defaults(ShowDefaults {
            step_type: StepType::HighStep,
            beats_per_step: 1,
            orientation: Orientation::West,
        })
        .song(
            "opener",
            Overrides {
                beats_per_step: Some(4),
                ..Overrides::default()
            },
        )
        .unwrap()
        .dot("A")
        .unwrap()
        .sheet(sheet)
        .build()
        .unwrap();

    show.update_movements(0).unwrap();
    let t = show.sheet(0).unwrap().timeline(&DotId::from("A")).unwrap();
    assert_eq!(t.segments()[0].duration(), 8);
    assert_eq!(t.segments()[0].state_at(0.0).angle, Angle::WEST);

    show.set_defaults(ShowDefaults::default()).unwrap();
    assert!(show.sheet(0).unwrap().timelines().is_none());
    show.update_movements(0).unwrap();
    let t = show.sheet(0).unwrap().timeline(&DotId::from("A")).unwrap();
    assert_eq!(t.segments()[0].state_at(0.0).angle, Angle::NORTH);
}

#[test]
fn locate_beat_walks_sheet_lengths() {
    let show = two_sheets(vec![even_step()], Coordinate::ZERO);
    assert_eq!(show.total_beats(), 12);
    assert_eq!(show.locate_beat(0.0).unwrap(), (0, 0.0));
    assert_eq!(show.locate_beat(7.5).unwrap(), (0, 7.5));
    assert_eq!(show.locate_beat(8.0).unwrap(), (1, 0.0));
    assert_eq!(show.locate_beat(12.0).unwrap(), (1, 4.0));
    assert!(show.locate_beat(12.5).is_err());
    assert!(show.locate_beat(f64::NAN).is_err());
}

#[test]
fn state_at_uses_global_beats() {
    let mut show = two_sheets(vec![even_step()], Coordinate::new(0.0, 8.0));
    show.update_all_movements().unwrap();
    let a = DotId::from("A");
    assert_eq!(
        show.state_at(&a, 4.0).unwrap().position,
        Coordinate::new(0.0, 4.0)
    );
    assert_eq!(
        show.state_at(&a, 10.0).unwrap().position,
        Coordinate::new(0.0, 8.0)
    );
}

#[test]
fn last_sheet_destination_rules_hold_position() {
    let mut show = two_sheets(vec![even_step()], Coordinate::new(2.0, 2.0));
    show.set_continuities(1, DotType::Plain, vec![fountain_grid(AxisOrder::EastWestFirst)])
        .unwrap();
    show.update_movements(1).unwrap();
    let s = show.sheet_state_at(1, &DotId::from("A"), 4.0).unwrap();
    assert_eq!(s.position, Coordinate::new(2.0, 2.0));
}

#[test]
fn underrun_surfaces_through_show_queries() {
    let mut show = two_sheets(vec![forward_march(2, Angle::EAST)], Coordinate::ZERO);
    show.update_movements(0).unwrap();
    let err = show.sheet_state_at(0, &DotId::from("A"), 6.0).unwrap_err();
    assert!(matches!(
        err,
        DrillError::AnimationState(AnimationStateError::Underrun { .. })
    ));
}

#[test]
fn validate_rejects_broken_references() {
    let unknown_dot = ShowBuilder::new("x")
        .sheet(
            SheetBuilder::new("1", 4)
                .dot("Q", Coordinate::ZERO, DotType::Plain)
                .unwrap()
                .build()
                .unwrap(),
        )
        .build();
    assert!(matches!(unknown_dot, Err(DrillError::Validation(_))));

    let unknown_song = ShowBuilder::new("x")
        .sheet(SheetBuilder::new("1", 4).song("missing").build().unwrap())
        .build();
    assert!(unknown_song.is_err());

    let stray_line_dot = ShowBuilder::new("x")
        .dot("A")
        .unwrap()
        .sheet(
            SheetBuilder::new("1", 4)
                .dot("A", Coordinate::ZERO, DotType::Plain)
                .unwrap()
                .continuity(DotType::Plain, follow_leader(["A", "Z"], Vec::new()))
                .build()
                .unwrap(),
        )
        .build();
    assert!(stray_line_dot.is_err());

    let zero_bps = ShowBuilder::new("x")
        .defaults(ShowDefaults {
            beats_per_step: 0,
            ..ShowDefaults::default()
        })
        .build();
    assert!(zero_bps.is_err());
}

#[test]
fn line_dots_must_be_placed_on_the_owning_sheet() {
    let json = r#"{
        "dots": ["A", "B"],
        "sheets": [
            {
                "label": "1",
                "num_beats": 4,
                "dots": {
                    "A": { "position": { "x": 0.0, "y": 0.0 }, "dot_type": "plain" },
                    "B": { "position": { "x": 0.0, "y": 2.0 }, "dot_type": "plain" }
                }
            },
            {
                "label": "2",
                "num_beats": 4,
                "dots": { "A": { "position": { "x": 0.0, "y": 0.0 }, "dot_type": "plain" } },
                "continuities": {
                    "plain": [ { "type": "FollowLeader", "order": ["B", "A"] } ]
                }
            }
        ]
    }"#;
    let err = Show::from_json_str(json).unwrap_err();
    assert!(matches!(err, DrillError::Validation(ref m) if m.contains("'B'")), "{err}");

    let mut show = two_sheets(vec![even_step()], Coordinate::ZERO);
    let edit = show.set_continuities(1, DotType::Plain, vec![follow_leader(["Z", "A"], Vec::new())]);
    assert!(matches!(edit, Err(DrillError::Validation(_))));
    assert_eq!(show.sheet(1).unwrap().rules(DotType::Plain).len(), 1);

    show.set_continuities(0, DotType::Plain, vec![follow_leader(["A"], Vec::new())])
        .unwrap();
    show.update_all_movements().unwrap();
}

#[test]
fn pseudo_dot_types_cannot_be_assigned_to_dots() {
    let json = r#"{
        "dots": ["A"],
        "sheets": [{
            "label": "1",
            "num_beats": 4,
            "dots": { "A": { "position": { "x": 0.0, "y": 0.0 }, "dot_type": "all-before" } }
        }]
    }"#;
    assert!(matches!(
        Show::from_json_str(json),
        Err(DrillError::Validation(_))
    ));
    assert!(Show::from_json_str(&json.replace("all-before", "solid")).is_ok());
}

#[test]
fn far_destinations_clamp_to_the_sheet_without_overflow() {
    let mut show = two_sheets(
        vec![fountain_grid(AxisOrder::EastWestFirst)],
        Coordinate::new(5e9, 5e9),
    );
    show.update_all_movements().unwrap();
    let t = show.sheet(0).unwrap().timeline(&DotId::from("A")).unwrap();
    assert!(t.is_complete());
    assert_eq!(t.beats_covered(), 8);
    let s = show.sheet_state_at(0, &DotId::from("A"), 8.0).unwrap();
    assert_eq!(s.position.x, 0.0);
    assert!(s.position.y.is_finite() && s.position.y > 0.0);
    assert_eq!(s.angle, Angle::EAST);
}

#[test]
fn total_beats_saturates_on_huge_sheets() {
    let show = ShowBuilder::new("long")
        .sheet(SheetBuilder::new("1", Beats::MAX).build().unwrap())
        .sheet(SheetBuilder::new("2", Beats::MAX).build().unwrap())
        .build()
        .unwrap();
    assert_eq!(show.total_beats(), Beats::MAX);
    assert!(show.locate_beat(1e12).is_err());
}

#[test]
fn json_round_trip_skips_caches_and_reads_default_keyword() {
    let json = r#"{
        "title": "round trip",
        "defaults": { "step_type": "mini_military", "beats_per_step": 1, "orientation": "" },
        "dots": ["A"],
        "sheets": [{
            "label": "1",
            "num_beats": 4,
            "overrides": { "beats_per_step": "default", "orientation": "east" },
            "dots": { "A": { "position": { "x": 0.0, "y": 0.0 }, "dot_type": "solid-x" } },
            "continuities": {
                "all-before": [ { "type": "MarkTime", "duration": 1 } ],
                "solid-x": [ { "type": "ForwardMarch", "steps": 3, "direction": 90.0 } ]
            }
        }]
    }"#;
    let mut show = Show::from_json_str(json).unwrap();
    assert_eq!(show.defaults().step_type, StepType::MiniMilitary);
    assert_eq!(show.sheets()[0].overrides().beats_per_step, None);
    assert_eq!(show.sheets()[0].rules(DotType::SolidX).len(), 1);

    show.update_movements(0).unwrap();
    let t = show.sheet(0).unwrap().timeline(&DotId::from("A")).unwrap();
    assert!(t.is_complete());
    assert_eq!(t.segments()[1].state_at(0.0).angle, Angle::EAST);

    let text = show.to_json_string_pretty().unwrap();
    assert!(!text.contains("timelines"));
    let back = Show::from_json_str(&text).unwrap();
    assert_eq!(back, show);
}

#[test]
fn malformed_json_is_a_serde_error() {
    assert!(matches!(
        Show::from_json_str("{ \"dots\": 3 }"),
        Err(DrillError::Serde(_))
    ));
}

#[test]
fn dot_types_use_kebab_case_names() {
    assert_eq!(
        serde_json::to_value(DotType::PlainForwardslash).unwrap(),
        "plain-forwardslash"
    );
    assert_eq!(serde_json::to_value(DotType::AllAfter).unwrap(), "all-after");
    assert!(DotType::AllBefore.is_pseudo());
    assert!(!DotType::SolidBackslash.is_pseudo());
}
