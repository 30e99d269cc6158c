//! Behaviour of the G-code analyzer on whole documents

use printview_visualizer::{analyze, GcodeAnalyzer, LayerProgress, LineScanner, Segment};
use proptest::prelude::*;

#[test]
fn test_single_extrusion_from_origin() {
    let doc = analyze("G90\nG1 X0 Y0\nG1 X10 E1\n");
    assert_eq!(doc.layers.len(), 1);
    assert_eq!(doc.layers[0].z(), 0.0);
    assert_eq!(doc.layers[0].segments(), &[Segment::new(0.0, 0.0, 10.0, 0.0)]);
}

#[test]
fn test_relative_moves_chain_continuously() {
    let doc = analyze("G91\nM83\nG1 X5 E1\nG1 X5 E1\n");
    let segments = doc.layers[0].segments();
    assert_eq!(segments.len(), 2);
    assert_eq!((segments[1].x0, segments[1].y0), (segments[0].x1, segments[0].y1));
    assert_eq!(doc.layers[0].separate_runs(), 1);
}

#[test]
fn test_g92_resets_extruder_only() {
    let mut analyzer = GcodeAnalyzer::new();
    for line in LineScanner::new("G1 X3 Y4 Z0.2 E5\nG92 E0\n").lines() {
        analyzer.process_line(line.text, line.offset);
    }
    let state = analyzer.state();
    assert_eq!(state.e, 0.0);
    assert_eq!((state.x, state.y, state.z), (3.0, 4.0, 0.2));
    assert_eq!(analyzer.finish().segment_count(), 1);
}

#[test]
fn test_z_switch_between_extrusions_opens_layers() {
    let doc = analyze("G1 X1 E1\nG1 Z0.2 E2\n");
    assert_eq!(doc.layers.len(), 2);
    assert_eq!(doc.layers[1].z(), 0.2);
    assert!(doc.layers[1].is_empty());
}

#[test]
fn test_sliced_document() {
    let gcode = "\
; generated by a slicer
; nozzle_diameter = 0.6
M82
G28 ; home
G1 Z0.3 F3000
G1 X10 Y10
G92 E0
G1 X20 Y10 E1.2 F1200
G1 X20 Y20 E2.4
G1 X10 Y20 E3.6
G1 E3.0 ; retract
G1 X30 Y30
G1 E3.6
G1 X40 Y30 E4.8
G4 P1500
G1 Z0.6
G1 X40 Y40 E6.0
M117 Done
";
    let doc = analyze(gcode);

    assert_eq!(doc.nozzle_diameter, 0.6);
    assert_eq!(doc.layers.len(), 2);
    assert_eq!(doc.layers[0].z(), 0.3);
    assert_eq!(doc.layers[0].len(), 4);
    assert_eq!(doc.layers[0].separate_runs(), 2);
    assert_eq!(doc.layers[1].segments(), &[Segment::new(40.0, 30.0, 40.0, 40.0)]);
    assert!((doc.estimated_time - 1.5).abs() < 1e-12);
    assert!(doc.diagnostics.is_empty());

    let first_offset = doc.layers[1].source_offsets()[0];
    assert_eq!(&gcode[first_offset..first_offset + 16], "G1 X40 Y40 E6.0\n");
    assert_eq!(
        doc.layer_progress(first_offset),
        vec![LayerProgress::Printed, LayerProgress::Printing]
    );

    let bounds = doc.bounds().expect("bounds");
    assert_eq!((bounds.min_x, bounds.max_x), (10.0, 40.0));
    assert_eq!((bounds.min_z, bounds.max_z), (0.3, 0.6));
}

#[test]
fn test_malformed_number_is_reported() {
    let doc = analyze("G1 X1 E1\nG1 Xbad E2\n");
    assert_eq!(doc.diagnostics.len(), 1);
    assert_eq!(doc.diagnostics[0].offset, 9);
    assert_eq!(doc.diagnostics[0].token, "Xbad");
    assert!(doc.layers[0].segments()[1].x1.is_nan());
}

fn travel_line() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("G0"), Just("G1")],
        -100i32..100,
        -100i32..100,
        0u32..50,
    )
        .prop_map(|(cmd, x, y, z)| format!("{} X{} Y{} Z{:.1}", cmd, x, y, z as f64 * 0.2))
}

fn any_line() -> impl Strategy<Value = String> {
    prop_oneof![
        travel_line(),
        (-100i32..100, 0u32..1000).prop_map(|(x, e)| format!("G1 X{} E{}", x, e as f64 / 10.0)),
        Just("G90".to_string()),
        Just("G91".to_string()),
        Just("M82".to_string()),
        Just("M83".to_string()),
        Just("G92 E0".to_string()),
        Just("; comment".to_string()),
    ]
}

proptest! {
    #[test]
    fn prop_no_extrusion_means_no_layers(lines in prop::collection::vec(travel_line(), 0..50)) {
        let doc = analyze(&lines.join("\n"));
        prop_assert!(doc.layers.is_empty());
        prop_assert_eq!(doc.line_count, lines.len());
    }

    #[test]
    fn prop_offsets_point_at_extruding_lines(lines in prop::collection::vec(any_line(), 0..80)) {
        let text = lines.join("\n");
        let doc = analyze(&text);

        for layer in &doc.layers {
            prop_assert_eq!(layer.segments().len(), layer.source_offsets().len());
            for &offset in layer.source_offsets() {
                prop_assert!(offset == 0 || text.as_bytes()[offset - 1] == b'\n');
                prop_assert!(text[offset..].starts_with("G1 X"));
            }
        }
    }

    #[test]
    fn prop_analysis_is_deterministic(lines in prop::collection::vec(any_line(), 0..80)) {
        let text = lines.join("\n");
        prop_assert_eq!(analyze(&text), analyze(&text));
    }
}
