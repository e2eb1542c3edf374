//! End-to-end checks from GeoJSON text to validation report.

use fourcolor_map::data::{regions_from_geojson, IdentifierPolicy};
use fourcolor_map::index::RegionIndex;
use fourcolor_map::validate::validate_indexed;
use fourcolor_map::{is_adjacent, validate, ColorAssignment, GeometricOracle, Region, Violation};
use geojson::GeoJson;

fn square(x: f64, y: f64) -> String {
    format!(
        "[[[{x},{y}],[{x1},{y}],[{x1},{y1}],[{x},{y1}],[{x},{y}]]]",
        x1 = x + 1.0,
        y1 = y + 1.0
    )
}

fn polygon_feature(name: &str, x: f64, y: f64) -> String {
    format!(
        r#"{{"type":"Feature","properties":{{"ADMIN":"{name}"}},"geometry":{{"type":"Polygon","coordinates":{}}}}}"#,
        square(x, y)
    )
}

fn multipolygon_feature(name: &str, parts: &[(f64, f64)]) -> String {
    let coords: Vec<String> = parts.iter().map(|&(x, y)| square(x, y)).collect();
    format!(
        r#"{{"type":"Feature","properties":{{"ADMIN":"{name}"}},"geometry":{{"type":"MultiPolygon","coordinates":[{}]}}}}"#,
        coords.join(",")
    )
}

fn load(features: &[String]) -> Vec<Region> {
    let text = format!(
        r#"{{"type":"FeatureCollection","features":[{}]}}"#,
        features.join(",")
    );
    let geojson: GeoJson = text.parse().expect("valid GeoJSON");
    let policy = IdentifierPolicy::new(vec!["ADMIN".into()], "unknown");
    regions_from_geojson(geojson, &policy).expect("feature collection")
}

fn colors(pairs: &[(&str, u8)]) -> ColorAssignment {
    pairs.iter().map(|(id, c)| (id.to_string(), *c)).collect()
}

fn violation(a: &str, b: &str) -> Violation {
    Violation {
        first: a.into(),
        second: b.into(),
    }
}

#[test]
fn shared_edge_same_color_is_one_violation() {
    let regions = load(&[polygon_feature("A", 0.0, 0.0), polygon_feature("B", 1.0, 0.0)]);
    let report = validate(&regions, &colors(&[("A", 0), ("B", 0)]), &GeometricOracle::default());
    assert_eq!(report.unpainted_count, 0);
    assert_eq!(report.violations, vec![violation("A", "B")]);
}

#[test]
fn one_degree_gap_same_color_is_fine() {
    let regions = load(&[polygon_feature("A", 0.0, 0.0), polygon_feature("B", 2.0, 0.0)]);
    let report = validate(&regions, &colors(&[("A", 0), ("B", 0)]), &GeometricOracle::default());
    assert!(report.violations.is_empty());
}

#[test]
fn path_recolouring() {
    let regions = load(&[
        polygon_feature("A", 0.0, 0.0),
        polygon_feature("B", 1.0, 0.0),
        polygon_feature("C", 2.0, 0.0),
    ]);
    let oracle = GeometricOracle::default();

    assert!(!is_adjacent(&regions[0], &regions[2]));

    let ok = validate(&regions, &colors(&[("A", 0), ("B", 1), ("C", 0)]), &oracle);
    assert!(ok.violations.is_empty());

    let bad = validate(&regions, &colors(&[("A", 0), ("B", 1), ("C", 1)]), &oracle);
    assert_eq!(bad.violations, vec![violation("B", "C")]);
}

#[test]
fn multipolygon_part_touches_neighbour() {
    let regions = load(&[
        multipolygon_feature("Archipelago", &[(20.0, 20.0), (0.0, 0.0)]),
        polygon_feature("Coast", 0.0, 1.0),
    ]);
    assert!(is_adjacent(&regions[0], &regions[1]));
    assert!(is_adjacent(&regions[1], &regions[0]));
}

#[test]
fn nothing_painted() {
    let regions = load(&[
        polygon_feature("A", 0.0, 0.0),
        polygon_feature("B", 1.0, 0.0),
        polygon_feature("C", 2.0, 0.0),
    ]);
    let report = validate(&regions, &ColorAssignment::new(), &GeometricOracle::default());
    assert_eq!(report.unpainted_count, 3);
    assert!(report.violations.is_empty());
}

#[test]
fn indexed_and_exhaustive_agree_on_a_grid() {
    let mut features = Vec::new();
    for row in 0..5 {
        for col in 0..5 {
            features.push(polygon_feature(&format!("r{row}c{col}"), col as f64, row as f64));
        }
    }
    let regions = load(&features);
    // Checkerboard plus a few deliberate clashes.
    let mut coloring: ColorAssignment = regions
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.clone(), ((i / 5 + i % 5) % 2) as u8))
        .collect();
    coloring.paint("r2c2", 1);
    coloring.erase("r4c4");

    let oracle = GeometricOracle::default();
    let index = RegionIndex::build(&regions);
    let exhaustive = validate(&regions, &coloring, &oracle);
    let indexed = validate_indexed(&regions, &coloring, &oracle, &index, oracle.tolerance());

    assert_eq!(exhaustive, indexed);
    assert_eq!(exhaustive.unpainted_count, 1);
    assert!(!exhaustive.violations.is_empty());
}
