//! Netlist parser tests against exported netlist files

use schemasm::parser::NetlistParser;
use schemasm::parse_netlist;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn sensor_board() -> String {
    std::fs::read_to_string(fixture_path("sensor_board.net")).unwrap()
}

#[test]
fn test_parse_exported_netlist() {
    let map = parse_netlist(&sensor_board());

    assert_eq!(map.len(), 11);
    assert_eq!(map.signal_for("U1", 5), Some("VCC"));
    assert_eq!(map.signal_for("C1", 2), Some("GND"));
    assert_eq!(map.signal_for("U1", 3), Some("SCL"));
}

#[test]
fn test_continuation_line_joined() {
    let map = parse_netlist(&sensor_board());

    assert_eq!(map.get("R2.1"), Some("VCC"));
    assert_eq!(map.get("C1.1"), Some("VCC"));
}

#[test]
fn test_packages_section_ignored() {
    let map = parse_netlist(&sensor_board());

    assert!(map.get("R1").is_none());
    assert!(map.iter().all(|(_, signal)| signal != "R0603"));
}

#[test]
fn test_net_order_preserved() {
    let nets = NetlistParser::parse_nets(&sensor_board());
    let signals: Vec<_> = nets.iter().map(|n| n.signal.as_str()).collect();

    assert_eq!(signals, vec!["VCC", "GND", "SDA", "SCL"]);
    assert_eq!(nets[0].pins.len(), 4);
}

#[test]
fn test_crlf_export() {
    let text = sensor_board().replace('\n', "\r\n");
    assert_eq!(parse_netlist(&text), parse_netlist(&sensor_board()));
}

#[test]
fn test_empty_and_sectionless_input() {
    assert!(parse_netlist("").is_empty());
    assert!(parse_netlist("'VCC' ; R1.1\n").is_empty());
}

#[test]
fn test_pin_under_two_signals_last_wins() {
    let map = parse_netlist("$NETS\n'A' ; R1.1\n'B' ; R1.1 R2.1\n$END\n");
    assert_eq!(map.get("R1.1"), Some("B"));
    assert_eq!(map.len(), 2);
}
