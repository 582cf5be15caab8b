//! Schematic extraction tests against the recording host

use schemasm::host::{HostPin, LibraryPart, NoticeLevel, SymbolInfo};
use schemasm::prelude::*;
use schemasm::{extract_schematic, SymbolHandle};

const NETLIST: &str = "$NETS\n'VIN' ; R1.1 U1.8\n'GND' ; R1.2 U1.1\n'OUT' ; U1.3\n$END\n";

fn pin(number: &str, name: &str) -> HostPin {
    HostPin {
        number: number.into(),
        name: name.into(),
        x: 0.0,
        y: 0.0,
        rotation: 0.0,
    }
}

fn component(designator: &str, name: &str) -> SymbolInfo {
    SymbolInfo {
        is_component: true,
        designator: Some(designator.into()),
        name: Some(name.into()),
        ..Default::default()
    }
}

fn host() -> RecordingHost {
    RecordingHost::new(SymbolLibrary::new())
        .with_netlist(NETLIST)
        .with_library_part(LibraryPart {
            uuid: "dev-r0603-10k".into(),
            supplier_id: Some("C25804".into()),
            name: Some("10k 0603".into()),
        })
        .with_library_part(LibraryPart {
            uuid: "dev-ne555-clone".into(),
            supplier_id: Some("C46749".into()),
            name: Some("NE555".into()),
        })
}

#[tokio::test]
async fn test_extract_selection() {
    let host = host();

    let r1 = host.add_existing_symbol(
        SymbolInfo {
            supplier_id: Some("C25804".into()),
            x: 120.0,
            y: -40.0,
            ..component("R1", "10k")
        },
        vec![pin("2", "2"), pin("1", "1")],
    );
    let u1 = host.add_existing_symbol(
        SymbolInfo {
            manufacturer_id: Some("NE555".into()),
            supplier_id: Some("C7593".into()),
            ..component("U1", "={Manufacturer Part}")
        },
        vec![pin("1", "GND"), pin("3", "OUT"), pin("8", "VCC")],
    );
    host.select(vec![r1, u1]);

    let circuit = extract_schematic(&host, None).await.unwrap();
    assert_eq!(circuit.components.len(), 2);

    let r1 = &circuit.components[0];
    assert_eq!(r1.designator, "R1");
    assert_eq!(r1.value, "10k");
    assert_eq!(r1.part_uuid.as_deref(), Some("dev-r0603-10k"));
    assert_eq!((r1.pos.x, r1.pos.y), (120.0, -40.0));
    let signals: Vec<_> = r1
        .pins
        .iter()
        .map(|p| (p.pin_number, p.signal_name.as_str()))
        .collect();
    assert_eq!(signals, vec![(2, "GND"), (1, "VIN")]);

    let u1 = &circuit.components[1];
    assert_eq!(u1.value, "NE555");
    // no library part carries supplier C7593
    assert_eq!(u1.part_uuid, None);
    assert_eq!(u1.pins[1].signal_name, "OUT");
    assert_eq!(u1.pins[1].name, "OUT");
}

#[tokio::test]
async fn test_explicit_ids_override_selection() {
    let host = host();
    let r1 = host.add_existing_symbol(
        SymbolInfo {
            supplier_id: Some("C25804".into()),
            ..component("R1", "10k")
        },
        vec![pin("1", "1")],
    );
    let other = host.add_existing_symbol(
        SymbolInfo {
            supplier_id: Some("C25804".into()),
            ..component("R2", "1k")
        },
        vec![],
    );
    host.select(vec![other]);

    let circuit = extract_schematic(&host, Some(&[r1])).await.unwrap();
    assert_eq!(circuit.components.len(), 1);
    assert_eq!(circuit.components[0].designator, "R1");
}

#[tokio::test]
async fn test_non_components_and_blank_designators_skipped() {
    let host = host();
    let wire = host.add_existing_symbol(
        SymbolInfo {
            is_component: false,
            ..Default::default()
        },
        vec![],
    );
    let blank = host.add_existing_symbol(
        SymbolInfo {
            supplier_id: Some("C25804".into()),
            ..component("  ", "10k")
        },
        vec![],
    );
    let missing = SymbolHandle::new("no-such-symbol");

    let circuit = extract_schematic(&host, Some(&[wire, blank, missing]))
        .await
        .unwrap();
    assert!(circuit.components.is_empty());
    assert!(host.errors().is_empty());
}

#[tokio::test]
async fn test_component_without_query_reported() {
    let host = host();
    let x1 = host.add_existing_symbol(component("X1", "Crystal"), vec![pin("1", "1")]);

    let circuit = extract_schematic(&host, Some(&[x1])).await.unwrap();
    assert!(circuit.components.is_empty());

    let notices = host.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].message, "Fail get component X1");
}

#[tokio::test]
async fn test_explained_circuit_serializes() {
    let host = host();
    let r1 = host.add_existing_symbol(
        SymbolInfo {
            supplier_id: Some("C25804".into()),
            ..component("R1", "10k")
        },
        vec![pin("1", "1")],
    );

    let circuit = extract_schematic(&host, Some(&[r1])).await.unwrap();
    let json = serde_json::to_value(&circuit).unwrap();

    assert_eq!(json["components"][0]["designator"], "R1");
    assert_eq!(json["components"][0]["part_uuid"], "dev-r0603-10k");
    assert_eq!(json["components"][0]["pins"][0]["signal_name"], "VIN");
}
