use ovsdb::types::{Database, Row, Table};
use ovsdb::OvsdbError;
use pretty_assertions::assert_eq;
use serde_json::json;
use vswitch_demo::*;

const BRIDGE_UUID: &str = "6f1a5a0c-9d3e-4c52-8a4b-1f6f1e0f8a01";
const PORT_UUID: &str = "0b7b7a6e-3c3d-4b0e-9a55-2b9f4c6a1d02";
const IFACE_UUID: &str = "d3c2a1b0-7e6f-4a5b-8c9d-0e1f2a3b4c03";

#[test]
fn test_row_constants() {
    assert_eq!(Bridge::TABLE_NAME, "Bridge");
    assert!(Bridge::IS_ROOT);
    assert!(!Port::IS_ROOT);
    assert_eq!(
        Bridge::COLUMNS,
        &[
            "_uuid",
            "_version",
            "datapath_type",
            "external_ids",
            "flood_vlans",
            "name",
            "ports",
            "stp_enable",
        ]
    );
    assert_eq!(OpenVSwitch::TABLE_NAME, "Open_vSwitch");
}

#[test]
fn test_set_column_coerces_wire_values() {
    let mut bridge = Bridge::default();
    bridge.set_column("_uuid", &json!(["uuid", BRIDGE_UUID])).unwrap();
    bridge.set_column("name", &json!("br-int")).unwrap();
    bridge.set_column("stp_enable", &json!(true)).unwrap();
    bridge
        .set_column("ports", &json!(["set", [["uuid", PORT_UUID], ["named-uuid", "new_port"]]]))
        .unwrap();
    bridge
        .set_column("external_ids", &json!(["map", [["owner", "ci"]]]))
        .unwrap();
    bridge.set_column("flood_vlans", &json!(["set", []])).unwrap();

    assert_eq!(bridge.uuid(), BRIDGE_UUID);
    assert_eq!(bridge.name, "br-int");
    assert!(bridge.stp_enable);
    assert_eq!(bridge.ports, vec![PORT_UUID.to_string(), "new_port".to_string()]);
    assert_eq!(bridge.external_ids.get("owner").map(String::as_str), Some("ci"));
    assert!(bridge.flood_vlans.is_empty());

    let mut iface = Interface::default();
    iface.set_column("type", &json!("internal")).unwrap();
    iface.set_column("ofport", &json!(["set", [3]])).unwrap();
    assert_eq!(iface.r#type, "internal");
    assert_eq!(iface.ofport, Some(3));
}

#[test]
fn test_set_column_errors() {
    let mut bridge = Bridge::default();

    let err = bridge.set_column("bogus", &json!(1)).unwrap_err();
    assert!(matches!(err, OvsdbError::UnknownColumn(ref c) if c == "bogus"));

    let err = bridge.set_column("stp_enable", &json!("yes")).unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"stp_enable: String("yes"): Expected boolean, got "yes""#
    );
    match err {
        OvsdbError::SetColumn { column, source, .. } => {
            assert_eq!(column, "stp_enable");
            assert!(matches!(*source, OvsdbError::Coerce { expected: "boolean", .. }));
        }
        other => panic!("unexpected error {other:?}"),
    }

    assert!(bridge.set_column("_uuid", &json!(["uuid", "not-a-uuid"])).is_err());
    // Failed writes leave the row untouched.
    assert_eq!(bridge, Bridge::default());
}

#[test]
fn test_cmd_args_skip_read_only_and_zero_columns() {
    let bridge = Bridge {
        uuid: BRIDGE_UUID.to_string(),
        version: "v1".to_string(),
        name: "br0".to_string(),
        ports: vec![PORT_UUID.to_string()],
        ..Default::default()
    };
    assert_eq!(
        bridge.cmd_args(),
        vec![
            r#"datapath_type="""#.to_string(),
            r#"name="br0""#.to_string(),
            format!("ports=[{PORT_UUID}]"),
            "stp_enable=false".to_string(),
        ]
    );

    let port = Port {
        name: "eth0".to_string(),
        tag: Some(10),
        trunks: vec![10, 20],
        ..Default::default()
    };
    assert_eq!(
        port.cmd_args(),
        vec![r#"name="eth0""#, "tag=10", "trunks=[10,20]"]
    );
}

#[test]
fn test_external_ids_lifecycle() {
    let mut bridge = Bridge::default();
    assert!(bridge.has_external_ids());
    assert!(bridge.external_ids.is_empty());

    bridge.try_set_external_id("owner", "ci").unwrap();
    bridge.try_set_external_id("owner", "ops").unwrap();
    assert_eq!(bridge.try_get_external_id("owner").unwrap(), Some("ops"));
    assert_eq!(bridge.external_ids.len(), 1);

    assert_eq!(
        bridge.try_remove_external_id("owner").unwrap(),
        Some("ops".to_string())
    );
    assert_eq!(bridge.try_get_external_id("owner").unwrap(), None);
    assert_eq!(bridge.try_remove_external_id("owner").unwrap(), None);
}

#[test]
fn test_external_ids_through_trait() {
    use ovsdb::types::ExternalIds;

    let mut port = Port::default();
    port.set_external_id("iface-id", "vm1");
    assert_eq!(port.get_external_id("iface-id"), Some("vm1"));
    assert_eq!(port.cmd_args(), vec![r#"external_ids={"iface-id"="vm1"}"#, r#"name="""#]);
}

#[test]
fn test_missing_external_ids_fail_at_call_time() {
    let mut iface = Interface::default();
    assert!(!iface.has_external_ids());

    let err = iface.try_set_external_id("k", "v").unwrap_err();
    assert!(matches!(err, OvsdbError::UnknownColumn(ref c) if c == "external_ids"));
    assert!(iface.try_get_external_id("k").is_err());
    assert!(iface.try_remove_external_id("k").is_err());
}

#[test]
fn test_load_rows_through_dyn_tables() {
    let dump = json!({
        "Bridge": {
            BRIDGE_UUID: {
                "name": "br0",
                "datapath_type": "system",
                "stp_enable": false,
                "ports": ["uuid", PORT_UUID],
                "external_ids": ["map", [["owner", "ci"]]]
            }
        },
        "Port": {
            PORT_UUID: {
                "name": "eth0",
                "interfaces": ["set", [["uuid", IFACE_UUID]]],
                "tag": ["set", []]
            }
        },
        "Interface": {
            IFACE_UUID: {"name": "eth0", "type": ""}
        }
    });

    let mut db = OvsdbOpenVSwitch::new();
    assert_eq!(load_rows(&mut db, &dump).unwrap(), 3);

    assert_eq!(db.bridge.0.len(), 1);
    let br0 = &db.bridge.0[0];
    assert_eq!(br0.uuid, BRIDGE_UUID);
    assert_eq!(br0.try_get_external_id("owner").unwrap(), Some("ci"));
    assert_eq!(db.bridge.find_port_referrer_ports(PORT_UUID).len(), 1);

    let eth0 = &db.port.0[0];
    assert_eq!(eth0.tag, None);
    assert_eq!(
        db.port.find_interface_referrer_interfaces(IFACE_UUID)[0].name,
        "eth0"
    );

    let total: usize = db.tables().iter().map(|t| t.len()).sum();
    assert_eq!(total, 3);
}

#[test]
fn test_load_rows_errors() {
    let mut db = OvsdbOpenVSwitch::new();

    let err = load_rows(&mut db, &json!({"Mirror": {}})).unwrap_err();
    assert!(matches!(err, OvsdbError::Schema(_)));

    let dump = json!({"Bridge": {BRIDGE_UUID: {"stp_enable": 1}}});
    let err = load_rows(&mut db, &dump).unwrap_err();
    assert!(matches!(err, OvsdbError::SetColumn { ref column, .. } if column == "stp_enable"));

    assert!(load_rows(&mut db, &json!([])).is_err());
}

#[test]
fn test_database_serializes_by_table_name() {
    let mut db = OvsdbOpenVSwitch::new();
    db.bridge.push(Bridge {
        name: "br0".to_string(),
        ..Default::default()
    });

    let value = serde_json::to_value(&db).unwrap();
    assert_eq!(value["Bridge"][0]["name"], "br0");
    assert_eq!(value["Bridge"][0]["_uuid"], "");
    assert!(value["Port"].as_array().unwrap().is_empty());

    let back: OvsdbOpenVSwitch = serde_json::from_value(value).unwrap();
    assert_eq!(back, db);
}
