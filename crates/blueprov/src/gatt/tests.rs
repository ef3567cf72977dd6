//! Unit tests for the attribute tree and the services mounted on it

use super::*;
use crate::config::{DispatchPolicy, ServerConfig};
use crate::error::GattError;
use crate::network::{
    ConnectionSettings, Device, DeviceType, ManagerState, MemoryNetwork, NetworkCall, NetworkSeed,
};
use crate::services::build_application;
use serde_json::json;
use std::sync::Arc;

const SERVICE: &str = "/org/bluez/example/service0";
const MANAGER_STATE: &str = "/org/bluez/example/service0/char1";
const WIRELESS_CONFIG: &str = "/org/bluez/example/service0/char2";
const ETHERNET_STATE: &str = "/org/bluez/example/service0/char3";
const WIFI_STATE: &str = "/org/bluez/example/service0/char4";

fn path(s: &str) -> ObjectPath {
    ObjectPath::new(s)
}

fn wifi_record(id: &str, uuid: &str) -> ConnectionSettings {
    ConnectionSettings::new(json!({
        "connection": {"id": id, "type": "802-11-wireless", "uuid": uuid},
        "802-11-wireless": {"ssid": id},
    }))
}

fn ethernet_record(id: &str, uuid: &str) -> ConnectionSettings {
    ConnectionSettings::new(json!({
        "connection": {"id": id, "type": "802-3-ethernet", "uuid": uuid},
    }))
}

fn seeded_network() -> Arc<MemoryNetwork> {
    Arc::new(MemoryNetwork::from_seed(NetworkSeed {
        manager: ManagerState {
            wireless_enabled: true,
            networking_enabled: true,
            connectivity: 4,
            state: 70,
        },
        devices: vec![Device {
            interface: "eth0".into(),
            device_type: DeviceType::Ethernet,
            state_reason: (100, 0),
            active_connection: Some(ethernet_record("Wired 1", "e-1")),
        }],
        connections: vec![
            wifi_record("cafe", "w-1"),
            ethernet_record("Wired 1", "e-1"),
            wifi_record("office", "w-2"),
        ],
    }))
}

fn application(network: &Arc<MemoryNetwork>, config: &ServerConfig) -> AttributeTree {
    build_application(network.clone(), config).unwrap()
}

fn default_application(network: &Arc<MemoryNetwork>) -> AttributeTree {
    application(network, &ServerConfig::default())
}

fn with_test_service() -> ServerConfig {
    ServerConfig {
        test_service: true,
        ..ServerConfig::default()
    }
}

fn poller_for(tree: &AttributeTree, target: &str) -> CharacteristicId {
    tree.pollers()
        .into_iter()
        .map(|(id, _)| id)
        .find(|id| tree.characteristic_path(*id).map(ObjectPath::as_str) == Some(target))
        .unwrap()
}

/// Implements nothing, so every operation takes the default path.
struct Bare;

impl CharacteristicHandler for Bare {}
impl DescriptorHandler for Bare {}

// --- Object model ---

#[test]
fn managed_objects_list_every_node_once() {
    let network = seeded_network();
    let tree = default_application(&network);

    assert_eq!(tree.service_count(), 1);
    assert_eq!(tree.characteristic_count(), 4);
    assert_eq!(tree.descriptor_count(), 6);
    assert_eq!(tree.get_managed_objects().len(), 11);

    let tree = application(&network, &with_test_service());
    let objects = tree.get_managed_objects();
    assert_eq!(
        objects.len(),
        tree.service_count() + tree.characteristic_count() + tree.descriptor_count()
    );
    assert_eq!(objects.len(), 2 + 7 + 12);
}

#[test]
fn managed_objects_are_depth_first_in_insertion_order() {
    let network = seeded_network();
    let tree = default_application(&network);

    let paths: Vec<String> = tree
        .get_managed_objects()
        .keys()
        .map(|p| p.to_string())
        .collect();
    assert_eq!(
        paths,
        vec![
            SERVICE.to_string(),
            MANAGER_STATE.to_string(),
            WIRELESS_CONFIG.to_string(),
            ETHERNET_STATE.to_string(),
            format!("{}/desc0", ETHERNET_STATE),
            format!("{}/desc1", ETHERNET_STATE),
            format!("{}/desc2", ETHERNET_STATE),
            WIFI_STATE.to_string(),
            format!("{}/desc0", WIFI_STATE),
            format!("{}/desc1", WIFI_STATE),
            format!("{}/desc2", WIFI_STATE),
        ]
    );
    // a second enumeration is identical
    let again: Vec<ObjectPath> = tree.get_managed_objects().keys().cloned().collect();
    assert_eq!(again.len(), paths.len());
    assert!(again.iter().zip(&paths).all(|(a, b)| a.as_str() == b));
}

#[test]
fn every_path_descends_from_its_owner() {
    let network = seeded_network();
    let tree = application(&network, &with_test_service());

    for (object, ifaces) in tree.get_managed_objects() {
        assert!(object.is_descendant_of(tree.root()));
        if let Some(props) = ifaces.get(GATT_CHRC_IFACE) {
            let PropertyValue::Path(service) = &props["Service"] else {
                panic!("Service is not a path");
            };
            assert!(object.is_descendant_of(service));
        }
        if let Some(props) = ifaces.get(GATT_DESC_IFACE) {
            let PropertyValue::Path(chrc) = &props["Characteristic"] else {
                panic!("Characteristic is not a path");
            };
            assert!(object.is_descendant_of(chrc));
        }
    }
}

#[test]
fn service_properties_list_children() {
    let network = seeded_network();
    let tree = default_application(&network);

    let props = tree.get_all(&path(SERVICE), GATT_SERVICE_IFACE).unwrap();
    assert_eq!(
        props["UUID"],
        PropertyValue::Uuid(crate::services::network::NETWORK_SVC_UUID)
    );
    assert_eq!(props["Primary"], PropertyValue::Bool(true));
    assert_eq!(
        props["Characteristics"],
        PropertyValue::Paths(vec![
            path(MANAGER_STATE),
            path(WIRELESS_CONFIG),
            path(ETHERNET_STATE),
            path(WIFI_STATE),
        ])
    );
}

#[test]
fn notifying_is_exposed_only_on_notify_capable_characteristics() {
    let network = seeded_network();
    let tree = default_application(&network);

    let status = tree.get_all(&path(MANAGER_STATE), GATT_CHRC_IFACE).unwrap();
    assert_eq!(status["Notifying"], PropertyValue::Bool(false));
    assert_eq!(status["Flags"], PropertyValue::Flags(Flags::READ | Flags::NOTIFY));

    let config = tree.get_all(&path(WIRELESS_CONFIG), GATT_CHRC_IFACE).unwrap();
    assert!(!config.contains_key("Notifying"));
    assert_eq!(config["Flags"], PropertyValue::Flags(Flags::SECURE_WRITE));
}

#[test]
fn get_all_with_a_foreign_interface_is_invalid_args() {
    let network = seeded_network();
    let tree = default_application(&network);

    assert_eq!(
        tree.get_all(&path(MANAGER_STATE), GATT_SERVICE_IFACE),
        Err(GattError::InvalidArgs)
    );
    assert_eq!(
        tree.get_all(&path(SERVICE), "org.example.Nothing"),
        Err(GattError::InvalidArgs)
    );
}

#[test]
fn unknown_paths_are_reported() {
    let network = seeded_network();
    let mut tree = default_application(&network);
    let missing = path("/org/bluez/example/service0/char9");

    assert_eq!(
        tree.read_value(&missing, &Options::new()),
        Err(GattError::UnknownObject(missing.clone()))
    );
    assert_eq!(
        tree.get_all(&missing, GATT_CHRC_IFACE),
        Err(GattError::UnknownObject(missing))
    );
}

#[test]
fn duplicate_paths_are_rejected() {
    let mut tree = AttributeTree::new(&ServerConfig::default());
    let service = tree.add_service(0, 0x1800u16, true).unwrap();
    tree.add_characteristic(service, 0, 0x2a00u16, Flags::READ, Bare)
        .unwrap();

    assert_eq!(
        tree.add_service(0, 0x1801u16, true),
        Err(TreeError::DuplicatePath(path(SERVICE)))
    );
    assert_eq!(
        tree.add_characteristic(service, 0, 0x2a01u16, Flags::READ, Bare),
        Err(TreeError::DuplicatePath(path(
            "/org/bluez/example/service0/char0"
        )))
    );
    assert_eq!(tree.characteristic_count(), 1);
}

#[test]
fn owner_from_another_tree_is_rejected() {
    let mut big = AttributeTree::new(&ServerConfig::default());
    big.add_service(0, 0x1800u16, true).unwrap();
    let foreign = big.add_service(1, 0x1801u16, true).unwrap();

    let mut small = AttributeTree::new(&ServerConfig::default());
    assert_eq!(
        small.add_characteristic(foreign, 0, 0x2a00u16, Flags::READ, Bare),
        Err(TreeError::UnknownOwner)
    );
    assert_eq!(small.service_path(foreign), None);
    assert_eq!(
        big.service_path(foreign).map(ObjectPath::as_str),
        Some("/org/bluez/example/service1")
    );
}

#[test]
fn custom_service_base_is_used_for_paths() {
    let config = ServerConfig {
        service_path_base: "/com/example/gatt/svc".into(),
        ..ServerConfig::default()
    };
    let mut tree = AttributeTree::new(&config);
    let service = tree.add_service(3, 0x1800u16, true).unwrap();
    assert_eq!(
        tree.service_path(service).map(ObjectPath::as_str),
        Some("/com/example/gatt/svc3")
    );
}

// --- Dispatch contract ---

#[test]
fn default_handlers_are_not_supported() {
    let mut tree = AttributeTree::new(&ServerConfig::default());
    let service = tree.add_service(0, 0x1800u16, true).unwrap();
    let chrc = tree
        .add_characteristic(
            service,
            0,
            0x2a00u16,
            Flags::READ | Flags::WRITE | Flags::NOTIFY,
            Bare,
        )
        .unwrap();
    let desc = tree
        .add_descriptor(chrc, 0, 0x2901u16, Flags::READ | Flags::WRITE, Bare)
        .unwrap();
    let chrc = tree.characteristic_path(chrc).unwrap().clone();
    let desc = tree.descriptor_path(desc).unwrap().clone();
    let options = Options::new();

    assert_eq!(tree.read_value(&chrc, &options), Err(GattError::NotSupported));
    assert_eq!(
        tree.write_value(&chrc, b"x", &options),
        Err(GattError::NotSupported)
    );
    assert_eq!(tree.start_notify(&chrc), Err(GattError::NotSupported));
    assert_eq!(tree.stop_notify(&chrc), Err(GattError::NotSupported));
    assert_eq!(tree.read_value(&desc, &options), Err(GattError::NotSupported));
    assert_eq!(
        tree.write_value(&desc, b"x", &options),
        Err(GattError::NotSupported)
    );
}

#[test]
fn descriptors_and_services_never_notify() {
    let network = seeded_network();
    let mut tree = default_application(&network);
    let desc = path(&format!("{}/desc0", ETHERNET_STATE));

    assert_eq!(tree.start_notify(&desc), Err(GattError::NotSupported));
    assert_eq!(tree.stop_notify(&desc), Err(GattError::NotSupported));
    assert_eq!(tree.start_notify(&path(SERVICE)), Err(GattError::NotSupported));
    assert_eq!(
        tree.read_value(&path(SERVICE), &Options::new()),
        Err(GattError::NotSupported)
    );
}

#[test]
fn advisory_policy_leaves_checks_to_handlers() {
    let network = seeded_network();
    let mut tree = default_application(&network);
    let options = Options::new();

    // handlers do not implement these
    assert_eq!(
        tree.write_value(&path(MANAGER_STATE), &[1], &options),
        Err(GattError::NotSupported)
    );
    assert_eq!(
        tree.read_value(&path(WIRELESS_CONFIG), &options),
        Err(GattError::NotSupported)
    );
    assert_eq!(
        tree.start_notify(&path(WIRELESS_CONFIG)),
        Err(GattError::NotSupported)
    );
}

#[test]
fn enforced_policy_rejects_undeclared_operations() {
    let network = seeded_network();
    let config = ServerConfig {
        dispatch: DispatchPolicy::Enforced,
        ..ServerConfig::default()
    };
    let mut tree = application(&network, &config);
    let options = Options::new();

    assert_eq!(
        tree.write_value(&path(MANAGER_STATE), &[1], &options),
        Err(GattError::NotPermitted)
    );
    assert_eq!(
        tree.read_value(&path(WIRELESS_CONFIG), &options),
        Err(GattError::NotPermitted)
    );
    assert_eq!(
        tree.start_notify(&path(WIRELESS_CONFIG)),
        Err(GattError::NotSupported)
    );
    // declared operations still reach the handler
    assert_eq!(
        tree.read_value(&path(MANAGER_STATE), &options),
        Ok(vec![1, 1, 4, 70])
    );
    assert!(network.calls().is_empty());
}

// --- Status characteristics ---

#[test]
fn manager_state_is_four_bytes() {
    let network = seeded_network();
    let mut tree = default_application(&network);

    // sampled at construction
    assert_eq!(
        tree.stored_value(&path(MANAGER_STATE)).unwrap(),
        &[1, 1, 4, 70]
    );

    network.set_manager_state(ManagerState {
        wireless_enabled: false,
        networking_enabled: true,
        connectivity: 1,
        state: 300,
    });
    // out-of-range enumerants saturate
    assert_eq!(
        tree.read_value(&path(MANAGER_STATE), &Options::new()),
        Ok(vec![0, 1, 1, 255])
    );
    assert_eq!(
        tree.stored_value(&path(MANAGER_STATE)).unwrap(),
        &[0, 1, 1, 255]
    );
}

#[test]
fn device_state_is_state_and_reason() {
    let network = seeded_network();
    let mut tree = default_application(&network);

    assert_eq!(
        tree.read_value(&path(ETHERNET_STATE), &Options::new()),
        Ok(vec![100, 0])
    );
}

#[test]
fn absent_device_reads_empty_and_never_pushes() {
    let network = seeded_network();
    let mut tree = default_application(&network);
    let wifi = path(WIFI_STATE);

    assert_eq!(tree.read_value(&wifi, &Options::new()), Ok(vec![]));

    tree.start_notify(&wifi).unwrap();
    assert_eq!(tree.notify_state(&wifi), Ok(NotifyState::Active));
    assert!(tree.take_signals().is_empty());

    let id = poller_for(&tree, WIFI_STATE);
    tree.tick(id);
    assert!(tree.take_signals().is_empty());

    network.put_device(Device {
        interface: "wlan0".into(),
        device_type: DeviceType::Wifi,
        state_reason: (30, 2),
        active_connection: None,
    });
    tree.tick(id);
    assert_eq!(
        tree.take_signals(),
        vec![PropertiesChanged::value(wifi.clone(), vec![30, 2])]
    );

    // the device goes away again: value empties, nothing is pushed
    network.remove_device(DeviceType::Wifi);
    tree.tick(id);
    assert!(tree.take_signals().is_empty());
    assert!(tree.stored_value(&wifi).unwrap().is_empty());
}

#[test]
fn start_notify_twice_pushes_once() {
    let network = seeded_network();
    let mut tree = default_application(&network);
    let chrc = path(MANAGER_STATE);

    assert_eq!(tree.notify_state(&chrc), Ok(NotifyState::Idle));
    tree.start_notify(&chrc).unwrap();
    tree.start_notify(&chrc).unwrap();

    assert_eq!(
        tree.take_signals(),
        vec![PropertiesChanged::value(chrc.clone(), vec![1, 1, 4, 70])]
    );
    let props = tree.get_all(&chrc, GATT_CHRC_IFACE).unwrap();
    assert_eq!(props["Notifying"], PropertyValue::Bool(true));
}

#[test]
fn stop_notify_is_idempotent() {
    let network = seeded_network();
    let mut tree = default_application(&network);
    let chrc = path(ETHERNET_STATE);

    // idle: no-op
    tree.stop_notify(&chrc).unwrap();
    assert_eq!(tree.notify_state(&chrc), Ok(NotifyState::Idle));

    tree.start_notify(&chrc).unwrap();
    tree.stop_notify(&chrc).unwrap();
    tree.stop_notify(&chrc).unwrap();
    assert_eq!(tree.notify_state(&chrc), Ok(NotifyState::Idle));
    assert_eq!(tree.take_signals().len(), 1);
}

#[test]
fn ticks_sample_while_idle_and_push_while_active() {
    let network = seeded_network();
    let mut tree = default_application(&network);
    let chrc = path(ETHERNET_STATE);
    let id = poller_for(&tree, ETHERNET_STATE);

    network.put_device(Device {
        interface: "eth0".into(),
        device_type: DeviceType::Ethernet,
        state_reason: (20, 40),
        active_connection: None,
    });
    tree.tick(id);
    assert!(tree.take_signals().is_empty());
    assert_eq!(tree.stored_value(&chrc).unwrap(), &[20, 40]);

    tree.start_notify(&chrc).unwrap();
    tree.take_signals();
    network.put_device(Device {
        interface: "eth0".into(),
        device_type: DeviceType::Ethernet,
        state_reason: (100, 0),
        active_connection: None,
    });
    tree.tick(id);
    assert_eq!(
        tree.take_signals(),
        vec![PropertiesChanged::value(chrc, vec![100, 0])]
    );
}

#[test]
fn failed_sample_keeps_the_last_value() {
    let network = seeded_network();
    let mut tree = default_application(&network);
    let chrc = path(MANAGER_STATE);
    let id = poller_for(&tree, MANAGER_STATE);
    tree.start_notify(&chrc).unwrap();
    tree.take_signals();

    network.set_available(false);
    tree.tick(id);
    assert!(tree.take_signals().is_empty());
    assert_eq!(tree.stored_value(&chrc).unwrap(), &[1, 1, 4, 70]);
    assert!(matches!(
        tree.read_value(&chrc, &Options::new()),
        Err(GattError::Failed(_))
    ));
}

#[test]
fn every_status_characteristic_polls_at_the_configured_period() {
    let network = seeded_network();
    let config = ServerConfig {
        poll_interval_ms: 250,
        ..ServerConfig::default()
    };
    let tree = application(&network, &config);

    let pollers = tree.pollers();
    assert_eq!(pollers.len(), 3);
    assert!(pollers
        .iter()
        .all(|(_, period)| *period == std::time::Duration::from_millis(250)));
}

#[test]
fn active_connection_descriptors_read_dotted_settings() {
    let network = seeded_network();
    let mut tree = default_application(&network);
    let read = |tree: &mut AttributeTree, p: String| {
        tree.read_value(&path(&p), &Options::new()).unwrap()
    };

    assert_eq!(
        read(&mut tree, format!("{}/desc0", ETHERNET_STATE)),
        b"802-3-ethernet"
    );
    assert_eq!(read(&mut tree, format!("{}/desc1", ETHERNET_STATE)), b"Wired 1");
    assert_eq!(read(&mut tree, format!("{}/desc2", ETHERNET_STATE)), b"e-1");

    // no wifi device yet
    assert!(read(&mut tree, format!("{}/desc1", WIFI_STATE)).is_empty());
    assert!(tree
        .stored_value(&path(&format!("{}/desc1", WIFI_STATE)))
        .unwrap()
        .is_empty());
}

// --- Wireless configuration ---

#[test]
fn credentials_replace_every_wireless_connection() {
    let network = seeded_network();
    let mut tree = default_application(&network);

    tree.write_value(
        &path(WIRELESS_CONFIG),
        b"ssid=home&psk=secret123",
        &Options::new(),
    )
    .unwrap();

    let calls = network.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0], NetworkCall::ListConnections);
    assert_eq!(calls[1], NetworkCall::DeleteConnection("w-1".into()));
    assert_eq!(calls[2], NetworkCall::DeleteConnection("w-2".into()));
    let NetworkCall::AddConnection(settings) = &calls[3] else {
        panic!("expected an add, got {:?}", calls[3]);
    };
    assert_eq!(settings.lookup("connection.id"), "home");
    assert_eq!(settings.lookup("connection.type"), "802-11-wireless");
    assert_eq!(settings.lookup("802-11-wireless.ssid"), "home");
    assert_eq!(settings.lookup("802-11-wireless-security.key-mgmt"), "wpa-psk");
    assert_eq!(settings.lookup("802-11-wireless-security.psk"), "secret123");
    assert_eq!(settings.lookup("ipv4.method"), "auto");

    let remaining = network.connections();
    assert_eq!(remaining.len(), 2);
    assert_eq!(remaining[0].lookup("connection.uuid"), "e-1");
    assert_eq!(remaining[1].lookup("connection.id"), "home");
}

#[test]
fn blank_credentials_only_clear_wireless_connections() {
    let network = seeded_network();
    let mut tree = default_application(&network);

    tree.write_value(&path(WIRELESS_CONFIG), b"ssid=&psk=", &Options::new())
        .unwrap();

    assert_eq!(
        network.calls(),
        vec![
            NetworkCall::ListConnections,
            NetworkCall::DeleteConnection("w-1".into()),
            NetworkCall::DeleteConnection("w-2".into()),
        ]
    );
    assert_eq!(network.connections(), vec![ethernet_record("Wired 1", "e-1")]);
}

#[test]
fn malformed_payload_touches_nothing() {
    let network = seeded_network();
    let mut tree = default_application(&network);

    assert_eq!(
        tree.write_value(&path(WIRELESS_CONFIG), &[0xff, 0xfe, 0x00], &Options::new()),
        Err(GattError::InvalidArgs)
    );
    assert!(network.calls().is_empty());
    assert_eq!(network.connections().len(), 3);
}

#[test]
fn wireless_connection_without_uuid_fails_the_write() {
    let network = seeded_network();
    network.insert_connection(ConnectionSettings::new(json!({
        "connection": {"id": "legacy", "type": "802-11-wireless"},
    })));
    let mut tree = default_application(&network);

    assert_eq!(
        tree.write_value(&path(WIRELESS_CONFIG), b"ssid=home&psk=x", &Options::new()),
        Err(GattError::Failed("wireless connection without uuid".into()))
    );

    // records before it were removed, nothing was created
    assert!(!network
        .calls()
        .iter()
        .any(|call| matches!(call, NetworkCall::AddConnection(_))));
    let ids: Vec<String> = network
        .connections()
        .iter()
        .map(|c| c.lookup("connection.id"))
        .collect();
    assert_eq!(ids, vec!["Wired 1", "legacy"]);
}

#[test]
fn escape_outside_utf8_still_provisions() {
    let network = seeded_network();
    let mut tree = default_application(&network);

    tree.write_value(
        &path(WIRELESS_CONFIG),
        b"ssid=%ff&psk=secret123",
        &Options::new(),
    )
    .unwrap();

    let remaining = network.connections();
    assert_eq!(remaining.len(), 2);
    assert_eq!(remaining[1].lookup("connection.id"), "\u{fffd}");
    assert_eq!(
        remaining[1].lookup("802-11-wireless-security.psk"),
        "secret123"
    );
}

#[test]
fn collaborator_failure_aborts_the_write() {
    let network = seeded_network();
    let mut tree = default_application(&network);
    network.set_available(false);

    let err = tree
        .write_value(&path(WIRELESS_CONFIG), b"ssid=a&psk=b", &Options::new())
        .unwrap_err();
    assert!(matches!(err, GattError::Failed(_)));
    assert_eq!(err.fault_name(), "org.bluez.Error.Failed");
    assert_eq!(network.connections().len(), 3);
}

// --- Test service ---

const TEST_PLAIN: &str = "/org/bluez/example/service1/char0";
const TEST_ENCRYPTED: &str = "/org/bluez/example/service1/char1";
const TEST_SECURE: &str = "/org/bluez/example/service1/char2";

#[test]
fn test_service_characteristic_stores_writes() {
    let network = seeded_network();
    let mut tree = application(&network, &with_test_service());
    let options = Options::new();

    for chrc in [TEST_PLAIN, TEST_ENCRYPTED, TEST_SECURE] {
        assert_eq!(tree.read_value(&path(chrc), &options), Ok(vec![]));
        tree.write_value(&path(chrc), &[0xde, 0xad], &options).unwrap();
        assert_eq!(tree.read_value(&path(chrc), &options), Ok(vec![0xde, 0xad]));
    }
}

#[test]
fn static_descriptors_read_test() {
    let network = seeded_network();
    let mut tree = application(&network, &with_test_service());

    for desc in [
        format!("{}/desc0", TEST_PLAIN),
        format!("{}/desc2", TEST_ENCRYPTED),
        format!("{}/desc2", TEST_SECURE),
    ] {
        assert_eq!(
            tree.read_value(&path(&desc), &Options::new()),
            Ok(b"Test".to_vec())
        );
    }
}

#[test]
fn user_description_is_writable_only_with_writable_auxiliaries() {
    let network = seeded_network();
    let mut tree = application(&network, &with_test_service());
    let options = Options::new();
    let writable = path(&format!("{}/desc1", TEST_PLAIN));
    let locked = path(&format!("{}/desc3", TEST_ENCRYPTED));

    assert_eq!(
        tree.read_value(&locked, &options),
        Ok(b"This is a characteristic for testing".to_vec())
    );
    assert_eq!(
        tree.write_value(&locked, b"mine", &options),
        Err(GattError::NotPermitted)
    );

    tree.write_value(&writable, b"mine", &options).unwrap();
    assert_eq!(tree.read_value(&writable, &options), Ok(b"mine".to_vec()));
}
