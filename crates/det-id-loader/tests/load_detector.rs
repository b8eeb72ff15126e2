//! End-to-end load of a description file from disk.

use std::io::Write;

use det_id_loader::{load_detector, LoaderError, SENSOR_NUMBER_KEY};

const DESCRIPTION: &str = r#"
[detector]
name = "ldmx"

[[schemas]]
name = "wire"
fields = [
    { name = "subdetector", start_bit = 26, end_bit = 31 },
    { name = "wire", start_bit = 0, end_bit = 11 },
]

[[subsystems]]
name = "ecal"
kind = "ecal"

[[subsystems.volumes]]
name = "ecal_layer1"
copy_number = 1
position = [0.0, 0.0, 223.5]

[[subsystems.volumes]]
name = "ecal_layer2"
copy_number = 2
position = [0.0, 0.0, 232.1]

[[subsystems]]
name = "hcal"
kind = "hcal"

[[subsystems.volumes]]
name = "hcal_back_layer4"
copy_number = 4
position = [0.0, 0.0, 870.0]

[[subsystems]]
name = "recoil"
kind = "recoil_tracker"

[[subsystems.volumes]]
name = "recoil_l5_sensor1"
copy_number = 5
position = [-40.0, 0.0, 180.0]

[[subsystems.volumes]]
name = "recoil_l5_sensor2"
copy_number = 5
position = [-20.0, 0.0, 180.0]

[[subsystems.volumes]]
name = "recoil_l5_sensor3"
copy_number = 5
position = [0.0, 0.0, 180.0]

[[subsystems.volumes]]
name = "recoil_l5_sensor4"
copy_number = 5
position = [20.0, 0.0, 180.0]

[[subsystems.volumes]]
name = "recoil_l5_sensor5"
copy_number = 5
position = [40.0, 0.0, 180.0]

[[subsystems.volumes]]
name = "recoil_l5_sensor6"
copy_number = 5
position = [-40.0, 10.0, 181.0]

[[subsystems.volumes]]
name = "recoil_l5_sensor7"
copy_number = 5
position = [-20.0, 10.0, 181.0]

[[subsystems.volumes]]
name = "recoil_l5_sensor8"
copy_number = 5
position = [0.0, 10.0, 181.0]

[[subsystems.volumes]]
name = "recoil_l5_sensor9"
copy_number = 5
position = [20.0, 10.0, 181.0]

[[subsystems.volumes]]
name = "recoil_l5_sensor10"
copy_number = 5
position = [40.0, 10.0, 181.0]

[[subsystems]]
name = "trig_scint_up"
kind = "trigger_scint"
module = 1

[[subsystems.volumes]]
name = "bar0"
copy_number = 0

[[subsystems.volumes]]
name = "bar1"
copy_number = 1

[[subsystems]]
name = "target"
kind = "target"

[[subsystems.volumes]]
name = "target_vol"
copy_number = 0
position = [0.0, 0.0, 0.1]
"#;

fn write_description(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn loads_a_full_description() {
    let file = write_description(DESCRIPTION);
    let detector = load_detector(file.path()).unwrap();

    assert_eq!(detector.name(), "ldmx");
    let tree = detector.tree();

    // every subsystem root hangs off the top element
    for name in ["ecal", "hcal", "recoil", "trig_scint_up", "target"] {
        assert!(tree.find_child(detector.top(), name).is_some(), "{name}");
    }

    // ecal layers decode back through the registry
    let ecal = tree.find_child(detector.top(), "ecal").unwrap();
    let layer2 = tree.find_child(ecal, "ecal_layer2").unwrap();
    let raw = tree.node(layer2).raw_id();
    assert_eq!(det_id::EcalId::from_raw(raw).layer(), 2);
    assert_eq!(detector.registry().lookup_by_id(raw), Some(layer2));

    // hcal station convention
    let hcal = tree.find_child(detector.top(), "hcal").unwrap();
    let back4 = tree.find_child(hcal, "hcal_back_layer4").unwrap();
    let id = det_id::HcalId::from_raw(tree.node(back4).raw_id());
    assert_eq!(id.layer(), 4);
    assert_eq!(id.station().unwrap(), 4);

    // custom schema came through
    let wire = detector.custom_codec("wire").unwrap();
    assert_eq!(wire.field_count(), 2);
    assert!(detector.custom_codec("bogus").is_none());
}

#[test]
fn fan_out_layer_with_ten_sensors() {
    let file = write_description(DESCRIPTION);
    let detector = load_detector(file.path()).unwrap();
    let tree = detector.tree();

    let recoil = tree.find_child(detector.top(), "recoil").unwrap();
    let layer = tree.find_child(recoil, "recoil_layer5").unwrap();

    assert!(tree.node(layer).support().is_none());
    assert!(tree.node(layer).has_id());
    assert_eq!(tree.node(layer).children().len(), 10);

    for n in 1..=10u32 {
        let name = format!("recoil_l5_sensor{n}");
        let sensor = tree.find_child(layer, &name).unwrap();
        assert_eq!(tree.node(sensor).name(), name);
        assert_eq!(tree.get_meta::<u32>(sensor, SENSOR_NUMBER_KEY), Some(&n));
        assert!(!tree.node(sensor).has_id());
        assert!(tree.node(sensor).has_position());
    }

    // position lookup resolves to a sensor leaf, hinted to the recoil subtree
    let found = detector
        .registry()
        .lookup_by_position(tree, [19.0, 1.0, 180.0], Some(recoil))
        .unwrap();
    assert_eq!(tree.node(found).name(), "recoil_l5_sensor4");
}

#[test]
fn tree_invariants_hold_across_the_whole_detector() {
    let file = write_description(DESCRIPTION);
    let detector = load_detector(file.path()).unwrap();
    let tree = detector.tree();

    for node in tree.descendants(detector.top()) {
        let element = tree.node(node);

        // every non-root node is findable from its parent by name
        if let Some(parent) = element.parent() {
            assert_eq!(tree.find_child(parent, element.name()), Some(node));
        }

        // every node below the top resolves a codec through its ancestry
        if node != detector.top() {
            assert!(tree.codec_of(node).is_ok(), "{}", element.name());
        }

        // every assigned ID round-trips through the registry
        if element.has_id() {
            assert_eq!(
                detector.registry().lookup_by_id(element.raw_id()),
                Some(node),
                "{}",
                element.name()
            );
        }
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_detector("/definitely/not/here.toml").unwrap_err();
    assert!(matches!(err, LoaderError::Io { .. }));
}

#[test]
fn broken_toml_is_a_parse_error() {
    let file = write_description("[detector\nname = ");
    let err = load_detector(file.path()).unwrap_err();
    assert!(matches!(err, LoaderError::Parse(_)));
}
