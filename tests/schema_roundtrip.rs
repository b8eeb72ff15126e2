//! Cross-module checks on the standard schemas: pack/unpack laws, generic
//! dispatch, and the raw-word layouts hits actually carry.

use det_id::subdet::{
    ecal_schema, hcal_schema, recoil_schema, tagger_schema, target_schema, trig_scint_schema,
    trigger_pad_schema,
};
use det_id::{
    CodecRegistry, EcalId, HcalId, HcalSection, Subdetector, TrigScintId, SUBDETECTOR_SHIFT,
};

#[test]
fn hcal_back_layer_four() {
    let codec = hcal_schema();
    let mut v = codec.values();
    v.set(0, Subdetector::Hcal as u32).unwrap();
    v.set(1, 4).unwrap();
    v.set(2, HcalSection::Back as u32).unwrap();

    let raw = codec.pack(&v).unwrap();
    assert_eq!(codec.unpack(raw).as_slice(), &[6, 4, 0]);

    let id = HcalId::from_raw(raw);
    assert_eq!(id.layer(), 4);
    assert_eq!(id.section().unwrap(), HcalSection::Back);
}

#[test]
fn trig_scint_module_three_bar_two_hundred() {
    let codec = trig_scint_schema();
    let mut v = codec.values();
    v.set(0, 3).unwrap();
    v.set(1, 200).unwrap();

    let raw = codec.pack(&v).unwrap();
    let decoded = codec.unpack(raw);
    assert_eq!(decoded.get(0).unwrap(), 3);
    assert_eq!(decoded.get(1).unwrap(), 200);

    assert_eq!(raw, TrigScintId::new(3, 200).unwrap().raw());
}

#[test]
fn pack_unpack_is_identity_for_in_range_values() {
    // spot-check each standard schema at its field extremes
    let schemas = [
        (ecal_schema(), vec![5u32, 255]),
        (hcal_schema(), vec![6, 2047, 4]),
        (tagger_schema(), vec![1, 17]),
        (recoil_schema(), vec![4, 0]),
        (trig_scint_schema(), vec![31, 1023]),
        (target_schema(), vec![3]),
        (trigger_pad_schema(), vec![7]),
    ];
    for (codec, inputs) in schemas {
        let mut v = codec.values();
        for (i, &value) in inputs.iter().enumerate() {
            v.set(i, value).unwrap();
        }
        let raw = codec.pack(&v).unwrap();
        assert_eq!(codec.unpack(raw), v, "{}", codec.name());
    }
}

#[test]
fn registry_decodes_what_typed_ids_produce() {
    let registry = CodecRegistry::standard();

    let ecal = EcalId::new(17).unwrap();
    let (subdet, values) = registry.decode(ecal.raw()).unwrap();
    assert_eq!(subdet, Subdetector::Ecal);
    assert_eq!(values.as_slice(), &[5, 17]);

    let hcal = HcalId::new(HcalSection::WrapRight, 9).unwrap();
    let (subdet, values) = registry.decode(hcal.raw()).unwrap();
    assert_eq!(subdet, Subdetector::Hcal);
    assert_eq!(values.as_slice(), &[6, 9, 4]);
}

#[test]
fn distinct_subsystems_never_share_a_raw_word() {
    // same layer number, different discriminant
    let words = [
        EcalId::new(1).unwrap().raw(),
        det_id::TrackerId::new(Subdetector::TaggerTracker, 1).unwrap().raw(),
        det_id::TrackerId::new(Subdetector::RecoilTracker, 1).unwrap().raw(),
        (Subdetector::Target as u32) << SUBDETECTOR_SHIFT,
        (Subdetector::TriggerPad as u32) << SUBDETECTOR_SHIFT,
    ];
    for (i, a) in words.iter().enumerate() {
        for b in &words[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn subdetector_enum_round_trips_through_serde() {
    for subdet in [
        Subdetector::Null,
        Subdetector::TaggerTracker,
        Subdetector::TriggerScint,
        Subdetector::Target,
        Subdetector::RecoilTracker,
        Subdetector::Ecal,
        Subdetector::Hcal,
        Subdetector::TriggerPad,
    ] {
        let json = serde_json::to_string(&subdet).unwrap();
        assert_eq!(json, format!("\"{}\"", subdet.name()));
        let back: Subdetector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, subdet);
    }
}
