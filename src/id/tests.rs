use super::*;
use proptest::prelude::*;

#[test]
fn test_pack_known_value() {
    let run2d = ReductionVersion::parse("103").unwrap();
    let id = SpecObjId::pack(1963, 54331, 19, &run2d).unwrap();
    assert_eq!(id.value(), 2210146812474530816);

    let u = id.unpack();
    assert_eq!(u.plate, 1963);
    assert_eq!(u.mjd, 54331);
    assert_eq!(u.fiber, 19);
    assert_eq!(u.run2d_str(), "103");
}

#[test]
fn test_pack_version_string() {
    let run2d = ReductionVersion::parse("v5_7_0").unwrap();
    let id = SpecObjId::pack(4055, 55359, 408, &run2d).unwrap();
    assert_eq!(id.value(), 4565636362342690816);

    let u = id.unpack();
    assert_eq!((u.plate, u.mjd, u.fiber), (4055, 55359, 408));
    assert_eq!(u.run2d_str(), "v5_7_0");
}

#[test]
fn test_low_bits_are_zero() {
    let run2d = ReductionVersion::parse("v5_13_0").unwrap();
    let id = SpecObjId::pack(8954, 57453, 340, &run2d).unwrap();
    assert_eq!(id.value() % 1024, 0);
}

#[test]
fn test_legacy_run2d_spellings_are_stable() {
    // 103 = v5_1_3, 104 = v5_1_4, 26 = v5_0_26 collide in the encoding;
    // the decimal spelling wins when unpacking.
    for legacy in ["103", "104", "26"] {
        let run2d = ReductionVersion::parse(legacy).unwrap();
        let id = SpecObjId::pack(1963, 54331, 19, &run2d).unwrap();
        assert_eq!(id.unpack().run2d_str(), legacy);
    }
    let alias = ReductionVersion::parse("v5_1_3").unwrap();
    assert_eq!(alias.code(), 103);
    let id = SpecObjId::pack(1963, 54331, 19, &alias).unwrap();
    assert_eq!(id.unpack().run2d_str(), "103");
}

#[test]
fn test_zero_run2d_unpacks_empty() {
    let id = SpecObjId::new((1963u64 << 50) | (19u64 << 38) | (4331u64 << 24));
    assert_eq!(id.unpack().run2d_str(), "");
}

#[test]
fn test_pack_rejects_out_of_range_fields() {
    let run2d = ReductionVersion::Numeric(26);
    assert!(SpecObjId::pack(0, 54331, 19, &run2d).is_err());
    assert!(SpecObjId::pack(1 << 14, 54331, 19, &run2d).is_err());
    assert!(SpecObjId::pack(1963, 50000, 19, &run2d).is_err());
    assert!(SpecObjId::pack(1963, 49999, 19, &run2d).is_err());
    assert!(SpecObjId::pack(1963, 54331, 1 << 12, &run2d).is_err());
}

#[test]
fn test_malformed_run2d_strings() {
    for bad in ["v5_7", "v7_0_0", "v5_100_0", "x5_7_0", "v5_7_0_1", ""] {
        assert!(ReductionVersion::parse(bad).is_err(), "accepted '{bad}'");
    }
}

#[test]
fn test_parse_bare_integer_list() {
    let toks = parse_id_list("2210146812474530816, 4565636362342690816").unwrap();
    assert_eq!(toks.len(), 2);
    assert!(matches!(
        toks[0],
        IdToken::Packed(id) if id.value() == 2210146812474530816
    ));
}

#[test]
fn test_parse_bracketed_list() {
    let toks = parse_id_list("[2210146812474530816]").unwrap();
    assert_eq!(toks.len(), 1);
}

#[test]
fn test_parse_literal_tuple() {
    let toks = parse_id_list("(1963,54331,120,'103')").unwrap();
    assert_eq!(toks.len(), 1);
    match &toks[0] {
        IdToken::Literal(t) => {
            assert_eq!((t.plate, t.mjd, t.fiber), (1963, 54331, 120));
            assert_eq!(t.run2d, Some(ReductionVersion::Numeric(103)));
            assert_eq!(t.survey, "sdss");
        }
        other => panic!("expected literal tuple, got {other:?}"),
    }
}

#[test]
fn test_short_tuple_becomes_wildcard() {
    // (plate, mjd) pads out to (plate, mjd, *, *).
    let toks = parse_id_list("(1963,54331)").unwrap();
    match &toks[0] {
        IdToken::Wildcard(w) => {
            assert_eq!(w.plate, FieldSpec::One("1963".into()));
            assert_eq!(w.mjd, FieldSpec::One("54331".into()));
            assert_eq!(w.fiber, FieldSpec::Any);
            assert_eq!(w.run2d, FieldSpec::Any);
        }
        other => panic!("expected wildcard tuple, got {other:?}"),
    }
}

#[test]
fn test_quoted_list_and_range_fields() {
    let toks = parse_id_list("('1962,1963','*',100-200,'26,103')").unwrap();
    match &toks[0] {
        IdToken::Wildcard(w) => {
            assert_eq!(
                w.plate,
                FieldSpec::List(vec!["1962".into(), "1963".into()])
            );
            assert_eq!(w.mjd, FieldSpec::Any);
            assert_eq!(w.fiber, FieldSpec::Range(100, 200));
            assert_eq!(w.run2d, FieldSpec::List(vec!["26".into(), "103".into()]));
        }
        other => panic!("expected wildcard tuple, got {other:?}"),
    }
}

#[test]
fn test_mixed_list_preserves_order() {
    let toks = parse_id_list("(1963,54331,120,'103') 2210146812474530816 (1963,54331,121,'103')")
        .unwrap();
    assert_eq!(toks.len(), 3);
    assert!(matches!(toks[0], IdToken::Literal(_)));
    assert!(matches!(toks[1], IdToken::Packed(_)));
    assert!(matches!(toks[2], IdToken::Literal(_)));
}

#[test]
fn test_parse_rejects_garbage() {
    assert!(parse_id_list("").is_err());
    assert!(parse_id_list("spectrum-nine").is_err());
}

proptest! {
    // Codec round-trip over the full valid field domain.
    #[test]
    fn prop_pack_unpack_roundtrip(
        plate in 1u32..(1 << 14),
        mjd in 50001u32..(50000 + (1 << 14)),
        fiber in 1u32..(1 << 12),
        n in 5u8..=6,
        m in 0u8..=99,
        p in 0u8..=99,
    ) {
        let run2d = ReductionVersion::Version { n, m, p };
        prop_assume!((run2d.code() as u32) < (1 << 14));
        let id = SpecObjId::pack(plate, mjd, fiber, &run2d).unwrap();
        prop_assert_eq!(id.value() % 1024, 0);
        let u = id.unpack();
        prop_assert_eq!(u.plate, plate);
        prop_assert_eq!(u.mjd, mjd);
        prop_assert_eq!(u.fiber, fiber);
        // Repacking the unpacked spelling restores the same bits.
        let r = u.run2d.unwrap();
        let back = SpecObjId::pack(u.plate, u.mjd, u.fiber, &r).unwrap();
        prop_assert_eq!(back.value(), id.value());
    }
}
