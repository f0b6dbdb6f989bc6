use welldepth_core::wells::WellRegistry;
use welldepth_parser::WellIdCorrectionRow;

fn correction(from: &str, to: &str) -> WellIdCorrectionRow {
    WellIdCorrectionRow {
        well_field_id: from.to_string(),
        well_id: to.to_string(),
    }
}

#[test]
fn without_a_list_every_id_resolves() {
    let wells = WellRegistry::new(None, vec![correction("EWR1", "EWR-1")]);
    assert_eq!(wells.resolve(" EWR1 ").as_deref(), Some("EWR-1"));
    assert_eq!(wells.resolve("KET-1").as_deref(), Some("KET-1"));
}

#[test]
fn list_rejects_unknown_ids_after_correction() {
    let wells = WellRegistry::new(
        Some(vec!["EWR-1".to_string()]),
        vec![correction("EWR1", "EWR-1")],
    );
    assert_eq!(wells.resolve("EWR1").as_deref(), Some("EWR-1"));
    assert_eq!(wells.resolve("KET-1"), None);
    assert_eq!(wells.canonical("KET-1"), "KET-1");
}
