use welldepth_core::units::{
    adjust_pressure_for_elevation, head_m_to_kpa, kpa_to_head_m, to_head_m, to_kpa, GRAVITY,
};
use welldepth_parser::MeasurementUnit;

#[test]
fn pressure_head_round_trip() {
    for kpa in [0.0, 1.5, 79.412, 101.325] {
        let back = head_m_to_kpa(kpa_to_head_m(kpa));
        assert!((back - kpa).abs() < 1e-12, "{kpa} -> {back}");
    }
}

#[test]
fn one_metre_of_water_is_gravity_kpa() {
    assert!((kpa_to_head_m(GRAVITY) - 1.0).abs() < 1e-12);
}

#[test]
fn ingestion_units_convert_to_kpa_and_metres() {
    assert!((to_kpa(794.3, MeasurementUnit::Millibar) - 79.43).abs() < 1e-9);
    assert!((to_kpa(29.92, MeasurementUnit::InchesMercury) - 101.3208).abs() < 1e-3);
    assert_eq!(to_kpa(80.0, MeasurementUnit::KiloPascal), 80.0);
    assert!((to_head_m(52.5, MeasurementUnit::Centimeters) - 0.525).abs() < 1e-12);
    assert_eq!(to_head_m(1.25, MeasurementUnit::Meters), 1.25);
    assert!((to_head_m(GRAVITY, MeasurementUnit::KiloPascal) - 1.0).abs() < 1e-12);
}

#[test]
fn elevation_adjustment_direction() {
    let at_site = 80.0;
    let at_sea_level = adjust_pressure_for_elevation(at_site, 1900.0, 0.0, Some(15.0));
    assert!(at_sea_level > at_site);

    let higher = adjust_pressure_for_elevation(at_site, 1900.0, 2000.0, None);
    assert!(higher < at_site);

    assert_eq!(adjust_pressure_for_elevation(at_site, 1900.0, 1900.0, None), at_site);
}

#[test]
fn standard_atmosphere_at_altitude() {
    // ~89.87 kPa at 1000 m in the standard atmosphere.
    let p = adjust_pressure_for_elevation(101.325, 0.0, 1000.0, None);
    assert!((p - 89.87).abs() < 0.05, "got {p}");
}

#[test]
fn elevation_adjustment_inverts_without_temperature() {
    let at_well = 80.0;
    let at_reference = adjust_pressure_for_elevation(at_well, 1941.2, 0.0, None);
    let back = adjust_pressure_for_elevation(at_reference, 0.0, 1941.2, None);
    assert!((back - at_well).abs() < 1e-9, "got {back}");
}
