//! Loading the style config from disk.

use panel_layout::{ColumnPlacement, PanelSpec};
use renderer::{PaletteName, ValueRange};
use solar_api::config::{LayerStyle, PaletteSpec, SolarConfig};
use solar_api::layers::LayerKind;
use test_utils::{service_config_path, temp_test_dir};

#[test]
fn test_shipped_config_matches_builtins() {
    let path = service_config_path("solar-api", "layers.yaml");
    let config = SolarConfig::load(&path).unwrap();

    assert_eq!(config.radius_meters, 50.0);
    assert_eq!(config.panels, PanelSpec::default());
    assert_eq!(config.column_placement, ColumnPlacement::Spread);
    for kind in [
        LayerKind::Rgb,
        LayerKind::AnnualFlux,
        LayerKind::MonthlyFlux,
        LayerKind::Dsm,
        LayerKind::Mask,
    ] {
        assert_eq!(config.style(kind), LayerStyle::builtin(kind), "{}", kind);
    }
}

#[test]
fn test_load_custom_file() {
    let dir = temp_test_dir();
    let path = dir.path().join("layers.yaml");
    std::fs::write(
        &path,
        "radius_meters: 80\ncolumn_placement: stacked\nlayers:\n  dsm:\n    palette: sunlight\n    min: 10\n    max: 40\n",
    )
    .unwrap();

    let config = SolarConfig::load(&path).unwrap();
    assert_eq!(config.radius_meters, 80.0);
    assert_eq!(config.column_placement, ColumnPlacement::Stacked);

    let dsm = config.style(LayerKind::Dsm);
    assert_eq!(dsm.palette, Some(PaletteSpec::Named(PaletteName::Sunlight)));
    assert_eq!(dsm.fixed_range(), Some(ValueRange::new(10.0, 40.0)));
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = temp_test_dir();
    let path = dir.path().join("layers.yaml");
    std::fs::write(&path, "panels:\n  widthM: -1\n").unwrap();

    let err = SolarConfig::load(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse"));
}
