// tests/test_config.rs — Settings files, hardware caps and config assembly.

use std::fs;
use std::path::PathBuf;

use vrsgen::{HardwareCaps, VrsConfig, VrsError, VrsGenerator, VrsSettings, VrsTier};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("vrsgen-{}-{name}", std::process::id()))
}

#[test]
fn load_settings_from_file() {
    let path = temp_path("settings.toml");
    fs::write(&path, "variance_cutoff = 0.04\nallow_additional_rates = false\n").unwrap();
    let s = VrsSettings::load(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(s.variance_cutoff, 0.04);
    assert!(!s.allow_additional_rates);
    assert_eq!(s.motion_factor, VrsSettings::default().motion_factor);
}

#[test]
fn missing_file_is_io_error() {
    let path = temp_path("does-not-exist.toml");
    let err = VrsSettings::load(&path).unwrap_err();
    match err {
        VrsError::Io { path: p, .. } => assert_eq!(p, path),
        other => panic!("expected Io error, got {other:?}"),
    }
}

#[test]
fn malformed_toml_is_parse_error() {
    let err = VrsSettings::from_toml_str("variance_cutoff = \"high\"").unwrap_err();
    assert!(matches!(err, VrsError::Parse(_)));
}

#[test]
fn negative_cutoff_in_file_is_rejected() {
    let err = VrsSettings::from_toml_str("variance_cutoff = -0.5").unwrap_err();
    assert!(matches!(err, VrsError::InvalidParameter { name: "variance_cutoff", .. }));
}

#[test]
fn hardware_caps_from_toml() {
    let caps: HardwareCaps =
        toml::from_str("tier = \"tier2\"\ntile_size = 8\nadditional_rates_supported = true\n").unwrap();
    assert_eq!(caps.tier, VrsTier::Tier2);
    assert_eq!(caps.tile_size, 8);
    assert!(caps.additional_rates_supported);
}

#[test]
fn caps_and_settings_build_a_runnable_generator() {
    let caps = HardwareCaps { tier: VrsTier::Tier2, tile_size: 8, additional_rates_supported: true };
    let cfg = VrsConfig::from_caps(1280, 720, &caps, &VrsSettings::default()).unwrap();
    let g = VrsGenerator::new(cfg).unwrap();
    assert_eq!(g.create_grid().dims(), (160, 90));
    assert_eq!(g.dispatch().groups_x, 40);
    assert_eq!(g.dispatch().groups_y, 23);
}

#[test]
fn unsupported_caps_are_reported() {
    for tier in [VrsTier::NotSupported, VrsTier::Tier1] {
        let caps = HardwareCaps { tier, ..HardwareCaps::default() };
        let err = VrsConfig::from_caps(64, 64, &caps, &VrsSettings::default()).unwrap_err();
        assert!(matches!(err, VrsError::UnsupportedTier(t) if t == tier));
    }

    let caps = HardwareCaps { tile_size: 4, ..HardwareCaps::default() };
    let err = VrsConfig::from_caps(64, 64, &caps, &VrsSettings::default()).unwrap_err();
    assert!(matches!(err, VrsError::InvalidTileSize(4)));
}

#[test]
fn reconfigure_on_resize() {
    let mut g = VrsGenerator::new(VrsConfig::for_resolution(640, 480, 16)).unwrap();
    assert_eq!(g.create_grid().dims(), (40, 30));
    g.reconfigure(VrsConfig::for_resolution(1920, 1080, 16)).unwrap();
    assert_eq!(g.create_grid().dims(), (120, 68));

    // A failed reconfigure leaves the generator usable with the old config.
    assert!(g.reconfigure(VrsConfig::for_resolution(1920, 1080, 7)).is_err());
    assert_eq!(g.config().width, 1920);
}
