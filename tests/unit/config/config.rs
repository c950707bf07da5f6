use super::*;

#[test]
fn json_uses_camel_case_fields() {
    let cfg = OverlayConfig::from_json_str(
        r#"{"addressText":"Shop 12, MG Road\nPune - 411001","mobileText":"+91 98765 43210","addressScale":1.5,"mobileScale":0.75}"#,
    )
    .unwrap();
    assert_eq!(cfg.address_text, "Shop 12, MG Road\nPune - 411001");
    assert_eq!(cfg.mobile_text, "+91 98765 43210");
    assert_eq!(cfg.address_scale, 1.5);
    assert_eq!(cfg.mobile_scale, 0.75);
}

#[test]
fn missing_scales_default_to_one() {
    let cfg = OverlayConfig::from_json_str(r#"{"addressText":"a","mobileText":"b"}"#).unwrap();
    assert_eq!(cfg.address_scale, 1.0);
    assert_eq!(cfg.mobile_scale, 1.0);
}

#[test]
fn unknown_fields_are_rejected() {
    let err = OverlayConfig::from_json_str(r#"{"addressTxt":"a"}"#).unwrap_err();
    assert!(matches!(err, BrandError::Serde(_)));
}

#[test]
fn non_positive_or_non_finite_scales_are_rejected() {
    for s in [0.0, -1.0, f32::NAN, f32::INFINITY] {
        let cfg = OverlayConfig::new("a", "b").with_scales(s, 1.0);
        assert!(cfg.validate().is_err(), "address scale {s}");
        let cfg = OverlayConfig::new("a", "b").with_scales(1.0, s);
        assert!(cfg.validate().is_err(), "mobile scale {s}");
    }
}

#[test]
fn scales_outside_recommended_range_are_still_valid() {
    let cfg = OverlayConfig::new("a", "b").with_scales(3.0, 0.1);
    assert!(cfg.validate().is_ok());
    assert!(!cfg.scales_within_recommended_range());
    assert!(OverlayConfig::new("a", "b").scales_within_recommended_range());
}

#[test]
fn from_path_reads_file() {
    let dir = std::env::temp_dir().join(format!("reelbrand_cfg_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("overlay.json");
    std::fs::write(&path, r#"{"addressText":"x","mobileText":"y","mobileScale":2.0}"#).unwrap();
    let cfg = OverlayConfig::from_path(&path).unwrap();
    assert_eq!(cfg.mobile_scale, 2.0);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn from_path_reports_missing_file() {
    let err = OverlayConfig::from_path(Path::new("/definitely/not/here.json")).unwrap_err();
    assert!(err.to_string().contains("read overlay config"));
}

#[test]
fn default_job_settings_match_fixed_capture_contract() {
    let s = JobSettings::default();
    assert_eq!(s.capture_fps, Fps { num: 30, den: 1 });
    assert_eq!(s.bitrate, 8_000_000);
    assert!(s.validate().is_ok());
}

#[test]
fn job_settings_reject_zero_queue_and_bitrate() {
    let s = JobSettings {
        writer_queue: 0,
        ..JobSettings::default()
    };
    assert!(s.validate().is_err());
    let s = JobSettings {
        bitrate: 0,
        ..JobSettings::default()
    };
    assert!(s.validate().is_err());
}
