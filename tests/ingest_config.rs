// tests/ingest_config.rs
use intel_radar::ingest::config::{load_profile_default, load_profile_from, QueryProfile};
use std::{env, fs};

#[test]
fn parse_toml_and_json_paths() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("ingest.toml");
    fs::write(
        &p_toml,
        r#"
query = "Omnia Nightclub"
sources = [" vegas.com ", "", "vegas.com"]
page_size = 10
lookback_days = 1
"#,
    )
    .unwrap();
    let t = load_profile_from(&p_toml).unwrap();
    assert_eq!(t.query, "Omnia Nightclub");
    assert_eq!(t.sources, vec!["vegas.com".to_string()]);
    assert_eq!(t.page_size, 10);
    assert_eq!(t.lookback_days, 1);

    let p_json = dir.path().join("ingest.json");
    fs::write(&p_json, r#"{"query": "Zouk", "fallback_source": "  "}"#).unwrap();
    let j = load_profile_from(&p_json).unwrap();
    assert_eq!(j.query, "Zouk");
    assert_eq!(j.fallback_source, "perigon");
    assert_eq!(j.page_size, QueryProfile::default().page_size);
}

#[test]
fn malformed_profile_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("ingest.toml");
    fs::write(&p, "page_size = \"lots\"").unwrap();
    assert!(load_profile_from(&p).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so the repo's own config/ is not picked up.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    env::remove_var("INGEST_PROFILE_PATH");

    // 1) Nothing on disk -> built-in defaults
    let v = load_profile_default().unwrap();
    assert_eq!(v, QueryProfile::default());

    // 2) Fallback TOML in ./config/
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("ingest.toml"), r#"query = "from toml""#).unwrap();
    assert_eq!(load_profile_default().unwrap().query, "from toml");

    // 3) Env wins
    let p_env = tmp.path().join("override.json");
    fs::write(&p_env, r#"{"query": "from env"}"#).unwrap();
    env::set_var("INGEST_PROFILE_PATH", p_env.display().to_string());
    assert_eq!(load_profile_default().unwrap().query, "from env");

    // 4) Env pointing nowhere is an error, not a silent default
    env::set_var("INGEST_PROFILE_PATH", tmp.path().join("missing.toml"));
    assert!(load_profile_default().is_err());
    env::remove_var("INGEST_PROFILE_PATH");

    env::set_current_dir(&old).unwrap();
}
