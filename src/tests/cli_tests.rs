//! Command line parsing for the host binary.

use crate::parse_args;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn defaults_to_online_with_default_config() {
    let options = parse_args(args(&[])).unwrap();
    assert!(!options.offline);
    assert_eq!(options.config_path, "watchface.toml");
}

#[test]
fn reads_offline_and_config_path() {
    let options = parse_args(args(&["--config", "/etc/face.toml", "--offline"])).unwrap();
    assert!(options.offline);
    assert_eq!(options.config_path, "/etc/face.toml");
}

#[test]
fn rejects_unknown_and_incomplete_flags() {
    assert!(parse_args(args(&["--stdout"])).is_err());
    assert!(parse_args(args(&["--config"])).is_err());
}
