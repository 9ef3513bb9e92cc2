//! CLI argument parsing tests for the bridge's flag surface.

use clap::Parser;
use mqtt_stats::cli::Cli;

/// Helper to parse CLI args.
fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    let mut full_args = vec!["mqtt-stats"];
    full_args.extend(args);
    Cli::try_parse_from(full_args)
}

#[test]
fn defaults_match_the_documented_surface() {
    let cli = parse(&["--broker-urls", "tcp://broker:1883"]).unwrap();
    assert_eq!(cli.broker_urls, "tcp://broker:1883");
    assert!(cli.cafile.is_none());
    assert_eq!(cli.graphite_host, "localhost");
    assert_eq!(cli.graphite_port, 2003);
    assert_eq!(cli.graphite_ping, 15);
    assert!(!cli.insecure);
    assert!(!cli.debug);
}

#[test]
fn graphite_flags_use_camel_case_names() {
    let cli = parse(&[
        "--broker-urls",
        "tcp://b",
        "--graphiteHost",
        "metrics.internal",
        "--graphitePort",
        "2103",
        "--graphitePing",
        "30",
    ])
    .unwrap();
    assert_eq!(cli.graphite_host, "metrics.internal");
    assert_eq!(cli.graphite_port, 2103);
    assert_eq!(cli.graphite_ping, 30);
}

#[test]
fn insecure_and_debug_are_switches() {
    let cli = parse(&["--broker-urls", "tcp://b", "--insecure", "--debug"]).unwrap();
    assert!(cli.insecure);
    assert!(cli.debug);
}

#[test]
fn cafile_is_a_path() {
    let cli = parse(&["--broker-urls", "ssl://b", "--cafile", "/etc/ssl/ca.pem"]).unwrap();
    assert_eq!(cli.cafile.as_deref(), Some(std::path::Path::new("/etc/ssl/ca.pem")));
}

#[test]
fn graphite_port_rejects_non_numeric_values() {
    assert!(parse(&["--broker-urls", "tcp://b", "--graphitePort", "not-a-port"]).is_err());
}

/// `--broker-urls` is required, but `MQTT_URLS` supplies the default.
/// Kept as a single test so the environment mutation cannot race a
/// parallel test.
#[test]
fn broker_urls_required_unless_env_supplies_it() {
    std::env::remove_var("MQTT_URLS");
    assert!(parse(&[]).is_err());

    std::env::set_var("MQTT_URLS", "tcp://env-broker:1883");
    let cli = parse(&[]).unwrap();
    assert_eq!(cli.broker_urls, "tcp://env-broker:1883");

    // An explicit flag wins over the environment.
    let cli = parse(&["--broker-urls", "tcp://flag-broker:1883"]).unwrap();
    assert_eq!(cli.broker_urls, "tcp://flag-broker:1883");
    std::env::remove_var("MQTT_URLS");
}
