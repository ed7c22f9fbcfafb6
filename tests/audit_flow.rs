//! End-to-end verification flow: parse a materialized config, then check
//! declared backends and health-check tuning against it.

use proxy_audit::audit;
use proxy_audit::matcher::health::{HealthCheckError, HealthCheckSpec, HealthCheckVerifier};
use proxy_audit::matcher::{BackendEntry, BackendMatcher, MatchError};
use proxy_audit::parser::{ConfigParser, ProxyConfig, SectionMarker};
use proxy_audit::spec_from_str;

const SAMPLE: &str = "\
global
\tmaxconn 256

defaults
\tmode tcp

listen scalr:web:8080
\tmode http
\tbalance roundrobin

backend scalr:web:8080
\tdefault-server fall 3 inter 2000 rise 2
\tserver 10.0.0.1:8080 check
\tserver 10.0.0.2:8080 check
\tserver 10.0.0.9:8080 check backup

backend scalr:db:5432
\tdefault-server fall 5 inter 1000 rise 3
\tserver db-primary:5432 check
\tserver db-replica:5432 disabled
";

fn parse(text: &str) -> ProxyConfig {
    ConfigParser::new(SectionMarker::new("scalr")).parse(text).config
}

#[test]
fn parses_only_managed_sections() {
    let config = parse(SAMPLE);
    assert_eq!(config.listeners.len(), 1);
    assert_eq!(config.backends.len(), 2);
    assert!(config.backends.contains_key(&8080));
    assert!(config.backends.contains_key(&5432));
}

#[test]
fn round_trip_preserves_option_lines() {
    let config = parse(SAMPLE);
    let stanza = config.backends.get(&8080).unwrap();
    assert_eq!(
        stanza.join("\n"),
        "default-server fall 3 inter 2000 rise 2\n\
         server 10.0.0.1:8080 check\n\
         server 10.0.0.2:8080 check\n\
         server 10.0.0.9:8080 check backup"
    );
    // Re-parsing the re-serialized stanza yields the same lines.
    let rebuilt = format!("backend scalr:web:8080\n\t{}\n", stanza.join("\n\t"));
    assert_eq!(parse(&rebuilt).backends.get(&8080).unwrap(), stanza);
}

#[test]
fn parsing_is_idempotent() {
    assert_eq!(parse(SAMPLE), parse(SAMPLE));
}

#[test]
fn declared_backends_are_found() {
    let config = parse(SAMPLE);
    let matcher = BackendMatcher::new();
    let expected = vec![
        BackendEntry::new("10.0.0.1"),
        BackendEntry::new("10.0.0.2"),
        BackendEntry {
            backup: true,
            ..BackendEntry::new("10.0.0.9")
        },
    ];
    assert!(matcher.verify(8080, &config, &expected, false).is_ok());
}

#[test]
fn undeclared_backend_is_reported_with_stanza() {
    let config = parse(SAMPLE);
    let matcher = BackendMatcher::new();
    let err = matcher
        .verify(8080, &config, &[BackendEntry::new("10.0.0.3")], false)
        .unwrap_err();
    match err {
        MatchError::BackendMismatch { observed, .. } => {
            assert!(observed.iter().any(|l| l.contains("10.0.0.1")));
        }
        other => panic!("expected BackendMismatch, got {other:?}"),
    }
}

#[test]
fn absence_and_presence_are_dual() {
    let config = parse(SAMPLE);
    let matcher = BackendMatcher::new();
    let present = vec![BackendEntry::new("10.0.0.1")];
    let absent = vec![BackendEntry::new("10.0.0.99")];

    assert!(matcher.verify(8080, &config, &present, false).is_ok());
    assert!(matcher.verify(8080, &config, &present, true).is_err());
    assert!(matcher.verify(8080, &config, &absent, true).is_ok());
    assert!(matcher.verify(8080, &config, &absent, false).is_err());
}

#[test]
fn health_checks_verified_per_stanza() {
    let config = parse(SAMPLE);
    let verifier = HealthCheckVerifier::new();

    assert!(verifier
        .verify(
            8080,
            &config,
            &HealthCheckSpec {
                interval: 2000,
                fall: 3,
                rise: 2
            }
        )
        .is_ok());

    let err = verifier
        .verify(
            5432,
            &config,
            &HealthCheckSpec {
                interval: 1000,
                fall: 5,
                rise: 2,
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        HealthCheckError::Mismatch {
            actual: HealthCheckSpec { rise: 3, .. },
            ..
        }
    ));
}

#[test]
fn full_audit_from_toml_spec() {
    let spec = spec_from_str(
        r#"
        marker = "scalr"

        [[proxies]]
        port = 8080

        [[proxies.backends]]
        host = "10.0.0.1"

        [[proxies.backends]]
        host = "10.0.0.9"
        backup = true

        [proxies.health_check]
        interval = 2000
        fall = 3
        rise = 2

        [[proxies]]
        port = 5432

        [[proxies.backends]]
        host = "db-replica"
        down = true
        "#,
    )
    .unwrap();

    let report = audit::run(&spec, &parse(SAMPLE));
    assert!(report.passed(), "unexpected failures: {:?}", report.failures);
    assert_eq!(report.checks, 3);
}

#[test]
fn full_audit_reports_every_failure() {
    let spec = spec_from_str(
        r#"
        [[proxies]]
        port = 8080

        [[proxies.backends]]
        host = "10.0.0.7"

        [proxies.health_check]
        interval = 9999
        fall = 3
        rise = 2

        [[proxies]]
        port = 9999

        [[proxies.backends]]
        host = "10.0.0.1"
        "#,
    )
    .unwrap();

    let report = audit::run(&spec, &parse(SAMPLE));
    assert!(!report.passed());
    assert_eq!(report.failures.len(), 3);
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("failures"));
}

#[test]
fn stanza_with_no_options_mismatches_every_entry() {
    let config = parse("backend scalr:backend:80\n");
    assert_eq!(config.backends.get(&80).unwrap(), &Vec::<String>::new());

    let matcher = BackendMatcher::new();
    let err = matcher
        .verify(80, &config, &[BackendEntry::new("10.0.0.1")], false)
        .unwrap_err();
    assert!(matches!(err, MatchError::BackendMismatch { .. }));
}

#[test]
fn malformed_header_does_not_abort_the_parse() {
    let outcome = ConfigParser::new(SectionMarker::new("scalr")).parse(
        "backend scalrbackend80\n\tserver 10.0.0.1:80\nbackend scalr:api:81\n\tserver 10.0.0.2:81 check\n",
    );
    assert_eq!(outcome.malformed.len(), 1);
    assert_eq!(outcome.malformed[0].header, "backend scalrbackend80");
    assert!(outcome.config.backends.contains_key(&81));
    assert!(!outcome.config.backends.contains_key(&80));
}
