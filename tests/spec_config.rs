//! Audit spec loading and validation.

use proxy_audit::config::{load_spec, spec_from_str, SpecError, ValidationError};
use proxy_audit::matcher::CheckPolicy;

#[test]
fn minimal_spec_gets_defaults() {
    let spec = spec_from_str(
        r#"
        [[proxies]]
        port = 80

        [[proxies.backends]]
        host = "10.0.0.1"
        "#,
    )
    .unwrap();

    assert_eq!(spec.marker, "scalr");
    assert_eq!(spec.matching.default_check, CheckPolicy::Optional);
    assert_eq!(spec.matching.explicit_port_check, CheckPolicy::Forbidden);

    let proxy = &spec.proxies[0];
    assert_eq!(proxy.port, 80);
    assert!(!proxy.expect_absent);
    assert!(proxy.health_check.is_none());

    let entry = &proxy.backends[0];
    assert_eq!(entry.host, "10.0.0.1");
    assert_eq!(entry.port, None);
    assert!(!entry.backup && !entry.down);
}

#[test]
fn matching_policy_is_configurable_from_the_file() {
    let spec = spec_from_str(
        r#"
        [matching]
        default_check = "required"
        explicit_port_check = "optional"

        [[proxies]]
        port = 80

        [[proxies.backends]]
        host = "10.0.0.1"
        "#,
    )
    .unwrap();
    assert_eq!(spec.matching.default_check, CheckPolicy::Required);
    assert_eq!(spec.matching.explicit_port_check, CheckPolicy::Optional);
}

#[test]
fn invalid_toml_is_a_parse_error() {
    let err = spec_from_str("proxies = not-a-list").unwrap_err();
    assert!(matches!(err, SpecError::Parse(_)));
}

#[test]
fn semantic_errors_are_all_reported() {
    let err = spec_from_str(
        r#"
        [[proxies]]
        port = 0

        [[proxies.backends]]
        host = ""

        [[proxies]]
        port = 80
        "#,
    )
    .unwrap_err();

    match err {
        SpecError::Validation(errors) => {
            assert!(errors.contains(&ValidationError::ZeroPort));
            assert!(errors.contains(&ValidationError::EmptyHost { port: 0 }));
            assert!(errors.contains(&ValidationError::EmptyExpectation { port: 80 }));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn expect_absent_round_trips_through_toml() {
    let spec = spec_from_str(
        r#"
        [[proxies]]
        port = 80
        expect_absent = true

        [[proxies.backends]]
        host = "10.0.0.1"
        port = 8080
        backup = true
        "#,
    )
    .unwrap();
    let proxy = &spec.proxies[0];
    assert!(proxy.expect_absent);
    assert_eq!(proxy.backends[0].port, Some(8080));
    assert!(proxy.backends[0].backup);
}

#[test]
fn load_spec_reads_from_disk() {
    let path = std::env::temp_dir().join("proxy-audit-spec-test.toml");
    std::fs::write(
        &path,
        "[[proxies]]\nport = 80\n\n[[proxies.backends]]\nhost = \"10.0.0.1\"\n",
    )
    .unwrap();

    let spec = load_spec(&path).unwrap();
    assert_eq!(spec.proxies.len(), 1);

    std::fs::remove_file(&path).ok();
}

#[test]
fn load_spec_missing_file_is_io_error() {
    let err = load_spec(std::path::Path::new("/definitely/not/here.toml")).unwrap_err();
    assert!(matches!(err, SpecError::Io(_)));
}
