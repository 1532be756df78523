//! Tests for set/iterate/trim/append specifier validation.

use super::options;
use urlsmith_core::accessor::UrlComponent;

#[test]
fn set_spec_parses_component_and_value() {
    let opts = options(&["urlsmith", "--set", "host=example.com", "http://a.se/"]).unwrap();
    assert_eq!(opts.set_list.len(), 1);
    assert_eq!(opts.set_list[0].component, UrlComponent::Host);
    assert_eq!(opts.set_list[0].value, "example.com");
    assert!(opts.set_list[0].encode);
}

#[test]
fn set_colon_suffix_disables_encoding() {
    let opts = options(&["urlsmith", "--set", "path:=/a%20b", "http://a.se/"]).unwrap();
    assert!(!opts.set_list[0].encode);
    assert_eq!(opts.set_list[0].value, "/a%20b");
}

#[test]
fn set_ipv6_literal_disables_encoding() {
    let opts = options(&["urlsmith", "--set", "host=[::1]", "http://a.se/"]).unwrap();
    assert!(!opts.set_list[0].encode);
}

#[test]
fn set_unknown_component_rejected() {
    assert!(options(&["urlsmith", "--set", "bogus=1", "http://a.se/"]).is_err());
    assert!(options(&["urlsmith", "--set", "url=http://x/", "http://a.se/"]).is_err());
}

#[test]
fn set_without_equals_rejected() {
    assert!(options(&["urlsmith", "--set", "host", "http://a.se/"]).is_err());
}

#[test]
fn duplicate_set_component_rejected() {
    assert!(options(&[
        "urlsmith",
        "--set",
        "host=a.se",
        "--set",
        "host=b.se",
        "http://a.se/"
    ])
    .is_err());
}

#[test]
fn iterate_spec_splits_values() {
    let opts = options(&["urlsmith", "--iterate", "host=a.se b.se", "http://a.se/"]).unwrap();
    assert_eq!(opts.iterate.len(), 1);
    assert_eq!(opts.iterate[0].component, UrlComponent::Host);
    assert_eq!(opts.iterate[0].values, ["a.se", "b.se"]);
}

#[test]
fn iterate_empty_list_rejected() {
    assert!(options(&["urlsmith", "--iterate", "host=", "http://a.se/"]).is_err());
    assert!(options(&["urlsmith", "--iterate", "host", "http://a.se/"]).is_err());
}

#[test]
fn duplicate_iterate_component_rejected() {
    assert!(options(&[
        "urlsmith",
        "--iterate",
        "host=a.se",
        "--iterate",
        "host=b.se",
        "http://a.se/"
    ])
    .is_err());
}

#[test]
fn iterate_and_set_on_same_component_rejected() {
    assert!(options(&[
        "urlsmith",
        "--set",
        "host=a.se",
        "--iterate",
        "host=b.se c.se",
        "http://a.se/"
    ])
    .is_err());
}

#[test]
fn trim_requires_query_component() {
    assert!(options(&["urlsmith", "--trim", "utm_*", "http://a.se/"]).is_err());
    assert!(options(&["urlsmith", "--trim", "path=x", "http://a.se/"]).is_err());
    let opts = options(&["urlsmith", "--trim", "query=utm_*", "http://a.se/"]).unwrap();
    assert_eq!(opts.trim_patterns, ["utm_*"]);
}

#[test]
fn append_splits_path_and_query() {
    let opts = options(&[
        "urlsmith",
        "--append",
        "path=moo",
        "--append",
        "query=x=1",
        "http://a.se/",
    ])
    .unwrap();
    assert_eq!(opts.append_path, ["moo"]);
    assert_eq!(opts.append_query, ["x=1"]);
}

#[test]
fn append_other_component_rejected() {
    assert!(options(&["urlsmith", "--append", "host=x", "http://a.se/"]).is_err());
}
