//! Verdict mapping vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use vgate_core::verdict::parse_header_list;
use vgate_core::{HeaderBag, UpstreamReply, Verdict};

use vector_loader::TestVector;

fn load(name: &str) -> TestVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}

fn assert_bag(bag: &HeaderBag, expected: &serde_json::Value, what: &str, desc: &str) {
    let expected = expected.as_object().unwrap();
    assert_eq!(bag.len(), expected.len(), "{what} vector={desc}");
    for (k, v) in expected {
        let got = bag.get(k).unwrap_or_else(|| panic!("{what} missing {k} vector={desc}"));
        assert_eq!(got.as_ref(), v.as_str().unwrap().as_bytes(), "{what}.{k} vector={desc}");
    }
}

#[test]
fn reply_vectors() {
    let files = [
        "reply_403.json",
        "reply_302.json",
        "reply_301.json",
        "reply_200_lists.json",
        "reply_200_bare.json",
        "reply_500.json",
        "reply_401.json",
    ];

    for f in files {
        let v = load(f);
        let verdict = Verdict::from_upstream(&v.reply.to_reply());
        let ex = &v.expect;
        let desc = v.description.as_str();

        assert_eq!(verdict.allow, ex["allow"].as_bool().unwrap(), "vector={desc}");
        assert_eq!(verdict.redirect, ex["redirect"].as_bool().unwrap(), "vector={desc}");
        assert!(!verdict.timed_out, "vector={desc}");
        if verdict.redirect {
            assert!(!verdict.allow, "redirect implies deny, vector={desc}");
        }

        match ex.get("http_status").and_then(|s| s.as_u64()) {
            Some(s) => assert_eq!(verdict.http_status, Some(s as u16), "vector={desc}"),
            None => assert!(verdict.http_status.is_none(), "vector={desc}"),
        }

        match ex.get("response_body").and_then(|s| s.as_str()) {
            Some(b) => assert_eq!(verdict.response_body.as_deref(), Some(b.as_bytes()), "vector={desc}"),
            None => assert!(verdict.response_body.is_none(), "vector={desc}"),
        }

        match ex.get("redirect_location").and_then(|s| s.as_str()) {
            Some(l) => assert_eq!(verdict.redirect_location.as_deref(), Some(l.as_bytes()), "vector={desc}"),
            None => assert!(verdict.redirect_location.is_none(), "vector={desc}"),
        }

        assert_bag(&verdict.request_headers, &ex["request_headers"], "request_headers", desc);
        assert_bag(&verdict.response_headers, &ex["response_headers"], "response_headers", desc);
    }
}

#[test]
fn pass_verdicts() {
    let pass = Verdict::pass();
    assert!(pass.allow);
    assert!(!pass.redirect);
    assert!(!pass.timed_out);
    assert!(pass.request_headers.is_empty());
    assert!(pass.response_headers.is_empty());
    assert!(!pass.is_flagged());
    assert_eq!(Verdict::default(), pass);

    let timed_out = Verdict::timed_out();
    assert!(timed_out.allow && !timed_out.redirect && timed_out.timed_out);
    assert!(!timed_out.is_flagged());
    assert_eq!(timed_out.outcome(), "timeout");
}

#[test]
fn bare_200_equals_pass() {
    let reply = UpstreamReply { status: 200, ..Default::default() };
    assert_eq!(Verdict::from_upstream(&reply), Verdict::pass());
}

#[test]
fn list_header_names_match_case_insensitively() {
    let mut headers = HeaderBag::new();
    headers.insert("x-datadome-headers", "x-dd-a");
    headers.insert("X-DD-A", "1");
    let verdict = Verdict::from_upstream(&UpstreamReply { status: 200, headers, ..Default::default() });
    assert_eq!(verdict.response_headers.get("X-DD-A").unwrap().as_ref(), b"1");
}

#[test]
fn header_list_parsing() {
    assert_eq!(parse_header_list("").count(), 0);
    assert_eq!(parse_header_list("   ").count(), 0);
    assert_eq!(
        parse_header_list("A  B C").collect::<Vec<_>>(),
        vec!["A", "B", "C"]
    );
}

#[test]
fn header_bag_replaces_case_insensitively() {
    let mut bag = HeaderBag::new();
    bag.insert("Set-Cookie", "a=1");
    bag.insert("set-cookie", "b=2");
    assert_eq!(bag.len(), 1);
    assert_eq!(bag.get("SET-COOKIE").unwrap().as_ref(), b"b=2");
    assert_eq!(bag.iter().next().unwrap().0, "Set-Cookie");
}

#[test]
fn header_bag_append_joins_repeated_values() {
    let mut bag = HeaderBag::new();
    bag.append("Set-Cookie", "a=1; Path=/");
    bag.append("set-cookie", "b=2");
    assert_eq!(bag.len(), 1);
    assert_eq!(bag.get("SET-COOKIE").unwrap().as_ref(), b"a=1; Path=/\nb=2");
}
