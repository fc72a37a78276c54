//! Property tests for verdict header merging.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::header::{HeaderValue, SET_COOKIE};
use axum::http::HeaderMap;
use bytes::Bytes;
use proptest::prelude::*;

use vgate_core::{HeaderBag, Verdict};
use vgate_gateway::enrich::{merge_headers, ResponseEnricher};

fn cookie() -> impl Strategy<Value = String> {
    "[a-z]{1,8}=[a-z0-9]{0,8}"
}

proptest! {
    #[test]
    fn cookies_are_appended_in_order(
        app in prop::collection::vec(cookie(), 0..4),
        injected in prop::collection::vec(cookie(), 0..4),
    ) {
        let mut headers = HeaderMap::new();
        for c in &app {
            headers.append(SET_COOKIE, HeaderValue::from_str(c).unwrap());
        }

        let mut verdict = Verdict::pass();
        if !injected.is_empty() {
            verdict
                .response_headers
                .insert("Set-Cookie", Bytes::from(injected.join("\n")));
        }

        ResponseEnricher::new(false).enrich(&mut headers, &verdict, Duration::ZERO);

        let merged: Vec<String> = headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        let expected: Vec<String> = app.iter().chain(injected.iter()).cloned().collect();
        prop_assert_eq!(merged, expected);
    }

    #[test]
    fn other_headers_are_replaced(old in "[a-z]{1,10}", new in "[a-z]{1,10}") {
        let mut headers = HeaderMap::new();
        headers.insert("x-dd-b", HeaderValue::from_str(&old).unwrap());

        let mut bag = HeaderBag::new();
        bag.insert("X-DD-B", Bytes::from(new.clone()));
        merge_headers(&mut headers, &bag);

        prop_assert_eq!(headers.get_all("x-dd-b").iter().count(), 1);
        prop_assert_eq!(headers.get("x-dd-b").unwrap().to_str().unwrap(), new.as_str());
    }
}

#[test]
fn invalid_values_are_skipped() {
    let mut headers = HeaderMap::new();
    let mut bag = HeaderBag::new();
    bag.insert("bad name", Bytes::from_static(b"x"));
    bag.insert("x-ok", Bytes::from_static(b"ok"));
    bag.insert("x-bad-value", Bytes::from_static(b"a\x00b"));
    merge_headers(&mut headers, &bag);

    assert_eq!(headers.len(), 1);
    assert_eq!(headers.get("x-ok").map(|v| v.as_bytes()), Some(&b"ok"[..]));
}
