//! Shared fixtures for the dispatch integration tests

#![allow(dead_code)]

use serde_json::Value;
use turul_json_rpc_dispatch::{Dispatcher, DispatcherBuilder};

pub fn add(a: i64, b: i64) -> anyhow::Result<i64> {
    Ok(a + b)
}

pub fn greet(name: String, shout: bool) -> anyhow::Result<String> {
    let greeting = format!("hello {}", name);
    Ok(if shout { greeting.to_uppercase() } else { greeting })
}

pub fn ping() -> anyhow::Result<&'static str> {
    Ok("pong")
}

pub fn broken() -> anyhow::Result<i64> {
    Err(anyhow::anyhow!("connection refused").context("loading ledger from 10.0.0.7"))
}

/// Builder preloaded with the calculator fixture methods
pub fn calculator_builder() -> DispatcherBuilder {
    Dispatcher::builder()
        .method("add", &["a", "b"], add)
        .method("greet", &["name", "shout"], greet)
        .method("ping", &[], ping)
        .method("broken", &[], broken)
}

pub fn calculator() -> Dispatcher {
    calculator_builder()
        .build()
        .expect("fixture methods register cleanly")
}

/// Send a JSON value as raw text and decode whatever comes back
pub fn send(dispatcher: &Dispatcher, request: Value) -> Option<Value> {
    send_raw(dispatcher, &request.to_string())
}

pub fn send_raw(dispatcher: &Dispatcher, raw: &str) -> Option<Value> {
    dispatcher
        .process(raw)
        .map(|text| serde_json::from_str(&text).expect("dispatcher emits valid JSON"))
}
