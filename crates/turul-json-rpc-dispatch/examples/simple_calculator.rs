//! Simple Calculator JSON-RPC Example
//!
//! This example registers a few calculator methods and feeds raw request
//! payloads through the dispatcher, printing what would be sent back over
//! the transport.
//!
//! Run with `RUST_LOG=debug` to see routing and validation logs.

use serde_json::json;
use turul_json_rpc_dispatch::prelude::*;

fn add(a: i64, b: i64) -> anyhow::Result<i64> {
    Ok(a + b)
}

fn subtract(a: i64, b: i64) -> anyhow::Result<i64> {
    Ok(a - b)
}

fn divide(a: i64, b: i64) -> anyhow::Result<i64> {
    a.checked_div(b)
        .ok_or_else(|| anyhow::anyhow!("division of {} by zero", a))
}

fn describe(label: String, value: i64, verbose: bool) -> anyhow::Result<serde_json::Value> {
    if verbose {
        Ok(json!({"label": label, "value": value, "even": value % 2 == 0}))
    } else {
        Ok(json!(format!("{}={}", label, value)))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("🧮 Simple Calculator JSON-RPC Example");
    println!("=====================================");

    let dispatcher = Dispatcher::builder()
        .method("add", &["a", "b"], add)
        .method("subtract", &["a", "b"], subtract)
        .method("divide", &["a", "b"], divide)
        .method("describe", &["label", "value", "verbose"], describe)
        .build()?;

    println!("Registered methods: {:?}", dispatcher.registry().method_names());

    let test_requests = vec![
        r#"{"jsonrpc": "2.0", "method": "add", "params": [2, 3], "id": 1}"#,
        r#"{"jsonrpc": "2.0", "method": "subtract", "params": {"a": 10, "b": 4}, "id": "x"}"#,
        r#"{"jsonrpc": "2.0", "method": "describe", "params": ["answer", 42, true], "id": 3}"#,
        r#"{"jsonrpc": "2.0", "method": "multiply", "params": [2, 3], "id": 4}"#, // Method not found
        r#"{"jsonrpc": "2.0", "method": "add", "params": ["abc", 5], "id": 5}"#, // Invalid params
        r#"{"jsonrpc": "2.0", "method": "divide", "params": [1, 0], "id": 6}"#, // Internal error
        r#"{"jsonrpc": "1.0", "method": "add", "params": [1, 1], "id": 7}"#, // Invalid request
        r#"{"jsonrpc": "2.0", "method": "add", "params": [1, 1]}"#, // Notification
        r#"{"jsonrpc": "2.0", "method": "add", "#, // Parse error
        r#"[
            {"jsonrpc": "2.0", "method": "add", "params": [1, 2], "id": 8},
            {"jsonrpc": "2.0", "method": "add", "params": [3, 4]},
            {"jsonrpc": "2.0", "method": "ghost", "id": 9}
        ]"#,
    ];

    for (i, request_json) in test_requests.iter().enumerate() {
        println!("\n--- Test {} ---", i + 1);
        println!("Request: {}", request_json);

        match dispatcher.process(request_json) {
            Some(response) => println!("Response: {}", response),
            None => println!("📢 Notification, nothing to send"),
        }
    }

    println!("\n🎉 Calculator example completed!");
    Ok(())
}
