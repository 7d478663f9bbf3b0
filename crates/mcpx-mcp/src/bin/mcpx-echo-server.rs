//! Minimal MCP stdio server used by the integration tests.
//!
//! Tools: `echo(message)`, `add_numbers(a, b)` and `fail(reason)` which
//! always reports `isError`. `tools/list` is served two tools per page to
//! exercise cursor pagination. Setting `MCPX_ECHO_PING=1` makes the server
//! ping the client before every `tools/list` reply. `MCPX_ECHO_HANG=1` makes
//! `tools/call` never answer, and `MCPX_ECHO_PID_FILE` names a file the
//! server writes its process id to on startup.

use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};

const PAGE_SIZE: usize = 2;

fn tools() -> Vec<Value> {
    vec![
        json!({
            "name": "echo",
            "description": "Echo back the provided message.",
            "inputSchema": {
                "type": "object",
                "properties": { "message": { "type": "string" } },
                "required": ["message"],
            },
        }),
        json!({
            "name": "add_numbers",
            "description": "Add two numbers together.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "a": { "type": "integer" },
                    "b": { "type": "integer" },
                },
                "required": ["a", "b"],
            },
        }),
        json!({
            "name": "fail",
            "description": "Always fails.",
            "inputSchema": {
                "type": "object",
                "properties": { "reason": { "type": "string", "default": "boom" } },
            },
        }),
    ]
}

fn text(s: impl Into<String>) -> Value {
    json!([{ "type": "text", "text": s.into() }])
}

fn call_tool(params: &Value) -> Result<Value, (i64, String)> {
    let name = params["name"].as_str().unwrap_or_default();
    let args = &params["arguments"];
    match name {
        "echo" => Ok(json!({ "content": text(args["message"].as_str().unwrap_or_default()) })),
        "add_numbers" => {
            let sum = args["a"].as_i64().unwrap_or(0) + args["b"].as_i64().unwrap_or(0);
            Ok(json!({
                "content": text(sum.to_string()),
                "structuredContent": { "result": sum },
            }))
        }
        "fail" => Ok(json!({
            "content": text(args["reason"].as_str().unwrap_or("boom")),
            "isError": true,
        })),
        other => Err((-32601, format!("Unknown tool: {other}"))),
    }
}

fn list_page(params: &Value) -> Value {
    let all = tools();
    let start = params["cursor"]
        .as_str()
        .and_then(|c| c.parse::<usize>().ok())
        .unwrap_or(0)
        .min(all.len());
    let end = (start + PAGE_SIZE).min(all.len());
    let page_tools = all[start..end].to_vec();
    let mut page = json!({ "tools": page_tools });
    if end < all.len() {
        page["nextCursor"] = json!(end.to_string());
    }
    page
}

fn send(out: &mut impl Write, message: &Value) -> io::Result<()> {
    writeln!(out, "{message}")?;
    out.flush()
}

fn main() -> io::Result<()> {
    let ping_first = std::env::var("MCPX_ECHO_PING").is_ok_and(|v| v == "1");
    let hang_calls = std::env::var("MCPX_ECHO_HANG").is_ok_and(|v| v == "1");
    if let Ok(pid_file) = std::env::var("MCPX_ECHO_PID_FILE") {
        std::fs::write(pid_file, std::process::id().to_string())?;
    }
    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    let mut lines = stdin.lock().lines();

    eprintln!("mcpx-echo-server ready");

    while let Some(line) = lines.next() {
        let line = line?;
        let Ok(msg) = serde_json::from_str::<Value>(&line) else {
            continue;
        };
        let Some(id) = msg.get("id").cloned() else {
            continue;
        };
        let params = msg.get("params").cloned().unwrap_or(Value::Null);

        let outcome = match msg["method"].as_str().unwrap_or_default() {
            "initialize" => Ok(json!({
                "protocolVersion": "2024-11-05",
                "serverInfo": { "name": "mcpx-echo-server", "version": "1.0.0" },
                "capabilities": { "tools": {} },
            })),
            "ping" => Ok(json!({})),
            "tools/list" => {
                if ping_first {
                    send(&mut out, &json!({ "jsonrpc": "2.0", "id": "srv-1", "method": "ping" }))?;
                    // Wait for the client's pong before answering
                    let _ = lines.next();
                }
                Ok(list_page(&params))
            }
            "tools/call" if hang_calls => loop {
                thread::sleep(Duration::from_secs(60));
            },
            "tools/call" => call_tool(&params),
            other => Err((-32601, format!("Method not found: {other}"))),
        };

        let reply = match outcome {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err((code, message)) => {
                json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
            }
        };
        send(&mut out, &reply)?;
    }

    eprintln!("Traceback (most recent call last):");
    eprintln!("  File \"server.py\", line 1, in <module>");
    eprintln!("GeneratorExit");
    Ok(())
}
