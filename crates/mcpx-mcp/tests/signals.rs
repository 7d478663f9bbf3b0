//! A real SIGTERM delivered to this process while a call is in flight.
//!
//! Kept in its own test binary: once the handlers are installed the signal
//! would cancel any other backend operation running in the same process.
#![cfg(unix)]

use std::time::{Duration, Instant};

use mcpx_core::{ServerConfig, ServerDefinition};
use mcpx_mcp::{SessionError, StdioBackend, ToolBackend};
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::{Pid, getpid};
use serde_json::{Map, json};

#[allow(clippy::cast_possible_wrap)]
fn process_exists(pid: u32) -> bool {
    !matches!(kill(Pid::from_raw(pid as i32), None), Err(Errno::ESRCH))
}

#[tokio::test]
async fn test_sigterm_interrupts_call_and_reaps_server() {
    let temp = tempfile::tempdir().unwrap();
    let pid_file = temp.path().join("server.pid");

    let config = ServerConfig::new(env!("CARGO_BIN_EXE_mcpx-echo-server"), vec![])
        .with_env("MCPX_ECHO_HANG", "1")
        .with_env("MCPX_ECHO_PID_FILE", pid_file.to_string_lossy())
        .with_timeout(10);
    let server = ServerDefinition::new("echo", config);

    let watched = pid_file.clone();
    tokio::spawn(async move {
        // The server writes its pid after spawn, so the handlers are in place
        while !watched.exists() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        kill(getpid(), Signal::SIGTERM).unwrap();
    });

    let mut arguments = Map::new();
    arguments.insert("message".to_string(), json!("hi"));

    let started = Instant::now();
    let err = StdioBackend::new()
        .call(&server, "echo", arguments)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Interrupted), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(15));

    let pid: u32 = std::fs::read_to_string(&pid_file)
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert!(!process_exists(pid));
}
