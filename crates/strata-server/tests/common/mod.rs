//! Test helpers for driving the command handler in-process.

#![allow(dead_code)]

use std::sync::Arc;

use strata_core::SharedKeyspace;
use strata_protocol::Frame;
use strata_server::shell::to_frame;
use strata_server::{execute_frame, ConfigRegistry, StrataConfig};

/// A keyspace plus config registry, shareable across threads.
#[derive(Clone)]
pub struct TestClient {
    keyspace: Arc<SharedKeyspace>,
    registry: Arc<ConfigRegistry>,
}

impl TestClient {
    pub fn new() -> Self {
        Self::with_config(StrataConfig::default())
    }

    pub fn with_config(cfg: StrataConfig) -> Self {
        Self {
            keyspace: Arc::new(SharedKeyspace::new(cfg.build_keyspace_config())),
            registry: Arc::new(ConfigRegistry::from_config(&cfg)),
        }
    }

    /// Sends a command and returns the reply frame.
    pub fn cmd(&self, args: &[&str]) -> Frame {
        let tokens = args.iter().map(|s| s.to_string()).collect();
        execute_frame(&self.keyspace, &self.registry, to_frame(tokens))
    }

    /// Sends a command and expects a bulk string or nil.
    pub fn get_bulk(&self, args: &[&str]) -> Option<String> {
        match self.cmd(args) {
            Frame::Bulk(data) => Some(String::from_utf8_lossy(&data).into_owned()),
            Frame::Null => None,
            other => panic!("expected Bulk or Null for {args:?}, got {other:?}"),
        }
    }

    /// Sends a command and expects an integer reply.
    pub fn get_int(&self, args: &[&str]) -> i64 {
        match self.cmd(args) {
            Frame::Integer(n) => n,
            other => panic!("expected Integer for {args:?}, got {other:?}"),
        }
    }

    /// Sends a command and expects an array of bulk strings.
    pub fn get_strings(&self, args: &[&str]) -> Vec<String> {
        match self.cmd(args) {
            Frame::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Frame::Bulk(data) => String::from_utf8_lossy(&data).into_owned(),
                    other => panic!("expected Bulk item for {args:?}, got {other:?}"),
                })
                .collect(),
            other => panic!("expected Array for {args:?}, got {other:?}"),
        }
    }

    /// Sends a command and expects an error; returns its message.
    pub fn err(&self, args: &[&str]) -> String {
        match self.cmd(args) {
            Frame::Error(msg) => msg,
            other => panic!("expected Error for {args:?}, got {other:?}"),
        }
    }

    pub fn ok(&self, args: &[&str]) {
        assert_eq!(self.cmd(args), Frame::Simple("OK".into()), "{args:?}");
    }
}

/// Runs the `strata` binary with `input` on stdin and returns its output.
/// Colors and logging are off so stdout holds only replies.
pub fn run_shell(input: &str, extra_args: &[&str]) -> std::process::Output {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let mut child = Command::new(env!("CARGO_BIN_EXE_strata"))
        .arg("--no-color")
        .args(extra_args)
        .env("RUST_LOG", "error")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn strata");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("failed to write stdin");

    child.wait_with_output().expect("failed to wait on strata")
}
