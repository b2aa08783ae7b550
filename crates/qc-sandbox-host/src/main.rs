//! # Contract Executor Host
//!
//! The binary launched once per [`qc_sandbox::session::ContractExecutionSession`]
//! (§3, §4.2). It speaks the line-delimited JSON protocol on stdin/stdout and
//! has no ambient file, socket, or process-spawning capability of its own —
//! the [`rhai`] engine it embeds never has those host functions registered,
//! so a contract that slipped past the safety analyzer still has nothing to
//! reach for once it's actually running here. All diagnostic output goes to
//! stderr, never stdout, so it never corrupts the reply stream.
//!
//! A compiled contract is a Rhai script defining `fn run(inputs, state)`
//! that returns a map with `result` and `state` string entries; that is
//! this host's calling convention, not a claim about the original
//! contract-source syntax the safety analyzer was written against.

use std::io::{self, BufRead, Write};

use qc_sandbox::protocol::{decode_line, encode_line, Request, Response};
use rhai::{Array, Dynamic, Engine, Scope, AST};

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let engine = Engine::new();
    let mut compiled: Option<AST> = None;
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let Ok(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let request: Request = match decode_line(&line) {
            Ok(request) => request,
            Err(e) => {
                write_response(&mut stdout, &Response::failed(format!("bad request: {e}")));
                continue;
            }
        };

        match request {
            Request::Compile { code } => handle_compile(&engine, &code, &mut compiled, &mut stdout),
            Request::State { state } => handle_state(&state, &mut stdout),
            Request::Execute { inputs, state } => {
                handle_execute(&engine, compiled.as_ref(), inputs, state, &mut stdout);
            }
            Request::Shutdown {} => break,
        }
    }
}

fn handle_compile(
    engine: &Engine,
    code: &str,
    compiled: &mut Option<AST>,
    stdout: &mut impl Write,
) {
    match engine.compile(code) {
        Ok(ast) => {
            *compiled = Some(ast);
            let session_id = uuid::Uuid::new_v4().to_string();
            tracing::info!(session_id, "contract compiled");
            write_response(stdout, &Response::compiled(session_id));
        }
        Err(e) => {
            tracing::warn!(error = %e, "compile failed");
            write_response(stdout, &Response::failed(format!("compile error: {e}")));
        }
    }
}

/// Normalizes incoming state the way the rest of §4.3 expects the sandbox
/// to: surrounding whitespace trimmed, otherwise passed through unchanged.
fn handle_state(state: &str, stdout: &mut impl Write) {
    write_response(stdout, &Response::state_ok(state.trim().to_string()));
}

fn handle_execute(
    engine: &Engine,
    compiled: Option<&AST>,
    inputs: Vec<String>,
    state: String,
    stdout: &mut impl Write,
) {
    let Some(ast) = compiled else {
        write_response(stdout, &Response::failed("execute requested before compile"));
        return;
    };
    let mut scope = Scope::new();
    let inputs_array: Array = inputs.into_iter().map(Dynamic::from).collect();
    let call_result: Result<rhai::Map, _> =
        engine.call_fn(&mut scope, ast, "run", (inputs_array, state.clone()));
    match call_result {
        Ok(map) => {
            let result = map
                .get("result")
                .and_then(|d| d.clone().into_string().ok())
                .unwrap_or_default();
            let new_state = map
                .get("state")
                .and_then(|d| d.clone().into_string().ok())
                .unwrap_or(state);
            write_response(stdout, &Response::executed(result, new_state));
        }
        Err(e) => {
            tracing::warn!(error = %e, "execution failed");
            write_response(stdout, &Response::failed(format!("Execution failed: {e}")));
        }
    }
}

fn write_response(stdout: &mut impl Write, response: &Response) {
    match encode_line(response) {
        Ok(line) => {
            let _ = stdout.write_all(line.as_bytes());
            let _ = stdout.flush();
        }
        Err(e) => tracing::error!(error = %e, "failed to encode response"),
    }
}
