//! Stdio JSON-RPC entry point for the coordination broker.
//!
//! Reads line-delimited JSON-RPC requests from stdin, dispatches `tools/call`
//! through [`broker_dispatch::call_tool`], and writes one response line per
//! request to stdout. Logs go to stderr so they never interleave with the
//! protocol stream.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use broker::jsonrpc::{self, JsonRpcResponse};
use broker_config::Config;
use broker_dispatch::{list_tools, ToolMetadata};
use broker_kernel::liveness::{self, KnownProjects};
use broker_kernel::BrokerContext;
use broker_primitives::ProjectId;
use broker_store::redis_store::RedisStore;
use serde_json::{json, Value};
use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    broker_telemetry::init(&config.log_level);

    let store = match connect_with_retry(&config).await {
        Ok(store) => store,
        Err(err) => {
            tracing::error!(%err, "store unreachable, giving up");
            return ExitCode::FAILURE;
        }
    };

    let ctx = Arc::new(BrokerContext::new(Arc::new(store), config));
    let known_projects: KnownProjects = Arc::new(Mutex::new(Vec::new()));
    let monitor = liveness::spawn(Arc::clone(&ctx), Arc::clone(&known_projects));

    let exit = run_stdio_loop(&ctx, &known_projects).await;

    monitor.abort();
    exit
}

/// Connects to the store, retrying with a fixed backoff until
/// `STORE_RECONNECT_DEADLINE` elapses.
async fn connect_with_retry(config: &Config) -> Result<RedisStore, broker_store::StoreError> {
    let deadline = Duration::from_secs(config.store_reconnect_deadline_secs);
    let start = std::time::Instant::now();
    let mut last_err = None;
    loop {
        match RedisStore::connect(&config.store_url).await {
            Ok(store) => return Ok(store),
            Err(err) => {
                tracing::warn!(%err, "store connection failed, retrying");
                last_err = Some(err);
                if start.elapsed() >= deadline {
                    break;
                }
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
    Err(last_err.expect("loop only exits after at least one failed attempt"))
}

/// Reads requests from stdin until EOF or a shutdown signal, dispatching
/// each `tools/call` and writing its response. Returns the process exit code.
async fn run_stdio_loop(ctx: &Arc<BrokerContext>, known_projects: &KnownProjects) -> ExitCode {
    let (line_tx, mut line_rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if line_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let stdout = io::stdout();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = line_rx.recv() => {
                let Some(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                if let Some(response) = handle_line(ctx, known_projects, &line).await {
                    let mut out = stdout.lock();
                    let _ = writeln!(out, "{}", jsonrpc::format_response(&response));
                    let _ = out.flush();
                }
            }
            () = &mut shutdown => {
                tracing::info!("received shutdown signal, draining");
                break;
            }
        }
    }

    ExitCode::SUCCESS
}

/// Resolves once SIGINT or (on unix) SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut terminate =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("installing SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}

async fn handle_line(
    ctx: &Arc<BrokerContext>,
    known_projects: &KnownProjects,
    input: &str,
) -> Option<JsonRpcResponse> {
    let request = match jsonrpc::parse_request(input) {
        Ok(request) => request,
        Err(err) => {
            return Some(JsonRpcResponse::error(None, -32700, format!("parse error: {err}")));
        }
    };

    let id = request.id.clone();
    if id.is_none() {
        return None;
    }

    match request.method.as_str() {
        "initialize" => Some(JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {"tools": {}},
                "serverInfo": {"name": "broker", "version": env!("CARGO_PKG_VERSION")},
            }),
        )),
        "tools/list" => Some(JsonRpcResponse::success(
            id,
            json!({"tools": tool_definitions()}),
        )),
        "tools/call" => Some(handle_tools_call(ctx, known_projects, id, request.params).await),
        other => Some(JsonRpcResponse::error(
            id,
            -32601,
            format!("method not found: {other}"),
        )),
    }
}

async fn handle_tools_call(
    ctx: &Arc<BrokerContext>,
    known_projects: &KnownProjects,
    id: Option<Value>,
    params: Option<Value>,
) -> JsonRpcResponse {
    let Some(params) = params else {
        return JsonRpcResponse::error(id, -32602, "missing params".to_string());
    };
    let Some(tool_name) = params.get("name").and_then(Value::as_str) else {
        return JsonRpcResponse::error(id, -32602, "missing tool name".to_string());
    };
    let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

    remember_project(known_projects, &arguments).await;

    let result = broker_dispatch::call_tool(ctx, tool_name, arguments).await;
    let text = serde_json::to_string(&result).unwrap_or_else(|_| result.to_string());
    JsonRpcResponse::success(id, json!({"content": [{"type": "text", "text": text}]}))
}

/// Adds `args.project_id` to the monitor's sweep set, so newly seen projects
/// get reaped without the transport binary needing to know them upfront.
async fn remember_project(known_projects: &KnownProjects, args: &Value) {
    let Some(raw) = args.get("project_id").and_then(Value::as_str) else {
        return;
    };
    let Ok(project_id) = ProjectId::new(raw) else {
        return;
    };
    let mut guard = known_projects.lock().await;
    if !guard.contains(&project_id) {
        guard.push(project_id);
    }
}

fn tool_definitions() -> Vec<Value> {
    list_tools().iter().map(tool_definition).collect()
}

fn tool_definition(tool: &ToolMetadata) -> Value {
    let mut properties = serde_json::Map::new();
    for name in tool.required_args {
        properties.insert((*name).to_string(), json!({"type": "string"}));
    }
    json!({
        "name": tool.name,
        "description": tool.description,
        "inputSchema": {
            "type": "object",
            "properties": properties,
            "required": tool.required_args,
        }
    })
}
