//! End-to-end scenarios exercising the dispatcher against an in-memory store.

use std::sync::Arc;
use std::time::Duration;

use broker_config::Config;
use broker_dispatch::call_tool;
use broker_kernel::liveness;
use broker_kernel::BrokerContext;
use broker_primitives::ProjectId;
use broker_store::memory::MemoryStore;
use serde_json::json;
use tokio::sync::Mutex;

fn ctx() -> Arc<BrokerContext> {
    Arc::new(BrokerContext::new(Arc::new(MemoryStore::new()), Config::default()))
}

#[tokio::test]
async fn s1_two_agents_one_handshake() {
    let ctx = ctx();

    let first = call_tool(
        &ctx,
        "register_agent",
        json!({
            "project_id": "p", "session_name": "task-001",
            "task_id": "001", "branch": "br/a", "description": "A",
        }),
    )
    .await;
    assert_eq!(first["status"], "registered");
    assert_eq!(first["other_active_agents"], json!([]));

    let second = call_tool(
        &ctx,
        "register_agent",
        json!({
            "project_id": "p", "session_name": "task-002",
            "task_id": "002", "branch": "br/b", "description": "B",
        }),
    )
    .await;
    assert_eq!(second["other_active_agents"], json!(["task-001"]));

    let inbox = call_tool(
        &ctx,
        "check_messages",
        json!({"project_id": "p", "session_name": "task-001"}),
    )
    .await;
    let messages = inbox.as_array().expect("check_messages returns a list");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["from"], "task-002");
    assert!(messages[0]["content"].as_str().unwrap_or_default().contains("joined"));
}

#[tokio::test]
async fn s2_lock_conflict_and_release() {
    let ctx = ctx();
    for (session, task) in [("task-001", "001"), ("task-002", "002")] {
        call_tool(
            &ctx,
            "register_agent",
            json!({"project_id": "p", "session_name": session, "task_id": task, "branch": "b", "description": "d"}),
        )
        .await;
    }

    let locked = call_tool(
        &ctx,
        "announce_file_change",
        json!({"project_id": "p", "session_name": "task-001", "file_path": "src/x.ts", "change_type": "modify", "description": "X"}),
    )
    .await;
    assert_eq!(locked["status"], "locked");

    let conflict = call_tool(
        &ctx,
        "announce_file_change",
        json!({"project_id": "p", "session_name": "task-002", "file_path": "src/x.ts", "change_type": "modify", "description": "Y"}),
    )
    .await;
    assert_eq!(conflict["status"], "conflict");
    assert_eq!(conflict["lock_info"]["session_name"], "task-001");

    let released = call_tool(
        &ctx,
        "release_file_lock",
        json!({"project_id": "p", "session_name": "task-001", "file_path": "src/x.ts"}),
    )
    .await;
    assert_eq!(released["status"], "released");

    let reclaimed = call_tool(
        &ctx,
        "announce_file_change",
        json!({"project_id": "p", "session_name": "task-002", "file_path": "src/x.ts", "change_type": "modify", "description": "Y"}),
    )
    .await;
    assert_eq!(reclaimed["status"], "locked");
}

#[tokio::test]
async fn s3_synchronous_query_with_response() {
    let ctx = ctx();
    for (session, task) in [("task-001", "001"), ("task-002", "002")] {
        call_tool(
            &ctx,
            "register_agent",
            json!({"project_id": "p", "session_name": session, "task_id": task, "branch": "b", "description": "d"}),
        )
        .await;
    }

    let parked = {
        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            call_tool(
                &ctx,
                "query_agent",
                json!({
                    "project_id": "p", "from_session": "task-002", "to_session": "task-001",
                    "query_type": "api", "query": "?", "wait_for_response": true, "timeout": 10,
                }),
            )
            .await
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    let inbox = call_tool(
        &ctx,
        "check_messages",
        json!({"project_id": "p", "session_name": "task-001"}),
    )
    .await;
    let messages = inbox.as_array().expect("list of envelopes");
    let envelope = messages.iter().find(|m| m["query_type"] == "api").expect("query envelope present");
    let message_id = envelope["id"].as_str().expect("message id").to_string();

    let answered = call_tool(
        &ctx,
        "respond_to_query",
        json!({
            "project_id": "p", "from_session": "task-001", "to_session": "task-002",
            "message_id": message_id, "response": "R",
        }),
    )
    .await;
    assert_eq!(answered["status"], "responded");

    let result = parked.await.expect("parked task did not panic");
    assert_eq!(result["status"], "received");
    assert_eq!(result["response"], "R");
}

#[tokio::test]
async fn s4_query_timeout_within_bound() {
    let ctx = ctx();
    call_tool(
        &ctx,
        "register_agent",
        json!({"project_id": "p", "session_name": "task-001", "task_id": "001", "branch": "b", "description": "d"}),
    )
    .await;

    let started = std::time::Instant::now();
    let result = call_tool(
        &ctx,
        "query_agent",
        json!({
            "project_id": "p", "from_session": "task-002", "to_session": "task-001",
            "query_type": "api", "query": "?", "wait_for_response": true, "timeout": 1,
        }),
    )
    .await;
    assert_eq!(result["status"], "timeout");
    assert!(started.elapsed() <= Duration::from_millis(1500));
}

#[tokio::test]
async fn s6_interface_fuzzy_lookup() {
    let ctx = ctx();
    call_tool(
        &ctx,
        "register_agent",
        json!({"project_id": "p", "session_name": "s", "task_id": "001", "branch": "b", "description": "d"}),
    )
    .await;
    call_tool(
        &ctx,
        "register_interface",
        json!({"project_id": "p", "session_name": "s", "interface_name": "UserProfile", "definition": {"fields": []}}),
    )
    .await;

    let miss = call_tool(
        &ctx,
        "query_interface",
        json!({"project_id": "p", "interface_name": "UserProfil"}),
    )
    .await;
    assert_eq!(miss["status"], "not_found");
    let similar = miss["similar"].as_array().expect("similar list present");
    assert!(similar.iter().any(|name| name == "UserProfile"));
}

#[tokio::test]
async fn register_then_unregister_leaves_no_trace() {
    let ctx = ctx();
    call_tool(
        &ctx,
        "register_agent",
        json!({"project_id": "p", "session_name": "task-001", "task_id": "001", "branch": "b", "description": "d"}),
    )
    .await;
    call_tool(
        &ctx,
        "unregister_agent",
        json!({"project_id": "p", "session_name": "task-001"}),
    )
    .await;

    let active = call_tool(&ctx, "list_active_agents", json!({"project_id": "p"})).await;
    assert_eq!(active, json!({}));
}

#[tokio::test]
async fn add_todo_then_get_my_todos_round_trips() {
    let ctx = ctx();
    call_tool(
        &ctx,
        "register_agent",
        json!({"project_id": "p", "session_name": "task-001", "task_id": "001", "branch": "b", "description": "d"}),
    )
    .await;
    call_tool(
        &ctx,
        "add_todo",
        json!({"project_id": "p", "session_name": "task-001", "todo_item": "write tests", "priority": 3}),
    )
    .await;

    let mine = call_tool(
        &ctx,
        "get_my_todos",
        json!({"project_id": "p", "session_name": "task-001"}),
    )
    .await;
    let todos = mine["todos"].as_array().expect("todos list");
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0]["status"], "pending");
    assert_eq!(todos[0]["text"], "write tests");
}

#[tokio::test]
async fn s5_heartbeat_expiry() {
    let config = Config {
        heartbeat_timeout_secs: 0,
        monitor_interval_secs: 1,
        ..Config::default()
    };
    let ctx = Arc::new(BrokerContext::new(Arc::new(MemoryStore::new()), config));

    call_tool(
        &ctx,
        "register_agent",
        json!({"project_id": "p", "session_name": "task-001", "task_id": "001", "branch": "b", "description": "d"}),
    )
    .await;
    call_tool(
        &ctx,
        "announce_file_change",
        json!({"project_id": "p", "session_name": "task-001", "file_path": "src/x.ts", "change_type": "modify", "description": "d"}),
    )
    .await;

    let project = ProjectId::new("p").unwrap();
    let known_projects = Arc::new(Mutex::new(vec![project]));
    let monitor = liveness::spawn(Arc::clone(&ctx), known_projects);

    // heartbeat_timeout_secs: 0 means the TTL expires the instant it is set;
    // monitor_interval_secs: 1 still fires its first sweep immediately.
    tokio::time::sleep(Duration::from_millis(100)).await;
    monitor.abort();

    let active = call_tool(&ctx, "list_active_agents", json!({"project_id": "p"})).await;
    assert_eq!(active, json!({}));

    let reclaimed = call_tool(
        &ctx,
        "announce_file_change",
        json!({"project_id": "p", "session_name": "task-002", "file_path": "src/x.ts", "change_type": "modify", "description": "d2"}),
    )
    .await;
    assert_eq!(reclaimed["status"], "locked");
}

#[tokio::test]
async fn query_agent_zero_timeout_returns_immediately() {
    let ctx = ctx();
    call_tool(
        &ctx,
        "register_agent",
        json!({"project_id": "p", "session_name": "task-001", "task_id": "001", "branch": "b", "description": "d"}),
    )
    .await;

    let result = call_tool(
        &ctx,
        "query_agent",
        json!({
            "project_id": "p", "from_session": "task-002", "to_session": "task-001",
            "query_type": "api", "query": "?", "wait_for_response": true, "timeout": 0,
        }),
    )
    .await;
    assert_eq!(result["status"], "timeout");
}

#[tokio::test]
async fn get_recent_changes_zero_limit_is_empty() {
    let ctx = ctx();
    call_tool(
        &ctx,
        "register_agent",
        json!({"project_id": "p", "session_name": "task-001", "task_id": "001", "branch": "b", "description": "d"}),
    )
    .await;
    call_tool(
        &ctx,
        "announce_file_change",
        json!({"project_id": "p", "session_name": "task-001", "file_path": "x.rs", "change_type": "modify", "description": "d"}),
    )
    .await;

    let changes = call_tool(
        &ctx,
        "get_recent_changes",
        json!({"project_id": "p", "limit": 0}),
    )
    .await;
    assert_eq!(changes.as_array().map(Vec::len), Some(0));
}
