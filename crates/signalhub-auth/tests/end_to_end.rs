//! End-to-end scenario: a list signal observed through the secure
//! registry's JSON surface, the way the endpoint layer drives it.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_stream::StreamExt;

use signalhub_auth::{AccessRule, AccessRules, Principal, SecureSignalsRegistry};
use signalhub_core::{ListSignal, Signal, SignalsRegistry};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Person {
    name: String,
    age: u32,
    active: bool,
}

fn secure_registry(rule: AccessRule) -> SecureSignalsRegistry {
    let rules = AccessRules::new().with_rule("PersonEndpoint", "people", rule);
    SecureSignalsRegistry::new(Arc::new(rules), Arc::new(SignalsRegistry::new()))
}

#[tokio::test]
async fn insert_person_delivers_exactly_two_notifications() {
    let registry = secure_registry(AccessRule::AllowAnonymous);

    let typed: Arc<ListSignal<Person>> = Arc::new(ListSignal::new());
    let erased: Arc<dyn Signal> = Arc::clone(&typed) as Arc<dyn Signal>;
    registry
        .register("client-1", "PersonEndpoint", "people", None, move || erased)
        .unwrap();

    // The transport subscribes through the type-erased surface.
    let signal = registry.get("client-1", None).unwrap().unwrap();
    let mut stream = signal.subscribe_json();

    signal
        .submit_json(json!({
            "id": "req-1",
            "type": "insert",
            "position": "last",
            "value": { "name": "John", "age": 42, "active": true }
        }))
        .unwrap();

    // First notification: the initial empty snapshot.
    let initial = stream.next().await.unwrap();
    assert_eq!(initial["type"], "snapshot");
    assert_eq!(initial["entries"], json!([]));

    // Second: the post-insert snapshot with the single matching entry.
    let after_insert = stream.next().await.unwrap();
    assert_eq!(after_insert["id"], "req-1");
    assert_eq!(after_insert["accepted"], true);
    let entries = after_insert["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0]["value"],
        json!({ "name": "John", "age": 42, "active": true })
    );
    assert!(entries[0].get("previous").is_none());
    assert!(entries[0].get("next").is_none());

    // And nothing else.
    let next = tokio::time::timeout(Duration::from_millis(20), stream.next()).await;
    assert!(next.is_err(), "expected exactly two notifications");

    // The typed view agrees with what subscribers saw.
    let entries = typed.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].value.name, "John");
}

#[tokio::test]
async fn revoked_access_denies_a_later_get_like_a_first_call() {
    let registry = secure_registry(AccessRule::RequireRole(vec!["admin".to_string()]));

    let admin = Principal::with_roles("alice", ["admin"]);
    registry
        .register("client-1", "PersonEndpoint", "people", Some(&admin), || {
            Arc::new(ListSignal::<Person>::new()) as Arc<dyn Signal>
        })
        .unwrap();
    assert!(registry.get("client-1", Some(&admin)).unwrap().is_some());

    let demoted = Principal::with_roles("alice", ["user"]);
    assert!(registry.get("client-1", Some(&demoted)).is_err());
    assert!(registry.get("client-1", None).is_err());
}
