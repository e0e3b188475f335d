//! # Session Lifecycle Flows
//!
//! Observed through the mock engine's event log:
//!
//! ```text
//! Created(n) ─ Sent/Delivered pairs ─┬─ Created(n+1) ─ init ─ Destroyed(n)
//!                                    └─ Destroyed(n) at shutdown
//! ```

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
    use std::sync::Arc;

    use pool_telemetry::{encode_metrics, register_metrics};
    use tonlib_pool::{MethodRef, MockEngine, QueryError, SessionEvent, TonQueryApi};

    use crate::fixtures::{chain_answer, chain_engine, client, RAW_ADDRESS};

    fn position(events: &[SessionEvent], wanted: &SessionEvent) -> usize {
        events
            .iter()
            .position(|e| e == wanted)
            .unwrap_or_else(|| panic!("{:?} not in {:?}", wanted, events))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_worker_never_interleaves_exchanges() {
        let engine = chain_engine().with_answer_delay(std::time::Duration::from_millis(3));
        let client = Arc::new(client(&engine, 1, 300));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let client = Arc::clone(&client);
            handles.push(tokio::spawn(async move {
                client.get_account_state(RAW_ADDRESS).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // One session, and every send is answered before the next send.
        let exchanges: Vec<SessionEvent> = engine
            .events()
            .into_iter()
            .filter(|e| matches!(e, SessionEvent::Sent { .. } | SessionEvent::Delivered { .. }))
            .collect();
        assert_eq!(engine.created(), 1);
        assert_eq!(exchanges.len(), 2 * (2 + 6));
        for pair in exchanges.chunks(2) {
            assert!(matches!(pair[0], SessionEvent::Sent { session: 0, .. }));
            assert!(matches!(pair[1], SessionEvent::Delivered { session: 0, .. }));
        }
    }

    #[tokio::test]
    async fn test_each_worker_owns_one_session() {
        let engine = chain_engine();
        let client = client(&engine, 4, 300);
        assert_eq!(client.workers(), 4);
        assert_eq!(engine.created(), 4);

        for _ in 0..10 {
            client.get_account_state(RAW_ADDRESS).await.unwrap();
        }
        assert_eq!(engine.created(), 4);
    }

    #[tokio::test]
    async fn test_load_budget_recycles_session_before_next_load() {
        let engine = chain_engine();
        let client = client(&engine, 1, 2);

        for _ in 0..2 {
            client
                .run_get_method(RAW_ADDRESS, MethodRef::from("seqno"), Vec::new())
                .await
                .unwrap();
        }
        assert_eq!(engine.created(), 1);

        let mark = engine.events().len();
        client
            .run_get_method(RAW_ADDRESS, MethodRef::from("seqno"), Vec::new())
            .await
            .unwrap();
        assert_eq!(engine.created(), 2);

        let tail = &engine.events()[mark..];
        let created = position(tail, &SessionEvent::Created { session: 1 });
        let init = position(
            tail,
            &SessionEvent::Sent {
                session: 1,
                request: "init".into(),
            },
        );
        let destroyed = position(tail, &SessionEvent::Destroyed { session: 0 });
        let load = position(
            tail,
            &SessionEvent::Sent {
                session: 1,
                request: "smc.load".into(),
            },
        );
        assert!(created < init && init < destroyed && destroyed < load);
    }

    #[tokio::test]
    async fn test_load_budget_restarts_after_recycle() {
        let engine = chain_engine();
        let client = client(&engine, 1, 2);
        let seqno = || MethodRef::from("seqno");

        // Third load recycles the session; the next one fits its fresh budget.
        for _ in 0..3 {
            client.run_get_method(RAW_ADDRESS, seqno(), Vec::new()).await.unwrap();
        }
        assert_eq!(engine.created(), 2);
        client.run_get_method(RAW_ADDRESS, seqno(), Vec::new()).await.unwrap();
        assert_eq!(engine.created(), 2);

        client.run_get_method(RAW_ADDRESS, seqno(), Vec::new()).await.unwrap();
        assert_eq!(engine.created(), 3);
    }

    #[tokio::test]
    async fn test_unknown_message_never_answers_the_next_caller() {
        let calls = Arc::new(AtomicI64::new(0));
        let counter = Arc::clone(&calls);
        let engine = MockEngine::new(move |request: &Value| {
            if request["@type"] == "raw.getAccountState" {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                let mut answer = chain_answer(request)?;
                answer["balance"] = Value::from(n.to_string());
                return Some(answer);
            }
            chain_answer(request)
        });
        let client = client(&engine, 1, 300);

        engine.push_stray(r#"{"@type":"updateSendLiteServerQuery","id":"1","data":""}"#);
        assert_eq!(client.get_account_state(RAW_ADDRESS).await.unwrap().balance, 1);

        engine.push_stray(r#"{"@type":"blocks.somethingNew"}"#);
        let err = client.get_account_state(RAW_ADDRESS).await.unwrap_err();
        assert!(matches!(err, QueryError::UnrecognizedResponse(_)));

        // Answer 2 was left behind on the replaced session.
        assert_eq!(client.get_account_state(RAW_ADDRESS).await.unwrap().balance, 3);
        assert_eq!(engine.created(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_reinitialisation_is_counted() {
        register_metrics().unwrap();
        let engine = chain_engine();
        let client = client(&engine, 1, 1);
        for _ in 0..2 {
            client
                .run_get_method(RAW_ADDRESS, MethodRef::Number(85143), Vec::new())
                .await
                .unwrap();
        }
        let text = encode_metrics().unwrap();
        assert!(text.contains("tonlib_session_reinitializations_total{reason=\"load_threshold\"}"));
    }

    #[tokio::test]
    async fn test_deadline_recovers_on_fresh_session() {
        let silent_once = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&silent_once);
        let engine = MockEngine::new(move |request: &Value| {
            if request["@type"] == "raw.getAccountState" && flag.swap(false, Ordering::SeqCst) {
                return None;
            }
            chain_answer(request)
        });
        let client = client(&engine, 1, 300);

        let err = client.get_account_state(RAW_ADDRESS).await.unwrap_err();
        assert!(matches!(err, QueryError::Timeout { request: "raw.getAccountState", .. }));
        assert_eq!(err.code(), 504);

        // The abandoned session is replaced before the next exchange.
        let state = client.get_account_state(RAW_ADDRESS).await.unwrap();
        assert_eq!(state.balance, 1_000_000_000);
        assert_eq!(engine.created(), 2);
        assert!(engine
            .events()
            .contains(&SessionEvent::Destroyed { session: 0 }));
    }

    #[tokio::test]
    async fn test_failed_start_reports_unavailable() {
        let engine = chain_engine().with_init_error(400, "invalid config");
        let result = tonlib_pool::TonlibClient::start(
            &crate::fixtures::pool_config(2, 300),
            Arc::new(engine),
        );
        assert!(matches!(result, Err(QueryError::SessionUnavailable(_))));
    }

    #[tokio::test]
    async fn test_shutdown_destroys_sessions_and_closes_pool() {
        let engine = chain_engine();
        let mut client = client(&engine, 3, 300);
        client.get_account_state(RAW_ADDRESS).await.unwrap();

        client.shutdown();
        let destroyed = engine
            .events()
            .iter()
            .filter(|e| matches!(e, SessionEvent::Destroyed { .. }))
            .count();
        assert_eq!(destroyed, 3);

        let err = client.get_account_state(RAW_ADDRESS).await.unwrap_err();
        assert!(matches!(err, QueryError::PoolClosed));
    }
}
