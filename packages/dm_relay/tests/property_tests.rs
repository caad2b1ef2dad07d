use proptest::prelude::*;
use std::collections::HashSet;

use dm_relay::relay::{ConnectionRegistry, LifecycleError, SessionState};

// --- Connection registry ---

#[derive(Debug, Clone)]
enum Op {
    Register(u8, u8),
    DropSession(u8),
    DropUser(u8),
}

fn arb_op() -> impl Strategy<Value = Op> {
    // Small id spaces so collisions are frequent
    prop_oneof![
        3 => (0u8..5, 0u8..5).prop_map(|(u, s)| Op::Register(u, s)),
        1 => (0u8..5).prop_map(Op::DropSession),
        1 => (0u8..5).prop_map(Op::DropUser),
    ]
}

fn user(n: u8) -> String {
    format!("u{n}")
}

fn session(n: u8) -> String {
    format!("s{n}")
}

/// Straightforward reference: ordered list of (user, session) pairs.
fn apply_model(model: &mut Vec<(String, String)>, op: &Op) {
    match op {
        Op::Register(u, s) => {
            let (u, s) = (user(*u), session(*s));
            model.retain(|(mu, ms)| *mu != u && *ms != s);
            model.push((u, s));
        }
        Op::DropSession(s) => {
            let s = session(*s);
            model.retain(|(_, ms)| *ms != s);
        }
        Op::DropUser(u) => {
            let u = user(*u);
            model.retain(|(mu, _)| *mu != u);
        }
    }
}

fn apply(registry: &mut ConnectionRegistry, op: &Op) {
    match op {
        Op::Register(u, s) => {
            registry.register(&user(*u), &session(*s));
        }
        Op::DropSession(s) => {
            registry.unregister_by_session(&session(*s));
        }
        Op::DropUser(u) => {
            registry.unregister_by_user(&user(*u));
        }
    }
}

proptest! {
    #[test]
    fn registry_never_duplicates(ops in prop::collection::vec(arb_op(), 0..64)) {
        let mut registry = ConnectionRegistry::new();
        for op in &ops {
            apply(&mut registry, op);

            let snapshot = registry.snapshot();
            let users: HashSet<_> = snapshot.iter().map(|e| e.user_id.clone()).collect();
            let sessions: HashSet<_> = snapshot.iter().map(|e| e.session_id.clone()).collect();
            prop_assert_eq!(users.len(), snapshot.len());
            prop_assert_eq!(sessions.len(), snapshot.len());
        }
    }

    #[test]
    fn registry_matches_model(ops in prop::collection::vec(arb_op(), 0..64)) {
        let mut registry = ConnectionRegistry::new();
        let mut model = Vec::new();
        for op in &ops {
            apply(&mut registry, op);
            apply_model(&mut model, op);
        }
        let actual: Vec<(String, String)> = registry
            .snapshot()
            .into_iter()
            .map(|e| (e.user_id, e.session_id))
            .collect();
        prop_assert_eq!(actual, model);
    }

    #[test]
    fn find_agrees_with_snapshot(ops in prop::collection::vec(arb_op(), 0..32), probe in 0u8..5) {
        let mut registry = ConnectionRegistry::new();
        for op in &ops {
            apply(&mut registry, op);
        }
        let expected = registry
            .snapshot()
            .into_iter()
            .find(|e| e.user_id == user(probe))
            .map(|e| e.session_id);
        prop_assert_eq!(registry.find(&user(probe)).map(str::to_string), expected);
    }

    #[test]
    fn register_reports_displaced_session(u in 0u8..5, s1 in 0u8..5, s2 in 0u8..5) {
        let mut registry = ConnectionRegistry::new();
        registry.register(&user(u), &session(s1));
        let displaced = registry.register(&user(u), &session(s2));
        if s1 == s2 {
            prop_assert_eq!(displaced, None);
        } else {
            prop_assert_eq!(displaced, Some(session(s1)));
        }
        prop_assert_eq!(registry.snapshot().len(), 1);
    }
}

// --- Session lifecycle ---

proptest! {
    #[test]
    fn logout_only_for_announced_identity(announced in "[a-z]{1,8}", requested in "[a-z]{1,8}") {
        let mut state = SessionState::default();
        state.announce(&announced).unwrap();
        let result = state.logout(&requested);
        if announced == requested {
            prop_assert_eq!(result, Ok(announced));
            prop_assert!(state.is_closed());
        } else {
            let is_mismatch = matches!(result, Err(LifecycleError::LogoutMismatch { .. }));
            prop_assert!(is_mismatch);
            prop_assert_eq!(state.sender(), Ok(announced.as_str()));
        }
    }
}
