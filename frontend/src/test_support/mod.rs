#[cfg(test)]
pub mod helpers {
    use std::rc::Rc;

    use chrono::Utc;

    use crate::state::session::{Role, Session, SessionManager, SESSION_STORAGE_KEY};
    use crate::utils::storage::{MemoryStore, SessionStore};

    pub fn memory_session() -> SessionManager {
        SessionManager::new(Rc::new(MemoryStore::default()))
    }

    pub fn session_for(role: Role) -> Session {
        let username = match role {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Viewer => "test",
        };
        Session {
            username: username.into(),
            full_name: format!("{} account", role),
            email: Some(format!("{}@f1dashboard.com", username)),
            role,
            token: format!("token-{}", username),
            created_at: Utc::now(),
        }
    }

    /// A session manager that already holds a session with `role`.
    pub fn logged_in_session(role: Role) -> SessionManager {
        let store = Rc::new(MemoryStore::default());
        let raw = serde_json::to_string(&session_for(role)).expect("serialize session");
        store
            .set(SESSION_STORAGE_KEY, &raw)
            .expect("seed session");
        SessionManager::new(store)
    }
}
