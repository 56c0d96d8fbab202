use crate::{
    api::{ApiClient, ApiError, CredentialAttempt},
    state::session::{Identity, Role, SessionManager},
};
use leptos::*;

pub type AuthContext = (ReadSignal<AuthState>, WriteSignal<AuthState>);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub identity: Option<Identity>,
    pub role: Option<Role>,
    pub is_authenticated: bool,
    pub loading: bool,
}

impl AuthState {
    pub fn from_session(session: &SessionManager) -> Self {
        if session.check_auth().is_err() {
            return Self::default();
        }
        Self {
            identity: session.get_identity().ok(),
            role: session.get_permissions().ok(),
            is_authenticated: true,
            loading: false,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.map_or(false, |role| role.is_admin())
    }
}

pub fn create_auth_context(session: &SessionManager) -> AuthContext {
    let (auth_state, set_auth_state) = create_signal(AuthState::from_session(session));

    let listener = session.on_invalidate(move || {
        log::info!("Session invalidated; returning to login");
        set_auth_state.set(AuthState::default());
    });
    let session = session.clone();
    on_cleanup(move || session.remove_listener(listener));

    (auth_state, set_auth_state)
}

#[component]
pub fn AuthProvider(children: Children) -> impl IntoView {
    let api = use_context::<ApiClient>().unwrap_or_else(|| {
        let api = ApiClient::default();
        provide_context(api.clone());
        api
    });
    let ctx = create_auth_context(api.session());
    provide_context::<AuthContext>(ctx);
    view! { <>{children()}</> }
}

pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>().unwrap_or_else(|| create_signal(AuthState::default()))
}

pub async fn login_request(
    attempt: CredentialAttempt,
    api: &ApiClient,
    set_auth_state: WriteSignal<AuthState>,
) -> Result<(), ApiError> {
    set_auth_state.update(|state| state.loading = true);

    match api.login(attempt).await {
        Ok(_) => {
            set_auth_state.set(AuthState::from_session(api.session()));
            Ok(())
        }
        Err(error) => {
            set_auth_state.update(|state| state.loading = false);
            Err(error)
        }
    }
}

pub fn logout(api: &ApiClient, set_auth_state: WriteSignal<AuthState>) {
    api.logout();
    set_auth_state.set(AuthState::default());
}

pub fn use_login_action() -> Action<CredentialAttempt, Result<(), ApiError>> {
    let (_auth, set_auth) = use_auth();
    let api = use_context::<ApiClient>().unwrap_or_default();

    create_action(move |attempt: &CredentialAttempt| {
        let attempt = attempt.clone();
        let api = api.clone();
        async move { login_request(attempt, &api, set_auth).await }
    })
}

pub fn use_logout_action() -> Action<(), ()> {
    let (_auth, set_auth) = use_auth();
    let api = use_context::<ApiClient>().unwrap_or_default();

    create_action(move |_: &()| {
        let api = api.clone();
        async move { logout(&api, set_auth) }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{logged_in_session, memory_session};
    use leptos::create_runtime;

    fn with_runtime<T>(test: impl FnOnce() -> T) -> T {
        let runtime = create_runtime();
        let result = test();
        runtime.dispose();
        result
    }

    #[test]
    fn use_auth_returns_default_without_context() {
        with_runtime(|| {
            let (state, _set_state) = use_auth();
            let snapshot = state.get();
            assert!(!snapshot.is_authenticated);
            assert!(snapshot.identity.is_none());
        });
    }

    #[test]
    fn auth_context_is_seeded_from_stored_session() {
        with_runtime(|| {
            let (state, _set_state) = create_auth_context(&logged_in_session(Role::Admin));
            let snapshot = state.get();
            assert!(snapshot.is_authenticated);
            assert!(snapshot.is_admin());
            assert_eq!(snapshot.identity.unwrap().id, "admin");
        });
    }

    #[test]
    fn invalidation_flips_state_to_logged_out() {
        with_runtime(|| {
            let session = logged_in_session(Role::User);
            let (state, _set_state) = create_auth_context(&session);
            assert!(state.get().is_authenticated);

            let _ = session.check_error(401);

            let snapshot = state.get();
            assert!(!snapshot.is_authenticated);
            assert!(snapshot.role.is_none());
        });
    }

    #[test]
    fn auth_context_registers_one_removable_listener() {
        with_runtime(|| {
            let session = logged_in_session(Role::Viewer);
            let _ctx = create_auth_context(&session);
            assert_eq!(session.listener_count(), 1);
        });
    }

    #[test]
    fn empty_session_starts_logged_out() {
        with_runtime(|| {
            let (state, _set_state) = create_auth_context(&memory_session());
            assert_eq!(state.get(), AuthState::default());
        });
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod host_tests {
    use super::*;
    use crate::api::test_support::mock::*;
    use crate::test_support::helpers::memory_session;

    #[tokio::test]
    async fn login_and_logout_update_auth_state() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/auth/login");
            then.status(200).json_body(serde_json::json!({
                "access_token": "tok",
                "token_type": "bearer",
                "user": {
                    "id": 2,
                    "username": "user",
                    "full_name": "F1 User",
                    "email": "user@f1dashboard.com",
                    "role": "user"
                }
            }));
        });

        let runtime = create_runtime();
        let (state, set_state) = create_signal(AuthState::default());
        let api = ApiClient::new_with_base_url(server.url("/api"), memory_session());

        login_request(CredentialAttempt::new("user", "user123"), &api, set_state)
            .await
            .unwrap();

        let snapshot = state.get();
        assert!(snapshot.is_authenticated);
        assert_eq!(snapshot.role, Some(Role::User));
        assert_eq!(snapshot.identity.unwrap().full_name, "F1 User");

        logout(&api, set_state);
        let snapshot = state.get();
        assert!(!snapshot.is_authenticated);
        assert!(snapshot.identity.is_none());
        assert!(api.session().check_auth().is_err());
        runtime.dispose();
    }

    #[tokio::test]
    async fn failed_login_clears_loading_flag() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/auth/login");
            then.status(401)
                .json_body(serde_json::json!({"detail": "Invalid username or password"}));
        });

        let runtime = create_runtime();
        let (state, set_state) = create_signal(AuthState::default());
        let api = ApiClient::new_with_base_url(server.url("/api"), memory_session());

        let err = login_request(CredentialAttempt::new("nobody", "x"), &api, set_state)
            .await
            .unwrap_err();

        assert_eq!(err.error, "Invalid username or password");
        let snapshot = state.get();
        assert!(!snapshot.loading);
        assert!(!snapshot.is_authenticated);
        runtime.dispose();
    }
}
