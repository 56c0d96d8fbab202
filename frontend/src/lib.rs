pub mod api;
pub mod config;
pub mod state;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use api::{
    ApiClient, ApiError, CredentialAttempt, ErrorKind, ListParams, ListResult, RecordId,
};
pub use state::auth::{use_auth, AuthProvider, AuthState};
pub use state::session::{Authenticator, Identity, Role, Session, SessionManager};

/// Installs the panic hook and routes `log` records to the browser console.
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("Logger already initialized: {}", err).into());
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    init_logging();
    log::info!("Starting F1 dashboard client (wasm)");

    // Resolve the API base URL from env.js or ./config.json without blocking startup.
    wasm_bindgen_futures::spawn_local(async move {
        config::init().await;
    });
}
