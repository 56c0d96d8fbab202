use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub api_base_url: Option<String>,
}

static API_BASE_URL: OnceLock<String> = OnceLock::new();

pub fn normalize_base_url(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}

fn cache_base_url(value: &str) -> String {
    let value = normalize_base_url(value);
    API_BASE_URL.get_or_init(|| value).clone()
}

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::RuntimeConfig;

    fn global_string(object: &str, keys: [&str; 2]) -> Option<String> {
        // Expect optional global object: window.<object> = { API_BASE_URL: "..." }
        let w = web_sys::window()?;
        let any = js_sys::Reflect::get(&w, &object.into()).ok()?;
        if any.is_undefined() || any.is_null() {
            return None;
        }
        let obj = js_sys::Object::from(any);
        keys.iter()
            .filter_map(|key| js_sys::Reflect::get(&obj, &(*key).into()).ok())
            .find(|v| !v.is_undefined() && !v.is_null())
            .and_then(|v| v.as_string())
    }

    pub fn snapshot_from_globals() -> Option<String> {
        global_string("__F1_DASHBOARD_ENV", ["API_BASE_URL", "api_base_url"])
            .or_else(|| global_string("__F1_DASHBOARD_CONFIG", ["api_base_url", "API_BASE_URL"]))
    }

    pub fn write_window_config(cfg: &RuntimeConfig) {
        let (Some(url), Some(w)) = (&cfg.api_base_url, web_sys::window()) else {
            return;
        };
        let obj = js_sys::Object::new();
        let _ = js_sys::Reflect::set(
            &obj,
            &"api_base_url".into(),
            &wasm_bindgen::JsValue::from_str(url),
        );
        let _ = js_sys::Reflect::set(&w, &"__F1_DASHBOARD_CONFIG".into(), &obj);
    }

    pub async fn fetch_runtime_config() -> Option<RuntimeConfig> {
        let origin = web_sys::window()?.location().origin().ok()?;
        let resp = reqwest::get(format!("{}/config.json", origin)).await.ok()?;
        if !resp.status().is_success() {
            return None;
        }
        resp.json::<RuntimeConfig>().await.ok()
    }
}

#[cfg(target_arch = "wasm32")]
pub async fn await_api_base_url() -> String {
    if let Some(cached) = API_BASE_URL.get() {
        return cached.clone();
    }
    if let Some(existing) = browser::snapshot_from_globals() {
        return cache_base_url(&existing);
    }
    if let Some(cfg) = browser::fetch_runtime_config().await {
        browser::write_window_config(&cfg);
        if let Some(url) = cfg.api_base_url {
            return cache_base_url(&url);
        }
    }
    log::info!("No runtime config found; using {}", DEFAULT_API_BASE_URL);
    cache_base_url(DEFAULT_API_BASE_URL)
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn await_api_base_url() -> String {
    if let Some(cached) = API_BASE_URL.get() {
        return cached.clone();
    }
    match std::env::var("F1_API_BASE_URL") {
        Ok(url) if !url.trim().is_empty() => cache_base_url(&url),
        _ => cache_base_url(DEFAULT_API_BASE_URL),
    }
}

pub async fn init() {
    let url = await_api_base_url().await;
    log::info!("API base URL: {}", url);
}
