use std::{cell::RefCell, collections::HashMap, rc::Rc};

use web_sys::{Storage, Window};

use crate::api::ApiError;

pub fn window() -> Result<Window, ApiError> {
    web_sys::window().ok_or_else(|| ApiError::unknown("No window object"))
}

pub fn local_storage() -> Result<Storage, ApiError> {
    window()?
        .local_storage()
        .map_err(|_| ApiError::unknown("No localStorage"))?
        .ok_or_else(|| ApiError::unknown("No localStorage"))
}

/// Key-value persistence for the session record.
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, ApiError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ApiError>;
    fn remove(&self, key: &str) -> Result<(), ApiError>;
}

/// Browser `localStorage`, scoped to the page origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

impl SessionStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        local_storage()?
            .get_item(key)
            .map_err(|_| ApiError::unknown(format!("Failed to read {}", key)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ApiError> {
        local_storage()?
            .set_item(key, value)
            .map_err(|_| ApiError::unknown(format!("Failed to store {}", key)))
    }

    fn remove(&self, key: &str) -> Result<(), ApiError> {
        local_storage()?
            .remove_item(key)
            .map_err(|_| ApiError::unknown(format!("Failed to remove {}", key)))
    }
}

/// Process-local store for host builds and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ApiError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ApiError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub fn default_store() -> Rc<dyn SessionStore> {
    Rc::new(LocalStorageStore)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn default_store() -> Rc<dyn SessionStore> {
    Rc::new(MemoryStore::default())
}
