//! Site profile: display name, description, locale, and appearance.
//!
//! Stored as JSON in the `customized-profile` system setting. An absent setting
//! yields the defaults; fields missing from the stored JSON fall back to them too.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::store::{Store, SystemSetting};

/// System setting name holding the profile JSON.
pub const CUSTOMIZED_PROFILE_SETTING: &str = "customized-profile";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomizedProfile {
    pub name: String,
    pub logo_url: String,
    pub description: String,
    pub locale: String,
    pub appearance: String,
    pub external_url: String,
}

impl Default for CustomizedProfile {
    fn default() -> Self {
        Self {
            name: "memos".into(),
            logo_url: String::new(),
            description: String::new(),
            locale: "en".into(),
            appearance: "system".into(),
            external_url: String::new(),
        }
    }
}

/// Read the profile through the store's system-setting cache.
pub fn get_customized_profile(store: &Store) -> Result<CustomizedProfile> {
    match store.find_by_id::<SystemSetting>(&CUSTOMIZED_PROFILE_SETTING.to_string()) {
        Ok(setting) => serde_json::from_str(&setting.value).map_err(|e| {
            StoreError::InvalidInput(format!("malformed {CUSTOMIZED_PROFILE_SETTING} setting: {e}"))
        }),
        Err(e) if e.is_not_found() => Ok(CustomizedProfile::default()),
        Err(e) => Err(e),
    }
}
