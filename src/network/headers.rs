//! Request header construction

use std::collections::HashMap;

/// Client name reported to the service
pub const CLIENT_NAME: &str = "appsearch-rs";

/// Headers sent with every API request
///
/// Caller-supplied headers are applied last and override the defaults.
pub fn client_headers(
    search_key: Option<&str>,
    additional: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut headers = HashMap::new();

    if let Some(key) = search_key.filter(|k| !k.is_empty()) {
        headers.insert("Authorization".to_string(), format!("Bearer {}", key));
    }
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers.insert("X-Swiftype-Client".to_string(), CLIENT_NAME.to_string());
    headers.insert(
        "X-Swiftype-Client-Version".to_string(),
        crate::VERSION.to_string(),
    );

    for (key, value) in additional {
        headers.insert(key.clone(), value.clone());
    }

    headers
}
