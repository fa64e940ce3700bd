//! Server information from `/api/v1/about`.

use serde::Deserialize;

/// Version information reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct About {
    /// Firefly III version.
    pub version: String,
    /// API version.
    #[serde(default)]
    pub api_version: Option<String>,
    /// Host operating system.
    #[serde(default)]
    pub os: Option<String>,
    /// PHP runtime version.
    #[serde(default)]
    pub php_version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Document;

    #[test]
    fn deserialize_about() {
        let json = r#"{"data": {"version": "6.1.18", "api_version": "2.0.14",
                                "php_version": "8.3.4", "os": "Linux", "driver": "mysql"}}"#;
        let doc: Document<About> = serde_json::from_str(json).unwrap();
        assert_eq!(doc.data.version, "6.1.18");
        assert_eq!(doc.data.os.as_deref(), Some("Linux"));
    }
}
