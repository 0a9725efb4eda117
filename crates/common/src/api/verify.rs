use serde::{Deserialize, Serialize};

/// POST /verify request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub text: String,
    #[serde(default = "enabled")]
    pub verify_citations: bool,
    #[serde(default = "enabled")]
    pub verify_facts: bool,
}

fn enabled() -> bool {
    true
}

/// Body of every non-2xx response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET / response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    /// Route → short description.
    pub endpoints: std::collections::BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggles_default_to_enabled() {
        let req: VerifyRequest = serde_json::from_str(r#"{"text": "x"}"#).unwrap();
        assert!(req.verify_citations);
        assert!(req.verify_facts);

        let req: VerifyRequest =
            serde_json::from_str(r#"{"text": "x", "verify_facts": false}"#).unwrap();
        assert!(req.verify_citations);
        assert!(!req.verify_facts);
    }
}
