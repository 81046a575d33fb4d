use serde::{Deserialize, Serialize};

/// Caller-supplied context for a new call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallRequest {
    /// External call record this session reports into
    pub call_id: String,

    /// Agent the call was placed for
    #[serde(default)]
    pub agent_id: Option<String>,

    #[serde(default)]
    pub driver_name: Option<String>,

    #[serde(default)]
    pub load_number: Option<String>,

    #[serde(default)]
    pub origin: Option<String>,

    #[serde(default)]
    pub destination: Option<String>,

    #[serde(default)]
    pub expected_eta: Option<String>,
}

const PLACEHOLDERS: [(&str, &str); 5] = [
    ("driver_name", "driver"),
    ("load_number", "your load"),
    ("origin", "the origin"),
    ("destination", "the destination"),
    ("expected_eta", "the expected time"),
];

impl CallRequest {
    fn placeholder_value(&self, name: &str) -> Option<&str> {
        let value = match name {
            "driver_name" => self.driver_name.as_deref(),
            "load_number" => self.load_number.as_deref(),
            "origin" => self.origin.as_deref(),
            "destination" => self.destination.as_deref(),
            "expected_eta" => self.expected_eta.as_deref(),
            _ => None,
        };
        value.filter(|v| !v.trim().is_empty())
    }
}

/// Replace `{{name}}` placeholders with values from the request, falling back
/// to neutral phrases for anything missing
pub fn fill_placeholders(template: &str, request: &CallRequest) -> String {
    PLACEHOLDERS
        .iter()
        .fold(template.to_string(), |text, &(name, default)| {
            let value = request.placeholder_value(name).unwrap_or(default);
            text.replace(&format!("{{{{{}}}}}", name), value)
        })
}
