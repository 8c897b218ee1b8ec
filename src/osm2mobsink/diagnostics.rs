use super::error::Warning;
use serde::Serialize;

// Diagnostics summarizes what a successful conversion kept and skipped
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub nodes_read: usize,
    pub nodes_outside_bounds: usize,
    pub ways_read: usize,
    pub ways_without_highway: usize,
    pub missing_references: usize,
    pub segments: usize,
    pub warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[test]
fn test_to_json() {
    let mut diagnostics = Diagnostics {
        nodes_read: 3,
        segments: 2,
        ..Default::default()
    };
    diagnostics.warn(Warning::DuplicateBounds);

    let json: serde_json::Value = serde_json::from_str(&diagnostics.to_json().unwrap()).unwrap();
    assert_eq!(3, json["nodes_read"]);
    assert_eq!(2, json["segments"]);
    assert_eq!("duplicate_bounds", json["warnings"][0]["kind"]);
}
