use serde::Serialize;
use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed OSM input: {reason}")]
    MalformedInput { reason: String },

    #[error("Degenerate bounds (lat span {lat_span}, lon span {lon_span}), cannot derive network size")]
    DegenerateBounds { lat_span: f64, lon_span: f64 },

    #[error("Failed to read {path}: {source}")]
    ReadInput { path: PathBuf, source: io::Error },

    #[error("Failed to write {path}: {source}")]
    WriteOutput { path: PathBuf, source: io::Error },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to serialize network: {0}")]
    Xml(#[from] quick_xml::Error),
}

impl Error {
    pub fn malformed(reason: impl Into<String>) -> Error {
        Error::MalformedInput {
            reason: reason.into(),
        }
    }

    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Error::MalformedInput { .. })
    }

    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Error::ReadInput { .. } | Error::WriteOutput { .. } | Error::Io(_) | Error::Xml(_)
        )
    }
}

impl From<roxmltree::Error> for Error {
    fn from(error: roxmltree::Error) -> Error {
        Error::malformed(error.to_string())
    }
}

// Anomalies recovered while reading; the run still succeeds
#[derive(Clone, Debug, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    #[error("<{element}> attribute {attribute}={value:?} is not a valid number")]
    InvalidNumber {
        element: String,
        attribute: String,
        value: String,
    },

    #[error("<{element}> has no {attribute} attribute")]
    MissingAttribute { element: String, attribute: String },

    #[error("way {way}: unreadable maxspeed {value:?}")]
    InvalidMaxSpeed { way: i64, value: String },

    #[error("additional <bounds> element ignored")]
    DuplicateBounds,
}

#[test]
fn test_categories() {
    assert!(Error::malformed("root").is_malformed_input());
    assert!(!Error::malformed("root").is_io());

    let write = Error::WriteOutput {
        path: PathBuf::from("out.xml"),
        source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
    };
    assert!(write.is_io());
    assert!(!write.is_malformed_input());

    let read = Error::ReadInput {
        path: PathBuf::from("in.osm"),
        source: io::Error::new(io::ErrorKind::NotFound, "missing"),
    };
    assert!(read.is_io());
    assert!(!read.is_malformed_input());
}

#[test]
fn test_from_roxmltree() {
    let error: Error = roxmltree::Document::parse("<osm>").unwrap_err().into();
    assert!(error.is_malformed_input());
}

#[test]
fn test_warning_display() {
    let warning = Warning::InvalidNumber {
        element: "node".to_string(),
        attribute: "lat".to_string(),
        value: "north".to_string(),
    };
    assert_eq!(
        "<node> attribute lat=\"north\" is not a valid number",
        warning.to_string()
    );
}
