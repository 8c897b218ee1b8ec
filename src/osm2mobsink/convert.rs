use super::diagnostics::Diagnostics;
use super::error::Error;
use super::reader::{self, Config};
use super::writers;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use tracing::warn;

// Converts OSM XML read from `input` into a MobSink network written to `output`.
// Nothing is written to `output` unless the whole document converted.
pub fn convert<R: Read, W: Write>(
    mut input: R,
    mut output: W,
    config: &Config,
) -> Result<Diagnostics, Error> {
    let mut raw = Vec::new();
    input.read_to_end(&mut raw)?;
    let xml = std::str::from_utf8(&raw)
        .map_err(|e| Error::malformed(format!("input is not UTF-8: {e}")))?;

    let (network, diagnostics) = reader::read_str(xml, config)?;
    let bytes = writers::mobsink_to_vec(&network)?;
    output.write_all(&bytes)?;
    output.flush()?;
    Ok(diagnostics)
}

// Only a file this run created or truncated is removed when writing it fails
fn write_output(output: &Path, bytes: &[u8]) -> Result<(), Error> {
    let write_error = |source| Error::WriteOutput {
        path: output.to_path_buf(),
        source,
    };
    let mut file = fs::File::create(output).map_err(write_error)?;
    if let Err(source) = file.write_all(bytes).and_then(|()| file.flush()) {
        drop(file);
        if let Err(e) = fs::remove_file(output) {
            warn!(path = %output.display(), "Failed to remove partial output: {}", e);
        }
        return Err(write_error(source));
    }
    Ok(())
}

// File based conversion; a partially written output file is removed
pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    config: &Config,
) -> Result<Diagnostics, Error> {
    let input = input.as_ref();
    let output = output.as_ref();
    let file = fs::File::open(input).map_err(|source| Error::ReadInput {
        path: input.to_path_buf(),
        source,
    })?;

    let mut buffer = Vec::new();
    let diagnostics = convert(file, &mut buffer, config)?;

    write_output(output, &buffer)?;
    Ok(diagnostics)
}

#[test]
fn test_convert_stream() {
    let xml = r#"<osm>
      <bounds minlat="0" maxlat="10" minlon="0" maxlon="10"/>
      <node id="1" lat="0" lon="0"/>
      <node id="2" lat="10" lon="10"/>
      <way id="1"><nd ref="1"/><nd ref="2"/><tag k="highway" v="residential"/></way>
    </osm>"#;
    let mut output = Vec::new();
    let diagnostics = convert(xml.as_bytes(), &mut output, &Config::new()).unwrap();
    assert_eq!(1, diagnostics.segments);
    assert!(String::from_utf8(output).unwrap().contains("<path "));
}

#[test]
fn test_nothing_written_on_failure() {
    let mut output = Vec::new();
    let r = convert("<foo/>".as_bytes(), &mut output, &Config::new());
    assert!(r.unwrap_err().is_malformed_input());
    assert!(output.is_empty());
}

#[test]
fn test_not_utf8() {
    let mut output = Vec::new();
    let r = convert(&[0x3c, 0xff, 0xfe][..], &mut output, &Config::new());
    assert!(r.unwrap_err().is_malformed_input());
}

#[test]
fn test_wrong_file() {
    let r = convert_file(
        "i hope you have no file name like this one",
        "out.xml",
        &Config::new(),
    );
    assert!(matches!(r, Err(Error::ReadInput { .. })));
}

#[test]
fn test_output_not_opened_is_kept() {
    let output = std::env::temp_dir().join(format!("osm2mobsink-dir-{}", std::process::id()));
    fs::create_dir_all(&output).unwrap();
    let r = write_output(&output, b"<network/>");
    assert!(matches!(r, Err(Error::WriteOutput { .. })));
    assert!(output.is_dir());
    fs::remove_dir(&output).unwrap();
}

#[test]
fn test_output_overwritten() {
    let output = std::env::temp_dir().join(format!("osm2mobsink-file-{}", std::process::id()));
    fs::write(&output, "previous content that is longer").unwrap();
    write_output(&output, b"<network/>").unwrap();
    assert_eq!("<network/>", fs::read_to_string(&output).unwrap());
    fs::remove_file(&output).unwrap();
}
