use osm2mobsink::{convert, convert_file, Config, SizePolicy};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

const TEST_DATA: &str = "src/osm2mobsink/test_data";

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(TEST_DATA).join(name)
}

static OUTPUTS: AtomicUsize = AtomicUsize::new(0);

// Tests run in parallel, every output gets its own file
fn output_path(name: &str) -> PathBuf {
    let n = OUTPUTS.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!("osm2mobsink-{}-{}-{}", std::process::id(), n, name))
}

fn convert_fixture(name: &str, config: &Config) -> String {
    let output = output_path(&format!("{name}.xml"));
    convert_file(fixture(name), &output, config).unwrap();
    let text = std::fs::read_to_string(&output).unwrap();
    std::fs::remove_file(&output).unwrap();
    text
}

fn coordinates(path: roxmltree::Node) -> [f64; 4] {
    ["xa", "ya", "xb", "yb"].map(|a| path.attribute(a).unwrap().parse().unwrap())
}

#[test]
fn minimal_way() {
    let text = convert_fixture("minimal.osm", &Config::new().width(100).height(100));
    let document = roxmltree::Document::parse(&text).unwrap();
    let root = document.root_element();
    assert_eq!("network", root.tag_name().name());
    assert_eq!(Some("100"), root.attribute("width"));
    assert_eq!(Some("100"), root.attribute("height"));
    assert_eq!(Some("50"), root.attribute("speedlimit"));

    let paths: Vec<_> = root.children().filter(|n| n.has_tag_name("path")).collect();
    assert_eq!(1, paths.len());
    assert_eq!([0., 100., 100., 0.], coordinates(paths[0]));
    assert_eq!(None, paths[0].attribute("flow"));
    assert_eq!(Some(""), paths[0].attribute("name"));
    assert_eq!(0, paths[0].children().filter(|n| n.is_element()).count());
}

#[test]
fn oneway_with_maxspeed() {
    let text = convert_fixture("oneway_maxspeed.osm", &Config::new().speed_limit(30));
    let document = roxmltree::Document::parse(&text).unwrap();
    let root = document.root_element();
    assert_eq!(Some("30"), root.attribute("speedlimit"));

    let path = root.children().find(|n| n.has_tag_name("path")).unwrap();
    assert_eq!(Some("ab"), path.attribute("flow"));
    let traffic = path.children().find(|n| n.has_tag_name("traffic")).unwrap();
    assert_eq!(Some("1"), traffic.attribute("time"));
    assert_eq!(Some("60"), traffic.attribute("speedlimit"));
    assert_eq!(Some("1"), traffic.attribute("traffic"));
}

#[test]
fn missing_node_still_succeeds() {
    let output = output_path("missing_node.xml");
    let diagnostics = convert_file(fixture("missing_node.osm"), &output, &Config::new()).unwrap();
    assert_eq!(0, diagnostics.segments);
    assert_eq!(1, diagnostics.missing_references);

    let text = std::fs::read_to_string(&output).unwrap();
    std::fs::remove_file(&output).unwrap();
    let document = roxmltree::Document::parse(&text).unwrap();
    assert_eq!(
        0,
        document.root_element().children().filter(|n| n.is_element()).count()
    );
}

#[test]
fn wrong_root_writes_nothing() {
    let output = output_path("wrong_root.xml");
    let r = convert_file(fixture("wrong_root.osm"), &output, &Config::new());
    assert!(r.unwrap_err().is_malformed_input());
    assert!(!output.exists());
}

#[test]
fn unwritable_output() {
    let output = PathBuf::from(TEST_DATA).join("no such directory").join("out.xml");
    let r = convert_file(fixture("minimal.osm"), &output, &Config::new());
    let err = r.unwrap_err();
    assert!(err.is_io());
    assert!(!output.exists());
}

#[test]
fn city_extract() {
    let output = output_path("city.xml");
    let diagnostics = convert_file(fixture("city.osm"), &output, &Config::new()).unwrap();
    std::fs::remove_file(&output).unwrap();

    assert_eq!(9, diagnostics.nodes_read);
    assert_eq!(1, diagnostics.nodes_outside_bounds);
    assert_eq!(4, diagnostics.ways_read);
    assert_eq!(1, diagnostics.ways_without_highway);
    assert_eq!(1, diagnostics.missing_references);
    assert_eq!(5, diagnostics.segments);
    assert!(diagnostics.warnings.is_empty());
}

#[test]
fn city_extract_attributes() {
    let text = convert_fixture("city.osm", &Config::new());
    let document = roxmltree::Document::parse(&text).unwrap();
    let root = document.root_element();
    // 0.02 degrees of longitude for 0.01 of latitude
    assert_eq!(Some("1000"), root.attribute("width"));
    assert_eq!(Some("500"), root.attribute("height"));

    let paths: Vec<_> = root.children().filter(|n| n.has_tag_name("path")).collect();
    let names: Vec<_> = paths.iter().map(|p| p.attribute("name").unwrap()).collect();
    assert_eq!(
        vec![
            "Avenida Paulista",
            "Avenida Paulista",
            "Avenida Paulista",
            "Rua Augusta",
            ""
        ],
        names
    );
    assert_eq!(Some("ab"), paths[3].attribute("flow"));
    assert!(paths[..3].iter().all(|p| p.attribute("flow").is_none()));

    // The node outside the bounds is bridged over
    let [_, _, xb, yb] = coordinates(paths[2]);
    let [xa, ya, _, _] = coordinates(paths[3]);
    assert_eq!((xb, yb), (xa, ya));

    for path in &paths {
        for (i, value) in coordinates(*path).into_iter().enumerate() {
            let max = if i % 2 == 0 { 1000. } else { 500. };
            assert!((0. ..=max).contains(&value));
        }
    }

    let speed = paths[4]
        .children()
        .find(|n| n.has_tag_name("traffic"))
        .and_then(|t| t.attribute("speedlimit"))
        .unwrap();
    assert!((speed.parse::<f64>().unwrap() - 32.19).abs() < 0.01);
}

#[test]
fn city_extract_split_at_gaps() {
    let mut output = Vec::new();
    let input = std::fs::File::open(fixture("city.osm")).unwrap();
    let diagnostics = convert(input, &mut output, &Config::new().split_at_gaps()).unwrap();
    assert_eq!(4, diagnostics.segments);
}

#[test]
fn city_extract_meters() {
    let text = convert_fixture(
        "city.osm",
        &Config::new().size_policy(SizePolicy::Meters),
    );
    let document = roxmltree::Document::parse(&text).unwrap();
    let root = document.root_element();
    let width: u32 = root.attribute("width").unwrap().parse().unwrap();
    let height: u32 = root.attribute("height").unwrap().parse().unwrap();
    assert!((2035..=2045).contains(&width));
    assert_eq!(1106, height);
}

#[test]
fn deterministic_output() {
    let config = Config::new();
    let first = convert_fixture("city.osm", &config);
    let second = convert_fixture("city.osm", &config);
    assert_eq!(first, second);
}
