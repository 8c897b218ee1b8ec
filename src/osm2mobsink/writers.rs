use super::error::Error;
use super::models::*;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::io::Write;

// Coordinates are written like printf's %f
fn coordinate(value: f64) -> String {
    format!("{:.6}", value)
}

fn path_element(segment: &PathSegment) -> BytesStart<'static> {
    let mut path = BytesStart::new("path");
    path.push_attribute(("xa", coordinate(segment.a.x).as_str()));
    path.push_attribute(("ya", coordinate(segment.a.y).as_str()));
    path.push_attribute(("xb", coordinate(segment.b.x).as_str()));
    path.push_attribute(("yb", coordinate(segment.b.y).as_str()));
    path.push_attribute(("name", segment.name.as_str()));
    if segment.flow == Flow::AToB {
        path.push_attribute(("flow", "ab"));
    }
    path
}

// Writes the network in the MobSink XML format, segments in their original order
pub fn mobsink<W: Write>(network: &Network, output: W) -> Result<(), Error> {
    let mut writer = Writer::new_with_indent(output, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let dimensions = &network.dimensions;
    let mut root = BytesStart::new("network");
    root.push_attribute(("width", dimensions.width.to_string().as_str()));
    root.push_attribute(("height", dimensions.height.to_string().as_str()));
    root.push_attribute(("speedlimit", dimensions.speed_limit.to_string().as_str()));
    writer.write_event(Event::Start(root))?;

    for segment in &network.segments {
        let path = path_element(segment);
        match segment.speed_limit() {
            Some(speed_limit) => {
                writer.write_event(Event::Start(path))?;
                let mut traffic = BytesStart::new("traffic");
                traffic.push_attribute(("time", STATIC_CONTROL_SLOT.to_string().as_str()));
                traffic.push_attribute(("speedlimit", speed_limit.to_string().as_str()));
                traffic.push_attribute(("traffic", "1"));
                writer.write_event(Event::Empty(traffic))?;
                writer.write_event(Event::End(BytesEnd::new("path")))?;
            }
            None => writer.write_event(Event::Empty(path))?,
        }
    }

    writer.write_event(Event::End(BytesEnd::new("network")))?;
    writer.into_inner().flush()?;
    Ok(())
}

pub fn mobsink_to_vec(network: &Network) -> Result<Vec<u8>, Error> {
    let mut buffer = Vec::new();
    mobsink(network, &mut buffer)?;
    buffer.push(b'\n');
    Ok(buffer)
}

#[cfg(test)]
fn network(segments: Vec<PathSegment>) -> Network {
    Network {
        dimensions: NetworkDimensions {
            width: 100,
            height: 80,
            speed_limit: 50,
        },
        segments,
    }
}

#[test]
fn test_full_document() {
    let mut segment = PathSegment::new(Point { x: 0., y: 80. }, Point { x: 100., y: 0. });
    segment.flow = Flow::AToB;
    segment
        .controls
        .insert(STATIC_CONTROL_SLOT, TrafficControl { speed_limit: 60. });
    let mut plain = PathSegment::new(Point { x: 1.5, y: 2.25 }, Point { x: 3., y: 4. });
    plain.name = "Rua & Filhos".to_string();

    let output = mobsink_to_vec(&network(vec![segment, plain])).unwrap();
    pretty_assertions::assert_eq!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<network width="100" height="80" speedlimit="50">
  <path xa="0.000000" ya="80.000000" xb="100.000000" yb="0.000000" name="" flow="ab">
    <traffic time="1" speedlimit="60" traffic="1"/>
  </path>
  <path xa="1.500000" ya="2.250000" xb="3.000000" yb="4.000000" name="Rua &amp; Filhos"/>
</network>
"#,
        String::from_utf8(output).unwrap()
    );
}

#[test]
fn test_empty_network() {
    let output = mobsink_to_vec(&network(vec![])).unwrap();
    let text = String::from_utf8(output).unwrap();
    let document = roxmltree::Document::parse(&text).unwrap();
    let root = document.root_element();
    assert_eq!("network", root.tag_name().name());
    assert_eq!(Some("100"), root.attribute("width"));
    assert_eq!(Some("80"), root.attribute("height"));
    assert_eq!(0, root.children().filter(|n| n.is_element()).count());
}

#[test]
fn test_fractional_speed_limit() {
    let mut segment = PathSegment::new(Point { x: 0., y: 0. }, Point { x: 1., y: 1. });
    segment
        .controls
        .insert(STATIC_CONTROL_SLOT, TrafficControl { speed_limit: 48.5 });
    let output = mobsink_to_vec(&network(vec![segment])).unwrap();
    let text = String::from_utf8(output).unwrap();
    let document = roxmltree::Document::parse(&text).unwrap();
    let traffic = document
        .descendants()
        .find(|n| n.has_tag_name("traffic"))
        .unwrap();
    assert_eq!(Some("48.5"), traffic.attribute("speedlimit"));
    assert_eq!(Some("1"), traffic.attribute("time"));
}
