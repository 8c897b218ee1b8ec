use super::categorize::WayProperties;
use super::diagnostics::Diagnostics;
use super::error::{Error, Warning};
use super::models::*;
use super::projection::{Projector, SizePolicy, DEFAULT_SPEED_LIMIT};
use osmpbfreader::objects::{NodeId, WayId};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, info};

// What to do when a way references a node that is not in the node table
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GapPolicy {
    // Connect the next known node to the last known one
    #[default]
    Bridge,
    // Start a new, disconnected chain of segments after the gap
    Split,
}

// Config holds the caller overrides for one conversion
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub speed_limit: Option<u32>,
    pub size_policy: SizePolicy,
    pub gap_policy: GapPolicy,
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn speed_limit(mut self, speed_limit: u32) -> Self {
        self.speed_limit = Some(speed_limit);
        self
    }

    pub fn size_policy(mut self, size_policy: SizePolicy) -> Self {
        self.size_policy = size_policy;
        self
    }

    pub fn split_at_gaps(mut self) -> Self {
        self.gap_policy = GapPolicy::Split;
        self
    }
}

// State of a single pass over one OSM document
struct Reader<'a> {
    config: &'a Config,
    projector: Option<Projector>,
    dimensions: Option<NetworkDimensions>,
    nodes: HashMap<NodeId, Point>,
    segments: Vec<PathSegment>,
    diagnostics: Diagnostics,
}

impl<'a> Reader<'a> {
    fn new(config: &'a Config) -> Reader<'a> {
        Reader {
            config,
            projector: None,
            dimensions: None,
            nodes: HashMap::new(),
            segments: Vec::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    fn read_bounds(&mut self, element: roxmltree::Node) -> Result<(), Error> {
        if self.projector.is_some() {
            self.diagnostics.warn(Warning::DuplicateBounds);
            return Ok(());
        }
        let mut coordinate = |attribute: &str| {
            number::<f64>(element, attribute, &mut self.diagnostics).unwrap_or_default()
        };
        let bounds = Bounds {
            min_lat: coordinate("minlat"),
            max_lat: coordinate("maxlat"),
            min_lon: coordinate("minlon"),
            max_lon: coordinate("maxlon"),
        };
        let dimensions = self.config.size_policy.resolve(
            &bounds,
            self.config.width,
            self.config.height,
            self.config.speed_limit,
        )?;
        info!(
            width = dimensions.width,
            height = dimensions.height,
            speed_limit = dimensions.speed_limit,
            policy = ?self.config.size_policy,
            "Network dimensions resolved"
        );
        self.projector = Some(Projector::new(bounds, &dimensions));
        self.dimensions = Some(dimensions);
        Ok(())
    }

    fn read_node(&mut self, element: roxmltree::Node) -> Result<(), Error> {
        let projector = self
            .projector
            .ok_or_else(|| Error::malformed("<node> found before <bounds>"))?;
        self.diagnostics.nodes_read += 1;

        let id = number::<i64>(element, "id", &mut self.diagnostics);
        let lat = number::<f64>(element, "lat", &mut self.diagnostics);
        let lon = number::<f64>(element, "lon", &mut self.diagnostics);
        let (Some(id), Some(lat), Some(lon)) = (id, lat, lon) else {
            return Ok(());
        };

        if !projector.bounds().contains(lat, lon) {
            self.diagnostics.nodes_outside_bounds += 1;
            return Ok(());
        }
        self.nodes.insert(NodeId(id), projector.project(lat, lon));
        Ok(())
    }

    fn read_way(&mut self, element: roxmltree::Node) {
        self.diagnostics.ways_read += 1;
        let way_id = WayId(
            element
                .attribute("id")
                .and_then(|id| id.parse().ok())
                .unwrap_or_default(),
        );

        let mut properties = WayProperties::default();
        let mut chains: Vec<Vec<(NodeId, Point)>> = vec![Vec::new()];
        for child in element.children().filter(|n| n.is_element()) {
            match child.tag_name().name() {
                "nd" => {
                    let node = number::<i64>(child, "ref", &mut self.diagnostics)
                        .map(NodeId)
                        .and_then(|id| self.nodes.get(&id).map(|point| (id, *point)));
                    match node {
                        Some(node) => {
                            if let Some(chain) = chains.last_mut() {
                                chain.push(node);
                            }
                        }
                        None => self.skip_reference(way_id, child, &mut chains),
                    }
                }
                "tag" => {
                    let Some(key) = child.attribute("k") else {
                        continue;
                    };
                    let val = child.attribute("v").unwrap_or_default();
                    if let Err(tag) = properties.update_with_str(key, val) {
                        self.diagnostics.warn(Warning::InvalidMaxSpeed {
                            way: way_id.0,
                            value: tag.value,
                        });
                    }
                }
                _ => {}
            }
        }

        if !properties.is_road() {
            self.diagnostics.ways_without_highway += 1;
            return;
        }

        let speed_limit = properties.speed_limit();
        for chain in chains {
            for pair in chain.windows(2) {
                let (source, a) = pair[0];
                let (target, b) = pair[1];
                let mut segment = PathSegment::new(a, b);
                segment.name = properties.name.clone();
                segment.flow = properties.flow;
                segment.way = way_id;
                segment.source = source;
                segment.target = target;
                if let Some(speed_limit) = speed_limit {
                    segment
                        .controls
                        .insert(STATIC_CONTROL_SLOT, TrafficControl { speed_limit });
                }
                self.segments.push(segment);
            }
        }
    }

    fn skip_reference(
        &mut self,
        way: WayId,
        nd: roxmltree::Node,
        chains: &mut Vec<Vec<(NodeId, Point)>>,
    ) {
        self.diagnostics.missing_references += 1;
        debug!(
            way = way.0,
            node = nd.attribute("ref"),
            "Skipping reference to unknown node"
        );
        if self.config.gap_policy == GapPolicy::Split
            && chains.last().is_some_and(|chain| !chain.is_empty())
        {
            chains.push(Vec::new());
        }
    }

    fn finish(mut self) -> Result<(Network, Diagnostics), Error> {
        // Without bounds and nodes, explicit sizes are enough for an empty network
        let dimensions = match (self.dimensions, self.config.width, self.config.height) {
            (Some(dimensions), _, _) => dimensions,
            (None, Some(width), Some(height)) => NetworkDimensions {
                width,
                height,
                speed_limit: self.config.speed_limit.unwrap_or(DEFAULT_SPEED_LIMIT),
            },
            _ => return Err(Error::malformed("missing <bounds> element")),
        };
        self.diagnostics.segments = self.segments.len();
        info!(
            nodes = self.nodes.len(),
            ways = self.diagnostics.ways_read,
            segments = self.segments.len(),
            missing_references = self.diagnostics.missing_references,
            "OSM document read"
        );
        let network = Network {
            dimensions,
            segments: self.segments,
        };
        Ok((network, self.diagnostics))
    }
}

// Reads a numeric attribute, recording a warning when it is absent or unreadable
fn number<T: FromStr>(
    element: roxmltree::Node,
    attribute: &str,
    diagnostics: &mut Diagnostics,
) -> Option<T> {
    let element_name = element.tag_name().name();
    match element.attribute(attribute) {
        Some(value) => match value.trim().parse::<T>() {
            Ok(number) => Some(number),
            Err(_) => {
                diagnostics.warn(Warning::InvalidNumber {
                    element: element_name.to_string(),
                    attribute: attribute.to_string(),
                    value: value.to_string(),
                });
                None
            }
        },
        None => {
            diagnostics.warn(Warning::MissingAttribute {
                element: element_name.to_string(),
                attribute: attribute.to_string(),
            });
            None
        }
    }
}

// Walks an already parsed OSM document and builds the network
pub fn read_document(
    document: &roxmltree::Document,
    config: &Config,
) -> Result<(Network, Diagnostics), Error> {
    let root = document.root_element();
    if root.tag_name().name() != "osm" {
        return Err(Error::malformed(format!(
            "root element is <{}>, expected <osm>",
            root.tag_name().name()
        )));
    }

    let mut reader = Reader::new(config);
    for child in root.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "bounds" => reader.read_bounds(child)?,
            "node" => reader.read_node(child)?,
            "way" => reader.read_way(child),
            other => debug!(element = other, "Ignoring element"),
        }
    }
    reader.finish()
}

// Parses OSM XML and builds the network
pub fn read_str(xml: &str, config: &Config) -> Result<(Network, Diagnostics), Error> {
    let document = roxmltree::Document::parse(xml)?;
    read_document(&document, config)
}

#[cfg(test)]
const SQUARE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <bounds minlat="0" maxlat="10" minlon="0" maxlon="10"/>
  <node id="1" lat="0" lon="0"/>
  <node id="2" lat="10" lon="10"/>
  <node id="3" lat="5" lon="5"/>
  <node id="4" lat="11" lon="5"/>
  WAYS
</osm>"#;

#[cfg(test)]
fn read_ways(ways: &str, config: &Config) -> (Network, Diagnostics) {
    read_str(&SQUARE.replace("WAYS", ways), config).unwrap()
}

#[test]
fn test_single_segment() {
    let (network, diagnostics) = read_ways(
        r#"<way id="10"><nd ref="1"/><nd ref="2"/><tag k="highway" v="residential"/></way>"#,
        &Config::new().width(100).height(50),
    );
    assert_eq!(1, network.segments.len());
    let segment = &network.segments[0];
    assert_eq!(Point { x: 0., y: 50. }, segment.a);
    assert_eq!(Point { x: 100., y: 0. }, segment.b);
    assert_eq!(Flow::Bidirectional, segment.flow);
    assert_eq!(None, segment.speed_limit());
    assert_eq!(WayId(10), segment.way);
    assert_eq!((NodeId(1), NodeId(2)), (segment.source, segment.target));

    assert_eq!(4, diagnostics.nodes_read);
    assert_eq!(1, diagnostics.nodes_outside_bounds);
    assert_eq!(1, diagnostics.segments);
    assert!(diagnostics.warnings.is_empty());
}

#[test]
fn test_way_attributes() {
    let (network, _) = read_ways(
        r#"<way id="10">
             <tag k="oneway" v="yes"/>
             <nd ref="1"/><nd ref="3"/>
             <tag k="maxspeed" v="60"/>
             <nd ref="2"/>
             <tag k="name" v="Main Street"/>
             <tag k="highway" v="primary"/>
           </way>"#,
        &Config::new(),
    );
    assert_eq!(2, network.segments.len());
    for segment in &network.segments {
        assert_eq!(Flow::AToB, segment.flow);
        assert_eq!(Some(60.), segment.speed_limit());
        assert_eq!("Main Street", segment.name);
    }
}

#[test]
fn test_way_without_highway() {
    let (network, diagnostics) = read_ways(
        r#"<way id="10"><nd ref="1"/><nd ref="2"/><nd ref="3"/><tag k="building" v="yes"/></way>"#,
        &Config::new(),
    );
    assert!(network.segments.is_empty());
    assert_eq!(1, diagnostics.ways_without_highway);
}

#[test]
fn test_bridge_gaps() {
    let (network, diagnostics) = read_ways(
        r#"<way id="10"><nd ref="1"/><nd ref="4"/><nd ref="99"/><nd ref="2"/><tag k="highway" v="service"/></way>"#,
        &Config::new(),
    );
    assert_eq!(1, network.segments.len());
    assert_eq!(
        (NodeId(1), NodeId(2)),
        (network.segments[0].source, network.segments[0].target)
    );
    assert_eq!(2, diagnostics.missing_references);
}

#[test]
fn test_split_gaps() {
    let ways = r#"<way id="10"><nd ref="1"/><nd ref="3"/><nd ref="99"/><nd ref="2"/><nd ref="3"/><tag k="highway" v="service"/></way>"#;
    let (network, _) = read_ways(ways, &Config::new().split_at_gaps());
    let edges: Vec<_> = network
        .segments
        .iter()
        .map(|s| (s.source.0, s.target.0))
        .collect();
    assert_eq!(vec![(1, 3), (2, 3)], edges);

    let (network, _) = read_ways(ways, &Config::new());
    assert_eq!(3, network.segments.len());
}

#[test]
fn test_only_unknown_nodes() {
    let (network, diagnostics) = read_ways(
        r#"<way id="10"><nd ref="4"/><nd ref="98"/><tag k="highway" v="service"/></way>"#,
        &Config::new(),
    );
    assert!(network.segments.is_empty());
    assert_eq!(2, diagnostics.missing_references);
}

#[test]
fn test_segment_order() {
    let (network, _) = read_ways(
        r#"<way id="10"><nd ref="3"/><nd ref="1"/><tag k="highway" v="service"/></way>
           <way id="11"><nd ref="2"/><nd ref="3"/><nd ref="1"/><tag k="highway" v="service"/></way>"#,
        &Config::new(),
    );
    let edges: Vec<_> = network
        .segments
        .iter()
        .map(|s| (s.way.0, s.source.0, s.target.0))
        .collect();
    assert_eq!(vec![(10, 3, 1), (11, 2, 3), (11, 3, 1)], edges);
}

#[test]
fn test_invalid_numbers() {
    let xml = r#"<osm>
      <bounds minlat="0" maxlat="10" minlon="0" maxlon="10"/>
      <node id="1" lat="north" lon="0"/>
      <node id="2" lat="10" lon="10"/>
      <node lat="5" lon="5"/>
      <way id="3"><nd ref="1"/><nd ref="x"/><nd ref="2"/><tag k="highway" v="road"/><tag k="maxspeed" v="walk"/></way>
    </osm>"#;
    let (network, diagnostics) = read_str(xml, &Config::new()).unwrap();
    assert!(network.segments.is_empty());
    assert_eq!(3, diagnostics.nodes_read);
    assert_eq!(
        vec![
            Warning::InvalidNumber {
                element: "node".to_string(),
                attribute: "lat".to_string(),
                value: "north".to_string(),
            },
            Warning::MissingAttribute {
                element: "node".to_string(),
                attribute: "id".to_string(),
            },
            Warning::InvalidNumber {
                element: "nd".to_string(),
                attribute: "ref".to_string(),
                value: "x".to_string(),
            },
            Warning::InvalidMaxSpeed {
                way: 3,
                value: "walk".to_string(),
            },
        ],
        diagnostics.warnings
    );
}

#[test]
fn test_unknown_elements_ignored() {
    let xml = r#"<osm>
      <note>exported</note>
      <bounds minlat="0" maxlat="10" minlon="0" maxlon="10"/>
      <node id="1" lat="0" lon="0"><tag k="highway" v="traffic_signals"/></node>
      <node id="2" lat="10" lon="10"/>
      <way id="3"><nd ref="1"/><nd ref="2"/><tag k="highway" v="road"/><foo/></way>
      <relation id="4"><member type="way" ref="3" role=""/></relation>
    </osm>"#;
    let (network, diagnostics) = read_str(xml, &Config::new()).unwrap();
    assert_eq!(1, network.segments.len());
    assert!(diagnostics.warnings.is_empty());
}

#[test]
fn test_wrong_root() {
    let r = read_str("<foo/>", &Config::new());
    assert!(r.unwrap_err().is_malformed_input());
}

#[test]
fn test_not_xml() {
    let r = read_str("<osm><bounds", &Config::new());
    assert!(r.unwrap_err().is_malformed_input());
}

#[test]
fn test_missing_bounds() {
    let r = read_str(r#"<osm><node id="1" lat="0" lon="0"/></osm>"#, &Config::new());
    assert!(r.unwrap_err().is_malformed_input());

    let r = read_str("<osm/>", &Config::new());
    assert!(r.unwrap_err().is_malformed_input());
}

#[test]
fn test_no_bounds_with_explicit_size() {
    let (network, diagnostics) =
        read_str("<osm/>", &Config::new().width(300).height(200)).unwrap();
    assert_eq!(300, network.dimensions.width);
    assert_eq!(200, network.dimensions.height);
    assert_eq!(DEFAULT_SPEED_LIMIT, network.dimensions.speed_limit);
    assert!(network.segments.is_empty());
    assert_eq!(0, diagnostics.segments);

    let r = read_str("<osm/>", &Config::new().width(300));
    assert!(r.unwrap_err().is_malformed_input());

    // Nodes still need bounds to be projected
    let r = read_str(
        r#"<osm><node id="1" lat="0" lon="0"/></osm>"#,
        &Config::new().width(300).height(200),
    );
    assert!(r.unwrap_err().is_malformed_input());
}

#[test]
fn test_highway_without_value() {
    let (network, diagnostics) = read_ways(
        r#"<way id="10"><nd ref="1"/><nd ref="2"/><tag k="highway"/></way>"#,
        &Config::new(),
    );
    assert_eq!(1, network.segments.len());
    assert_eq!(0, diagnostics.ways_without_highway);
    assert!(diagnostics.warnings.is_empty());
}

#[test]
fn test_duplicate_bounds() {
    let xml = r#"<osm>
      <bounds minlat="0" maxlat="10" minlon="0" maxlon="10"/>
      <bounds minlat="0" maxlat="1" minlon="0" maxlon="1"/>
      <node id="1" lat="5" lon="5"/>
    </osm>"#;
    let (network, diagnostics) = read_str(xml, &Config::new()).unwrap();
    assert_eq!(1000, network.dimensions.width);
    assert_eq!(1000, network.dimensions.height);
    assert_eq!(vec![Warning::DuplicateBounds], diagnostics.warnings);
    assert_eq!(0, diagnostics.nodes_outside_bounds);
}

#[test]
fn test_degenerate_bounds() {
    let xml = r#"<osm><bounds minlat="1" maxlat="2" minlon="3" maxlon="3"/></osm>"#;
    let r = read_str(xml, &Config::new());
    assert!(matches!(r, Err(Error::DegenerateBounds { .. })));

    let (network, _) = read_str(xml, &Config::new().width(10).height(10)).unwrap();
    assert_eq!(10, network.dimensions.width);
}

#[test]
fn test_points_within_network() {
    let (network, _) = read_ways(
        r#"<way id="10"><nd ref="1"/><nd ref="3"/><nd ref="2"/><tag k="highway" v="service"/></way>"#,
        &Config::new().size_policy(SizePolicy::Meters),
    );
    let d = network.dimensions;
    for s in &network.segments {
        for p in [s.a, s.b] {
            assert!((0. ..=d.width as f64).contains(&p.x));
            assert!((0. ..=d.height as f64).contains(&p.y));
        }
    }
}
