use osmpbfreader::objects::{NodeId, WayId};
use std::collections::BTreeMap;

// Point is a network-local coordinate, x to the right and y downwards
pub type Point = geo_types::Coord<f64>;

// The only slot populated today: a static speed limit, not a real schedule
pub const STATIC_CONTROL_SLOT: u32 = 1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Flow {
    #[default]
    Bidirectional,
    AToB,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrafficControl {
    pub speed_limit: f64,
}

// PathSegment is one directed edge between two consecutive resolved points of a way
#[derive(Clone, Debug, PartialEq)]
pub struct PathSegment {
    pub a: Point,
    pub b: Point,
    pub name: String,
    pub flow: Flow,
    pub controls: BTreeMap<u32, TrafficControl>,
    pub way: WayId,
    pub source: NodeId,
    pub target: NodeId,
}

impl PathSegment {
    pub fn new(a: Point, b: Point) -> PathSegment {
        PathSegment {
            a,
            b,
            name: String::new(),
            flow: Flow::default(),
            controls: BTreeMap::new(),
            way: WayId(0),
            source: NodeId(0),
            target: NodeId(0),
        }
    }

    pub fn speed_limit(&self) -> Option<f64> {
        self.controls
            .get(&STATIC_CONTROL_SLOT)
            .map(|control| control.speed_limit)
    }
}

// Bounds is the geographic box declared by the <bounds> element, in decimal degrees
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bounds {
    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkDimensions {
    pub width: u32,
    pub height: u32,
    pub speed_limit: u32,
}

// Network is everything the MobSink writer needs
#[derive(Clone, Debug, PartialEq)]
pub struct Network {
    pub dimensions: NetworkDimensions,
    pub segments: Vec<PathSegment>,
}

#[test]
fn test_contains() {
    let bounds = Bounds {
        min_lat: 0.,
        max_lat: 10.,
        min_lon: -5.,
        max_lon: 5.,
    };
    assert!(bounds.contains(0., -5.));
    assert!(bounds.contains(10., 5.));
    assert!(bounds.contains(3., 0.));
    assert!(!bounds.contains(10.1, 0.));
    assert!(!bounds.contains(3., -5.1));
}

#[test]
fn test_spans() {
    let bounds = Bounds {
        min_lat: 48.,
        max_lat: 48.5,
        min_lon: 2.,
        max_lon: 3.,
    };
    assert_eq!(0.5, bounds.lat_span());
    assert_eq!(1., bounds.lon_span());
}

#[test]
fn test_speed_limit() {
    let mut segment = PathSegment::new(Point { x: 0., y: 0. }, Point { x: 1., y: 1. });
    assert_eq!(None, segment.speed_limit());
    assert_eq!(Flow::Bidirectional, segment.flow);

    segment
        .controls
        .insert(STATIC_CONTROL_SLOT, TrafficControl { speed_limit: 30. });
    assert_eq!(Some(30.), segment.speed_limit());
}
