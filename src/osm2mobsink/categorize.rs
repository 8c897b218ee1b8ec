use super::models::Flow;

const KMH_PER_MPH: f64 = 1.609344;

// WayProperties contains the road attributes shared by every segment of a way
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WayProperties {
    pub highway: Option<String>,
    pub flow: Flow,
    pub max_speed: Option<f64>,
    pub name: String,
}

// A tag value that was recognized by key but could not be understood
#[derive(Clone, Debug, PartialEq)]
pub struct UnreadableTag {
    pub key: String,
    pub value: String,
}

impl WayProperties {
    // Only ways tagged with highway=* end up in the network, whatever the value
    pub fn is_road(&self) -> bool {
        self.highway.is_some()
    }

    pub fn update_with_str(&mut self, key: &str, val: &str) -> Result<(), UnreadableTag> {
        match key {
            "highway" => self.highway = Some(val.to_string()),
            "name" => self.name = val.to_string(),
            "oneway" => {
                if let "yes" | "true" | "1" = val {
                    self.flow = Flow::AToB;
                }
            }
            // http://wiki.openstreetmap.org/wiki/Tag:junction%3Droundabout
            "junction" => {
                if val == "roundabout" {
                    self.flow = Flow::AToB;
                }
            }
            "maxspeed" => match parse_maxspeed(val) {
                Some(speed) => self.max_speed = Some(speed),
                None => {
                    return Err(UnreadableTag {
                        key: key.to_string(),
                        value: val.to_string(),
                    })
                }
            },
            _ => {}
        }
        Ok(())
    }

    // Speed limit to attach to the segments, if any was set
    pub fn speed_limit(&self) -> Option<f64> {
        self.max_speed.filter(|speed| *speed > 0.)
    }
}

// Reads a maxspeed value in km/h
// http://wiki.openstreetmap.org/wiki/Key:maxspeed
pub fn parse_maxspeed(val: &str) -> Option<f64> {
    let val = val.trim();
    if let Some(mph) = val.strip_suffix("mph") {
        return mph
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|speed| speed.is_finite())
            .map(|speed| speed * KMH_PER_MPH);
    }
    let kmh = val
        .strip_suffix("km/h")
        .or_else(|| val.strip_suffix("kmh"))
        .unwrap_or(val);
    kmh.trim().parse::<f64>().ok().filter(|speed| speed.is_finite())
}

#[test]
fn test_is_road() {
    let mut p = WayProperties::default();
    assert!(!p.is_road());

    p.update_with_str("building", "yes").unwrap();
    assert!(!p.is_road());

    p.update_with_str("highway", "construction").unwrap();
    assert!(p.is_road());
}

#[test]
fn test_update() {
    let mut p = WayProperties::default();
    p.update_with_str("name", "Rua Augusta").unwrap();
    assert_eq!("Rua Augusta", p.name);

    p.update_with_str("oneway", "no").unwrap();
    assert_eq!(Flow::Bidirectional, p.flow);

    p.update_with_str("oneway", "yes").unwrap();
    assert_eq!(Flow::AToB, p.flow);

    let mut p = WayProperties::default();
    p.update_with_str("oneway", "1").unwrap();
    assert_eq!(Flow::AToB, p.flow);

    let mut p = WayProperties::default();
    p.update_with_str("junction", "roundabout").unwrap();
    assert_eq!(Flow::AToB, p.flow);

    p.update_with_str("maxspeed", "60").unwrap();
    assert_eq!(Some(60.), p.speed_limit());
}

#[test]
fn test_unreadable_maxspeed() {
    let mut p = WayProperties::default();
    let err = p.update_with_str("maxspeed", "signals").unwrap_err();
    assert_eq!("signals", err.value);
    assert_eq!(None, p.speed_limit());
}

#[test]
fn test_zero_maxspeed() {
    let mut p = WayProperties::default();
    p.update_with_str("maxspeed", "0").unwrap();
    assert_eq!(None, p.speed_limit());
}

#[test]
fn test_parse_maxspeed() {
    assert_eq!(Some(50.), parse_maxspeed("50"));
    assert_eq!(Some(50.), parse_maxspeed(" 50 km/h"));
    assert_eq!(Some(70.), parse_maxspeed("70kmh"));
    assert_eq!(Some(12.5), parse_maxspeed("12.5"));
    let mph = parse_maxspeed("30 mph").unwrap();
    assert!((mph - 48.28).abs() < 0.01);
    assert_eq!(None, parse_maxspeed("none"));
    assert_eq!(None, parse_maxspeed("FR:urban"));
    assert_eq!(None, parse_maxspeed(""));
}
