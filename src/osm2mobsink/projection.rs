use super::error::Error;
use super::models::{Bounds, NetworkDimensions, Point};
use clap::ValueEnum;

// Width used when the caller gives no size and the policy has nothing to derive it from
pub const DEFAULT_WIDTH: u32 = 1000;
// Network-wide speed limit when the caller gives none
pub const DEFAULT_SPEED_LIMIT: u32 = 50;

const METERS_PER_DEGREE_LON: f64 = 111_320.;
const METERS_PER_DEGREE_LAT: f64 = 110_574.;

// SizePolicy decides how a missing network width or height is filled in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SizePolicy {
    // Keep the aspect ratio of the bounds, DEFAULT_WIDTH wide if nothing is given
    #[default]
    AspectRatio,
    // Use DEFAULT_WIDTH for every missing dimension
    FixedWidth,
    // Use the extent of the bounds in meters
    Meters,
}

impl SizePolicy {
    pub fn resolve(
        self,
        bounds: &Bounds,
        width: Option<u32>,
        height: Option<u32>,
        speed_limit: Option<u32>,
    ) -> Result<NetworkDimensions, Error> {
        let (width, height) = match (self, width, height) {
            (_, Some(width), Some(height)) => (width, height),
            (SizePolicy::AspectRatio, width, None) => {
                let width = width.unwrap_or(DEFAULT_WIDTH);
                let height = scale(width, bounds.lat_span(), bounds.lon_span(), bounds)?;
                (width, height)
            }
            (SizePolicy::AspectRatio, None, Some(height)) => {
                let width = scale(height, bounds.lon_span(), bounds.lat_span(), bounds)?;
                (width, height)
            }
            (SizePolicy::FixedWidth, width, height) => (
                width.unwrap_or(DEFAULT_WIDTH),
                height.unwrap_or(DEFAULT_WIDTH),
            ),
            (SizePolicy::Meters, width, height) => {
                let (width_m, height_m) = extent_in_meters(bounds);
                (
                    width.unwrap_or(width_m.round() as u32),
                    height.unwrap_or(height_m.round() as u32),
                )
            }
        };
        Ok(NetworkDimensions {
            width,
            height,
            speed_limit: speed_limit.unwrap_or(DEFAULT_SPEED_LIMIT),
        })
    }
}

// known * numerator / denominator, refusing a zero denominator
fn scale(known: u32, numerator: f64, denominator: f64, bounds: &Bounds) -> Result<u32, Error> {
    if denominator <= 0. {
        return Err(Error::DegenerateBounds {
            lat_span: bounds.lat_span(),
            lon_span: bounds.lon_span(),
        });
    }
    Ok((known as f64 * numerator / denominator).round() as u32)
}

// Flat-earth approximation of the size of the bounds, good enough for city extracts
pub fn extent_in_meters(bounds: &Bounds) -> (f64, f64) {
    let avg_lat = ((bounds.min_lat + bounds.max_lat) / 2.).to_radians();
    let width = avg_lat.cos() * bounds.lon_span() * METERS_PER_DEGREE_LON;
    let height = bounds.lat_span() * METERS_PER_DEGREE_LAT;
    (width, height)
}

// Projector maps (lat, lon) into network coordinates, y growing downwards
#[derive(Clone, Copy, Debug)]
pub struct Projector {
    bounds: Bounds,
    width: f64,
    height: f64,
}

impl Projector {
    pub fn new(bounds: Bounds, dimensions: &NetworkDimensions) -> Projector {
        Projector {
            bounds,
            width: dimensions.width as f64,
            height: dimensions.height as f64,
        }
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn project(&self, lat: f64, lon: f64) -> Point {
        let lat_span = self.bounds.lat_span();
        let lon_span = self.bounds.lon_span();
        let lat = lat_span - (lat - self.bounds.min_lat);
        let lon = lon - self.bounds.min_lon;

        // A zero span keeps the normalized delta as is
        let y = if lat_span > 0. {
            self.height * lat / lat_span
        } else {
            lat
        };
        let x = if lon_span > 0. {
            self.width * lon / lon_span
        } else {
            lon
        };
        Point {
            x: x.clamp(0., self.width),
            y: y.clamp(0., self.height),
        }
    }
}

#[cfg(test)]
fn square() -> Bounds {
    Bounds {
        min_lat: 0.,
        max_lat: 10.,
        min_lon: 0.,
        max_lon: 10.,
    }
}

#[test]
fn test_project_corners() {
    let dimensions = SizePolicy::AspectRatio
        .resolve(&square(), Some(200), Some(100), None)
        .unwrap();
    let projector = Projector::new(square(), &dimensions);

    assert_eq!(Point { x: 0., y: 100. }, projector.project(0., 0.));
    assert_eq!(Point { x: 200., y: 0. }, projector.project(10., 10.));
    assert_eq!(Point { x: 100., y: 50. }, projector.project(5., 5.));
}

#[test]
fn test_project_offset_bounds() {
    let bounds = Bounds {
        min_lat: 48.8,
        max_lat: 48.9,
        min_lon: 2.3,
        max_lon: 2.5,
    };
    let dimensions = SizePolicy::FixedWidth
        .resolve(&bounds, Some(1000), Some(500), None)
        .unwrap();
    let projector = Projector::new(bounds, &dimensions);
    let p = projector.project(48.85, 2.4);
    assert!((p.x - 500.).abs() < 1e-6);
    assert!((p.y - 250.).abs() < 1e-6);
}

#[test]
fn test_project_degenerate_axis() {
    let bounds = Bounds {
        min_lat: 5.,
        max_lat: 5.,
        min_lon: 0.,
        max_lon: 10.,
    };
    let dimensions = SizePolicy::FixedWidth
        .resolve(&bounds, None, None, None)
        .unwrap();
    let projector = Projector::new(bounds, &dimensions);
    assert_eq!(Point { x: 500., y: 0. }, projector.project(5., 5.));
}

#[test]
fn test_aspect_ratio() {
    let bounds = Bounds {
        min_lat: 0.,
        max_lat: 1.,
        min_lon: 0.,
        max_lon: 2.,
    };
    let policy = SizePolicy::AspectRatio;

    let d = policy.resolve(&bounds, None, None, None).unwrap();
    assert_eq!((DEFAULT_WIDTH, 500), (d.width, d.height));
    assert_eq!(DEFAULT_SPEED_LIMIT, d.speed_limit);

    let d = policy.resolve(&bounds, Some(300), None, Some(80)).unwrap();
    assert_eq!((300, 150), (d.width, d.height));
    assert_eq!(80, d.speed_limit);

    let d = policy.resolve(&bounds, None, Some(300), None).unwrap();
    assert_eq!((600, 300), (d.width, d.height));

    let d = policy.resolve(&bounds, Some(7), Some(9), None).unwrap();
    assert_eq!((7, 9), (d.width, d.height));
}

#[test]
fn test_aspect_ratio_degenerate() {
    let bounds = Bounds {
        min_lat: 0.,
        max_lat: 1.,
        min_lon: 3.,
        max_lon: 3.,
    };
    let r = SizePolicy::AspectRatio.resolve(&bounds, None, None, None);
    assert!(matches!(r, Err(Error::DegenerateBounds { .. })));

    // Nothing to derive, nothing to divide
    let d = SizePolicy::AspectRatio
        .resolve(&bounds, Some(10), Some(20), None)
        .unwrap();
    assert_eq!((10, 20), (d.width, d.height));
}

#[test]
fn test_fixed_width() {
    let d = SizePolicy::FixedWidth
        .resolve(&square(), None, Some(42), None)
        .unwrap();
    assert_eq!((DEFAULT_WIDTH, 42), (d.width, d.height));
}

#[test]
fn test_meters() {
    let bounds = Bounds {
        min_lat: 0.,
        max_lat: 0.01,
        min_lon: 0.,
        max_lon: 0.01,
    };
    let d = SizePolicy::Meters.resolve(&bounds, None, None, None).unwrap();
    assert_eq!((1113, 1106), (d.width, d.height));

    let d = SizePolicy::Meters
        .resolve(&bounds, Some(50), None, None)
        .unwrap();
    assert_eq!((50, 1106), (d.width, d.height));
}

#[test]
fn test_extent_in_meters_shrinks_with_latitude() {
    let equator = Bounds {
        min_lat: 0.,
        max_lat: 1.,
        min_lon: 0.,
        max_lon: 1.,
    };
    let north = Bounds {
        min_lat: 59.5,
        max_lat: 60.5,
        min_lon: 0.,
        max_lon: 1.,
    };
    let (w_equator, h_equator) = extent_in_meters(&equator);
    let (w_north, h_north) = extent_in_meters(&north);
    assert!((w_north - w_equator / 2.).abs() < 100.);
    assert_eq!(h_equator, h_north);
}
