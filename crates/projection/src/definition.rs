//! Conversion of GeoKeys into a concrete projection definition.
//!
//! The result is a PROJ string understood by `proj4rs` plus the factors that
//! convert native raster coordinates into the units the PROJ string expects
//! (metres for projected systems, degrees for geographic ones).

use std::f64::consts::PI;

use crate::error::{ProjectionError, ProjectionResult};
use crate::geokeys::{keys, GeoKeyDirectory};

/// PROJ definition of the WGS84 geographic system everything is projected into.
pub const WGS84: &str = "+proj=longlat +datum=WGS84 +no_defs";

const USER_DEFINED: u16 = 32767;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const MODEL_TYPE_GEOCENTRIC: u16 = 3;

// Coordinate transformation codes (ProjCoordTransGeoKey)
const CT_TRANSVERSE_MERCATOR: u16 = 1;
const CT_MERCATOR: u16 = 7;
const CT_LAMBERT_CONF_CONIC_2SP: u16 = 8;
const CT_LAMBERT_CONF_CONIC_1SP: u16 = 9;
const CT_LAMBERT_AZIM_EQUAL_AREA: u16 = 10;
const CT_ALBERS_EQUAL_AREA: u16 = 11;
const CT_POLAR_STEREOGRAPHIC: u16 = 15;
const CT_EQUIRECTANGULAR: u16 = 17;

/// Whether native coordinates are angles or planar distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrsKind {
    Geographic,
    Projected,
}

/// A resolved coordinate reference system.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionDefinition {
    /// PROJ string for the native system.
    pub proj4: String,
    pub kind: CrsKind,
    /// Multiply native X by this to get PROJ input units (metres or degrees).
    pub x_scale: f64,
    /// Multiply native Y by this to get PROJ input units (metres or degrees).
    pub y_scale: f64,
    /// EPSG code when the system was identified by one.
    pub epsg: Option<u16>,
}

impl ProjectionDefinition {
    /// Resolve the projection described by a GeoKey directory.
    pub fn from_geokeys(geokeys: &GeoKeyDirectory) -> ProjectionResult<Self> {
        let model_type = geokeys.short(keys::GT_MODEL_TYPE).or_else(|| {
            if geokeys.contains(keys::PROJECTED_CS_TYPE) || geokeys.contains(keys::PROJECTION) {
                Some(MODEL_TYPE_PROJECTED)
            } else if geokeys.contains(keys::GEOGRAPHIC_TYPE) {
                Some(MODEL_TYPE_GEOGRAPHIC)
            } else {
                None
            }
        });

        match model_type {
            Some(MODEL_TYPE_PROJECTED) => projected(geokeys),
            Some(MODEL_TYPE_GEOGRAPHIC) => geographic(geokeys),
            Some(MODEL_TYPE_GEOCENTRIC) => Err(ProjectionError::UnsupportedCrs(
                "geocentric model".to_string(),
            )),
            Some(other) => Err(ProjectionError::UnsupportedCrs(format!(
                "model type {}",
                other
            ))),
            None => Err(ProjectionError::MissingKey {
                id: keys::GT_MODEL_TYPE,
                name: keys::name(keys::GT_MODEL_TYPE),
            }),
        }
    }

    /// Definition for a well-known EPSG code.
    pub fn from_epsg(code: u16) -> ProjectionResult<Self> {
        if let Some(ellipsoid) = geographic_datum(code) {
            return Ok(Self {
                proj4: format!("+proj=longlat {} +no_defs", ellipsoid),
                kind: CrsKind::Geographic,
                x_scale: 1.0,
                y_scale: 1.0,
                epsg: Some(code),
            });
        }

        let proj4 = projected_epsg(code)
            .ok_or_else(|| ProjectionError::UnsupportedCrs(format!("EPSG:{}", code)))?;
        Ok(Self {
            proj4,
            kind: CrsKind::Projected,
            x_scale: 1.0,
            y_scale: 1.0,
            epsg: Some(code),
        })
    }
}

fn geographic(geokeys: &GeoKeyDirectory) -> ProjectionResult<ProjectionDefinition> {
    let angular = angular_unit_to_degrees(geokeys)?;
    let code = geokeys.short(keys::GEOGRAPHIC_TYPE).unwrap_or(USER_DEFINED);

    let ellipsoid = if code == USER_DEFINED {
        user_defined_ellipsoid(geokeys)?
    } else {
        geographic_datum(code)
            .ok_or_else(|| ProjectionError::UnsupportedCrs(format!("EPSG:{}", code)))?
            .to_string()
    };

    Ok(ProjectionDefinition {
        proj4: format!("+proj=longlat {} +no_defs", ellipsoid),
        kind: CrsKind::Geographic,
        x_scale: angular,
        y_scale: angular,
        epsg: (code != USER_DEFINED).then_some(code),
    })
}

fn projected(geokeys: &GeoKeyDirectory) -> ProjectionResult<ProjectionDefinition> {
    let linear = linear_unit_to_metres(geokeys)?;
    let code = geokeys.short(keys::PROJECTED_CS_TYPE).unwrap_or(USER_DEFINED);

    if code != USER_DEFINED {
        let mut definition = ProjectionDefinition::from_epsg(code)?;
        if definition.kind != CrsKind::Projected {
            return Err(ProjectionError::UnsupportedCrs(format!(
                "EPSG:{} is not a projected system",
                code
            )));
        }
        // EPSG systems carry their own units; an explicit linear unit key wins.
        if geokeys.contains(keys::PROJ_LINEAR_UNITS) {
            definition.x_scale = linear;
            definition.y_scale = linear;
        }
        return Ok(definition);
    }

    // ProjectionGeoKey can name a standard projection without a full PCS code.
    if let Some(projection) = geokeys.short(keys::PROJECTION).filter(|p| *p != USER_DEFINED) {
        let proj4 = projection_code(projection, &ellipsoid_for_projected(geokeys)?)?;
        return Ok(ProjectionDefinition {
            proj4,
            kind: CrsKind::Projected,
            x_scale: linear,
            y_scale: linear,
            epsg: None,
        });
    }

    let proj4 = user_defined_projection(geokeys, linear)?;
    Ok(ProjectionDefinition {
        proj4,
        kind: CrsKind::Projected,
        x_scale: linear,
        y_scale: linear,
        epsg: None,
    })
}

/// Ellipsoid/datum parameters for a geographic EPSG code.
fn geographic_datum(code: u16) -> Option<&'static str> {
    match code {
        4326 => Some("+datum=WGS84"),
        // NAD83, ETRS89 and GDA94 sit on GRS80 with a null shift to WGS84.
        4269 | 4258 | 4283 => Some("+ellps=GRS80 +towgs84=0,0,0"),
        _ => None,
    }
}

fn projected_epsg(code: u16) -> Option<String> {
    match code {
        3857 => Some(
            "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs"
                .to_string(),
        ),
        32662 => Some("+proj=eqc +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs".to_string()),
        32601..=32660 => Some(utm(code - 32600, false, "+datum=WGS84")),
        32701..=32760 => Some(utm(code - 32700, true, "+datum=WGS84")),
        26901..=26923 => Some(utm(code - 26900, false, "+ellps=GRS80 +towgs84=0,0,0")),
        25828..=25838 => Some(utm(code - 25800, false, "+ellps=GRS80 +towgs84=0,0,0")),
        _ => None,
    }
}

/// ProjectionGeoKey codes (EPSG coordinate operation codes).
fn projection_code(code: u16, ellipsoid: &str) -> ProjectionResult<String> {
    match code {
        16001..=16060 => Ok(utm(code - 16000, false, ellipsoid)),
        16101..=16160 => Ok(utm(code - 16100, true, ellipsoid)),
        _ => Err(ProjectionError::UnsupportedCrs(format!(
            "projection code {}",
            code
        ))),
    }
}

fn utm(zone: u16, south: bool, ellipsoid: &str) -> String {
    format!(
        "+proj=utm +zone={}{} {} +units=m +no_defs",
        zone,
        if south { " +south" } else { "" },
        ellipsoid
    )
}

fn user_defined_projection(geokeys: &GeoKeyDirectory, linear: f64) -> ProjectionResult<String> {
    let transform = geokeys.require_short(keys::PROJ_COORD_TRANS)?;
    let ellipsoid = ellipsoid_for_projected(geokeys)?;
    let angular = angular_unit_to_degrees(geokeys)?;

    let angle = |ids: &[u16]| geokeys.first_double(ids).map(|v| v * angular);
    let require_angle = |ids: &[u16]| {
        angle(ids).ok_or(ProjectionError::MissingKey {
            id: ids[0],
            name: keys::name(ids[0]),
        })
    };
    // False easting/northing are expressed in the linear unit.
    let distance = |ids: &[u16]| geokeys.first_double(ids).unwrap_or(0.0) * linear;

    let lon_0 = || {
        angle(&[
            keys::PROJ_NAT_ORIGIN_LONG,
            keys::PROJ_FALSE_ORIGIN_LONG,
            keys::PROJ_CENTER_LONG,
        ])
        .unwrap_or(0.0)
    };
    let x_0 = distance(&[keys::PROJ_FALSE_EASTING, keys::PROJ_FALSE_ORIGIN_EASTING]);
    let y_0 = distance(&[keys::PROJ_FALSE_NORTHING, keys::PROJ_FALSE_ORIGIN_NORTHING]);
    let scale = geokeys
        .first_double(&[keys::PROJ_SCALE_AT_NAT_ORIGIN, keys::PROJ_SCALE_AT_CENTER])
        .unwrap_or(1.0);

    let body = match transform {
        CT_TRANSVERSE_MERCATOR => format!(
            "+proj=tmerc +lat_0={} +lon_0={} +k={} +x_0={} +y_0={}",
            angle(&[keys::PROJ_NAT_ORIGIN_LAT, keys::PROJ_CENTER_LAT]).unwrap_or(0.0),
            lon_0(),
            scale,
            x_0,
            y_0
        ),
        CT_MERCATOR => match angle(&[keys::PROJ_STD_PARALLEL_1]) {
            Some(lat_ts) => format!(
                "+proj=merc +lat_ts={} +lon_0={} +x_0={} +y_0={}",
                lat_ts,
                lon_0(),
                x_0,
                y_0
            ),
            None => format!(
                "+proj=merc +lon_0={} +k={} +x_0={} +y_0={}",
                lon_0(),
                scale,
                x_0,
                y_0
            ),
        },
        CT_LAMBERT_CONF_CONIC_2SP => format!(
            "+proj=lcc +lat_1={} +lat_2={} +lat_0={} +lon_0={} +x_0={} +y_0={}",
            require_angle(&[keys::PROJ_STD_PARALLEL_1])?,
            require_angle(&[keys::PROJ_STD_PARALLEL_2])?,
            angle(&[keys::PROJ_FALSE_ORIGIN_LAT, keys::PROJ_NAT_ORIGIN_LAT]).unwrap_or(0.0),
            lon_0(),
            x_0,
            y_0
        ),
        CT_LAMBERT_CONF_CONIC_1SP => {
            let lat = require_angle(&[keys::PROJ_NAT_ORIGIN_LAT])?;
            format!(
                "+proj=lcc +lat_1={} +lat_0={} +lon_0={} +k_0={} +x_0={} +y_0={}",
                lat,
                lat,
                lon_0(),
                scale,
                x_0,
                y_0
            )
        }
        CT_LAMBERT_AZIM_EQUAL_AREA => format!(
            "+proj=laea +lat_0={} +lon_0={} +x_0={} +y_0={}",
            require_angle(&[keys::PROJ_CENTER_LAT, keys::PROJ_NAT_ORIGIN_LAT])?,
            lon_0(),
            x_0,
            y_0
        ),
        CT_ALBERS_EQUAL_AREA => format!(
            "+proj=aea +lat_1={} +lat_2={} +lat_0={} +lon_0={} +x_0={} +y_0={}",
            require_angle(&[keys::PROJ_STD_PARALLEL_1])?,
            require_angle(&[keys::PROJ_STD_PARALLEL_2])?,
            angle(&[keys::PROJ_FALSE_ORIGIN_LAT, keys::PROJ_NAT_ORIGIN_LAT]).unwrap_or(0.0),
            lon_0(),
            x_0,
            y_0
        ),
        CT_POLAR_STEREOGRAPHIC => {
            let lat_ts = require_angle(&[keys::PROJ_NAT_ORIGIN_LAT])?;
            let lon = angle(&[keys::PROJ_STRAIGHT_VERT_POLE_LONG]).unwrap_or_else(lon_0);
            format!(
                "+proj=stere +lat_0={} +lat_ts={} +lon_0={} +k={} +x_0={} +y_0={}",
                if lat_ts < 0.0 { -90.0 } else { 90.0 },
                lat_ts,
                lon,
                scale,
                x_0,
                y_0
            )
        }
        CT_EQUIRECTANGULAR => format!(
            "+proj=eqc +lat_ts={} +lon_0={} +x_0={} +y_0={}",
            angle(&[keys::PROJ_STD_PARALLEL_1, keys::PROJ_NAT_ORIGIN_LAT]).unwrap_or(0.0),
            lon_0(),
            x_0,
            y_0
        ),
        other => {
            return Err(ProjectionError::UnsupportedCrs(format!(
                "coordinate transformation {}",
                other
            )))
        }
    };

    Ok(format!("{} {} +units=m +no_defs", body, ellipsoid))
}

/// Ellipsoid for a projected system: the geographic base system if named,
/// explicit axes otherwise, WGS84 as a last resort.
fn ellipsoid_for_projected(geokeys: &GeoKeyDirectory) -> ProjectionResult<String> {
    match geokeys.short(keys::GEOGRAPHIC_TYPE) {
        Some(code) if code != USER_DEFINED => geographic_datum(code)
            .map(str::to_string)
            .ok_or_else(|| ProjectionError::UnsupportedCrs(format!("EPSG:{}", code))),
        _ => user_defined_ellipsoid(geokeys),
    }
}

fn user_defined_ellipsoid(geokeys: &GeoKeyDirectory) -> ProjectionResult<String> {
    match geokeys.short(keys::GEOG_ELLIPSOID) {
        Some(7030) => return Ok("+ellps=WGS84 +towgs84=0,0,0".to_string()),
        Some(7019) => return Ok("+ellps=GRS80 +towgs84=0,0,0".to_string()),
        Some(code) if code != USER_DEFINED => {
            return Err(ProjectionError::UnsupportedCrs(format!(
                "ellipsoid EPSG:{}",
                code
            )))
        }
        _ => {}
    }

    let Some(a) = geokeys.double(keys::GEOG_SEMI_MAJOR_AXIS) else {
        return Ok("+datum=WGS84".to_string());
    };
    if let Some(rf) = geokeys.double(keys::GEOG_INV_FLATTENING).filter(|rf| *rf > 0.0) {
        Ok(format!("+a={} +rf={}", a, rf))
    } else {
        let b = geokeys.double(keys::GEOG_SEMI_MINOR_AXIS).unwrap_or(a);
        Ok(format!("+a={} +b={}", a, b))
    }
}

/// Factor converting the linear unit to metres.
fn linear_unit_to_metres(geokeys: &GeoKeyDirectory) -> ProjectionResult<f64> {
    match geokeys.short(keys::PROJ_LINEAR_UNITS) {
        None | Some(9001) => Ok(1.0),
        Some(9002) => Ok(0.3048),
        Some(9003) => Ok(1200.0 / 3937.0),
        Some(9036) => Ok(1000.0),
        Some(USER_DEFINED) => geokeys
            .double(keys::PROJ_LINEAR_UNIT_SIZE)
            .filter(|size| *size > 0.0)
            .ok_or(ProjectionError::MissingKey {
                id: keys::PROJ_LINEAR_UNIT_SIZE,
                name: "ProjLinearUnitSizeGeoKey",
            }),
        Some(other) => Err(ProjectionError::UnsupportedCrs(format!(
            "linear unit {}",
            other
        ))),
    }
}

/// Factor converting the angular unit to degrees.
fn angular_unit_to_degrees(geokeys: &GeoKeyDirectory) -> ProjectionResult<f64> {
    match geokeys.short(keys::GEOG_ANGULAR_UNITS) {
        None | Some(9102) => Ok(1.0),
        Some(9101) => Ok(180.0 / PI),
        Some(9103) => Ok(1.0 / 60.0),
        Some(9104) => Ok(1.0 / 3600.0),
        Some(9105) | Some(9106) => Ok(0.9),
        Some(other) => Err(ProjectionError::UnsupportedCrs(format!(
            "angular unit {}",
            other
        ))),
    }
}
