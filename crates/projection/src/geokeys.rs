//! GeoTIFF GeoKey directory parsing.
//!
//! The GeoKeyDirectory tag (34735) is a flat `u16` array:
//!
//! ```text
//! [KeyDirectoryVersion, KeyRevision, MinorRevision, NumberOfKeys,
//!  KeyID, TIFFTagLocation, Count, Value_Offset, ...]
//! ```
//!
//! `TIFFTagLocation == 0` stores the value inline in `Value_Offset`. Otherwise
//! the value lives in GeoDoubleParams (34736), GeoAsciiParams (34737) or in
//! the directory itself, starting at `Value_Offset`.

use std::collections::BTreeMap;

use crate::error::{ProjectionError, ProjectionResult};

/// TIFF tag numbers carrying GeoTIFF metadata.
pub mod tags {
    pub const MODEL_PIXEL_SCALE: u16 = 33550;
    pub const MODEL_TIEPOINT: u16 = 33922;
    pub const MODEL_TRANSFORMATION: u16 = 34264;
    pub const GEO_KEY_DIRECTORY: u16 = 34735;
    pub const GEO_DOUBLE_PARAMS: u16 = 34736;
    pub const GEO_ASCII_PARAMS: u16 = 34737;
}

/// GeoKey identifiers.
pub mod keys {
    pub const GT_MODEL_TYPE: u16 = 1024;
    pub const GT_RASTER_TYPE: u16 = 1025;
    pub const GT_CITATION: u16 = 1026;

    pub const GEOGRAPHIC_TYPE: u16 = 2048;
    pub const GEOG_CITATION: u16 = 2049;
    pub const GEOG_GEODETIC_DATUM: u16 = 2050;
    pub const GEOG_ANGULAR_UNITS: u16 = 2054;
    pub const GEOG_ELLIPSOID: u16 = 2056;
    pub const GEOG_SEMI_MAJOR_AXIS: u16 = 2057;
    pub const GEOG_SEMI_MINOR_AXIS: u16 = 2058;
    pub const GEOG_INV_FLATTENING: u16 = 2059;

    pub const PROJECTED_CS_TYPE: u16 = 3072;
    pub const PCS_CITATION: u16 = 3073;
    pub const PROJECTION: u16 = 3074;
    pub const PROJ_COORD_TRANS: u16 = 3075;
    pub const PROJ_LINEAR_UNITS: u16 = 3076;
    pub const PROJ_LINEAR_UNIT_SIZE: u16 = 3077;
    pub const PROJ_STD_PARALLEL_1: u16 = 3078;
    pub const PROJ_STD_PARALLEL_2: u16 = 3079;
    pub const PROJ_NAT_ORIGIN_LONG: u16 = 3080;
    pub const PROJ_NAT_ORIGIN_LAT: u16 = 3081;
    pub const PROJ_FALSE_EASTING: u16 = 3082;
    pub const PROJ_FALSE_NORTHING: u16 = 3083;
    pub const PROJ_FALSE_ORIGIN_LONG: u16 = 3084;
    pub const PROJ_FALSE_ORIGIN_LAT: u16 = 3085;
    pub const PROJ_FALSE_ORIGIN_EASTING: u16 = 3086;
    pub const PROJ_FALSE_ORIGIN_NORTHING: u16 = 3087;
    pub const PROJ_CENTER_LONG: u16 = 3088;
    pub const PROJ_CENTER_LAT: u16 = 3089;
    pub const PROJ_SCALE_AT_NAT_ORIGIN: u16 = 3092;
    pub const PROJ_SCALE_AT_CENTER: u16 = 3093;
    pub const PROJ_STRAIGHT_VERT_POLE_LONG: u16 = 3095;

    /// Human-readable key name for diagnostics.
    pub fn name(id: u16) -> &'static str {
        match id {
            GT_MODEL_TYPE => "GTModelTypeGeoKey",
            GT_RASTER_TYPE => "GTRasterTypeGeoKey",
            GEOGRAPHIC_TYPE => "GeographicTypeGeoKey",
            GEOG_ANGULAR_UNITS => "GeogAngularUnitsGeoKey",
            GEOG_ELLIPSOID => "GeogEllipsoidGeoKey",
            PROJECTED_CS_TYPE => "ProjectedCSTypeGeoKey",
            PROJECTION => "ProjectionGeoKey",
            PROJ_COORD_TRANS => "ProjCoordTransGeoKey",
            PROJ_LINEAR_UNITS => "ProjLinearUnitsGeoKey",
            PROJ_NAT_ORIGIN_LONG => "ProjNatOriginLongGeoKey",
            PROJ_NAT_ORIGIN_LAT => "ProjNatOriginLatGeoKey",
            PROJ_STD_PARALLEL_1 => "ProjStdParallel1GeoKey",
            PROJ_STD_PARALLEL_2 => "ProjStdParallel2GeoKey",
            _ => "GeoKey",
        }
    }
}

/// Value of a single GeoKey.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoKeyValue {
    Short(u16),
    Shorts(Vec<u16>),
    Doubles(Vec<f64>),
    Ascii(String),
}

/// Parsed GeoKey directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoKeyDirectory {
    pub version: u16,
    pub revision: (u16, u16),
    keys: BTreeMap<u16, GeoKeyValue>,
}

impl GeoKeyDirectory {
    /// Parse the directory together with its double and ASCII parameter tags.
    pub fn parse(directory: &[u16], doubles: &[f64], ascii: &str) -> ProjectionResult<Self> {
        if directory.len() < 4 {
            return Err(ProjectionError::InvalidDirectory(format!(
                "header needs 4 entries, found {}",
                directory.len()
            )));
        }

        let version = directory[0];
        let revision = (directory[1], directory[2]);
        let count = directory[3] as usize;
        let needed = 4 + count * 4;
        if directory.len() < needed {
            return Err(ProjectionError::InvalidDirectory(format!(
                "{} keys need {} entries, found {}",
                count,
                needed,
                directory.len()
            )));
        }

        let mut keys = BTreeMap::new();
        for entry in directory[4..needed].chunks_exact(4) {
            let (id, location, count, offset) = (entry[0], entry[1], entry[2] as usize, entry[3] as usize);
            let value = match location {
                0 => GeoKeyValue::Short(entry[3]),
                tags::GEO_DOUBLE_PARAMS => {
                    let values = doubles.get(offset..offset + count).ok_or_else(|| {
                        ProjectionError::InvalidDirectory(format!(
                            "key {} references doubles {}..{} of {}",
                            id,
                            offset,
                            offset + count,
                            doubles.len()
                        ))
                    })?;
                    GeoKeyValue::Doubles(values.to_vec())
                }
                tags::GEO_ASCII_PARAMS => {
                    let text = ascii.get(offset..offset + count).ok_or_else(|| {
                        ProjectionError::InvalidDirectory(format!(
                            "key {} references ascii {}..{} of {}",
                            id,
                            offset,
                            offset + count,
                            ascii.len()
                        ))
                    })?;
                    // Entries are '|'-terminated; some writers also leave a NUL.
                    GeoKeyValue::Ascii(text.trim_end_matches(['|', '\0']).to_string())
                }
                tags::GEO_KEY_DIRECTORY => {
                    let values = directory.get(offset..offset + count).ok_or_else(|| {
                        ProjectionError::InvalidDirectory(format!(
                            "key {} references directory entries {}..{}",
                            id,
                            offset,
                            offset + count
                        ))
                    })?;
                    GeoKeyValue::Shorts(values.to_vec())
                }
                other => {
                    tracing::debug!(key = id, location = other, "Skipping GeoKey stored in unknown tag");
                    continue;
                }
            };
            keys.insert(id, value);
        }

        Ok(Self {
            version,
            revision,
            keys,
        })
    }

    pub fn get(&self, id: u16) -> Option<&GeoKeyValue> {
        self.keys.get(&id)
    }

    pub fn contains(&self, id: u16) -> bool {
        self.keys.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn short(&self, id: u16) -> Option<u16> {
        match self.keys.get(&id)? {
            GeoKeyValue::Short(v) => Some(*v),
            GeoKeyValue::Shorts(v) => v.first().copied(),
            _ => None,
        }
    }

    /// Numeric value of a key; short values are widened.
    pub fn double(&self, id: u16) -> Option<f64> {
        match self.keys.get(&id)? {
            GeoKeyValue::Doubles(v) => v.first().copied(),
            GeoKeyValue::Short(v) => Some(*v as f64),
            GeoKeyValue::Shorts(v) => v.first().map(|s| *s as f64),
            GeoKeyValue::Ascii(_) => None,
        }
    }

    pub fn ascii(&self, id: u16) -> Option<&str> {
        match self.keys.get(&id)? {
            GeoKeyValue::Ascii(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// First key in `ids` that has a numeric value.
    pub fn first_double(&self, ids: &[u16]) -> Option<f64> {
        ids.iter().find_map(|id| self.double(*id))
    }

    pub fn require_short(&self, id: u16) -> ProjectionResult<u16> {
        self.short(id).ok_or(ProjectionError::MissingKey {
            id,
            name: keys::name(id),
        })
    }
}

/// Builder for GeoKey directories, mainly for writing test fixtures.
#[derive(Debug, Default, Clone)]
pub struct GeoKeyDirectoryBuilder {
    entries: Vec<(u16, GeoKeyValue)>,
}

impl GeoKeyDirectoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn short(mut self, id: u16, value: u16) -> Self {
        self.entries.push((id, GeoKeyValue::Short(value)));
        self
    }

    pub fn double(mut self, id: u16, value: f64) -> Self {
        self.entries.push((id, GeoKeyValue::Doubles(vec![value])));
        self
    }

    pub fn ascii(mut self, id: u16, value: &str) -> Self {
        self.entries.push((id, GeoKeyValue::Ascii(value.to_string())));
        self
    }

    /// Encode into `(directory, doubles, ascii)` tag payloads.
    pub fn encode(mut self) -> (Vec<u16>, Vec<f64>, String) {
        // Keys must be sorted by id.
        self.entries.sort_by_key(|(id, _)| *id);

        let mut directory = vec![1, 1, 0, self.entries.len() as u16];
        let mut doubles = Vec::new();
        let mut ascii = String::new();

        for (id, value) in self.entries {
            match value {
                GeoKeyValue::Short(v) => directory.extend_from_slice(&[id, 0, 1, v]),
                GeoKeyValue::Shorts(v) => {
                    // Stored inline only when single-valued.
                    directory.extend_from_slice(&[id, 0, 1, v.first().copied().unwrap_or(0)])
                }
                GeoKeyValue::Doubles(v) => {
                    directory.extend_from_slice(&[
                        id,
                        tags::GEO_DOUBLE_PARAMS,
                        v.len() as u16,
                        doubles.len() as u16,
                    ]);
                    doubles.extend(v);
                }
                GeoKeyValue::Ascii(s) => {
                    let text = format!("{}|", s);
                    directory.extend_from_slice(&[
                        id,
                        tags::GEO_ASCII_PARAMS,
                        text.len() as u16,
                        ascii.len() as u16,
                    ]);
                    ascii.push_str(&text);
                }
            }
        }

        (directory, doubles, ascii)
    }
}
