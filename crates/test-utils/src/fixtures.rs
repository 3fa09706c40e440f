//! Common test fixtures: reference locations and an in-memory GeoTIFF writer.

use std::io::Cursor;

use projection::geokeys::{keys, tags, GeoKeyDirectoryBuilder};
use tiff::encoder::colortype::{ColorType, Gray32Float, Gray8, RGB8};
use tiff::encoder::{TiffEncoder, TiffValue};
use tiff::tags::Tag;

/// Reference rectangles.
pub mod bounds {
    use solar_common::GeoRectangle;

    /// Roughly 100m x 100m around a Palo Alto rooftop.
    pub const PALO_ALTO: GeoRectangle = GeoRectangle {
        north: 37.4460,
        south: 37.4450,
        east: -122.1378,
        west: -122.1390,
    };

    /// Same footprint size in Sydney (southern hemisphere, eastern longitudes).
    pub const SYDNEY: GeoRectangle = GeoRectangle {
        north: -33.8560,
        south: -33.8570,
        east: 151.2162,
        west: 151.2150,
    };

    /// A tile touching the equator and prime meridian.
    pub const NULL_ISLAND: GeoRectangle = GeoRectangle {
        north: 0.01,
        south: 0.0,
        east: 0.01,
        west: 0.0,
    };
}

/// UTM coordinates of the reference rectangles' corners (easting, northing).
pub mod utm {
    /// [`super::bounds::PALO_ALTO`] south-west corner, zone 10N.
    pub const PALO_ALTO_SW: (f64, f64) = (576160.3932, 4144587.4627);
    /// [`super::bounds::PALO_ALTO`] north-east corner, zone 10N.
    pub const PALO_ALTO_NE: (f64, f64) = (576265.5270, 4144699.3783);
    /// [`super::bounds::SYDNEY`] south-west corner, zone 56S.
    pub const SYDNEY_SW: (f64, f64) = (334873.1988, 6252266.0918);
    /// [`super::bounds::SYDNEY`] north-east corner, zone 56S.
    pub const SYDNEY_NE: (f64, f64) = (334982.2981, 6252378.9148);
}

/// How the fixture places its pixel grid in model space.
#[derive(Debug, Clone)]
pub enum FixtureGeoref {
    /// Upper-left corner and pixel size.
    Tiepoint {
        origin_x: f64,
        origin_y: f64,
        scale_x: f64,
        scale_y: f64,
    },
    /// Row-major 4x4 ModelTransformation.
    Matrix([f64; 16]),
    /// No georeferencing tags at all.
    Missing,
}

impl FixtureGeoref {
    /// Tiepoint georeferencing that spans `sw`..`ne` with `width` x `height` pixels.
    pub fn spanning(sw: (f64, f64), ne: (f64, f64), width: usize, height: usize) -> Self {
        FixtureGeoref::Tiepoint {
            origin_x: sw.0,
            origin_y: ne.1,
            scale_x: (ne.0 - sw.0) / width as f64,
            scale_y: (ne.1 - sw.1) / height as f64,
        }
    }
}

/// Builds GeoTIFF files in memory using the `tiff` encoder.
///
/// ```ignore
/// let bytes = GeoTiffBuilder::projected(32610, FixtureGeoref::spanning(sw, ne, 10, 10))
///     .gray_f32(10, 10, &band);
/// ```
#[derive(Debug, Clone)]
pub struct GeoTiffBuilder {
    georef: FixtureGeoref,
    geokeys: GeoKeyDirectoryBuilder,
}

impl GeoTiffBuilder {
    pub fn new(georef: FixtureGeoref, geokeys: GeoKeyDirectoryBuilder) -> Self {
        Self { georef, geokeys }
    }

    /// Projected system identified by an EPSG code.
    pub fn projected(epsg: u16, georef: FixtureGeoref) -> Self {
        Self::new(
            georef,
            GeoKeyDirectoryBuilder::new()
                .short(keys::GT_MODEL_TYPE, 1)
                .short(keys::GT_RASTER_TYPE, 1)
                .short(keys::PROJECTED_CS_TYPE, epsg)
                .ascii(keys::PCS_CITATION, &format!("EPSG:{}", epsg)),
        )
    }

    /// WGS84 geographic system.
    pub fn geographic(georef: FixtureGeoref) -> Self {
        Self::new(
            georef,
            GeoKeyDirectoryBuilder::new()
                .short(keys::GT_MODEL_TYPE, 2)
                .short(keys::GT_RASTER_TYPE, 1)
                .short(keys::GEOGRAPHIC_TYPE, 4326),
        )
    }

    /// Single-band 32-bit float image (flux, DSM).
    pub fn gray_f32(&self, width: usize, height: usize, data: &[f32]) -> Vec<u8> {
        self.encode::<Gray32Float>(width, height, data)
    }

    /// Single-band 8-bit image (mask).
    pub fn gray_u8(&self, width: usize, height: usize, data: &[u8]) -> Vec<u8> {
        self.encode::<Gray8>(width, height, data)
    }

    /// Interleaved 8-bit RGB image (true-color imagery).
    pub fn rgb_u8(&self, width: usize, height: usize, data: &[u8]) -> Vec<u8> {
        self.encode::<RGB8>(width, height, data)
    }

    /// Separate-plane 8-bit RGB image (`PlanarConfiguration = 2`), one strip
    /// per plane. The `tiff` encoder only writes interleaved data, so this
    /// file is assembled tag by tag.
    pub fn planar_rgb_u8(
        &self,
        width: usize,
        height: usize,
        red: &[u8],
        green: &[u8],
        blue: &[u8],
    ) -> Vec<u8> {
        self.write_raw(width as u32, height as u32, 2, 2, &[red, green, blue])
    }

    /// Single-band 8-bit image whose header declares `width` x `height`
    /// whatever the length of `data`.
    pub fn declared_gray_u8(&self, width: u32, height: u32, data: &[u8]) -> Vec<u8> {
        self.write_raw(width, height, 1, 1, &[data])
    }

    fn write_raw(
        &self,
        width: u32,
        height: u32,
        photometric: u16,
        planar_config: u16,
        strips: &[&[u8]],
    ) -> Vec<u8> {
        let count = strips.len() as u32;
        let mut ifd = RawIfd::default();

        // Pixel data sits right after the 8-byte header.
        let mut body = Vec::new();
        let mut offsets = Vec::new();
        for strip in strips {
            offsets.push(8 + body.len() as u32);
            body.extend_from_slice(strip);
        }

        ifd.longs(256, &[width]);
        ifd.longs(257, &[height]);
        ifd.shorts(258, &vec![8; strips.len()]);
        ifd.shorts(259, &[1]);
        ifd.shorts(262, &[photometric]);
        ifd.longs(273, &offsets);
        ifd.shorts(277, &[count as u16]);
        ifd.longs(278, &[height]);
        ifd.longs(279, &strips.iter().map(|s| s.len() as u32).collect::<Vec<_>>());
        ifd.shorts(284, &[planar_config]);

        match &self.georef {
            FixtureGeoref::Tiepoint {
                origin_x,
                origin_y,
                scale_x,
                scale_y,
            } => {
                ifd.doubles(tags::MODEL_PIXEL_SCALE, &[*scale_x, *scale_y, 0.0]);
                ifd.doubles(
                    tags::MODEL_TIEPOINT,
                    &[0.0, 0.0, 0.0, *origin_x, *origin_y, 0.0],
                );
            }
            FixtureGeoref::Matrix(matrix) => ifd.doubles(tags::MODEL_TRANSFORMATION, matrix),
            FixtureGeoref::Missing => {}
        }
        let (directory, doubles, ascii) = self.geokeys.clone().encode();
        ifd.shorts(tags::GEO_KEY_DIRECTORY, &directory);
        if !doubles.is_empty() {
            ifd.doubles(tags::GEO_DOUBLE_PARAMS, &doubles);
        }
        if !ascii.is_empty() {
            ifd.ascii(tags::GEO_ASCII_PARAMS, &ascii);
        }

        ifd.write(body)
    }

    fn encode<C: ColorType>(&self, width: usize, height: usize, data: &[C::Inner]) -> Vec<u8>
    where
        [C::Inner]: TiffValue,
    {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut cursor).expect("tiff encoder");
            let mut image = encoder
                .new_image::<C>(width as u32, height as u32)
                .expect("tiff image");
            let dir = image.encoder();

            match &self.georef {
                FixtureGeoref::Tiepoint {
                    origin_x,
                    origin_y,
                    scale_x,
                    scale_y,
                } => {
                    let tiepoint = [0.0, 0.0, 0.0, *origin_x, *origin_y, 0.0];
                    let scale = [*scale_x, *scale_y, 0.0];
                    dir.write_tag(Tag::from_u16_exhaustive(tags::MODEL_TIEPOINT), &tiepoint[..])
                        .expect("tiepoint tag");
                    dir.write_tag(Tag::from_u16_exhaustive(tags::MODEL_PIXEL_SCALE), &scale[..])
                        .expect("pixel scale tag");
                }
                FixtureGeoref::Matrix(matrix) => {
                    dir.write_tag(Tag::from_u16_exhaustive(tags::MODEL_TRANSFORMATION), &matrix[..])
                        .expect("transformation tag");
                }
                FixtureGeoref::Missing => {}
            }

            let (directory, doubles, ascii) = self.geokeys.clone().encode();
            dir.write_tag(Tag::from_u16_exhaustive(tags::GEO_KEY_DIRECTORY), &directory[..])
                .expect("geokey directory tag");
            if !doubles.is_empty() {
                dir.write_tag(Tag::from_u16_exhaustive(tags::GEO_DOUBLE_PARAMS), &doubles[..])
                    .expect("geo double params tag");
            }
            if !ascii.is_empty() {
                dir.write_tag(Tag::from_u16_exhaustive(tags::GEO_ASCII_PARAMS), ascii.as_str())
                    .expect("geo ascii params tag");
            }

            image.write_data(data).expect("tiff data");
        }
        cursor.into_inner()
    }
}

/// Little-endian IFD entries: (tag, field type, count, value bytes).
#[derive(Default)]
struct RawIfd {
    entries: Vec<(u16, u16, u32, Vec<u8>)>,
}

impl RawIfd {
    fn shorts(&mut self, tag: u16, values: &[u16]) {
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((tag, 3, values.len() as u32, bytes));
    }

    fn longs(&mut self, tag: u16, values: &[u32]) {
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((tag, 4, values.len() as u32, bytes));
    }

    fn doubles(&mut self, tag: u16, values: &[f64]) {
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((tag, 12, values.len() as u32, bytes));
    }

    fn ascii(&mut self, tag: u16, value: &str) {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        self.entries.push((tag, 2, bytes.len() as u32, bytes));
    }

    /// Header, then `body` (already placed at offset 8), then out-of-line
    /// values, then the directory.
    fn write(mut self, body: Vec<u8>) -> Vec<u8> {
        self.entries.sort_by_key(|e| e.0);

        let mut out = vec![b'I', b'I', 42, 0, 0, 0, 0, 0];
        out.extend_from_slice(&body);

        let mut fields = Vec::with_capacity(self.entries.len());
        for (tag, kind, count, bytes) in &self.entries {
            let value = if bytes.len() <= 4 {
                let mut inline = bytes.clone();
                inline.resize(4, 0);
                inline
            } else {
                if out.len() % 2 == 1 {
                    out.push(0);
                }
                let offset = out.len() as u32;
                out.extend_from_slice(bytes);
                offset.to_le_bytes().to_vec()
            };
            fields.push((*tag, *kind, *count, value));
        }

        if out.len() % 2 == 1 {
            out.push(0);
        }
        let ifd_offset = out.len() as u32;
        out[4..8].copy_from_slice(&ifd_offset.to_le_bytes());
        out.extend_from_slice(&(fields.len() as u16).to_le_bytes());
        for (tag, kind, count, value) in fields {
            out.extend_from_slice(&tag.to_le_bytes());
            out.extend_from_slice(&kind.to_le_bytes());
            out.extend_from_slice(&count.to_le_bytes());
            out.extend_from_slice(&value);
        }
        out.extend_from_slice(&0u32.to_le_bytes());
        out
    }
}

/// Interleave three planes into RGB8 samples (values clamped to 0..=255).
pub fn interleave_rgb(red: &[f32], green: &[f32], blue: &[f32]) -> Vec<u8> {
    red.iter()
        .zip(green)
        .zip(blue)
        .flat_map(|((r, g), b)| [*r, *g, *b])
        .map(|v| v.clamp(0.0, 255.0) as u8)
        .collect()
}
