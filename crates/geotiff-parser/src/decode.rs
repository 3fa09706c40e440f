//! GeoTIFF bytes → [`GeoRaster`].

use std::io::{Cursor, Read, Seek};

use num_traits::ToPrimitive;
use projection::geokeys::tags;
use projection::{GeoKeyDirectory, GeoTransformer, ProjectionDefinition};
use solar_common::GeoRaster;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::debug;

use crate::error::{RasterError, RasterResult};
use crate::georef::Georeference;

const PLANAR_SEPARATE: u16 = 2;

/// Decode a GeoTIFF into band planes with WGS84 bounds.
///
/// The `tiff` decoder's default limits apply, so a header claiming an
/// oversized image fails with `DecodeFailed` instead of allocating.
/// CPU-bound; call it from a blocking context when used inside async code.
pub fn decode_geotiff(bytes: &[u8]) -> RasterResult<GeoRaster> {
    let mut decoder = Decoder::new(Cursor::new(bytes))?.with_limits(Limits::default());

    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);
    let planar = decoder
        .find_tag_unsigned::<u16>(Tag::PlanarConfiguration)?
        .unwrap_or(1);
    let samples_per_pixel = decoder
        .find_tag_unsigned::<u16>(Tag::SamplesPerPixel)?
        .unwrap_or(1) as usize;

    let georef = Georeference::from_tags(
        find_f64s(&mut decoder, tags::MODEL_TIEPOINT)?.as_deref(),
        find_f64s(&mut decoder, tags::MODEL_PIXEL_SCALE)?.as_deref(),
        find_f64s(&mut decoder, tags::MODEL_TRANSFORMATION)?.as_deref(),
    )?;
    let geokeys = read_geokeys(&mut decoder)?;

    let bands = if planar == PLANAR_SEPARATE && samples_per_pixel > 1 {
        // `read_image` only returns the first plane of separate-plane data.
        read_planes(&mut decoder, width, height, samples_per_pixel)?
    } else {
        split_bands(samples_to_f32(decoder.read_image()?), width * height)?
    };

    let native = georef.bounds(width, height)?;
    let definition = ProjectionDefinition::from_geokeys(&geokeys)?;
    let bounds = GeoTransformer::new(&definition)?.project_bounds(
        native.min_x,
        native.min_y,
        native.max_x,
        native.max_y,
    )?;

    debug!(
        width,
        height,
        bands = bands.len(),
        epsg = ?definition.epsg,
        north = bounds.north,
        south = bounds.south,
        east = bounds.east,
        west = bounds.west,
        "Decoded GeoTIFF"
    );

    Ok(GeoRaster::new(width, height, bands, bounds)?)
}

/// GeoTIFF tags are known to `tiff` by name, so look them up by number
/// through the exhaustive mapping.
fn geotiff_tag(tag: u16) -> Tag {
    Tag::from_u16_exhaustive(tag)
}

fn find_f64s<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    tag: u16,
) -> RasterResult<Option<Vec<f64>>> {
    decoder
        .find_tag(geotiff_tag(tag))?
        .map(|value| value.into_f64_vec())
        .transpose()
        .map_err(RasterError::from)
}

fn read_geokeys<R: Read + Seek>(
    decoder: &mut Decoder<R>,
) -> RasterResult<GeoKeyDirectory> {
    let directory = decoder
        .find_tag(geotiff_tag(tags::GEO_KEY_DIRECTORY))?
        .ok_or_else(|| RasterError::decode("GeoTIFF has no GeoKeyDirectory"))?
        .into_u16_vec()?;
    let doubles = find_f64s(decoder, tags::GEO_DOUBLE_PARAMS)?.unwrap_or_default();
    let ascii = match decoder.find_tag(geotiff_tag(tags::GEO_ASCII_PARAMS))? {
        Some(value) => value.into_string().unwrap_or_else(|e| {
            debug!(error = %e, "Ignoring unreadable GeoAsciiParams");
            String::new()
        }),
        None => String::new(),
    };

    Ok(GeoKeyDirectory::parse(&directory, &doubles, &ascii)?)
}

fn samples_to_f32(result: DecodingResult) -> Vec<f32> {
    fn convert<T: ToPrimitive>(values: Vec<T>) -> Vec<f32> {
        values
            .into_iter()
            .map(|v| v.to_f32().unwrap_or(f32::NAN))
            .collect()
    }

    match result {
        DecodingResult::U8(v) => convert(v),
        DecodingResult::U16(v) => convert(v),
        DecodingResult::U32(v) => convert(v),
        DecodingResult::U64(v) => convert(v),
        DecodingResult::I8(v) => convert(v),
        DecodingResult::I16(v) => convert(v),
        DecodingResult::I32(v) => convert(v),
        DecodingResult::I64(v) => convert(v),
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => convert(v),
    }
}

/// Read separate-plane data chunk by chunk. Chunks are numbered plane by
/// plane, row-major within each plane.
fn read_planes<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    width: usize,
    height: usize,
    planes: usize,
) -> RasterResult<Vec<Vec<f32>>> {
    let pixels = width * height;
    let budget = Limits::default().decoding_buffer_size;
    let needed = pixels
        .checked_mul(planes)
        .and_then(|n| n.checked_mul(std::mem::size_of::<f32>()));
    if needed.map_or(true, |n| n > budget) {
        return Err(RasterError::decode(format!(
            "{}x{} image with {} planes exceeds the {} byte decoding limit",
            width, height, planes, budget
        )));
    }

    let (chunk_width, chunk_height) = decoder.chunk_dimensions();
    let (chunk_width, chunk_height) = (chunk_width as usize, chunk_height as usize);
    if chunk_width == 0 || chunk_height == 0 {
        return Err(RasterError::decode("GeoTIFF has empty chunks"));
    }
    let across = width.div_ceil(chunk_width);
    let per_plane = across * height.div_ceil(chunk_height);

    let mut bands = Vec::with_capacity(planes);
    for plane in 0..planes {
        let mut band = vec![f32::NAN; pixels];
        for chunk in 0..per_plane {
            let index = u32::try_from(plane * per_plane + chunk)
                .map_err(|_| RasterError::decode("GeoTIFF chunk index out of range"))?;
            let samples = samples_to_f32(decoder.read_chunk(index)?);
            let origin = (
                (chunk % across) * chunk_width,
                (chunk / across) * chunk_height,
            );
            place_chunk(
                &mut band,
                (width, height),
                origin,
                (chunk_width, chunk_height),
                &samples,
            )?;
        }
        bands.push(band);
    }
    Ok(bands)
}

/// Copy one decoded chunk into its band. Edge chunks hold only the pixels
/// inside the image.
fn place_chunk(
    band: &mut [f32],
    (width, height): (usize, usize),
    (x0, y0): (usize, usize),
    (chunk_width, chunk_height): (usize, usize),
    samples: &[f32],
) -> RasterResult<()> {
    let data_width = chunk_width.min(width.saturating_sub(x0));
    let data_height = chunk_height.min(height.saturating_sub(y0));
    if data_width == 0 || samples.len() != data_width * data_height {
        return Err(RasterError::decode(format!(
            "chunk at ({}, {}) holds {} samples, expected {}",
            x0,
            y0,
            samples.len(),
            data_width * data_height
        )));
    }
    for (row, values) in samples.chunks_exact(data_width).enumerate() {
        let start = (y0 + row) * width + x0;
        band[start..start + data_width].copy_from_slice(values);
    }
    Ok(())
}

/// Split chunky samples, interleaved per pixel, into one plane per band.
fn split_bands(samples: Vec<f32>, pixels: usize) -> RasterResult<Vec<Vec<f32>>> {
    if pixels == 0 || samples.len() % pixels != 0 || samples.is_empty() {
        return Err(RasterError::decode(format!(
            "{} samples do not fill {} pixels",
            samples.len(),
            pixels
        )));
    }
    let band_count = samples.len() / pixels;

    if band_count == 1 {
        return Ok(vec![samples]);
    }

    let mut bands: Vec<Vec<f32>> = (0..band_count)
        .map(|_| Vec::with_capacity(pixels))
        .collect();
    for pixel in samples.chunks_exact(band_count) {
        for (band, value) in bands.iter_mut().zip(pixel) {
            band.push(*value);
        }
    }
    Ok(bands)
}
