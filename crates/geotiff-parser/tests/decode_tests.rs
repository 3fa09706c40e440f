//! Decoding synthetic GeoTIFFs end to end.

use geotiff_parser::{decode_geotiff, RasterError};
use projection::geokeys::{keys, GeoKeyDirectoryBuilder};
use test_utils::{
    assert_approx_eq, bounds, create_flux_band, create_indexed_band, interleave_rgb, utm,
    FixtureGeoref, GeoTiffBuilder,
};

const TOLERANCE_DEG: f64 = 1e-5;

#[test]
fn test_decode_utm_north_flux() {
    let band = create_flux_band(10, 10);
    let georef = FixtureGeoref::spanning(utm::PALO_ALTO_SW, utm::PALO_ALTO_NE, 10, 10);
    let bytes = GeoTiffBuilder::projected(32610, georef).gray_f32(10, 10, &band);

    let raster = decode_geotiff(&bytes).unwrap();
    assert_eq!((raster.width(), raster.height()), (10, 10));
    assert_eq!(raster.band_count(), 1);
    assert_eq!(raster.band(0).unwrap(), band.as_slice());

    let b = raster.bounds();
    assert_approx_eq!(b.north, bounds::PALO_ALTO.north, TOLERANCE_DEG);
    assert_approx_eq!(b.south, bounds::PALO_ALTO.south, TOLERANCE_DEG);
    assert_approx_eq!(b.east, bounds::PALO_ALTO.east, TOLERANCE_DEG);
    assert_approx_eq!(b.west, bounds::PALO_ALTO.west, TOLERANCE_DEG);
}

#[test]
fn test_decode_utm_south() {
    let band = create_indexed_band(6, 4);
    let georef = FixtureGeoref::spanning(utm::SYDNEY_SW, utm::SYDNEY_NE, 6, 4);
    let bytes = GeoTiffBuilder::projected(32756, georef).gray_f32(6, 4, &band);

    let raster = decode_geotiff(&bytes).unwrap();
    let b = raster.bounds();
    assert!(b.north > b.south);
    assert!(b.east > b.west);
    assert_approx_eq!(b.north, bounds::SYDNEY.north, TOLERANCE_DEG);
    assert_approx_eq!(b.west, bounds::SYDNEY.west, TOLERANCE_DEG);
}

#[test]
fn test_decode_rgb_bands_are_split() {
    let (w, h) = (4, 3);
    let red: Vec<f32> = (0..w * h).map(|i| i as f32).collect();
    let green = vec![100.0; w * h];
    let blue = vec![200.0; w * h];
    let georef = FixtureGeoref::spanning(utm::PALO_ALTO_SW, utm::PALO_ALTO_NE, w, h);
    let bytes = GeoTiffBuilder::projected(32610, georef).rgb_u8(w, h, &interleave_rgb(&red, &green, &blue));

    let raster = decode_geotiff(&bytes).unwrap();
    assert_eq!(raster.band_count(), 3);
    assert_eq!(raster.band(0).unwrap(), red.as_slice());
    assert_eq!(raster.sample(1, 3, 2), Some(100.0));
    assert_eq!(raster.sample(2, 0, 0), Some(200.0));
}

#[test]
fn test_decode_u8_mask() {
    let mask: Vec<u8> = (0..16).map(|i| if i % 2 == 0 { 1 } else { 0 }).collect();
    let georef = FixtureGeoref::spanning(utm::PALO_ALTO_SW, utm::PALO_ALTO_NE, 4, 4);
    let bytes = GeoTiffBuilder::projected(32610, georef).gray_u8(4, 4, &mask);

    let raster = decode_geotiff(&bytes).unwrap();
    assert_eq!(raster.sample(0, 0, 0), Some(1.0));
    assert_eq!(raster.sample(0, 1, 0), Some(0.0));
}

#[test]
fn test_decode_geographic() {
    let georef = FixtureGeoref::spanning((-122.1390, 37.4450), (-122.1378, 37.4460), 4, 4);
    let bytes = GeoTiffBuilder::geographic(georef).gray_f32(4, 4, &[0.5; 16]);

    let b = decode_geotiff(&bytes).unwrap().bounds();
    assert_approx_eq!(b.north, 37.4460, 1e-9);
    assert_approx_eq!(b.west, -122.1390, 1e-9);
}

#[test]
fn test_decode_web_mercator() {
    let side = 6_378_137.0 * 0.01_f64.to_radians();
    let georef = FixtureGeoref::spanning((0.0, 0.0), (side, side), 8, 8);
    let bytes = GeoTiffBuilder::projected(3857, georef).gray_f32(8, 8, &[0.0; 64]);

    let b = decode_geotiff(&bytes).unwrap().bounds();
    assert_approx_eq!(b.south, bounds::NULL_ISLAND.south, 1e-6);
    assert_approx_eq!(b.north, bounds::NULL_ISLAND.north, 1e-6);
    assert_approx_eq!(b.east, bounds::NULL_ISLAND.east, 1e-6);
}

#[test]
fn test_decode_transformation_matrix() {
    let (sw, ne) = (utm::PALO_ALTO_SW, utm::PALO_ALTO_NE);
    let (w, h) = (5, 5);
    #[rustfmt::skip]
    let matrix = [
        (ne.0 - sw.0) / w as f64, 0.0, 0.0, sw.0,
        0.0, -(ne.1 - sw.1) / h as f64, 0.0, ne.1,
        0.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ];
    let bytes = GeoTiffBuilder::projected(32610, FixtureGeoref::Matrix(matrix)).gray_f32(w, h, &[1.0; 25]);

    let b = decode_geotiff(&bytes).unwrap().bounds();
    assert_approx_eq!(b.south, bounds::PALO_ALTO.south, TOLERANCE_DEG);
    assert_approx_eq!(b.east, bounds::PALO_ALTO.east, TOLERANCE_DEG);
}

#[test]
fn test_decode_feet_transverse_mercator() {
    const FOOT: f64 = 0.3048;
    let geokeys = GeoKeyDirectoryBuilder::new()
        .short(keys::GT_MODEL_TYPE, 1)
        .short(keys::PROJECTED_CS_TYPE, 32767)
        .short(keys::GEOGRAPHIC_TYPE, 4326)
        .short(keys::PROJ_COORD_TRANS, 1)
        .short(keys::PROJ_LINEAR_UNITS, 9002)
        .double(keys::PROJ_NAT_ORIGIN_LAT, 0.0)
        .double(keys::PROJ_NAT_ORIGIN_LONG, -123.0)
        .double(keys::PROJ_SCALE_AT_NAT_ORIGIN, 0.9996)
        .double(keys::PROJ_FALSE_EASTING, 500000.0 / FOOT);
    let sw = (utm::PALO_ALTO_SW.0 / FOOT, utm::PALO_ALTO_SW.1 / FOOT);
    let ne = (utm::PALO_ALTO_NE.0 / FOOT, utm::PALO_ALTO_NE.1 / FOOT);
    let bytes = GeoTiffBuilder::new(FixtureGeoref::spanning(sw, ne, 4, 4), geokeys).gray_f32(4, 4, &[0.0; 16]);

    let b = decode_geotiff(&bytes).unwrap().bounds();
    assert_approx_eq!(b.north, bounds::PALO_ALTO.north, TOLERANCE_DEG);
    assert_approx_eq!(b.west, bounds::PALO_ALTO.west, TOLERANCE_DEG);
}

#[test]
fn test_missing_georeferencing_is_decode_failure() {
    let bytes = GeoTiffBuilder::projected(32610, FixtureGeoref::Missing).gray_f32(2, 2, &[0.0; 4]);
    assert!(matches!(decode_geotiff(&bytes), Err(RasterError::DecodeFailed(_))));
}

#[test]
fn test_unknown_crs_is_projection_failure() {
    let georef = FixtureGeoref::spanning((0.0, 0.0), (10.0, 10.0), 2, 2);
    let bytes = GeoTiffBuilder::projected(2227, georef).gray_f32(2, 2, &[0.0; 4]);
    assert!(matches!(decode_geotiff(&bytes), Err(RasterError::ProjectionFailed(_))));
}

#[test]
fn test_truncated_payload_is_decode_failure() {
    let georef = FixtureGeoref::spanning(utm::PALO_ALTO_SW, utm::PALO_ALTO_NE, 4, 4);
    let bytes = GeoTiffBuilder::projected(32610, georef).gray_f32(4, 4, &[0.0; 16]);
    assert!(matches!(
        decode_geotiff(&bytes[..20]),
        Err(RasterError::DecodeFailed(_))
    ));
}

#[test]
fn test_separate_planes_keep_every_band() {
    let red = [10, 11, 12, 13];
    let green = [100, 101, 102, 103];
    let blue = [200, 201, 202, 203];
    let georef = FixtureGeoref::spanning(utm::PALO_ALTO_SW, utm::PALO_ALTO_NE, 2, 2);
    let bytes =
        GeoTiffBuilder::projected(32610, georef).planar_rgb_u8(2, 2, &red, &green, &blue);

    let raster = decode_geotiff(&bytes).unwrap();
    assert_eq!((raster.width(), raster.height()), (2, 2));
    assert_eq!(raster.band_count(), 3);
    assert_eq!(raster.band(0).unwrap(), &[10.0, 11.0, 12.0, 13.0]);
    assert_eq!(raster.band(1).unwrap(), &[100.0, 101.0, 102.0, 103.0]);
    assert_eq!(raster.band(2).unwrap(), &[200.0, 201.0, 202.0, 203.0]);

    let b = raster.bounds();
    assert_approx_eq!(b.north, bounds::PALO_ALTO.north, TOLERANCE_DEG);
    assert_approx_eq!(b.west, bounds::PALO_ALTO.west, TOLERANCE_DEG);
}

#[test]
fn test_oversized_header_is_decode_failure() {
    let georef = FixtureGeoref::spanning(utm::PALO_ALTO_SW, utm::PALO_ALTO_NE, 100_000, 100_000);
    let bytes =
        GeoTiffBuilder::projected(32610, georef).declared_gray_u8(100_000, 100_000, &[0; 16]);
    assert!(matches!(
        decode_geotiff(&bytes),
        Err(RasterError::DecodeFailed(_))
    ));
}
