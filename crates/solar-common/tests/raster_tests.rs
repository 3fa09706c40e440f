//! Tests for GeoRaster construction and accessors.

use solar_common::{GeoRaster, GeoRectangle, RasterShapeError};

fn bounds() -> GeoRectangle {
    GeoRectangle::new(37.45, 37.44, -122.13, -122.14)
}

#[test]
fn test_raster_new_valid() {
    let raster = GeoRaster::new(3, 2, vec![vec![0.0; 6], vec![1.0; 6]], bounds()).unwrap();
    assert_eq!(raster.width(), 3);
    assert_eq!(raster.height(), 2);
    assert_eq!(raster.band_count(), 2);
    assert_eq!(raster.pixel_count(), 6);
    assert_eq!(raster.band(1).unwrap()[5], 1.0);
    assert!(raster.band(2).is_none());
    assert_eq!(raster.bounds(), bounds());
}

#[test]
fn test_raster_rejects_short_band() {
    let err = GeoRaster::new(3, 2, vec![vec![0.0; 6], vec![0.0; 5]], bounds()).unwrap_err();
    assert_eq!(
        err,
        RasterShapeError::BandLength {
            band: 1,
            expected: 6,
            actual: 5
        }
    );
}

#[test]
fn test_raster_rejects_empty() {
    assert_eq!(
        GeoRaster::new(0, 2, vec![vec![]], bounds()).unwrap_err(),
        RasterShapeError::EmptyDimensions { width: 0, height: 2 }
    );
    assert_eq!(
        GeoRaster::new(2, 2, vec![], bounds()).unwrap_err(),
        RasterShapeError::NoBands
    );
}

#[test]
fn test_raster_sample() {
    let data: Vec<f32> = (0..6).map(|i| i as f32).collect();
    let raster = GeoRaster::new(3, 2, vec![data], bounds()).unwrap();
    assert_eq!(raster.sample(0, 2, 1), Some(5.0));
    assert_eq!(raster.sample(0, 3, 0), None);
    assert_eq!(raster.sample(1, 0, 0), None);
}

#[test]
fn test_with_bands_keeps_grid() {
    let raster = GeoRaster::new(2, 2, vec![vec![0.0; 4]], bounds()).unwrap();
    let rgb = raster
        .with_bands(vec![vec![1.0; 4], vec![2.0; 4], vec![3.0; 4]])
        .unwrap();
    assert_eq!(rgb.band_count(), 3);
    assert_eq!(rgb.bounds(), raster.bounds());
    assert!(raster.with_bands(vec![vec![1.0; 3]]).is_err());
}

#[test]
fn test_geo_point_json_shape() {
    let point = solar_common::GeoPoint::new(1.5, -2.5);
    let json = serde_json::to_value(point).unwrap();
    assert_eq!(json["lat"], 1.5);
    assert_eq!(json["lng"], -2.5);
}

#[test]
fn test_raster_rejects_inverted_bounds() {
    let flipped = GeoRectangle::new(37.44, 37.45, -122.13, -122.14);
    assert_eq!(
        GeoRaster::new(2, 2, vec![vec![0.0; 4]], flipped).unwrap_err(),
        RasterShapeError::InvertedBounds(flipped)
    );

    let across_antimeridian = GeoRectangle::new(1.0, 0.0, -179.9, 179.9);
    assert!(GeoRaster::new(2, 2, vec![vec![0.0; 4]], across_antimeridian).is_err());
}
