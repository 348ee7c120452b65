use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use regionmap::MapError;
use regionmap::api::{HttpResponse, HttpTransport, RegionResolver, StaticMapClient};
use regionmap::builder::FitOutcome;
use regionmap::config::ProviderConfig;
use regionmap::domain::{Coordinate, MapSize, Region};
use regionmap::download::{CancelFlag, DownloadOptions, DownloadedMap, MapDownloader, MapSink};
use regionmap::geometry::ZoomRange;

type Query = Vec<(String, String)>;

/// Answers every request with a tiny PNG and remembers the query.
#[derive(Default)]
struct ImageServer {
    queries: Mutex<Vec<Query>>,
}

impl HttpTransport for ImageServer {
    fn get(&self, _url: &str, query: &[(&str, String)]) -> Result<HttpResponse, MapError> {
        self.queries.lock().unwrap().push(
            query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        );
        Ok(HttpResponse {
            status: 200,
            content_type: Some("image/png".to_string()),
            body: b"\x89PNG\r\n\x1a\n".to_vec(),
        })
    }
}

struct OneRegion(Region);

impl RegionResolver for OneRegion {
    fn resolve(&self, name: &str) -> Result<Region, MapError> {
        if name == self.0.name {
            Ok(self.0.clone())
        } else {
            Err(MapError::RegionNotFound(name.to_string()))
        }
    }
}

#[derive(Default)]
struct Collect(Vec<DownloadedMap>);

impl MapSink for Collect {
    fn store(&mut self, _region: &Region, map: DownloadedMap) -> Result<PathBuf, MapError> {
        self.0.push(map);
        Ok(PathBuf::from(format!("{}.png", self.0.len())))
    }
}

fn value<'a>(query: &'a Query, key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn downloader(
    region: Region,
    server: &Arc<ImageServer>,
    config: ProviderConfig,
) -> MapDownloader<OneRegion, Arc<ImageServer>> {
    let client = StaticMapClient::new(
        Arc::clone(server),
        "test-key",
        config.max_url_length,
        config.url_overhead,
    );
    MapDownloader::new(OneRegion(region), client, config)
}

#[test]
fn small_square_region_gets_single_fitted_request() {
    // ~5 km square, four corners, ring left open
    let region = Region {
        name: "X".to_string(),
        adcode: "000001".to_string(),
        level: Some("district".to_string()),
        center: Some(Coordinate::new(100.02, 10.02)),
        polyline: Some("100.0,10.0;100.045,10.0;100.045,10.045;100.0,10.045".to_string()),
    };
    let server = Arc::new(ImageServer::default());
    let config = ProviderConfig {
        request_delay_ms: 0,
        ..ProviderConfig::default()
    };
    let d = downloader(region, &server, config);

    let options = DownloadOptions {
        start_stride: Some(1),
        ..DownloadOptions::new("X")
    };
    let mut sink = Collect::default();
    let report = d.download(&options, &mut sink, &CancelFlag::new()).unwrap();

    let analysis = report.plan.analysis.as_ref().unwrap();
    assert!((analysis.max_span_km - 5.0).abs() < 0.1);
    assert_eq!(analysis.zoom_range, ZoomRange::new(16, 18));
    assert_eq!(analysis.image_size, MapSize::SMALL);

    let overlay = report.plan.overlay().unwrap();
    assert_eq!(overlay.stride, 1);
    assert_eq!(overlay.points, 5);

    assert_eq!(sink.0.len(), 1);
    let queries = server.queries.lock().unwrap();
    assert_eq!(queries.len(), 1);

    let paths = value(&queries[0], "paths").unwrap();
    let (style, coords) = paths.split_once(':').unwrap();
    assert_eq!(style, "8,0x0000FF,1,,");
    let points: Vec<_> = coords.split(';').collect();
    assert_eq!(points.len(), 5);
    assert_eq!(points.first(), points.last());

    assert_eq!(value(&queries[0], "size"), Some("512*512"));
    assert!(value(&queries[0], "location").is_none());
    assert!(value(&queries[0], "zoom").is_none());
}

#[test]
fn oversized_boundary_falls_back_to_plain_map() {
    let n = 10_000;
    let polyline = (0..n)
        .map(|i| {
            let angle = i as f64 / n as f64 * std::f64::consts::TAU;
            format!("{},{}", 115.0 + angle.cos() * 0.5, 27.0 + angle.sin() * 0.5)
        })
        .collect::<Vec<_>>()
        .join(";");

    let region = Region {
        name: "Big".to_string(),
        adcode: "000002".to_string(),
        level: None,
        center: Some(Coordinate::new(115.1, 27.1)),
        polyline: Some(polyline),
    };
    let server = Arc::new(ImageServer::default());
    let config = ProviderConfig {
        request_delay_ms: 0,
        max_url_length: 1000,
        max_stride: 10,
        ..ProviderConfig::default()
    };
    let d = downloader(region, &server, config);

    let options = DownloadOptions {
        start_stride: Some(1),
        ..DownloadOptions::new("Big")
    };
    let report = d
        .download(&options, &mut Collect::default(), &CancelFlag::new())
        .unwrap();

    assert_eq!(
        report.plan.fit,
        Some(FitOutcome::Exhausted { last_stride: 10 })
    );
    let analysis = report.plan.analysis.as_ref().unwrap();
    assert_eq!(analysis.zoom_range, ZoomRange::new(8, 10));

    let queries = server.queries.lock().unwrap();
    assert!(!queries.is_empty());
    for query in queries.iter() {
        assert!(value(query, "paths").is_none());
        assert_eq!(
            value(query, "location"),
            Some(analysis.centroid.to_string().as_str())
        );
        let zoom: u8 = value(query, "zoom").unwrap().parse().unwrap();
        assert!(zoom == analysis.zoom_range.min || zoom == analysis.zoom_range.max);
    }
    assert_eq!(value(&queries[0], "zoom"), Some("8"));
    assert_eq!(report.saved().count(), queries.len());
}

#[test]
fn unknown_region_propagates() {
    let region = Region {
        name: "X".to_string(),
        adcode: "000001".to_string(),
        level: None,
        center: None,
        polyline: None,
    };
    let server = Arc::new(ImageServer::default());
    let d = downloader(region, &server, ProviderConfig::default());

    let err = d.prepare(&DownloadOptions::new("Y")).unwrap_err();
    assert!(matches!(err, MapError::RegionNotFound(name) if name == "Y"));
    assert!(server.queries.lock().unwrap().is_empty());
}
