use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use regionmap::api::{AmapDistrictResolver, ReqwestTransport, StaticMapClient};
use regionmap::builder::{FitOutcome, Precision};
use regionmap::config::FileConfig;
use regionmap::domain::{Layers, MapSize, MapStyle};
use regionmap::download::{CancelFlag, DownloadOptions, DownloadPlan, MapDownloader};
use regionmap::output::FileSink;

/// Download static map images of an administrative region with its boundary
///
/// Examples:
///   # Whole district, zoom and size picked from the boundary
///   regionmap -r "吉州区"
///
///   # Satellite imagery at fixed zoom levels
///   regionmap -r "西湖区" --style satellite -z 12,14
///
///   # Plain map without the boundary, traffic layer on
///   regionmap -r "朝阳区" --no-boundary --traffic -s 2048*2048
///
///   # Use a config file
///   regionmap --config my-settings.toml
#[derive(Parser, Debug)]
#[command(name = "regionmap")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches regionmap.toml if not provided)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Region name (district, city or province)
    #[arg(short = 'r', long)]
    region: Option<String>,

    /// AMap web service key
    #[arg(long, env = "AMAP_API_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Output directory (defaults to ./maps)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Zoom levels, comma separated (defaults to the recommendation)
    #[arg(
        short = 'z',
        long,
        value_delimiter = ',',
        value_parser = clap::value_parser!(u8).range(3..=18)
    )]
    zoom: Option<Vec<u8>>,

    /// Canvas size as W*H (defaults to the recommendation)
    #[arg(short = 's', long)]
    size: Option<MapSize>,

    /// Base map style
    #[arg(long)]
    style: Option<MapStyle>,

    /// Show live traffic
    #[arg(long)]
    traffic: bool,

    /// Hide place name labels
    #[arg(long)]
    no_labels: bool,

    /// Do not draw the region boundary
    #[arg(long)]
    no_boundary: bool,

    /// Boundary detail: alternate (every other point), high (~500 points), ultra (~1000 points)
    #[arg(long)]
    precision: Option<Precision>,

    /// Starting simplification stride (overrides --precision)
    #[arg(long, value_parser = parse_stride)]
    stride: Option<usize>,

    /// Mark the administrative center
    #[arg(long)]
    marker: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let total_start = Instant::now();

    let file_config = match &args.config {
        Some(path) if path.exists() => {
            FileConfig::from_path(path).context(format!("Failed to load config file: {:?}", path))?
        }
        Some(path) => bail!("Config file not found: {:?}", path),
        None => FileConfig::load().unwrap_or_default(),
    };

    let Some(region) = args.region.clone().or_else(|| file_config.region.clone()) else {
        bail!("Must provide a region name with --region/-r or in the config file");
    };
    let Some(key) = args.key.clone().or_else(|| file_config.key.clone()) else {
        bail!("Must provide an AMap key with --key, AMAP_API_KEY or in the config file");
    };

    let provider = file_config.provider.clone();
    provider.validate().context("Invalid provider settings")?;

    let output = args.output.clone().unwrap_or_else(|| file_config.output.clone());
    let options = DownloadOptions {
        region: region.clone(),
        zoom_levels: args.zoom.clone().or_else(|| file_config.zoom.clone()),
        size: args.size.or(file_config.size),
        style: args.style.unwrap_or(file_config.style),
        layers: Layers {
            traffic: args.traffic || file_config.traffic,
            labels: !args.no_labels && file_config.labels,
        },
        show_boundary: !args.no_boundary && file_config.boundary,
        precision: args.precision.unwrap_or(file_config.precision),
        start_stride: args.stride.or(file_config.stride),
        mark_center: args.marker || file_config.marker,
    };

    println!("regionmap - Region Map Downloader");
    println!("=================================");
    println!();

    if args.verbose {
        println!("Configuration:");
        println!("  Region: {}", options.region);
        println!("  Style: {:?}", options.style);
        println!("  Traffic: {}", options.layers.traffic);
        println!("  Labels: {}", options.layers.labels);
        println!("  Boundary: {}", options.show_boundary);
        println!("  Precision: {:?}", options.precision);
        println!("  URL limit: {}", provider.max_url_length);
        println!("  Output: {}", output.display());
        println!();
    }

    let transport =
        ReqwestTransport::new(provider.timeout()).context("Failed to create HTTP client")?;
    let resolver =
        AmapDistrictResolver::new(transport.clone(), key.clone()).with_url(&provider.district_url);
    let client = StaticMapClient::new(
        transport,
        key,
        provider.max_url_length,
        provider.url_overhead,
    )
    .with_endpoint(&provider.static_map_url);
    let downloader = MapDownloader::new(resolver, client, provider);

    let spinner = create_spinner("Resolving region and fitting boundary...");
    let start = Instant::now();
    let plan = downloader
        .prepare(&options)
        .context(format!("Failed to prepare maps for {}", region))?;
    spinner.finish_with_message(format!(
        "Resolved: {} ({}) [{:.1}s]",
        plan.region.name,
        plan.region.adcode,
        start.elapsed().as_secs_f32()
    ));
    print_plan(&plan);

    let spinner = create_spinner(&format!("Downloading {} map(s)...", plan.requests.len()));
    let start = Instant::now();
    let mut sink = FileSink::new(&output);
    let report = downloader.execute(plan, &mut sink, &CancelFlag::new());
    spinner.finish_with_message(format!(
        "Downloaded {}/{} map(s) [{:.1}s]",
        report.saved().count(),
        report.outcomes.len(),
        start.elapsed().as_secs_f32()
    ));

    println!();
    for (zoom, path) in report.saved() {
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        println!(
            "  saved   {:<10} {} ({:.2} MB)",
            describe_zoom(zoom),
            path.display(),
            size as f64 / (1024.0 * 1024.0)
        );
    }
    for (zoom, err) in report.failed() {
        println!("  failed  {:<10} {}", describe_zoom(zoom), err);
    }

    println!();
    println!(
        "Done! Total time: {:.1}s",
        total_start.elapsed().as_secs_f32()
    );

    if report.saved().count() == 0 {
        bail!("No map could be downloaded for {}", region);
    }

    Ok(())
}

fn print_plan(plan: &DownloadPlan) {
    match &plan.analysis {
        Some(a) => {
            println!(
                "  Boundary: {} points, {:.1} km x {:.1} km",
                a.point_count, a.lon_span_km, a.lat_span_km
            );
            println!(
                "  Recommended: zoom {}-{}, {}",
                a.zoom_range.min, a.zoom_range.max, a.image_size
            );
        }
        None => println!("  Boundary: none available, drawing plain maps"),
    }

    match &plan.fit {
        Some(FitOutcome::Fitted(overlay)) => println!(
            "  Overlay: {} -> {} points (stride {}, ~{} chars)",
            overlay.original_points, overlay.points, overlay.stride, overlay.estimated_length
        ),
        Some(FitOutcome::Exhausted { last_stride }) => println!(
            "  Overlay: does not fit the URL limit up to stride {}, drawing without it",
            last_stride
        ),
        None => {}
    }
}

fn parse_stride(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("stride must be at least 1".to_string()),
        Ok(stride) => Ok(stride),
        Err(e) => Err(format!("invalid stride {:?}: {}", value, e)),
    }
}

fn describe_zoom(zoom: Option<u8>) -> String {
    match zoom {
        Some(z) => format!("zoom {}", z),
        None => "auto-fit".to_string(),
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "regionmap=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stride() {
        assert_eq!(parse_stride("3"), Ok(3));
        assert!(parse_stride("0").is_err());
        assert!(parse_stride("-1").is_err());
        assert!(parse_stride("99999999999999999999999").is_err());
    }

    #[test]
    fn test_stride_flag() {
        let args = Args::try_parse_from(["regionmap", "-r", "X", "--stride", "4"]).unwrap();
        assert_eq!(args.stride, Some(4));
        assert!(Args::try_parse_from(["regionmap", "--stride", "0"]).is_err());
    }
}
