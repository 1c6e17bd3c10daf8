#![cfg_attr(not(windows), allow(dead_code))]

mod adapter;
mod config;
#[cfg(windows)]
mod d3d11;
mod desktop;
mod error;
mod pattern;
mod share;
mod stats;
mod traits;
mod transfer;

use std::path::{Path, PathBuf};
use std::time::Duration;

use bytesize::ByteSize;
use clap::{Parser, Subcommand};
use log::LevelFilter;

use adapter::Vendor;
use config::{TransferConfig, Variant};
use error::ProbeError;

#[cfg(windows)]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(windows)]
use std::sync::Arc;

#[cfg(windows)]
use indicatif::{ProgressBar, ProgressStyle};
#[cfg(windows)]
use log::{debug, warn};

#[cfg(windows)]
use d3d11::{transfer_targets, D3d11Transfer};
#[cfg(windows)]
use transfer::BenchRun;

#[derive(Parser, Debug)]
#[command(author, version, about = "Direct3D11 transfer, sharing and desktop probes", long_about = None)]
struct Args {
    /// Log driver calls and probe steps
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Time one upload, readback and device copy: [w h all]
    Transfer {
        #[arg(value_name = "ARGS", allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Average repeated transfers: [w h count all]
    Bench {
        #[arg(value_name = "ARGS", allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Open a shared texture across devices of one vendor
    Share {
        #[arg(long, value_enum, default_value_t = Vendor::Amd)]
        vendor: Vendor,
    },

    /// Clear and restore the desktop wallpaper
    Wallpaper {
        /// Image shown before the wallpaper is cleared
        #[arg(long)]
        image: Option<PathBuf>,

        /// Pause between steps (e.g., '5s', '500ms')
        #[arg(long, default_value = "5s", value_parser = parse_delay)]
        delay: Duration,
    },

    /// Shift and restore the desktop background colour
    SysColor {
        /// Pause between steps (e.g., '10s')
        #[arg(long, default_value = "10s", value_parser = parse_delay)]
        delay: Duration,
    },

    /// List DXGI adapters and exit
    ListAdapters {
        #[arg(long, value_enum)]
        vendor: Option<Vendor>,
    },
}

fn parse_delay(s: &str) -> Result<Duration, humantime::DurationError> {
    humantime::parse_duration(s)
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let result = match &args.command {
        Command::Transfer { args } => run_transfer(args, Variant::Single),
        Command::Bench { args } => run_transfer(args, Variant::Repeated),
        Command::Share { vendor } => run_share(*vendor),
        Command::Wallpaper { image, delay } => run_wallpaper(image.as_deref(), *delay),
        Command::SysColor { delay } => run_sys_color(*delay),
        Command::ListAdapters { vendor } => run_list_adapters(*vendor),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

/// Parses the positionals, prints the run header and runs the variant on
/// every target adapter.
fn run_transfer(positional: &[String], variant: Variant) -> Result<(), ProbeError> {
    let config = match TransferConfig::from_positional(positional, variant) {
        Ok(config) => config,
        Err(e) => {
            println!("{}", variant.usage());
            return Err(e);
        }
    };

    match variant {
        Variant::Single => println!(
            "width: {} height: {} all:{}",
            config.extent.width, config.extent.height, config.all_adapters
        ),
        Variant::Repeated => println!(
            "width: {} height: {} count: {} all:{}",
            config.extent.width, config.extent.height, config.iterations, config.all_adapters
        ),
    }
    println!(
        "texture: {} per transfer",
        ByteSize::b(config.extent.byte_len() as u64)
    );

    transfer_on_adapters(&config, variant)
}

#[cfg(windows)]
fn transfer_on_adapters(config: &TransferConfig, variant: Variant) -> Result<(), ProbeError> {
    let targets = transfer_targets(config.all_adapters)?;

    let should_stop = Arc::new(AtomicBool::new(false));
    if variant == Variant::Repeated {
        let should_stop_clone = Arc::clone(&should_stop);
        if let Err(e) = ctrlc::set_handler(move || should_stop_clone.store(true, Ordering::Relaxed))
        {
            warn!("Ctrl-C handler not installed: {}", e);
        }
    }

    let mut bench = BenchRun::new(config.iterations);
    let mut failed = 0;
    for target in &targets {
        if let Some(adapter) = target {
            println!();
            println!("Adapter {}: {}", adapter.info.index + 1, adapter.info.name);
        }

        let result = D3d11Transfer::new(target.as_ref(), config.extent).and_then(|device| {
            match variant {
                Variant::Single => {
                    let image = pattern::GradientImage::new(config.extent);
                    let timings = transfer::run_pass(&device, &image)?;
                    print!("{}", timings);
                }
                Variant::Repeated => bench_device(&mut bench, &device, &should_stop)?,
            }
            Ok(())
        });

        if let Err(e) = result {
            eprintln!("Error: {}", e);
            failed += 1;
        }
        if should_stop.load(Ordering::Relaxed) {
            break;
        }
    }

    match failed {
        0 => Ok(()),
        _ => Err(ProbeError::AdapterFailures {
            failed,
            total: targets.len(),
        }),
    }
}

#[cfg(windows)]
fn bench_device(
    bench: &mut BenchRun,
    device: &D3d11Transfer,
    should_stop: &AtomicBool,
) -> Result<(), ProbeError> {
    use traits::TransferDevice;

    let pb = ProgressBar::new(bench.iterations() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} passes | {msg}")
            .unwrap()
            .progress_chars("=> "),
    );
    pb.set_message(device.description());

    let result = bench.run(device, should_stop, &pb);
    pb.finish_and_clear();
    let averages = result?;

    if averages.passes < bench.iterations() as u64 {
        println!(
            "interrupted: averaging {} of {} passes",
            averages.passes,
            bench.iterations()
        );
    }
    let totals = bench.totals();
    debug!(
        "totals over {} passes: h2d {}us, d2h {}us (copy {}us, map {}us), d2d {}us",
        totals.passes(),
        totals.host_to_device_us(),
        totals.download_total_us(),
        totals.download_copy_us(),
        totals.download_map_us(),
        totals.device_to_device_us()
    );
    print!("{}", averages);
    Ok(())
}

#[cfg(not(windows))]
fn transfer_on_adapters(_config: &TransferConfig, variant: Variant) -> Result<(), ProbeError> {
    Err(ProbeError::Unsupported(variant.command()))
}

#[cfg(windows)]
fn run_share(vendor: Vendor) -> Result<(), ProbeError> {
    println!("vendor: {} (0x{:04X})", vendor, vendor.id());
    d3d11::run_share_probe(vendor)
}

#[cfg(not(windows))]
fn run_share(_vendor: Vendor) -> Result<(), ProbeError> {
    Err(ProbeError::Unsupported("share"))
}

#[cfg(windows)]
fn run_wallpaper(image: Option<&Path>, delay: Duration) -> Result<(), ProbeError> {
    desktop::run_wallpaper_probe(image, delay)
}

#[cfg(not(windows))]
fn run_wallpaper(_image: Option<&Path>, _delay: Duration) -> Result<(), ProbeError> {
    Err(ProbeError::Unsupported("wallpaper"))
}

#[cfg(windows)]
fn run_sys_color(delay: Duration) -> Result<(), ProbeError> {
    desktop::run_sys_color_probe(delay)
}

#[cfg(not(windows))]
fn run_sys_color(_delay: Duration) -> Result<(), ProbeError> {
    Err(ProbeError::Unsupported("sys-color"))
}

#[cfg(windows)]
fn run_list_adapters(vendor: Option<Vendor>) -> Result<(), ProbeError> {
    let adapters: Vec<_> = d3d11::enumerate_adapters()?
        .into_iter()
        .filter(|a| vendor.map_or(true, |v| a.info.vendor_id == v.id()))
        .collect();

    if adapters.is_empty() {
        println!("No adapters found.");
    } else {
        println!("Available adapters:");
        for adapter in &adapters {
            println!("  {}", adapter.info);
        }
        println!();
        println!("Use `transfer ... true` or `bench ... true` to probe every adapter");
    }
    Ok(())
}

#[cfg(not(windows))]
fn run_list_adapters(_vendor: Option<Vendor>) -> Result<(), ProbeError> {
    Err(ProbeError::Unsupported("list-adapters"))
}
