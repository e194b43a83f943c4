//! Command line access to a stored camera calibration.
//!
//! Usage:
//! ```bash
//! cargo run -- --calibration samples/camera_calibration.yaml undistort --x 10 --y 20
//! cargo run -- --calibration samples/camera_calibration.yaml bounds --width 752 --height 480
//! ```

use camcalib::{CameraCalibration, Rect};
use clap::{Parser, Subcommand};
use flexi_logger::Logger;
use log::info;
use nalgebra::Vector2;
use std::path::{Path, PathBuf};

/// Distort and undistort points or compute undistortion crop rectangles
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the calibration YAML file
    #[arg(short = 'c', long)]
    calibration: PathBuf,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Map an ideal pixel to its distorted location
    Distort {
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
    },
    /// Map a distorted pixel back to its ideal location
    Undistort {
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
    },
    /// Outer and inner undistorted rectangles of a pixel rectangle
    Bounds {
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        y: f64,
        #[arg(long)]
        width: f64,
        #[arg(long)]
        height: f64,
    },
}

fn print_point(label: &str, point: &Vector2<f64>, json: bool) {
    if json {
        let mut object = serde_json::Map::new();
        object.insert(label.to_string(), serde_json::json!([point.x, point.y]));
        println!("{}", serde_json::Value::Object(object));
    } else {
        println!("{label}: ({}, {})", point.x, point.y);
    }
}

fn calibration_path(path: &Path) -> Result<&str, String> {
    path.to_str()
        .ok_or_else(|| format!("Calibration path is not valid UTF-8: {}", path.display()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _logger = Logger::try_with_env_or_str("info")?.log_to_stderr().start()?;

    let cli = Cli::parse();
    let path = calibration_path(&cli.calibration)?;
    let calibration = CameraCalibration::load_from_yaml(path)?;
    if !calibration.has_intrinsics() {
        info!("{} has no intrinsics, using the identity", path);
    }

    match cli.command {
        Command::Distort { x, y } => {
            print_point("distorted", &calibration.distort(&Vector2::new(x, y)), cli.json);
        }
        Command::Undistort { x, y } => {
            print_point("undistorted", &calibration.undistort(&Vector2::new(x, y)), cli.json);
        }
        Command::Bounds {
            x,
            y,
            width,
            height,
        } => {
            let bounds = calibration.bounds_for(&Rect::new(x, y, width, height));
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&bounds)?);
            } else {
                println!("outer: {}", bounds.outer);
                println!("inner: {}", bounds.inner);
            }
        }
    }

    Ok(())
}
