//! ChromaQuant CLI - Color Quantization Engine
//!
//! Command-line interface for quantizing images and inspecting their palettes.

use chromaquant::config::COLOR_DIMENSION;
use chromaquant::imaging::{self, format_hex, parse_hex_color};
use chromaquant::{
    quantize, Algorithm, Config, ImageConfig, QuantError, Quantization, QuantizationSummary,
    Quantizer, QuantizerConfig, Result, Rgb,
};
use clap::{Args, Parser, Subcommand};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "chromaquant")]
#[command(author = "ChromaQuant Contributors")]
#[command(version)]
#[command(about = "Color Quantization Engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Quantize an image and save the result
    Quantize {
        /// Input image
        #[arg(short, long)]
        input: PathBuf,

        /// Output image (format chosen from the extension)
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        training: TrainingArgs,

        /// Recolor a palette entry after quantizing, e.g. 3=#ff0000 (repeatable)
        #[arg(long = "edit", value_parser = parse_edit)]
        edits: Vec<(usize, Rgb)>,
    },

    /// Train on an image and print the learned palette
    Palette {
        /// Input image
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        training: TrainingArgs,
    },
}

#[derive(Args)]
struct TrainingArgs {
    /// Quantization algorithm (som, mini-batch-k-means)
    #[arg(short, long, default_value = "som")]
    algorithm: Algorithm,

    /// Number of training epochs
    #[arg(short, long, default_value = "500")]
    epochs: usize,

    /// SOM grid width
    #[arg(long, default_value = "4")]
    width: usize,

    /// SOM grid height
    #[arg(long, default_value = "4")]
    height: usize,

    /// Number of K-Means clusters
    #[arg(short, default_value = "16")]
    k: usize,

    /// Random seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,

    /// Background for transparent pixels
    #[arg(short, long, default_value = "#ffffff", value_parser = parse_hex_color)]
    background: Rgb,
}

impl TrainingArgs {
    fn to_config(&self) -> Config {
        Config {
            quantizer: QuantizerConfig {
                algorithm: self.algorithm,
                epochs: self.epochs,
                map_width: self.width,
                map_height: self.height,
                k: self.k,
                seed: self.seed,
            },
            image: ImageConfig {
                background: self.background,
                ..Default::default()
            },
        }
    }
}

/// Parses `INDEX=#RRGGBB`.
fn parse_edit(s: &str) -> Result<(usize, Rgb)> {
    let (index, color) = s
        .split_once('=')
        .ok_or_else(|| QuantError::Config(format!("invalid edit '{}', expected INDEX=#RRGGBB", s)))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|e| QuantError::Config(format!("invalid palette index in '{}': {}", s, e)))?;
    Ok((index, parse_hex_color(color)?))
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let result = match cli.command {
        Commands::Quantize {
            input,
            output,
            training,
            edits,
        } => quantize_image(input, output, training.to_config(), edits),

        Commands::Palette { input, training } => show_palette(input, training.to_config()),
    };

    if let Err(e) = result {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Loads, trains and quantizes. Shared by both subcommands.
fn train_and_quantize(input: &Path, config: &Config) -> Result<(Box<dyn Quantizer>, Quantization)> {
    config.validate()?;

    let image = imaging::load_with_config(input, &config.image)?;
    let extraction = imaging::extract_colors(&image);
    println!(
        "✓ Loaded {} ({}x{}, {} distinct colors)",
        input.display(),
        extraction.width,
        extraction.height,
        format_number(extraction.unique_colors)
    );
    config.quantizer.ensure_enough_colors(extraction.unique_colors)?;

    let mut quantizer = config.quantizer.build(COLOR_DIMENSION)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!(
        "Training {} ({} units, {} epochs)...",
        config.quantizer.algorithm,
        config.quantizer.unit_count(),
        config.quantizer.epochs
    ));
    pb.enable_steady_tick(Duration::from_millis(100));

    let start = Instant::now();
    let report = quantizer.train(&extraction.colors, config.quantizer.epochs);
    pb.finish_and_clear();
    let report = report?;

    println!(
        "✓ Trained {} in {} ({} epochs, batch size {}{})",
        config.quantizer.algorithm,
        HumanDuration(start.elapsed()),
        report.epochs_run,
        report.batch_size,
        if report.converged { ", converged" } else { "" }
    );

    let result = quantize(quantizer.as_ref(), &extraction.colors, extraction.width)?;
    info!(
        "Recolored with {} nearest-unit searches",
        format_number(result.lookups())
    );

    Ok((quantizer, result))
}

fn quantize_image(input: PathBuf, output: PathBuf, config: Config, edits: Vec<(usize, Rgb)>) -> Result<()> {
    let (mut quantizer, mut result) = train_and_quantize(&input, &config)?;

    let units = quantizer.units();
    for (index, color) in edits {
        let unit = *units.get(index).ok_or_else(|| {
            QuantError::InvalidArgument(format!(
                "palette index {} out of range, quantizer has {} units",
                index,
                units.len()
            ))
        })?;
        let repainted = result.recolor_unit(quantizer.as_mut(), unit, color)?;
        println!(
            "✓ Recolored entry {} to {} ({} pixels)",
            index,
            format_hex(color),
            format_number(repainted)
        );
    }

    imaging::save(&imaging::to_image(&result)?, &output)?;

    println!();
    println!("Saved: {}", output.display());
    print!("{}", QuantizationSummary::from(&result));

    Ok(())
}

fn show_palette(input: PathBuf, config: Config) -> Result<()> {
    let (quantizer, result) = train_and_quantize(&input, &config)?;

    println!();
    println!("{:>5}  {:<7}  {:>10}", "index", "color", "pixels");
    for entry in result.palette(quantizer.as_ref())? {
        println!(
            "{:>5}  {:<7}  {:>10}",
            entry.unit.index(),
            format_hex(entry.color),
            format_number(entry.pixel_count)
        );
    }
    println!();
    print!("{}", QuantizationSummary::from(&result));

    Ok(())
}

/// Formats a number with thousands separators.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_edit() {
        assert_eq!(parse_edit("3=#ff0000").unwrap(), (3, [255, 0, 0]));
        assert_eq!(parse_edit("0=00ff00").unwrap(), (0, [0, 255, 0]));
        assert!(parse_edit("#ff0000").is_err());
        assert!(parse_edit("x=#ff0000").is_err());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(7), "7");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_cli_parses_quantize() {
        let cli = Cli::try_parse_from([
            "chromaquant", "quantize", "-i", "in.png", "-o", "out.png",
            "--algorithm", "mini-batch-k-means", "-k", "8", "--edit", "1=#000000",
        ])
        .unwrap();
        match cli.command {
            Commands::Quantize { training, edits, .. } => {
                let config = training.to_config();
                assert_eq!(config.quantizer.algorithm, Algorithm::MiniBatchKMeans);
                assert_eq!(config.quantizer.k, 8);
                assert_eq!(config.image.background, [255, 255, 255]);
                assert_eq!(edits, vec![(1, [0, 0, 0])]);
            }
            Commands::Palette { .. } => panic!("expected quantize"),
        }
    }
}
