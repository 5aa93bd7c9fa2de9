//! mssim CLI - Structural similarity for greyscale images
//!
//! Compare two images and compute a mean SSIM score.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, ColorChoice, Parser, ValueEnum};
use colored::Colorize;
use image::DynamicImage;
use mssim::{compute_mssim, MssimParams};
use serde::Serialize;

/// Mean structural similarity (MSSIM) image metric
///
/// Computes the structural similarity between two images after
/// converting them to greyscale. Higher scores mean the images are
/// more similar. A score of 1.0 means identical structure.
///
/// Score interpretation:
///   1.0        - Identical images
///   0.99 - 1.0 - Imperceptible difference
///   0.95 - 0.99 - Barely noticeable
///   0.90 - 0.95 - Noticeable but acceptable
///   0.70 - 0.90 - Clearly visible degradation
///   below 0.70 - Severe structural difference
#[derive(Parser, Debug)]
#[command(name = "mssim")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    Compare two images:
        mssim original.png compressed.jpg

    Show quality rating with colors:
        mssim -q original.png compressed.jpg

    CI mode - fail if score drops below threshold:
        mssim --min-ssim 0.95 original.png compressed.jpg

    Compare all PNGs in two directories:
        mssim --batch dir1/ dir2/

    Output JSON for scripting:
        mssim --json original.png compressed.jpg

    Smaller window for more local sensitivity:
        mssim --window-size 7 original.png compressed.jpg

EXIT CODES:
    0 - Success (score met threshold if --min-ssim specified)
    1 - Score fell below threshold (--min-ssim)
    2 - Error (file not found, invalid image, etc.)")]
struct Cli {
    /// Reference image or directory (original/source)
    #[arg(value_name = "REFERENCE")]
    reference: PathBuf,

    /// Distorted image or directory (compressed/modified)
    #[arg(value_name = "DISTORTED")]
    distorted: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Output JSON (shorthand for --format json)
    #[arg(long, conflicts_with = "format")]
    json: bool,

    /// Show quality rating with colors (shorthand for --format quality)
    #[arg(short, long, conflicts_with = "format")]
    quality: bool,

    /// Minimum acceptable score (exit code 1 if not met)
    ///
    /// Useful for CI pipelines to enforce quality floors.
    /// Common thresholds: 0.99 (excellent), 0.95 (good), 0.90 (acceptable)
    #[arg(long, value_name = "SCORE")]
    min_ssim: Option<f64>,

    /// Batch mode: compare matching files in two directories
    #[arg(long, short = 'b')]
    batch: bool,

    /// File extensions to include in batch mode (comma-separated)
    #[arg(
        long,
        default_value = "png,jpg,jpeg,webp,gif,bmp,pgm,pnm",
        value_delimiter = ','
    )]
    extensions: Vec<String>,

    /// Sliding-window size in pixels
    ///
    /// Larger windows give more stable local statistics; smaller
    /// windows react to more localized differences.
    #[arg(long, default_value = "11", value_name = "PIXELS")]
    window_size: usize,

    /// Luminance stability constant k1
    #[arg(long, default_value = "0.01", value_name = "FACTOR")]
    k1: f64,

    /// Contrast stability constant k2
    #[arg(long, default_value = "0.03", value_name = "FACTOR")]
    k2: f64,

    /// Quiet mode - only output the score number
    #[arg(long, short = 's', action = ArgAction::SetTrue)]
    quiet: bool,

    /// Control color output
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,

    /// Continue on errors in batch mode
    #[arg(long)]
    keep_going: bool,

    /// Show summary statistics in batch mode
    #[arg(long)]
    summary: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Plain text output with score
    Text,
    /// JSON output with all metrics
    Json,
    /// Include quality rating interpretation (with colors)
    Quality,
    /// Minimal - just the score number
    Score,
}

#[derive(Serialize)]
struct JsonOutput {
    score: f64,
    quality_rating: String,
    quality_description: String,
    reference: String,
    distorted: String,
    width: u32,
    height: u32,
    bit_depth: u32,
    params: JsonParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold_met: Option<bool>,
}

#[derive(Serialize)]
struct JsonParams {
    window_size: usize,
    k1: f64,
    k2: f64,
}

#[derive(Serialize)]
struct BatchJsonOutput {
    results: Vec<JsonOutput>,
    summary: BatchSummary,
}

#[derive(Serialize)]
struct BatchSummary {
    total: usize,
    passed: usize,
    failed: usize,
    errors: usize,
    min_score: f64,
    max_score: f64,
    mean_score: f64,
}

struct Scored {
    score: f64,
    width: u32,
    height: u32,
    bit_depth: u32,
}

struct ComparisonResult {
    reference: PathBuf,
    distorted: PathBuf,
    result: Result<Scored, String>,
}

/// Greyscale pixel data at its source bit depth.
enum LumaImage {
    Eight(Vec<u8>),
    Sixteen(Vec<u16>),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_colors(&cli);

    if cli.batch || (cli.reference.is_dir() && cli.distorted.is_dir()) {
        run_batch(&cli)
    } else {
        run_single(&cli)
    }
}

fn setup_colors(cli: &Cli) {
    match cli.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {
            if !io::stdout().is_terminal() {
                colored::control::set_override(false);
            }
        }
    }
}

fn run_single(cli: &Cli) -> ExitCode {
    match compare_images(cli, &cli.reference, &cli.distorted) {
        Ok(scored) => {
            if let Err(e) = output_single_result(cli, &scored) {
                if !cli.quiet {
                    eprintln!("{}: {}", "error".red().bold(), e);
                }
                return ExitCode::from(2);
            }

            if let Some(min_ssim) = cli.min_ssim {
                if scored.score < min_ssim {
                    return ExitCode::from(1);
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            if !cli.quiet {
                eprintln!("{}: {}", "error".red().bold(), e);
            }
            ExitCode::from(2)
        }
    }
}

fn run_batch(cli: &Cli) -> ExitCode {
    if !cli.reference.is_dir() {
        eprintln!(
            "{}: reference path '{}' is not a directory",
            "error".red().bold(),
            cli.reference.display()
        );
        return ExitCode::from(2);
    }
    if !cli.distorted.is_dir() {
        eprintln!(
            "{}: distorted path '{}' is not a directory",
            "error".red().bold(),
            cli.distorted.display()
        );
        return ExitCode::from(2);
    }

    let pairs = match find_matching_files(&cli.reference, &cli.distorted, &cli.extensions) {
        Ok(pairs) => pairs,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            return ExitCode::from(2);
        }
    };

    if pairs.is_empty() {
        eprintln!(
            "{}: no matching image files found",
            "warning".yellow().bold()
        );
        return ExitCode::from(2);
    }

    let mut results: Vec<ComparisonResult> = Vec::new();
    let mut had_errors = false;
    let mut threshold_missed = false;

    for (ref_path, dist_path) in &pairs {
        let comparison = compare_images(cli, ref_path, dist_path);

        if let Err(ref e) = comparison {
            had_errors = true;
            if !cli.keep_going {
                eprintln!("{}: {}: {}", "error".red().bold(), ref_path.display(), e);
                return ExitCode::from(2);
            }
        }

        if let Ok(ref scored) = comparison {
            if let Some(min_ssim) = cli.min_ssim {
                if scored.score < min_ssim {
                    threshold_missed = true;
                }
            }
        }

        results.push(ComparisonResult {
            reference: ref_path.clone(),
            distorted: dist_path.clone(),
            result: comparison,
        });
    }

    if let Err(e) = output_batch_results(cli, &results) {
        eprintln!("{}: {}", "error".red().bold(), e);
        return ExitCode::from(2);
    }

    if threshold_missed {
        ExitCode::from(1)
    } else if had_errors {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}

fn find_matching_files(
    ref_dir: &Path,
    dist_dir: &Path,
    extensions: &[String],
) -> Result<Vec<(PathBuf, PathBuf)>, String> {
    let extensions: Vec<String> = extensions.iter().map(|e| e.to_lowercase()).collect();

    let mut pairs = Vec::new();

    let entries = std::fs::read_dir(ref_dir)
        .map_err(|e| format!("failed to read directory '{}': {}", ref_dir.display(), e))?;

    for entry in entries {
        let entry = entry.map_err(|e| format!("failed to read directory entry: {e}"))?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !extensions.contains(&ext) {
            continue;
        }

        let filename = path.file_name().unwrap();
        let dist_path = dist_dir.join(filename);

        if dist_path.exists() {
            pairs.push((path, dist_path));
        }
    }

    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(pairs)
}

/// Loads an image and converts it to greyscale at its source depth.
///
/// 16-bit sources keep their full range; everything else goes through
/// the 8-bit luma path.
fn load_luma(path: &Path) -> Result<(LumaImage, u32, u32), String> {
    let img =
        image::open(path).map_err(|e| format!("failed to load '{}': {}", path.display(), e))?;

    let (width, height) = (img.width(), img.height());
    let deep = matches!(
        img,
        DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_)
            | DynamicImage::ImageRgb16(_)
            | DynamicImage::ImageRgba16(_)
    );
    let luma = if deep {
        LumaImage::Sixteen(img.to_luma16().into_raw())
    } else {
        LumaImage::Eight(img.to_luma8().into_raw())
    };

    Ok((luma, width, height))
}

/// Widens 8-bit luma to the 16-bit range (0xFF maps to 0xFFFF).
fn widen_to_16(data: &[u8]) -> Vec<u16> {
    data.iter().map(|&v| u16::from(v) * 257).collect()
}

fn compare_images(cli: &Cli, ref_path: &Path, dist_path: &Path) -> Result<Scored, String> {
    let (ref_luma, ref_w, ref_h) = load_luma(ref_path)?;
    let (dist_luma, dist_w, dist_h) = load_luma(dist_path)?;

    if ref_w != dist_w || ref_h != dist_h {
        return Err(format!(
            "dimension mismatch: {ref_w}x{ref_h} vs {dist_w}x{dist_h}"
        ));
    }

    let params = MssimParams::default()
        .with_window_size(cli.window_size)
        .with_k1(cli.k1)
        .with_k2(cli.k2);

    let width = ref_w as usize;
    let height = ref_h as usize;

    // When the sources disagree on depth, the 8-bit side is widened so
    // both operate over the same dynamic range.
    let (score, bit_depth) = match (ref_luma, dist_luma) {
        (LumaImage::Eight(a), LumaImage::Eight(b)) => {
            let params = params.with_bit_depth(8);
            (compute_mssim(&a, &b, width, height, &params), 8)
        }
        (LumaImage::Sixteen(a), LumaImage::Sixteen(b)) => {
            let params = params.with_bit_depth(16);
            (compute_mssim(&a, &b, width, height, &params), 16)
        }
        (LumaImage::Eight(a), LumaImage::Sixteen(b)) => {
            let params = params.with_bit_depth(16);
            (compute_mssim(&widen_to_16(&a), &b, width, height, &params), 16)
        }
        (LumaImage::Sixteen(a), LumaImage::Eight(b)) => {
            let params = params.with_bit_depth(16);
            (compute_mssim(&a, &widen_to_16(&b), width, height, &params), 16)
        }
    };

    let score = score.map_err(|e| format!("mssim failed: {e}"))?;

    Ok(Scored {
        score,
        width: ref_w,
        height: ref_h,
        bit_depth,
    })
}

fn get_format(cli: &Cli) -> OutputFormat {
    if cli.json {
        OutputFormat::Json
    } else if cli.quality {
        OutputFormat::Quality
    } else if cli.quiet {
        OutputFormat::Score
    } else {
        cli.format
    }
}

fn quality_rating(score: f64) -> (&'static str, &'static str, colored::Color) {
    use colored::Color;
    if score >= 0.99 {
        ("excellent", "Imperceptible difference", Color::Green)
    } else if score >= 0.95 {
        ("good", "Barely noticeable difference", Color::Green)
    } else if score >= 0.90 {
        ("acceptable", "Noticeable but acceptable", Color::Yellow)
    } else if score >= 0.70 {
        ("poor", "Clearly visible degradation", Color::Red)
    } else {
        ("bad", "Severe structural difference", Color::Red)
    }
}

fn json_output(cli: &Cli, scored: &Scored, reference: &Path, distorted: &Path) -> JsonOutput {
    let (rating, description, _) = quality_rating(scored.score);
    JsonOutput {
        score: scored.score,
        quality_rating: rating.to_string(),
        quality_description: description.to_string(),
        reference: reference.display().to_string(),
        distorted: distorted.display().to_string(),
        width: scored.width,
        height: scored.height,
        bit_depth: scored.bit_depth,
        params: JsonParams {
            window_size: cli.window_size,
            k1: cli.k1,
            k2: cli.k2,
        },
        threshold_met: cli.min_ssim.map(|min| scored.score >= min),
    }
}

fn output_single_result(cli: &Cli, scored: &Scored) -> Result<(), String> {
    let format = get_format(cli);
    let (rating, description, color) = quality_rating(scored.score);

    match format {
        OutputFormat::Score => {
            println!("{:.6}", scored.score);
        }
        OutputFormat::Text => {
            let score_str = format!("{:.4}", scored.score);
            if let Some(min_ssim) = cli.min_ssim {
                if scored.score < min_ssim {
                    println!(
                        "MSSIM score: {} (below threshold {})",
                        score_str.color(color),
                        min_ssim
                    );
                } else {
                    println!("MSSIM score: {}", score_str.color(color));
                }
            } else {
                println!("MSSIM score: {}", score_str.color(color));
            }
        }
        OutputFormat::Quality => {
            let score_str = format!("{:.4}", scored.score);
            let rating_colored = rating.color(color).bold();
            println!(
                "MSSIM score: {} ({})",
                score_str.color(color),
                rating_colored
            );
            println!("Quality: {description}");

            if let Some(min_ssim) = cli.min_ssim {
                if scored.score < min_ssim {
                    println!(
                        "{}",
                        format!("Threshold missed: {:.4} < {}", scored.score, min_ssim)
                            .red()
                            .bold()
                    );
                } else {
                    println!(
                        "{}",
                        format!("Threshold met: {:.4} >= {}", scored.score, min_ssim).green()
                    );
                }
            }
        }
        OutputFormat::Json => {
            let output = json_output(cli, scored, &cli.reference, &cli.distorted);
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| format!("failed to serialize JSON: {e}"))?;
            println!("{json}");
        }
    }

    Ok(())
}

fn output_batch_results(cli: &Cli, results: &[ComparisonResult]) -> Result<(), String> {
    let format = get_format(cli);

    let mut scores: Vec<f64> = Vec::new();
    let mut passed = 0;
    let mut failed = 0;
    let mut errors = 0;

    for cr in results {
        match &cr.result {
            Ok(scored) => {
                scores.push(scored.score);
                if let Some(min_ssim) = cli.min_ssim {
                    if scored.score < min_ssim {
                        failed += 1;
                    } else {
                        passed += 1;
                    }
                } else {
                    passed += 1;
                }
            }
            Err(_) => {
                errors += 1;
            }
        }
    }

    let min_score = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max_score = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean_score = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    match format {
        OutputFormat::Json => {
            let mut json_results = Vec::new();
            for cr in results {
                if let Ok(scored) = &cr.result {
                    json_results.push(json_output(cli, scored, &cr.reference, &cr.distorted));
                }
            }

            let batch_output = BatchJsonOutput {
                results: json_results,
                summary: BatchSummary {
                    total: results.len(),
                    passed,
                    failed,
                    errors,
                    min_score: if min_score.is_finite() { min_score } else { 0.0 },
                    max_score: if max_score.is_finite() { max_score } else { 0.0 },
                    mean_score,
                },
            };

            let json = serde_json::to_string_pretty(&batch_output)
                .map_err(|e| format!("failed to serialize JSON: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Score => {
            for cr in results {
                if let Ok(scored) = &cr.result {
                    println!("{:.6}", scored.score);
                }
            }
        }
        _ => {
            // Text or Quality format
            let name_width = results
                .iter()
                .map(|cr| cr.reference.file_name().unwrap_or_default().len())
                .max()
                .unwrap_or(20);

            for cr in results {
                let filename = cr
                    .reference
                    .file_name()
                    .and_then(|s| s.to_str())
                    .unwrap_or("?");

                match &cr.result {
                    Ok(scored) => {
                        let (rating, _, color) = quality_rating(scored.score);
                        let score_str = format!("{:.4}", scored.score);

                        let status = if let Some(min) = cli.min_ssim {
                            if scored.score < min {
                                "FAIL".red().bold()
                            } else {
                                "PASS".green().bold()
                            }
                        } else {
                            rating.color(color).bold()
                        };

                        println!(
                            "{:width$}  {:>8}  {}",
                            filename,
                            score_str.color(color),
                            status,
                            width = name_width
                        );
                    }
                    Err(e) => {
                        println!(
                            "{:width$}  {:>8}  {}",
                            filename,
                            "-".dimmed(),
                            format!("ERROR: {e}").red(),
                            width = name_width
                        );
                    }
                }
            }

            if cli.summary || results.len() > 1 {
                println!();
                println!("{}", "Summary:".bold());
                println!(
                    "  Total: {}  Passed: {}  Failed: {}  Errors: {}",
                    results.len(),
                    passed.to_string().green(),
                    if failed > 0 {
                        failed.to_string().red()
                    } else {
                        failed.to_string().normal()
                    },
                    if errors > 0 {
                        errors.to_string().red()
                    } else {
                        errors.to_string().normal()
                    }
                );
                if !scores.is_empty() {
                    println!(
                        "  Scores: min={min_score:.4}  max={max_score:.4}  mean={mean_score:.4}"
                    );
                }
            }
        }
    }

    let _ = io::stdout().flush();

    Ok(())
}
