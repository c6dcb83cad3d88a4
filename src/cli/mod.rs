// src/cli/mod.rs
//
// Command-line interface module

mod args;
mod io;
mod output;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{error, info};
use rayon::prelude::*;

use crate::config::FrontendConfig;
use crate::core::MvdrPipeline;

pub use args::Args;
pub use io::{read_channels, read_mask, split_paths, write_wav, Recording};
pub use output::{format_result, format_summary, JobReport};

/// One enhancement request
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub mask: Option<PathBuf>,
}

/// Parse a batch list: `<comma-separated inputs> <output> [mask]` per line.
/// Blank lines and `#` comments are skipped.
pub fn parse_batch(text: &str) -> Result<Vec<Job>> {
    let mut jobs = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [inputs, output] | [inputs, output, _] => jobs.push(Job {
                inputs: split_paths(inputs),
                output: PathBuf::from(output),
                mask: fields.get(2).map(PathBuf::from),
            }),
            _ => bail!("Batch line {}: expected \"<inputs> <output> [mask]\"", lineno + 1),
        }
    }
    Ok(jobs)
}

/// Enhance one job with an existing pipeline
pub fn process_job(pipeline: &mut MvdrPipeline, job: &Job) -> Result<JobReport> {
    let recording = read_channels(&job.inputs)?;
    let mask = job.mask.as_deref().map(read_mask).transpose()?;

    let num_samples = recording.samples.ncols();
    let (frames, bins) = pipeline.mask_shape(num_samples);
    if let Some(mask) = &mask {
        if mask.dim() != (frames, bins) {
            bail!(
                "Mask is {}x{}, expected {}x{} (frames x bins)",
                mask.nrows(),
                mask.ncols(),
                frames,
                bins
            );
        }
    }

    let out = pipeline
        .enhance(recording.samples.view(), mask.as_ref().map(|m| m.view()))
        .with_context(|| format!("Enhancement failed for {}", job.output.display()))?;

    let waveform = out.waveform.row(0).to_vec();
    write_wav(&job.output, &waveform, recording.sample_rate)?;

    Ok(JobReport::new(
        job.output.display().to_string(),
        recording.samples.nrows(),
        recording.sample_rate,
        &waveform,
        frames,
        &out.solution,
        mask.is_some(),
    ))
}

/// Run the CLI
pub fn run(args: &Args) -> Result<()> {
    let config = args.resolve_config()?;
    info!(
        "STFT: {} / {} samples, {} window; loading {}",
        config.stft.frame_length, config.stft.frame_shift, config.stft.window, config.beamformer.diagonal_loading
    );

    match &args.batch {
        Some(list) => run_batch(list, &config, args.verbose),
        None => {
            let job = Job {
                inputs: split_paths(args.input.as_deref().unwrap_or_default()),
                output: args
                    .output
                    .clone()
                    .context("--output is required without --batch")?,
                mask: args.mask.clone(),
            };
            let mut pipeline = MvdrPipeline::from_config(&config)?;
            let report = process_job(&mut pipeline, &job)?;
            print!("{}", format_result(&report, args.verbose));
            Ok(())
        }
    }
}

fn run_batch(list: &Path, config: &FrontendConfig, verbose: bool) -> Result<()> {
    let text = std::fs::read_to_string(list)
        .with_context(|| format!("Failed to read batch list {}", list.display()))?;
    let jobs = parse_batch(&text)?;
    if jobs.is_empty() {
        println!("No jobs in {}", list.display());
        return Ok(());
    }
    println!("Found {} job(s)\n", jobs.len());

    // one pipeline per worker; transforms keep scratch buffers
    let results: Vec<Result<JobReport>> = jobs
        .par_iter()
        .map_init(
            || MvdrPipeline::from_config(config),
            |pipeline, job| match pipeline {
                Ok(pipeline) => process_job(pipeline, job),
                Err(e) => Err(anyhow::anyhow!("{}", e)),
            },
        )
        .collect();

    let mut failed = 0;
    for (job, result) in jobs.iter().zip(&results) {
        match result {
            Ok(report) => print!("{}", format_result(report, verbose)),
            Err(e) => {
                failed += 1;
                error!("{}: {:#}", job.output.display(), e);
            }
        }
    }
    print!("{}", format_summary(results.len() - failed, failed));

    if failed > 0 {
        bail!("{} of {} job(s) failed", failed, results.len());
    }
    Ok(())
}
