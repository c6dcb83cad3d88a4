//! Output formatting for CLI results

use crate::core::MvdrSolution;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Summary of one enhanced utterance
#[derive(Debug, Clone)]
pub struct JobReport {
    pub output: String,
    pub channels: usize,
    pub samples: usize,
    pub sample_rate: u32,
    pub frames: usize,
    pub bins: usize,
    pub masked: bool,
    pub loaded_bins: usize,
    pub fallback_bins: usize,
    pub peak: f32,
}

impl JobReport {
    pub fn new(
        output: String,
        channels: usize,
        sample_rate: u32,
        waveform: &[f32],
        frames: usize,
        solution: &MvdrSolution,
        masked: bool,
    ) -> Self {
        Self {
            output,
            channels,
            samples: waveform.len(),
            sample_rate,
            frames,
            bins: solution.weights.nrows(),
            masked,
            loaded_bins: solution.loaded_bins(),
            fallback_bins: solution.fallback_bins(),
            peak: waveform.iter().fold(0.0f32, |m, &s| m.max(s.abs())),
        }
    }

    fn is_clean(&self) -> bool {
        self.fallback_bins == 0
    }
}

/// Format a job report for terminal output
pub fn format_result(report: &JobReport, verbose: bool) -> String {
    let mut output = String::new();

    let (color, symbol) = if report.is_clean() {
        ("\x1b[32m", "✓") // green
    } else {
        ("\x1b[33m", "!") // yellow
    };

    output.push_str(&format!(
        "{}{} {}{}{} {}[{} ch, {}]{}\n",
        color,
        symbol,
        BOLD,
        report.output,
        RESET,
        DIM,
        report.channels,
        if report.masked { "masked" } else { "unmasked" },
        RESET,
    ));

    output.push_str(&format!(
        "  {} samples @ {} Hz ({:.2}s), peak {:.1}\n",
        report.samples,
        report.sample_rate,
        report.samples as f64 / report.sample_rate.max(1) as f64,
        report.peak
    ));

    if verbose || !report.is_clean() {
        output.push_str(&format!(
            "  {}{} frames x {} bins, {} loaded, {} delay-and-sum{}\n",
            DIM, report.frames, report.bins, report.loaded_bins, report.fallback_bins, RESET
        ));
    }

    output
}

/// Batch footer
pub fn format_summary(succeeded: usize, failed: usize) -> String {
    let color = if failed == 0 { "\x1b[32m" } else { "\x1b[31m" };
    format!(
        "\n{}{}{} enhanced, {} failed{}\n",
        color, BOLD, succeeded, failed, RESET
    )
}
