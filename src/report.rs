// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2026 nervosys

//! Latency statistics and report rendering

use crate::error::Result;
use serde::{Serialize, Serializer};
use std::io::Write;
use std::time::Duration;

fn as_millis<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(millis(*d))
}

/// Duration in fractional milliseconds
pub fn millis(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}

/// Summary of timed inference samples. Serialized in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyStats {
    pub count: usize,
    #[serde(serialize_with = "as_millis", rename = "total_ms")]
    pub total: Duration,
    #[serde(serialize_with = "as_millis", rename = "mean_ms")]
    pub mean: Duration,
    #[serde(serialize_with = "as_millis", rename = "min_ms")]
    pub min: Duration,
    #[serde(serialize_with = "as_millis", rename = "max_ms")]
    pub max: Duration,
    #[serde(serialize_with = "as_millis", rename = "p50_ms")]
    pub p50: Duration,
    #[serde(serialize_with = "as_millis", rename = "p90_ms")]
    pub p90: Duration,
    #[serde(serialize_with = "as_millis", rename = "p99_ms")]
    pub p99: Duration,
    #[serde(serialize_with = "as_millis", rename = "std_dev_ms")]
    pub std_dev: Duration,
}

impl LatencyStats {
    /// Summarize `samples`. Returns `None` for an empty slice.
    pub fn from_samples(samples: &[Duration]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        let count = sorted.len();
        let total: Duration = sorted.iter().sum();
        let mean = match u32::try_from(count) {
            Ok(n) => total / n,
            Err(_) => Duration::from_secs_f64(total.as_secs_f64() / count as f64),
        };

        let mean_secs = mean.as_secs_f64();
        let variance = sorted
            .iter()
            .map(|d| {
                let diff = d.as_secs_f64() - mean_secs;
                diff * diff
            })
            .sum::<f64>()
            / count as f64;

        Some(Self {
            count,
            total,
            mean,
            min: sorted[0],
            max: sorted[count - 1],
            p50: percentile(&sorted, 50.0),
            p90: percentile(&sorted, 90.0),
            p99: percentile(&sorted, 99.0),
            std_dev: Duration::from_secs_f64(variance.sqrt()),
        })
    }
}

/// Nearest-rank percentile of an ascending, non-empty slice
pub fn percentile(sorted: &[Duration], pct: f64) -> Duration {
    let n = sorted.len();
    let rank = (pct * n as f64 / 100.0).ceil() as usize;
    sorted[rank.clamp(1, n) - 1]
}

/// Everything printed at the end of a run
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub model_path: String,
    pub device: String,
    pub input_name: String,
    pub input_shape: Vec<i64>,
    pub outputs: Vec<String>,
    pub warmup: u32,
    pub iterations: u32,
    pub stats: LatencyStats,
}

/// Input geometry lines printed before the model loads
pub fn write_header<W: Write>(out: &mut W, width: u32, height: u32, iterations: u32) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "Input width : {}", width)?;
    writeln!(out, "Input height : {}", height)?;
    writeln!(out, "Inference times : {}", iterations)?;
    Ok(())
}

/// Per-call latency, rewritten in place on the same terminal line
pub fn write_sample<W: Write>(out: &mut W, elapsed: Duration) -> Result<()> {
    write!(out, "\rInference time : {:.2} (ms)", millis(elapsed))?;
    out.flush()?;
    Ok(())
}

/// The notice printed instead of a report when the model file is absent
pub fn write_model_not_found<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "Model not exist ...")?;
    Ok(())
}

/// Final summary in plain text
pub fn write_text_summary<W: Write>(out: &mut W, report: &BenchReport) -> Result<()> {
    let s = &report.stats;
    writeln!(out)?;
    writeln!(out)?;
    writeln!(out, "Average inference time : {:.2} (ms)", millis(s.mean))?;
    writeln!(
        out,
        "Min / Max : {:.2} / {:.2} (ms)",
        millis(s.min),
        millis(s.max)
    )?;
    writeln!(
        out,
        "P50 / P90 / P99 : {:.2} / {:.2} / {:.2} (ms)",
        millis(s.p50),
        millis(s.p90),
        millis(s.p99)
    )?;
    writeln!(out, "Std dev : {:.2} (ms)", millis(s.std_dev))?;
    writeln!(
        out,
        "Total : {:.2} (ms) over {} runs on {}",
        millis(s.total),
        s.count,
        report.device
    )?;
    Ok(())
}

/// Final summary as pretty JSON
pub fn write_json_summary<W: Write>(out: &mut W, report: &BenchReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn report(samples: &[Duration]) -> BenchReport {
        BenchReport {
            model_path: "./model.onnx".into(),
            device: "CPU".into(),
            input_name: "images".into(),
            input_shape: vec![192, 352, 3],
            outputs: vec!["output0".into()],
            warmup: 1,
            iterations: samples.len() as u32,
            stats: LatencyStats::from_samples(samples).unwrap(),
        }
    }

    #[test]
    fn test_empty_samples() {
        assert!(LatencyStats::from_samples(&[]).is_none());
    }

    #[test]
    fn test_mean_is_total_over_count() {
        let stats = LatencyStats::from_samples(&[ms(10), ms(20), ms(30), ms(40)]).unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.total, ms(100));
        assert_eq!(stats.mean, ms(25));
        assert_eq!(stats.min, ms(10));
        assert_eq!(stats.max, ms(40));
    }

    #[test]
    fn test_unsorted_input() {
        let stats = LatencyStats::from_samples(&[ms(30), ms(10), ms(20)]).unwrap();
        assert_eq!(stats.min, ms(10));
        assert_eq!(stats.max, ms(30));
        assert_eq!(stats.p50, ms(20));
    }

    #[test]
    fn test_percentiles_nearest_rank() {
        let samples: Vec<Duration> = (1..=100).map(ms).collect();
        let stats = LatencyStats::from_samples(&samples).unwrap();
        assert_eq!(stats.p50, ms(50));
        assert_eq!(stats.p90, ms(90));
        assert_eq!(stats.p99, ms(99));
    }

    #[test]
    fn test_single_sample() {
        let stats = LatencyStats::from_samples(&[ms(7)]).unwrap();
        assert_eq!(stats.mean, ms(7));
        assert_eq!(stats.p99, ms(7));
        assert_eq!(stats.std_dev, Duration::ZERO);
    }

    #[test]
    fn test_std_dev() {
        let stats = LatencyStats::from_samples(&[ms(2), ms(4), ms(4), ms(4), ms(5), ms(5), ms(7), ms(9)])
            .unwrap();
        assert!((millis(stats.std_dev) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_header_lines() {
        let mut out = Vec::new();
        write_header(&mut out, 352, 192, 1000).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "\nInput width : 352\nInput height : 192\nInference times : 1000\n"
        );
    }

    #[test]
    fn test_sample_overwrites_line() {
        let mut out = Vec::new();
        write_sample(&mut out, Duration::from_micros(12_340)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\rInference time : 12.34 (ms)");
    }

    #[test]
    fn test_text_summary() {
        let mut out = Vec::new();
        write_text_summary(&mut out, &report(&[ms(10), ms(30)])).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Average inference time : 20.00 (ms)"));
        assert!(text.contains("Min / Max : 10.00 / 30.00 (ms)"));
        assert!(text.contains("over 2 runs on CPU"));
    }

    #[test]
    fn test_json_summary() {
        let mut out = Vec::new();
        write_json_summary(&mut out, &report(&[ms(10), ms(30)])).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["device"], "CPU");
        assert_eq!(value["input_shape"], serde_json::json!([192, 352, 3]));
        assert_eq!(value["outputs"], serde_json::json!(["output0"]));
        assert_eq!(value["stats"]["count"], 2);
        assert_eq!(value["stats"]["mean_ms"].as_f64(), Some(20.0));
    }

    #[test]
    fn test_model_not_found_notice() {
        let mut out = Vec::new();
        write_model_not_found(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Model not exist ...\n");
    }
}
