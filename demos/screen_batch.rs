//! Example: screen many voice recordings in parallel
//!
//! Usage:
//!   cargo run --release --example screen_batch -- [--jobs N] [--json] \
//!       [--scaler PATH] [--model PATH] <file1> <file2> ...
//!
//! Decodes each file with symphonia, fans the screenings out across a rayon
//! pool, then prints per-file results and a category tally.

use std::collections::BTreeMap;
use std::env;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use symphonia::default::get_probe;
use voxscreen_dsp::{screen_recording, ModelArtifacts, PipelineConfig};

/// Downmix one decoded packet into the mono sample stream
fn downmix<S: Sample, F: Fn(S) -> f32>(buf: &AudioBuffer<S>, convert: F, out: &mut Vec<f32>) {
    let channels = buf.spec().channels.count();
    if channels == 1 {
        out.extend(buf.chan(0).iter().map(|&s| convert(s)));
    } else {
        for i in 0..buf.frames() {
            let sum: f32 = (0..channels).map(|ch| convert(buf.chan(ch)[i])).sum();
            out.push(sum / channels as f32);
        }
    }
}

fn decode_audio_file(path: &str) -> Result<(Vec<f32>, u32), Box<dyn std::error::Error>> {
    let src = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = Path::new(path).extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or("No supported audio tracks found")?;

    let track_id = track.id;
    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);

    let mut mono: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(_) => break,
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => match decoded {
                AudioBufferRef::F32(buf) => downmix(buf.as_ref(), |s| s, &mut mono),
                AudioBufferRef::F64(buf) => downmix(buf.as_ref(), |s| s as f32, &mut mono),
                AudioBufferRef::S16(buf) => {
                    downmix(buf.as_ref(), |s| s as f32 / 32768.0, &mut mono)
                }
                AudioBufferRef::S24(buf) => {
                    downmix(buf.as_ref(), |s| s.inner() as f32 / 8_388_608.0, &mut mono)
                }
                AudioBufferRef::S32(buf) => {
                    downmix(buf.as_ref(), |s| s as f32 / 2_147_483_648.0, &mut mono)
                }
                AudioBufferRef::U8(buf) => {
                    downmix(buf.as_ref(), |s| (s as f32 - 128.0) / 128.0, &mut mono)
                }
                _ => return Err("Unsupported sample format".into()),
            },
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(Box::new(e)),
        }
    }

    Ok((mono, sample_rate))
}

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

fn percentile(mut xs: Vec<f32>, p: f32) -> Option<f32> {
    if xs.is_empty() {
        return None;
    }
    xs.sort_by(|a, b| a.total_cmp(b));
    let idx = ((xs.len() - 1) as f32 * p.clamp(0.0, 1.0)).round() as usize;
    Some(xs[idx.min(xs.len() - 1)])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut json = false;
    let mut jobs: Option<usize> = None;
    let mut scaler_path = "artifacts/scaler.json".to_string();
    let mut model_path = "artifacts/model.json".to_string();
    let mut paths: Vec<String> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--jobs" => {
                let v = args
                    .first()
                    .ok_or("--jobs requires a value")?
                    .parse::<usize>()?;
                args.remove(0);
                jobs = Some(std::cmp::max(1, v));
            }
            "--scaler" => {
                scaler_path = args.first().ok_or("--scaler requires a path")?.clone();
                args.remove(0);
            }
            "--model" => {
                model_path = args.first().ok_or("--model requires a path")?.clone();
                args.remove(0);
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: screen_batch [--jobs N] [--json] [--scaler PATH] [--model PATH] <file1> <file2> ...\n\
                     \n\
                     --jobs N        Parallel workers (default: CPU-1)\n\
                     --json          Emit one JSON object per line (JSONL)\n\
                     --scaler PATH   Feature scaler artifact (default: artifacts/scaler.json)\n\
                     --model PATH    Risk model artifact (default: artifacts/model.json)\n"
                );
                return Ok(());
            }
            _ => paths.push(a),
        }
    }

    if paths.is_empty() {
        eprintln!("ERROR: Provide at least one audio file path. Use --help for usage.");
        std::process::exit(2);
    }

    // Startup-fatal: every worker shares these artifacts
    let artifacts = match ModelArtifacts::load(Path::new(&scaler_path), Path::new(&model_path)) {
        Ok(artifacts) => artifacts,
        Err(e) => {
            eprintln!("ERROR: classification unavailable: {}", e);
            std::process::exit(1);
        }
    };

    let jobs = jobs.unwrap_or_else(default_jobs);
    eprintln!("Batch: {} files, jobs={}", paths.len(), jobs);

    let config = PipelineConfig::default();

    let t0 = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .expect("Failed to build rayon thread pool");

    #[derive(Clone)]
    struct ItemOut {
        path: String,
        ok: bool,
        label: u8,
        score_pct: f32,
        category: String,
        status: String,
        processing_ms: f32,
        error: Option<String>,
    }

    let outs: Vec<ItemOut> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let path_s = path.clone();
                let decoded = decode_audio_file(&path_s);
                match decoded {
                    Ok((samples, sample_rate)) => {
                        let r = screen_recording(&samples, sample_rate, &config, &artifacts);
                        match r {
                            Ok(res) => ItemOut {
                                path: path_s,
                                ok: true,
                                label: res.classification.label,
                                score_pct: res.classification.probability * 100.0,
                                category: res.classification.category.label().to_string(),
                                status: res.classification.category.status().to_string(),
                                processing_ms: res.metadata.processing_time_ms,
                                error: None,
                            },
                            Err(e) => ItemOut {
                                path: path_s,
                                ok: false,
                                label: 0,
                                score_pct: 0.0,
                                category: "".to_string(),
                                status: "".to_string(),
                                processing_ms: 0.0,
                                error: Some(format!("screening failed: {e}")),
                            },
                        }
                    }
                    Err(e) => ItemOut {
                        path: path_s,
                        ok: false,
                        label: 0,
                        score_pct: 0.0,
                        category: "".to_string(),
                        status: "".to_string(),
                        processing_ms: 0.0,
                        error: Some(format!("decode failed: {e}")),
                    },
                }
            })
            .collect()
    });

    if json {
        for o in &outs {
            if o.ok {
                println!(
                    "{{\"file\":{},\"label\":{},\"score\":\"{:.2}%\",\"status\":{},\"risk_category\":{},\"processing_time_ms\":{:.2}}}",
                    serde_json::to_string(&o.path).unwrap(),
                    o.label,
                    o.score_pct,
                    serde_json::to_string(&o.status).unwrap(),
                    serde_json::to_string(&o.category).unwrap(),
                    o.processing_ms
                );
            } else {
                println!(
                    "{{\"file\":{},\"error\":{}}}",
                    serde_json::to_string(&o.path).unwrap(),
                    serde_json::to_string(o.error.as_deref().unwrap_or("unknown error")).unwrap()
                );
            }
        }
    } else {
        for (idx, o) in outs.iter().enumerate() {
            if o.ok {
                println!(
                    "[{}/{}] {}: {} ({:.2}%) time={:.2}ms",
                    idx + 1,
                    outs.len(),
                    o.path,
                    o.category,
                    o.score_pct,
                    o.processing_ms
                );
            } else {
                println!(
                    "[{}/{}] {}: ERROR: {}",
                    idx + 1,
                    outs.len(),
                    o.path,
                    o.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }

    let ok_times: Vec<f32> = outs
        .iter()
        .filter(|o| o.ok)
        .map(|o| o.processing_ms)
        .collect();
    let wall = t0.elapsed();
    let wall_ms = wall.as_secs_f64() * 1000.0;

    eprintln!(
        "Done: ok={}/{} wall={:.0}ms",
        ok_times.len(),
        outs.len(),
        wall_ms
    );

    let mut tally: BTreeMap<&str, usize> = BTreeMap::new();
    for o in outs.iter().filter(|o| o.ok) {
        *tally.entry(o.category.as_str()).or_insert(0) += 1;
    }
    if !tally.is_empty() {
        let parts: Vec<String> = tally
            .iter()
            .map(|(category, count)| format!("{}={}", category, count))
            .collect();
        eprintln!("categories: {}", parts.join(" "));
    }

    if !ok_times.is_empty() {
        let mean = ok_times.iter().sum::<f32>() / ok_times.len() as f32;
        let p50 = percentile(ok_times.clone(), 0.50).unwrap_or(mean);
        let p90 = percentile(ok_times.clone(), 0.90).unwrap_or(mean);
        let min = ok_times.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = ok_times.iter().cloned().fold(0.0, f32::max);
        eprintln!(
            "processing_time_ms: mean={:.2} p50={:.2} p90={:.2} min={:.2} max={:.2}",
            mean, p50, p90, min, max
        );
    }

    Ok(())
}
