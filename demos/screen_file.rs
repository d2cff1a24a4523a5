//! Example: screen a single voice recording
//!
//! Usage:
//!   cargo run --release --example screen_file -- [--json] [--scaler PATH] [--model PATH] <file>
//!
//! Decodes the file with symphonia, downmixes to mono, and runs the full
//! screening pipeline against the pre-trained artifacts. `RUST_LOG=debug`
//! traces every stage.

use std::env;
use std::fs::File;
use std::path::Path;

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use symphonia::default::get_probe;
use voxscreen_dsp::{screen_recording, ModelArtifacts, PipelineConfig, ScreeningReport};

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

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut json = false;
    let mut scaler_path = "artifacts/scaler.json".to_string();
    let mut model_path = "artifacts/model.json".to_string();
    let mut files: Vec<String> = Vec::new();

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => json = true,
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
                    "Usage: screen_file [--json] [--scaler PATH] [--model PATH] <file>\n\
                     \n\
                     --json          Emit the report as one JSON object\n\
                     --scaler PATH   Feature scaler artifact (default: artifacts/scaler.json)\n\
                     --model PATH    Risk model artifact (default: artifacts/model.json)\n"
                );
                return Ok(());
            }
            _ => files.push(a),
        }
    }

    if files.len() != 1 {
        eprintln!("ERROR: Provide exactly one audio file path. Use --help for usage.");
        std::process::exit(2);
    }
    let file = &files[0];

    // Startup-fatal: without valid artifacts there is no classification
    let artifacts = match ModelArtifacts::load(Path::new(&scaler_path), Path::new(&model_path)) {
        Ok(artifacts) => artifacts,
        Err(e) => {
            eprintln!("ERROR: classification unavailable: {}", e);
            std::process::exit(1);
        }
    };

    let (samples, sample_rate) = decode_audio_file(file)?;
    eprintln!(
        "Decoded {}: {:.2}s at {} Hz",
        file,
        samples.len() as f32 / sample_rate as f32,
        sample_rate
    );

    match screen_recording(&samples, sample_rate, &PipelineConfig::default(), &artifacts) {
        Ok(result) => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string(&ScreeningReport::from_result(&result))?
                );
            } else {
                println!("Screening Results:");
                println!(
                    "  Risk category: {}",
                    result.classification.category.label()
                );
                println!(
                    "  Score: {:.2}%",
                    result.classification.probability * 100.0
                );
                println!("  Status: {}", result.classification.category.status());
                println!("  Pitch measured: {}", result.metadata.pitch_measured);
                println!(
                    "  Perturbation measured: {}",
                    result.metadata.perturbation_measured
                );
                for notice in &result.metadata.notices {
                    println!("  Notice: {}", notice);
                }
                println!(
                    "  Processing time: {:.2} ms",
                    result.metadata.processing_time_ms
                );
            }
            Ok(())
        }
        Err(e) => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string(&ScreeningReport::from_error(&e))?
                );
            } else {
                eprintln!("ERROR: screening failed: {}", e);
            }
            std::process::exit(1);
        }
    }
}
