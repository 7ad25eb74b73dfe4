//! `flvstrip`: demultiplex an FLV file, report what is inside, extract the
//! H.264/AAC elementary streams, and write a cleaned (remuxed) copy.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use flv::tag::{FlvTag, FlvTagData};
use flv::FlvDemuxer;
use flv_remux::Remuxer;

mod sei;

use sei::SeiLog;

/// Matches the read granularity of typical recordings; tags are far smaller,
/// so every chunk completes many of them.
const CHUNK_SIZE: usize = 2 * 1024 * 1024;

#[derive(Debug, Parser)]
#[command(name = "flvstrip", version, about)]
struct Args {
    /// Input FLV file.
    input: PathBuf,

    /// Write a remuxed copy with duplicate start codes compacted.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Write the video track as Annex-B H.264.
    #[arg(long, value_name = "FILE")]
    dump_h264: Option<PathBuf>,

    /// Write the audio track as ADTS AAC.
    #[arg(long, value_name = "FILE")]
    dump_aac: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let sei_log = SeiLog::default();
    let mut demuxer = FlvDemuxer::new();
    demuxer.set_nal_observer(Box::new(sei_log.clone()));

    parse_file(&args.input, &mut demuxer)
        .with_context(|| format!("failed to parse {}", args.input.display()))?;

    println!("{}", demuxer.stats());
    if let Some(meta) = demuxer.metadata() {
        println!("{meta}");
    }

    let sei_times = sei_log.timestamps();
    println!("SEI units: {}", sei_times.len());
    for timestamp in &sei_times {
        println!("SEI time: {timestamp} ms");
    }

    if let Some(path) = &args.dump_h264 {
        dump_h264(demuxer.tags(), path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    if let Some(path) = &args.dump_aac {
        dump_aac(demuxer.tags(), path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    if let Some(path) = &args.output {
        write_cleaned(&demuxer, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(())
}

/// Feeds the file through the demuxer in chunks, carrying the unconsumed
/// tail between calls.
fn parse_file(path: &Path, demuxer: &mut FlvDemuxer) -> Result<()> {
    let mut file = File::open(path)?;
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let read = file.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        pending.extend_from_slice(&chunk[..read]);

        let consumed = demuxer.feed(&pending)?;
        pending.drain(..consumed);
    }

    if !pending.is_empty() {
        warn!(
            bytes = pending.len(),
            "trailing bytes did not form a complete tag"
        );
    }

    Ok(())
}

fn dump_h264(tags: &[FlvTag], path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for tag in tags {
        if let FlvTagData::Video(video) = &tag.data
            && let Some(annex_b) = video.annex_b()
        {
            writer.write_all(&annex_b)?;
        }
    }
    writer.flush()?;
    info!(path = %path.display(), "wrote H.264 elementary stream");
    Ok(())
}

fn dump_aac(tags: &[FlvTag], path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for tag in tags {
        if let FlvTagData::Audio(audio) = &tag.data
            && let Some(adts) = audio.adts()
        {
            writer.write_all(&adts)?;
        }
    }
    writer.flush()?;
    info!(path = %path.display(), "wrote AAC elementary stream");
    Ok(())
}

fn write_cleaned(demuxer: &FlvDemuxer, path: &Path) -> Result<()> {
    let header = demuxer
        .header()
        .context("no container header was parsed")?;

    let file = BufWriter::new(File::create(path)?);
    let mut remuxer = Remuxer::new(file, demuxer.nalu_length_size());
    remuxer.write_header(header)?;
    for tag in demuxer.tags() {
        remuxer.write_tag(tag)?;
    }

    let removed = remuxer.removed_bytes();
    remuxer.finish()?.flush()?;
    info!(
        path = %path.display(),
        removed_bytes = removed,
        "wrote cleaned container"
    );
    Ok(())
}
