use anyhow::Context;
use simple_apng::{EncodeOptions, ProgressSink, PNG};

/// Logs encoder progress at info level.
struct LogProgress;

impl ProgressSink for LogProgress {
    fn add_progress(&mut self, _amount: u64) {}

    fn update_progress(&mut self, done: u64, total: Option<u64>) {
        if let Some(total) = total {
            log::info!("step {done}/{total}");
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args: Vec<_> = std::env::args().skip(1).collect();
    let verbosity = if args.first().map(String::as_str) == Some("-v") {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Error
    };
    pretty_env_logger::formatted_builder()
        .filter_level(verbosity)
        .parse_default_env()
        .init();
    let file_name = args
        .iter()
        .rfind(|arg| *arg != "-v")
        .context("Usage: process-image [-v] <file.png>")?;
    let input = std::fs::read(file_name).context(format!("Failed to read {file_name}"))?;

    let mut png = PNG::decode(&input).context(format!("Failed to decode {file_name}"))?;
    png.deoptimize()?.optimize()?;
    if png.optimize_color_type()? {
        let header = &png.sequence().header;
        log::info!(
            "rewritten as {:?} at {} bits",
            header.color_type,
            header.bit_depth
        );
    }
    let output = png.encode_with(&EncodeOptions::default(), &mut LogProgress)?;
    log::info!("{} bytes in, {} bytes out", input.len(), output.len());
    std::fs::write("output.png", output)?;
    Ok(())
}
