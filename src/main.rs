use anyhow::Context;
use simple_apng::PNG;

/// Prints the chunk layout of each file given on the command line.
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

    let files = args.iter().filter(|arg| *arg != "-v");
    for file_name in files {
        let input = std::fs::read(file_name).context(format!("Failed to read {file_name}"))?;
        let chunks =
            PNG::list_chunks(&input).context(format!("Failed to list chunks of {file_name}"))?;
        println!("{file_name}:");
        for chunk in chunks {
            println!("  {} {:>10}", chunk.chunk_type, chunk.length);
        }
        let png = PNG::decode(&input).context(format!("Failed to decode {file_name}"))?;
        let sequence = png.sequence();
        println!(
            "  {}x{} {:?}/{} {:?}, {} bitmaps",
            sequence.header.width,
            sequence.header.height,
            sequence.header.color_type,
            sequence.header.bit_depth,
            sequence.animation_type,
            sequence.bitmaps.len()
        );
        for entry in &sequence.text {
            println!("  {}: {}", entry.keyword, entry.text);
        }
    }
    Ok(())
}
