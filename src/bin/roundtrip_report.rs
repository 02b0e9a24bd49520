use anyhow::Context;
use simple_apng::PNG;
use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};

/// Decodes and re-encodes every PNG in a directory, keeping both copies side
/// by side and writing a JSON summary of what survived.
fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let args: Vec<_> = std::env::args().skip(1).collect();
    let input_dir = PathBuf::from(args.first().map_or("tests/png-suite", String::as_str));
    let output_dir = Path::new("roundtrip");
    fs::create_dir_all(output_dir).context("Failed to create the output folder")?;

    let images = fs::read_dir(&input_dir)
        .context(format!("Failed to read {}", input_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension() == Some(OsStr::new("png")));

    let mut processed = Vec::new();
    let mut failed = Vec::new();
    for image_path in images {
        let Some(name) = image_path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let input = fs::read(&image_path)
            .context(format!("Failed to read {}", image_path.display()))?;
        let result = PNG::decode(&input).and_then(|png| {
            let output = png.encode()?;
            let again = PNG::decode(&output)?;
            let identical = again.sequence().bitmaps == png.sequence().bitmaps;
            Ok((output, identical))
        });
        match result {
            Ok((output, identical)) => {
                fs::copy(&image_path, output_dir.join(format!("{name}-orig.png")))?;
                fs::write(output_dir.join(format!("{name}-apng.png")), &output)?;
                processed.push(serde_json::json!({
                    "name": name,
                    "input_bytes": input.len(),
                    "output_bytes": output.len(),
                    "identical": identical,
                }));
            }
            Err(e) => {
                log::warn!("{name}: {e}");
                failed.push(serde_json::json!({
                    "name": name,
                    "error": e.to_string(),
                    "kind": format!("{:?}", e.kind()),
                }));
            }
        }
    }

    let now = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Iso8601::DEFAULT)?;
    let results = serde_json::json!({
        "date": now,
        "processed_images": processed,
        "failed_images": failed,
    });
    fs::write(output_dir.join("results.json"), results.to_string())?;
    Ok(())
}
