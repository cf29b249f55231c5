use std::path::PathBuf;

use gles_translate::store::JsonFileStore;
use gles_translate::{TranslateClient, TranslatorSession};
use tokio_util::sync::CancellationToken;

/// Usage: recognize_file <state.json> <image-or-audio file>
///
/// Uses the custom multimodal model when the state enables it, the built-in
/// OCR/ASR endpoints otherwise.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let state_path = PathBuf::from(args.next().ok_or("missing state file")?);
    let file_path = PathBuf::from(args.next().ok_or("missing input file")?);

    let client = TranslateClient::builder().build()?;
    let session = TranslatorSession::open(client, JsonFileStore::new(state_path)).await?;

    let bytes = tokio::fs::read(&file_path).await?;
    let file_name = file_path.file_name().and_then(|n| n.to_str());
    let extension = file_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let cancel = CancellationToken::new();
    let print_delta = |delta: &str| print!("{}", delta);

    match extension.as_str() {
        "mp3" | "wav" | "m4a" | "ogg" | "flac" => {
            let media_type = format!("audio/{}", extension);
            session
                .recognize_audio(&bytes, Some(&media_type), file_name, &cancel, print_delta)
                .await?;
        }
        _ => {
            let media_type = match extension.as_str() {
                "png" => "image/png",
                "webp" => "image/webp",
                _ => "image/jpeg",
            };
            session
                .recognize_image(&bytes, Some(media_type), file_name, &cancel, print_delta)
                .await?;
        }
    }
    println!();

    Ok(())
}
