use std::io::Write;

use gles_translate::{ChatTarget, TranslateClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "tracing")]
    tracing_subscriber::fmt::init();

    let client = TranslateClient::builder().build()?;

    let target = ChatTarget::new(
        std::env::var("GLES_AI_BASE_URL").unwrap_or_default(),
        std::env::var("GLES_AI_API_KEY").unwrap_or_default(),
        std::env::var("GLES_AI_MODEL").unwrap_or_default(),
    );
    let text = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "The quick brown fox jumps over the lazy dog.".to_string());

    let translated = client
        .stream_text(&target, "Japanese", &text, |delta| {
            print!("{}", delta);
            let _ = std::io::stdout().flush();
        })
        .await?;
    println!();
    println!("({} characters)", translated.chars().count());

    Ok(())
}
