use gles_translate::TranslateClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = TranslateClient::builder().build()?;

    let response = client
        .translate_builtin("Good morning, how are you?", "French")
        .await?;
    println!("{}", response);

    Ok(())
}
