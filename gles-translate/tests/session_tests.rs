use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use gles_translate::state::{AiConfig, AppState, SelectedLanguage};
use gles_translate::store::MemoryStore;
use gles_translate::transport::MockTransport;
use gles_translate::types::HttpBody;
use gles_translate::{Error, Result, TranslateClient, TranslatorSession};

fn ai_config() -> AiConfig {
    AiConfig {
        base_url: "https://llm.example.com/v1/".into(),
        model: "text-model".into(),
        api_key: "sk-test".into(),
        multi_modal_model: "vision-model".into(),
    }
}

fn custom_state(multi_modal: bool) -> AppState {
    let mut state = AppState::default();
    state.select_language(SelectedLanguage::new("fr", "French"));
    state.set_ai_config_enabled(true);
    state.set_ai_config(ai_config());
    state.set_multi_modal_enabled(multi_modal);
    state
}

async fn open(
    transport: &Arc<MockTransport>,
    state: AppState,
) -> Result<(TranslatorSession<MemoryStore>, MemoryStore)> {
    let client = TranslateClient::builder()
        .builtin_translate_url("http://builtin.test/translate")
        .builtin_ocr_url("http://builtin.test/ocr/")
        .builtin_asr_url("http://builtin.test/asr/")
        .transport(transport.clone())
        .build()?;
    let store = MemoryStore::with_state(state);
    let session = TranslatorSession::open(client, store.clone()).await?;
    Ok((session, store))
}

#[tokio::test]
async fn test_translate_with_custom_provider_streams_and_records_history() -> Result<()> {
    let transport = Arc::new(MockTransport::new().with_stream_lines(vec![
        r#"data: {"choices":[{"delta":{"content":"Bon"}}]}"#,
        r#"data: {"choices":[{"delta":{"content":"jour"}}]}"#,
        "data: [DONE]",
    ]));
    let (mut session, store) = open(&transport, custom_state(false)).await?;

    let mut live = String::new();
    let result = session
        .translate("Hello", &CancellationToken::new(), |d| live.push_str(d))
        .await?;

    assert_eq!(result, "Bonjour");
    assert_eq!(live, result);

    let requests = transport.requests();
    let request = &requests[0];
    assert_eq!(request.url, "https://llm.example.com/v1/chat/completions");
    assert_eq!(request.json_body().unwrap()["model"], "text-model");

    let saved = store.snapshot().unwrap();
    assert_eq!(saved.translation_history.len(), 1);
    assert_eq!(saved.translation_history[0].source_text, "Hello");
    assert_eq!(saved.translation_history[0].translated_text, "Bonjour");
    assert_eq!(saved.translation_history[0].target_language, "French");
    Ok(())
}

#[tokio::test]
async fn test_translate_without_custom_provider_uses_builtin() -> Result<()> {
    let transport = Arc::new(MockTransport::new().with_http_body("Hallo"));
    let mut state = AppState::default();
    state.select_language(SelectedLanguage::new("de", "German"));
    let (mut session, store) = open(&transport, state).await?;

    let mut deltas = Vec::new();
    let result = session
        .translate("Hello", &CancellationToken::new(), |d| deltas.push(d.to_string()))
        .await?;

    assert_eq!(result, "Hallo");
    assert_eq!(deltas, vec!["Hallo"]);
    assert_eq!(transport.requests()[0].url, "http://builtin.test/translate");
    assert_eq!(store.snapshot().unwrap().translation_history[0].target_language, "German");
    Ok(())
}

#[tokio::test]
async fn test_translate_with_incomplete_config_fails_without_request() -> Result<()> {
    let transport = Arc::new(MockTransport::new());
    let mut state = custom_state(false);
    state.ai_config.model.clear();
    let (mut session, store) = open(&transport, state).await?;

    let result = session
        .translate("Hello", &CancellationToken::new(), |_| {})
        .await;

    assert!(matches!(result, Err(Error::Config(_))));
    assert!(transport.requests().is_empty());
    assert!(store.snapshot().unwrap().translation_history.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_cancelled_translation_is_not_recorded() -> Result<()> {
    let transport = Arc::new(MockTransport::new().with_http_body("never seen"));
    let (mut session, store) = open(&transport, AppState::default()).await?;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = session.translate("Hello", &cancel, |_| {}).await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(store.snapshot().unwrap().translation_history.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_recognize_image_uses_multi_modal_model_when_enabled() -> Result<()> {
    let transport = Arc::new(MockTransport::new().with_stream_lines(vec![
        r#"data: {"choices":[{"delta":{"content":"EXIT"}}]}"#,
        "data: [DONE]",
    ]));
    let (session, _) = open(&transport, custom_state(true)).await?;

    let result = session
        .recognize_image(b"abc", None, None, &CancellationToken::new(), |_| {})
        .await?;
    assert_eq!(result, "EXIT");

    let requests = transport.requests();
    let body = requests[0].json_body().unwrap();
    assert_eq!(body["model"], "vision-model");
    assert_eq!(
        body["messages"][0]["content"][1]["image_url"]["url"],
        "data:image/jpeg;base64,YWJj"
    );
    Ok(())
}

#[tokio::test]
async fn test_recognize_audio_derives_format_from_media_type() -> Result<()> {
    let transport = Arc::new(MockTransport::new().with_stream_lines(vec![
        r#"data: {"choices":[{"delta":{"content":"hello there"}}]}"#,
    ]));
    let (session, _) = open(&transport, custom_state(true)).await?;

    session
        .recognize_audio(
            b"abc",
            Some("audio/wav"),
            Some("clip.wav"),
            &CancellationToken::new(),
            |_| {},
        )
        .await?;

    let requests = transport.requests();
    let audio = &requests[0].json_body().unwrap()["messages"][0]["content"][1]["input_audio"];
    assert_eq!(audio["format"], "wav");
    assert_eq!(audio["data"], "YWJj");
    Ok(())
}

#[tokio::test]
async fn test_recognize_falls_back_to_builtin_without_multi_modal() -> Result<()> {
    let transport = Arc::new(MockTransport::new().with_http_body(r#"{"text":"speech"}"#));
    let (session, _) = open(&transport, custom_state(false)).await?;

    let mut deltas = Vec::new();
    let result = session
        .recognize_audio(b"abc", None, None, &CancellationToken::new(), |d| {
            deltas.push(d.to_string())
        })
        .await?;

    assert_eq!(result, "speech");
    assert_eq!(deltas, vec!["speech"]);
    let requests = transport.requests();
    assert_eq!(requests[0].url, "http://builtin.test/asr/");
    match &requests[0].body {
        Some(HttpBody::Multipart(files)) => assert_eq!(files[0].file_name, "audio.mp3"),
        other => panic!("Expected multipart body, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_settings_changes_are_persisted() -> Result<()> {
    let transport = Arc::new(MockTransport::new());
    let (mut session, store) = open(&transport, custom_state(true)).await?;

    let language = session.add_custom_language("Latin").await?;
    assert_eq!(store.snapshot().unwrap().custom_languages, vec![language.clone()]);

    assert!(session.edit_custom_language(&language.code, "Classical Latin").await?);
    let renamed = SelectedLanguage::from(&session.state().custom_languages[0]);
    session.select_language(renamed).await?;
    assert_eq!(store.snapshot().unwrap().selected_language.name, "Classical Latin");

    session.set_ai_config_enabled(false).await?;
    let saved = store.snapshot().unwrap();
    assert!(!saved.ai_config_enabled);
    assert!(!saved.multi_modal_enabled);

    assert!(session.delete_custom_language(&language.code).await?);
    assert!(store.snapshot().unwrap().custom_languages.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_backup_export_and_import() -> Result<()> {
    let transport = Arc::new(MockTransport::new());
    let (mut source, _) = open(&transport, custom_state(true)).await?;
    source.add_custom_language("Latin").await?;
    let exported = source.export_backup()?;

    let (mut target, store) = open(&transport, AppState::default()).await?;
    target.import_backup(exported).await?;

    assert_eq!(target.state(), source.state());
    assert_eq!(store.snapshot().as_ref(), Some(source.state()));
    Ok(())
}
