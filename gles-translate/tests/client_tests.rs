use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;

use gles_translate::prompt::{IMAGE_RECOGNITION_PROMPT, AUDIO_RECOGNITION_PROMPT};
use gles_translate::transport::MockTransport;
use gles_translate::types::chat::ChatMessage;
use gles_translate::types::{HttpBody, HttpResponse, HttpVerb};
use gles_translate::{ChatTarget, Error, Result, TranslateClient};

fn client_with(transport: Arc<MockTransport>) -> Result<TranslateClient> {
    TranslateClient::builder()
        .builtin_translate_url("http://builtin.test/translate")
        .builtin_ocr_url("http://builtin.test/ocr/")
        .builtin_asr_url("http://builtin.test/asr/")
        .stream_timeout(Duration::from_secs(45))
        .user_agent("gles-tests")
        .transport(transport)
        .build()
}

fn target() -> ChatTarget {
    ChatTarget::new("https://llm.example.com/", "sk-test", "gpt-test")
}

fn sse_lines() -> Vec<&'static str> {
    vec![
        r#"data: {"id":"1","choices":[{"index":0,"delta":{"role":"assistant"}}]}"#,
        r#"data: {"id":"1","choices":[{"index":0,"delta":{"content":"Hola"}}]}"#,
        "",
        r#"data: {"id":"1","choices":[{"index":0,"delta":{"content":" mundo"}}]}"#,
        "data: [DONE]",
    ]
}

#[tokio::test]
async fn test_stream_text() -> Result<()> {
    let mock_transport = Arc::new(MockTransport::new().with_stream_lines(sse_lines()));
    let client = client_with(mock_transport.clone())?;

    let mut deltas = Vec::new();
    let result = client
        .stream_text(&target(), "Spanish", "Hello world", |d| deltas.push(d.to_string()))
        .await?;

    assert_eq!(deltas, vec!["Hola", " mundo"]);
    assert_eq!(result, "Hola mundo");

    let requests = mock_transport.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.url, "https://llm.example.com/v1/chat/completions");
    assert_eq!(request.verb, HttpVerb::POST);
    assert_eq!(request.bearer_token.as_deref(), Some("sk-test"));
    assert_eq!(request.header_value("accept"), Some("text/event-stream"));
    assert_eq!(request.header_value("User-Agent"), Some("gles-tests"));
    assert_eq!(request.timeout, Some(Duration::from_secs(45)));

    let body = request.json_body().expect("json body");
    assert_eq!(body["model"], "gpt-test");
    assert_eq!(body["stream"], true);
    assert_eq!(body["messages"][0]["role"], "system");
    assert!(body["messages"][0]["content"]
        .as_str()
        .unwrap()
        .contains("into Spanish."));
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "Hello world");

    Ok(())
}

#[tokio::test]
async fn test_stream_recognize_image_sends_data_url() -> Result<()> {
    let mock_transport = Arc::new(MockTransport::new().with_stream_lines(vec![
        r#"data: {"choices":[{"delta":{"content":"STOP"}}]}"#,
        "data: [DONE]",
    ]));
    let client = client_with(mock_transport.clone())?;

    let result = client
        .stream_recognize_image(&target(), "aGVsbG8=", "image/png", |_| {})
        .await?;
    assert_eq!(result, "STOP");

    let requests = mock_transport.requests();
    let body = requests[0].json_body().unwrap();
    let content = &body["messages"][0]["content"];
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    assert_eq!(content[0]["text"], IMAGE_RECOGNITION_PROMPT);
    assert_eq!(content[1]["image_url"]["url"], "data:image/png;base64,aGVsbG8=");

    Ok(())
}

#[tokio::test]
async fn test_stream_recognize_audio_sends_typed_audio() -> Result<()> {
    let mock_transport = Arc::new(MockTransport::new().with_stream_lines(vec![
        r#"data: {"choices":[{"text":"one "}]}"#,
        r#"data: {"choices":[{"text":"two"}]}"#,
    ]));
    let client = client_with(mock_transport.clone())?;

    let v1_target = ChatTarget::new("https://llm.example.com/v1", "sk-test", "whisper-ish");
    let result = client
        .stream_recognize_audio(&v1_target, "AAAA", "wav", |_| {})
        .await?;
    assert_eq!(result, "one two");

    let requests = mock_transport.requests();
    assert_eq!(requests[0].url, "https://llm.example.com/v1/chat/completions");
    let content = &requests[0].json_body().unwrap()["messages"][0]["content"];
    assert_eq!(content[0]["text"], AUDIO_RECOGNITION_PROMPT);
    assert_eq!(content[1]["type"], "input_audio");
    assert_eq!(content[1]["input_audio"]["data"], "AAAA");
    assert_eq!(content[1]["input_audio"]["format"], "wav");

    Ok(())
}

#[tokio::test]
async fn test_blank_configuration_fails_before_any_request() -> Result<()> {
    let mock_transport = Arc::new(MockTransport::new().with_stream_lines(sse_lines()));
    let client = client_with(mock_transport.clone())?;

    for target in [
        ChatTarget::new("https://llm.example.com", "sk-test", ""),
        ChatTarget::new("https://llm.example.com", "  ", "gpt-test"),
        ChatTarget::new("", "sk-test", "gpt-test"),
    ] {
        let result = client
            .stream_text(&target, "German", "Hi", |_| panic!("no deltas expected"))
            .await;
        assert!(matches!(result, Err(Error::Config(_))), "{:?}", result);
    }

    assert!(mock_transport.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_connection_failure_is_surfaced() -> Result<()> {
    let mock_transport = Arc::new(
        MockTransport::new().with_failure(Error::Protocol("connection refused".into())),
    );
    let client = client_with(mock_transport)?;

    let result = client
        .stream_text(&target(), "German", "Hi", |_| {})
        .await;
    assert!(matches!(result, Err(Error::Protocol(msg)) if msg == "connection refused"));
    Ok(())
}

#[tokio::test]
async fn test_chat_stream_can_be_driven_manually() -> Result<()> {
    let mock_transport = Arc::new(MockTransport::new().with_stream_lines(sse_lines()));
    let client = client_with(mock_transport)?;

    let mut stream = client
        .chat_stream(&target(), vec![ChatMessage::user("Hello")])
        .await?;

    let mut received = String::new();
    while let Some(delta) = stream.next().await {
        received.push_str(&delta?);
    }
    assert_eq!(received, "Hola mundo");
    Ok(())
}

#[tokio::test]
async fn test_cancellation_stops_deltas() -> Result<()> {
    let mock_transport = Arc::new(
        MockTransport::new()
            .with_stream_lines(sse_lines())
            .hold_stream_open(),
    );
    let client = client_with(mock_transport)?;
    let cancel = tokio_util::sync::CancellationToken::new();

    let stream = client
        .chat_stream(&target(), vec![ChatMessage::user("Hello")])
        .await?;

    let token = cancel.clone();
    let mut deltas = Vec::new();
    let result = stream
        .accumulate(
            |d| {
                deltas.push(d.to_string());
                token.cancel();
            },
            Some(&cancel),
        )
        .await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert_eq!(deltas, vec!["Hola"]);
    Ok(())
}

#[tokio::test]
async fn test_translate_builtin() -> Result<()> {
    let mock_transport =
        Arc::new(MockTransport::new().with_http_body(r#" {"code":200,"result":"Bonjour"} "#));
    let client = client_with(mock_transport.clone())?;

    let result = client.translate_builtin("Hello", "French").await?;
    assert_eq!(result, "Bonjour");

    let requests = mock_transport.requests();
    let request = &requests[0];
    assert_eq!(request.url, "http://builtin.test/translate");
    assert_eq!(request.verb, HttpVerb::GET);
    assert_eq!(request.query[0], ("question".to_string(), "Hello".to_string()));
    assert_eq!(request.query[1], ("type".to_string(), "text".to_string()));
    assert_eq!(request.query[2].0, "system");
    assert!(request.query[2].1.contains("into French."));
    assert_eq!(request.timeout, Some(Duration::from_secs(20)));
    Ok(())
}

#[tokio::test]
async fn test_builtin_server_error_is_surfaced() -> Result<()> {
    let mock_transport = Arc::new(MockTransport::new().with_http_response(HttpResponse {
        status: 502,
        body: Some(Bytes::from_static(b"bad gateway")),
    }));
    let client = client_with(mock_transport)?;

    let result = client.translate_builtin("Hello", "French").await;
    assert!(matches!(result, Err(Error::Server { status: 502, .. })));
    Ok(())
}

#[tokio::test]
async fn test_recognize_image_builtin_uploads_multipart_file() -> Result<()> {
    let mock_transport = Arc::new(
        MockTransport::new()
            .with_http_body(r#"{"code":200,"msg":"ok","data":{"ParsedText":"Line 1\r\nLine 2 "}}"#),
    );
    let client = client_with(mock_transport.clone())?;

    let result = client
        .recognize_image_builtin(vec![1u8, 2, 3], "scan.png")
        .await?;
    assert_eq!(result, "Line 1\nLine 2");

    let requests = mock_transport.requests();
    assert_eq!(requests[0].url, "http://builtin.test/ocr/");
    assert_eq!(requests[0].timeout, Some(Duration::from_secs(60)));
    match &requests[0].body {
        Some(HttpBody::Multipart(files)) => {
            assert_eq!(files.len(), 1);
            assert_eq!(files[0].field, "file");
            assert_eq!(files[0].file_name, "scan.png");
            assert_eq!(files[0].data.as_ref(), &[1u8, 2, 3]);
        }
        other => panic!("Expected multipart body, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_recognize_audio_builtin_surfaces_error_message() -> Result<()> {
    let mock_transport = Arc::new(
        MockTransport::new().with_http_body(r#"{"code":"403","msg":" quota exceeded "}"#),
    );
    let client = client_with(mock_transport.clone())?;

    let result = client.recognize_audio_builtin(vec![0u8; 4], "a.mp3").await?;
    assert_eq!(result, "quota exceeded");
    assert_eq!(mock_transport.requests()[0].url, "http://builtin.test/asr/");
    Ok(())
}

#[test]
fn test_invalid_builtin_url_is_rejected() {
    let result = TranslateClient::builder()
        .builtin_translate_url("not a url")
        .transport(Arc::new(MockTransport::new()))
        .build();
    assert!(matches!(result, Err(Error::Client(_))));
}
