//! HTTP transport for the session backend.

use crate::error::{Operation, TransportError};
use crate::identity::{SessionAddress, SessionToken, TOKEN_PARAM};
use crate::protocol::{AckReply, Backend, HeartbeatReply, StateAndConversationReply, StateReply};
use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Ordered key/value parameters, encoded as a query string or as an
/// `application/x-www-form-urlencoded` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Params(Vec<(&'static str, String)>);

impl Params {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters identifying a session.
    pub fn session(token: &SessionToken) -> Self {
        Self::new().with(TOKEN_PARAM, token.to_string())
    }

    /// Append a parameter.
    #[must_use]
    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.0.push((key, value.into()));
        self
    }

    /// Look up the first value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// [`Backend`] over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    root: Url,
}

impl HttpBackend {
    /// Create a backend rooted at `root` (the application root, `/`).
    ///
    /// Redirects are not followed so that `GET /` exposes the address of
    /// the session it creates.
    pub fn new(root: Url, connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .redirect(Policy::none())
            .build()?;
        Ok(Self { client, root })
    }

    /// The application root.
    pub fn root(&self) -> &Url {
        &self.root
    }

    fn endpoint(&self, operation: Operation) -> Result<Url, TransportError> {
        self.root
            .join(operation.path())
            .map_err(|e| TransportError::Protocol(format!("invalid endpoint URL: {e}")))
    }

    fn state_and_conversation_request(
        &self,
        token: &SessionToken,
    ) -> Result<RequestBuilder, TransportError> {
        let url = self.endpoint(Operation::GetStateAndConversation)?;
        Ok(self.client.get(url).query(&Params::session(token)))
    }

    fn state_request(&self, token: &SessionToken) -> Result<RequestBuilder, TransportError> {
        let url = self.endpoint(Operation::GetState)?;
        Ok(self.client.get(url).query(&Params::session(token)))
    }

    fn add_question_request(
        &self,
        token: &SessionToken,
        question: &str,
    ) -> Result<RequestBuilder, TransportError> {
        let url = self.endpoint(Operation::AddQuestion)?;
        let params = Params::session(token).with("question", question);
        Ok(self.client.post(url).form(&params))
    }

    async fn fetch_json<T: DeserializeOwned>(
        request: RequestBuilder,
    ) -> Result<T, TransportError> {
        let response = request.send().await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(TransportError::Decode)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn get_state_and_conversation(
        &self,
        token: &SessionToken,
    ) -> Result<StateAndConversationReply, TransportError> {
        Self::fetch_json(self.state_and_conversation_request(token)?).await
    }

    async fn get_state(&self, token: &SessionToken) -> Result<StateReply, TransportError> {
        Self::fetch_json(self.state_request(token)?).await
    }

    async fn add_question(
        &self,
        token: &SessionToken,
        question: &str,
    ) -> Result<AckReply, TransportError> {
        Self::fetch_json(self.add_question_request(token, question)?).await
    }

    async fn get_heartbeat(&self) -> Result<HeartbeatReply, TransportError> {
        let url = self.endpoint(Operation::GetHeartbeat)?;
        Self::fetch_json(self.client.get(url)).await
    }

    async fn new_session(&self) -> Result<SessionAddress, TransportError> {
        let url = self.endpoint(Operation::NewSession)?;
        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_redirection() {
            return Err(TransportError::Protocol(format!(
                "expected a redirect to a new session, got {}",
                response.status()
            )));
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| TransportError::Protocol("redirect without a location".into()))?;
        let target = url
            .join(location)
            .map_err(|e| TransportError::Protocol(format!("invalid redirect target: {e}")))?;

        SessionAddress::resolve(target.as_str())
            .map_err(|e| TransportError::Protocol(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "3f2b8c1e-9a4d-4e6f-8b7a-1c2d3e4f5a6b";

    fn backend() -> HttpBackend {
        let root = Url::parse("http://localhost:5000/").unwrap();
        HttpBackend::new(root, Duration::from_secs(1)).unwrap()
    }

    fn token() -> SessionToken {
        SessionToken::parse(TOKEN).unwrap()
    }

    /// Serve `response` to a single connection and return the server root.
    async fn serve_once(response: String) -> Url {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        });
        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    fn reply(status: &str, headers: &[(&str, &str)], body: &str) -> String {
        let mut out = format!("HTTP/1.1 {status}\r\n");
        for (name, value) in headers {
            out.push_str(&format!("{name}: {value}\r\n"));
        }
        out.push_str(&format!(
            "Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ));
        out
    }

    fn backend_at(root: Url) -> HttpBackend {
        HttpBackend::new(root, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_params_keep_insertion_order() {
        let params = Params::session(&token()).with("question", "why?");
        assert_eq!(params.get("uuid"), Some(TOKEN));
        assert_eq!(params.get("question"), Some("why?"));
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn test_state_request_sends_token_as_query() {
        let request = backend().state_request(&token()).unwrap().build().unwrap();

        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().path(), "/get_state");
        assert_eq!(request.url().query(), Some(format!("uuid={TOKEN}").as_str()));
    }

    #[test]
    fn test_state_and_conversation_request() {
        let request = backend()
            .state_and_conversation_request(&token())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(request.url().path(), "/get_state_and_conversation");
    }

    #[test]
    fn test_add_question_is_form_encoded_and_untrimmed() {
        let request = backend()
            .add_question_request(&token(), "  what is RT? & more ")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().path(), "/add_question");
        assert_eq!(
            request.headers()[reqwest::header::CONTENT_TYPE],
            "application/x-www-form-urlencoded"
        );

        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let body = std::str::from_utf8(body).unwrap();
        assert_eq!(
            body,
            format!("uuid={TOKEN}&question=++what+is+RT%3F+%26+more+")
        );
    }

    #[tokio::test]
    async fn test_new_session_follows_relative_location() {
        let location = format!("/session?uuid={TOKEN}");
        let root = serve_once(reply("302 Found", &[("Location", &location)], "")).await;

        let address = backend_at(root.clone()).new_session().await.unwrap();

        assert_eq!(address.token().to_string(), TOKEN);
        assert!(address.to_string().starts_with(root.as_str()));
        assert_eq!(address.url().path(), "/session");
        assert_eq!(address.root(), root);
    }

    #[tokio::test]
    async fn test_new_session_without_redirect_is_protocol_error() {
        let root = serve_once(reply("200 OK", &[], "<html>welcome</html>")).await;

        let err = backend_at(root).new_session().await.unwrap_err();
        assert!(matches!(err, TransportError::Protocol(ref msg) if msg.contains("200")));
    }

    #[tokio::test]
    async fn test_new_session_location_without_token_is_protocol_error() {
        let root = serve_once(reply("302 Found", &[("Location", "/session")], "")).await;

        let err = backend_at(root).new_session().await.unwrap_err();
        assert!(matches!(err, TransportError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_html_heartbeat_is_decode_error() {
        let root = serve_once(reply(
            "200 OK",
            &[("Content-Type", "text/html")],
            "<html><body>maintenance</body></html>",
        ))
        .await;

        let err = backend_at(root).get_heartbeat().await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }
}
