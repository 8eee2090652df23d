use std::fmt;
use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::{API_KEY_HEADER, ClientConfig};
use crate::error::{GENERIC_FAILURE_MESSAGE, SocialClientError, SocialClientResult};
use crate::models::{Envelope, Page};
use crate::requests::QueryPairs;
use crate::session::SessionStore;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

#[derive(Debug, Deserialize)]
struct ErrorResponseDto {
    #[serde(default)]
    errors: Vec<ErrorItemDto>,
}

#[derive(Debug, Deserialize)]
struct ErrorItemDto {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone)]
/// Запрос к API до подстановки базового URL и заголовков по умолчанию.
pub struct ApiRequest {
    method: Method,
    path: Vec<String>,
    query: Vec<(String, String)>,
    body: Option<Value>,
    headers: HeaderMap,
}

impl ApiRequest {
    /// Создаёт запрос по относительному пути, например `/social/posts`.
    ///
    /// Статический путь делится по `/`; динамические части добавляются через
    /// [`ApiRequest::segment`], чтобы они были корректно закодированы.
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
            query: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    /// GET-запрос.
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    /// POST-запрос.
    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    /// PUT-запрос.
    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    /// DELETE-запрос.
    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Добавляет один сегмент пути (id, имя пользователя, символ реакции).
    pub fn segment(mut self, segment: impl fmt::Display) -> Self {
        self.path.push(segment.to_string());
        self
    }

    /// Добавляет query-параметры.
    pub fn query(mut self, pairs: QueryPairs) -> Self {
        self.query
            .extend(pairs.into_iter().map(|(key, value)| (key.to_string(), value)));
        self
    }

    /// Устанавливает JSON-тело.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> SocialClientResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Добавляет заголовок; он заменяет заголовок по умолчанию с тем же именем.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// HTTP-метод.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Относительный путь в виде `/a/b/c` (без кодирования).
    pub fn path(&self) -> String {
        format!("/{}", self.path.join("/"))
    }
}

#[derive(Debug, Clone)]
/// Исполнитель запросов: заголовки, отправка, разбор ответа и ошибок.
pub struct HttpClient {
    base_url: Url,
    api_key: HeaderValue,
    session: Arc<dyn SessionStore>,
    transport: Arc<dyn HttpTransport>,
}

impl HttpClient {
    /// Создаёт исполнитель для базового URL и ключа из `config`.
    pub fn new(
        config: &ClientConfig,
        session: Arc<dyn SessionStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> SocialClientResult<Self> {
        let base_url = Url::parse(config.base_url.trim()).map_err(|err| {
            SocialClientError::InvalidRequest(format!("invalid base url: {err}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(SocialClientError::InvalidRequest(format!(
                "base url cannot have a path: {base_url}"
            )));
        }

        let api_key = HeaderValue::from_str(config.api_key.trim()).map_err(|_| {
            SocialClientError::InvalidRequest("invalid api key format for header".to_string())
        })?;

        Ok(Self {
            base_url,
            api_key,
            session,
            transport,
        })
    }

    /// Хранилище сессии, которое использует исполнитель.
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    fn endpoint(&self, request: &ApiRequest) -> SocialClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SocialClientError::InvalidRequest("base url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(request.path.iter());

        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(
                request
                    .query
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.as_str())),
            );
        }
        Ok(url)
    }

    fn build_headers(&self, extra: HeaderMap) -> SocialClientResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(HeaderName::from_static(API_KEY_HEADER), self.api_key.clone());

        if let Some(token) = self.session.token() {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                SocialClientError::InvalidRequest("invalid token format for header".to_string())
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        headers.extend(extra);
        Ok(headers)
    }

    fn decode_error(response: HttpResponse) -> SocialClientError {
        let status = response.status;

        let message = match serde_json::from_slice::<ErrorResponseDto>(&response.body) {
            Ok(body) => body
                .errors
                .into_iter()
                .next()
                .and_then(|item| item.message)
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
            Err(_) => return SocialClientError::UnreadableErrorBody { status },
        };
        SocialClientError::Request { status, message }
    }

    /// Отправляет запрос и возвращает тело ответа как JSON.
    ///
    /// Ответ 204 или пустое тело дают пустой объект `{}`.
    pub async fn send(&self, request: ApiRequest) -> SocialClientResult<Value> {
        let url = self.endpoint(&request)?;
        let path = request.path();
        let method = request.method.clone();
        let headers = self.build_headers(request.headers)?;
        let body = request.body.as_ref().map(serde_json::to_vec::<Value>).transpose()?;

        debug!(method = %method, path = %path, "sending api request");
        let response = self
            .transport
            .execute(HttpRequest {
                method: method.clone(),
                url,
                headers,
                body,
            })
            .await?;

        if !response.status.is_success() {
            let err = Self::decode_error(response);
            warn!(method = %method, path = %path, status = ?err.status(), error = %err, "api request failed");
            return Err(err);
        }

        if response.status == StatusCode::NO_CONTENT
            || response.body.iter().all(u8::is_ascii_whitespace)
        {
            return Ok(Value::Object(Map::new()));
        }

        Ok(serde_json::from_slice(&response.body)?)
    }

    /// Отправляет запрос и десериализует ответ целиком.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> SocialClientResult<T> {
        let value = self.send(request).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Отправляет запрос и возвращает поле `data` из обёртки `{data, meta?}`.
    pub async fn send_data<T: DeserializeOwned>(&self, request: ApiRequest) -> SocialClientResult<T> {
        let envelope: Envelope<T> = self.send_json(request).await?;
        Ok(envelope.data)
    }

    /// Отправляет запрос к постраничному списку.
    pub async fn send_page<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> SocialClientResult<Page<T>> {
        self.send_json(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySessionStore, Session};
    use async_trait::async_trait;

    #[derive(Debug)]
    struct UnreachableTransport;

    #[async_trait]
    impl HttpTransport for UnreachableTransport {
        async fn execute(&self, _request: HttpRequest) -> SocialClientResult<HttpResponse> {
            Err(SocialClientError::Transport("unreachable".into()))
        }
    }

    fn client(base_url: &str, session: MemorySessionStore) -> HttpClient {
        HttpClient::new(
            &ClientConfig::new(base_url, "test-key"),
            Arc::new(session),
            Arc::new(UnreachableTransport),
        )
        .expect("config must be valid")
    }

    #[test]
    fn endpoint_normalizes_slashes() {
        let client = client("https://api.example.com/", MemorySessionStore::new());
        let url = client
            .endpoint(&ApiRequest::get("/social/posts/"))
            .expect("must build");
        assert_eq!(url.as_str(), "https://api.example.com/social/posts");
    }

    #[test]
    fn endpoint_keeps_base_path_and_encodes_segments() {
        let client = client("https://api.example.com/v2/", MemorySessionStore::new());
        let request = ApiRequest::put("/social/posts")
            .segment(7)
            .segment("react")
            .segment("👍");
        let url = client.endpoint(&request).expect("must build");
        assert_eq!(url.path(), "/v2/social/posts/7/react/%F0%9F%91%8D");
        assert_eq!(request.path(), "/social/posts/7/react/👍");
    }

    #[test]
    fn endpoint_form_encodes_query() {
        let client = client("https://api.example.com", MemorySessionStore::new());
        let request = ApiRequest::get("/social/posts/search")
            .query(vec![("q", "hello world".to_string()), ("_author", "false".to_string())]);
        let url = client.endpoint(&request).expect("must build");
        assert_eq!(url.query(), Some("q=hello+world&_author=false"));
    }

    #[test]
    fn headers_include_api_key_and_skip_auth_when_anonymous() {
        let client = client("https://api.example.com", MemorySessionStore::new());
        let headers = client.build_headers(HeaderMap::new()).expect("must build");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[API_KEY_HEADER], "test-key");
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn headers_include_bearer_token_and_caller_overrides() {
        let session = MemorySessionStore::with_session(Session::new("jwt", "alice"));
        let client = client("https://api.example.com", session);

        let mut extra = HeaderMap::new();
        extra.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let headers = client.build_headers(extra).expect("must build");

        assert_eq!(headers[AUTHORIZATION], "Bearer jwt");
        assert_eq!(headers[CONTENT_TYPE], "text/plain");
        assert_eq!(headers.get_all(CONTENT_TYPE).iter().count(), 1);
    }

    #[test]
    fn decode_error_takes_first_message() {
        let body = r#"{"errors":[{"message":"Invalid email or password"},{"message":"second"}]}"#;
        let err = HttpClient::decode_error(HttpResponse::new(StatusCode::UNAUTHORIZED, body));
        match err {
            SocialClientError::Request { status, message } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(message, "Invalid email or password");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn decode_error_without_messages_uses_generic_text() {
        let err = HttpClient::decode_error(HttpResponse::new(StatusCode::BAD_REQUEST, "{}"));
        match err {
            SocialClientError::Request { message, .. } => {
                assert_eq!(message, GENERIC_FAILURE_MESSAGE)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn decode_error_with_unparsable_body_is_its_own_case() {
        let err = HttpClient::decode_error(HttpResponse::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<html>oops</html>",
        ));
        assert!(matches!(
            err,
            SocialClientError::UnreadableErrorBody {
                status: StatusCode::INTERNAL_SERVER_ERROR
            }
        ));
        assert_eq!(err.to_string(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn new_rejects_invalid_base_url() {
        let err = HttpClient::new(
            &ClientConfig::new("not a url", "key"),
            Arc::new(MemorySessionStore::new()),
            Arc::new(UnreachableTransport),
        )
        .expect_err("must fail");
        assert!(matches!(err, SocialClientError::InvalidRequest(_)));
    }
}
