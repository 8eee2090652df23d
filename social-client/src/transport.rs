use std::fmt::Debug;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode, Url};

use crate::error::{SocialClientError, SocialClientResult};

#[derive(Debug, Clone)]
/// Полностью подготовленный HTTP-запрос.
pub struct HttpRequest {
    /// HTTP-метод.
    pub method: Method,
    /// Абсолютный URL вместе с query-строкой.
    pub url: Url,
    /// Итоговые заголовки.
    pub headers: HeaderMap,
    /// Тело запроса (JSON).
    pub body: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
/// Сырой HTTP-ответ.
pub struct HttpResponse {
    /// Статус ответа.
    pub status: StatusCode,
    /// Тело ответа.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Создаёт ответ из статуса и тела.
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Отправка одного HTTP-запроса.
///
/// Реализация делает ровно одну попытку: без повторов и без таймаутов.
/// Ошибкой считается только недоставка запроса; любой полученный статус
/// возвращается как [`HttpResponse`].
#[async_trait]
pub trait HttpTransport: Debug + Send + Sync {
    /// Отправляет запрос и возвращает ответ сервера.
    async fn execute(&self, request: HttpRequest) -> SocialClientResult<HttpResponse>;
}

#[derive(Debug, Clone)]
/// Транспорт поверх `reqwest`.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Создаёт транспорт с отдельным `reqwest::Client`.
    pub fn new() -> SocialClientResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("social-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SocialClientError::from_reqwest)?;
        Ok(Self { client })
    }

    /// Использует уже настроенный `reqwest::Client`.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> SocialClientResult<HttpResponse> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(SocialClientError::from_reqwest)?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(SocialClientError::from_reqwest)?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}
