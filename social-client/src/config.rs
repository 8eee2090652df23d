/// Базовый URL REST API по умолчанию.
pub const DEFAULT_BASE_URL: &str = "https://v2.api.noroff.dev";
/// Заголовок, в котором передаётся ключ сервиса (`X-Noroff-API-Key`).
///
/// Хранится в нижнем регистре: так его принимает `HeaderName::from_static`.
pub const API_KEY_HEADER: &str = "x-noroff-api-key";

#[derive(Debug, Clone)]
/// Настройки клиента.
pub struct ClientConfig {
    /// Базовый URL API, например `https://v2.api.noroff.dev`.
    pub base_url: String,
    /// Ключ сервиса, отправляется в каждом запросе.
    pub api_key: String,
    /// Домен, которым должен заканчиваться email при регистрации и входе.
    /// `None` отключает проверку.
    pub email_domain: Option<String>,
}

impl ClientConfig {
    /// Создаёт настройки без проверки домена email.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            email_domain: None,
        }
    }

    /// Требует, чтобы email заканчивался на `@<domain>`.
    ///
    /// Пустая строка отключает проверку.
    pub fn with_email_domain(mut self, domain: impl Into<String>) -> Self {
        let domain = domain.into();
        let domain = domain.trim().trim_start_matches('@');
        self.email_domain = (!domain.is_empty()).then(|| domain.to_string());
        self
    }
}
