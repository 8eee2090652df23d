use reqwest::StatusCode;
use thiserror::Error;
use validator::ValidationErrors;

/// Сообщение, которое показывается пользователю, если сервер не сообщил
/// причину ошибки.
pub const GENERIC_FAILURE_MESSAGE: &str = "API request failed";

#[derive(Debug, Error)]
/// Ошибки клиентской библиотеки `social-client`.
pub enum SocialClientError {
    /// Данные не прошли проверку формы до отправки запроса.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    /// Сервер ответил не-2xx статусом.
    ///
    /// `message` — первое сообщение из `errors` в теле ответа либо
    /// [`GENERIC_FAILURE_MESSAGE`], если сообщений нет.
    #[error("{message}")]
    Request {
        /// HTTP-статус ответа.
        status: StatusCode,
        /// Сообщение для пользователя.
        message: String,
    },

    /// Сервер ответил не-2xx статусом, а тело ошибки не удалось разобрать.
    #[error("API request failed")]
    UnreadableErrorBody {
        /// HTTP-статус ответа.
        status: StatusCode,
    },

    /// Запрос не дошёл до сервера (нет сети, DNS, TLS и т.п.).
    #[error("network error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Успешный ответ содержит некорректный JSON.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Запрос невозможно построить (некорректный base URL, заголовок и т.п.).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Не удалось сохранить или удалить сессию.
    #[error("session storage error: {0}")]
    Storage(#[from] std::io::Error),
}

/// Результат операций `social-client`.
pub type SocialClientResult<T> = Result<T, SocialClientError>;

impl SocialClientError {
    /// HTTP-статус, если ошибка пришла от сервера.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Request { status, .. } | Self::UnreadableErrorBody { status } => Some(*status),
            _ => None,
        }
    }

    /// Сервер отклонил токен или не дал прав на операцию.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        )
    }

    /// Запрошенный ресурс не найден.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Текст, который можно показать пользователю как есть.
    ///
    /// Для ошибок сервера это его сообщение, для сетевых ошибок и ответов
    /// без читаемого тела — общее [`GENERIC_FAILURE_MESSAGE`].
    pub fn user_message(&self) -> String {
        match self {
            Self::Request { message, .. } => message.clone(),
            Self::Validation(errors) => validation_message(errors),
            Self::UnreadableErrorBody { .. } | Self::Transport(_) | Self::Decode(_) => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
            Self::InvalidRequest(message) => message.clone(),
            Self::Storage(err) => format!("failed to store session: {err}"),
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}

fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields = errors.field_errors().into_iter().collect::<Vec<_>>();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .filter_map(|(field, errors)| {
            let error = errors.first()?;
            let text = error
                .message
                .as_ref()
                .map(|message| message.to_string())
                .unwrap_or_else(|| format!("{field} is invalid ({})", error.code));
            Some(text)
        })
        .next()
        .unwrap_or_else(|| "invalid input".to_string())
}
