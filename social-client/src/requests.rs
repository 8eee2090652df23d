//! Тела запросов и типизированные параметры запросов.
//!
//! Значения по умолчанию для query-параметров собраны в `to_query()` каждого
//! типа параметров, а не разбросаны по операциям.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::Media;

/// Номер страницы по умолчанию.
pub const DEFAULT_PAGE: u32 = 1;
/// Размер страницы ленты по умолчанию.
pub const DEFAULT_LIMIT: u32 = 12;

/// Пары `(ключ, значение)` query-строки в порядке добавления.
pub type QueryPairs = Vec<(&'static str, String)>;

fn validate_username(name: &str) -> Result<(), ValidationError> {
    if name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Ok(());
    }

    let mut error = ValidationError::new("username_charset");
    error.message =
        Some("Username can only contain letters, numbers, and underscores".into());
    Err(error)
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Validate)]
/// Данные для регистрации нового пользователя.
pub struct RegisterUser {
    /// Имя пользователя: 3..=20 символов из `[A-Za-z0-9_]`.
    #[validate(
        length(min = 3, max = 20, message = "Username must be 3-20 characters"),
        custom(function = "validate_username")
    )]
    pub name: String,
    /// Email.
    #[validate(email(message = "Email address is not valid"))]
    pub email: String,
    /// Пароль, не короче 8 символов.
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub password: String,
    /// Описание профиля, до 160 символов.
    #[validate(length(max = 160, message = "Bio must be at most 160 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// Аватар.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Media>,
    /// Баннер.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<Media>,
}

impl RegisterUser {
    /// Создаёт заявку на регистрацию без необязательных полей.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            bio: None,
            avatar: None,
            banner: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
/// Учётные данные для входа.
pub struct Credentials {
    /// Email.
    #[validate(email(message = "Email address is not valid"))]
    pub email: String,
    /// Пароль.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl Credentials {
    /// Создаёт учётные данные.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
/// Новый пост. Обязателен только заголовок.
pub struct NewPost {
    /// Заголовок.
    #[validate(custom(function = "validate_not_blank", message = "Please enter a title"))]
    pub title: String,
    /// Текст поста.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Теги.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Изображение.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,
}

impl NewPost {
    /// Создаёт пост только с заголовком.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
/// Частичное обновление поста: незаданные поля не отправляются.
pub struct PostUpdate {
    /// Новый заголовок.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Новый текст.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Новые теги.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Новое изображение.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,
}

impl PostUpdate {
    /// Нет ни одного изменённого поля.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none() && self.tags.is_none() && self.media.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
/// Частичное обновление профиля.
///
/// Для `avatar` и `banner`: `None` — поле не отправляется,
/// `Some(None)` — отправляется `null` и сервер очищает поле,
/// `Some(Some(media))` — новое значение.
pub struct ProfileUpdate {
    /// Новое описание профиля.
    #[validate(length(max = 160, message = "Bio must be at most 160 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// Новый аватар или его очистка.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Option<Media>>,
    /// Новый баннер или его очистка.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<Option<Media>>,
}

impl ProfileUpdate {
    /// Устанавливает описание профиля.
    pub fn bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    /// Устанавливает аватар.
    pub fn avatar(mut self, media: Media) -> Self {
        self.avatar = Some(Some(media));
        self
    }

    /// Очищает аватар.
    pub fn clear_avatar(mut self) -> Self {
        self.avatar = Some(None);
        self
    }

    /// Устанавливает баннер.
    pub fn banner(mut self, media: Media) -> Self {
        self.banner = Some(Some(media));
        self
    }

    /// Очищает баннер.
    pub fn clear_banner(mut self) -> Self {
        self.banner = Some(None);
        self
    }

    /// Нет ни одного изменённого поля.
    pub fn is_empty(&self) -> bool {
        self.bio.is_none() && self.avatar.is_none() && self.banner.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
/// Новый комментарий к посту.
pub struct NewComment {
    /// Текст комментария.
    #[validate(custom(function = "validate_not_blank", message = "Comment cannot be empty"))]
    pub body: String,
    /// Идентификатор комментария, на который отвечаем.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<i64>,
}

impl NewComment {
    /// Создаёт комментарий верхнего уровня.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            reply_to_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Направление сортировки.
pub enum SortOrder {
    /// По возрастанию.
    Asc,
    /// По убыванию.
    Desc,
}

impl SortOrder {
    /// Значение для query-параметра `sortOrder`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

fn page_or_default(value: Option<u32>, default: u32) -> u32 {
    value.filter(|value| *value > 0).unwrap_or(default)
}

#[derive(Debug, Clone, Default)]
/// Параметры постраничных списков постов (лента и посты пользователя).
pub struct ListPostsOptions {
    /// Номер страницы, по умолчанию 1.
    pub page: Option<u32>,
    /// Размер страницы, по умолчанию 12.
    pub limit: Option<u32>,
    /// Поле сортировки.
    pub sort: Option<String>,
    /// Направление сортировки.
    pub sort_order: Option<SortOrder>,
    /// Включить автора, по умолчанию `true`.
    pub author: Option<bool>,
    /// Включить комментарии, по умолчанию `false`.
    pub comments: Option<bool>,
    /// Включить реакции, по умолчанию `false`.
    pub reactions: Option<bool>,
}

impl ListPostsOptions {
    /// Query-параметры с применёнными значениями по умолчанию.
    pub fn to_query(&self) -> QueryPairs {
        let mut query = vec![
            ("page", page_or_default(self.page, DEFAULT_PAGE).to_string()),
            ("limit", page_or_default(self.limit, DEFAULT_LIMIT).to_string()),
            ("_author", self.author.unwrap_or(true).to_string()),
            ("_comments", self.comments.unwrap_or(false).to_string()),
            ("_reactions", self.reactions.unwrap_or(false).to_string()),
        ];

        if let Some(sort) = self.sort.as_deref().filter(|sort| !sort.is_empty()) {
            query.push(("sort", sort.to_string()));
        }
        if let Some(order) = self.sort_order {
            query.push(("sortOrder", order.as_str().to_string()));
        }
        query
    }
}

#[derive(Debug, Clone, Default)]
/// Параметры получения одного поста.
pub struct GetPostOptions {
    /// Включить автора, по умолчанию `true`.
    pub author: Option<bool>,
    /// Включить комментарии, по умолчанию `true`.
    pub comments: Option<bool>,
    /// Включить реакции, по умолчанию `false`.
    pub reactions: Option<bool>,
}

impl GetPostOptions {
    /// Query-параметры с применёнными значениями по умолчанию.
    pub fn to_query(&self) -> QueryPairs {
        vec![
            ("_author", self.author.unwrap_or(true).to_string()),
            ("_comments", self.comments.unwrap_or(true).to_string()),
            ("_reactions", self.reactions.unwrap_or(false).to_string()),
        ]
    }
}

#[derive(Debug, Clone, Default)]
/// Параметры поиска постов.
pub struct SearchOptions {
    /// Номер страницы; не отправляется, если не задан.
    pub page: Option<u32>,
    /// Размер страницы; не отправляется, если не задан.
    pub limit: Option<u32>,
    /// Включить автора, по умолчанию `false`.
    pub author: Option<bool>,
    /// Включить реакции, по умолчанию `false`.
    pub reactions: Option<bool>,
    /// Включить комментарии, по умолчанию `false`.
    pub comments: Option<bool>,
}

impl SearchOptions {
    /// Query-параметры для строки поиска `q`.
    pub fn to_query(&self, q: &str) -> QueryPairs {
        let mut query = vec![
            ("q", q.to_string()),
            ("_author", self.author.unwrap_or(false).to_string()),
            ("_reactions", self.reactions.unwrap_or(false).to_string()),
            ("_comments", self.comments.unwrap_or(false).to_string()),
        ];

        if let Some(page) = self.page.filter(|page| *page > 0) {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit.filter(|limit| *limit > 0) {
            query.push(("limit", limit.to_string()));
        }
        query
    }
}

#[derive(Debug, Clone, Default)]
/// Параметры получения профиля.
pub struct ProfileOptions {
    /// Включить посты, по умолчанию `false`.
    pub posts: Option<bool>,
    /// Включить подписчиков, по умолчанию `false`.
    pub followers: Option<bool>,
    /// Включить подписки, по умолчанию `false`.
    pub following: Option<bool>,
}

impl ProfileOptions {
    /// Query-параметры с применёнными значениями по умолчанию.
    pub fn to_query(&self) -> QueryPairs {
        vec![
            ("_posts", self.posts.unwrap_or(false).to_string()),
            ("_followers", self.followers.unwrap_or(false).to_string()),
            ("_following", self.following.unwrap_or(false).to_string()),
        ]
    }
}
