use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// `null` в ответе читается так же, как отсутствующее поле.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Изображение с альтернативным текстом (медиа поста, аватар, баннер).
pub struct Media {
    /// Абсолютный URL изображения.
    pub url: String,
    /// Альтернативный текст.
    #[serde(default, deserialize_with = "null_as_default")]
    pub alt: String,
}

impl Media {
    /// Создаёт медиа-объект из URL и alt-текста.
    pub fn new(url: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            alt: alt.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Краткие данные профиля: автор поста, подписчик, автор комментария.
pub struct ProfileSummary {
    /// Имя пользователя (уникальный идентификатор профиля).
    pub name: String,
    /// Email.
    #[serde(default)]
    pub email: Option<String>,
    /// Описание профиля.
    #[serde(default)]
    pub bio: Option<String>,
    /// Аватар.
    #[serde(default)]
    pub avatar: Option<Media>,
    /// Баннер.
    #[serde(default)]
    pub banner: Option<Media>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Данные пользователя, возвращаемые при регистрации.
pub struct RegisteredUser {
    /// Имя пользователя.
    pub name: String,
    /// Email.
    pub email: String,
    /// Описание профиля.
    #[serde(default)]
    pub bio: Option<String>,
    /// Аватар.
    #[serde(default)]
    pub avatar: Option<Media>,
    /// Баннер.
    #[serde(default)]
    pub banner: Option<Media>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Ответ после успешного входа.
pub struct AuthUser {
    /// Имя пользователя.
    pub name: String,
    /// Email.
    pub email: String,
    /// Описание профиля.
    #[serde(default)]
    pub bio: Option<String>,
    /// Аватар.
    #[serde(default)]
    pub avatar: Option<Media>,
    /// Баннер.
    #[serde(default)]
    pub banner: Option<Media>,
    /// Bearer-токен для последующих запросов.
    pub access_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Реакция на пост: символ, количество и кто отреагировал.
pub struct Reaction {
    /// Символ реакции (обычно эмодзи).
    pub symbol: String,
    /// Количество реакций этим символом.
    pub count: u32,
    /// Имена пользователей, оставивших реакцию.
    #[serde(default, deserialize_with = "null_as_default")]
    pub reactors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Ответ на переключение реакции.
pub struct ReactionResult {
    /// Идентификатор поста.
    pub post_id: i64,
    /// Символ, который переключали.
    pub symbol: String,
    /// Актуальный список реакций поста.
    #[serde(default, deserialize_with = "null_as_default")]
    pub reactions: Vec<Reaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Комментарий к посту.
pub struct Comment {
    /// Идентификатор комментария.
    pub id: i64,
    /// Текст комментария.
    pub body: String,
    /// Идентификатор комментария, на который это ответ.
    #[serde(default)]
    pub reply_to_id: Option<i64>,
    /// Идентификатор поста.
    #[serde(default)]
    pub post_id: Option<i64>,
    /// Имя автора.
    #[serde(default)]
    pub owner: Option<String>,
    /// Дата и время создания (UTC).
    pub created: DateTime<Utc>,
    /// Профиль автора.
    #[serde(default)]
    pub author: Option<ProfileSummary>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
/// Счётчики поста.
pub struct PostCount {
    /// Количество комментариев.
    #[serde(default)]
    pub comments: u32,
    /// Количество реакций.
    #[serde(default)]
    pub reactions: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Пост ленты.
pub struct Post {
    /// Идентификатор поста.
    pub id: i64,
    /// Заголовок.
    pub title: String,
    /// Текст поста.
    #[serde(default)]
    pub body: Option<String>,
    /// Теги.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// Изображение поста.
    #[serde(default)]
    pub media: Option<Media>,
    /// Дата и время создания (UTC).
    pub created: DateTime<Utc>,
    /// Дата и время последнего обновления (UTC).
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    /// Автор; приходит только при `_author=true`.
    #[serde(default)]
    pub author: Option<ProfileSummary>,
    /// Реакции; приходят только при `_reactions=true`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub reactions: Vec<Reaction>,
    /// Комментарии; приходят только при `_comments=true`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: Vec<Comment>,
    /// Счётчики комментариев и реакций.
    #[serde(default, rename = "_count")]
    pub count: Option<PostCount>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
/// Счётчики профиля.
pub struct ProfileCount {
    /// Количество постов.
    #[serde(default)]
    pub posts: u32,
    /// Количество подписчиков.
    #[serde(default)]
    pub followers: u32,
    /// Количество подписок.
    #[serde(default)]
    pub following: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Профиль пользователя.
pub struct Profile {
    /// Имя пользователя.
    pub name: String,
    /// Email.
    #[serde(default)]
    pub email: Option<String>,
    /// Описание профиля.
    #[serde(default)]
    pub bio: Option<String>,
    /// Аватар.
    #[serde(default)]
    pub avatar: Option<Media>,
    /// Баннер.
    #[serde(default)]
    pub banner: Option<Media>,
    /// Подписчики; приходят только при `_followers=true`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub followers: Vec<ProfileSummary>,
    /// Подписки; приходят только при `_following=true`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub following: Vec<ProfileSummary>,
    /// Посты; приходят только при `_posts=true`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub posts: Vec<Post>,
    /// Счётчики постов и подписок.
    #[serde(default, rename = "_count")]
    pub count: Option<ProfileCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Ответ на подписку/отписку.
pub struct FollowResult {
    /// Подписчики профиля после операции.
    #[serde(default, deserialize_with = "null_as_default")]
    pub followers: Vec<ProfileSummary>,
    /// Подписки профиля после операции.
    #[serde(default, deserialize_with = "null_as_default")]
    pub following: Vec<ProfileSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Параметры пагинации, которые сервер возвращает вместе со списком.
pub struct PageMeta {
    /// Номер текущей страницы (с 1).
    pub current_page: u32,
    /// Всего страниц.
    pub page_count: u32,
    /// Первая ли это страница.
    pub is_first_page: bool,
    /// Последняя ли это страница.
    pub is_last_page: bool,
    /// Номер предыдущей страницы.
    #[serde(default)]
    pub previous_page: Option<u32>,
    /// Номер следующей страницы.
    #[serde(default)]
    pub next_page: Option<u32>,
    /// Общее количество элементов.
    #[serde(default)]
    pub total_count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
/// Обёртка `{data, meta?}`, в которой сервер возвращает большинство ответов.
pub struct Envelope<T> {
    /// Полезная нагрузка.
    pub data: T,
    /// Пагинация, если ответ постраничный.
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Страница списка вместе с параметрами пагинации.
pub struct Page<T> {
    /// Элементы текущей страницы.
    pub data: Vec<T>,
    /// Параметры пагинации.
    #[serde(default)]
    pub meta: PageMeta,
}
