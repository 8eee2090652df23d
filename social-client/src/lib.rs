//! Клиентская библиотека для REST API социальной ленты.
//!
//! Предоставляет единый API (`SocialClient`) поверх трёх частей:
//! - хранилище сессии (`SessionStore`): токен и имя пользователя
//! - исполнитель запросов (`HttpClient`): заголовки, отправка, разбор ошибок
//! - операции над ресурсами: посты, реакции, комментарии, профили, подписки
//!
//! Клиент сохраняет токен после `login` и автоматически подставляет его во
//! все последующие запросы.
#![warn(missing_docs)]

mod config;
mod error;
mod http_client;
mod models;
mod requests;
mod session;
mod transport;

use std::borrow::Cow;
use std::sync::Arc;

use tracing::info;
use validator::{Validate, ValidationError, ValidationErrors};

pub use reqwest::StatusCode;

pub use config::{API_KEY_HEADER, ClientConfig, DEFAULT_BASE_URL};
pub use error::{GENERIC_FAILURE_MESSAGE, SocialClientError, SocialClientResult};
pub use http_client::{ApiRequest, HttpClient};
pub use models::{
    AuthUser, Comment, Envelope, FollowResult, Media, Page, PageMeta, Post, PostCount, Profile,
    ProfileCount, ProfileSummary, Reaction, ReactionResult, RegisteredUser,
};
pub use requests::{
    Credentials, DEFAULT_LIMIT, DEFAULT_PAGE, GetPostOptions, ListPostsOptions, NewComment,
    NewPost, PostUpdate, ProfileOptions, ProfileUpdate, QueryPairs, RegisterUser, SearchOptions,
    SortOrder,
};
pub use session::{
    FileSessionStore, MemorySessionStore, Session, SessionStore, TOKEN_KEY, USERNAME_KEY,
};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

#[derive(Debug, Clone)]
/// Клиент социальной ленты.
///
/// Клонирование дешёвое: клоны разделяют хранилище сессии и транспорт.
pub struct SocialClient {
    http: HttpClient,
    email_domain: Option<String>,
}

impl SocialClient {
    /// Создаёт клиент с транспортом `reqwest`.
    pub fn new(config: ClientConfig, session: Arc<dyn SessionStore>) -> SocialClientResult<Self> {
        let transport = Arc::new(ReqwestTransport::new()?);
        Self::with_transport(config, session, transport)
    }

    /// Создаёт клиент с произвольным транспортом.
    pub fn with_transport(
        config: ClientConfig,
        session: Arc<dyn SessionStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> SocialClientResult<Self> {
        let http = HttpClient::new(&config, session, transport)?;
        Ok(Self {
            http,
            email_domain: config.email_domain,
        })
    }

    /// Исполнитель запросов для вызовов, которых нет среди операций клиента.
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Хранилище сессии клиента.
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        self.http.session()
    }

    // ---------------------------------------------------------------- auth

    /// Регистрирует пользователя.
    ///
    /// Форма данных и домен email проверяются до отправки запроса.
    /// Сессия не создаётся: после регистрации нужно выполнить `login`.
    pub async fn register(&self, user: &RegisterUser) -> SocialClientResult<RegisteredUser> {
        user.validate()?;
        self.check_email_domain(&user.email)?;

        let request = ApiRequest::post("/auth/register").json(user)?;
        self.http.send_data(request).await
    }

    /// Выполняет вход и сохраняет токен и имя пользователя в сессии.
    pub async fn login(&self, credentials: &Credentials) -> SocialClientResult<AuthUser> {
        credentials.validate()?;
        self.check_email_domain(&credentials.email)?;

        let request = ApiRequest::post("/auth/login").json(credentials)?;
        let user: AuthUser = self.http.send_data(request).await?;

        self.session()
            .save(&Session::new(user.access_token.clone(), user.name.clone()))?;
        info!(user = %user.name, "logged in");
        Ok(user)
    }

    /// Завершает сессию. Запрос к серверу не отправляется.
    pub fn logout(&self) -> SocialClientResult<()> {
        self.session().clear()?;
        info!("logged out");
        Ok(())
    }

    /// Есть ли сохранённый токен.
    pub fn is_logged_in(&self) -> bool {
        self.session().is_authenticated()
    }

    /// Имя пользователя текущей сессии.
    pub fn current_username(&self) -> Option<String> {
        self.session().username()
    }

    // --------------------------------------------------------------- posts

    /// Возвращает страницу ленты.
    pub async fn get_all_posts(&self, options: &ListPostsOptions) -> SocialClientResult<Page<Post>> {
        let request = ApiRequest::get("/social/posts").query(options.to_query());
        self.http.send_page(request).await
    }

    /// Возвращает пост по идентификатору.
    pub async fn get_post(&self, id: i64, options: &GetPostOptions) -> SocialClientResult<Post> {
        let request = ApiRequest::get("/social/posts")
            .segment(id)
            .query(options.to_query());
        self.http.send_data(request).await
    }

    /// Создаёт пост от имени текущего пользователя.
    pub async fn create_post(&self, post: &NewPost) -> SocialClientResult<Post> {
        post.validate()?;

        let request = ApiRequest::post("/social/posts").json(post)?;
        self.http.send_data(request).await
    }

    /// Частично обновляет пост.
    pub async fn update_post(&self, id: i64, update: &PostUpdate) -> SocialClientResult<Post> {
        let request = ApiRequest::put("/social/posts").segment(id).json(update)?;
        self.http.send_data(request).await
    }

    /// Удаляет пост.
    pub async fn delete_post(&self, id: i64) -> SocialClientResult<()> {
        let request = ApiRequest::delete("/social/posts").segment(id);
        self.http.send(request).await?;
        Ok(())
    }

    /// Переключает реакцию `symbol` на посте.
    ///
    /// Добавить или снять реакцию решает сервер; клиент только отправляет
    /// запрос, поэтому два вызова подряд — это два независимых запроса.
    pub async fn react_to_post(&self, id: i64, symbol: &str) -> SocialClientResult<ReactionResult> {
        let request = ApiRequest::put("/social/posts")
            .segment(id)
            .segment("react")
            .segment(symbol);
        self.http.send_data(request).await
    }

    /// Добавляет комментарий к посту.
    pub async fn comment_on_post(
        &self,
        id: i64,
        comment: &NewComment,
    ) -> SocialClientResult<Comment> {
        comment.validate()?;

        let request = ApiRequest::post("/social/posts")
            .segment(id)
            .segment("comment")
            .json(comment)?;
        self.http.send_data(request).await
    }

    /// Ищет посты по строке `query`.
    pub async fn search_posts(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> SocialClientResult<Page<Post>> {
        let request = ApiRequest::get("/social/posts/search").query(options.to_query(query));
        self.http.send_page(request).await
    }

    // ------------------------------------------------------------ profiles

    /// Возвращает профиль пользователя.
    pub async fn get_profile(
        &self,
        name: &str,
        options: &ProfileOptions,
    ) -> SocialClientResult<Profile> {
        let request = ApiRequest::get("/social/profiles")
            .segment(name)
            .query(options.to_query());
        self.http.send_data(request).await
    }

    /// Возвращает страницу постов пользователя.
    pub async fn get_posts_by_user(
        &self,
        name: &str,
        options: &ListPostsOptions,
    ) -> SocialClientResult<Page<Post>> {
        let request = ApiRequest::get("/social/profiles")
            .segment(name)
            .segment("posts")
            .query(options.to_query());
        self.http.send_page(request).await
    }

    /// Частично обновляет профиль; `null`-поля очищаются на сервере.
    pub async fn update_profile(
        &self,
        name: &str,
        update: &ProfileUpdate,
    ) -> SocialClientResult<Profile> {
        update.validate()?;

        let request = ApiRequest::put("/social/profiles")
            .segment(name)
            .json(update)?;
        self.http.send_data(request).await
    }

    /// Подписывается на пользователя.
    pub async fn follow_user(&self, name: &str) -> SocialClientResult<FollowResult> {
        let request = ApiRequest::put("/social/profiles")
            .segment(name)
            .segment("follow");
        self.http.send_data(request).await
    }

    /// Отписывается от пользователя.
    pub async fn unfollow_user(&self, name: &str) -> SocialClientResult<FollowResult> {
        let request = ApiRequest::put("/social/profiles")
            .segment(name)
            .segment("unfollow");
        self.http.send_data(request).await
    }

    fn check_email_domain(&self, email: &str) -> SocialClientResult<()> {
        let Some(domain) = self.email_domain.as_deref() else {
            return Ok(());
        };

        let suffix = format!("@{}", domain.to_ascii_lowercase());
        if email.trim().to_ascii_lowercase().ends_with(&suffix) {
            return Ok(());
        }

        let mut error = ValidationError::new("email_domain");
        error.message = Some(Cow::Owned(format!(
            "Email must be a valid @{domain} address"
        )));
        let mut errors = ValidationErrors::new();
        errors.add("email", error);
        Err(errors.into())
    }
}
