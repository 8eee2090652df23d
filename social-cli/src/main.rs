use std::process;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::debug;
use social_client::{
    AuthUser, ClientConfig, Comment, Credentials, FileSessionStore, FollowResult, GetPostOptions,
    ListPostsOptions, Media, NewComment, NewPost, Page, Post, PostUpdate, Profile, ProfileOptions,
    ProfileUpdate, ReactionResult, RegisterUser, SearchOptions, SocialClient, SocialClientError,
    SortOrder,
};

mod logging;
mod settings;

use logging::init_logging;
use settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "social-cli", version, about = "CLI клиент для социальной ленты")]
struct Cli {
    /// Адрес API (перекрывает SOCIAL_API_URL).
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Регистрация пользователя.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        avatar_url: Option<String>,
    },
    /// Вход пользователя.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Выход (удаляет сохранённую сессию).
    Logout,
    /// Текущий пользователь.
    Whoami,
    /// Лента постов.
    Feed {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 12)]
        limit: u32,
        /// Поле сортировки; по умолчанию новые посты первыми.
        #[arg(long, default_value = "created")]
        sort: String,
        /// asc или desc.
        #[arg(long, value_parser = parse_sort_order, default_value = "desc")]
        sort_order: SortOrder,
        #[arg(long)]
        comments: bool,
        #[arg(long)]
        reactions: bool,
    },
    /// Получение поста по id.
    Get {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        reactions: bool,
    },
    /// Создание поста (требует входа).
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: Option<String>,
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        #[arg(long)]
        media_url: Option<String>,
        /// По умолчанию совпадает с заголовком.
        #[arg(long)]
        media_alt: Option<String>,
    },
    /// Обновление поста (требует входа).
    ///
    /// Отправляются только указанные поля.
    Update {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        #[arg(long)]
        media_url: Option<String>,
        #[arg(long)]
        media_alt: Option<String>,
    },
    /// Удаление поста (требует входа).
    Delete {
        #[arg(long)]
        id: i64,
    },
    /// Поставить или снять реакцию.
    React {
        #[arg(long)]
        id: i64,
        #[arg(long, default_value = "👍")]
        symbol: String,
    },
    /// Комментарий к посту.
    Comment {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        body: String,
        #[arg(long)]
        reply_to: Option<i64>,
    },
    /// Поиск постов.
    Search {
        query: String,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Профиль пользователя (по умолчанию — текущего).
    Profile {
        name: Option<String>,
        #[arg(long)]
        posts: bool,
        #[arg(long)]
        followers: bool,
        #[arg(long)]
        following: bool,
    },
    /// Посты пользователя (по умолчанию — текущего).
    UserPosts {
        name: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 12)]
        limit: u32,
    },
    /// Изменение профиля текущего пользователя.
    EditProfile {
        #[arg(long)]
        bio: Option<String>,
        #[arg(long, conflicts_with = "clear_avatar")]
        avatar_url: Option<String>,
        #[arg(long, conflicts_with = "clear_banner")]
        banner_url: Option<String>,
        #[arg(long)]
        clear_avatar: bool,
        #[arg(long)]
        clear_banner: bool,
    },
    /// Подписка на пользователя.
    Follow { name: String },
    /// Отписка от пользователя.
    Unfollow { name: String },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Ошибка: {err}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;
    init_logging(&settings.log_level)?;

    let base_url = cli
        .server
        .map(normalize_server)
        .unwrap_or_else(|| settings.api_url.clone());
    let config = ClientConfig::new(base_url, settings.api_key.clone())
        .with_email_domain(settings.email_domain.clone());
    debug!(
        api_url = %config.base_url,
        session_file = %settings.session_file.display(),
        "client configured"
    );
    let session = Arc::new(FileSessionStore::new(settings.session_file.clone()));
    let client = SocialClient::new(config, session).context("не удалось создать клиент")?;

    match cli.command {
        Command::Register {
            name,
            email,
            password,
            bio,
            avatar_url,
        } => {
            let mut user = RegisterUser::new(name.trim(), email.trim(), password);
            user.bio = bio;
            user.avatar = avatar_url
                .filter(|url| !url.trim().is_empty())
                .map(|url| Media::new(url.trim(), format!("{}'s profile picture", user.name)));

            let registered = client.register(&user).await.map_err(map_client_error)?;
            println!("Регистрация успешна: {} ({})", registered.name, registered.email);
            println!("Теперь выполните `social-cli login --email ... --password ...`");
        }
        Command::Login { email, password } => {
            let user = client
                .login(&Credentials::new(email.trim(), password))
                .await
                .map_err(map_client_error)?;
            print_auth("Вход выполнен", &user);
        }
        Command::Logout => {
            client.logout().context("не удалось удалить сессию")?;
            println!("Выход выполнен");
        }
        Command::Whoami => match client.current_username() {
            Some(name) if client.is_logged_in() => println!("{name}"),
            _ => println!("anonymous"),
        },
        Command::Feed {
            page,
            limit,
            sort,
            sort_order,
            comments,
            reactions,
        } => {
            let options = ListPostsOptions {
                page: Some(page),
                limit: Some(limit),
                sort: Some(sort),
                sort_order: Some(sort_order),
                comments: Some(comments),
                reactions: Some(reactions),
                ..ListPostsOptions::default()
            };
            let page = client
                .get_all_posts(&options)
                .await
                .map_err(map_client_error)?;
            print_page(&page);
        }
        Command::Get { id, reactions } => {
            let options = GetPostOptions {
                reactions: Some(reactions),
                ..GetPostOptions::default()
            };
            let post = client
                .get_post(id, &options)
                .await
                .map_err(map_client_error)?;
            print_post("Пост", &post);
        }
        Command::Create {
            title,
            body,
            tags,
            media_url,
            media_alt,
        } => {
            let post = NewPost {
                media: media_from_args(media_url, media_alt, &title),
                body: body.filter(|body| !body.trim().is_empty()),
                tags: (!tags.is_empty()).then_some(tags),
                title,
            };
            let post = client.create_post(&post).await.map_err(map_client_error)?;
            print_post("Пост создан", &post);
        }
        Command::Update {
            id,
            title,
            body,
            tags,
            media_url,
            media_alt,
        } => {
            let alt_fallback = title.clone().unwrap_or_default();
            let update = PostUpdate {
                title,
                body,
                tags,
                media: media_from_args(media_url, media_alt, &alt_fallback),
            };
            if update.is_empty() {
                return Err(anyhow!("нечего обновлять: укажите хотя бы одно поле"));
            }

            let post = client
                .update_post(id, &update)
                .await
                .map_err(map_client_error)?;
            print_post("Пост обновлён", &post);
        }
        Command::Delete { id } => {
            client.delete_post(id).await.map_err(map_client_error)?;
            println!("Пост удалён: id={id}");
        }
        Command::React { id, symbol } => {
            let result = client
                .react_to_post(id, &symbol)
                .await
                .map_err(map_client_error)?;
            print_reactions(&result);
        }
        Command::Comment { id, body, reply_to } => {
            let comment = NewComment {
                body,
                reply_to_id: reply_to,
            };
            let comment = client
                .comment_on_post(id, &comment)
                .await
                .map_err(map_client_error)?;
            print_comment("Комментарий добавлен", &comment);
        }
        Command::Search { query, page, limit } => {
            let options = SearchOptions {
                page,
                limit,
                author: Some(true),
                ..SearchOptions::default()
            };
            let page = client
                .search_posts(&query, &options)
                .await
                .map_err(map_client_error)?;
            print_page(&page);
        }
        Command::Profile {
            name,
            posts,
            followers,
            following,
        } => {
            let name = name_or_current(&client, name)?;
            let options = ProfileOptions {
                posts: Some(posts),
                followers: Some(followers),
                following: Some(following),
            };
            let profile = client
                .get_profile(&name, &options)
                .await
                .map_err(map_client_error)?;
            print_profile(&profile);
        }
        Command::UserPosts { name, page, limit } => {
            let name = name_or_current(&client, name)?;
            let options = ListPostsOptions {
                page: Some(page),
                limit: Some(limit),
                ..ListPostsOptions::default()
            };
            let page = client
                .get_posts_by_user(&name, &options)
                .await
                .map_err(map_client_error)?;
            print_page(&page);
        }
        Command::EditProfile {
            bio,
            avatar_url,
            banner_url,
            clear_avatar,
            clear_banner,
        } => {
            let name = name_or_current(&client, None)?;
            let update = build_profile_update(
                &name,
                bio,
                avatar_url,
                banner_url,
                clear_avatar,
                clear_banner,
            );
            if update.is_empty() {
                println!("Изменений нет");
                return Ok(());
            }

            let profile = client
                .update_profile(&name, &update)
                .await
                .map_err(map_client_error)?;
            print_profile(&profile);
        }
        Command::Follow { name } => {
            let result = client.follow_user(&name).await.map_err(map_client_error)?;
            print_follow(&format!("Вы подписались на {name}"), &result);
        }
        Command::Unfollow { name } => {
            let result = client
                .unfollow_user(&name)
                .await
                .map_err(map_client_error)?;
            print_follow(&format!("Вы отписались от {name}"), &result);
        }
    }

    Ok(())
}

fn normalize_server(server: String) -> String {
    let server = server.trim().to_string();
    if server.starts_with("http://") || server.starts_with("https://") {
        return server;
    }

    format!("https://{server}")
}

fn parse_sort_order(raw: &str) -> Result<SortOrder, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "asc" => Ok(SortOrder::Asc),
        "desc" => Ok(SortOrder::Desc),
        other => Err(format!("ожидается asc или desc, получено `{other}`")),
    }
}

fn media_from_args(url: Option<String>, alt: Option<String>, fallback_alt: &str) -> Option<Media> {
    let url = url.map(|url| url.trim().to_string()).filter(|url| !url.is_empty())?;
    let alt = alt
        .map(|alt| alt.trim().to_string())
        .filter(|alt| !alt.is_empty())
        .unwrap_or_else(|| fallback_alt.to_string());
    Some(Media::new(url, alt))
}

fn build_profile_update(
    name: &str,
    bio: Option<String>,
    avatar_url: Option<String>,
    banner_url: Option<String>,
    clear_avatar: bool,
    clear_banner: bool,
) -> ProfileUpdate {
    let mut update = ProfileUpdate::default();
    if let Some(bio) = bio {
        update = update.bio(bio.trim());
    }

    if clear_avatar {
        update = update.clear_avatar();
    } else if let Some(media) =
        media_from_args(avatar_url, None, &format!("{name}'s profile picture"))
    {
        update = update.avatar(media);
    }

    if clear_banner {
        update = update.clear_banner();
    } else if let Some(media) = media_from_args(banner_url, None, &format!("{name}'s banner")) {
        update = update.banner(media);
    }
    update
}

fn name_or_current(client: &SocialClient, name: Option<String>) -> Result<String> {
    name.map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .or_else(|| client.current_username().filter(|_| client.is_logged_in()))
        .ok_or_else(|| {
            anyhow!("требуется авторизация: выполните `social-cli login ...` или укажите имя")
        })
}

fn map_client_error(err: SocialClientError) -> anyhow::Error {
    let message = match &err {
        SocialClientError::Validation(_) => format!("некорректные данные: {}", err.user_message()),
        _ if err.is_unauthorized() => format!(
            "требуется авторизация ({}): выполните `social-cli login ...`",
            err.user_message()
        ),
        SocialClientError::Request { .. } | SocialClientError::UnreadableErrorBody { .. } => {
            err.user_message()
        }
        SocialClientError::Transport(source) => format!("ошибка сети: {source}"),
        SocialClientError::Decode(source) => format!("некорректный ответ сервера: {source}"),
        SocialClientError::InvalidRequest(message) => format!("некорректный запрос: {message}"),
        SocialClientError::Storage(source) => format!("ошибка сохранения сессии: {source}"),
    };
    anyhow!(message)
}

fn print_auth(title: &str, user: &AuthUser) {
    println!("{title}");
    println!("user:");
    println!("  name: {}", user.name);
    println!("  email: {}", user.email);
    if let Some(bio) = &user.bio {
        println!("  bio: {bio}");
    }
}

fn print_post(title: &str, post: &Post) {
    println!("{title}");
    println!("id: {}", post.id);
    println!("title: {}", post.title);
    if let Some(body) = &post.body {
        println!("body: {body}");
    }
    if !post.tags.is_empty() {
        println!("tags: {}", post.tags.join(", "));
    }
    if let Some(media) = &post.media {
        println!("media: {} ({})", media.url, media.alt);
    }
    if let Some(author) = &post.author {
        println!("author: {}", author.name);
    }
    println!("created: {}", post.created);
    if let Some(updated) = post.updated {
        println!("updated: {updated}");
    }
    for reaction in &post.reactions {
        println!("reaction: {} x{}", reaction.symbol, reaction.count);
    }
    for comment in &post.comments {
        println!(
            "comment [{}] {}: {}",
            comment.id,
            comment.owner.as_deref().unwrap_or("?"),
            comment.body
        );
    }
}

fn print_page(page: &Page<Post>) {
    println!(
        "Постов: {} (страница {} из {})",
        page.data.len(),
        page.meta.current_page,
        page.meta.page_count
    );

    for post in &page.data {
        let author = post
            .author
            .as_ref()
            .map(|author| author.name.as_str())
            .unwrap_or("?");
        let count = post.count.unwrap_or_default();
        println!(
            "- [{}] {} (author={}, comments={}, reactions={})",
            post.id, post.title, author, count.comments, count.reactions
        );
    }
}

fn print_reactions(result: &ReactionResult) {
    println!("Реакции поста {}:", result.post_id);
    if result.reactions.is_empty() {
        println!("  (нет)");
    }
    for reaction in &result.reactions {
        println!(
            "  {} x{} ({})",
            reaction.symbol,
            reaction.count,
            reaction.reactors.join(", ")
        );
    }
}

fn print_comment(title: &str, comment: &Comment) {
    println!("{title}");
    println!("id: {}", comment.id);
    println!("body: {}", comment.body);
    if let Some(reply_to) = comment.reply_to_id {
        println!("reply_to: {reply_to}");
    }
    println!("created: {}", comment.created);
}

fn print_profile(profile: &Profile) {
    println!("name: {}", profile.name);
    if let Some(email) = &profile.email {
        println!("email: {email}");
    }
    if let Some(bio) = &profile.bio {
        println!("bio: {bio}");
    }
    if let Some(avatar) = &profile.avatar {
        println!("avatar: {}", avatar.url);
    }
    if let Some(banner) = &profile.banner {
        println!("banner: {}", banner.url);
    }
    if let Some(count) = profile.count {
        println!(
            "posts: {}, followers: {}, following: {}",
            count.posts, count.followers, count.following
        );
    }
    for follower in &profile.followers {
        println!("follower: {}", follower.name);
    }
    for following in &profile.following {
        println!("following: {}", following.name);
    }
    for post in &profile.posts {
        println!("- [{}] {}", post.id, post.title);
    }
}

fn print_follow(title: &str, result: &FollowResult) {
    println!("{title}");
    println!("followers: {}", result.followers.len());
    println!("following: {}", result.following.len());
}
