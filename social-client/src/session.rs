//! Хранение сессии: токен и имя пользователя.

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::SocialClientResult;

/// Ключ, под которым хранится bearer-токен.
pub const TOKEN_KEY: &str = "authToken";
/// Ключ, под которым хранится имя пользователя.
pub const USERNAME_KEY: &str = "userName";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Сессия авторизованного пользователя.
pub struct Session {
    /// Bearer-токен.
    #[serde(rename = "authToken")]
    pub token: String,
    /// Имя пользователя.
    #[serde(rename = "userName")]
    pub username: String,
}

impl Session {
    /// Создаёт сессию.
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
        }
    }
}

/// Хранилище сессии, которое клиент читает перед каждым запросом.
///
/// `load` никогда не падает: нечитаемое хранилище означает анонимного
/// пользователя.
pub trait SessionStore: Debug + Send + Sync {
    /// Текущая сессия, если есть.
    fn load(&self) -> Option<Session>;

    /// Сохраняет сессию, заменяя предыдущую.
    fn save(&self, session: &Session) -> SocialClientResult<()>;

    /// Удаляет сессию. Очистка пустого хранилища не ошибка.
    fn clear(&self) -> SocialClientResult<()>;

    /// Bearer-токен текущей сессии.
    fn token(&self) -> Option<String> {
        self.load().map(|session| session.token)
    }

    /// Имя пользователя текущей сессии.
    fn username(&self) -> Option<String> {
        self.load().map(|session| session.username)
    }

    /// Есть ли непустой токен.
    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

fn parse_token(raw: &str) -> Option<String> {
    let token = raw.trim().to_string();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn normalize(session: Session) -> Option<Session> {
    let token = parse_token(&session.token)?;
    Some(Session {
        token,
        username: session.username.trim().to_string(),
    })
}

fn parse_session(raw: &str) -> Option<Session> {
    serde_json::from_str::<Session>(raw).ok().and_then(normalize)
}

#[derive(Debug, Default)]
/// Сессия в памяти процесса.
pub struct MemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    /// Создаёт пустое хранилище.
    pub fn new() -> Self {
        Self::default()
    }

    /// Создаёт хранилище с уже известной сессией.
    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(normalize(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, session: &Session) -> SocialClientResult<()> {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) =
            normalize(session.clone());
        Ok(())
    }

    fn clear(&self) -> SocialClientResult<()> {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[derive(Debug, Clone)]
/// Сессия в JSON-файле `{"authToken": ..., "userName": ...}`.
///
/// Файл перечитывается при каждом обращении, поэтому несколько процессов
/// видят последнюю записанную сессию.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Создаёт хранилище поверх файла `path`. Файл может не существовать.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Путь к файлу сессии.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<Session> {
        let raw = fs::read_to_string(&self.path).ok()?;
        parse_session(&raw)
    }

    fn save(&self, session: &Session) -> SocialClientResult<()> {
        // сессия с пустым токеном равносильна выходу
        let Some(session) = normalize(session.clone()) else {
            return self.clear();
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&session)?;
        write_private(&self.path, raw.as_bytes())?;
        Ok(())
    }

    fn clear(&self) -> SocialClientResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Файл с токеном доступен только владельцу.
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    use std::fs::{OpenOptions, Permissions};
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode применяется только при создании файла
    file.set_permissions(Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    fs::write(path, contents)
}
