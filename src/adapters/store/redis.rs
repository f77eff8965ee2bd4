//! Redis-backed identity store for production deployments.
//!
//! Every logical map is a Redis hash keyed by the map name; acknowledgements
//! are one Redis set per class. Multi-key writes go through `MULTI`/`EXEC`
//! pipelines so two teachers can never interleave half of a class mapping.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::collections::BTreeSet;
use tokio::sync::RwLock;

use crate::config::RedisConfig;
use crate::domain::foundation::{ChatHandle, ClassName, MessageRef, Username};
use crate::ports::{IdentityStore, StoreError};

pub const USERNAME_TO_IDS: &str = "USERNAME_TO_IDS";
pub const STUDENTS_TO_CLASS: &str = "STUDENTS_TO_CLASS";
pub const TEACHER_TO_CLASS: &str = "TEACHER_TO_CLASS";
pub const CLASS_TO_TEACHER: &str = "CLASS_TO_TEACHER";
pub const CLASS_TO_MESSAGE_ID: &str = "CLASS_TO_MESSAGE_ID";
const SESSION_ACKS_PREFIX: &str = "SESSION_ACKS";

/// Key of the acknowledgement set for a class.
fn acks_key(class: &ClassName) -> String {
    format!("{}:{}", SESSION_ACKS_PREFIX, class)
}

fn unavailable(e: redis::RedisError) -> StoreError {
    StoreError::unavailable(e.to_string())
}

/// Decodes an `i64`-backed identifier stored as a hash field value.
fn parse_id<T: From<i64>>(
    map: &str,
    field: &str,
    raw: Option<String>,
) -> Result<Option<T>, StoreError> {
    match raw {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<i64>()
            .map(|id| Some(T::from(id)))
            .map_err(|_| StoreError::corrupt(format!("{}/{}", map, field), value)),
    }
}

fn parse_class(
    map: &str,
    field: &str,
    raw: Option<String>,
) -> Result<Option<ClassName>, StoreError> {
    match raw {
        None => Ok(None),
        Some(value) => ClassName::new(&value)
            .map(Some)
            .map_err(|_| StoreError::corrupt(format!("{}/{}", map, field), value)),
    }
}

/// Redis identity store.
///
/// Holds a single multiplexed connection; clones of it are cheap and share
/// the underlying socket. `close` drops it.
pub struct RedisIdentityStore {
    conn: RwLock<Option<MultiplexedConnection>>,
}

impl RedisIdentityStore {
    /// Connects to Redis and verifies the connection with `PING`.
    ///
    /// # Errors
    ///
    /// - `Unavailable` if the URL is invalid, the connection fails or the
    ///   configured timeout elapses
    pub async fn open(config: &RedisConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(config.url.as_str()).map_err(unavailable)?;

        let connect = async {
            let mut conn = client.get_multiplexed_tokio_connection().await?;
            redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
            Ok::<_, redis::RedisError>(conn)
        };

        let conn = tokio::time::timeout(config.timeout(), connect)
            .await
            .map_err(|_| {
                StoreError::unavailable(format!(
                    "timed out after {}s connecting to Redis",
                    config.timeout_secs
                ))
            })?
            .map_err(unavailable)?;

        tracing::info!("Connected to Redis identity store");
        Ok(Self::from_connection(conn))
    }

    /// Wraps an already established connection.
    pub fn from_connection(conn: MultiplexedConnection) -> Self {
        Self {
            conn: RwLock::new(Some(conn)),
        }
    }

    async fn connection(&self) -> Result<MultiplexedConnection, StoreError> {
        self.conn
            .read()
            .await
            .clone()
            .ok_or_else(|| StoreError::unavailable("identity store is closed"))
    }
}

#[async_trait]
impl IdentityStore for RedisIdentityStore {
    async fn register(&self, username: &Username, handle: ChatHandle) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.hset::<_, _, _, ()>(USERNAME_TO_IDS, username.as_str(), handle.as_i64())
            .await
            .map_err(unavailable)
    }

    async fn lookup_chat_handle(
        &self,
        username: &Username,
    ) -> Result<Option<ChatHandle>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn
            .hget(USERNAME_TO_IDS, username.as_str())
            .await
            .map_err(unavailable)?;
        parse_id(USERNAME_TO_IDS, username.as_str(), raw)
    }

    async fn set_student_classes(
        &self,
        enrollments: &[(Username, ClassName)],
    ) -> Result<(), StoreError> {
        if enrollments.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (username, class) in enrollments {
            pipe.hset(STUDENTS_TO_CLASS, username.as_str(), class.as_str())
                .ignore();
        }
        pipe.query_async::<_, ()>(&mut conn).await.map_err(unavailable)
    }

    async fn get_student_class(
        &self,
        username: &Username,
    ) -> Result<Option<ClassName>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn
            .hget(STUDENTS_TO_CLASS, username.as_str())
            .await
            .map_err(unavailable)?;
        parse_class(STUDENTS_TO_CLASS, username.as_str(), raw)
    }

    async fn set_active_class(
        &self,
        teacher: ChatHandle,
        class: &ClassName,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        redis::pipe()
            .atomic()
            .hset(TEACHER_TO_CLASS, teacher.as_i64(), class.as_str())
            .ignore()
            .hset(CLASS_TO_TEACHER, class.as_str(), teacher.as_i64())
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(unavailable)
    }

    async fn get_active_class(&self, teacher: ChatHandle) -> Result<Option<ClassName>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn
            .hget(TEACHER_TO_CLASS, teacher.as_i64())
            .await
            .map_err(unavailable)?;
        parse_class(TEACHER_TO_CLASS, &teacher.to_string(), raw)
    }

    async fn get_active_teacher(
        &self,
        class: &ClassName,
    ) -> Result<Option<ChatHandle>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn
            .hget(CLASS_TO_TEACHER, class.as_str())
            .await
            .map_err(unavailable)?;
        parse_id(CLASS_TO_TEACHER, class.as_str(), raw)
    }

    async fn set_session_message(
        &self,
        class: &ClassName,
        message: MessageRef,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        redis::pipe()
            .atomic()
            .hset(CLASS_TO_MESSAGE_ID, class.as_str(), message.as_i64())
            .ignore()
            .del(acks_key(class))
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(unavailable)
    }

    async fn get_session_message(
        &self,
        class: &ClassName,
    ) -> Result<Option<MessageRef>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn
            .hget(CLASS_TO_MESSAGE_ID, class.as_str())
            .await
            .map_err(unavailable)?;
        parse_id(CLASS_TO_MESSAGE_ID, class.as_str(), raw)
    }

    async fn open_session(
        &self,
        teacher: ChatHandle,
        class: &ClassName,
        message: MessageRef,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        redis::pipe()
            .atomic()
            .hset(TEACHER_TO_CLASS, teacher.as_i64(), class.as_str())
            .ignore()
            .hset(CLASS_TO_TEACHER, class.as_str(), teacher.as_i64())
            .ignore()
            .hset(CLASS_TO_MESSAGE_ID, class.as_str(), message.as_i64())
            .ignore()
            .del(acks_key(class))
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(unavailable)
    }

    async fn record_acknowledgement(
        &self,
        class: &ClassName,
        username: &Username,
    ) -> Result<bool, StoreError> {
        let mut conn = self.connection().await?;
        let added: i64 = conn
            .sadd(acks_key(class), username.as_str())
            .await
            .map_err(unavailable)?;
        Ok(added == 1)
    }

    async fn acknowledged_students(
        &self,
        class: &ClassName,
    ) -> Result<BTreeSet<Username>, StoreError> {
        let mut conn = self.connection().await?;
        let key = acks_key(class);
        let members: Vec<String> = conn.smembers(&key).await.map_err(unavailable)?;
        members
            .into_iter()
            .map(|raw| Username::new(&raw).map_err(|_| StoreError::corrupt(key.clone(), raw)))
            .collect()
    }

    async fn close_session(
        &self,
        teacher: ChatHandle,
        class: &ClassName,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        redis::pipe()
            .atomic()
            .hdel(TEACHER_TO_CLASS, teacher.as_i64())
            .ignore()
            .hdel(CLASS_TO_TEACHER, class.as_str())
            .ignore()
            .hdel(CLASS_TO_MESSAGE_ID, class.as_str())
            .ignore()
            .del(acks_key(class))
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(unavailable)
    }

    async fn close(&self) -> Result<(), StoreError> {
        if self.conn.write().await.take().is_some() {
            tracing::info!("Closed Redis identity store");
        }
        Ok(())
    }
}

impl std::fmt::Debug for RedisIdentityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisIdentityStore").finish_non_exhaustive()
    }
}
