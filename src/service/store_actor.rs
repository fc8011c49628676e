use crate::db::models::{DbUser, NewUser, SessionUser, UserId};
use crate::db::sqlite::SiteStorage;
use crate::error::SiteError;
use crate::service::session_token::new_session_id;

use chrono::{DateTime, Utc};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use std::time::Duration;
use tokio_stream::{StreamExt, wrappers::IntervalStream};
use tracing::{debug, info, warn};

/// A freshly issued session.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub id: String,
    pub expires_at: DateTime<Utc>,
}

/// Messages handled by the store actor.
#[derive(Debug)]
pub enum StoreMessage {
    CreateUser(NewUser, RpcReplyPort<Result<UserId, SiteError>>),
    FindUserByEmail(String, RpcReplyPort<Result<Option<DbUser>, SiteError>>),
    CreateSession(SessionUser, RpcReplyPort<Result<IssuedSession, SiteError>>),
    /// Resolve a session id; expired sessions are deleted and reported as `None`.
    GetSession(String, RpcReplyPort<Result<Option<SessionUser>, SiteError>>),
    DeleteSession(String, RpcReplyPort<Result<bool, SiteError>>),
    /// Sent by the background ticker.
    PurgeExpired,
}

/// Handle for interacting with the store actor.
#[derive(Clone)]
pub struct StoreHandle {
    actor: ActorRef<StoreMessage>,
}

fn rpc_err(op: &str) -> impl FnOnce(ractor::RactorErr<StoreMessage>) -> SiteError + '_ {
    move |e| SiteError::RactorError(format!("{op} RPC failed: {e}"))
}

impl StoreHandle {
    pub async fn create_user(&self, user: NewUser) -> Result<UserId, SiteError> {
        ractor::call!(self.actor, StoreMessage::CreateUser, user).map_err(rpc_err("CreateUser"))?
    }

    pub async fn find_user_by_email(
        &self,
        email: impl AsRef<str>,
    ) -> Result<Option<DbUser>, SiteError> {
        ractor::call!(
            self.actor,
            StoreMessage::FindUserByEmail,
            email.as_ref().to_string()
        )
        .map_err(rpc_err("FindUserByEmail"))?
    }

    pub async fn create_session(&self, user: SessionUser) -> Result<IssuedSession, SiteError> {
        ractor::call!(self.actor, StoreMessage::CreateSession, user)
            .map_err(rpc_err("CreateSession"))?
    }

    pub async fn get_session(
        &self,
        id: impl AsRef<str>,
    ) -> Result<Option<SessionUser>, SiteError> {
        ractor::call!(self.actor, StoreMessage::GetSession, id.as_ref().to_string())
            .map_err(rpc_err("GetSession"))?
    }

    /// Idempotent: returns `Ok(false)` when nothing was stored under `id`.
    pub async fn delete_session(&self, id: impl AsRef<str>) -> Result<bool, SiteError> {
        ractor::call!(
            self.actor,
            StoreMessage::DeleteSession,
            id.as_ref().to_string()
        )
        .map_err(rpc_err("DeleteSession"))?
    }

    /// Stop the actor; subsequent calls fail with `SiteError::RactorError`.
    pub fn stop(&self) {
        self.actor.stop(None);
    }
}

/// Internal state held by the store actor
struct StoreActorState {
    storage: SiteStorage,
    session_ttl: chrono::Duration,
}

/// ractor-based owner of the user and session tables
struct StoreActor;

#[ractor::async_trait]
impl Actor for StoreActor {
    type Msg = StoreMessage;
    type State = StoreActorState;
    type Arguments = (SiteStorage, chrono::Duration);

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        arguments: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let (storage, session_ttl) = arguments;
        let purged = storage
            .purge_expired(Utc::now())
            .await
            .map_err(|e| ActorProcessingErr::from(format!("initial session purge failed: {e}")))?;
        info!(
            purged,
            ttl_hours = session_ttl.num_hours(),
            "StoreActor started"
        );
        Ok(StoreActorState {
            storage,
            session_ttl,
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            StoreMessage::CreateUser(user, rp) => {
                let res = state.storage.insert_user(user).await;
                if let Ok(id) = &res {
                    info!(user_id = id, "user created");
                }
                let _ = rp.send(res);
            }
            StoreMessage::FindUserByEmail(email, rp) => {
                let _ = rp.send(state.storage.find_user_by_email(&email).await);
            }
            StoreMessage::CreateSession(user, rp) => {
                let _ = rp.send(self.handle_create_session(state, user).await);
            }
            StoreMessage::GetSession(id, rp) => {
                let _ = rp.send(self.handle_get_session(state, &id).await);
            }
            StoreMessage::DeleteSession(id, rp) => {
                let res = state.storage.delete_session(&id).await;
                if let Ok(true) = res {
                    debug!("session destroyed");
                }
                let _ = rp.send(res);
            }
            StoreMessage::PurgeExpired => match state.storage.purge_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(purged) => info!(purged, "expired sessions purged"),
                Err(e) => warn!(error = %e, "expired session purge failed"),
            },
        }
        Ok(())
    }
}

impl StoreActor {
    async fn handle_create_session(
        &self,
        state: &mut StoreActorState,
        user: SessionUser,
    ) -> Result<IssuedSession, SiteError> {
        let id = new_session_id();
        let expires_at = Utc::now() + state.session_ttl;
        state.storage.insert_session(&id, &user, expires_at).await?;
        debug!(user_id = user.id, %expires_at, "session created");
        Ok(IssuedSession { id, expires_at })
    }

    async fn handle_get_session(
        &self,
        state: &mut StoreActorState,
        id: &str,
    ) -> Result<Option<SessionUser>, SiteError> {
        let now = Utc::now();
        match state.storage.get_session(id, now).await? {
            Some(session) => Ok(Some(session.user())),
            None => {
                // Drop the row if it exists but has lapsed.
                state.storage.delete_session(id).await?;
                Ok(None)
            }
        }
    }
}

/// Spawn the store actor plus a ticker that purges expired sessions every
/// `purge_interval`.
pub async fn spawn(
    storage: SiteStorage,
    session_ttl: chrono::Duration,
    purge_interval: Duration,
) -> Result<StoreHandle, SiteError> {
    let (actor, _jh) = Actor::spawn(None, StoreActor, (storage, session_ttl))
        .await
        .map_err(|e| SiteError::RactorError(format!("failed to spawn StoreActor: {e}")))?;

    let ticker = actor.clone();
    tokio::spawn(async move {
        let mut ticks = IntervalStream::new(tokio::time::interval(purge_interval)).skip(1);
        while ticks.next().await.is_some() {
            if ractor::cast!(ticker, StoreMessage::PurgeExpired).is_err() {
                debug!("store actor gone; purge ticker exiting");
                break;
            }
        }
    });

    Ok(StoreHandle { actor })
}
