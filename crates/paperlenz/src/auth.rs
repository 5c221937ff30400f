//! Session state and profile resolution.
//!
//! Authentication itself belongs to a hosted provider; what reaches this crate is an
//! [`Identity`]. [`AuthContext`] turns that identity into a profile [`User`] and publishes the
//! session state to every listener through a [`tokio::sync::watch`] channel:
//!
//! ```text
//! Uninitialized -> Loading -> Authenticated(user)
//!                          -> Anonymous
//! ```
//!
//! Profile resolution never fails. A missing profile is created with defaults, a concurrent
//! creation is resolved by fetching again, and any store failure yields an in-memory profile.
//! [`sign_up`] creates the profile up front with a chosen username and academic level.

use tokio::sync::watch;

use super::*;
use crate::{
  config::UserConfig,
  database::{CreateUser, Database, DatabaseInstruction, GetUser, UpdateUser},
};

/// Who the auth provider says is signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  /// Provider user id
  pub id:    String,
  /// Email address
  pub email: String,
}

impl Identity {
  /// Reads the identity from the `[user]` configuration section.
  ///
  /// # Errors
  ///
  /// Returns [`PaperLenzError::Config`] when the id is missing.
  pub fn from_config(user: &UserConfig) -> Result<Self> {
    let id = user
      .id
      .clone()
      .filter(|id| !id.trim().is_empty())
      .ok_or_else(|| PaperLenzError::Config("No user configured, run `paperlenz init`".into()))?;
    Ok(Self { id, email: user.email.clone().unwrap_or_default() })
  }
}

/// A user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  /// Same as the provider user id
  pub id:             String,
  /// Email address
  pub email:          String,
  /// Display name
  pub username:       String,
  /// Preferred analysis level
  pub academic_level: AcademicLevel,
  /// When the profile was created
  pub created_at:     DateTime<Utc>,
}

impl User {
  /// The profile created for an identity that has none yet.
  ///
  /// The username is `user_<email local part>_<first 8 characters of the id>`.
  pub fn default_for(identity: &Identity) -> Self {
    let local_part = identity.email.split('@').next().unwrap_or_default();
    let id_prefix: String = identity.id.chars().take(8).collect();
    Self {
      id:             identity.id.clone(),
      email:          identity.email.clone(),
      username:       format!("user_{local_part}_{id_prefix}"),
      academic_level: AcademicLevel::default(),
      created_at:     Utc::now(),
    }
  }

  /// The profile created at sign-up, falling back to [`User::default_for`] for unset details.
  pub fn signing_up(identity: &Identity, details: &SignUp) -> Self {
    let mut user = Self::default_for(identity);
    if let Some(username) = details.username() {
      user.username = username.to_string();
    }
    user.academic_level = details.academic_level.unwrap_or_default();
    user
  }
}

/// Profile details chosen when signing up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUp {
  /// Display name
  pub username:       Option<String>,
  /// Preferred analysis level
  pub academic_level: Option<AcademicLevel>,
}

impl SignUp {
  /// The chosen username, if it is not blank.
  pub fn username(&self) -> Option<&str> {
    self.username.as_deref().map(str::trim).filter(|name| !name.is_empty())
  }
}

/// Where profiles are kept.
#[async_trait]
pub trait UserStore: Send + Sync {
  /// Fetches a profile.
  async fn get_user(&self, id: &str) -> Result<Option<User>>;

  /// Inserts a profile, failing with [`PaperLenzError::DuplicateUser`] if it exists.
  async fn create_user(&self, user: User) -> Result<User>;

  /// Applies the set fields of `details` to an existing profile.
  async fn update_user(&self, id: &str, details: &SignUp) -> Result<Option<User>>;
}

#[async_trait]
impl UserStore for Database {
  async fn get_user(&self, id: &str) -> Result<Option<User>> {
    GetUser::by_id(id).execute(&mut self.clone()).await
  }

  async fn create_user(&self, user: User) -> Result<User> {
    CreateUser::new(user).execute(&mut self.clone()).await
  }

  async fn update_user(&self, id: &str, details: &SignUp) -> Result<Option<User>> {
    UpdateUser::new(id)
      .with_username(details.username.clone())
      .with_academic_level(details.academic_level)
      .execute(&mut self.clone())
      .await
  }
}

/// Finds or creates the profile of `identity`.
pub async fn resolve_profile(store: &dyn UserStore, identity: &Identity) -> User {
  match store.get_user(&identity.id).await {
    Ok(Some(user)) => return user,
    Ok(None) => debug!("No profile for {}, creating one", identity.id),
    Err(e) => {
      warn!("Could not fetch profile, using an in-memory profile: {e}");
      return User::default_for(identity);
    },
  }

  match store.create_user(User::default_for(identity)).await {
    Ok(user) => user,
    Err(PaperLenzError::DuplicateUser(_)) => {
      debug!("Profile {} was created concurrently, fetching it", identity.id);
      match store.get_user(&identity.id).await {
        Ok(Some(user)) => user,
        Ok(None) => User::default_for(identity),
        Err(e) => {
          warn!("Could not fetch profile, using an in-memory profile: {e}");
          User::default_for(identity)
        },
      }
    },
    Err(e) => {
      warn!("Could not create profile, using an in-memory profile: {e}");
      User::default_for(identity)
    },
  }
}

/// Creates the profile of a new account with the chosen details.
///
/// Signing up again with the same identity updates the stored profile instead. A store failure
/// yields an in-memory profile carrying the chosen details.
pub async fn sign_up(store: &dyn UserStore, identity: &Identity, details: &SignUp) -> User {
  let candidate = User::signing_up(identity, details);
  match store.create_user(candidate.clone()).await {
    Ok(user) => user,
    Err(PaperLenzError::DuplicateUser(_)) => {
      debug!("Profile {} already exists, updating it", identity.id);
      match store.update_user(&identity.id, details).await {
        Ok(Some(user)) => user,
        Ok(None) => resolve_profile(store, identity).await,
        Err(e) => {
          warn!("Could not update profile, using an in-memory profile: {e}");
          candidate
        },
      }
    },
    Err(e) => {
      warn!("Could not create profile during sign-up, using an in-memory profile: {e}");
      candidate
    },
  }
}

/// Session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
  /// Nothing known yet
  #[default]
  Uninitialized,
  /// The profile is being resolved
  Loading,
  /// Signed in
  Authenticated(User),
  /// Signed out
  Anonymous,
}

/// Session state container.
#[derive(Debug)]
pub struct AuthContext {
  /// Publishes every state change
  state: watch::Sender<AuthState>,
}

impl Default for AuthContext {
  fn default() -> Self { Self::new() }
}

impl AuthContext {
  /// Creates a context in [`AuthState::Uninitialized`].
  pub fn new() -> Self { Self { state: watch::Sender::new(AuthState::Uninitialized) } }

  /// Subscribes to state changes.
  pub fn subscribe(&self) -> watch::Receiver<AuthState> { self.state.subscribe() }

  /// The current state.
  pub fn state(&self) -> AuthState { self.state.borrow().clone() }

  /// The signed-in profile, if any.
  pub fn user(&self) -> Option<User> {
    match &*self.state.borrow() {
      AuthState::Authenticated(user) => Some(user.clone()),
      _ => None,
    }
  }

  /// Starts a session for `identity`, or an anonymous one without it.
  pub async fn sign_in(&self, store: &dyn UserStore, identity: Option<&Identity>) -> AuthState {
    self.state.send_replace(AuthState::Loading);
    let next = match identity {
      Some(identity) => AuthState::Authenticated(resolve_profile(store, identity).await),
      None => AuthState::Anonymous,
    };
    info!("Session state: {}", match &next {
      AuthState::Authenticated(user) => user.username.as_str(),
      _ => "anonymous",
    });
    self.state.send_replace(next.clone());
    next
  }

  /// Ends the session.
  pub fn sign_out(&self) { self.state.send_replace(AuthState::Anonymous); }
}
