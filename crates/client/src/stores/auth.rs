//! Current identity and the sign-in flows.

use std::sync::Arc;

use bitebox_core::{Email, EmailError, OtpCode, OtpError, User, UserRole};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::api::{LoginRequest, Session, SignupRequest, SignupResponse};
use crate::backend::{AuthBackend, NoPushToken, PushTokenProvider};
use crate::error::ApiError;
use crate::storage::{KeyValueStore, StorageError, keys};

/// Errors from [`AuthSession`].
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid verification code: {0}")]
    InvalidOtp(#[from] OtpError),

    #[error("Failed to serialize session: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Details collected by the signup form.
#[derive(Debug, Clone)]
pub struct SignupData {
    pub email: String,
    pub password: SecretString,
    pub name: String,
    pub phone: String,
    pub role: UserRole,
}

/// Outcome of [`AuthSession::signup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupOutcome {
    /// Signed in.
    Authenticated(User),
    /// A code was sent to `email`; call [`AuthSession::verify_otp`] next.
    VerificationRequired { email: Email },
}

/// The signed-in user, if any, backed by durable storage.
///
/// Writes go to storage first; in-memory state only changes once the
/// write succeeded. Tokens are never cached here: the API client rotates the
/// stored access token on refresh.
pub struct AuthSession<B, P = NoPushToken> {
    backend: B,
    push: P,
    store: Arc<dyn KeyValueStore>,
    user: Option<User>,
    has_completed_onboarding: bool,
    is_loading: bool,
}

impl<B, P> std::fmt::Debug for AuthSession<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("user", &self.user.as_ref().map(|u| &u.id))
            .field("has_completed_onboarding", &self.has_completed_onboarding)
            .finish_non_exhaustive()
    }
}

impl<B: AuthBackend> AuthSession<B, NoPushToken> {
    /// Create a session without push notifications.
    pub fn new(backend: B, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_push(backend, NoPushToken, store)
    }
}

impl<B: AuthBackend, P: PushTokenProvider> AuthSession<B, P> {
    /// Create a session that attaches push tokens to sign-in requests.
    pub fn with_push(backend: B, push: P, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            push,
            store,
            user: None,
            has_completed_onboarding: false,
            is_loading: true,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The signed-in user.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Whether a user and a stored access token are both present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.access_token().is_some()
    }

    /// Whether [`Self::load_user`] has yet to run.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[must_use]
    pub const fn has_completed_onboarding(&self) -> bool {
        self.has_completed_onboarding
    }

    /// Current access token, as last written by sign-in or a refresh.
    ///
    /// An unreadable store counts as no token.
    #[must_use]
    pub fn access_token(&self) -> Option<SecretString> {
        match self.store.get(keys::ACCESS_TOKEN) {
            Ok(token) => token.filter(|t| !t.is_empty()).map(SecretString::from),
            Err(e) => {
                warn!(error = %e, "Failed to read access token");
                None
            }
        }
    }

    // =========================================================================
    // Flows
    // =========================================================================

    /// Sign in and persist the session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` before any request if `email` is
    /// malformed, `AuthError::Api` if the backend rejects the credentials, and
    /// `AuthError::Storage` if the session cannot be persisted (in which case
    /// nothing changes in memory either).
    #[instrument(skip(self, password), fields(role = %role))]
    pub async fn login(
        &mut self,
        email: &str,
        password: SecretString,
        role: UserRole,
    ) -> Result<&User, AuthError> {
        let email = Email::parse(email)?;
        let push_token = self.push_token().await;
        let session = self
            .backend
            .login(&LoginRequest {
                email,
                password,
                role,
                push_token,
            })
            .await?;
        self.establish(session)
    }

    /// Create an account.
    ///
    /// When the backend asks for verification no session is stored.
    ///
    /// # Errors
    ///
    /// Same as [`Self::login`].
    #[instrument(skip(self, data), fields(role = %data.role))]
    pub async fn signup(&mut self, data: SignupData) -> Result<SignupOutcome, AuthError> {
        let email = Email::parse(&data.email)?;
        let push_token = self.push_token().await;
        let response = self
            .backend
            .signup(&SignupRequest {
                email: email.clone(),
                password: data.password,
                name: data.name,
                phone: data.phone,
                role: data.role,
                push_token,
            })
            .await?;

        match response {
            SignupResponse::VerificationRequired => {
                info!("Signup requires verification");
                Ok(SignupOutcome::VerificationRequired { email })
            }
            SignupResponse::Session(session) => {
                Ok(SignupOutcome::Authenticated(self.establish(session)?.clone()))
            }
        }
    }

    /// Complete a pending signup with the emailed code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidOtp` without contacting the backend unless
    /// `code` is exactly six digits.
    #[instrument(skip(self, code))]
    pub async fn verify_otp(&mut self, email: &str, code: &str) -> Result<&User, AuthError> {
        let email = Email::parse(email)?;
        let code = OtpCode::parse(code)?;
        let session = self.backend.verify_otp(&email, &code).await?;
        self.establish(session)
    }

    /// Send a new verification code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if `email` is malformed or the request fails.
    #[instrument(skip(self))]
    pub async fn resend_otp(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        self.backend.resend_otp(&email).await?;
        Ok(())
    }

    /// Forget the session. Never fails; storage errors are logged.
    pub fn logout(&mut self) {
        if let Err(e) = self.store.remove_many(&keys::ALL) {
            error!(error = %e, "Failed to clear stored session");
        }
        self.user = None;
        self.has_completed_onboarding = false;
        info!("Signed out");
    }

    /// Remember that onboarding has been shown.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the flag cannot be written.
    pub fn complete_onboarding(&mut self) -> Result<(), AuthError> {
        self.store.set(keys::ONBOARDING_DONE, "true")?;
        self.has_completed_onboarding = true;
        Ok(())
    }

    /// Restore state from storage at startup.
    ///
    /// A cached user without an access token does not count as signed in. An
    /// unreadable user record is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if storage cannot be read.
    pub fn load_user(&mut self) -> Result<(), AuthError> {
        let result = self.hydrate();
        self.is_loading = false;
        result
    }

    fn hydrate(&mut self) -> Result<(), AuthError> {
        self.has_completed_onboarding =
            self.store.get(keys::ONBOARDING_DONE)?.as_deref() == Some("true");

        let access_token = self
            .store
            .get(keys::ACCESS_TOKEN)?
            .filter(|t| !t.is_empty());
        let user = match self.store.get(keys::USER)? {
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "Ignoring unreadable stored user");
                    None
                }
            },
            None => None,
        };

        if access_token.is_some() {
            self.user = user;
        }
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn push_token(&self) -> Option<String> {
        match self.push.push_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Continuing without push token");
                None
            }
        }
    }

    /// Persist `session`, then adopt it in memory.
    fn establish(&mut self, session: Session) -> Result<&User, AuthError> {
        let Session { user, tokens } = session;
        let user_json = serde_json::to_string(&user)?;

        let access = tokens.access_token.expose_secret();
        match &tokens.refresh_token {
            Some(refresh) => self.store.set_many(&[
                (keys::USER, user_json.as_str()),
                (keys::ACCESS_TOKEN, access),
                (keys::REFRESH_TOKEN, refresh.expose_secret()),
            ])?,
            None => {
                self.store
                    .set_many(&[(keys::USER, user_json.as_str()), (keys::ACCESS_TOKEN, access)])?;
                self.store.remove(keys::REFRESH_TOKEN)?;
            }
        }

        info!(user_id = %user.id, role = %user.role, "Signed in");
        Ok(self.user.insert(user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bitebox_core::UserId;
    use chrono::Utc;

    use super::*;
    use crate::api::AuthTokens;
    use crate::backend::PushTokenError;
    use crate::storage::MemoryStore;

    #[derive(Default)]
    struct FakeAuth {
        requires_verification: bool,
        omit_refresh: bool,
        calls: AtomicUsize,
        last_push_token: Mutex<Option<String>>,
    }

    impl FakeAuth {
        fn session(&self, email: &Email, role: UserRole) -> Session {
            Session {
                user: User {
                    id: UserId::new("u1"),
                    email: email.to_string(),
                    name: "Kola".to_string(),
                    phone: "+2348000000000".to_string(),
                    role,
                    avatar: None,
                    created_at: Utc::now(),
                },
                tokens: AuthTokens {
                    access_token: SecretString::from("at-1"),
                    refresh_token: (!self.omit_refresh).then(|| SecretString::from("rt-1")),
                },
            }
        }
    }

    impl AuthBackend for FakeAuth {
        async fn login(&self, request: &LoginRequest) -> Result<Session, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_push_token.lock().unwrap() = request.push_token.clone();
            if request.password.expose_secret() != "secret" {
                return Err(ApiError::Http {
                    status: 401,
                    body: "invalid credentials".to_string(),
                });
            }
            Ok(self.session(&request.email, request.role))
        }

        async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.requires_verification {
                return Ok(SignupResponse::VerificationRequired);
            }
            Ok(SignupResponse::Session(
                self.session(&request.email, request.role),
            ))
        }

        async fn verify_otp(&self, email: &Email, _code: &OtpCode) -> Result<Session, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.session(email, UserRole::Customer))
        }

        async fn resend_otp(&self, _email: &Email) -> Result<(), ApiError> {
            Ok(())
        }
    }

    struct BrokenPush;

    impl PushTokenProvider for BrokenPush {
        async fn push_token(&self) -> Result<Option<String>, PushTokenError> {
            Err(PushTokenError("permission denied".to_string()))
        }
    }

    fn signup_data() -> SignupData {
        SignupData {
            email: "kola@bitebox.ng".to_string(),
            password: SecretString::from("secret"),
            name: "Kola".to_string(),
            phone: "+2348000000000".to_string(),
            role: UserRole::Customer,
        }
    }

    #[tokio::test]
    async fn test_login_persists_session() {
        let store = Arc::new(MemoryStore::new());
        let mut auth = AuthSession::new(FakeAuth::default(), store.clone());

        let user = auth
            .login("Kola@Bitebox.ng", SecretString::from("secret"), UserRole::Delivery)
            .await
            .unwrap();
        assert_eq!(user.role, UserRole::Delivery);
        assert_eq!(user.email, "Kola@Bitebox.ng");
        assert!(auth.is_authenticated());

        assert_eq!(store.get(keys::ACCESS_TOKEN).unwrap().as_deref(), Some("at-1"));
        assert_eq!(store.get(keys::REFRESH_TOKEN).unwrap().as_deref(), Some("rt-1"));
        let stored: User = serde_json::from_str(&store.get(keys::USER).unwrap().unwrap()).unwrap();
        assert_eq!(stored.role, UserRole::Delivery);
    }

    #[tokio::test]
    async fn test_access_token_follows_stored_refresh() {
        let store = Arc::new(MemoryStore::new());
        let mut auth = AuthSession::new(FakeAuth::default(), store.clone());
        auth.login("kola@bitebox.ng", SecretString::from("secret"), UserRole::Customer)
            .await
            .unwrap();
        assert_eq!(auth.access_token().unwrap().expose_secret(), "at-1");

        // What ApiClient writes after a successful refresh
        store.set(keys::ACCESS_TOKEN, "at-2").unwrap();
        assert_eq!(auth.access_token().unwrap().expose_secret(), "at-2");
        assert!(auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_without_refresh_token_clears_key() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::REFRESH_TOKEN, "stale").unwrap();
        let backend = FakeAuth {
            omit_refresh: true,
            ..FakeAuth::default()
        };
        let mut auth = AuthSession::new(backend, store.clone());
        auth.login("kola@bitebox.ng", SecretString::from("secret"), UserRole::Customer)
            .await
            .unwrap();
        assert_eq!(store.get(keys::REFRESH_TOKEN).unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_login_leaves_state_untouched() {
        let store = Arc::new(MemoryStore::new());
        let mut auth = AuthSession::new(FakeAuth::default(), store.clone());
        let err = auth
            .login("kola@bitebox.ng", SecretString::from("wrong"), UserRole::Customer)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Api(ref e) if e.is_unauthorized()));
        assert!(!auth.is_authenticated());
        assert_eq!(store.get(keys::USER).unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_email_is_rejected_locally() {
        let backend = FakeAuth::default();
        let mut auth = AuthSession::new(backend, Arc::new(MemoryStore::new()));
        let err = auth
            .login("not-an-email", SecretString::from("secret"), UserRole::Customer)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail(_)));
        assert_eq!(auth.backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_push_token_failure_does_not_block_login() {
        let mut auth =
            AuthSession::with_push(FakeAuth::default(), BrokenPush, Arc::new(MemoryStore::new()));
        auth.login("kola@bitebox.ng", SecretString::from("secret"), UserRole::Customer)
            .await
            .unwrap();
        assert!(auth.is_authenticated());
        assert_eq!(*auth.backend.last_push_token.lock().unwrap(), None);
    }

    #[tokio::test]
    async fn test_signup_requiring_verification_stores_nothing() {
        let store = Arc::new(MemoryStore::new());
        let backend = FakeAuth {
            requires_verification: true,
            ..FakeAuth::default()
        };
        let mut auth = AuthSession::new(backend, store.clone());

        let outcome = auth.signup(signup_data()).await.unwrap();
        assert!(matches!(outcome, SignupOutcome::VerificationRequired { ref email } if email.as_str() == "kola@bitebox.ng"));
        assert!(!auth.is_authenticated());
        assert_eq!(store.get(keys::ACCESS_TOKEN).unwrap(), None);
    }

    #[tokio::test]
    async fn test_signup_with_session_signs_in() {
        let mut auth = AuthSession::new(FakeAuth::default(), Arc::new(MemoryStore::new()));
        let outcome = auth.signup(signup_data()).await.unwrap();
        assert!(matches!(outcome, SignupOutcome::Authenticated(_)));
        assert!(auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_verify_rejects_malformed_code_before_network() {
        let mut auth = AuthSession::new(FakeAuth::default(), Arc::new(MemoryStore::new()));
        for bad in ["12345", "1234567", "12a456", ""] {
            let err = auth.verify_otp("kola@bitebox.ng", bad).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidOtp(_)), "{bad:?}");
        }
        assert_eq!(auth.backend.calls.load(Ordering::SeqCst), 0);

        auth.verify_otp("kola@bitebox.ng", "123456").await.unwrap();
        assert!(auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_clears_everything_and_never_fails() {
        let store = Arc::new(MemoryStore::new());
        let mut auth = AuthSession::new(FakeAuth::default(), store.clone());
        auth.logout();

        auth.login("kola@bitebox.ng", SecretString::from("secret"), UserRole::Customer)
            .await
            .unwrap();
        auth.complete_onboarding().unwrap();
        auth.logout();

        assert!(!auth.is_authenticated());
        assert!(!auth.has_completed_onboarding());
        for key in keys::ALL {
            assert_eq!(store.get(key).unwrap(), None, "{key}");
        }
    }

    #[test]
    fn test_cached_user_without_token_is_not_authenticated() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                keys::USER,
                r#"{"id":"u1","email":"kola@bitebox.ng","name":"Kola","phone":"","role":"delivery","avatar":null,"createdAt":"2025-01-01T00:00:00Z"}"#,
            )
            .unwrap();
        store.set(keys::ONBOARDING_DONE, "true").unwrap();

        let mut auth = AuthSession::new(FakeAuth::default(), store.clone());
        assert!(auth.is_loading());
        auth.load_user().unwrap();
        assert!(!auth.is_loading());
        assert!(!auth.is_authenticated());
        assert!(auth.user().is_none());
        assert!(auth.has_completed_onboarding());

        store.set(keys::ACCESS_TOKEN, "at-1").unwrap();
        auth.load_user().unwrap();
        assert!(auth.is_authenticated());
        assert_eq!(auth.user().unwrap().role, UserRole::Delivery);
    }

    #[test]
    fn test_corrupt_user_record_is_ignored() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::USER, "{not json").unwrap();
        store.set(keys::ACCESS_TOKEN, "at-1").unwrap();
        let mut auth = AuthSession::new(FakeAuth::default(), store);
        auth.load_user().unwrap();
        assert!(!auth.is_authenticated());
    }
}
