use std::sync::Arc;

use thiserror::Error;

use super::validation::{SignInForm, SignUpForm, ValidationErrors};
use crate::database::models::{AccountType, NewUser, Preferences, User};
use crate::database::UserRepository;
use crate::error::RepositoryError;
use crate::session::IdentityStore;

/// 账户流程错误，`Display` 即界面提示文案
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error("An account with this email already exists")]
    EmailTaken,
    #[error("No account found with this email. Please sign up first.")]
    NoAccount,
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for AccountError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::DuplicateKey { .. } => AccountError::EmailTaken,
            other => AccountError::Repository(other),
        }
    }
}

/// 注册与登录
///
/// 登录不校验密码：任意非空密码都会被接受，没有存储凭据可供比对。
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    identity: Arc<IdentityStore>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>, identity: Arc<IdentityStore>) -> Self {
        Self { users, identity }
    }

    pub fn identity(&self) -> &Arc<IdentityStore> {
        &self.identity
    }

    pub async fn sign_up(&self, form: SignUpForm) -> Result<User, AccountError> {
        form.validate()?;

        let institution = form
            .role
            .requires_institution()
            .then(|| form.institution.trim().to_string());
        let new_user = NewUser {
            email: form.email.trim().to_string(),
            name: form.full_name.trim().to_string(),
            phone: Some(String::new()),
            username: None,
            user_type: Some(form.role),
            institution,
            account_type: Some(AccountType::Basic),
            preferences: Some(Preferences::default()),
        };

        let user = self.users.create(new_user).await?;
        tracing::info!("Signed up user: {}", user.id);

        self.identity.login(user.clone()).await;
        Ok(user)
    }

    pub async fn sign_in(&self, form: SignInForm) -> Result<User, AccountError> {
        form.validate()?;

        let user = self
            .users
            .get_by_email(form.email.trim())
            .await?
            .ok_or(AccountError::NoAccount)?;

        self.identity.login(user.clone()).await;
        Ok(user)
    }

    pub async fn sign_out(&self) {
        self.identity.logout().await;
    }
}
