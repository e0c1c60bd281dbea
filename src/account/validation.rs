use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::database::models::UserType;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("valid email pattern"));

/// 最短密码长度
pub const MIN_PASSWORD_LEN: usize = 8;

/// 表单字段 -> 错误信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.values().map(String::as_str).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

fn check_email(email: &str, errors: &mut ValidationErrors) {
    if email.trim().is_empty() {
        errors.add("email", "Email is required");
    } else if !EMAIL_PATTERN.is_match(email) {
        errors.add("email", "Email is invalid");
    }
}

/// 注册表单（两步）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub role: UserType,
    #[serde(default)]
    pub institution: String,
}

impl SignUpForm {
    /// 第一步：基本信息
    pub fn validate_basic_info(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.full_name.trim().is_empty() {
            errors.add("fullName", "Full name is required");
        }
        check_email(&self.email, &mut errors);
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.add("password", "Password must be at least 8 characters");
        }
        if self.password != self.confirm_password {
            errors.add("confirmPassword", "Passwords do not match");
        }

        errors.into_result()
    }

    /// 第二步：角色与机构
    pub fn validate_role(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.role.requires_institution() && self.institution.trim().is_empty() {
            errors.add("institution", "Institution is required for this role");
        }
        errors.into_result()
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.validate_basic_info()?;
        self.validate_role()
    }
}

/// 登录表单
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

impl SignInForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_email(&self.email, &mut errors);
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.into_result()
    }
}
