use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 用户角色
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    General,
    Student,
    Researcher,
    Scientist,
}

impl UserType {
    /// 非普通用户必须填写所属机构
    pub fn requires_institution(self) -> bool {
        self != UserType::General
    }
}

/// 账户等级
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    #[default]
    Basic,
    Premium,
    Enterprise,
}

/// 用户偏好设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub theme: String,
    pub notifications: bool,
    pub language: String,
    pub auto_save: bool,
    pub font_size: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            theme: "light".into(),
            notifications: true,
            language: "english".into(),
            auto_save: true,
            font_size: "medium".into(),
        }
    }
}

/// 偏好设置的部分更新
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_save: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
}

impl Preferences {
    /// 在调用方完成嵌套合并，存储库只做顶层浅合并
    pub fn merged(&self, patch: PreferencesPatch) -> Preferences {
        Preferences {
            theme: patch.theme.unwrap_or_else(|| self.theme.clone()),
            notifications: patch.notifications.unwrap_or(self.notifications),
            language: patch.language.unwrap_or_else(|| self.language.clone()),
            auto_save: patch.auto_save.unwrap_or(self.auto_save),
            font_size: patch.font_size.unwrap_or_else(|| self.font_size.clone()),
        }
    }
}

/// 用户记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub user_type: UserType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default)]
    pub account_type: AccountType,
    #[serde(default)]
    pub preferences: Preferences,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 创建用户请求，除邮箱外均可省略
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
}

impl NewUser {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        NewUser {
            email: email.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// 生成完整记录；ID 与时间戳由存储库提供
    pub fn into_user(self, id: String, now: DateTime<Utc>) -> User {
        let username = self
            .username
            .unwrap_or_else(|| email_local_part(&self.email).to_string());

        User {
            id,
            username,
            email: self.email,
            name: self.name,
            phone: self.phone.unwrap_or_default(),
            user_type: self.user_type.unwrap_or_default(),
            institution: self.institution.filter(|i| !i.is_empty()),
            account_type: self.account_type.unwrap_or_default(),
            preferences: self.preferences.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// 用户记录的部分更新（顶层浅合并）
///
/// `id`、`createdAt`、`updatedAt` 不在可更新字段中
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        *self == UserPatch::default()
    }

    /// 合并到已有记录，未设置的字段保持不变
    pub fn apply(self, user: &mut User) {
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(phone) = self.phone {
            user.phone = phone;
        }
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(user_type) = self.user_type {
            user.user_type = user_type;
        }
        if let Some(institution) = self.institution {
            // 空字符串表示清除
            user.institution = Some(institution).filter(|i| !i.is_empty());
        }
        if let Some(account_type) = self.account_type {
            user.account_type = account_type;
        }
        if let Some(preferences) = self.preferences {
            user.preferences = preferences;
        }
    }

    /// 后一个补丁中已设置的字段覆盖前一个
    pub fn merge(mut self, later: UserPatch) -> UserPatch {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if later.$field.is_some() {
                    self.$field = later.$field;
                })*
            };
        }
        take!(email, name, phone, username, user_type, institution, account_type, preferences);
        self
    }
}

fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}
