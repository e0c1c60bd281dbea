// 账户流程：注册、登录、登出

pub mod service;
pub mod validation;

pub use service::{AccountError, AccountService};
pub use validation::{SignInForm, SignUpForm, ValidationErrors};
