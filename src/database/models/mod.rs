pub mod user;

pub use user::{AccountType, NewUser, Preferences, PreferencesPatch, User, UserPatch, UserType};
