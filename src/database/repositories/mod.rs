pub mod local;
pub mod remote;

pub use local::LocalUserRepository;
pub use remote::RemoteUserRepository;
