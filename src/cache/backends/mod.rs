pub mod moka;
pub mod null;
pub mod redis;

pub use self::moka::MokaBackend;
pub use self::null::NullBackend;
pub use self::redis::RedisBackend;
