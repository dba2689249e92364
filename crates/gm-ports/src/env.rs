/// Abstract interface onto process environment variables.
///
/// Used only for telemetry configuration (`GITMIND_*` variables); nothing
/// else in the core consults the environment directly, so injecting this
/// rather than calling `std::env::var` keeps telemetry config tests
/// hermetic.
pub trait EnvPort {
    /// Look up `key`, returning `None` when unset.
    fn get(&self, key: &str) -> Option<String>;
}

/// An [`EnvPort`] backed by the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl EnvPort for SystemEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}
