//! In-memory/real-tempdir fakes for every port trait in `gm-ports`, used
//! across the workspace's test suites instead of each crate hand-rolling
//! its own doubles.

mod crypto;
mod diagnostics;
mod env;
mod fs_temp;
mod logger;
mod metrics;
mod repository;

pub use crypto::FakeCrypto;
pub use diagnostics::{DiagnosticEvent, FakeDiagnostics};
pub use env::FakeEnv;
pub use fs_temp::FakeFsTemp;
pub use logger::{FakeLogger, LogRecord};
pub use metrics::{CounterCall, FakeMetrics, GaugeCall, TimingCall};
pub use repository::FakeRepository;
