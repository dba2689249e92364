use gm_ports::{CryptoPort, FsTempPort, RepositoryPort, TelemetryPorts};

/// Everything a port needs to talk to the outside world: the repository
/// substrate, a scratch-file area, randomness, and the telemetry trio.
///
/// This is the "small state object referencing its context" the
/// specification's §4.J describes each port as owning -- in Rust it
/// collapses to a bundle of borrowed trait objects, `Copy` because every
/// field is itself a reference. A port holds one of these for its whole
/// lifetime rather than threading four parameters through every method.
#[derive(Clone, Copy)]
pub struct PortContext<'a> {
    pub repo: &'a dyn RepositoryPort,
    pub fs_temp: &'a dyn FsTempPort,
    pub crypto: &'a dyn CryptoPort,
    pub telemetry: TelemetryPorts<'a>,
}

impl<'a> PortContext<'a> {
    pub const fn new(
        repo: &'a dyn RepositoryPort,
        fs_temp: &'a dyn FsTempPort,
        crypto: &'a dyn CryptoPort,
        telemetry: TelemetryPorts<'a>,
    ) -> Self {
        Self {
            repo,
            fs_temp,
            crypto,
            telemetry,
        }
    }
}
