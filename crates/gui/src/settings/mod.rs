use strum::EnumString;

pub mod keymap;

/// Where upload progress comes from.
#[derive(Debug, EnumString, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressMode {
    /// Bytes actually handed to the transport.
    #[default]
    Streamed,
    /// Degraded mode: random increments every 200 ms, capped at 90% until
    /// the response arrives. Does not reflect the real transfer.
    Simulated,
}

#[derive(Debug, EnumString, Clone, Copy, PartialEq, Eq)]
pub enum ThemeChoice {
    Dark,
    Light,
}
