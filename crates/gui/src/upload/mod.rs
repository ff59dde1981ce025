use std::path::PathBuf;

use common::network::Failure;

pub mod widget;

#[derive(Debug, Clone)]
pub enum Msg {
    // Selection
    PathInput(String),
    SubmitPath,
    FileHovered,
    HoverLeft,
    FileDropped(PathBuf),

    // Transfer
    Upload,
    Progress(f32),
    SimulatedTick,
    Finished(Result<String, Failure>),

    // Deferred clean-up
    AutoReset(u64),
    HideProgress(u64),

    Reset,
    DismissAlert(u64),
}
