use crate::{LoadingMethod, Route, RunId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Move the client to another screen.
    Navigate(Route),
    /// Begin one independent load per method, tagged with the run id.
    StartViewers {
        run_id: RunId,
        methods: Vec<LoadingMethod>,
    },
    /// Cancel pending work and unload every active viewer.
    ResetViewers,
}
