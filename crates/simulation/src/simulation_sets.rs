//! Deterministic ride simulation ordering via `SystemSet` phases.
//!
//! Every coaster system in `FixedUpdate` lives in one of these sets, so the
//! order between restoring rides, moving trains and reporting is explicit.
//!
//! ```text
//! PreSim  →  Simulation  →  PostSim
//! ```
//!
//! * **PreSim** – Tick counter, restoring rides from a loaded snapshot,
//!   daily breakdown bookkeeping (driven by the external calendar).
//! * **Simulation** – Train integration along every assembled loop and the
//!   resulting car-end display updates in the voxel world.
//! * **PostSim** – Read-only reporting: state-change notifications and
//!   statistics for the park/financial collaborator and the GUI.

use bevy::prelude::*;

/// Ordered phases for systems running in the `FixedUpdate` schedule.
///
/// Configured as a chain by [`configure_simulation_sets`].
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Tick counter, snapshot restore, daily ride maintenance.
    PreSim,
    /// Train movement and car display updates.
    Simulation,
    /// Notifications and statistics. Never mutates ride state.
    PostSim,
}

pub(crate) fn configure_simulation_sets(app: &mut App) {
    app.configure_sets(
        FixedUpdate,
        (
            SimulationSet::PreSim,
            SimulationSet::Simulation,
            SimulationSet::PostSim,
        )
            .chain(),
    );
}
