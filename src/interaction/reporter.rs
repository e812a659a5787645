use console::style;

use super::{Interaction, StateObservation, WatchReporter};

impl WatchReporter for Interaction {
    fn report(&self, observation: &StateObservation) {
        // Repeated polls in the same state are not worth a line.
        if !observation.changed {
            return;
        }

        let state = &observation.state;
        let styled_state = if state.is_failure() {
            style(state.to_string()).red()
        } else if state.is_terminal() {
            style(state.to_string()).green()
        } else {
            style(state.to_string()).cyan()
        };

        eprintln!(
            "{} environment {} is {}",
            style(">").dim(),
            observation.environment_id,
            styled_state
        );
    }
}
