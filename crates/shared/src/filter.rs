use crate::models::FilterSelection;
use crate::sequence::{Sequencer, Ticket};

/// What to do with the municipality list after a filter change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MunicipalityListAction {
    /// Load the municipalities of `state`; apply the answer only while
    /// `ticket` is still current.
    Fetch { state: String, ticket: Ticket },
    /// No state selected: the control was cleared and disabled.
    Disable,
    /// A municipality is selected: the list stays as it is.
    Keep,
}

/// Result of evaluating the two select controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterUpdate {
    /// Selection the stats and layer refreshes must use.
    pub selection: FilterSelection,
    pub municipality_list: MunicipalityListAction,
    /// The state changed, so a previously chosen municipality was dropped.
    pub municipality_reset: bool,
}

/// Work started by a filter change, in dispatch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEffect {
    LoadMunicipalities { state: String, ticket: Ticket },
    RefreshStats(FilterSelection),
    RebuildLayers(FilterSelection),
}

impl FilterUpdate {
    /// Stats and both overlay layers refresh on every change; the
    /// municipality list load runs alongside and its outcome does not gate
    /// them.
    pub fn effects(self) -> Vec<FilterEffect> {
        let mut effects = Vec::with_capacity(3);
        if let MunicipalityListAction::Fetch { state, ticket } = self.municipality_list {
            effects.push(FilterEffect::LoadMunicipalities { state, ticket });
        }
        effects.push(FilterEffect::RefreshStats(self.selection.clone()));
        effects.push(FilterEffect::RebuildLayers(self.selection));
        effects
    }
}

/// Tracks the state/municipality selects and the municipality options.
#[derive(Debug, Clone)]
pub struct FilterController {
    last_state: String,
    selection: FilterSelection,
    options: Vec<String>,
    disabled: bool,
    list_requests: Sequencer,
}

impl Default for FilterController {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterController {
    pub fn new() -> Self {
        Self {
            last_state: String::new(),
            selection: FilterSelection::all(),
            options: Vec::new(),
            disabled: true,
            list_requests: Sequencer::new(),
        }
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn municipality_options(&self) -> &[String] {
        &self.options
    }

    pub fn municipality_disabled(&self) -> bool {
        self.disabled
    }

    /// Evaluate the current select values after a change on either control.
    pub fn apply(&mut self, state: &str, municipality: &str) -> FilterUpdate {
        let mut municipality = municipality.to_string();
        let mut municipality_reset = false;

        if state != self.last_state {
            municipality_reset = !municipality.is_empty();
            municipality.clear();
            self.last_state = state.to_string();
        }

        self.selection = FilterSelection::new(state, municipality.clone());

        let municipality_list = if !state.is_empty() && municipality.is_empty() {
            self.options.clear();
            self.disabled = true;
            MunicipalityListAction::Fetch {
                state: state.to_string(),
                ticket: self.list_requests.issue(),
            }
        } else if municipality.is_empty() {
            self.options.clear();
            self.disabled = true;
            // An answer still in flight belongs to a state no longer selected.
            self.list_requests.issue();
            MunicipalityListAction::Disable
        } else {
            MunicipalityListAction::Keep
        };

        FilterUpdate {
            selection: self.selection.clone(),
            municipality_list,
            municipality_reset,
        }
    }

    /// Populate the municipality control. Returns false, leaving the control
    /// untouched, when `ticket` was superseded by a later filter change.
    pub fn accept_municipality_list(&mut self, ticket: Ticket, municipalities: Vec<String>) -> bool {
        if !self.list_requests.is_current(ticket) {
            return false;
        }
        self.options = municipalities;
        self.disabled = false;
        true
    }
}
