use super::models::{Hospital, HospitalId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Single,
    Multi,
}

/// Emitted when the user asks to be connected to the selected hospitals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    pub hospitals: Vec<HospitalId>,
}

/// Toggle semantics over the selectable hospitals.
///
/// The selection is kept in the order hospitals were picked so the list can
/// number them. It never holds duplicates, and holds at most one id in
/// single mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionController {
    mode: SelectionMode,
    selected: Vec<HospitalId>,
}

impl SelectionController {
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn is_multi(&self) -> bool {
        self.mode == SelectionMode::Multi
    }

    pub fn selected(&self) -> &[HospitalId] {
        &self.selected
    }

    pub fn is_selected(&self, id: HospitalId) -> bool {
        self.selected.contains(&id)
    }

    /// 1-based pick order of a hospital, for the numbered badges.
    pub fn order_of(&self, id: HospitalId) -> Option<usize> {
        self.selected.iter().position(|s| *s == id).map(|i| i + 1)
    }

    /// Toggles `id`, looked up in `hospitals`. Unknown ids and hospitals that
    /// are full or closed leave the selection untouched. Returns whether the
    /// selection changed.
    pub fn toggle(&mut self, id: HospitalId, hospitals: &[Hospital]) -> bool {
        let selectable = hospitals
            .iter()
            .find(|h| h.id == id)
            .is_some_and(Hospital::is_selectable);
        if !selectable {
            return false;
        }

        let position = self.selected.iter().position(|s| *s == id);
        match (self.mode, position) {
            (SelectionMode::Single, Some(_)) => self.selected.clear(),
            (SelectionMode::Single, None) => {
                self.selected.clear();
                self.selected.push(id);
            }
            (SelectionMode::Multi, Some(position)) => {
                self.selected.remove(position);
            }
            (SelectionMode::Multi, None) => self.selected.push(id),
        }
        true
    }

    /// Entering multi mode keeps an existing single pick; leaving it clears everything.
    pub fn set_mode(&mut self, multi: bool) {
        match (self.mode, multi) {
            (SelectionMode::Single, true) => self.mode = SelectionMode::Multi,
            (SelectionMode::Multi, false) => {
                self.mode = SelectionMode::Single;
                self.selected.clear();
            }
            _ => {}
        }
    }

    pub fn toggle_mode(&mut self) {
        let multi = !self.is_multi();
        self.set_mode(multi);
    }

    /// Builds the connection request for the current, possibly empty, selection.
    pub fn confirm(&self) -> ConnectionRequest {
        ConnectionRequest {
            hospitals: self.selected.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::HospitalStatus;
    use proptest::prelude::*;

    fn hospital(id: HospitalId, status: HospitalStatus) -> Hospital {
        Hospital {
            id,
            name: format!("Hospital {id}"),
            distance: "1.0km".to_string(),
            address: "somewhere".to_string(),
            emergency_beds: 1,
            available_beds: 1,
            total_beds: 2,
            status,
        }
    }

    fn hospitals() -> Vec<Hospital> {
        vec![
            hospital(1, HospitalStatus::Available),
            hospital(2, HospitalStatus::Available),
            hospital(3, HospitalStatus::Available),
            hospital(4, HospitalStatus::Full),
            hospital(5, HospitalStatus::Closed),
        ]
    }

    #[test]
    fn test_single_reselect_clears() {
        let list = hospitals();
        let mut selection = SelectionController::default();
        assert!(selection.toggle(1, &list));
        assert!(selection.toggle(1, &list));
        assert!(selection.selected().is_empty());
    }

    #[test]
    fn test_single_replaces() {
        let list = hospitals();
        let mut selection = SelectionController::default();
        selection.toggle(1, &list);
        selection.toggle(2, &list);
        assert_eq!(selection.selected(), &[2]);
    }

    #[test]
    fn test_multi_flips_membership() {
        let list = hospitals();
        let mut selection = SelectionController::default();
        selection.set_mode(true);
        selection.toggle(1, &list);
        selection.toggle(2, &list);
        selection.toggle(1, &list);
        assert_eq!(selection.selected(), &[2]);
    }

    #[test]
    fn test_unavailable_and_unknown_are_ignored() {
        let list = hospitals();
        let mut selection = SelectionController::default();
        selection.toggle(1, &list);
        assert!(!selection.toggle(4, &list));
        assert!(!selection.toggle(5, &list));
        assert!(!selection.toggle(99, &list));
        assert_eq!(selection.selected(), &[1]);
    }

    #[test]
    fn test_entering_multi_keeps_single_pick() {
        let list = hospitals();
        let mut selection = SelectionController::default();
        selection.toggle(3, &list);
        selection.set_mode(true);
        assert!(selection.is_multi());
        assert_eq!(selection.selected(), &[3]);
        selection.toggle(1, &list);
        assert_eq!(selection.order_of(1), Some(2));
    }

    #[test]
    fn test_cancel_multi_clears() {
        let list = hospitals();
        let mut selection = SelectionController::default();
        selection.set_mode(true);
        selection.toggle(1, &list);
        selection.toggle(2, &list);
        selection.toggle_mode();
        assert_eq!(selection.mode(), SelectionMode::Single);
        assert!(selection.selected().is_empty());
    }

    #[test]
    fn test_confirm_does_not_mutate() {
        let list = hospitals();
        let mut selection = SelectionController::default();
        selection.set_mode(true);
        selection.toggle(2, &list);
        selection.toggle(3, &list);
        let before = selection.clone();
        let request = selection.confirm();
        assert_eq!(request.hospitals, vec![2, 3]);
        assert_eq!(selection, before);
    }

    #[test]
    fn test_confirm_with_empty_selection() {
        let selection = SelectionController::default();
        assert!(selection.confirm().hospitals.is_empty());
    }

    fn arb_action() -> impl Strategy<Value = (bool, HospitalId)> {
        (any::<bool>(), 0u32..7)
    }

    proptest! {
        #[test]
        fn prop_single_mode_holds_at_most_one(ids in prop::collection::vec(0u32..7, 0..30)) {
            let list = hospitals();
            let mut selection = SelectionController::default();
            for id in ids {
                selection.toggle(id, &list);
                prop_assert!(selection.selected().len() <= 1);
            }
        }

        #[test]
        fn prop_never_selects_unavailable(actions in prop::collection::vec(arb_action(), 0..40)) {
            let list = hospitals();
            let mut selection = SelectionController::default();
            for (switch_mode, id) in actions {
                if switch_mode {
                    selection.toggle_mode();
                } else {
                    selection.toggle(id, &list);
                }
                prop_assert!(!selection.is_selected(4));
                prop_assert!(!selection.is_selected(5));
                let mut unique = selection.selected().to_vec();
                unique.sort_unstable();
                unique.dedup();
                prop_assert_eq!(unique.len(), selection.selected().len());
            }
        }
    }
}
