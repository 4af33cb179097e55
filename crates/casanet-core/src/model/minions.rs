use super::{Minion, MinionStatus, MinionTypes, SwitchOptions};

/// Default status for a newly created minion of `minion_type`.
pub fn default_status(minion_type: MinionTypes) -> MinionStatus {
    MinionStatus::default_for(minion_type)
}

/// True iff the branch of `status` belonging to `minion_type` is on.
pub fn is_on_mode(minion_type: MinionTypes, status: Option<&MinionStatus>) -> bool {
    status.and_then(|s| s.switch_state(minion_type)) == Some(SwitchOptions::On)
}

/// Rooms first (alphabetical), then name.
pub fn sort_minions(minions: &mut [Minion]) {
    minions.sort_by(|a, b| {
        a.room
            .as_deref()
            .unwrap_or_default()
            .cmp(b.room.as_deref().unwrap_or_default())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_switch_is_off_and_light_is_on() {
        assert!(!is_on_mode(MinionTypes::Switch, Some(&default_status(MinionTypes::Switch))));
        assert!(is_on_mode(MinionTypes::Light, Some(&default_status(MinionTypes::Light))));
    }

    #[test]
    fn missing_status_or_branch_is_off() {
        assert!(!is_on_mode(MinionTypes::Toggle, None));
        let light_only = default_status(MinionTypes::Light);
        assert!(!is_on_mode(MinionTypes::Roller, Some(&light_only)));
    }

    #[test]
    fn air_conditioning_defaults() {
        let status = default_status(MinionTypes::AirConditioning);
        let ac = status.air_conditioning.as_ref().map(|ac| ac.temperature);
        assert_eq!(ac, Some(16));
    }
}
