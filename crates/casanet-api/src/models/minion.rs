// Minion wire types
//
// A minion is a controllable smart-home endpoint (switch, light, AC, ...).
// `MinionStatus` carries one optional branch per minion type; only the
// branch matching the minion's type is meaningful.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum MinionTypes {
    Toggle,
    Switch,
    AirConditioning,
    Light,
    TemperatureLight,
    ColorLight,
    Cleaner,
    Roller,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SwitchOptions {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanStrengthOptions {
    Low,
    Med,
    High,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcModeOptions {
    Hot,
    Cold,
    Dry,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollerDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanerMode {
    Dock,
    Clean,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchStatus {
    pub status: SwitchOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirConditioningStatus {
    pub status: SwitchOptions,
    pub fan_strength: FanStrengthOptions,
    pub mode: AcModeOptions,
    pub temperature: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightStatus {
    pub status: SwitchOptions,
    pub brightness: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemperatureLightStatus {
    pub status: SwitchOptions,
    pub brightness: u32,
    pub temperature: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorLightStatus {
    pub status: SwitchOptions,
    pub brightness: u32,
    pub temperature: u32,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollerStatus {
    pub status: SwitchOptions,
    pub direction: RollerDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanerStatus {
    pub status: SwitchOptions,
    pub fan_speed: FanStrengthOptions,
    pub mode: CleanerMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinionStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toggle: Option<SwitchStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub switch: Option<SwitchStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_conditioning: Option<AirConditioningStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<LightStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_light: Option<TemperatureLightStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_light: Option<ColorLightStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roller: Option<RollerStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleaner: Option<CleanerStatus>,
}

impl MinionStatus {
    /// The status a newly created minion of `minion_type` starts with.
    pub fn default_for(minion_type: MinionTypes) -> Self {
        let mut status = Self::default();
        match minion_type {
            MinionTypes::Toggle => {
                status.toggle = Some(SwitchStatus {
                    status: SwitchOptions::Off,
                });
            }
            MinionTypes::Switch => {
                status.switch = Some(SwitchStatus {
                    status: SwitchOptions::Off,
                });
            }
            MinionTypes::AirConditioning => {
                status.air_conditioning = Some(AirConditioningStatus {
                    status: SwitchOptions::On,
                    fan_strength: FanStrengthOptions::Auto,
                    mode: AcModeOptions::Cold,
                    temperature: 16,
                });
            }
            MinionTypes::Light => {
                status.light = Some(LightStatus {
                    status: SwitchOptions::On,
                    brightness: 50,
                });
            }
            MinionTypes::TemperatureLight => {
                status.temperature_light = Some(TemperatureLightStatus {
                    status: SwitchOptions::On,
                    brightness: 50,
                    temperature: 50,
                });
            }
            MinionTypes::ColorLight => {
                status.color_light = Some(ColorLightStatus {
                    status: SwitchOptions::On,
                    brightness: 50,
                    temperature: 50,
                    red: 150,
                    green: 100,
                    blue: 50,
                });
            }
            MinionTypes::Roller => {
                status.roller = Some(RollerStatus {
                    status: SwitchOptions::On,
                    direction: RollerDirection::Down,
                });
            }
            MinionTypes::Cleaner => {
                status.cleaner = Some(CleanerStatus {
                    status: SwitchOptions::On,
                    fan_speed: FanStrengthOptions::Auto,
                    mode: CleanerMode::Clean,
                });
            }
        }
        status
    }

    /// On/off state of the branch belonging to `minion_type`, if set.
    pub fn switch_state(&self, minion_type: MinionTypes) -> Option<SwitchOptions> {
        match minion_type {
            MinionTypes::Toggle => self.toggle.as_ref().map(|s| s.status),
            MinionTypes::Switch => self.switch.as_ref().map(|s| s.status),
            MinionTypes::AirConditioning => self.air_conditioning.as_ref().map(|s| s.status),
            MinionTypes::Light => self.light.as_ref().map(|s| s.status),
            MinionTypes::TemperatureLight => self.temperature_light.as_ref().map(|s| s.status),
            MinionTypes::ColorLight => self.color_light.as_ref().map(|s| s.status),
            MinionTypes::Roller => self.roller.as_ref().map(|s| s.status),
            MinionTypes::Cleaner => self.cleaner.as_ref().map(|s| s.status),
        }
    }

    /// Set the on/off state of `minion_type`'s branch, seeding it from
    /// [`default_for`](Self::default_for) when the branch is missing.
    pub fn set_switch_state(&mut self, minion_type: MinionTypes, on: SwitchOptions) {
        if self.switch_state(minion_type).is_none() {
            let seeded = Self::default_for(minion_type);
            self.merge_branch(minion_type, seeded);
        }
        match minion_type {
            MinionTypes::Toggle => set_status(self.toggle.as_mut().map(|s| &mut s.status), on),
            MinionTypes::Switch => set_status(self.switch.as_mut().map(|s| &mut s.status), on),
            MinionTypes::AirConditioning => {
                set_status(self.air_conditioning.as_mut().map(|s| &mut s.status), on);
            }
            MinionTypes::Light => set_status(self.light.as_mut().map(|s| &mut s.status), on),
            MinionTypes::TemperatureLight => {
                set_status(self.temperature_light.as_mut().map(|s| &mut s.status), on);
            }
            MinionTypes::ColorLight => {
                set_status(self.color_light.as_mut().map(|s| &mut s.status), on);
            }
            MinionTypes::Roller => set_status(self.roller.as_mut().map(|s| &mut s.status), on),
            MinionTypes::Cleaner => set_status(self.cleaner.as_mut().map(|s| &mut s.status), on),
        }
    }

    fn merge_branch(&mut self, minion_type: MinionTypes, from: Self) {
        match minion_type {
            MinionTypes::Toggle => self.toggle = from.toggle,
            MinionTypes::Switch => self.switch = from.switch,
            MinionTypes::AirConditioning => self.air_conditioning = from.air_conditioning,
            MinionTypes::Light => self.light = from.light,
            MinionTypes::TemperatureLight => self.temperature_light = from.temperature_light,
            MinionTypes::ColorLight => self.color_light = from.color_light,
            MinionTypes::Roller => self.roller = from.roller,
            MinionTypes::Cleaner => self.cleaner = from.cleaner,
        }
    }
}

fn set_status(slot: Option<&mut SwitchOptions>, on: SwitchOptions) {
    if let Some(status) = slot {
        *status = on;
    }
}

/// The physical device a minion is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinionDevice {
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Minion {
    pub minion_id: String,
    pub name: String,
    pub minion_type: MinionTypes,
    #[serde(default)]
    pub is_proper: bool,
    #[serde(default)]
    pub minion_status: MinionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<MinionDevice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

impl Minion {
    /// True if the minion's own branch reports `on`.
    pub fn is_on(&self) -> bool {
        self.minion_status.switch_state(self.minion_type) == Some(SwitchOptions::On)
    }
}
