// Hub wire types
//
// Models for the hub's JSON REST API. Field names follow the hub's
// camelCase convention; optional fields default liberally because older
// hub versions omit them.

mod device;
mod minion;
mod timing;
mod user;

pub use device::{BluetoothDevice, DeviceNameUpdate, LocalNetworkDevice};
pub use minion::{
    AcModeOptions, AirConditioningStatus, CleanerMode, CleanerStatus, ColorLightStatus,
    FanStrengthOptions, LightStatus, Minion, MinionDevice, MinionStatus, MinionTypes,
    RollerDirection, RollerStatus, SwitchOptions, SwitchStatus, TemperatureLightStatus,
};
pub use timing::{
    DailySunTrigger, DailyTimeTrigger, DaysOptions, OnceTiming, SunTriggerOptions,
    TimeoutTiming, Timing, TimingFeed, TimingProperties, TimingTypes,
};
pub use user::User;
pub(crate) use user::LoginRequest;
