//! Command, condition and control-packet setting name tables
//!
//! The engine addresses commands and conditions by 16-bit ID and control
//! packet settings by bit position. These tables give the well-known ones
//! readable names; any other ID is spelled `Command_<n>` / `Condition_<n>`.

/// Prefix for commands without a catalogue name
pub const GENERIC_COMMAND_PREFIX: &str = "Command_";
/// Prefix for conditions without a catalogue name
pub const GENERIC_CONDITION_PREFIX: &str = "Condition_";

const COMMANDS: &[(u16, &str)] = &[
    (0x00, "Wait"),
    (0x01, "PlaySound"),
    (0x02, "StopSound"),
    (0x03, "SetSpeed"),
    (0x04, "SetAnimation"),
    (0x05, "SpawnObject"),
    (0x06, "DestroySelf"),
    (0x07, "SetHealth"),
    (0x08, "Damage"),
    (0x09, "FaceTarget"),
    (0x0A, "Jump"),
    (0x0B, "SetVisibility"),
    (0x0C, "SetCollision"),
    (0x0D, "EmitParticles"),
    (0x0E, "SetFlag"),
    (0x0F, "SendMessage"),
    (0x10, "GiveItem"),
    (0x11, "SetTimer"),
    (0x12, "ShakeCamera"),
    (0x13, "Teleport"),
];

const CONDITIONS: &[(u16, &str)] = &[
    (0x00, "Always"),
    (0x01, "IsOnGround"),
    (0x02, "TimerExpired"),
    (0x03, "PlayerNear"),
    (0x04, "HealthBelow"),
    (0x05, "AnimationFinished"),
    (0x06, "FlagSet"),
    (0x07, "Random"),
    (0x08, "HitWall"),
    (0x09, "IsFalling"),
    (0x0A, "TargetVisible"),
    (0x0B, "MessageReceived"),
];

/// Control packet settings, indexed by their bit in the settings mask
pub const SETTINGS: [&str; 16] = [
    "space",
    "motion",
    "accel_fn",
    "axes",
    "rot_space",
    "rot_motion",
    "rot_axes",
    "turn_rate",
    "speed_scale",
    "anim_blend",
    "gravity",
    "friction",
    "bounce",
    "align",
    "target_kind",
    "flags",
];

/// Look up a command ID by name
pub fn command_id(name: &str) -> Option<u16> {
    lookup_id(COMMANDS, GENERIC_COMMAND_PREFIX, name)
}

/// Display name for a command ID
pub fn command_name(id: u16) -> String {
    lookup_name(COMMANDS, GENERIC_COMMAND_PREFIX, id)
}

/// Look up a condition ID by name
pub fn condition_id(name: &str) -> Option<u16> {
    lookup_id(CONDITIONS, GENERIC_CONDITION_PREFIX, name)
}

/// Display name for a condition ID
pub fn condition_name(id: u16) -> String {
    lookup_name(CONDITIONS, GENERIC_CONDITION_PREFIX, id)
}

/// Bit position of a control packet setting
pub fn setting_bit(name: &str) -> Option<u32> {
    SETTINGS.iter().position(|s| *s == name).map(|bit| bit as u32)
}

fn lookup_id(
    table: &[(u16, &str)],
    prefix: &str,
    name: &str,
) -> Option<u16> {
    if let Some(&(id, _)) = table.iter().find(|(_, n)| *n == name) {
        return Some(id);
    }
    let digits = name.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn lookup_name(
    table: &[(u16, &str)],
    prefix: &str,
    id: u16,
) -> String {
    match table.iter().find(|(i, _)| *i == id) {
        Some((_, name)) => (*name).to_string(),
        None => format!("{}{}", prefix, id),
    }
}
