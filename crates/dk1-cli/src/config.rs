//! Session config – reads/writes `dk1.toml`.
//!
//! A session names one follower (`[robot]`) and one leader (`[teleop]`),
//! each a tagged [`DeviceConfig`], plus the control loop rate.

use std::fs;
use std::path::{Path, PathBuf};

use dk1_types::{BiFollowerConfig, BiLeaderConfig, CameraConfig, DeviceConfig, Dk1Error, Side};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "dk1.toml";

fn default_fps() -> u32 {
    30
}

/// Persisted teleoperation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SessionConfig {
    /// Control loop rate in Hz.
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// The follower being driven.
    pub robot: DeviceConfig,

    /// The leader being read.
    pub teleop: DeviceConfig,
}

impl SessionConfig {
    /// A ready-to-edit session with serial ports typical for Linux hosts.
    pub fn example() -> Self {
        let robot = BiFollowerConfig::new("/dev/ttyACM0", "/dev/ttyACM1")
            .with_camera(
                "wrist_left",
                CameraConfig {
                    device: "/dev/video0".to_string(),
                    width: 640,
                    height: 480,
                    fps: Some(30),
                },
            )
            .with_camera(
                "wrist_right",
                CameraConfig {
                    device: "/dev/video2".to_string(),
                    width: 640,
                    height: 480,
                    fps: Some(30),
                },
            );
        Self {
            fps: default_fps(),
            robot: DeviceConfig::BiFollower(robot),
            teleop: DeviceConfig::BiLeader(BiLeaderConfig::new("/dev/ttyUSB0", "/dev/ttyUSB1")),
        }
    }

    /// # Errors
    ///
    /// Returns [`Dk1Error::Config`] for a zero rate, a device under the
    /// wrong table or any invalid device config.
    pub fn validate(&self) -> Result<(), Dk1Error> {
        if self.fps == 0 {
            return Err(Dk1Error::Config("fps must be at least 1".to_string()));
        }
        if !matches!(self.robot, DeviceConfig::BiFollower(_)) {
            return Err(Dk1Error::Config(format!(
                "[robot] must be a bi_dk1_follower, got {}",
                self.robot.name()
            )));
        }
        if !matches!(self.teleop, DeviceConfig::BiLeader(_)) {
            return Err(Dk1Error::Config(format!(
                "[teleop] must be a bi_dk1_leader, got {}",
                self.teleop.name()
            )));
        }
        self.robot.validate()?;
        self.teleop.validate()
    }
}

/// Resolve the config path from `--config` or the working directory.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load, apply `DK1_*` overrides, and validate.
pub fn load_from(path: &Path) -> Result<SessionConfig, Dk1Error> {
    let raw = fs::read_to_string(path).map_err(|e| {
        Dk1Error::Config(format!("Failed to read config at {}: {e}", path.display()))
    })?;
    let mut cfg: SessionConfig = toml::from_str(&raw)
        .map_err(|e| Dk1Error::Config(format!("Failed to parse config: {e}")))?;
    apply_env_overrides(&mut cfg);
    cfg.validate()?;
    Ok(cfg)
}

/// Apply `DK1_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `DK1_FPS` | `fps` |
/// | `DK1_ROBOT_LEFT_PORT` | `robot.left_arm_port` |
/// | `DK1_ROBOT_RIGHT_PORT` | `robot.right_arm_port` |
/// | `DK1_TELEOP_LEFT_PORT` | `teleop.left_arm_port` |
/// | `DK1_TELEOP_RIGHT_PORT` | `teleop.right_arm_port` |
pub fn apply_env_overrides(cfg: &mut SessionConfig) {
    apply_overrides(cfg, |var| std::env::var(var).ok());
}

/// Apply overrides looked up through `lookup`, keyed by variable name.
pub(crate) fn apply_overrides<F>(cfg: &mut SessionConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(fps) = lookup("DK1_FPS").and_then(|v| v.parse::<u32>().ok()) {
        cfg.fps = fps;
    }
    let ports = [
        ("DK1_ROBOT_LEFT_PORT", Side::Left, false),
        ("DK1_ROBOT_RIGHT_PORT", Side::Right, false),
        ("DK1_TELEOP_LEFT_PORT", Side::Left, true),
        ("DK1_TELEOP_RIGHT_PORT", Side::Right, true),
    ];
    for (var, side, teleop) in ports {
        if let Some(port) = lookup(var) {
            let device = if teleop { &mut cfg.teleop } else { &mut cfg.robot };
            set_port(device, side, port);
        }
    }
}

fn set_port(device: &mut DeviceConfig, side: Side, port: String) {
    let (left, right) = match device {
        DeviceConfig::BiFollower(c) => (&mut c.left_arm_port, &mut c.right_arm_port),
        DeviceConfig::BiLeader(c) => (&mut c.left_arm_port, &mut c.right_arm_port),
    };
    match side {
        Side::Left => *left = port,
        Side::Right => *right = port,
    }
}

/// Write `cfg` as pretty TOML, creating parent directories.
pub fn save_to(cfg: &SessionConfig, path: &Path) -> Result<(), Dk1Error> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|e| Dk1Error::Config(format!("Failed to create config directory: {e}")))?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| Dk1Error::Config(format!("Failed to serialize config: {e}")))?;
    fs::write(path, raw)
        .map_err(|e| Dk1Error::Config(format!("Failed to write config at {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_roundtrips_through_disk() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("nested").join(DEFAULT_CONFIG_FILE);

        let cfg = SessionConfig::example();
        save_to(&cfg, &path).expect("save");
        let loaded = load_from(&path).expect("load");
        assert_eq!(loaded.robot, cfg.robot);
        assert_eq!(loaded.teleop, cfg.teleop);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let err = load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Dk1Error::Config(msg) if msg.contains("Failed to read")));
    }

    #[test]
    fn load_parses_minimal_file_with_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("dk1.toml");
        fs::write(
            &path,
            r#"
                [robot]
                type = "bi_dk1_follower"
                left_arm_port = "/dev/a"
                right_arm_port = "/dev/b"

                [teleop]
                type = "bi_dk1_leader"
                left_arm_port = "/dev/c"
                right_arm_port = "/dev/d"
            "#,
        )
        .unwrap();
        let cfg = load_from(&path).expect("load");
        let DeviceConfig::BiFollower(robot) = &cfg.robot else {
            panic!("robot must be a follower");
        };
        assert!(robot.cameras.is_empty());
        assert!((robot.joint_velocity_scaling - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn swapped_tables_are_rejected() {
        let mut cfg = SessionConfig::example();
        std::mem::swap(&mut cfg.robot, &mut cfg.teleop);
        assert!(matches!(cfg.validate(), Err(Dk1Error::Config(_))));
    }

    #[test]
    fn zero_fps_is_rejected() {
        let mut cfg = SessionConfig::example();
        cfg.fps = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn config_path_defaults_to_working_directory() {
        assert_eq!(config_path(None), PathBuf::from("dk1.toml"));
        assert_eq!(
            config_path(Some(Path::new("/etc/dk1/session.toml"))),
            PathBuf::from("/etc/dk1/session.toml")
        );
    }

    #[test]
    fn overrides_change_teleop_port_and_fps() {
        let mut cfg = SessionConfig::example();
        apply_overrides(&mut cfg, |var| match var {
            "DK1_TELEOP_RIGHT_PORT" => Some("/dev/ttyUSB7".to_string()),
            "DK1_FPS" => Some("60".to_string()),
            _ => None,
        });
        assert_eq!(cfg.fps, 60);
        let DeviceConfig::BiLeader(teleop) = &cfg.teleop else {
            panic!("teleop must be a leader");
        };
        assert_eq!(teleop.right_arm_port, "/dev/ttyUSB7");
        assert_eq!(teleop.left_arm_port, "/dev/ttyUSB0");
    }

    #[test]
    fn overrides_ignore_invalid_fps() {
        let mut cfg = SessionConfig::example();
        apply_overrides(&mut cfg, |var| (var == "DK1_FPS").then(|| "fast".to_string()));
        assert_eq!(cfg.fps, 30);
    }

    #[test]
    fn set_port_targets_one_side() {
        let mut device = DeviceConfig::BiFollower(BiFollowerConfig::new("a", "b"));
        set_port(&mut device, Side::Left, "z".to_string());
        assert_eq!(device, DeviceConfig::BiFollower(BiFollowerConfig::new("z", "b")));
    }
}
