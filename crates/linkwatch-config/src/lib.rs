//! Configuration for linkwatch.
//!
//! One TOML file describes the map: targets with their interfaces and
//! counter identifiers, links between them, and timing/export settings.
//! This crate loads it (file + `LINKWATCH_` environment overrides),
//! validates referential integrity, and translates it into the core
//! [`Topology`] the poll loop trusts. Counter identifier syntax is left
//! to the sampler, which isolates malformed identifiers per interface.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use linkwatch_api::TransportConfig;
use linkwatch_core::model::topology::DEFAULT_SPEED_MULTIPLIER;
use linkwatch_core::render::RenderOptions;
use linkwatch_core::{Endpoint, Interface, Link, MapSize, Point, PollSettings, Target, Topology};

/// Shortest accepted poll interval.
pub const MIN_POLL_INTERVAL_MS: u64 = 250;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },

    #[error("link '{link}' references unknown endpoint '{endpoint}'")]
    UnresolvedEndpoint { link: String, endpoint: String },

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    pub title: String,

    /// Background image reference, passed through to clients.
    pub background: Option<String>,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Per-target probe timeout.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Accept self-signed agent certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Fixed canvas size; derived from positions when absent.
    pub map: Option<MapConfig>,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub targets: Vec<TargetConfig>,

    #[serde(default)]
    pub links: Vec<LinkConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "linkwatch".into(),
            background: None,
            poll_interval_ms: default_poll_interval_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            insecure: false,
            map: None,
            export: ExportConfig::default(),
            targets: Vec::new(),
            links: Vec::new(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    5_000
}
fn default_probe_timeout_ms() -> u64 {
    3_000
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct MapConfig {
    pub width: f64,
    pub height: f64,
}

/// Offline snapshot output.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_dir")]
    pub dir: PathBuf,
    /// Image size; defaults to the map size.
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
            width: None,
            height: None,
        }
    }
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("snapshots")
}

/// A monitored router.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TargetConfig {
    pub id: String,
    /// Display label; defaults to the id.
    pub label: Option<String>,
    pub x: f64,
    pub y: f64,
    /// Counter agent base URL (e.g. "http://10.0.0.1:8161").
    pub agent: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<InterfaceConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InterfaceConfig {
    pub name: String,
    /// Defaults to the name.
    pub display_name: Option<String>,
    pub in_counter: String,
    pub out_counter: String,
    /// Counter reporting the interface speed (dynamic capacity).
    pub speed_counter: Option<String>,
    /// Scale applied to `speed_counter`; defaults to 1e6 (Mbps).
    pub speed_multiplier: Option<f64>,
    /// Static capacity in bits per second.
    pub max_bandwidth: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LinkConfig {
    pub id: String,
    /// `"<target>:<interface>"`.
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    /// Link-level capacity candidate in bits per second.
    pub capacity: Option<u64>,
    /// Manual path as `[x, y]` pairs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub waypoints: Vec<[f64; 2]>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "linkwatch", "linkwatch").map_or_else(
        || PathBuf::from("linkwatch.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the configuration from `path` (or the default location) merged
/// with `LINKWATCH_*` environment overrides (`__` separates nesting,
/// e.g. `LINKWATCH_EXPORT__DIR`).
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    if !path.exists() {
        return Err(ConfigError::NotFound { path });
    }
    debug!(path = %path.display(), "loading config");

    let config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("LINKWATCH_").split("__"))
        .extract()?;
    Ok(config)
}

/// Parse a configuration from TOML text, without environment overrides.
pub fn parse_config(toml_text: &str) -> Result<Config, ConfigError> {
    let config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::string(toml_text))
        .extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize `config` to TOML and write it to `path`.
pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(config)?)?;
    Ok(())
}

/// A small two-router configuration to start from.
pub fn starter_config() -> Config {
    let interface = |name: &str, index: u32| InterfaceConfig {
        name: name.into(),
        display_name: None,
        in_counter: format!("1.3.6.1.2.1.31.1.1.1.6.{index}"),
        out_counter: format!("1.3.6.1.2.1.31.1.1.1.10.{index}"),
        speed_counter: Some(format!("1.3.6.1.2.1.31.1.1.1.15.{index}")),
        speed_multiplier: None,
        max_bandwidth: Some(1_000_000_000),
    };
    let target = |id: &str, x: f64, agent: &str| TargetConfig {
        id: id.into(),
        label: None,
        x,
        y: 150.0,
        agent: Some(agent.into()),
        interfaces: vec![interface("uplink", 1)],
    };

    Config {
        title: "My network".into(),
        targets: vec![
            target("core1", 150.0, "http://192.0.2.1:8161"),
            target("edge1", 450.0, "http://192.0.2.2:8161"),
        ],
        links: vec![LinkConfig {
            id: "core1-edge1".into(),
            from: "core1:uplink".into(),
            to: "edge1:uplink".into(),
            label: Some("1G".into()),
            capacity: None,
            waypoints: Vec::new(),
        }],
        ..Config::default()
    }
}

// ── Translation ─────────────────────────────────────────────────────

/// Parse `"<target>:<interface>"`. Interface names may contain `:`; the
/// split happens at the first one.
pub fn parse_endpoint(raw: &str) -> Option<Endpoint> {
    let (target, interface) = raw.split_once(':')?;
    let (target, interface) = (target.trim(), interface.trim());
    if target.is_empty() || interface.is_empty() {
        return None;
    }
    Some(Endpoint::new(target, interface))
}

impl Config {
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.poll_interval_ms),
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: Duration::from_millis(self.probe_timeout_ms),
            accept_invalid_certs: self.insecure,
        }
    }

    /// Render options for offline export of `topology`.
    pub fn export_options(&self, topology: &Topology) -> RenderOptions {
        let extent = topology.extent();
        RenderOptions {
            width: self.export.width.unwrap_or(extent.width),
            height: self.export.height.unwrap_or(extent.height),
            ..RenderOptions::default()
        }
    }

    /// Validate and build the core topology.
    pub fn to_topology(&self) -> Result<Topology, ConfigError> {
        if self.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            return Err(invalid(
                "poll_interval_ms",
                format!("must be at least {MIN_POLL_INTERVAL_MS}, got {}", self.poll_interval_ms),
            ));
        }
        if self.probe_timeout_ms == 0 {
            return Err(invalid("probe_timeout_ms", "must be positive"));
        }
        if let Some(map) = self.map {
            if !(map.width > 0.0 && map.height > 0.0) {
                return Err(invalid("map", "width and height must be positive"));
            }
        }

        let mut topology = Topology::new(self.title.clone(), Duration::from_millis(self.poll_interval_ms));
        topology.background.clone_from(&self.background);
        topology.map_size = self.map.map(|m| MapSize {
            width: m.width,
            height: m.height,
        });

        for target in &self.targets {
            if topology.target(&target.id).is_some() {
                return Err(ConfigError::DuplicateId {
                    kind: "target",
                    id: target.id.clone(),
                });
            }
            topology.add_target(build_target(target)?);
        }

        let mut link_ids = HashSet::new();
        for link in &self.links {
            if !link_ids.insert(link.id.as_str()) {
                return Err(ConfigError::DuplicateId {
                    kind: "link",
                    id: link.id.clone(),
                });
            }
            topology.links.push(build_link(link, &topology)?);
        }

        debug!(
            targets = topology.targets.len(),
            links = topology.links.len(),
            "topology built"
        );
        Ok(topology)
    }
}

fn build_target(config: &TargetConfig) -> Result<Target, ConfigError> {
    if config.id.trim().is_empty() {
        return Err(invalid("targets.id", "must not be empty"));
    }
    let mut target = Target::new(config.id.clone(), Point::new(config.x, config.y));
    if let Some(label) = &config.label {
        target.label.clone_from(label);
    }
    target.agent.clone_from(&config.agent);

    let mut names = HashSet::new();
    for iface in &config.interfaces {
        if !names.insert(iface.name.as_str()) {
            return Err(ConfigError::DuplicateId {
                kind: "interface",
                id: format!("{}:{}", config.id, iface.name),
            });
        }
        let mut interface = Interface::new(iface.name.clone(), iface.in_counter.clone(), iface.out_counter.clone());
        if let Some(display) = &iface.display_name {
            interface.display_name.clone_from(display);
        }
        interface.max_bandwidth = iface.max_bandwidth;
        if let Some(speed) = &iface.speed_counter {
            interface = interface.with_speed_counter(
                speed.clone(),
                iface.speed_multiplier.unwrap_or(DEFAULT_SPEED_MULTIPLIER),
            );
        }
        target.interfaces.push(interface);
    }
    Ok(target)
}

fn build_link(config: &LinkConfig, topology: &Topology) -> Result<Link, ConfigError> {
    let resolve = |raw: &str| {
        parse_endpoint(raw)
            .filter(|endpoint| topology.interface(endpoint).is_some())
            .ok_or_else(|| ConfigError::UnresolvedEndpoint {
                link: config.id.clone(),
                endpoint: raw.to_owned(),
            })
    };

    let mut link = Link::new(config.id.clone(), resolve(&config.from)?, resolve(&config.to)?);
    link.label.clone_from(&config.label);
    link.capacity = config.capacity;
    link.waypoints = config.waypoints.iter().map(|[x, y]| Point::new(*x, *y)).collect();
    Ok(link)
}
