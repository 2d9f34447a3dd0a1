//! Lookup tables from job-spec tokens to wire enumerations.
//!
//! Each table is total over its known tokens and fails on anything else.
//! The only default is [`VolumeMode::from_token`] mapping an absent mode
//! to read-only, since the wire format cannot say "unspecified".

use serde::{Deserialize, Serialize};

use crate::error::{LaunchError, LaunchResult};

/// Which containerizer runs the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerType {
    Docker,
    Mesos,
}

impl ContainerType {
    pub fn from_token(token: &str) -> LaunchResult<Self> {
        match token {
            "DOCKER" => Ok(ContainerType::Docker),
            "MESOS" => Ok(ContainerType::Mesos),
            other => Err(LaunchError::UnknownContainerType(other.to_string())),
        }
    }

    /// Protocol enum number.
    pub fn value(self) -> i32 {
        match self {
            ContainerType::Docker => 1,
            ContainerType::Mesos => 2,
        }
    }
}

/// Docker network mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkMode {
    Host,
    Bridge,
    None,
}

impl NetworkMode {
    pub fn from_token(token: &str) -> LaunchResult<Self> {
        match token {
            "HOST" => Ok(NetworkMode::Host),
            "BRIDGE" => Ok(NetworkMode::Bridge),
            "NONE" => Ok(NetworkMode::None),
            other => Err(LaunchError::UnknownNetworkMode(other.to_string())),
        }
    }

    pub fn value(self) -> i32 {
        match self {
            NetworkMode::Host => 1,
            NetworkMode::Bridge => 2,
            NetworkMode::None => 3,
        }
    }
}

/// Volume access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeMode {
    #[serde(rename = "RW")]
    ReadWrite,
    #[serde(rename = "RO")]
    ReadOnly,
}

impl VolumeMode {
    /// Absent mode is read-only.
    pub fn from_token(token: Option<&str>) -> LaunchResult<Self> {
        match token {
            Some("RW") => Ok(VolumeMode::ReadWrite),
            Some("RO") | None => Ok(VolumeMode::ReadOnly),
            Some(other) => Err(LaunchError::UnknownVolumeMode(other.to_string())),
        }
    }

    pub fn value(self) -> i32 {
        match self {
            VolumeMode::ReadWrite => 1,
            VolumeMode::ReadOnly => 2,
        }
    }
}

/// Image format for the Mesos containerizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageType {
    Appc,
    Docker,
}

impl ImageType {
    pub fn from_token(token: &str) -> LaunchResult<Self> {
        match token {
            "APPC" => Ok(ImageType::Appc),
            "DOCKER" => Ok(ImageType::Docker),
            other => Err(LaunchError::UnknownImageType(other.to_string())),
        }
    }

    pub fn value(self) -> i32 {
        match self {
            ImageType::Appc => 1,
            ImageType::Docker => 2,
        }
    }
}
