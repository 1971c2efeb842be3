//! Port identity - names and index handles for message endpoints
//!
//! Names are built once at construction; afterwards endpoints are addressed
//! by `OutPortId` / `InPort` only.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Base name for outbound endpoints
pub const OUT_PORT_BASE: &str = "dist_out";

/// Maximum number of outbound endpoints a distributor may declare
pub const MAX_OUT_PORTS: usize = 4;

/// Endpoint name with cheap cloning.
///
/// Internally uses `Arc<str>`, so handing the name to metrics labels and
/// log fields only bumps a reference count.
///
/// # Examples
/// ```
/// use contracts::PortName;
///
/// let name: PortName = "dist_out0".into();
/// assert_eq!(name, "dist_out0");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortName(Arc<str>);

impl PortName {
    /// Create a new PortName from a string slice.
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for PortName {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for PortName {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PortName {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PortName {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for PortName {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for PortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PortName({:?})", self.0)
    }
}

impl PartialEq<str> for PortName {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for PortName {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl Serialize for PortName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PortName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}

/// Inbound endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InPort {
    /// General traffic, one random consumer per message
    Random,
    /// Registration traffic, every consumer (split mode only)
    All,
}

impl InPort {
    /// Endpoint name as seen by the host
    pub fn name(&self) -> &'static str {
        match self {
            InPort::Random => "dist_random",
            InPort::All => "dist_all",
        }
    }
}

impl fmt::Display for InPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Index handle of an outbound endpoint (`0..num_out_ports`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPortId(pub usize);

impl OutPortId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for OutPortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outbound endpoint names for `count` ports.
///
/// A single port is named `dist_out`; otherwise `dist_out0 .. dist_out{count-1}`.
pub fn out_port_names(count: usize) -> Vec<PortName> {
    if count == 1 {
        return vec![PortName::new(OUT_PORT_BASE)];
    }
    (0..count)
        .map(|i| PortName::from(format!("{OUT_PORT_BASE}{i}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_single_port_has_no_suffix() {
        assert_eq!(out_port_names(1), vec![PortName::new("dist_out")]);
    }

    #[test]
    fn test_multi_port_names_are_numbered_and_unique() {
        for count in 2..=MAX_OUT_PORTS {
            let names = out_port_names(count);
            assert_eq!(names.len(), count);
            for (i, name) in names.iter().enumerate() {
                assert_eq!(name.as_str(), format!("dist_out{i}"));
            }
            let unique: HashSet<_> = names.iter().collect();
            assert_eq!(unique.len(), count);
        }
    }

    #[test]
    fn test_zero_ports() {
        assert!(out_port_names(0).is_empty());
    }

    #[test]
    fn test_in_port_names() {
        assert_eq!(InPort::Random.name(), "dist_random");
        assert_eq!(InPort::All.to_string(), "dist_all");
    }

    #[test]
    fn test_port_name_serde() {
        let name: PortName = "dist_out2".into();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"dist_out2\"");

        let parsed: PortName = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, name);
    }
}
