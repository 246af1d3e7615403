//! Capture strategies.

use std::collections::BTreeMap;

use crate::container::AttributeSource;

/// Named attribute values frozen by a snapshot.
pub type AttributeMap = BTreeMap<String, f32>;

/// Pulls attributes from an owner at capture time.
///
/// Implemented for any `Fn(&dyn AttributeSource) -> AttributeMap`, so a
/// closure can be registered directly.
pub trait SnapshotCapturer: Send + Sync {
    /// Reads the attributes this capturer is interested in.
    fn capture(&self, source: &dyn AttributeSource) -> AttributeMap;
}

impl<F> SnapshotCapturer for F
where
    F: Fn(&dyn AttributeSource) -> AttributeMap + Send + Sync,
{
    fn capture(&self, source: &dyn AttributeSource) -> AttributeMap {
        self(source)
    }
}

/// Captures a fixed list of attribute names.
///
/// Names the source does not have are left out of the map.
///
/// # Example
///
/// ```
/// use buffwright::container::AttributeSource;
/// use buffwright::snapshot::{NamedAttributeCapturer, SnapshotCapturer};
///
/// struct Stats;
/// impl AttributeSource for Stats {
///     fn attribute(&self, name: &str) -> Option<f32> {
///         (name == "attack").then_some(40.0)
///     }
/// }
///
/// let capturer = NamedAttributeCapturer::new(["attack", "crit"]);
/// let map = capturer.capture(&Stats);
/// assert_eq!(map.get("attack"), Some(&40.0));
/// assert!(!map.contains_key("crit"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedAttributeCapturer {
    names: Vec<String>,
}

impl NamedAttributeCapturer {
    /// Creates a capturer for `names`.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the captured names.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl SnapshotCapturer for NamedAttributeCapturer {
    fn capture(&self, source: &dyn AttributeSource) -> AttributeMap {
        self.names
            .iter()
            .filter_map(|name| source.attribute(name).map(|v| (name.clone(), v)))
            .collect()
    }
}
