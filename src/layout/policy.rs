use crate::rect::Size;

/// How a node reacts, along one axis, when its container has more or less room
/// than the node prefers
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SizePolicy {
    /// Always the preferred size, unless nothing else can give way
    Fixed,
    /// The preferred size is a lower bound; never grows
    Minimum,
    /// The preferred size is an upper bound; shrinks first
    Maximum,
    /// Prefers its preferred size, shrinks first
    Preferred,
    /// Takes a share of any surplus, shrinks after everything else
    Expanding,
    /// Takes a share of any surplus, never shrinks below its preferred size
    MinimumExpanding,
    /// The preferred size is ignored: the node is sized from its stretch weight
    Ignored,
}

impl SizePolicy {
    pub const NAMES: [&'static str; 7] = [
        "Fixed",
        "Minimum",
        "Maximum",
        "Preferred",
        "Expanding",
        "MinimumExpanding",
        "Ignored",
    ];

    /// Parse a policy name, ignoring case and `_` / `-` separators
    pub fn from_name(name: &str) -> Option<SizePolicy> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Some(match normalized.as_str() {
            "fixed" => SizePolicy::Fixed,
            "minimum" => SizePolicy::Minimum,
            "maximum" => SizePolicy::Maximum,
            "preferred" => SizePolicy::Preferred,
            "expanding" => SizePolicy::Expanding,
            "minimumexpanding" => SizePolicy::MinimumExpanding,
            "ignored" => SizePolicy::Ignored,
            _ => return None,
        })
    }

    /// Whether the node takes part in distributing surplus space
    pub fn expands(self) -> bool {
        matches!(self, SizePolicy::Expanding | SizePolicy::MinimumExpanding)
    }

    /// Whether the node is the first to give way when space runs short
    pub fn shrinks_first(self) -> bool {
        matches!(
            self,
            SizePolicy::Preferred | SizePolicy::Maximum | SizePolicy::Ignored
        )
    }

    /// Whether the node keeps its preferred size unless nothing else can shrink
    pub fn holds_preferred(self) -> bool {
        matches!(
            self,
            SizePolicy::Fixed | SizePolicy::Minimum | SizePolicy::MinimumExpanding
        )
    }
}

/// Per-axis sizing policies of a node plus an optional explicit size that
/// overrides the node's intrinsic size
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ElasticSizePolicy {
    pub horizontal: SizePolicy,
    pub vertical: SizePolicy,
    pub size: Option<Size>,
}

impl ElasticSizePolicy {
    pub fn new(horizontal: SizePolicy, vertical: SizePolicy) -> ElasticSizePolicy {
        ElasticSizePolicy {
            horizontal,
            vertical,
            size: None,
        }
    }

    pub fn along(&self, axis: Axis) -> SizePolicy {
        match axis {
            Axis::Horizontal => self.horizontal,
            Axis::Vertical => self.vertical,
        }
    }
}

impl Default for ElasticSizePolicy {
    fn default() -> Self {
        ElasticSizePolicy::new(SizePolicy::Preferred, SizePolicy::Preferred)
    }
}

/// Direction along which a container lays out its children
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Placement of a child that is smaller than its container on the cross axis
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Alignment {
    #[default]
    Start,
    Center,
    End,
    /// Like `Start`, but `Maximum` children fill the cross axis too
    Stretch,
}

impl Alignment {
    pub const NAMES: [&'static str; 4] = ["start", "center", "end", "stretch"];

    pub fn from_name(name: &str) -> Option<Alignment> {
        Some(match name.trim().to_ascii_lowercase().as_str() {
            "start" | "left" | "top" => Alignment::Start,
            "center" | "centre" => Alignment::Center,
            "end" | "right" | "bottom" => Alignment::End,
            "stretch" => Alignment::Stretch,
            _ => return None,
        })
    }
}
