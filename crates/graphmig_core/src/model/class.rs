//! Class hierarchy and ancestor-chain descriptors.
//!
//! # Responsibility
//! - Model the single-rooted, single-inheritance class tree.
//! - Produce `ClassStructureInfo` chains that decide class-bucket membership.
//!
//! # Invariants
//! - Every registered class except the root has exactly one parent.
//! - A class never changes parent once registered.

use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Root of every class chain in the standard model.
pub const ROOT_CLASS: &str = "CmObject";

/// Ordered ancestor chain, root class first and leaf class last.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassStructureInfo {
    chain: Vec<String>,
}

impl ClassStructureInfo {
    /// Builds a chain from root-first class names. Returns `None` when empty.
    pub fn from_chain<I, S>(chain: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chain: Vec<String> = chain.into_iter().map(Into::into).collect();
        if chain.is_empty() {
            return None;
        }
        Some(Self { chain })
    }

    /// Builds a chain from root-first ancestors and the leaf class.
    pub fn with_ancestors<I, S>(ancestors: I, leaf: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut chain: Vec<String> = ancestors.into_iter().map(Into::into).collect();
        chain.push(leaf.into());
        Self { chain }
    }

    /// Chain for a class the hierarchy does not know: only its own bucket.
    pub fn unrooted(classname: impl Into<String>) -> Self {
        Self {
            chain: vec![classname.into()],
        }
    }

    pub fn leaf(&self) -> &str {
        self.chain.last().map(String::as_str).unwrap_or_default()
    }

    pub fn root(&self) -> &str {
        self.chain.first().map(String::as_str).unwrap_or_default()
    }

    /// Every class whose bucket holds instances of `leaf()`.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.chain.iter().map(String::as_str)
    }

    pub fn contains(&self, classname: &str) -> bool {
        self.chain.iter().any(|class| class == classname)
    }
}

/// Errors raised when extending the class hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassHierarchyError {
    UnknownParent { class: String, parent: String },
    ConflictingParent {
        class: String,
        existing: String,
        requested: String,
    },
    ForeignRoot { expected: String, actual: String },
}

impl Display for ClassHierarchyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownParent { class, parent } => {
                write!(f, "class `{class}` names unknown parent `{parent}`")
            }
            Self::ConflictingParent {
                class,
                existing,
                requested,
            } => write!(
                f,
                "class `{class}` already has parent `{existing}`, refusing `{requested}`"
            ),
            Self::ForeignRoot { expected, actual } => {
                write!(f, "class chain rooted at `{actual}`, expected `{expected}`")
            }
        }
    }
}

impl Error for ClassHierarchyError {}

/// Single-rooted class tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassHierarchy {
    root: String,
    parents: HashMap<String, String>,
    children: HashMap<String, BTreeSet<String>>,
}

impl ClassHierarchy {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            parents: HashMap::new(),
            children: HashMap::new(),
        }
    }

    /// Hierarchy covering the classes the built-in migration steps touch.
    pub fn standard() -> Self {
        let mut hierarchy = Self::new(ROOT_CLASS);
        for (class, parent) in STANDARD_CLASSES {
            let added = hierarchy.add_class(*class, parent);
            debug_assert!(added.is_ok(), "standard class table out of order: {added:?}");
        }
        hierarchy
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Registers `class` under `parent`. Re-registering the same pair is a no-op.
    pub fn add_class(
        &mut self,
        class: impl Into<String>,
        parent: &str,
    ) -> Result<(), ClassHierarchyError> {
        let class = class.into();
        if !self.contains(parent) {
            return Err(ClassHierarchyError::UnknownParent {
                class,
                parent: parent.to_string(),
            });
        }
        if let Some(existing) = self.parents.get(&class) {
            if existing == parent {
                return Ok(());
            }
            return Err(ClassHierarchyError::ConflictingParent {
                class,
                existing: existing.clone(),
                requested: parent.to_string(),
            });
        }
        if class == self.root {
            return Err(ClassHierarchyError::ConflictingParent {
                class,
                existing: String::new(),
                requested: parent.to_string(),
            });
        }

        self.children
            .entry(parent.to_string())
            .or_default()
            .insert(class.clone());
        self.parents.insert(class, parent.to_string());
        Ok(())
    }

    /// Registers every link of `structure`, which must start at the root.
    pub fn register(&mut self, structure: &ClassStructureInfo) -> Result<(), ClassHierarchyError> {
        if structure.root() != self.root {
            return Err(ClassHierarchyError::ForeignRoot {
                expected: self.root.clone(),
                actual: structure.root().to_string(),
            });
        }
        let chain: Vec<&str> = structure.classes().collect();
        for pair in chain.windows(2) {
            self.add_class(pair[1], pair[0])?;
        }
        Ok(())
    }

    pub fn contains(&self, class: &str) -> bool {
        class == self.root || self.parents.contains_key(class)
    }

    pub fn parent_of(&self, class: &str) -> Option<&str> {
        self.parents.get(class).map(String::as_str)
    }

    /// Root-first chain for `class`, `None` when the class is unknown.
    pub fn structure_of(&self, class: &str) -> Option<ClassStructureInfo> {
        if !self.contains(class) {
            return None;
        }
        let mut chain = vec![class.to_string()];
        let mut cursor = class;
        while let Some(parent) = self.parent_of(cursor) {
            chain.push(parent.to_string());
            cursor = parent;
        }
        chain.reverse();
        ClassStructureInfo::from_chain(chain)
    }

    /// Chain for `class`, falling back to an unrooted chain for unknown classes.
    pub fn structure_or_unrooted(&self, class: &str) -> ClassStructureInfo {
        self.structure_of(class)
            .unwrap_or_else(|| ClassStructureInfo::unrooted(class))
    }

    /// `class` plus every class below it, breadth-first.
    pub fn self_and_descendants(&self, class: &str) -> Vec<String> {
        let mut out = vec![class.to_string()];
        let mut index = 0;
        while index < out.len() {
            if let Some(children) = self.children.get(&out[index]) {
                out.extend(children.iter().cloned());
            }
            index += 1;
        }
        out
    }

    pub fn is_same_or_subclass(&self, class: &str, ancestor: &str) -> bool {
        self.structure_of(class)
            .is_some_and(|structure| structure.contains(ancestor))
    }
}

impl Default for ClassHierarchy {
    fn default() -> Self {
        Self::standard()
    }
}

const STANDARD_CLASSES: &[(&str, &str)] = &[
    ("LangProject", ROOT_CLASS),
    ("WordformInventory", ROOT_CLASS),
    ("WfiWordform", ROOT_CLASS),
    ("WfiAnalysis", ROOT_CLASS),
    ("LexDb", ROOT_CLASS),
    ("LexEntry", ROOT_CLASS),
    ("LexSense", ROOT_CLASS),
    ("LexEntryRef", ROOT_CLASS),
    ("CmPossibilityList", ROOT_CLASS),
    ("CmPossibility", ROOT_CLASS),
    ("LexEntryType", "CmPossibility"),
    ("PartOfSpeech", "CmPossibility"),
    ("StText", ROOT_CLASS),
    ("StPara", ROOT_CLASS),
    ("StTxtPara", "StPara"),
    ("Segment", ROOT_CLASS),
    ("DsConstChart", ROOT_CLASS),
    ("ConstChartRow", ROOT_CLASS),
    ("ConstituentChartCellPart", ROOT_CLASS),
    ("ConstChartWordGroup", "ConstituentChartCellPart"),
    ("ConstChartTag", "ConstituentChartCellPart"),
    ("ConstChartMovedTextMarker", "ConstituentChartCellPart"),
    ("ConstChartClauseMarker", "ConstituentChartCellPart"),
];
