//! Boolean, enumeration and string sets.
use std::collections::BTreeSet;

use bitflags::bitflags;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::EnumIs;

use crate::utils::{SetError, SetResult};

bitflags! {
    /// Subset of `{false, true}`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct BoolSet: u8 {
        const FALSE = 1 << 0;
        const TRUE = 1 << 1;
    }
}

impl BoolSet {
    #[inline]
    pub const fn of(value: bool) -> Self {
        if value { Self::TRUE } else { Self::FALSE }
    }

    pub fn single(&self) -> Option<bool> {
        match *self {
            Self::TRUE => Some(true),
            Self::FALSE => Some(false),
            _ => None,
        }
    }

    #[inline]
    pub fn contains_value(&self, value: bool) -> bool {
        self.contains(Self::of(value))
    }

    /// Image of logical negation over the set.
    pub fn logical_not(&self) -> Self {
        let mut out = Self::empty();
        out.set(Self::TRUE, self.contains(Self::FALSE));
        out.set(Self::FALSE, self.contains(Self::TRUE));
        out
    }

    /// Image of `a ∨ b` over every pair drawn from the two sets.
    pub fn logical_or(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::empty();
        }
        let mut out = Self::empty();
        out.set(
            Self::TRUE,
            self.contains(Self::TRUE) || other.contains(Self::TRUE),
        );
        out.set(
            Self::FALSE,
            self.contains(Self::FALSE) && other.contains(Self::FALSE),
        );
        out
    }
}

impl std::fmt::Display for BoolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.contains(Self::FALSE), self.contains(Self::TRUE)) {
            (false, false) => write!(f, "∅"),
            (true, false) => write!(f, "{{false}}"),
            (false, true) => write!(f, "{{true}}"),
            (true, true) => write!(f, "{{false, true}}"),
        }
    }
}

/// A named enumeration and its ordered members.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EnumDomain {
    name: String,
    members: Vec<String>,
}

impl EnumDomain {
    pub fn new<S: Into<String>>(name: impl Into<String>, members: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Set holding every member.
    pub fn full(&self) -> EnumSet {
        EnumSet::new(self.name.clone(), self.members.iter().cloned())
    }

    /// Set of the given members, rejecting names that are not members.
    pub fn set_of<'a>(&self, values: impl IntoIterator<Item = &'a str>) -> SetResult<EnumSet> {
        let mut out = BTreeSet::new();
        for value in values {
            if !self.members.iter().any(|m| m == value) {
                return Err(SetError::EnumMismatch {
                    left: self.name.clone(),
                    right: value.to_string(),
                });
            }
            out.insert(value.to_string());
        }
        Ok(EnumSet {
            enum_name: self.name.clone(),
            values: out,
        })
    }

    /// Members of this enumeration that are not in `set`.
    pub fn complement(&self, set: &EnumSet) -> SetResult<EnumSet> {
        self.full().difference(set)
    }
}

/// A subset of the members of one enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EnumSet {
    enum_name: String,
    values: BTreeSet<String>,
}

impl EnumSet {
    pub fn new<S: Into<String>>(enum_name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Self {
            enum_name: enum_name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    #[inline]
    pub fn enum_name(&self) -> &str {
        &self.enum_name
    }

    #[inline]
    pub fn values(&self) -> &BTreeSet<String> {
        &self.values
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn single(&self) -> Option<&str> {
        match self.values.len() {
            1 => self.values.iter().next().map(String::as_str),
            _ => None,
        }
    }

    fn check(&self, other: &EnumSet) -> SetResult<()> {
        if self.enum_name == other.enum_name {
            Ok(())
        } else {
            Err(SetError::EnumMismatch {
                left: self.enum_name.clone(),
                right: other.enum_name.clone(),
            })
        }
    }

    fn with(&self, values: impl IntoIterator<Item = String>) -> Self {
        Self {
            enum_name: self.enum_name.clone(),
            values: values.into_iter().collect(),
        }
    }

    pub fn union(&self, other: &EnumSet) -> SetResult<Self> {
        self.check(other)?;
        Ok(self.with(self.values.union(&other.values).cloned()))
    }

    pub fn intersection(&self, other: &EnumSet) -> SetResult<Self> {
        self.check(other)?;
        Ok(self.with(self.values.intersection(&other.values).cloned()))
    }

    pub fn difference(&self, other: &EnumSet) -> SetResult<Self> {
        self.check(other)?;
        Ok(self.with(self.values.difference(&other.values).cloned()))
    }

    pub fn symmetric_difference(&self, other: &EnumSet) -> SetResult<Self> {
        self.check(other)?;
        Ok(self.with(self.values.symmetric_difference(&other.values).cloned()))
    }

    pub fn is_subset_of(&self, other: &EnumSet) -> SetResult<bool> {
        self.check(other)?;
        Ok(self.values.is_subset(&other.values))
    }
}

impl std::fmt::Display for EnumSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{{", self.enum_name)?;
        for (index, value) in self.values.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, "}}")
    }
}

/// A set of strings: either finitely many, or every string except finitely many.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StringSet {
    Finite(BTreeSet<String>),
    Excluding(BTreeSet<String>),
}

impl StringSet {
    pub fn of<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::Finite(values.into_iter().map(Into::into).collect())
    }

    /// Every string.
    pub fn any() -> Self {
        Self::Excluding(BTreeSet::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Finite(values) if values.is_empty())
    }

    pub fn single(&self) -> Option<&str> {
        match self {
            Self::Finite(values) if values.len() == 1 => {
                values.iter().next().map(String::as_str)
            }
            _ => None,
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        match self {
            Self::Finite(values) => values.contains(value),
            Self::Excluding(values) => !values.contains(value),
        }
    }

    pub fn complement(&self) -> Self {
        match self {
            Self::Finite(values) => Self::Excluding(values.clone()),
            Self::Excluding(values) => Self::Finite(values.clone()),
        }
    }

    pub fn union(&self, other: &StringSet) -> Self {
        use StringSet::*;
        match (self, other) {
            (Finite(a), Finite(b)) => Finite(a.union(b).cloned().collect()),
            (Finite(f), Excluding(e)) | (Excluding(e), Finite(f)) => {
                Excluding(e.difference(f).cloned().collect())
            }
            (Excluding(a), Excluding(b)) => Excluding(a.intersection(b).cloned().collect()),
        }
    }

    pub fn intersection(&self, other: &StringSet) -> Self {
        use StringSet::*;
        match (self, other) {
            (Finite(a), Finite(b)) => Finite(a.intersection(b).cloned().collect()),
            (Finite(f), Excluding(e)) | (Excluding(e), Finite(f)) => {
                Finite(f.difference(e).cloned().collect())
            }
            (Excluding(a), Excluding(b)) => Excluding(a.union(b).cloned().collect()),
        }
    }

    pub fn difference(&self, other: &StringSet) -> Self {
        self.intersection(&other.complement())
    }

    pub fn symmetric_difference(&self, other: &StringSet) -> Self {
        self.difference(other).union(&other.difference(self))
    }

    pub fn is_subset_of(&self, other: &StringSet) -> bool {
        self.difference(other).is_empty()
    }
}

impl std::fmt::Display for StringSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (prefix, values) = match self {
            Self::Finite(values) => ("", values),
            Self::Excluding(values) if values.is_empty() => return write!(f, "String"),
            Self::Excluding(values) => ("String \\ ", values),
        };
        write!(f, "{}{{", prefix)?;
        for (index, value) in values.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_images() {
        assert_eq!(BoolSet::TRUE.logical_not(), BoolSet::FALSE);
        assert_eq!(BoolSet::all().logical_not(), BoolSet::all());
        assert_eq!(BoolSet::FALSE.logical_or(&BoolSet::all()), BoolSet::all());
        assert_eq!(BoolSet::TRUE.logical_or(&BoolSet::FALSE), BoolSet::TRUE);
        assert_eq!(BoolSet::empty().logical_or(&BoolSet::TRUE), BoolSet::empty());
        assert_eq!(BoolSet::all().single(), None);
        assert_eq!(format!("{}", BoolSet::of(true)), "{true}");
    }

    #[test]
    fn enum_sets_check_their_enumeration() {
        let pkg = EnumDomain::new("Package", ["R0402", "R0603", "R0805"]);
        let small = pkg.set_of(["R0402", "R0603"]).unwrap();
        let rest = pkg.complement(&small).unwrap();
        assert_eq!(rest.single(), Some("R0805"));
        assert!(pkg.set_of(["SOT23"]).is_err());

        let other = EnumSet::new("Color", ["red"]);
        assert!(small.union(&other).unwrap_err().is_enum_mismatch());
    }

    #[test]
    fn string_sets_are_exact_under_complement() {
        let ab = StringSet::of(["a", "b"]);
        let not_a = StringSet::of(["a"]).complement();
        assert_eq!(ab.intersection(&not_a), StringSet::of(["b"]));
        assert!(StringSet::any().union(&ab).contains("zzz"));
        assert!(ab.is_subset_of(&StringSet::any()));
        assert!(!StringSet::any().is_subset_of(&ab));
        assert!(ab.symmetric_difference(&ab).is_empty());
    }
}
