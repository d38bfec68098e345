//! Field paths for addressing values inside a form
//!
//! Provides [`FieldPath`]: a top-level [`Field`], optionally narrowed to one
//! record of an array field and one member of that record.

use crate::error::PathError;
use crate::field::Field;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Path within a form
///
/// Used to attach validation messages to the exact input that produced them.
///
/// # Examples
/// - `title`
/// - `cellLines.2`
/// - `cellLines.2.passage`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath {
    field: Field,
    index: Option<usize>,
    member: Option<String>,
}

impl FieldPath {
    /// Path to a whole field
    #[inline]
    #[must_use]
    pub fn new(field: Field) -> Self {
        Self {
            field,
            index: None,
            member: None,
        }
    }

    /// Narrow to the record at `index`
    #[inline]
    #[must_use]
    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Narrow to a record member
    #[inline]
    #[must_use]
    pub fn member(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }

    /// Top-level field
    #[inline]
    #[must_use]
    pub fn field(&self) -> Field {
        self.field
    }

    /// Record index, if narrowed
    #[inline]
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Record member, if narrowed
    #[inline]
    #[must_use]
    pub fn member_name(&self) -> Option<&str> {
        self.member.as_deref()
    }

    /// Whole-field path (no index or member)
    #[inline]
    #[must_use]
    pub fn is_field(&self) -> bool {
        self.index.is_none() && self.member.is_none()
    }

    /// Check if this path lies under `field`
    #[inline]
    #[must_use]
    pub fn is_within(&self, field: Field) -> bool {
        self.field == field
    }
}

impl From<Field> for FieldPath {
    fn from(field: Field) -> Self {
        Self::new(field)
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.field.wire_name())?;
        if let Some(index) = self.index {
            write!(f, ".{index}")?;
        }
        if let Some(member) = &self.member {
            write!(f, ".{member}")?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }

        let mut segments = s.split('.');
        let head = segments.next().unwrap_or_default();
        let field = Field::from_wire(head).ok_or_else(|| PathError::UnknownField(head.to_string()))?;
        let mut path = Self::new(field);

        if let Some(index) = segments.next() {
            if !field.kind().holds_records() {
                return Err(PathError::NotARecordField(field.wire_name()));
            }
            let index = index
                .parse::<usize>()
                .map_err(|_| PathError::InvalidIndex(index.to_string()))?;
            path = path.at(index);
        }

        if let Some(member) = segments.next() {
            if member.is_empty() || !member.chars().all(char::is_alphanumeric) {
                return Err(PathError::InvalidMember(member.to_string()));
            }
            path = path.member(member);
        }

        if segments.next().is_some() {
            return Err(PathError::TooManySegments(s.to_string()));
        }

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_whole_field() {
        let path = FieldPath::new(Field::Title);
        assert!(path.is_field());
        assert_eq!(path.to_string(), "title");
    }

    #[test]
    fn path_record_member() {
        let path = FieldPath::new(Field::CellLines).at(2).member("passage");
        assert_eq!(path.field(), Field::CellLines);
        assert_eq!(path.index(), Some(2));
        assert_eq!(path.member_name(), Some("passage"));
        assert_eq!(path.to_string(), "cellLines.2.passage");
    }

    #[test]
    fn path_is_within() {
        let path = FieldPath::new(Field::CellLines).at(0);
        assert!(path.is_within(Field::CellLines));
        assert!(!path.is_within(Field::HazardousProcedures));
    }

    #[test]
    fn path_from_str_valid() {
        let path: FieldPath = "hazardousProcedures.1.cellLineId".parse().unwrap();
        assert_eq!(
            path,
            FieldPath::new(Field::HazardousProcedures)
                .at(1)
                .member("cellLineId")
        );
        let path: FieldPath = "title".parse().unwrap();
        assert_eq!(path, FieldPath::new(Field::Title));
    }

    #[test]
    fn path_from_str_empty() {
        assert_eq!("".parse::<FieldPath>(), Err(PathError::Empty));
    }

    #[test]
    fn path_from_str_unknown_field() {
        let result: Result<FieldPath, _> = "nope.1".parse();
        assert!(matches!(result, Err(PathError::UnknownField(_))));
    }

    #[test]
    fn path_from_str_index_on_scalar() {
        let result: Result<FieldPath, _> = "title.0".parse();
        assert_eq!(result, Err(PathError::NotARecordField("title")));
    }

    #[test]
    fn path_from_str_bad_index() {
        let result: Result<FieldPath, _> = "cellLines.x".parse();
        assert!(matches!(result, Err(PathError::InvalidIndex(_))));
    }

    #[test]
    fn path_from_str_bad_member() {
        let result: Result<FieldPath, _> = "cellLines.0.pass-age".parse();
        assert!(matches!(result, Err(PathError::InvalidMember(_))));
    }

    #[test]
    fn path_from_str_too_long() {
        let result: Result<FieldPath, _> = "cellLines.0.name.extra".parse();
        assert!(matches!(result, Err(PathError::TooManySegments(_))));
    }

    #[test]
    fn path_display_roundtrip() {
        let path = FieldPath::new(Field::SyntheticExperiments).at(3).member("nihSection");
        let parsed: FieldPath = path.to_string().parse().unwrap();
        assert_eq!(parsed, path);
    }
}
