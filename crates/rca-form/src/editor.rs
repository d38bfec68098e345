//! Sub-record editors
//!
//! An editor owns a working buffer for one record of an array field. Saving
//! runs the record's required-field checklist and commits the whole array
//! back through [`FormController::set`], so dirty tracking and watchers see
//! the edit like any other field change.

use crate::controller::FormController;
use crate::error::{EditorError, FormError};
use rca_schema::{RecordId, SubRecord};

/// Dialog state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Closed,
    Creating,
    Editing(usize),
}

/// Record committed by [`SubRecordEditor::save`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedRecord {
    pub index: usize,
    pub id: RecordId,
    /// Appended rather than replaced
    pub created: bool,
}

/// Create/edit/delete dialog for records of type `R`
#[derive(Debug, Clone)]
pub struct SubRecordEditor<R: SubRecord> {
    mode: EditorMode,
    buffer: R,
    pending_delete: Option<usize>,
}

impl<R: SubRecord> Default for SubRecordEditor<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: SubRecord> SubRecordEditor<R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: EditorMode::Closed,
            buffer: R::default(),
            pending_delete: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Working copy
    #[inline]
    #[must_use]
    pub fn buffer(&self) -> &R {
        &self.buffer
    }

    /// Mutable working copy; changes reach the form only on save
    #[inline]
    pub fn buffer_mut(&mut self) -> &mut R {
        &mut self.buffer
    }

    /// Index awaiting delete confirmation
    #[inline]
    #[must_use]
    pub fn pending_delete(&self) -> Option<usize> {
        self.pending_delete
    }

    /// Open with an empty buffer.
    ///
    /// # Errors
    /// [`FormError::ReadOnly`] outside of draft.
    pub fn open_for_create(&mut self, form: &FormController) -> Result<(), EditorError> {
        ensure_editable(form)?;
        self.buffer = R::default();
        self.mode = EditorMode::Creating;
        Ok(())
    }

    /// Open with a copy of the record at `index`.
    ///
    /// # Errors
    /// [`FormError::ReadOnly`] outside of draft, or an out-of-range index.
    pub fn open_for_edit(&mut self, form: &FormController, index: usize) -> Result<(), EditorError> {
        ensure_editable(form)?;
        let records = R::records(form.values());
        let record = records.get(index).ok_or(EditorError::IndexOutOfRange {
            index,
            len: records.len(),
        })?;
        self.buffer = record.clone();
        self.mode = EditorMode::Editing(index);
        Ok(())
    }

    /// Validate the buffer and commit it.
    ///
    /// Edits keep the record's id and position; creates append with a fresh
    /// temporary id. The dialog closes on success and stays open on failure.
    ///
    /// # Errors
    /// - [`EditorError::Closed`] with no dialog open
    /// - [`EditorError::Invalid`] naming the first failing member
    /// - [`EditorError::IndexOutOfRange`] if the record vanished meanwhile
    /// - [`EditorError::Stale`] if another record now occupies its slot
    pub fn save(&mut self, form: &mut FormController) -> Result<SavedRecord, EditorError> {
        ensure_editable(form)?;
        if self.mode == EditorMode::Closed {
            return Err(EditorError::Closed);
        }
        let mut record = self.buffer.clone();
        record.check_required().map_err(EditorError::Invalid)?;

        let mut records = R::records(form.values());
        let saved = match self.mode {
            EditorMode::Closed => return Err(EditorError::Closed),
            EditorMode::Creating => {
                record.set_id(RecordId::temporary());
                let saved = SavedRecord {
                    index: records.len(),
                    id: record.id().clone(),
                    created: true,
                };
                records.push(record);
                saved
            }
            EditorMode::Editing(index) => {
                let len = records.len();
                let slot = records
                    .get_mut(index)
                    .ok_or(EditorError::IndexOutOfRange { index, len })?;
                if slot.id() != record.id() {
                    return Err(EditorError::Stale { index });
                }
                let saved = SavedRecord {
                    index,
                    id: record.id().clone(),
                    created: false,
                };
                *slot = record;
                saved
            }
        };

        form.set(R::FIELD, R::into_value(records))?;
        tracing::debug!(field = %R::FIELD, index = saved.index, created = saved.created, "{} saved", R::LABEL);
        self.close();
        Ok(saved)
    }

    /// Discard the buffer and close
    pub fn cancel(&mut self) {
        self.close();
    }

    /// Ask for confirmation before deleting the record at `index`.
    ///
    /// # Errors
    /// [`FormError::ReadOnly`] outside of draft, or an out-of-range index.
    pub fn request_delete(&mut self, form: &FormController, index: usize) -> Result<(), EditorError> {
        ensure_editable(form)?;
        let len = R::records(form.values()).len();
        if index >= len {
            return Err(EditorError::IndexOutOfRange { index, len });
        }
        self.pending_delete = Some(index);
        Ok(())
    }

    /// Remove the record awaiting confirmation; later records shift down.
    ///
    /// # Errors
    /// [`EditorError::NoPendingDelete`] when nothing was requested.
    pub fn confirm_delete(&mut self, form: &mut FormController) -> Result<RecordId, EditorError> {
        ensure_editable(form)?;
        let index = self.pending_delete.take().ok_or(EditorError::NoPendingDelete)?;
        let mut records = R::records(form.values());
        if index >= records.len() {
            return Err(EditorError::IndexOutOfRange {
                index,
                len: records.len(),
            });
        }
        let removed = records.remove(index);
        form.set(R::FIELD, R::into_value(records))?;
        tracing::debug!(field = %R::FIELD, index, "{} deleted", R::LABEL);
        Ok(removed.id().clone())
    }

    /// Drop the delete request
    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    fn close(&mut self) {
        self.mode = EditorMode::Closed;
        self.buffer = R::default();
    }
}

fn ensure_editable(form: &FormController) -> Result<(), FormError> {
    if form.is_read_only() {
        Err(FormError::ReadOnly {
            status: form.status(),
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rca_schema::{ApplicationKind, ApplicationStatus, CellLine, Field, TeamMember};

    fn form() -> FormController {
        let mut form = FormController::new(ApplicationKind::Ibc, ApplicationStatus::Draft);
        form.set(Field::HumanNonHumanPrimateMaterial, true.into()).unwrap();
        form
    }

    fn line(name: &str) -> CellLine {
        CellLine {
            name: name.into(),
            biosafety_level: "BSL-2".into(),
            acquisition_sources: vec!["ATCC".into()],
            passage: "10".into(),
            exposure_types: vec!["splash".into()],
            ..CellLine::default()
        }
    }

    fn add(form: &mut FormController, name: &str) -> SavedRecord {
        let mut editor = SubRecordEditor::<CellLine>::new();
        editor.open_for_create(form).unwrap();
        *editor.buffer_mut() = line(name);
        editor.save(form).unwrap()
    }

    #[test]
    fn create_appends_with_temporary_id() {
        let mut form = form();
        let saved = add(&mut form, "HEK293");
        assert!(saved.created);
        assert_eq!(saved.index, 0);
        assert!(saved.id.is_temporary());
        assert_eq!(form.values().cell_lines[0].id, saved.id);
        assert!(form.is_dirty());
    }

    #[test]
    fn missing_name_rejected_and_dialog_stays_open() {
        let mut form = form();
        let mut editor = SubRecordEditor::<CellLine>::new();
        editor.open_for_create(&form).unwrap();
        *editor.buffer_mut() = CellLine {
            name: String::new(),
            ..line("x")
        };
        let err = editor.save(&mut form).unwrap_err();
        let EditorError::Invalid(issue) = err else {
            panic!("expected invalid record");
        };
        assert_eq!(issue.member, "name");
        assert_eq!(editor.mode(), EditorMode::Creating);
        assert!(form.values().cell_lines.is_empty());
    }

    #[test]
    fn each_missing_cell_line_member_is_rejected() {
        let cases: [(&str, &str, fn(&mut CellLine)); 5] = [
            ("name", "name", |l| l.name.clear()),
            ("biosafetyLevel", "Biosafety level", |l| l.biosafety_level = "  ".into()),
            ("acquisitionSources", "acquisition source", |l| l.acquisition_sources.clear()),
            ("passage", "Passage", |l| l.passage.clear()),
            ("exposureTypes", "exposure type", |l| l.exposure_types = vec![String::new()]),
        ];
        for (member, wording, blank) in cases {
            let mut form = form();
            add(&mut form, "HEK293");
            let before = form.values().cell_lines.clone();

            let mut editor = SubRecordEditor::<CellLine>::new();
            editor.open_for_create(&form).unwrap();
            *editor.buffer_mut() = line("HeLa");
            blank(editor.buffer_mut());

            let Err(EditorError::Invalid(issue)) = editor.save(&mut form) else {
                panic!("{member}: expected invalid record");
            };
            assert_eq!(issue.member, member);
            assert!(issue.message.contains(wording), "{member}: {}", issue.message);
            assert_eq!(form.values().cell_lines, before, "{member}");
            assert_eq!(editor.mode(), EditorMode::Creating);
        }
    }

    #[test]
    fn edit_after_earlier_delete_is_stale() {
        let mut form = form();
        add(&mut form, "A");
        let b = add(&mut form, "B");
        let c = add(&mut form, "C");

        let mut editor = SubRecordEditor::<CellLine>::new();
        editor.open_for_edit(&form, 1).unwrap();
        editor.buffer_mut().passage = "30".into();

        let mut deleter = SubRecordEditor::<CellLine>::new();
        deleter.request_delete(&form, 0).unwrap();
        deleter.confirm_delete(&mut form).unwrap();

        assert_eq!(editor.save(&mut form), Err(EditorError::Stale { index: 1 }));
        let lines = &form.values().cell_lines;
        assert_eq!((lines[0].id.clone(), lines[0].passage.as_str()), (b.id, "10"));
        assert_eq!((lines[1].id.clone(), lines[1].passage.as_str()), (c.id, "10"));
    }

    #[test]
    fn save_without_open_dialog() {
        let mut form = form();
        let mut editor = SubRecordEditor::<TeamMember>::new();
        *editor.buffer_mut() = TeamMember {
            user_id: "u1".into(),
            name: "Ada".into(),
            role: "PI".into(),
            ..TeamMember::default()
        };
        assert_eq!(editor.save(&mut form), Err(EditorError::Closed));
    }

    #[test]
    fn edit_preserves_id_and_length() {
        let mut form = form();
        add(&mut form, "HEK293");
        let second = add(&mut form, "HeLa");

        let mut editor = SubRecordEditor::<CellLine>::new();
        editor.open_for_edit(&form, 1).unwrap();
        editor.buffer_mut().passage = "22".into();
        let saved = editor.save(&mut form).unwrap();

        assert!(!saved.created);
        assert_eq!(saved.id, second.id);
        assert_eq!(form.values().cell_lines.len(), 2);
        assert_eq!(form.values().cell_lines[1].passage, "22");
        assert_eq!(editor.mode(), EditorMode::Closed);
    }

    #[test]
    fn open_for_edit_out_of_range() {
        let form = form();
        let mut editor = SubRecordEditor::<CellLine>::new();
        assert_eq!(
            editor.open_for_edit(&form, 3),
            Err(EditorError::IndexOutOfRange { index: 3, len: 0 })
        );
    }

    #[test]
    fn delete_requires_confirmation_and_shifts_indices() {
        let mut form = form();
        add(&mut form, "A");
        let b = add(&mut form, "B");
        let c = add(&mut form, "C");

        let mut editor = SubRecordEditor::<CellLine>::new();
        editor.request_delete(&form, 0).unwrap();
        editor.cancel_delete();
        assert_eq!(editor.confirm_delete(&mut form), Err(EditorError::NoPendingDelete));
        assert_eq!(form.values().cell_lines.len(), 3);

        editor.request_delete(&form, 0).unwrap();
        editor.confirm_delete(&mut form).unwrap();
        let ids: Vec<_> = form.values().cell_lines.iter().map(|l| l.id.clone()).collect();
        assert_eq!(ids, vec![b.id, c.id]);
    }

    #[test]
    fn read_only_rejects_editors() {
        let form = FormController::new(ApplicationKind::Ibc, ApplicationStatus::Approved);
        let mut editor = SubRecordEditor::<CellLine>::new();
        assert!(matches!(
            editor.open_for_create(&form),
            Err(EditorError::Form(FormError::ReadOnly { .. }))
        ));
    }

    proptest! {
        #[test]
        fn delete_keeps_relative_order(count in 1usize..6, victim in 0usize..6) {
            prop_assume!(victim < count);
            let mut form = form();
            let ids: Vec<_> = (0..count).map(|i| add(&mut form, &format!("line{i}")).id).collect();

            let mut editor = SubRecordEditor::<CellLine>::new();
            editor.request_delete(&form, victim).unwrap();
            let removed = editor.confirm_delete(&mut form).unwrap();

            let mut expected = ids.clone();
            expected.remove(victim);
            let remaining: Vec<_> = form.values().cell_lines.iter().map(|l| l.id.clone()).collect();
            prop_assert_eq!(removed, ids[victim].clone());
            prop_assert_eq!(remaining, expected);
        }
    }
}
