//! Tab visibility
//!
//! Visibility is a pure function of the layout, the current values and the
//! status. A gated tab is shown iff its gate is `true`; a nested tab also
//! requires its parent to be shown. Read-only mode disables inputs but never
//! changes which tabs are shown.

use indexmap::IndexSet;
use rca_schema::{ApplicationStatus, Field, FormLayout, FormValues, TabId, TabSpec};

/// Visible tabs and field editability for one snapshot of a form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visibility {
    layout: FormLayout,
    visible: IndexSet<TabId>,
    read_only: bool,
}

impl Visibility {
    /// Compute visibility for `values`
    #[must_use]
    pub fn compute(layout: &FormLayout, values: &FormValues, status: ApplicationStatus) -> Self {
        fn visit(tabs: &'static [TabSpec], values: &FormValues, out: &mut IndexSet<TabId>) {
            for tab in tabs {
                let open = tab
                    .gate
                    .map_or(true, |gate| gate.get(values).as_bool().unwrap_or(false));
                if open {
                    out.insert(tab.id);
                    visit(tab.children, values, out);
                }
            }
        }

        let mut visible = IndexSet::new();
        visit(layout.tabs, values, &mut visible);
        Self {
            layout: *layout,
            visible,
            read_only: status.is_read_only(),
        }
    }

    /// Tab is shown
    #[inline]
    #[must_use]
    pub fn is_visible(&self, tab: TabId) -> bool {
        self.visible.contains(&tab)
    }

    /// Shown tabs in layout order
    pub fn tabs(&self) -> impl Iterator<Item = TabId> + '_ {
        self.visible.iter().copied()
    }

    /// Field sits on a shown tab
    #[must_use]
    pub fn is_field_visible(&self, field: Field) -> bool {
        self.layout
            .walk()
            .into_iter()
            .any(|(_, _, tab)| tab.inputs().contains(&field) && self.is_visible(tab.id))
    }

    /// Field is shown and inputs are enabled
    #[inline]
    #[must_use]
    pub fn is_field_editable(&self, field: Field) -> bool {
        !self.read_only && self.is_field_visible(field)
    }

    /// Inputs are disabled
    #[inline]
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }
}
