//! Table columns derived from field descriptors.

use serde::{Deserialize, Serialize};

use crate::descriptor::{FieldDescriptor, FieldType, SchemaDefinition};

/// One table column. Built from a [`FieldDescriptor`]; the view store uses
/// the field type to pick filter and sort semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    /// Row field this column reads; equals the descriptor name.
    pub id: String,
    pub header: String,
    pub field_type: FieldType,
    pub sortable: bool,
    pub filterable: bool,
    /// Enum options, for filter pickers.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub options: Option<Vec<String>>,
}

impl ColumnDef {
    /// Scalar fields sort and filter; array and object fields do neither.
    #[must_use]
    pub fn from_descriptor(field: &FieldDescriptor) -> Self {
        let scalar = field.field_type.is_scalar();
        Self {
            id: field.name.clone(),
            header: field.label.clone(),
            field_type: field.field_type,
            sortable: scalar,
            filterable: scalar,
            options: field.options().map(<[String]>::to_vec),
        }
    }

    #[must_use]
    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    #[must_use]
    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }
}

/// Columns for every field of `definition`, in declaration order.
#[must_use]
pub fn columns_for(definition: &SchemaDefinition) -> Vec<ColumnDef> {
    definition.fields.iter().map(ColumnDef::from_descriptor).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::introspect;
    use crate::schema::Schema;

    #[test]
    fn scalar_columns_sort_and_filter() {
        let schema = Schema::object([
            ("vendorName", Schema::string()),
            ("status", Schema::enumeration(["draft", "approved"])),
            ("tags", Schema::array(Schema::string())),
        ]);
        let columns = columns_for(&introspect(&schema));

        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].header, "Vendor Name");
        assert!(columns[0].sortable && columns[0].filterable);
        assert_eq!(
            columns[1].options.as_deref(),
            Some(&["draft".to_string(), "approved".to_string()][..])
        );
        assert!(!columns[2].sortable);
        assert!(!columns[2].filterable);
    }

    #[test]
    fn flags_can_be_overridden() {
        let schema = Schema::object([("notes", Schema::string())]);
        let column = columns_for(&introspect(&schema)).remove(0).sortable(false);
        assert!(!column.sortable);
        assert!(column.filterable);
    }
}
