//! Typed CRUD requests decoded from flat form fields.
//!
//! The wire format is a flat set of named string fields with an `action` selector.
//! Decoding happens once, here; everything downstream matches on [`ProductAction`].

use std::collections::HashMap;

use thiserror::Error;

use inventario_core::{DomainError, ProductId};

use crate::product::{required_id, NewProduct, ProductUpdate};

/// Raw request fields, as decoded from an `application/x-www-form-urlencoded` body.
pub type FormFields = HashMap<String, String>;

/// Name of the dispatch field.
pub const ACTION_FIELD: &str = "action";

/// The four supported operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Create,
    Read,
    Update,
    Delete,
}

impl ActionKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Self::Create),
            "read" => Some(Self::Read),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl core::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Caller-facing validation messages are field-agnostic; the precise cause is kept
// on `ActionError::Validation`.
pub const MSG_INVALID_CREATE: &str = "missing required fields or invalid price (must be > 0)";
pub const MSG_INVALID_UPDATE: &str = "missing required fields or invalid id/price";
pub const MSG_INVALID_DELETE: &str = "product id is required";

/// A fully validated CRUD request.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductAction {
    Create(NewProduct),
    Read,
    Update(ProductUpdate),
    Delete(ProductId),
}

/// Why a request could not be turned into a [`ProductAction`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The selector was absent or not one of the supported actions.
    #[error("invalid or unspecified action")]
    InvalidAction,

    /// The selector was valid but the payload failed validation.
    #[error("{message}")]
    Validation {
        kind: ActionKind,
        message: &'static str,
        #[source]
        cause: DomainError,
    },
}

impl ProductAction {
    /// Decode and validate a request.
    ///
    /// Nothing beyond the selector is inspected when the selector is invalid.
    pub fn from_fields(fields: &FormFields) -> Result<Self, ActionError> {
        let kind = fields
            .get(ACTION_FIELD)
            .and_then(|a| ActionKind::parse(a))
            .ok_or(ActionError::InvalidAction)?;

        let invalid = move |message: &'static str| {
            move |cause: DomainError| ActionError::Validation { kind, message, cause }
        };
        match kind {
            ActionKind::Read => Ok(ProductAction::Read),
            ActionKind::Create => NewProduct::from_fields(fields)
                .map(ProductAction::Create)
                .map_err(invalid(MSG_INVALID_CREATE)),
            ActionKind::Update => ProductUpdate::from_fields(fields)
                .map(ProductAction::Update)
                .map_err(invalid(MSG_INVALID_UPDATE)),
            ActionKind::Delete => required_id(fields)
                .map(ProductAction::Delete)
                .map_err(invalid(MSG_INVALID_DELETE)),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            ProductAction::Create(_) => ActionKind::Create,
            ProductAction::Read => ActionKind::Read,
            ProductAction::Update(_) => ActionKind::Update,
            ProductAction::Delete(_) => ActionKind::Delete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormFields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn missing_or_unknown_action_is_invalid() {
        assert_eq!(ProductAction::from_fields(&form(&[])), Err(ActionError::InvalidAction));
        assert_eq!(
            ProductAction::from_fields(&form(&[("action", "archive"), ("id", "1")])),
            Err(ActionError::InvalidAction)
        );
        // Selectors are case-sensitive.
        assert_eq!(
            ProductAction::from_fields(&form(&[("action", "READ")])),
            Err(ActionError::InvalidAction)
        );
    }

    #[test]
    fn read_needs_nothing_else() {
        assert_eq!(
            ProductAction::from_fields(&form(&[("action", "read")])),
            Ok(ProductAction::Read)
        );
    }

    #[test]
    fn create_validation_failure_is_field_agnostic() {
        let err = ProductAction::from_fields(&form(&[
            ("action", "create"),
            ("nombre", "Tornillo"),
            ("descripcion", "Tornillo 3mm"),
            ("codigo_barras", "111"),
            ("categoria", "Ferreteria"),
            ("precio", "abc"),
            ("proveedor", "ACME"),
        ]))
        .unwrap_err();

        assert_eq!(err.to_string(), MSG_INVALID_CREATE);
        match err {
            ActionError::Validation { kind, cause, .. } => {
                assert_eq!(kind, ActionKind::Create);
                assert!(matches!(cause, DomainError::InvalidNumber(_)));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn update_ignores_barcode() {
        let action = ProductAction::from_fields(&form(&[
            ("action", "update"),
            ("id", "3"),
            ("nombre", "Tornillo"),
            ("descripcion", "Tornillo 3mm"),
            ("codigo_barras", "changed"),
            ("categoria", "Ferreteria"),
            ("precio", "1.25"),
            ("stock", "40"),
            ("proveedor", "ACME"),
        ]))
        .unwrap();

        match action {
            ProductAction::Update(u) => {
                assert_eq!(u.id.get(), 3);
                assert_eq!(u.fields.stock, 40);
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn update_validation_failure_names_id_and_price() {
        let base = [
            ("action", "update"),
            ("id", "3"),
            ("nombre", "Tornillo"),
            ("descripcion", "Tornillo 3mm"),
            ("categoria", "Ferreteria"),
            ("precio", "1.25"),
            ("proveedor", "ACME"),
        ];
        for (field, value) in [
            ("precio", "0"),
            ("precio", "abc"),
            ("nombre", ""),
            ("proveedor", " "),
            ("id", "0"),
        ] {
            let mut fields = form(&base);
            fields.insert(field.into(), value.into());
            let err = ProductAction::from_fields(&fields).unwrap_err();
            assert_eq!(err.to_string(), MSG_INVALID_UPDATE, "{field}={value:?}");
        }
    }

    #[test]
    fn delete_requires_id() {
        let err = ProductAction::from_fields(&form(&[("action", "delete")])).unwrap_err();
        assert_eq!(err.to_string(), "product id is required");

        let ok = ProductAction::from_fields(&form(&[("action", "delete"), ("id", "8")])).unwrap();
        assert_eq!(ok.kind(), ActionKind::Delete);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: any selector outside the four actions is rejected before validation.
            #[test]
            fn unknown_selectors_rejected(selector in "[a-zA-Z_]{0,12}") {
                prop_assume!(ActionKind::parse(&selector).is_none());
                let fields = form(&[("action", selector.as_str()), ("id", "1")]);
                prop_assert_eq!(ProductAction::from_fields(&fields), Err(ActionError::InvalidAction));
            }
        }
    }
}
