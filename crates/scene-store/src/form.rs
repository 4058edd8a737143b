//! # Forms
//!
//! Editable form state with one lifecycle, shared by every screen that
//! submits anything: values are edited through typed setters, validated
//! against the model's own rules, and submitted through a begin/succeed/
//! fail triple driven by the scene's reducer. Field errors from client
//! validation and from server rejection land in the same shape, so a view
//! has exactly one error-rendering path.
//!
//! The [`form_model!`](crate::form_model) macro generates the per-field
//! plumbing from the value struct itself: a `set_<field>` method per field
//! (no stringly-typed setter names at call sites) and a `FIELD_*` constant
//! per field for keying error maps.

use std::collections::BTreeMap;
use std::fmt;

/// Field-keyed validation messages. Keys are the `FIELD_*` constants
/// generated by [`form_model!`](crate::form_model).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors {
    by_field: BTreeMap<&'static str, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message for `field`, replacing any earlier one.
    pub fn set(&mut self, field: &'static str, message: impl Into<String>) {
        self.by_field.insert(field, message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.by_field.get(field).map(String::as_str)
    }

    pub fn is_clean(&self) -> bool {
        self.by_field.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_field.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_field.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_field.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.by_field.iter().map(|(field, msg)| (*field, msg.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// A form's value struct together with its validation rules.
///
/// Returning an empty [`FieldErrors`] means the values are submittable.
/// Validation must report every failing field at once, not stop at the
/// first, so users fix a form in one round trip.
pub trait FormModel: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    fn validate(&self) -> FieldErrors;
}

/// Form state for a value struct `V`.
///
/// Lives inside scene state; every method is reducer-safe (synchronous,
/// no I/O). The submission flow a scene drives:
///
/// 1. [`begin_submit`](Self::begin_submit) validates and, only when the
///    values are clean, flips `submitting`.
/// 2. On a server rejection, [`submit_failed`](Self::submit_failed)
///    attaches the mapped field errors.
/// 3. On success, [`submit_succeeded`](Self::submit_succeeded) clears the
///    dirty flag and makes the submitted values the new baseline.
#[derive(Clone, Debug, PartialEq)]
pub struct Form<V: FormModel> {
    values: V,
    defaults: V,
    errors: FieldErrors,
    server_errors: FieldErrors,
    submitting: bool,
    changed: bool,
}

impl<V: FormModel> Form<V> {
    pub fn new(defaults: V) -> Self {
        Self {
            values: defaults.clone(),
            defaults,
            errors: FieldErrors::new(),
            server_errors: FieldErrors::new(),
            submitting: false,
            changed: false,
        }
    }

    pub fn values(&self) -> &V {
        &self.values
    }

    /// Edits the values in place and recomputes the dirty flag against
    /// the baseline. The generated `set_<field>` methods route here.
    pub fn update(&mut self, mutate: impl FnOnce(&mut V)) {
        mutate(&mut self.values);
        self.changed = self.values != self.defaults;
    }

    /// Runs client validation and stores the full message set. A clean
    /// pass also discards stale server errors, which only described a
    /// previous submission's values.
    pub fn validate(&mut self) -> bool {
        self.errors = self.values.validate();
        if self.errors.is_clean() {
            self.server_errors.clear();
            true
        } else {
            false
        }
    }

    /// Validates and, when clean, marks the form as submitting. Returns
    /// whether submission should proceed; on `false` every failing
    /// field's message is in place and nothing else changed.
    pub fn begin_submit(&mut self) -> bool {
        if !self.validate() {
            return false;
        }
        self.submitting = true;
        true
    }

    /// Completes a submission: the submitted values become the new
    /// baseline, so the form reads as unchanged until the next edit.
    pub fn submit_succeeded(&mut self) {
        self.submitting = false;
        self.changed = false;
        self.defaults = self.values.clone();
        self.server_errors.clear();
    }

    /// Fails a submission with server-mapped field errors. Client
    /// validation messages, values and the dirty flag are untouched.
    pub fn submit_failed(&mut self, server: FieldErrors) {
        self.submitting = false;
        self.server_errors = server;
    }

    /// Returns the form to its baseline, or to a newly supplied one,
    /// clearing all errors and flags.
    pub fn reset(&mut self, defaults: Option<V>) {
        if let Some(values) = defaults {
            self.defaults = values;
        }
        self.values = self.defaults.clone();
        self.errors.clear();
        self.server_errors.clear();
        self.submitting = false;
        self.changed = false;
    }

    /// The message to render for `field`, client validation first, then
    /// the server's verdict.
    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).or_else(|| self.server_errors.get(field))
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn server_errors(&self) -> &FieldErrors {
        &self.server_errors
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Whether the values differ from the baseline.
    pub fn is_changed(&self) -> bool {
        self.changed
    }
}

/// Declares a form value struct and generates its field plumbing.
///
/// From one struct declaration this produces:
///
/// - the struct itself, with whatever derives were written on it;
/// - a `FIELD_<NAME>` string constant per field, the canonical key into
///   [`FieldErrors`];
/// - a `<Name>Fields` extension trait implemented for
///   [`Form`]`<Name>`, with a typed `set_<field>` method per field that
///   routes through [`Form::update`] so the dirty flag stays correct.
///
/// The `validate` rules are not generated; implement [`FormModel`] by
/// hand next to the declaration.
///
/// ```
/// use scene_store::{form_model, FieldErrors, Form, FormModel};
///
/// form_model! {
///     #[derive(Clone, Debug, PartialEq)]
///     pub struct LoginValues {
///         pub email: String,
///         pub password: String,
///     }
/// }
///
/// impl FormModel for LoginValues {
///     fn validate(&self) -> FieldErrors {
///         let mut errors = FieldErrors::new();
///         if !self.email.contains('@') {
///             errors.set(Self::FIELD_EMAIL, "Please enter a valid email");
///         }
///         errors
///     }
/// }
///
/// let mut form = Form::new(LoginValues { email: String::new(), password: String::new() });
/// form.set_email("ada@example.com".to_string());
/// assert!(form.is_changed());
/// assert_eq!(LoginValues::FIELD_EMAIL, "email");
/// ```
#[macro_export]
macro_rules! form_model {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                pub $field:ident : $ty:ty
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )+
        }

        $crate::paste::paste! {
            impl $name {
                $(
                    #[doc = concat!("Error-map key for `", stringify!($field), "`.")]
                    pub const [<FIELD_ $field:upper>]: &'static str = stringify!($field);
                )+
            }

            #[doc = concat!("Typed per-field setters for [`", stringify!($name), "`] forms.")]
            pub trait [<$name Fields>] {
                $(
                    fn [<set_ $field>](&mut self, value: $ty);
                )+
            }

            impl [<$name Fields>] for $crate::form::Form<$name> {
                $(
                    fn [<set_ $field>](&mut self, value: $ty) {
                        self.update(|values| values.$field = value);
                    }
                )+
            }
        }
    };
}
