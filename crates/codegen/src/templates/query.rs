//! Query model: filters, assignments and the serialized request.

use crate::naming::model_names;
use clientgen_core::GenerationConfig;
use proc_macro2::TokenStream;
use quote::quote;

pub(super) fn render(config: &GenerationConfig) -> Result<TokenStream, String> {
    let field_enums: Vec<_> = model_names(&config.datamodel().models)?
        .into_iter()
        .map(|names| names.field_enum)
        .collect();

    Ok(quote! {
        /// A condition on one field.
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(rename_all = "camelCase")]
        pub enum Filter {
            /// Equal to the value
            Equals(serde_json::Value),
            /// Not equal to the value
            Not(serde_json::Value),
            /// One of the values
            In(Vec<serde_json::Value>),
            /// None of the values
            NotIn(Vec<serde_json::Value>),
            /// Less than
            Lt(serde_json::Value),
            /// Less than or equal
            Lte(serde_json::Value),
            /// Greater than
            Gt(serde_json::Value),
            /// Greater than or equal
            Gte(serde_json::Value),
            /// Contains the substring
            Contains(String),
            /// Starts with the prefix
            StartsWith(String),
            /// Ends with the suffix
            EndsWith(String),
        }

        /// A filter bound to a field.
        #[derive(Debug, Clone, PartialEq, Serialize)]
        pub struct WhereParam {
            /// Field name
            pub field: &'static str,
            /// Condition
            pub filter: Filter,
        }

        /// A value assigned to a field.
        #[derive(Debug, Clone, PartialEq, Serialize)]
        pub struct SetParam {
            /// Field name
            pub field: &'static str,
            /// New value
            pub value: serde_json::Value,
        }

        /// Sort direction.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
        #[serde(rename_all = "lowercase")]
        pub enum SortOrder {
            /// Ascending
            Asc,
            /// Descending
            Desc,
        }

        /// A request sent to the engine.
        #[derive(Debug, Clone, PartialEq, Serialize)]
        #[serde(rename_all = "camelCase")]
        pub struct Query {
            /// Model the query targets, empty for raw queries and batches
            pub model_name: &'static str,
            /// Engine action
            pub action: &'static str,
            /// Record filters
            #[serde(rename = "where", skip_serializing_if = "Vec::is_empty")]
            pub filters: Vec<WhereParam>,
            /// Values for a single created record
            #[serde(skip_serializing_if = "Vec::is_empty")]
            pub data: Vec<SetParam>,
            /// Values for several created records
            #[serde(skip_serializing_if = "Vec::is_empty")]
            pub rows: Vec<Vec<SetParam>>,
            /// Values for updated records
            #[serde(skip_serializing_if = "Vec::is_empty")]
            pub update: Vec<SetParam>,
            /// Sort keys
            #[serde(skip_serializing_if = "Vec::is_empty")]
            pub order_by: Vec<(&'static str, SortOrder)>,
            /// Maximum number of records
            #[serde(skip_serializing_if = "Option::is_none")]
            pub take: Option<i64>,
            /// Records to skip
            #[serde(skip_serializing_if = "Option::is_none")]
            pub skip: Option<i64>,
            /// Queries executed together in one transaction
            #[serde(skip_serializing_if = "Vec::is_empty")]
            pub batch: Vec<Query>,
            /// Raw SQL
            #[serde(skip_serializing_if = "Option::is_none")]
            pub sql: Option<String>,
            /// Raw SQL parameters
            #[serde(skip_serializing_if = "Vec::is_empty")]
            pub params: Vec<serde_json::Value>,
        }

        impl Query {
            /// An empty query for `action` on `model_name`.
            pub fn new(model_name: &'static str, action: &'static str) -> Self {
                Self {
                    model_name,
                    action,
                    filters: Vec::new(),
                    data: Vec::new(),
                    rows: Vec::new(),
                    update: Vec::new(),
                    order_by: Vec::new(),
                    take: None,
                    skip: None,
                    batch: Vec::new(),
                    sql: None,
                    params: Vec::new(),
                }
            }

            /// The JSON request the engine receives.
            pub fn to_request(&self) -> serde_json::Value {
                serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
            }
        }

        /// Builds filters and assignments for a model's fields.
        pub trait Field: Copy {
            /// Field name as declared in the schema.
            fn name(self) -> &'static str;

            /// Field equals `value`.
            fn equals(self, value: impl Into<serde_json::Value>) -> WhereParam {
                self.filter(Filter::Equals(value.into()))
            }

            /// Field differs from `value`.
            fn not(self, value: impl Into<serde_json::Value>) -> WhereParam {
                self.filter(Filter::Not(value.into()))
            }

            /// Field is one of `values`.
            fn in_list<V: Into<serde_json::Value>>(self, values: impl IntoIterator<Item = V>) -> WhereParam {
                self.filter(Filter::In(values.into_iter().map(Into::into).collect()))
            }

            /// Field is none of `values`.
            fn not_in<V: Into<serde_json::Value>>(self, values: impl IntoIterator<Item = V>) -> WhereParam {
                self.filter(Filter::NotIn(values.into_iter().map(Into::into).collect()))
            }

            /// Field is less than `value`.
            fn lt(self, value: impl Into<serde_json::Value>) -> WhereParam {
                self.filter(Filter::Lt(value.into()))
            }

            /// Field is at most `value`.
            fn lte(self, value: impl Into<serde_json::Value>) -> WhereParam {
                self.filter(Filter::Lte(value.into()))
            }

            /// Field is greater than `value`.
            fn gt(self, value: impl Into<serde_json::Value>) -> WhereParam {
                self.filter(Filter::Gt(value.into()))
            }

            /// Field is at least `value`.
            fn gte(self, value: impl Into<serde_json::Value>) -> WhereParam {
                self.filter(Filter::Gte(value.into()))
            }

            /// Field contains `value`.
            fn contains(self, value: impl Into<String>) -> WhereParam {
                self.filter(Filter::Contains(value.into()))
            }

            /// Field starts with `value`.
            fn starts_with(self, value: impl Into<String>) -> WhereParam {
                self.filter(Filter::StartsWith(value.into()))
            }

            /// Field ends with `value`.
            fn ends_with(self, value: impl Into<String>) -> WhereParam {
                self.filter(Filter::EndsWith(value.into()))
            }

            /// Bind an arbitrary filter to the field.
            fn filter(self, filter: Filter) -> WhereParam {
                WhereParam { field: self.name(), filter }
            }

            /// Assign `value` to the field.
            fn set(self, value: impl Into<serde_json::Value>) -> SetParam {
                SetParam { field: self.name(), value: value.into() }
            }

            /// Sort by the field.
            fn order(self, order: SortOrder) -> (&'static str, SortOrder) {
                (self.name(), order)
            }
        }

        #(
            impl Field for #field_enums {
                fn name(self) -> &'static str {
                    self.as_str()
                }
            }
        )*
    })
}
