extern crate proc_macro;

use convert_case::{Case, Casing};
use proc_macro::TokenStream;
use quote::quote;
use syn::DeriveInput;

/// Generates `Self::COMPONENT_NAME`, the snake_case form of the type's own name, for use as the
/// `component` label in metrics and as the [`ims_metrics::HealthCheck::component_name`]
/// implementation every long-lived component provides.
///
/// ```ignore
/// #[derive(ComponentName)]
/// struct RuleEngine { /* ... */ }
///
/// assert_eq!(RuleEngine::COMPONENT_NAME, "rule_engine");
/// ```
#[proc_macro_derive(ComponentName)]
pub fn component_name_derive(input: TokenStream) -> TokenStream {
    let ast: DeriveInput =
        syn::parse(input).expect("component_name_derive() failed to parse input TokenStream");

    let ident = &ast.ident;
    let snake = ident.to_string().to_case(Case::Snake);

    let generated = quote! {
        impl #ident {
            /// Stable, snake_case identifier for this component, used as the metrics
            /// `component` label and as a [`ims_metrics::HealthCheck`] component name.
            pub const COMPONENT_NAME: &'static str = #snake;
        }
    };

    TokenStream::from(generated)
}
